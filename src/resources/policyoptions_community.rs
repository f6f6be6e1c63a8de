//! `junos_policyoptions_community`: `policy-options community NAME`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::junos::{cut_prefix, quoted, trim_quotes};
use crate::provider::diag::MISSING_CONFIG_ERROR_SUMMARY;
use crate::provider::{
    Attribute, AttributeError, AttributePath, Diagnostics, ResourceData, Schema, Validator,
};
use crate::resources::is_set;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyoptionsCommunity {
    pub id: Option<String>,
    pub name: String,
    pub dynamic_db: Option<bool>,
    pub invert_match: Option<bool>,
    pub members: Vec<String>,
}

impl ResourceData for PolicyoptionsCommunity {
    fn type_name() -> &'static str {
        "junos_policyoptions_community"
    }

    fn schema() -> Schema {
        Schema::new("Provides a community resource.")
            .attribute("id", Attribute::id())
            .attribute("name", Attribute::name(250))
            .attribute("dynamic_db", Attribute::flag())
            .attribute(
                "invert_match",
                Attribute::flag().description("Invert the result of the community expression matching."),
            )
            .attribute(
                "members",
                Attribute::optional_list_of_string()
                    .validator(Validator::StringDoubleQuoteExclusion)
                    .description("Community members."),
            )
    }

    fn validate_config(&self, diags: &mut Diagnostics) {
        if self.members.is_empty() && !is_set(&self.dynamic_db) {
            diags.add_attribute_error(
                AttributePath::root("members"),
                MISSING_CONFIG_ERROR_SUMMARY,
                "one of members or dynamic_db must be specified",
            );
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn id_mut(&mut self) -> &mut Option<String> {
        &mut self.id
    }

    fn key_id(&self) -> String {
        self.name.clone()
    }

    fn from_id(id: &str) -> Option<Self> {
        (!id.is_empty()).then(|| Self {
            name: id.to_string(),
            ..Self::default()
        })
    }

    fn display_name(&self) -> String {
        format!("policy-options community {}", self.name)
    }

    fn config_path(&self) -> String {
        format!("policy-options community {}", self.name)
    }

    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError> {
        let set_prefix = self.set_prefix();
        let mut lines = Vec::new();

        if is_set(&self.dynamic_db) {
            lines.push(format!("{}dynamic-db", set_prefix));
        }
        if is_set(&self.invert_match) {
            lines.push(format!("{}invert-match", set_prefix));
        }
        for member in &self.members {
            lines.push(format!("{}members {}", set_prefix, quoted(member)));
        }

        Ok(lines)
    }

    fn read_line(&mut self, item: &str) -> Result<()> {
        match item {
            "dynamic-db" => self.dynamic_db = Some(true),
            "invert-match" => self.invert_match = Some(true),
            _ => {
                if let Some(member) = cut_prefix(item, "members ") {
                    self.members.push(trim_quotes(member).to_string());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_lines() {
        let data = PolicyoptionsCommunity {
            name: "c1".into(),
            invert_match: Some(true),
            members: vec!["65000:100".into(), "^65000:.*$".into()],
            ..Default::default()
        };
        assert_eq!(
            data.set_lines().unwrap(),
            vec![
                "set policy-options community c1 invert-match",
                "set policy-options community c1 members \"65000:100\"",
                "set policy-options community c1 members \"^65000:.*$\"",
            ]
        );
    }

    #[test]
    fn test_read_keeps_member_order() {
        let mut data = PolicyoptionsCommunity::from_id("c1").unwrap();
        for item in ["members 65000:200", "members \"^65000:.*$\"", "invert-match"] {
            data.read_line(item).unwrap();
        }
        assert_eq!(data.members, vec!["65000:200", "^65000:.*$"]);
        assert_eq!(data.invert_match, Some(true));
    }
}

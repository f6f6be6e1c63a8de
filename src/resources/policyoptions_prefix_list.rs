//! `junos_policyoptions_prefix_list`: `policy-options prefix-list NAME`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::junos::{cut_prefix, quoted, trim_quotes};
use crate::provider::data::append_unique;
use crate::provider::{Attribute, AttributeError, ResourceData, Schema, Validator};
use crate::resources::is_set;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyoptionsPrefixList {
    pub id: Option<String>,
    pub name: String,
    pub apply_path: Option<String>,
    pub dynamic_db: Option<bool>,
    pub prefix: Vec<String>,
}

impl ResourceData for PolicyoptionsPrefixList {
    fn type_name() -> &'static str {
        "junos_policyoptions_prefix_list"
    }

    fn schema() -> Schema {
        Schema::new("Provides a prefix list resource.")
            .attribute("id", Attribute::id())
            .attribute(
                "name",
                Attribute::name(250).description("Prefix list name."),
            )
            .attribute(
                "apply_path",
                Attribute::optional_string()
                    .validator(Validator::StringDoubleQuoteExclusion)
                    .description("Expand configuration path to prefixes."),
            )
            .attribute(
                "dynamic_db",
                Attribute::flag().description("Object may exist in dynamic database."),
            )
            .attribute(
                "prefix",
                Attribute::optional_set_of_string()
                    .validator(Validator::StringCidr)
                    .description("Address prefixes."),
            )
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
        format!("policy-options prefix-list {}", self.name)
    }

    fn config_path(&self) -> String {
        format!("policy-options prefix-list {}", self.name)
    }

    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError> {
        let set_prefix = self.set_prefix();
        let mut lines = vec![set_prefix.trim_end().to_string()];

        if let Some(apply_path) = &self.apply_path {
            lines.push(format!("{}apply-path {}", set_prefix, quoted(apply_path)));
        }
        if is_set(&self.dynamic_db) {
            lines.push(format!("{}dynamic-db", set_prefix));
        }
        for prefix in &self.prefix {
            lines.push(format!("{}{}", set_prefix, prefix));
        }

        Ok(lines)
    }

    fn read_line(&mut self, item: &str) -> Result<()> {
        if let Some(v) = cut_prefix(item, "apply-path ") {
            self.apply_path = Some(trim_quotes(v).to_string());
        } else if item == "dynamic-db" {
            self.dynamic_db = Some(true);
        } else {
            append_unique(&mut self.prefix, item);
        }
        Ok(())
    }
}

//! `junos_policyoptions_as_path`: `policy-options as-path NAME`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::junos::{quoted, trim_quotes};
use crate::provider::diag::MISSING_CONFIG_ERROR_SUMMARY;
use crate::provider::{
    Attribute, AttributeError, AttributePath, Diagnostics, ResourceData, Schema, Validator,
};
use crate::resources::is_set;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyoptionsAsPath {
    pub id: Option<String>,
    pub name: String,
    pub dynamic_db: Option<bool>,
    pub path: Option<String>,
}

impl ResourceData for PolicyoptionsAsPath {
    fn type_name() -> &'static str {
        "junos_policyoptions_as_path"
    }

    fn schema() -> Schema {
        Schema::new("Provides an AS path resource.")
            .attribute("id", Attribute::id())
            .attribute("name", Attribute::name(250))
            .attribute("dynamic_db", Attribute::flag())
            .attribute(
                "path",
                Attribute::optional_string()
                    .validator(Validator::StringDoubleQuoteExclusion)
                    .description("Regular expression for the AS path."),
            )
    }

    fn validate_config(&self, diags: &mut Diagnostics) {
        if self.path.is_none() && !is_set(&self.dynamic_db) {
            diags.add_attribute_error(
                AttributePath::root("path"),
                MISSING_CONFIG_ERROR_SUMMARY,
                "one of path or dynamic_db must be specified",
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
        format!("policy-options as-path {}", self.name)
    }

    fn config_path(&self) -> String {
        format!("policy-options as-path {}", self.name)
    }

    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError> {
        let set_prefix = self.set_prefix();
        let mut lines = Vec::new();

        if is_set(&self.dynamic_db) {
            lines.push(format!("{}dynamic-db", set_prefix));
        }
        if let Some(path) = &self.path {
            lines.push(format!("{}{}", set_prefix, quoted(path)));
        }

        Ok(lines)
    }

    fn read_line(&mut self, item: &str) -> Result<()> {
        if item == "dynamic-db" {
            self.dynamic_db = Some(true);
        } else {
            self.path = Some(trim_quotes(item).to_string());
        }
        Ok(())
    }
}

//! `junos_routing_instance`: `routing-instances NAME`.
//!
//! Interfaces and protocols of the instance are usually configured by other
//! resources, so an update only deletes the statements managed here.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::junos::{cut_prefix, quoted, trim_quotes, DEFAULT_W, DELETE_W};
use crate::provider::data::append_unique;
use crate::provider::{Attribute, AttributeError, ResourceData, Schema, StringFormat, Validator};
use crate::resources::is_set;

/// `instance-type` used when `type` is unset
pub const DEFAULT_INSTANCE_TYPE: &str = "virtual-router";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingInstance {
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub instance_type: Option<String>,
    #[serde(rename = "as")]
    pub autonomous_system: Option<String>,
    pub description: Option<String>,
    pub instance_export: Vec<String>,
    pub instance_import: Vec<String>,
    pub route_distinguisher: Option<String>,
    pub vrf_export: Vec<String>,
    pub vrf_import: Vec<String>,
    pub vrf_table_label: Option<bool>,
    pub vrf_target: Option<String>,
    pub vrf_target_export: Option<String>,
    pub vrf_target_import: Option<String>,
}

/// Statements under the instance owned by this resource
const MANAGED_STATEMENTS: &[&str] = &[
    "description",
    "instance-type",
    "route-distinguisher",
    "routing-options autonomous-system",
    "routing-options instance-export",
    "routing-options instance-import",
    "vrf-export",
    "vrf-import",
    "vrf-table-label",
    "vrf-target",
];

impl ResourceData for RoutingInstance {
    fn type_name() -> &'static str {
        "junos_routing_instance"
    }

    fn schema() -> Schema {
        let policy_list = || {
            Attribute::optional_list_of_string()
                .validator(Validator::StringLengthBetween(1, 250))
                .validator(Validator::StringFormat(StringFormat::Default))
        };

        Schema::new("Provides a routing instance resource.")
            .attribute("id", Attribute::id())
            .attribute(
                "name",
                Attribute::name(63)
                    .validator(Validator::StringNoneOf(&[DEFAULT_W]))
                    .description("The name of routing instance."),
            )
            .attribute(
                "type",
                Attribute::optional_string()
                    .default(DEFAULT_INSTANCE_TYPE)
                    .validator(Validator::StringSpaceExclusion)
                    .description("Type of routing instance. An empty string leaves instance-type unset."),
            )
            .attribute(
                "as",
                Attribute::optional_string()
                    .validator(Validator::StringSpaceExclusion)
                    .description("Autonomous system number in plain number or 'higher 16bits'.'Lower 16 bits' format."),
            )
            .attribute("description", Attribute::description_text())
            .attribute("instance_export", policy_list())
            .attribute("instance_import", policy_list())
            .attribute(
                "route_distinguisher",
                Attribute::optional_string()
                    .validator(Validator::StringSpaceExclusion)
                    .description("Route distinguisher for this instance."),
            )
            .attribute("vrf_export", policy_list())
            .attribute("vrf_import", policy_list())
            .attribute("vrf_table_label", Attribute::flag())
            .attribute(
                "vrf_target",
                Attribute::optional_string().validator(Validator::StringSpaceExclusion),
            )
            .attribute(
                "vrf_target_export",
                Attribute::optional_string().validator(Validator::StringSpaceExclusion),
            )
            .attribute(
                "vrf_target_import",
                Attribute::optional_string().validator(Validator::StringSpaceExclusion),
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
        // Read reports an absent instance-type as ""
        (!id.is_empty()).then(|| Self {
            name: id.to_string(),
            instance_type: Some(String::new()),
            ..Self::default()
        })
    }

    fn display_name(&self) -> String {
        format!("routing instance {}", self.name)
    }

    fn config_path(&self) -> String {
        format!("routing-instances {}", self.name)
    }

    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError> {
        let set_prefix = self.set_prefix();
        let mut lines = vec![set_prefix.trim_end().to_string()];

        if let Some(instance_type) = self.instance_type.as_deref().filter(|t| !t.is_empty()) {
            lines.push(format!("{}instance-type {}", set_prefix, instance_type));
        }
        if let Some(asn) = &self.autonomous_system {
            lines.push(format!("{}routing-options autonomous-system {}", set_prefix, asn));
        }
        if let Some(description) = &self.description {
            lines.push(format!("{}description {}", set_prefix, quoted(description)));
        }
        for policy in &self.instance_export {
            lines.push(format!("{}routing-options instance-export {}", set_prefix, policy));
        }
        for policy in &self.instance_import {
            lines.push(format!("{}routing-options instance-import {}", set_prefix, policy));
        }
        if let Some(rd) = &self.route_distinguisher {
            lines.push(format!("{}route-distinguisher {}", set_prefix, rd));
        }
        for policy in &self.vrf_export {
            lines.push(format!("{}vrf-export {}", set_prefix, policy));
        }
        for policy in &self.vrf_import {
            lines.push(format!("{}vrf-import {}", set_prefix, policy));
        }
        if is_set(&self.vrf_table_label) {
            lines.push(format!("{}vrf-table-label", set_prefix));
        }
        if let Some(target) = &self.vrf_target {
            lines.push(format!("{}vrf-target {}", set_prefix, target));
        }
        if let Some(target) = &self.vrf_target_export {
            lines.push(format!("{}vrf-target export {}", set_prefix, target));
        }
        if let Some(target) = &self.vrf_target_import {
            lines.push(format!("{}vrf-target import {}", set_prefix, target));
        }

        Ok(lines)
    }

    fn read_line(&mut self, item: &str) -> Result<()> {
        if let Some(v) = cut_prefix(item, "instance-type ") {
            self.instance_type = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "routing-options autonomous-system ") {
            self.autonomous_system = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "description ") {
            self.description = Some(trim_quotes(v).to_string());
        } else if let Some(v) = cut_prefix(item, "routing-options instance-export ") {
            append_unique(&mut self.instance_export, v);
        } else if let Some(v) = cut_prefix(item, "routing-options instance-import ") {
            append_unique(&mut self.instance_import, v);
        } else if let Some(v) = cut_prefix(item, "route-distinguisher ") {
            self.route_distinguisher = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "vrf-export ") {
            append_unique(&mut self.vrf_export, v);
        } else if let Some(v) = cut_prefix(item, "vrf-import ") {
            append_unique(&mut self.vrf_import, v);
        } else if item == "vrf-table-label" {
            self.vrf_table_label = Some(true);
        } else if let Some(v) = cut_prefix(item, "vrf-target export ") {
            self.vrf_target_export = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "vrf-target import ") {
            self.vrf_target_import = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "vrf-target ") {
            self.vrf_target = Some(v.to_string());
        }
        Ok(())
    }

    fn update_del_lines(&self) -> Vec<String> {
        let path = self.config_path();
        MANAGED_STATEMENTS
            .iter()
            .map(|statement| format!("{}{} {}", DELETE_W, path, statement))
            .collect()
    }
}

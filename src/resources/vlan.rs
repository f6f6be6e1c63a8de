//! `junos_vlan`: `vlans NAME`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::junos::{cut_prefix, quoted, trim_quotes};
use crate::provider::data::{append_unique, conv_atoi64};
use crate::provider::diag::CONFLICT_CONFIG_ERROR_SUMMARY;
use crate::provider::{
    Attribute, AttributeError, AttributePath, Block, Diagnostics, ResourceData, Schema,
    StringFormat, Validator,
};
use crate::resources::is_set;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vlan {
    pub id: Option<String>,
    pub name: String,
    pub community_vlans: Vec<String>,
    pub description: Option<String>,
    pub forward_filter_input: Option<String>,
    pub forward_filter_output: Option<String>,
    pub forward_flood_input: Option<String>,
    pub isolated_vlan: Option<String>,
    pub l3_interface: Option<String>,
    pub private_vlan: Option<String>,
    pub service_id: Option<i64>,
    pub vlan_id: Option<i64>,
    pub vlan_id_list: Vec<String>,
    pub vxlan: Option<VlanVxlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VlanVxlan {
    pub vni: i64,
    pub encapsulate_inner_vlan: Option<bool>,
    pub ingress_node_replication: Option<bool>,
    pub multicast_group: Option<String>,
    pub ovsdb_managed: Option<bool>,
    pub unreachable_vtep_aging_timer: Option<i64>,
}

impl ResourceData for Vlan {
    fn type_name() -> &'static str {
        "junos_vlan"
    }

    fn schema() -> Schema {
        let filter = || {
            Attribute::optional_string()
                .validator(Validator::StringLengthBetween(1, 64))
                .validator(Validator::StringFormat(StringFormat::Default))
        };

        Schema::new("Provides a vlan resource.")
            .attribute("id", Attribute::id())
            .attribute("name", Attribute::name(64).description("The name of vlan."))
            .attribute(
                "community_vlans",
                Attribute::optional_set_of_string()
                    .validator(Validator::StringSpaceExclusion)
                    .description("List of ID or name of community vlans for primary vlan."),
            )
            .attribute("description", Attribute::description_text())
            .attribute("forward_filter_input", filter())
            .attribute("forward_filter_output", filter())
            .attribute("forward_flood_input", filter())
            .attribute(
                "isolated_vlan",
                Attribute::optional_string()
                    .validator(Validator::StringSpaceExclusion)
                    .description("ID or name of isolated vlan for primary vlan."),
            )
            .attribute(
                "l3_interface",
                Attribute::optional_string()
                    .validator(Validator::StringFormat(StringFormat::Interface))
                    .description("L3 interface name for this vlan."),
            )
            .attribute(
                "private_vlan",
                Attribute::optional_string()
                    .validator(Validator::StringOneOf(&["community", "isolated"]))
                    .description("Type of secondary vlan for private vlan."),
            )
            .attribute(
                "service_id",
                Attribute::optional_int64().validator(Validator::Int64Between(1, 65535)),
            )
            .attribute(
                "vlan_id",
                Attribute::optional_int64().validator(Validator::Int64Between(1, 4094)),
            )
            .attribute(
                "vlan_id_list",
                Attribute::optional_set_of_string()
                    .validator(Validator::StringSpaceExclusion)
                    .description("List of vlan ID or ranges."),
            )
            .block(
                "vxlan",
                Block::single()
                    .description("Declare vxlan configuration.")
                    .attribute(
                        "vni",
                        Attribute::required_int64().validator(Validator::Int64Between(0, 16777214)),
                    )
                    .attribute("encapsulate_inner_vlan", Attribute::flag())
                    .attribute("ingress_node_replication", Attribute::flag())
                    .attribute(
                        "multicast_group",
                        Attribute::optional_string().validator(Validator::StringIpAddress),
                    )
                    .attribute("ovsdb_managed", Attribute::flag())
                    .attribute(
                        "unreachable_vtep_aging_timer",
                        Attribute::optional_int64().validator(Validator::Int64Between(300, 1800)),
                    ),
            )
    }

    fn validate_config(&self, diags: &mut Diagnostics) {
        if self.vlan_id.is_some() && !self.vlan_id_list.is_empty() {
            diags.add_attribute_error(
                AttributePath::root("vlan_id_list"),
                CONFLICT_CONFIG_ERROR_SUMMARY,
                "only one of vlan_id or vlan_id_list can be specified",
            );
        }
        if let Some(vxlan) = &self.vxlan {
            if is_set(&vxlan.ingress_node_replication) && vxlan.multicast_group.is_some() {
                diags.add_attribute_error(
                    AttributePath::root("vxlan").name("multicast_group"),
                    CONFLICT_CONFIG_ERROR_SUMMARY,
                    "only one of ingress_node_replication or multicast_group can be specified",
                );
            }
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
        format!("vlan {}", self.name)
    }

    fn config_path(&self) -> String {
        format!("vlans {}", self.name)
    }

    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError> {
        let set_prefix = self.set_prefix();
        let mut lines = vec![set_prefix.trim_end().to_string()];

        for community in &self.community_vlans {
            lines.push(format!("{}community-vlans {}", set_prefix, community));
        }
        if let Some(description) = &self.description {
            lines.push(format!("{}description {}", set_prefix, quoted(description)));
        }
        if let Some(filter) = &self.forward_filter_input {
            lines.push(format!("{}forwarding-options filter input {}", set_prefix, filter));
        }
        if let Some(filter) = &self.forward_filter_output {
            lines.push(format!("{}forwarding-options filter output {}", set_prefix, filter));
        }
        if let Some(filter) = &self.forward_flood_input {
            lines.push(format!("{}forwarding-options flood input {}", set_prefix, filter));
        }
        if let Some(isolated) = &self.isolated_vlan {
            lines.push(format!("{}isolated-vlan {}", set_prefix, isolated));
        }
        if let Some(interface) = &self.l3_interface {
            lines.push(format!("{}l3-interface {}", set_prefix, interface));
        }
        if let Some(private_vlan) = &self.private_vlan {
            lines.push(format!("{}private-vlan {}", set_prefix, private_vlan));
        }
        if let Some(service_id) = self.service_id {
            lines.push(format!("{}service-id {}", set_prefix, service_id));
        }
        if let Some(vlan_id) = self.vlan_id {
            lines.push(format!("{}vlan-id {}", set_prefix, vlan_id));
        }
        for vlan_id in &self.vlan_id_list {
            lines.push(format!("{}vlan-id-list {}", set_prefix, vlan_id));
        }
        if let Some(vxlan) = &self.vxlan {
            let vxlan_prefix = format!("{}vxlan ", set_prefix);
            lines.push(format!("{}vni {}", vxlan_prefix, vxlan.vni));
            if is_set(&vxlan.encapsulate_inner_vlan) {
                lines.push(format!("{}encapsulate-inner-vlan", vxlan_prefix));
            }
            if is_set(&vxlan.ingress_node_replication) {
                lines.push(format!("{}ingress-node-replication", vxlan_prefix));
            }
            if let Some(group) = &vxlan.multicast_group {
                lines.push(format!("{}multicast-group {}", vxlan_prefix, group));
            }
            if is_set(&vxlan.ovsdb_managed) {
                lines.push(format!("{}ovsdb-managed", vxlan_prefix));
            }
            if let Some(timer) = vxlan.unreachable_vtep_aging_timer {
                lines.push(format!("{}unreachable-vtep-aging-timer {}", vxlan_prefix, timer));
            }
        }

        Ok(lines)
    }

    fn read_line(&mut self, item: &str) -> Result<()> {
        if let Some(v) = cut_prefix(item, "community-vlans ") {
            append_unique(&mut self.community_vlans, v);
        } else if let Some(v) = cut_prefix(item, "description ") {
            self.description = Some(trim_quotes(v).to_string());
        } else if let Some(v) = cut_prefix(item, "forwarding-options filter input ") {
            self.forward_filter_input = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "forwarding-options filter output ") {
            self.forward_filter_output = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "forwarding-options flood input ") {
            self.forward_flood_input = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "isolated-vlan ") {
            self.isolated_vlan = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "l3-interface ") {
            self.l3_interface = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "private-vlan ") {
            self.private_vlan = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "service-id ") {
            self.service_id = Some(conv_atoi64("service_id", v)?);
        } else if let Some(v) = cut_prefix(item, "vlan-id-list ") {
            append_unique(&mut self.vlan_id_list, v);
        } else if let Some(v) = cut_prefix(item, "vlan-id ") {
            self.vlan_id = Some(conv_atoi64("vlan_id", v)?);
        } else if let Some(v) = cut_prefix(item, "vxlan ") {
            let vxlan = self.vxlan.get_or_insert_with(VlanVxlan::default);
            if let Some(vni) = cut_prefix(v, "vni ") {
                vxlan.vni = conv_atoi64("vxlan.vni", vni)?;
            } else if let Some(group) = cut_prefix(v, "multicast-group ") {
                vxlan.multicast_group = Some(group.to_string());
            } else if let Some(timer) = cut_prefix(v, "unreachable-vtep-aging-timer ") {
                vxlan.unreachable_vtep_aging_timer =
                    Some(conv_atoi64("vxlan.unreachable_vtep_aging_timer", timer)?);
            } else {
                match v {
                    "encapsulate-inner-vlan" => vxlan.encapsulate_inner_vlan = Some(true),
                    "ingress-node-replication" => vxlan.ingress_node_replication = Some(true),
                    "ovsdb-managed" => vxlan.ovsdb_managed = Some(true),
                    _ => {}
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
    fn test_vlan_id_conflict() {
        let mut diags = Diagnostics::new();
        Vlan {
            name: "v100".into(),
            vlan_id: Some(100),
            vlan_id_list: vec!["200-210".into()],
            ..Default::default()
        }
        .validate_config(&mut diags);
        assert!(diags.has_error());
    }

    #[test]
    fn test_vxlan_conflict_path() {
        let mut diags = Diagnostics::new();
        Vlan {
            name: "v100".into(),
            vxlan: Some(VlanVxlan {
                vni: 10100,
                ingress_node_replication: Some(true),
                multicast_group: Some("233.252.0.1".into()),
                ..Default::default()
            }),
            ..Default::default()
        }
        .validate_config(&mut diags);
        let err = diags.errors().next().unwrap();
        assert_eq!(err.attribute.as_ref().unwrap().to_string(), "vxlan.multicast_group");
    }

    #[test]
    fn test_lines_read_back() {
        let data = Vlan {
            name: "v100".into(),
            description: Some("users".into()),
            vlan_id: Some(100),
            l3_interface: Some("irb.100".into()),
            forward_filter_input: Some("f-in".into()),
            vxlan: Some(VlanVxlan {
                vni: 10100,
                ingress_node_replication: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let lines = data.set_lines().unwrap();
        assert_eq!(lines[0], "set vlans v100");
        assert!(lines.contains(&"set vlans v100 vxlan vni 10100".to_string()));

        let mut read = Vlan::from_id("v100").unwrap();
        for line in &lines {
            if let Some(item) = line.strip_prefix("set vlans v100 ") {
                read.read_line(item).unwrap();
            }
        }
        assert_eq!(read, data);
    }
}

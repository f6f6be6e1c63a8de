//! `junos_snmp_community`: `snmp community "NAME"`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::junos::{cut_prefix, first_element, quoted};
use crate::provider::data::{append_unique, find_or_append_by_name, Named};
use crate::provider::diag::{CONFLICT_CONFIG_ERROR_SUMMARY, DUPLICATE_CONFIG_ERROR_SUMMARY};
use crate::provider::{
    Attribute, AttributeError, AttributePath, Block, Diagnostics, ResourceData, Schema,
    StringFormat, Validator,
};
use crate::resources::{duplicates, is_set};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpCommunity {
    pub id: Option<String>,
    pub name: String,
    pub authorization_read_only: Option<bool>,
    pub authorization_read_write: Option<bool>,
    pub client_list_name: Option<String>,
    pub clients: Vec<String>,
    pub view: Option<String>,
    pub routing_instance: Vec<SnmpCommunityRoutingInstance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnmpCommunityRoutingInstance {
    pub name: String,
    pub client_list_name: Option<String>,
    pub clients: Vec<String>,
}

impl Named for SnmpCommunityRoutingInstance {
    fn new_named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn clients_conflict(
    client_list_name: &Option<String>,
    clients: &[String],
    path: AttributePath,
    diags: &mut Diagnostics,
) {
    if client_list_name.is_some() && !clients.is_empty() {
        diags.add_attribute_error(
            path,
            CONFLICT_CONFIG_ERROR_SUMMARY,
            "only one of client_list_name or clients can be specified",
        );
    }
}

impl ResourceData for SnmpCommunity {
    fn type_name() -> &'static str {
        "junos_snmp_community"
    }

    fn schema() -> Schema {
        let client_list_name = || {
            Attribute::optional_string()
                .validator(Validator::StringLengthBetween(1, 128))
                .validator(Validator::StringFormat(StringFormat::Default))
        };
        let clients = || Attribute::optional_set_of_string().validator(Validator::StringCidr);

        Schema::new("Provides a snmp community resource.")
            .attribute("id", Attribute::id())
            .attribute(
                "name",
                Attribute::required_string()
                    .requires_replace()
                    .validator(Validator::StringLengthBetween(1, 250))
                    .validator(Validator::StringDoubleQuoteExclusion)
                    .description("Name of snmp community."),
            )
            .attribute("authorization_read_only", Attribute::flag())
            .attribute("authorization_read_write", Attribute::flag())
            .attribute("client_list_name", client_list_name())
            .attribute("clients", clients())
            .attribute(
                "view",
                Attribute::optional_string()
                    .validator(Validator::StringLengthBetween(1, 32))
                    .validator(Validator::StringFormat(StringFormat::Default)),
            )
            .block(
                "routing_instance",
                Block::list()
                    .description("Use routing-instance name for v1/v2c clients.")
                    .attribute(
                        "name",
                        Attribute::required_string()
                            .validator(Validator::StringLengthBetween(1, 63))
                            .validator(Validator::StringFormat(StringFormat::Default)),
                    )
                    .attribute("client_list_name", client_list_name())
                    .attribute("clients", clients()),
            )
    }

    fn validate_config(&self, diags: &mut Diagnostics) {
        if is_set(&self.authorization_read_only) && is_set(&self.authorization_read_write) {
            diags.add_attribute_error(
                AttributePath::root("authorization_read_write"),
                CONFLICT_CONFIG_ERROR_SUMMARY,
                "only one of authorization_read_only or authorization_read_write can be specified",
            );
        }
        clients_conflict(
            &self.client_list_name,
            &self.clients,
            AttributePath::root("clients"),
            diags,
        );
        for (i, ri) in self.routing_instance.iter().enumerate() {
            clients_conflict(
                &ri.client_list_name,
                &ri.clients,
                AttributePath::root("routing_instance").index(i).name("clients"),
                diags,
            );
        }
        for dup in duplicates(self.routing_instance.iter().map(|ri| ri.name.as_str())) {
            diags.add_attribute_error(
                AttributePath::root("routing_instance"),
                DUPLICATE_CONFIG_ERROR_SUMMARY,
                format!("multiple routing_instance blocks with the same name {}", dup),
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
        format!("snmp community {}", self.name)
    }

    fn config_path(&self) -> String {
        format!("snmp community {}", quoted(&self.name))
    }

    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError> {
        let set_prefix = self.set_prefix();
        let mut lines = vec![set_prefix.trim_end().to_string()];

        if is_set(&self.authorization_read_only) {
            lines.push(format!("{}authorization read-only", set_prefix));
        }
        if is_set(&self.authorization_read_write) {
            lines.push(format!("{}authorization read-write", set_prefix));
        }
        if let Some(list) = &self.client_list_name {
            lines.push(format!("{}client-list-name {}", set_prefix, list));
        }
        for client in &self.clients {
            lines.push(format!("{}clients {}", set_prefix, client));
        }
        if let Some(view) = &self.view {
            lines.push(format!("{}view {}", set_prefix, view));
        }

        if let Some(dup) = duplicates(self.routing_instance.iter().map(|ri| ri.name.as_str())).first() {
            return Err(AttributeError::new(
                AttributePath::root("routing_instance"),
                format!("multiple routing_instance blocks with the same name {}", dup),
            ));
        }
        for ri in &self.routing_instance {
            let ri_prefix = format!("{}routing-instance {}", set_prefix, ri.name);
            lines.push(ri_prefix.clone());
            if let Some(list) = &ri.client_list_name {
                lines.push(format!("{} client-list-name {}", ri_prefix, list));
            }
            for client in &ri.clients {
                lines.push(format!("{} clients {}", ri_prefix, client));
            }
        }

        Ok(lines)
    }

    fn read_line(&mut self, item: &str) -> Result<()> {
        if let Some(v) = cut_prefix(item, "routing-instance ") {
            let name = first_element(v);
            let rest = v[name.len()..].trim_start();
            let ri = find_or_append_by_name(&mut self.routing_instance, name);
            if let Some(list) = cut_prefix(rest, "client-list-name ") {
                ri.client_list_name = Some(list.to_string());
            } else if let Some(client) = cut_prefix(rest, "clients ") {
                append_unique(&mut ri.clients, client);
            }
        } else if let Some(v) = cut_prefix(item, "authorization ") {
            match v {
                "read-only" => self.authorization_read_only = Some(true),
                "read-write" => self.authorization_read_write = Some(true),
                _ => {}
            }
        } else if let Some(v) = cut_prefix(item, "client-list-name ") {
            self.client_list_name = Some(v.to_string());
        } else if let Some(v) = cut_prefix(item, "clients ") {
            append_unique(&mut self.clients, v);
        } else if let Some(v) = cut_prefix(item, "view ") {
            self.view = Some(v.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quoted_path() {
        let data = SnmpCommunity {
            name: "public net".into(),
            authorization_read_only: Some(true),
            ..Default::default()
        };
        assert_eq!(
            data.set_lines().unwrap(),
            vec![
                "set snmp community \"public net\"",
                "set snmp community \"public net\" authorization read-only",
            ]
        );
        assert_eq!(data.del_lines(), vec!["delete snmp community \"public net\""]);
    }

    #[test]
    fn test_validate_conflicts() {
        let mut diags = Diagnostics::new();
        SnmpCommunity {
            name: "public".into(),
            authorization_read_only: Some(true),
            authorization_read_write: Some(true),
            routing_instance: vec![
                SnmpCommunityRoutingInstance {
                    name: "ri1".into(),
                    client_list_name: Some("cl".into()),
                    clients: vec!["192.0.2.0/24".into()],
                },
                SnmpCommunityRoutingInstance::new_named("ri1"),
            ],
            ..Default::default()
        }
        .validate_config(&mut diags);
        let paths: Vec<String> = diags
            .errors()
            .filter_map(|d| d.attribute.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(
            paths,
            vec![
                "authorization_read_write",
                "routing_instance[0].clients",
                "routing_instance"
            ]
        );
    }

    #[test]
    fn test_duplicate_routing_instances_rejected_by_set_lines() {
        let data = SnmpCommunity {
            name: "public".into(),
            routing_instance: vec![
                SnmpCommunityRoutingInstance::new_named("ri1"),
                SnmpCommunityRoutingInstance::new_named("ri1"),
            ],
            ..Default::default()
        };
        let err = data.set_lines().unwrap_err();
        assert_eq!(err.path, AttributePath::root("routing_instance"));
        assert!(err.message.ends_with("same name ri1"));
    }

    #[test]
    fn test_routing_instance_read_back() {
        let data = SnmpCommunity {
            name: "public".into(),
            clients: vec!["192.0.2.0/24".into()],
            routing_instance: vec![SnmpCommunityRoutingInstance {
                name: "ri1".into(),
                clients: vec!["198.51.100.0/24".into()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut read = SnmpCommunity::from_id("public").unwrap();
        for line in data.set_lines().unwrap() {
            if let Some(item) = line.strip_prefix("set snmp community \"public\" ") {
                read.read_line(item).unwrap();
            }
        }
        assert_eq!(read, data);
    }
}

//! `junos_security_nat_destination_pool`: `security nat destination pool NAME`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::junos::{cut_prefix, first_element, quoted, trim_quotes, Session};
use crate::provider::data::conv_atoi64;
use crate::provider::diag::{CONFLICT_CONFIG_ERROR_SUMMARY, MISSING_CONFIG_ERROR_SUMMARY};
use crate::provider::{
    Attribute, AttributeError, AttributePath, Diagnostics, ResourceData, Schema, StringFormat,
    Validator,
};
use crate::resources::routing_instance_exists;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityNatDestinationPool {
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    pub address_port: Option<i64>,
    pub address_to: Option<String>,
    pub description: Option<String>,
    pub routing_instance: Option<String>,
}

#[async_trait]
impl ResourceData for SecurityNatDestinationPool {
    fn type_name() -> &'static str {
        "junos_security_nat_destination_pool"
    }

    fn schema() -> Schema {
        Schema::new("Provides a security destination nat pool resource.")
            .attribute("id", Attribute::id())
            .attribute("name", Attribute::name(31).description("Pool name."))
            .attribute(
                "address",
                Attribute::required_string()
                    .validator(Validator::StringCidr)
                    .description("IPv4 or IPv6 address or address range start."),
            )
            .attribute(
                "address_port",
                Attribute::optional_int64()
                    .validator(Validator::Int64Between(0, 65535))
                    .description("Port change too with destination nat."),
            )
            .attribute(
                "address_to",
                Attribute::optional_string()
                    .validator(Validator::StringCidr)
                    .description("End of address range."),
            )
            .attribute("description", Attribute::description_text())
            .attribute(
                "routing_instance",
                Attribute::optional_string()
                    .validator(Validator::StringLengthBetween(1, 63))
                    .validator(Validator::StringFormat(StringFormat::Default)),
            )
    }

    fn validate_config(&self, diags: &mut Diagnostics) {
        if self.address_port.is_some() && self.address_to.is_some() {
            diags.add_attribute_error(
                AttributePath::root("address_to"),
                CONFLICT_CONFIG_ERROR_SUMMARY,
                "only one of address_port or address_to can be specified",
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
        format!("security nat destination pool {}", self.name)
    }

    fn config_path(&self) -> String {
        format!("security nat destination pool {}", self.name)
    }

    async fn pre_create_check(&self, sess: &dyn Session, diags: &mut Diagnostics) -> Result<()> {
        if let Some(ri) = &self.routing_instance {
            if !routing_instance_exists(sess, ri).await? {
                diags.add_attribute_error(
                    AttributePath::root("routing_instance"),
                    MISSING_CONFIG_ERROR_SUMMARY,
                    format!("routing instance {:?} doesn't exist", ri),
                );
            }
        }
        Ok(())
    }

    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError> {
        let set_prefix = self.set_prefix();
        let mut address = format!("{}address {}", set_prefix, self.address);
        if let Some(port) = self.address_port {
            address.push_str(&format!(" port {}", port));
        } else if let Some(to) = &self.address_to {
            address.push_str(&format!(" to {}", to));
        }

        let mut lines = vec![address];
        if let Some(description) = &self.description {
            lines.push(format!("{}description {}", set_prefix, quoted(description)));
        }
        if let Some(ri) = &self.routing_instance {
            lines.push(format!("{}routing-instance {}", set_prefix, ri));
        }

        Ok(lines)
    }

    fn read_line(&mut self, item: &str) -> Result<()> {
        if let Some(v) = cut_prefix(item, "address ") {
            let address = first_element(v);
            self.address = address.to_string();
            let rest = v[address.len()..].trim_start();
            if let Some(port) = cut_prefix(rest, "port ") {
                self.address_port = Some(conv_atoi64("address_port", port)?);
            } else if let Some(to) = cut_prefix(rest, "to ") {
                self.address_to = Some(to.to_string());
            }
        } else if let Some(v) = cut_prefix(item, "description ") {
            self.description = Some(trim_quotes(v).to_string());
        } else if let Some(v) = cut_prefix(item, "routing-instance ") {
            self.routing_instance = Some(v.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_port_and_to_conflict() {
        let mut diags = Diagnostics::new();
        SecurityNatDestinationPool {
            name: "p1".into(),
            address: "192.0.2.1/32".into(),
            address_port: Some(8080),
            address_to: Some("192.0.2.10/32".into()),
            ..Default::default()
        }
        .validate_config(&mut diags);
        let err = diags.errors().next().unwrap();
        assert_eq!(err.attribute, Some(AttributePath::root("address_to")));
    }

    #[test]
    fn test_address_lines() {
        let mut data = SecurityNatDestinationPool {
            name: "p1".into(),
            address: "192.0.2.1/32".into(),
            address_port: Some(8080),
            ..Default::default()
        };
        assert_eq!(
            data.set_lines().unwrap(),
            vec!["set security nat destination pool p1 address 192.0.2.1/32 port 8080"]
        );

        data.address_port = None;
        data.address_to = Some("192.0.2.10/32".into());
        assert_eq!(
            data.set_lines().unwrap(),
            vec!["set security nat destination pool p1 address 192.0.2.1/32 to 192.0.2.10/32"]
        );
    }

    #[test]
    fn test_read_lines() {
        let mut data = SecurityNatDestinationPool::from_id("p1").unwrap();
        data.read_line("address 192.0.2.1/32 port 8080").unwrap();
        data.read_line("description \"web pool\"").unwrap();
        assert_eq!(data.address, "192.0.2.1/32");
        assert_eq!(data.address_port, Some(8080));
        assert_eq!(data.description.as_deref(), Some("web pool"));

        assert!(matches!(
            data.read_line("address 192.0.2.1/32 port http"),
            Err(Error::ConfigParse { .. })
        ));
    }
}

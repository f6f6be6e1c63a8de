//! `junos_security_address_book`: `security address-book NAME`.
//!
//! Addresses of every kind share one namespace in the book, and Junos lists
//! `address N description` before the statement giving the address kind, so
//! reading takes two passes over the output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::junos::{
    cut_prefix, display_set_lines, first_element, quoted, trim_quotes, Session, CMD_SHOW_CONFIG,
    PIPE_DISPLAY_SET_RELATIVE,
};
use crate::provider::data::{append_unique, find_or_append_by_name, Named};
use crate::provider::diag::{
    CONFLICT_CONFIG_ERROR_SUMMARY, DUPLICATE_CONFIG_ERROR_SUMMARY, MISSING_CONFIG_ERROR_SUMMARY,
};
use crate::provider::{
    Attribute, AttributeError, AttributePath, Block, Diagnostics, ResourceData, Schema,
    StringFormat, Validator,
};
use crate::resources::{duplicates, is_set};

/// Book shared by every zone
pub const GLOBAL_ADDRESS_BOOK: &str = "global";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityAddressBook {
    pub id: Option<String>,
    pub name: String,
    pub attach_zone: Vec<String>,
    pub description: Option<String>,
    pub network_address: Vec<AddressValue>,
    pub wildcard_address: Vec<AddressValue>,
    pub dns_name: Vec<AddressDnsName>,
    pub range_address: Vec<AddressRange>,
    pub address_set: Vec<AddressSet>,
}

/// Address given by a single value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressValue {
    pub name: String,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressDnsName {
    pub name: String,
    pub value: String,
    pub description: Option<String>,
    pub ipv4_only: Option<bool>,
    pub ipv6_only: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressRange {
    pub name: String,
    pub from: String,
    pub to: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressSet {
    pub name: String,
    pub address: Vec<String>,
    pub address_set: Vec<String>,
    pub description: Option<String>,
}

macro_rules! impl_named {
    ($($ty:ty),*) => {
        $(
            impl Named for $ty {
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
        )*
    };
}

impl_named!(AddressValue, AddressDnsName, AddressRange, AddressSet);

impl SecurityAddressBook {
    fn address_names(&self) -> impl Iterator<Item = &str> {
        self.network_address
            .iter()
            .map(|a| a.name.as_str())
            .chain(self.wildcard_address.iter().map(|a| a.name.as_str()))
            .chain(self.dns_name.iter().map(|a| a.name.as_str()))
            .chain(self.range_address.iter().map(|a| a.name.as_str()))
            .chain(self.address_set.iter().map(|a| a.name.as_str()))
    }

    /// Description slot of the address named `name`, whatever its kind
    fn address_description(&mut self, name: &str) -> Option<&mut Option<String>> {
        if let Some(a) = self.network_address.iter_mut().find(|a| a.name == name) {
            return Some(&mut a.description);
        }
        if let Some(a) = self.wildcard_address.iter_mut().find(|a| a.name == name) {
            return Some(&mut a.description);
        }
        if let Some(a) = self.dns_name.iter_mut().find(|a| a.name == name) {
            return Some(&mut a.description);
        }
        self.range_address
            .iter_mut()
            .find(|a| a.name == name)
            .map(|a| &mut a.description)
    }
}

fn is_address_description(item: &str) -> bool {
    cut_prefix(item, "address ").map_or(false, |v| {
        v[first_element(v).len()..].trim_start().starts_with("description ")
    })
}

fn push_description(lines: &mut Vec<String>, prefix: &str, description: &Option<String>) {
    if let Some(description) = description {
        lines.push(format!("{} description {}", prefix, quoted(description)));
    }
}

fn address_block() -> Block {
    Block::list()
        .attribute(
            "name",
            Attribute::required_string()
                .validator(Validator::StringLengthBetween(1, 63))
                .validator(Validator::StringFormat(StringFormat::AddressName)),
        )
        .attribute("description", Attribute::description_text())
}

#[async_trait]
impl ResourceData for SecurityAddressBook {
    fn type_name() -> &'static str {
        "junos_security_address_book"
    }

    fn schema() -> Schema {
        Schema::new("Provides an address book resource.")
            .attribute("id", Attribute::id())
            .attribute(
                "name",
                Attribute::optional_string()
                    .default(GLOBAL_ADDRESS_BOOK)
                    .requires_replace()
                    .validator(Validator::StringLengthBetween(1, 63))
                    .validator(Validator::StringFormat(StringFormat::Default))
                    .description("The name of address book."),
            )
            .attribute(
                "attach_zone",
                Attribute::optional_list_of_string()
                    .validator(Validator::StringFormat(StringFormat::Default))
                    .description("List of zones to attach address book to."),
            )
            .attribute("description", Attribute::description_text())
            .block(
                "network_address",
                address_block().attribute(
                    "value",
                    Attribute::required_string().validator(Validator::StringCidr),
                ),
            )
            .block(
                "wildcard_address",
                address_block().attribute(
                    "value",
                    Attribute::required_string().validator(Validator::StringWildcardNetwork),
                ),
            )
            .block(
                "dns_name",
                address_block()
                    .attribute(
                        "value",
                        Attribute::required_string()
                            .validator(Validator::StringFormat(StringFormat::DnsName)),
                    )
                    .attribute("ipv4_only", Attribute::flag())
                    .attribute("ipv6_only", Attribute::flag()),
            )
            .block(
                "range_address",
                address_block()
                    .attribute(
                        "from",
                        Attribute::required_string().validator(Validator::StringIpAddress),
                    )
                    .attribute(
                        "to",
                        Attribute::required_string().validator(Validator::StringIpAddress),
                    ),
            )
            .block(
                "address_set",
                address_block()
                    .attribute(
                        "address",
                        Attribute::optional_set_of_string()
                            .validator(Validator::StringFormat(StringFormat::AddressName)),
                    )
                    .attribute(
                        "address_set",
                        Attribute::optional_set_of_string()
                            .validator(Validator::StringFormat(StringFormat::AddressName)),
                    ),
            )
    }

    fn validate_config(&self, diags: &mut Diagnostics) {
        if self.name == GLOBAL_ADDRESS_BOOK && !self.attach_zone.is_empty() {
            diags.add_attribute_error(
                AttributePath::root("attach_zone"),
                CONFLICT_CONFIG_ERROR_SUMMARY,
                "cannot attach global address book to a zone",
            );
        }
        for dup in duplicates(self.address_names()) {
            diags.add_error(
                DUPLICATE_CONFIG_ERROR_SUMMARY,
                format!("multiple addresses or address-sets with the same name {}", dup),
            );
        }
        for (i, dns) in self.dns_name.iter().enumerate() {
            if is_set(&dns.ipv4_only) && is_set(&dns.ipv6_only) {
                diags.add_attribute_error(
                    AttributePath::root("dns_name").index(i).name("ipv6_only"),
                    CONFLICT_CONFIG_ERROR_SUMMARY,
                    "only one of ipv4_only or ipv6_only can be specified",
                );
            }
        }
        for (i, set) in self.address_set.iter().enumerate() {
            if set.address.is_empty() && set.address_set.is_empty() {
                diags.add_attribute_error(
                    AttributePath::root("address_set").index(i),
                    MISSING_CONFIG_ERROR_SUMMARY,
                    format!(
                        "at least one of address or address_set must be specified in address_set {}",
                        set.name
                    ),
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
        format!("security address book {}", self.name)
    }

    fn config_path(&self) -> String {
        format!("security address-book {}", self.name)
    }

    async fn read(&self, sess: &dyn Session) -> Result<Option<Self>> {
        let output = sess
            .command(&format!(
                "{}{}{}",
                CMD_SHOW_CONFIG,
                self.config_path(),
                PIPE_DISPLAY_SET_RELATIVE
            ))
            .await?;
        if output.trim().is_empty() {
            return Ok(None);
        }

        let mut data = Self::from_id(&self.key_id()).ok_or_else(|| Error::InvalidDocument {
            resource: Self::type_name().to_string(),
            message: format!("cannot rebuild keys from id '{}'", self.key_id()),
        })?;
        let (descriptions, items): (Vec<&str>, Vec<&str>) =
            display_set_lines(&output).partition(|item| is_address_description(item));
        for item in items.into_iter().chain(descriptions) {
            data.read_line(item)?;
        }
        Ok(Some(data))
    }

    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError> {
        let set_prefix = self.set_prefix();
        let mut lines = vec![set_prefix.trim_end().to_string()];

        if let Some(dup) = duplicates(self.address_names()).first() {
            return Err(AttributeError::new(
                AttributePath::default(),
                format!("multiple addresses or address-sets with the same name {}", dup),
            ));
        }

        for zone in &self.attach_zone {
            lines.push(format!("{}attach zone {}", set_prefix, zone));
        }
        if let Some(description) = &self.description {
            lines.push(format!("{}description {}", set_prefix, quoted(description)));
        }

        for address in &self.network_address {
            let prefix = format!("{}address {}", set_prefix, address.name);
            lines.push(format!("{} {}", prefix, address.value));
            push_description(&mut lines, &prefix, &address.description);
        }
        for address in &self.wildcard_address {
            let prefix = format!("{}address {}", set_prefix, address.name);
            lines.push(format!("{} wildcard-address {}", prefix, address.value));
            push_description(&mut lines, &prefix, &address.description);
        }
        for address in &self.dns_name {
            let prefix = format!("{}address {}", set_prefix, address.name);
            let mut line = format!("{} dns-name {}", prefix, address.value);
            if is_set(&address.ipv4_only) {
                line.push_str(" ipv4-only");
            } else if is_set(&address.ipv6_only) {
                line.push_str(" ipv6-only");
            }
            lines.push(line);
            push_description(&mut lines, &prefix, &address.description);
        }
        for address in &self.range_address {
            let prefix = format!("{}address {}", set_prefix, address.name);
            lines.push(format!("{} range-address {} to {}", prefix, address.from, address.to));
            push_description(&mut lines, &prefix, &address.description);
        }
        for set in &self.address_set {
            let prefix = format!("{}address-set {}", set_prefix, set.name);
            for address in &set.address {
                lines.push(format!("{} address {}", prefix, address));
            }
            for address_set in &set.address_set {
                lines.push(format!("{} address-set {}", prefix, address_set));
            }
            push_description(&mut lines, &prefix, &set.description);
        }

        Ok(lines)
    }

    fn read_line(&mut self, item: &str) -> Result<()> {
        if let Some(v) = cut_prefix(item, "address-set ") {
            let name = first_element(v);
            let rest = v[name.len()..].trim_start();
            let set = find_or_append_by_name(&mut self.address_set, name);
            if let Some(address) = cut_prefix(rest, "address ") {
                append_unique(&mut set.address, address);
            } else if let Some(address_set) = cut_prefix(rest, "address-set ") {
                append_unique(&mut set.address_set, address_set);
            } else if let Some(description) = cut_prefix(rest, "description ") {
                set.description = Some(trim_quotes(description).to_string());
            }
        } else if let Some(v) = cut_prefix(item, "address ") {
            let name = first_element(v);
            let rest = v[name.len()..].trim_start();
            if let Some(description) = cut_prefix(rest, "description ") {
                if let Some(slot) = self.address_description(name) {
                    *slot = Some(trim_quotes(description).to_string());
                }
            } else if let Some(value) = cut_prefix(rest, "wildcard-address ") {
                find_or_append_by_name(&mut self.wildcard_address, name).value = value.to_string();
            } else if let Some(value) = cut_prefix(rest, "dns-name ") {
                let dns = find_or_append_by_name(&mut self.dns_name, name);
                let host = first_element(value);
                dns.value = host.to_string();
                match value[host.len()..].trim() {
                    "ipv4-only" => dns.ipv4_only = Some(true),
                    "ipv6-only" => dns.ipv6_only = Some(true),
                    _ => {}
                }
            } else if let Some(value) = cut_prefix(rest, "range-address ") {
                let range = find_or_append_by_name(&mut self.range_address, name);
                let (from, to) = value.split_once(" to ").unwrap_or((value, ""));
                range.from = from.to_string();
                range.to = to.to_string();
            } else if !rest.is_empty() {
                find_or_append_by_name(&mut self.network_address, name).value = rest.to_string();
            }
        } else if let Some(v) = cut_prefix(item, "attach zone ") {
            append_unique(&mut self.attach_zone, v);
        } else if let Some(v) = cut_prefix(item, "description ") {
            self.description = Some(trim_quotes(v).to_string());
        }
        Ok(())
    }
}

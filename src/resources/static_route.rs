//! `junos_static_route`: static route in the master instance or in a routing
//! instance, IPv4 or IPv6.
//!
//! The configuration path depends on both keys:
//!
//! | routing instance | family | path                                                       |
//! |------------------|--------|------------------------------------------------------------|
//! | `default`        | inet   | `routing-options static route D`                           |
//! | `default`        | inet6  | `routing-options rib inet6.0 static route D`               |
//! | `RI`             | inet   | `routing-instances RI routing-options static route D`      |
//! | `RI`             | inet6  | `routing-instances RI routing-options rib RI.inet6.0 static route D` |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::junos::{cut_prefix, first_element, Session, DEFAULT_W};
use crate::provider::data::{conv_atoi64, find_or_append_by_name, join_id, split_id, Named};
use crate::provider::diag::{CONFLICT_CONFIG_ERROR_SUMMARY, MISSING_CONFIG_ERROR_SUMMARY};
use crate::provider::{
    Attribute, AttributeError, AttributePath, Block, Diagnostics, ResourceData, Schema,
    StringFormat, Validator,
};
use crate::resources::{duplicates, is_set, routing_instance_exists};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticRoute {
    pub id: Option<String>,
    pub destination: String,
    pub routing_instance: Option<String>,
    pub active: Option<bool>,
    pub community: Vec<String>,
    pub discard: Option<bool>,
    pub install: Option<bool>,
    pub metric: Option<i64>,
    pub next_hop: Vec<String>,
    pub next_table: Option<String>,
    pub no_install: Option<bool>,
    pub no_readvertise: Option<bool>,
    pub no_resolve: Option<bool>,
    pub no_retain: Option<bool>,
    pub passive: Option<bool>,
    pub preference: Option<i64>,
    pub readvertise: Option<bool>,
    pub receive: Option<bool>,
    pub reject: Option<bool>,
    pub resolve: Option<bool>,
    pub retain: Option<bool>,
    pub qualified_next_hop: Vec<QualifiedNextHop>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualifiedNextHop {
    pub next_hop: String,
    pub interface: Option<String>,
    pub metric: Option<i64>,
    pub preference: Option<i64>,
}

impl Named for QualifiedNextHop {
    fn new_named(name: &str) -> Self {
        Self {
            next_hop: name.to_string(),
            ..Self::default()
        }
    }

    fn name(&self) -> &str {
        &self.next_hop
    }
}

/// Pairs of flags Junos refuses together
const EXCLUSIVE_FLAGS: &[(&str, &str)] = &[
    ("active", "passive"),
    ("install", "no_install"),
    ("readvertise", "no_readvertise"),
    ("resolve", "no_resolve"),
    ("retain", "no_retain"),
];

impl StaticRoute {
    fn routing_instance(&self) -> &str {
        self.routing_instance.as_deref().unwrap_or(DEFAULT_W)
    }

    fn flag(&self, name: &str) -> bool {
        let flag = match name {
            "active" => &self.active,
            "passive" => &self.passive,
            "install" => &self.install,
            "no_install" => &self.no_install,
            "readvertise" => &self.readvertise,
            "no_readvertise" => &self.no_readvertise,
            "resolve" => &self.resolve,
            "no_resolve" => &self.no_resolve,
            "retain" => &self.retain,
            "no_retain" => &self.no_retain,
            _ => return false,
        };
        is_set(flag)
    }

    fn flag_lines(&self) -> [(&Option<bool>, &'static str); 13] {
        [
            (&self.active, "active"),
            (&self.passive, "passive"),
            (&self.discard, "discard"),
            (&self.receive, "receive"),
            (&self.reject, "reject"),
            (&self.install, "install"),
            (&self.no_install, "no-install"),
            (&self.readvertise, "readvertise"),
            (&self.no_readvertise, "no-readvertise"),
            (&self.resolve, "resolve"),
            (&self.no_resolve, "no-resolve"),
            (&self.retain, "retain"),
            (&self.no_retain, "no-retain"),
        ]
    }
}

fn next_hop_attributes(block: Block) -> Block {
    block
        .attribute("interface", Attribute::optional_string().validator(Validator::StringFormat(StringFormat::Interface)))
        .attribute(
            "metric",
            Attribute::optional_int64().validator(Validator::Int64Between(0, 4294967295)),
        )
        .attribute(
            "preference",
            Attribute::optional_int64().validator(Validator::Int64Between(0, 4294967295)),
        )
}

#[async_trait]
impl ResourceData for StaticRoute {
    fn type_name() -> &'static str {
        "junos_static_route"
    }

    fn schema() -> Schema {
        let mut schema = Schema::new("Provides a static route resource.")
            .attribute("id", Attribute::id())
            .attribute(
                "destination",
                Attribute::required_string()
                    .requires_replace()
                    .validator(Validator::StringCidrNetwork)
                    .description("The destination for static route."),
            )
            .attribute(
                "routing_instance",
                Attribute::optional_string()
                    .default(DEFAULT_W)
                    .requires_replace()
                    .validator(Validator::StringLengthBetween(1, 63))
                    .validator(Validator::StringFormat(StringFormat::Default))
                    .description("Routing instance for route."),
            )
            .attribute(
                "community",
                Attribute::optional_list_of_string().validator(Validator::StringSpaceExclusion),
            )
            .attribute(
                "metric",
                Attribute::optional_int64().validator(Validator::Int64Between(0, 4294967295)),
            )
            .attribute(
                "next_hop",
                Attribute::optional_list_of_string().validator(Validator::StringSpaceExclusion),
            )
            .attribute(
                "next_table",
                Attribute::optional_string().validator(Validator::StringSpaceExclusion),
            )
            .attribute(
                "preference",
                Attribute::optional_int64().validator(Validator::Int64Between(0, 4294967295)),
            )
            .block(
                "qualified_next_hop",
                next_hop_attributes(
                    Block::list().attribute(
                        "next_hop",
                        Attribute::required_string().validator(Validator::StringSpaceExclusion),
                    ),
                ),
            );
        for flag in [
            "active",
            "discard",
            "install",
            "no_install",
            "no_readvertise",
            "no_resolve",
            "no_retain",
            "passive",
            "readvertise",
            "receive",
            "reject",
            "resolve",
            "retain",
        ] {
            schema = schema.attribute(flag, Attribute::flag());
        }
        schema
    }

    fn validate_config(&self, diags: &mut Diagnostics) {
        for (a, b) in EXCLUSIVE_FLAGS {
            if self.flag(a) && self.flag(b) {
                diags.add_attribute_error(
                    AttributePath::root(*b),
                    CONFLICT_CONFIG_ERROR_SUMMARY,
                    format!("only one of {} or {} can be specified", a, b),
                );
            }
        }

        let targets: Vec<&str> = [
            (!self.next_hop.is_empty() || !self.qualified_next_hop.is_empty(), "next_hop"),
            (is_set(&self.discard), "discard"),
            (is_set(&self.receive), "receive"),
            (is_set(&self.reject), "reject"),
            (self.next_table.is_some(), "next_table"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect();
        match targets.len() {
            0 => diags.add_error(
                MISSING_CONFIG_ERROR_SUMMARY,
                "one of next_hop, qualified_next_hop, discard, receive, reject or next_table must be specified",
            ),
            1 => {}
            _ => diags.add_attribute_error(
                AttributePath::root(targets[1]),
                CONFLICT_CONFIG_ERROR_SUMMARY,
                format!("only one of {} can be specified", targets.join(", ")),
            ),
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn id_mut(&mut self) -> &mut Option<String> {
        &mut self.id
    }

    fn key_id(&self) -> String {
        join_id(&[&self.destination, self.routing_instance()])
    }

    fn id_format() -> &'static str {
        "<destination>_-_<routing_instance>"
    }

    fn from_id(id: &str) -> Option<Self> {
        let keys = split_id(id, 2)?;
        Some(Self {
            destination: keys[0].to_string(),
            routing_instance: Some(keys[1].to_string()),
            ..Self::default()
        })
    }

    fn display_name(&self) -> String {
        format!(
            "static route {} in routing-instance {}",
            self.destination,
            self.routing_instance()
        )
    }

    fn config_path(&self) -> String {
        let ri = self.routing_instance();
        let inet6 = self.destination.contains(':');
        match (ri == DEFAULT_W, inet6) {
            (true, false) => format!("routing-options static route {}", self.destination),
            (true, true) => format!("routing-options rib inet6.0 static route {}", self.destination),
            (false, false) => format!(
                "routing-instances {} routing-options static route {}",
                ri, self.destination
            ),
            (false, true) => format!(
                "routing-instances {} routing-options rib {}.inet6.0 static route {}",
                ri, ri, self.destination
            ),
        }
    }

    async fn pre_create_check(&self, sess: &dyn Session, diags: &mut Diagnostics) -> Result<()> {
        let ri = self.routing_instance();
        if !routing_instance_exists(sess, ri).await? {
            diags.add_attribute_error(
                AttributePath::root("routing_instance"),
                MISSING_CONFIG_ERROR_SUMMARY,
                format!("routing instance {:?} doesn't exist", ri),
            );
        }
        Ok(())
    }

    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError> {
        let set_prefix = self.set_prefix();
        let mut lines = Vec::new();

        if let Some(dup) = duplicates(self.qualified_next_hop.iter().map(|q| q.next_hop.as_str()))
            .first()
        {
            return Err(AttributeError::new(
                AttributePath::root("qualified_next_hop"),
                format!("multiple blocks qualified_next_hop with the same next_hop {}", dup),
            ));
        }

        for community in &self.community {
            lines.push(format!("{}community {}", set_prefix, community));
        }
        for (flag, word) in self.flag_lines() {
            if is_set(flag) {
                lines.push(format!("{}{}", set_prefix, word));
            }
        }
        if let Some(metric) = self.metric {
            lines.push(format!("{}metric {}", set_prefix, metric));
        }
        for next_hop in &self.next_hop {
            lines.push(format!("{}next-hop {}", set_prefix, next_hop));
        }
        if let Some(table) = &self.next_table {
            lines.push(format!("{}next-table {}", set_prefix, table));
        }
        if let Some(preference) = self.preference {
            lines.push(format!("{}preference {}", set_prefix, preference));
        }
        for qualified in &self.qualified_next_hop {
            let qnh_prefix = format!("{}qualified-next-hop {}", set_prefix, qualified.next_hop);
            lines.push(qnh_prefix.clone());
            if let Some(interface) = &qualified.interface {
                lines.push(format!("{} interface {}", qnh_prefix, interface));
            }
            if let Some(metric) = qualified.metric {
                lines.push(format!("{} metric {}", qnh_prefix, metric));
            }
            if let Some(preference) = qualified.preference {
                lines.push(format!("{} preference {}", qnh_prefix, preference));
            }
        }

        Ok(lines)
    }

    fn read_line(&mut self, item: &str) -> Result<()> {
        if let Some(v) = cut_prefix(item, "qualified-next-hop ") {
            let next_hop = first_element(v);
            let rest = v[next_hop.len()..].trim_start();
            let qualified = find_or_append_by_name(&mut self.qualified_next_hop, next_hop);
            if let Some(interface) = cut_prefix(rest, "interface ") {
                qualified.interface = Some(interface.to_string());
            } else if let Some(metric) = cut_prefix(rest, "metric ") {
                qualified.metric = Some(conv_atoi64("qualified_next_hop.metric", metric)?);
            } else if let Some(preference) = cut_prefix(rest, "preference ") {
                qualified.preference = Some(conv_atoi64("qualified_next_hop.preference", preference)?);
            }
        } else if let Some(v) = cut_prefix(item, "next-hop ") {
            self.next_hop.push(v.to_string());
        } else if let Some(v) = cut_prefix(item, "community ") {
            self.community.push(v.to_string());
        } else if let Some(v) = cut_prefix(item, "metric ") {
            self.metric = Some(conv_atoi64("metric", first_element(v))?);
        } else if let Some(v) = cut_prefix(item, "preference ") {
            self.preference = Some(conv_atoi64("preference", first_element(v))?);
        } else if let Some(v) = cut_prefix(item, "next-table ") {
            self.next_table = Some(v.to_string());
        } else {
            let flag = match item {
                "active" => &mut self.active,
                "passive" => &mut self.passive,
                "discard" => &mut self.discard,
                "receive" => &mut self.receive,
                "reject" => &mut self.reject,
                "install" => &mut self.install,
                "no-install" => &mut self.no_install,
                "readvertise" => &mut self.readvertise,
                "no-readvertise" => &mut self.no_readvertise,
                "resolve" => &mut self.resolve,
                "no-resolve" => &mut self.no_resolve,
                "retain" => &mut self.retain,
                "no-retain" => &mut self.no_retain,
                _ => return Ok(()),
            };
            *flag = Some(true);
        }
        Ok(())
    }
}

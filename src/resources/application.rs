//! `junos_application`: `applications application NAME`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::junos::{cut_prefix, first_element, quoted, trim_quotes};
use crate::provider::data::{conv_atoi64, find_or_append_by_name, Named};
use crate::provider::diag::{CONFLICT_CONFIG_ERROR_SUMMARY, DUPLICATE_CONFIG_ERROR_SUMMARY};
use crate::provider::{
    Attribute, AttributeError, AttributePath, AttributeSet, Block, Diagnostics, ResourceData,
    Schema, StringFormat, Validator,
};
use crate::resources::{duplicates, is_set};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Application {
    pub id: Option<String>,
    pub name: String,
    pub application_protocol: Option<String>,
    pub description: Option<String>,
    pub destination_port: Option<String>,
    pub ether_type: Option<String>,
    pub inactivity_timeout: Option<i64>,
    pub inactivity_timeout_never: Option<bool>,
    pub protocol: Option<String>,
    pub rpc_program_number: Option<String>,
    pub source_port: Option<String>,
    pub uuid: Option<String>,
    pub term: Vec<ApplicationTerm>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationTerm {
    pub name: String,
    pub protocol: String,
    pub alg: Option<String>,
    pub destination_port: Option<String>,
    pub icmp_code: Option<String>,
    pub icmp_type: Option<String>,
    pub icmp6_code: Option<String>,
    pub icmp6_type: Option<String>,
    pub inactivity_timeout: Option<i64>,
    pub inactivity_timeout_never: Option<bool>,
    pub rpc_program_number: Option<String>,
    pub source_port: Option<String>,
    pub uuid: Option<String>,
}

impl Named for ApplicationTerm {
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

impl Application {
    /// Top-level attributes that cannot be combined with terms
    fn term_conflicts(&self) -> Vec<&'static str> {
        [
            (self.application_protocol.is_some(), "application_protocol"),
            (self.destination_port.is_some(), "destination_port"),
            (self.ether_type.is_some(), "ether_type"),
            (self.inactivity_timeout.is_some(), "inactivity_timeout"),
            (is_set(&self.inactivity_timeout_never), "inactivity_timeout_never"),
            (self.protocol.is_some(), "protocol"),
            (self.rpc_program_number.is_some(), "rpc_program_number"),
            (self.source_port.is_some(), "source_port"),
            (self.uuid.is_some(), "uuid"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

fn timeout_attributes<T: AttributeSet>(set: T) -> T {
    set.with_attribute(
        "inactivity_timeout",
        Attribute::optional_int64().validator(Validator::Int64Between(4, 86400)),
    )
    .with_attribute("inactivity_timeout_never", Attribute::flag())
}

fn port_attributes<T: AttributeSet>(set: T) -> T {
    let port = || Attribute::optional_string().validator(Validator::StringSpaceExclusion);
    set.with_attribute("destination_port", port())
        .with_attribute("rpc_program_number", port())
        .with_attribute("source_port", port())
        .with_attribute("uuid", port())
}

fn timeout_conflict(
    timeout: Option<i64>,
    never: &Option<bool>,
    path: AttributePath,
    diags: &mut Diagnostics,
) {
    if timeout.is_some() && is_set(never) {
        diags.add_attribute_error(
            path,
            CONFLICT_CONFIG_ERROR_SUMMARY,
            "only one of inactivity_timeout or inactivity_timeout_never can be specified",
        );
    }
}

fn push_timeout(lines: &mut Vec<String>, prefix: &str, timeout: Option<i64>, never: &Option<bool>) {
    if let Some(timeout) = timeout {
        lines.push(format!("{}inactivity-timeout {}", prefix, timeout));
    } else if is_set(never) {
        lines.push(format!("{}inactivity-timeout never", prefix));
    }
}

impl ResourceData for Application {
    fn type_name() -> &'static str {
        "junos_application"
    }

    fn schema() -> Schema {
        let schema = Schema::new("Provides an application resource.")
            .attribute("id", Attribute::id())
            .attribute("name", Attribute::name(63).description("Application name."))
            .attribute(
                "application_protocol",
                Attribute::optional_string().validator(Validator::StringSpaceExclusion),
            )
            .attribute("description", Attribute::description_text())
            .attribute(
                "ether_type",
                Attribute::optional_string().validator(Validator::StringSpaceExclusion),
            )
            .attribute(
                "protocol",
                Attribute::optional_string().validator(Validator::StringSpaceExclusion),
            );
        let schema = timeout_attributes(port_attributes(schema));

        let term = Block::list()
            .description("For each term, define an application term.")
            .attribute(
                "name",
                Attribute::required_string()
                    .validator(Validator::StringLengthBetween(1, 63))
                    .validator(Validator::StringFormat(StringFormat::Default)),
            )
            .attribute(
                "protocol",
                Attribute::required_string().validator(Validator::StringSpaceExclusion),
            )
            .attribute(
                "alg",
                Attribute::optional_string().validator(Validator::StringSpaceExclusion),
            );
        let mut term = timeout_attributes(port_attributes(term));
        for icmp in ["icmp_code", "icmp_type", "icmp6_code", "icmp6_type"] {
            term = term.attribute(
                icmp,
                Attribute::optional_string().validator(Validator::StringSpaceExclusion),
            );
        }

        schema.block("term", term)
    }

    fn validate_config(&self, diags: &mut Diagnostics) {
        timeout_conflict(
            self.inactivity_timeout,
            &self.inactivity_timeout_never,
            AttributePath::root("inactivity_timeout"),
            diags,
        );

        if self.term.is_empty() {
            return;
        }
        if let Some(conflict) = self.term_conflicts().first() {
            diags.add_attribute_error(
                AttributePath::root(*conflict),
                CONFLICT_CONFIG_ERROR_SUMMARY,
                format!("{} cannot be configured with term", conflict),
            );
        }
        for dup in duplicates(self.term.iter().map(|t| t.name.as_str())) {
            diags.add_attribute_error(
                AttributePath::root("term"),
                DUPLICATE_CONFIG_ERROR_SUMMARY,
                format!("multiple term blocks with the same name {}", dup),
            );
        }
        for (i, term) in self.term.iter().enumerate() {
            timeout_conflict(
                term.inactivity_timeout,
                &term.inactivity_timeout_never,
                AttributePath::root("term").index(i).name("inactivity_timeout"),
                diags,
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
        format!("application {}", self.name)
    }

    fn config_path(&self) -> String {
        format!("applications application {}", self.name)
    }

    fn set_lines(&self) -> std::result::Result<Vec<String>, AttributeError> {
        let set_prefix = self.set_prefix();
        let mut lines = vec![set_prefix.trim_end().to_string()];

        let simple = [
            (&self.application_protocol, "application-protocol"),
            (&self.destination_port, "destination-port"),
            (&self.ether_type, "ether-type"),
            (&self.protocol, "protocol"),
            (&self.rpc_program_number, "rpc-program-number"),
            (&self.source_port, "source-port"),
            (&self.uuid, "uuid"),
        ];
        for (value, word) in simple {
            if let Some(value) = value {
                lines.push(format!("{}{} {}", set_prefix, word, value));
            }
        }
        if let Some(description) = &self.description {
            lines.push(format!("{}description {}", set_prefix, quoted(description)));
        }
        push_timeout(
            &mut lines,
            &set_prefix,
            self.inactivity_timeout,
            &self.inactivity_timeout_never,
        );

        if let Some(dup) = duplicates(self.term.iter().map(|t| t.name.as_str())).first() {
            return Err(AttributeError::new(
                AttributePath::root("term"),
                format!("multiple term blocks with the same name {}", dup),
            ));
        }
        for term in &self.term {
            let term_prefix = format!("{}term {} ", set_prefix, term.name);
            lines.push(format!("{}protocol {}", term_prefix, term.protocol));
            let options = [
                (&term.alg, "alg"),
                (&term.destination_port, "destination-port"),
                (&term.icmp_code, "icmp-code"),
                (&term.icmp_type, "icmp-type"),
                (&term.icmp6_code, "icmp6-code"),
                (&term.icmp6_type, "icmp6-type"),
                (&term.rpc_program_number, "rpc-program-number"),
                (&term.source_port, "source-port"),
                (&term.uuid, "uuid"),
            ];
            for (value, word) in options {
                if let Some(value) = value {
                    lines.push(format!("{}{} {}", term_prefix, word, value));
                }
            }
            push_timeout(
                &mut lines,
                &term_prefix,
                term.inactivity_timeout,
                &term.inactivity_timeout_never,
            );
        }

        Ok(lines)
    }

    fn read_line(&mut self, item: &str) -> Result<()> {
        if let Some(v) = cut_prefix(item, "term ") {
            let name = first_element(v);
            let rest = v[name.len()..].trim_start();
            let term = find_or_append_by_name(&mut self.term, name);
            if rest == "inactivity-timeout never" {
                term.inactivity_timeout_never = Some(true);
            } else if let Some(timeout) = cut_prefix(rest, "inactivity-timeout ") {
                term.inactivity_timeout = Some(conv_atoi64("term.inactivity_timeout", timeout)?);
            } else if let Some(protocol) = cut_prefix(rest, "protocol ") {
                term.protocol = protocol.to_string();
            } else {
                let (word, value) = rest.split_once(' ').unwrap_or((rest, ""));
                let field = match word {
                    "alg" => &mut term.alg,
                    "destination-port" => &mut term.destination_port,
                    "icmp-code" => &mut term.icmp_code,
                    "icmp-type" => &mut term.icmp_type,
                    "icmp6-code" => &mut term.icmp6_code,
                    "icmp6-type" => &mut term.icmp6_type,
                    "rpc-program-number" => &mut term.rpc_program_number,
                    "source-port" => &mut term.source_port,
                    "uuid" => &mut term.uuid,
                    _ => return Ok(()),
                };
                *field = Some(value.to_string());
            }
            return Ok(());
        }

        if item == "inactivity-timeout never" {
            self.inactivity_timeout_never = Some(true);
        } else if let Some(v) = cut_prefix(item, "inactivity-timeout ") {
            self.inactivity_timeout = Some(conv_atoi64("inactivity_timeout", v)?);
        } else if let Some(v) = cut_prefix(item, "description ") {
            self.description = Some(trim_quotes(v).to_string());
        } else {
            let (word, value) = item.split_once(' ').unwrap_or((item, ""));
            let field = match word {
                "application-protocol" => &mut self.application_protocol,
                "destination-port" => &mut self.destination_port,
                "ether-type" => &mut self.ether_type,
                "protocol" => &mut self.protocol,
                "rpc-program-number" => &mut self.rpc_program_number,
                "source-port" => &mut self.source_port,
                "uuid" => &mut self.uuid,
                _ => return Ok(()),
            };
            *field = Some(value.to_string());
        }
        Ok(())
    }
}

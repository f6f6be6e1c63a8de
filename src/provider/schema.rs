//! Resource schemas.
//!
//! A [`Schema`] describes the document accepted by a resource: its attributes,
//! their types and validators, and nested blocks. Schemas check documents
//! before they are decoded into resource structs, fill defaults and decide
//! which attribute changes force a replacement.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use super::diag::{
    AttributePath, Diagnostics, INCORRECT_VALUE_TYPE_SUMMARY, INVALID_ATTRIBUTE_VALUE_SUMMARY,
    MISSING_ATTRIBUTE_SUMMARY, UNSUPPORTED_ATTRIBUTE_SUMMARY,
};
use super::validator::{StringFormat, Validator};

/// Value type of an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    String,
    Bool,
    Int64,
    ListOfString,
    SetOfString,
}

impl AttributeKind {
    fn matches(&self, value: &Value) -> bool {
        match self {
            AttributeKind::String => value.is_string(),
            AttributeKind::Bool => value.is_boolean(),
            AttributeKind::Int64 => value.as_i64().is_some(),
            AttributeKind::ListOfString | AttributeKind::SetOfString => value
                .as_array()
                .map_or(false, |items| items.iter().all(Value::is_string)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Bool => "bool",
            AttributeKind::Int64 => "int64",
            AttributeKind::ListOfString => "list of string",
            AttributeKind::SetOfString => "set of string",
        }
    }
}

/// Modifier applied when planning a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanModifier {
    /// A different value destroys and recreates the resource
    RequiresReplace,
    /// Keep the prior state value when the plan leaves it unset
    UseStateForUnknown,
}

/// Schema of one attribute
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    pub kind: AttributeKind,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<Validator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plan_modifiers: Vec<PlanModifier>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Attribute {
    fn new(kind: AttributeKind, required: bool, optional: bool, computed: bool) -> Self {
        Self {
            kind,
            required,
            optional,
            computed,
            sensitive: false,
            default: None,
            validators: Vec::new(),
            plan_modifiers: Vec::new(),
            description: String::new(),
        }
    }

    pub fn required_string() -> Self {
        Self::new(AttributeKind::String, true, false, false)
    }

    pub fn optional_string() -> Self {
        Self::new(AttributeKind::String, false, true, false)
    }

    /// The `id` attribute every resource carries
    pub fn id() -> Self {
        Self::new(AttributeKind::String, false, false, true)
            .plan_modifier(PlanModifier::UseStateForUnknown)
            .description("An identifier for the resource.")
    }

    pub fn optional_bool() -> Self {
        Self::new(AttributeKind::Bool, false, true, false)
    }

    /// Junos flag: true or absent
    pub fn flag() -> Self {
        Self::optional_bool().validator(Validator::BoolTrue)
    }

    pub fn required_int64() -> Self {
        Self::new(AttributeKind::Int64, true, false, false)
    }

    pub fn optional_int64() -> Self {
        Self::new(AttributeKind::Int64, false, true, false)
    }

    pub fn optional_list_of_string() -> Self {
        Self::new(AttributeKind::ListOfString, false, true, false)
            .validator(Validator::ValueLengthAtLeast(1))
    }

    pub fn optional_set_of_string() -> Self {
        Self::new(AttributeKind::SetOfString, false, true, false)
            .validator(Validator::ValueLengthAtLeast(1))
    }

    /// Name of a configuration object: 1 to `max` chars in the default format
    pub fn name(max: usize) -> Self {
        Self::required_string()
            .requires_replace()
            .validator(Validator::StringLengthBetween(1, max))
            .validator(Validator::StringFormat(StringFormat::Default))
    }

    /// Free text sent quoted to the device
    pub fn description_text() -> Self {
        Self::optional_string()
            .validator(Validator::StringLengthBetween(1, 900))
            .validator(Validator::StringDoubleQuoteExclusion)
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn plan_modifier(mut self, modifier: PlanModifier) -> Self {
        self.plan_modifiers.push(modifier);
        self
    }

    pub fn requires_replace(self) -> Self {
        self.plan_modifier(PlanModifier::RequiresReplace)
    }

    /// Value used when the attribute is unset; the attribute becomes computed
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn has_modifier(&self, modifier: PlanModifier) -> bool {
        self.plan_modifiers.contains(&modifier)
    }
}

/// Nesting mode of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Nesting {
    List,
    Single,
}

/// Nested block of attributes
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    pub nesting: Nesting,
    pub attributes: IndexMap<String, Attribute>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub blocks: IndexMap<String, Block>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Block {
    fn new(nesting: Nesting) -> Self {
        Self {
            nesting,
            attributes: IndexMap::new(),
            blocks: IndexMap::new(),
            max_items: None,
            description: String::new(),
        }
    }

    pub fn list() -> Self {
        Self::new(Nesting::List)
    }

    pub fn single() -> Self {
        Self::new(Nesting::Single)
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn block(mut self, name: impl Into<String>, block: Block) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Schema of a resource
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub description: String,
    pub attributes: IndexMap<String, Attribute>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub blocks: IndexMap<String, Block>,
}

/// Anything attributes can be added to, so attribute groups shared by a
/// resource and its blocks are written once.
pub trait AttributeSet: Sized {
    fn with_attribute(self, name: &str, attribute: Attribute) -> Self;
}

impl AttributeSet for Block {
    fn with_attribute(self, name: &str, attribute: Attribute) -> Self {
        self.attribute(name, attribute)
    }
}

impl AttributeSet for Schema {
    fn with_attribute(self, name: &str, attribute: Attribute) -> Self {
        self.attribute(name, attribute)
    }
}

impl Schema {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            attributes: IndexMap::new(),
            blocks: IndexMap::new(),
        }
    }

    pub fn attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.attributes.insert(name.into(), attribute);
        self
    }

    pub fn block(mut self, name: impl Into<String>, block: Block) -> Self {
        self.blocks.insert(name.into(), block);
        self
    }

    /// Check a resource document against the schema.
    pub fn validate_value(&self, value: &Value) -> Diagnostics {
        let mut diags = Diagnostics::new();
        match value.as_object() {
            Some(object) => validate_object(
                &self.attributes,
                &self.blocks,
                object,
                &AttributePath::default(),
                &mut diags,
            ),
            None => diags.add_error(
                INCORRECT_VALUE_TYPE_SUMMARY,
                "resource document must be an object",
            ),
        }
        diags
    }

    /// Fill unset attributes that have a default.
    pub fn apply_defaults(&self, value: &mut Value) {
        if let Some(object) = value.as_object_mut() {
            defaults_object(&self.attributes, &self.blocks, object);
        }
    }

    /// Top-level attributes marked [`PlanModifier::RequiresReplace`] whose
    /// value differs between `prior` and `planned`.
    pub fn replace_paths(&self, prior: &Value, planned: &Value) -> Vec<AttributePath> {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.has_modifier(PlanModifier::RequiresReplace))
            .filter(|(name, _)| non_null(prior.get(name.as_str())) != non_null(planned.get(name.as_str())))
            .map(|(name, _)| AttributePath::root(name.clone()))
            .collect()
    }

    /// Copy prior values of [`PlanModifier::UseStateForUnknown`] attributes
    /// left unset in `planned`.
    pub fn carry_state(&self, prior: &Value, planned: &mut Value) {
        let Some(object) = planned.as_object_mut() else {
            return;
        };
        for (name, attr) in &self.attributes {
            if !attr.has_modifier(PlanModifier::UseStateForUnknown)
                || non_null(object.get(name.as_str())).is_some()
            {
                continue;
            }
            if let Some(value) = non_null(prior.get(name.as_str())) {
                object.insert(name.clone(), value.clone());
            }
        }
    }
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn validate_object(
    attributes: &IndexMap<String, Attribute>,
    blocks: &IndexMap<String, Block>,
    object: &Map<String, Value>,
    path: &AttributePath,
    diags: &mut Diagnostics,
) {
    for key in object.keys() {
        if !attributes.contains_key(key) && !blocks.contains_key(key) {
            diags.add_attribute_error(
                path.clone().name(key.clone()),
                UNSUPPORTED_ATTRIBUTE_SUMMARY,
                format!("an argument named \"{}\" is not expected here", key),
            );
        }
    }

    for (name, attr) in attributes {
        let attr_path = path.clone().name(name.clone());
        let value = match non_null(object.get(name.as_str())) {
            Some(value) => value,
            None => {
                if attr.required {
                    diags.add_attribute_error(
                        attr_path,
                        MISSING_ATTRIBUTE_SUMMARY,
                        format!("the argument \"{}\" is required", name),
                    );
                }
                continue;
            }
        };

        if !attr.kind.matches(value) {
            diags.add_attribute_error(
                attr_path,
                INCORRECT_VALUE_TYPE_SUMMARY,
                format!("expected {}, got: {}", attr.kind.name(), value),
            );
            continue;
        }

        if attr.kind == AttributeKind::SetOfString {
            let mut seen = HashSet::new();
            if let Some(dup) = value
                .as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
                .find(|item| !seen.insert(*item))
            {
                diags.add_attribute_error(
                    attr_path.clone(),
                    INVALID_ATTRIBUTE_VALUE_SUMMARY,
                    format!("duplicate set element \"{}\"", dup),
                );
            }
        }

        for validator in &attr.validators {
            if let Err(message) = validator.validate(value) {
                diags.add_attribute_error(
                    attr_path.clone(),
                    INVALID_ATTRIBUTE_VALUE_SUMMARY,
                    message,
                );
            }
        }
    }

    for (name, block) in blocks {
        let block_path = path.clone().name(name.clone());
        let Some(value) = non_null(object.get(name.as_str())) else {
            continue;
        };

        match (block.nesting, value) {
            (Nesting::Single, Value::Object(inner)) => {
                validate_object(&block.attributes, &block.blocks, inner, &block_path, diags)
            }
            (Nesting::List, Value::Array(items)) => {
                if let Some(max) = block.max_items {
                    if items.len() > max {
                        diags.add_attribute_error(
                            block_path.clone(),
                            INVALID_ATTRIBUTE_VALUE_SUMMARY,
                            format!("no more than {} \"{}\" blocks are allowed", max, name),
                        );
                    }
                }
                for (i, item) in items.iter().enumerate() {
                    let item_path = block_path.clone().index(i);
                    match item.as_object() {
                        Some(inner) => validate_object(
                            &block.attributes,
                            &block.blocks,
                            inner,
                            &item_path,
                            diags,
                        ),
                        None => diags.add_attribute_error(
                            item_path,
                            INCORRECT_VALUE_TYPE_SUMMARY,
                            format!("expected block object, got: {}", item),
                        ),
                    }
                }
            }
            _ => diags.add_attribute_error(
                block_path,
                INCORRECT_VALUE_TYPE_SUMMARY,
                format!("unexpected value for block \"{}\": {}", name, value),
            ),
        }
    }
}

fn defaults_object(
    attributes: &IndexMap<String, Attribute>,
    blocks: &IndexMap<String, Block>,
    object: &mut Map<String, Value>,
) {
    for (name, attr) in attributes {
        if let Some(default) = &attr.default {
            if non_null(object.get(name.as_str())).is_none() {
                object.insert(name.clone(), default.clone());
            }
        }
    }

    for (name, block) in blocks {
        match object.get_mut(name.as_str()) {
            Some(Value::Object(inner)) => defaults_object(&block.attributes, &block.blocks, inner),
            Some(Value::Array(items)) => {
                for inner in items.iter_mut().filter_map(Value::as_object_mut) {
                    defaults_object(&block.attributes, &block.blocks, inner);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::diag::Severity;
    use serde_json::json;

    fn timeout<T: AttributeSet>(set: T) -> T {
        set.with_attribute("timeout", Attribute::optional_int64())
    }

    #[test]
    fn test_shared_attribute_group() {
        let schema = timeout(Schema::new("test")).block("term", timeout(Block::list()));
        assert!(schema.attributes.contains_key("timeout"));
        assert!(schema.blocks["term"].attributes.contains_key("timeout"));
    }

    fn schema() -> Schema {
        Schema::new("test")
            .attribute("id", Attribute::id())
            .attribute("name", Attribute::name(32))
            .attribute("kind", Attribute::optional_string().default("virtual-router"))
            .attribute("members", Attribute::optional_set_of_string())
            .attribute("flag", Attribute::flag())
            .block(
                "term",
                Block::list()
                    .attribute("name", Attribute::required_string())
                    .attribute("port", Attribute::optional_int64()),
            )
            .block("vxlan", Block::list().max_items(1).attribute("vni", Attribute::optional_int64()))
    }

    fn paths(diags: &Diagnostics) -> Vec<String> {
        diags
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .filter_map(|d| d.attribute.as_ref().map(ToString::to_string))
            .collect()
    }

    #[test]
    fn test_valid_document() {
        let diags = schema().validate_value(&json!({
            "name": "ri1",
            "members": ["a", "b"],
            "flag": true,
            "term": [{"name": "t1", "port": 22}]
        }));
        assert!(!diags.has_error(), "{:?}", diags);
    }

    #[test]
    fn test_errors_carry_paths() {
        let diags = schema().validate_value(&json!({
            "bogus": 1,
            "members": ["a", "a"],
            "flag": false,
            "term": [{"port": "22"}],
            "vxlan": [{"vni": 1}, {"vni": 2}]
        }));
        assert_eq!(
            paths(&diags),
            vec!["bogus", "name", "members", "flag", "term[0].name", "term[0].port", "vxlan"]
        );
    }

    #[test]
    fn test_not_an_object() {
        assert!(schema().validate_value(&json!([1])).has_error());
    }

    #[test]
    fn test_apply_defaults() {
        let mut doc = json!({"name": "ri1", "kind": null});
        schema().apply_defaults(&mut doc);
        assert_eq!(doc["kind"], json!("virtual-router"));

        let mut doc = json!({"name": "ri1", "kind": ""});
        schema().apply_defaults(&mut doc);
        assert_eq!(doc["kind"], json!(""));
    }

    #[test]
    fn test_replace_paths() {
        let s = schema();
        let prior = json!({"id": "ri1", "name": "ri1"});
        assert!(s.replace_paths(&prior, &json!({"name": "ri1", "flag": true})).is_empty());
        let replaced = s.replace_paths(&prior, &json!({"name": "ri2"}));
        assert_eq!(replaced, vec![AttributePath::root("name")]);
    }

    #[test]
    fn test_carry_state() {
        let s = schema();
        let mut planned = json!({"name": "ri1"});
        s.carry_state(&json!({"id": "ri1", "name": "ri1"}), &mut planned);
        assert_eq!(planned["id"], json!("ri1"));
    }
}

//! Diagnostics returned by every provider operation.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const MISSING_CONFIG_ERROR_SUMMARY: &str = "Missing Configuration Error";
pub const CONFLICT_CONFIG_ERROR_SUMMARY: &str = "Conflict Configuration Error";
pub const DUPLICATE_CONFIG_ERROR_SUMMARY: &str = "Duplicate Configuration Error";
pub const PRE_CHECK_ERROR_SUMMARY: &str = "Pre Check Error";
pub const POST_CHECK_ERROR_SUMMARY: &str = "Post Check Error";
pub const NOT_FOUND_ERROR_SUMMARY: &str = "Not Found Error";
pub const START_SESS_ERROR_SUMMARY: &str = "Start Session Error";
pub const CONFIG_LOCK_ERROR_SUMMARY: &str = "Config Lock Error";
pub const CONFIG_SET_ERROR_SUMMARY: &str = "Config Set Error";
pub const CONFIG_DEL_ERROR_SUMMARY: &str = "Config Del Error";
pub const CONFIG_READ_ERROR_SUMMARY: &str = "Config Read Error";
pub const CONFIG_COMMIT_ERROR_SUMMARY: &str = "Config Commit Error";
pub const CONFIG_COMMIT_WARNING_SUMMARY: &str = "Config Commit Warning";
pub const CONFIG_CLEAR_UNLOCK_WARNING_SUMMARY: &str = "Config Clear/Unlock Warning";
pub const INVALID_ATTRIBUTE_VALUE_SUMMARY: &str = "Invalid Attribute Value";
pub const INCORRECT_VALUE_TYPE_SUMMARY: &str = "Incorrect Attribute Value Type";
pub const MISSING_ATTRIBUTE_SUMMARY: &str = "Missing Required Attribute";
pub const UNSUPPORTED_ATTRIBUTE_SUMMARY: &str = "Unsupported Attribute";
pub const REQUIRES_REPLACE_SUMMARY: &str = "Resource Requires Replacement";
pub const IMPORT_ERROR_SUMMARY: &str = "Import Error";

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One step of an attribute path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathStep {
    /// Attribute or block name
    Name(String),
    /// Element of a list or set block
    Index(usize),
}

/// Location of an attribute inside a resource document.
///
/// ```rust
/// use junos_provider::provider::AttributePath;
///
/// let path = AttributePath::root("term").index(0).name("protocol");
/// assert_eq!(path.to_string(), "term[0].protocol");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributePath(Vec<PathStep>);

impl AttributePath {
    /// Path of a top-level attribute
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![PathStep::Name(name.into())])
    }

    /// Descend into a named attribute
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathStep::Name(name.into()));
        self
    }

    /// Descend into a list element
    pub fn index(mut self, index: usize) -> Self {
        self.0.push(PathStep::Index(index));
        self
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Name(name) if i == 0 => write!(f, "{}", name)?,
                PathStep::Name(name) => write!(f, ".{}", name)?,
                PathStep::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// A single diagnostic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<AttributePath>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        write!(f, "{}: {}", level, self.summary)?;
        if let Some(attribute) = &self.attribute {
            write!(f, " ({})", attribute)?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl fmt::Display) {
        self.push(Severity::Error, summary, detail, None);
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl fmt::Display) {
        self.push(Severity::Warning, summary, detail, None);
    }

    pub fn add_attribute_error(
        &mut self,
        path: AttributePath,
        summary: impl Into<String>,
        detail: impl fmt::Display,
    ) {
        self.push(Severity::Error, summary, detail, Some(path));
    }

    fn push(
        &mut self,
        severity: Severity,
        summary: impl Into<String>,
        detail: impl fmt::Display,
        attribute: Option<AttributePath>,
    ) {
        self.0.push(Diagnostic {
            severity,
            summary: summary.into(),
            detail: detail.to_string(),
            attribute,
        });
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_path_display() {
        let path = AttributePath::root("qualified_next_hop")
            .index(2)
            .name("interface");
        assert_eq!(path.to_string(), "qualified_next_hop[2].interface");
        assert_eq!(AttributePath::default().to_string(), "");
    }

    #[test]
    fn test_diagnostics_severity() {
        let mut diags = Diagnostics::new();
        diags.add_warning(CONFIG_COMMIT_WARNING_SUMMARY, "warning: foo");
        assert!(!diags.has_error());

        diags.add_attribute_error(
            AttributePath::root("address_to"),
            CONFLICT_CONFIG_ERROR_SUMMARY,
            "only one of address_port or address_to can be set",
        );
        assert!(diags.has_error());
        assert_eq!(diags.errors().count(), 1);
        assert_eq!(diags.warnings().count(), 1);
        assert_eq!(
            diags.errors().next().map(ToString::to_string).unwrap(),
            "Error: Conflict Configuration Error (address_to): only one of address_port or address_to can be set"
        );
    }

    #[test]
    fn test_diagnostics_serialize() {
        let mut diags = Diagnostics::new();
        diags.add_error(NOT_FOUND_ERROR_SUMMARY, "missing");
        let json = serde_json::to_value(&diags).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"severity": "error", "summary": "Not Found Error", "detail": "missing"}])
        );
    }
}

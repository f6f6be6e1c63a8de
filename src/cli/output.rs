//! Output formatting module for junos-provider
//!
//! Documents go to stdout in the selected format; diagnostics and
//! human-oriented messages go to stderr.

use colored::Colorize;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

use junos_provider::provider::{Diagnostic, Diagnostics, Severity};

use super::OutputFormat;

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Document format
    format: OutputFormat,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, format: OutputFormat, verbosity: u8) -> Self {
        // Respect NO_COLOR environment variable
        let use_color =
            use_color && format == OutputFormat::Human && std::env::var("NO_COLOR").is_err();

        Self {
            use_color,
            format,
            verbosity,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Print a document on stdout
    pub fn document<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Human => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
        };
        println!("{}", rendered.trim_end());
        Ok(())
    }

    /// Print configuration lines on stdout
    pub fn lines(&self, lines: &[String]) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Human => {
                for line in lines {
                    println!("{}", line);
                }
                Ok(())
            }
            _ => self.document(&lines),
        }
    }

    /// Print a unified diff between two sets of lines on stdout
    pub fn diff(&self, old: &[String], new: &[String]) -> anyhow::Result<()> {
        if self.format != OutputFormat::Human {
            let diff = LineDiff::new(old, new);
            return self.document(&diff);
        }

        let old = join_lines(old);
        let new = join_lines(new);
        let diff = TextDiff::from_lines(&old, &new);
        for change in diff.iter_all_changes() {
            let line = change.value().trim_end_matches('\n');
            let (sign, text) = match change.tag() {
                ChangeTag::Delete => ("-", line),
                ChangeTag::Insert => ("+", line),
                ChangeTag::Equal => (" ", line),
            };
            let rendered = format!("{} {}", sign, text);
            if !self.use_color {
                println!("{}", rendered);
                continue;
            }
            match change.tag() {
                ChangeTag::Delete => println!("{}", rendered.red()),
                ChangeTag::Insert => println!("{}", rendered.green()),
                ChangeTag::Equal => println!("{}", rendered.dimmed()),
            }
        }
        Ok(())
    }

    /// Print every diagnostic on stderr
    pub fn diagnostics(&self, diags: &Diagnostics) {
        if self.format == OutputFormat::Json {
            for diag in diags.iter() {
                if let Ok(line) = serde_json::to_string(diag) {
                    eprintln!("{}", line);
                }
            }
            return;
        }

        for diag in diags.iter() {
            eprintln!("{}", self.render_diagnostic(diag));
        }
    }

    fn render_diagnostic(&self, diag: &Diagnostic) -> String {
        if !self.use_color {
            return diag.to_string();
        }

        let level = match diag.severity {
            Severity::Error => "Error".red().bold(),
            Severity::Warning => "Warning".yellow().bold(),
        };
        let mut out = format!("{}: {}", level, diag.summary.bold());
        if let Some(attribute) = &diag.attribute {
            out.push_str(&format!(" ({})", attribute.to_string().cyan()));
        }
        if !diag.detail.is_empty() {
            out.push_str(&format!(": {}", diag.detail));
        }
        out
    }

    /// Print an informational message on stderr
    pub fn info(&self, message: &str) {
        if self.format != OutputFormat::Human {
            return;
        }
        if self.use_color {
            eprintln!("{}", message.bright_white());
        } else {
            eprintln!("{}", message);
        }
    }

    /// Print a debug message when verbose
    pub fn debug(&self, message: &str) {
        if self.verbosity < 2 || self.format != OutputFormat::Human {
            return;
        }
        if self.use_color {
            eprintln!("{}", message.bright_black());
        } else {
            eprintln!("{}", message);
        }
    }
}

/// Machine-readable line diff
#[derive(Debug, Serialize, PartialEq)]
pub struct LineDiff {
    pub remove: Vec<String>,
    pub add: Vec<String>,
}

impl LineDiff {
    pub fn new(old: &[String], new: &[String]) -> Self {
        Self {
            remove: old.iter().filter(|l| !new.contains(l)).cloned().collect(),
            add: new.iter().filter(|l| !old.contains(l)).cloned().collect(),
        }
    }
}

fn join_lines(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use junos_provider::provider::AttributePath;

    #[test]
    fn test_line_diff() {
        let old = vec!["set vlans v1".to_string(), "set vlans v1 vlan-id 10".to_string()];
        let new = vec!["set vlans v1".to_string(), "set vlans v1 vlan-id 20".to_string()];
        assert_eq!(
            LineDiff::new(&old, &new),
            LineDiff {
                remove: vec!["set vlans v1 vlan-id 10".to_string()],
                add: vec!["set vlans v1 vlan-id 20".to_string()],
            }
        );
    }

    #[test]
    fn test_plain_diagnostic_rendering() {
        let formatter = OutputFormatter::new(false, OutputFormat::Human, 0);
        let mut diags = Diagnostics::new();
        diags.add_attribute_error(
            AttributePath::root("vlan_id"),
            "Invalid Attribute Value",
            "value must be between 1 and 4094, got: 0",
        );
        let rendered = formatter.render_diagnostic(diags.iter().next().unwrap());
        assert_eq!(
            rendered,
            "Error: Invalid Attribute Value (vlan_id): value must be between 1 and 4094, got: 0"
        );
    }

    #[test]
    fn test_join_lines() {
        assert_eq!(join_lines(&[]), "");
        assert_eq!(join_lines(&["a".to_string(), "b".to_string()]), "a\nb\n");
    }
}

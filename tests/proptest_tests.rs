//! Property-based tests for junos-provider using proptest.
//!
//! Random statements, names and values exercise the parsing helpers, the
//! in-memory device and attribute validation.

use proptest::collection::vec;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

use junos_provider::config::ProviderConfig;
use junos_provider::junos::{
    display_set_lines, first_element, quoted, trim_quotes, MemorySession, Session,
    SharedSessionFactory,
};
use junos_provider::provider::data::{join_id, split_id};
use junos_provider::provider::{Provider, ProviderData};

// ============================================================================
// Strategies for generating test data
// ============================================================================

/// Strategy for a configuration keyword or name
fn word() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9-]{0,15}").unwrap()
}

/// Strategy for a statement path of a few words
fn statement() -> impl Strategy<Value = String> {
    vec(word(), 1..5).prop_map(|words| words.join(" "))
}

/// Strategy for free text without double quotes or line breaks
fn text() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 _.:/-]{0,40}").unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// ============================================================================
// Parsing Helpers
// ============================================================================

proptest! {
    #[test]
    fn display_set_lines_returns_statements(statements in vec(statement(), 0..20)) {
        let mut output = String::from("<configuration-output>\n");
        for s in &statements {
            output.push_str(&format!("set {}\r\n\n", s));
        }
        output.push_str("</configuration-output>\nset ignored after end\n");

        let items: Vec<&str> = display_set_lines(&output).collect();
        prop_assert_eq!(items, statements.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn quoted_values_trim_back(value in text()) {
        let q = quoted(&value);
        prop_assert_eq!(trim_quotes(&q), value.as_str());
    }

    #[test]
    fn first_element_of_statement(head in word(), rest in statement()) {
        let item = format!("{} {}", head, rest);
        prop_assert_eq!(first_element(&item), head.as_str());

        let quoted_item = format!("{} {}", quoted(&format!("{} x", head)), rest);
        let expected = quoted(&format!("{} x", head));
        prop_assert_eq!(first_element(&quoted_item), expected.as_str());
    }

    #[test]
    fn ids_split_back(a in word(), b in word()) {
        let id = join_id(&[&a, &b]);
        prop_assert_eq!(split_id(&id, 2), Some(vec![a.as_str(), b.as_str()]));
        prop_assert_eq!(split_id(&id, 3), None);
    }
}

// ============================================================================
// In-Memory Device
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn set_is_idempotent(statements in vec(statement(), 1..15)) {
        let rt = runtime();
        let sess = MemorySession::new("mem");
        let lines: Vec<String> = statements.iter().map(|s| format!("set {}", s)).collect();

        rt.block_on(async {
            sess.config_lock().await.unwrap();
            sess.config_set(&lines).await.unwrap();
            sess.config_set(&lines).await.unwrap();
            sess.commit_conf("twice").await.unwrap();
        });

        let running = sess.running_config();
        let mut unique = lines.clone();
        let mut seen = std::collections::HashSet::new();
        unique.retain(|l| seen.insert(l.clone()));
        prop_assert_eq!(running, unique);
    }

    #[test]
    fn delete_removes_everything_below(
        statements in vec(statement(), 1..15),
        prefix in vec(word(), 1..3),
    ) {
        let rt = runtime();
        let sess = MemorySession::with_running(
            "mem",
            statements.iter().map(|s| format!("set {}", s)),
        )
        .unwrap();
        let prefix = prefix.join(" ");

        rt.block_on(async {
            sess.config_lock().await.unwrap();
            sess.config_set(&[format!("delete {}", prefix)]).await.unwrap();
            sess.commit_conf("delete").await.unwrap();
        });

        let deleted = |s: &str| s == prefix || s.starts_with(&format!("{} ", prefix));
        for line in sess.running_config() {
            let path = line.strip_prefix("set ").unwrap();
            prop_assert!(!deleted(path), "{} survived delete {}", path, prefix);
        }
        let kept = statements.iter().filter(|s| !deleted(s)).count();
        prop_assert!(sess.running_config().len() <= kept);
    }

    #[test]
    fn show_relative_strips_path(name in word(), statements in vec(statement(), 1..10)) {
        let rt = runtime();
        let sess = MemorySession::with_running(
            "mem",
            statements.iter().map(|s| format!("set vlans {} {}", name, s)),
        )
        .unwrap();

        let output = rt
            .block_on(sess.command(&format!(
                "show configuration vlans {} | display set relative",
                name
            )))
            .unwrap();
        for item in display_set_lines(&output) {
            prop_assert!(statements.iter().any(|s| s == item));
        }
    }
}

// ============================================================================
// Validation
// ============================================================================

fn provider() -> Provider {
    let sessions = Arc::new(SharedSessionFactory::new(Arc::new(MemorySession::new("mem"))));
    Provider::new(ProviderData::new(ProviderConfig::default(), sessions))
}

proptest! {
    #[test]
    fn vlan_id_range(vlan_id in -10i64..5000) {
        let diags = provider()
            .validate_resource_config("junos_vlan", &json!({"name": "v", "vlan_id": vlan_id}));
        prop_assert_eq!(diags.has_error(), !(1..=4094).contains(&vlan_id));
    }

    #[test]
    fn vlan_description_lines(description in text().prop_filter("non-empty", |s| !s.is_empty())) {
        let (lines, diags) = provider()
            .plan_set_lines("junos_vlan", &json!({"name": "v", "description": description}));
        prop_assert!(!diags.has_error());
        prop_assert_eq!(
            lines,
            vec!["set vlans v".to_string(), format!("set vlans v description \"{}\"", description)]
        );
    }
}

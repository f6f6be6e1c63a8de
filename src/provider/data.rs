//! Helpers shared by resources when reading configuration lines.

use crate::error::{Error, Result};
use crate::junos::ID_SEPARATOR;

/// Parse an integer read from the device.
pub fn conv_atoi64(attribute: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| Error::config_parse(attribute, value, e))
}

/// Push `value` unless already present.
pub fn append_unique(list: &mut Vec<String>, value: impl Into<String>) {
    let value = value.into();
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Blocks keyed by name inside a list
pub trait Named {
    fn new_named(name: &str) -> Self;
    fn name(&self) -> &str;
}

/// Return the block named `name`, appending a new one when missing.
pub fn find_or_append_by_name<'a, T: Named>(list: &'a mut Vec<T>, name: &str) -> &'a mut T {
    match list.iter().position(|item| item.name() == name) {
        Some(index) => &mut list[index],
        None => {
            list.push(T::new_named(name));
            let last = list.len() - 1;
            &mut list[last]
        }
    }
}

/// Split a multi-key id into exactly `parts` keys.
pub fn split_id(id: &str, parts: usize) -> Option<Vec<&str>> {
    let keys: Vec<&str> = id.split(ID_SEPARATOR).collect();
    if keys.len() == parts && keys.iter().all(|k| !k.is_empty()) {
        Some(keys)
    } else {
        None
    }
}

/// Join keys into an id.
pub fn join_id(keys: &[&str]) -> String {
    keys.join(ID_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Term {
        name: String,
        port: Option<String>,
    }

    impl Named for Term {
        fn new_named(name: &str) -> Self {
            Term {
                name: name.to_string(),
                port: None,
            }
        }
        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_conv_atoi64() {
        assert_eq!(conv_atoi64("metric", " 10").unwrap(), 10);
        assert!(matches!(
            conv_atoi64("metric", "x"),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_append_unique() {
        let mut list = vec!["a".to_string()];
        append_unique(&mut list, "a");
        append_unique(&mut list, "b");
        assert_eq!(list, vec!["a", "b"]);
    }

    #[test]
    fn test_find_or_append_by_name() {
        let mut terms: Vec<Term> = Vec::new();
        find_or_append_by_name(&mut terms, "t1").port = Some("22".into());
        find_or_append_by_name(&mut terms, "t2");
        find_or_append_by_name(&mut terms, "t1");
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].port.as_deref(), Some("22"));
    }

    #[test]
    fn test_split_id() {
        assert_eq!(
            split_id("10.0.0.0/24_-_default", 2),
            Some(vec!["10.0.0.0/24", "default"])
        );
        assert_eq!(split_id("10.0.0.0/24", 2), None);
        assert_eq!(split_id("_-_default", 2), None);
        assert_eq!(join_id(&["a", "b"]), "a_-_b");
    }
}

//! Authelia access-control update
//!
//! Adds the new subdomain to the first `one_factor` rule under
//! `access_control.rules`, or appends a fresh rule if there is none.
//! No duplicate check is made: adding the same subdomain twice lists it
//! twice.

use serde::Serialize;
use serde_yaml::Value;
use tracing::debug;

use crate::document::YamlDocument;
use crate::error::{OnboardError, OnboardResult};

pub const DEFAULT_CONFIG_PATH: &str = "/mnt/user/appdata/Authelia/configuration.yml";
pub const DEFAULT_BACKUP_DIR: &str = "/mnt/user/appdata/Authelia/backups";

/// Policy the subdomain is added under
pub const ONE_FACTOR: &str = "one_factor";

/// What happened to the rule list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleChange {
    /// Appended to the existing rule at this index
    Extended(usize),
    /// No matching rule; a new one was pushed at this index
    Created(usize),
}

#[derive(Debug, Serialize)]
struct AccessRule {
    domain: Vec<String>,
    policy: String,
}

/// Add `subdomain` to the single-factor rule in the access-control document
pub fn add_subdomain(doc: &mut YamlDocument, subdomain: &str) -> OnboardResult<RuleChange> {
    let path = doc.path().to_path_buf();
    let rules = doc.sequence_mut(&["access_control", "rules"])?;

    let existing = rules
        .iter()
        .position(|rule| rule.get("policy").and_then(Value::as_str) == Some(ONE_FACTOR));

    match existing {
        Some(index) => {
            push_domain(&mut rules[index], subdomain).ok_or_else(|| {
                OnboardError::DocumentShape {
                    path,
                    section: format!("access_control.rules[{}].domain", index),
                    expected: "sequence or string",
                }
            })?;
            debug!(index, subdomain, "Extended existing one_factor rule");
            Ok(RuleChange::Extended(index))
        }
        None => {
            let rule = AccessRule {
                domain: vec![subdomain.to_string()],
                policy: ONE_FACTOR.to_string(),
            };
            let rule = serde_yaml::to_value(rule)
                .map_err(|source| OnboardError::Yaml { path, source })?;
            rules.push(rule);
            debug!(subdomain, "Appended new one_factor rule");
            Ok(RuleChange::Created(rules.len() - 1))
        }
    }
}

/// Append to a rule's `domain`, promoting a lone string to a sequence.
/// Returns `None` if `domain` has some other kind.
fn push_domain(rule: &mut Value, subdomain: &str) -> Option<()> {
    let rule = rule.as_mapping_mut()?;
    let domain = rule
        .entry(Value::from("domain"))
        .or_insert(Value::Sequence(Vec::new()));

    let updated = match std::mem::take(domain) {
        Value::Null => Value::Sequence(vec![Value::from(subdomain)]),
        Value::String(single) => {
            Value::Sequence(vec![Value::String(single), Value::from(subdomain)])
        }
        Value::Sequence(mut list) => {
            list.push(Value::from(subdomain));
            Value::Sequence(list)
        }
        other => {
            *domain = other;
            return None;
        }
    };
    *domain = updated;
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load(contents: &str) -> (tempfile::NamedTempFile, YamlDocument) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let doc = YamlDocument::load(file.path()).unwrap();
        (file, doc)
    }

    fn rules(doc: &YamlDocument) -> &Vec<Value> {
        doc.root()["access_control"]["rules"].as_sequence().unwrap()
    }

    const WITH_ONE_FACTOR: &str = r#"
access_control:
  default_policy: deny
  rules:
    - domain:
        - public.example.com
      policy: bypass
    - domain:
        - grafana.example.com
      policy: one_factor
    - domain:
        - vault.example.com
      policy: one_factor
"#;

    #[test]
    fn test_appends_to_first_one_factor_rule() {
        let (_file, mut doc) = load(WITH_ONE_FACTOR);
        let change = add_subdomain(&mut doc, "foo.example.com").unwrap();

        assert_eq!(change, RuleChange::Extended(1));
        let rules = rules(&doc);
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[1]["domain"][1], Value::from("foo.example.com"));
        assert_eq!(rules[2]["domain"].as_sequence().unwrap().len(), 1);
        assert_eq!(doc.root()["access_control"]["default_policy"], Value::from("deny"));
    }

    #[test]
    fn test_creates_rule_when_no_one_factor() {
        let (_file, mut doc) = load(
            "access_control:\n  rules:\n    - domain: [admin.example.com]\n      policy: two_factor\n",
        );
        let change = add_subdomain(&mut doc, "foo.example.com").unwrap();

        assert_eq!(change, RuleChange::Created(1));
        let expected: Value =
            serde_yaml::from_str("domain: [foo.example.com]\npolicy: one_factor\n").unwrap();
        assert_eq!(rules(&doc)[1], expected);
    }

    #[test]
    fn test_same_subdomain_twice_is_listed_twice() {
        let (_file, mut doc) = load(WITH_ONE_FACTOR);
        add_subdomain(&mut doc, "foo.example.com").unwrap();
        add_subdomain(&mut doc, "foo.example.com").unwrap();

        let domains = rules(&doc)[1]["domain"].as_sequence().unwrap();
        let count = domains
            .iter()
            .filter(|d| d.as_str() == Some("foo.example.com"))
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_string_domain_is_promoted() {
        let (_file, mut doc) = load(
            "access_control:\n  rules:\n    - domain: grafana.example.com\n      policy: one_factor\n",
        );
        add_subdomain(&mut doc, "foo.example.com").unwrap();

        let expected: Value =
            serde_yaml::from_str("[grafana.example.com, foo.example.com]").unwrap();
        assert_eq!(rules(&doc)[0]["domain"], expected);
    }

    #[test]
    fn test_missing_rules_list_is_created() {
        let (_file, mut doc) = load("access_control:\n  default_policy: deny\n");
        let change = add_subdomain(&mut doc, "foo.example.com").unwrap();

        assert_eq!(change, RuleChange::Created(0));
        assert_eq!(rules(&doc).len(), 1);
    }
}

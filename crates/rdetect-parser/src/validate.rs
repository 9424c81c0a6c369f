//! Rule-file validation for CI-style checks.
//!
//! Unlike the loader, which stops reporting a record at its first problem,
//! validation reports *every* error it can find across every record —
//! structural problems, bad enum values, malformed MITRE ATT&CK technique
//! IDs, duplicate names, and conditions that fail to compile — so an
//! operator can fix a whole file in one pass.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_yaml::Value;

use crate::condition::compile;
use crate::error::Result;
use crate::parser::{parse_rule, record_label};
use crate::rule::Rule;

/// The validation outcome for one rule file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    /// One entry per problem found; empty means the file is valid.
    pub errors: Vec<String>,
}

impl FileReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate rule-file content, returning every error found.
pub fn validate_rules_str(content: &str) -> Vec<String> {
    let value: Value = match serde_yaml::from_str(content) {
        Ok(v) => v,
        Err(e) => return vec![format!("YAML parsing error: {e}")],
    };
    let Some(seq) = value.as_sequence() else {
        return vec!["rule file must be a YAML sequence of rule records".to_string()];
    };

    let mut errors = Vec::new();
    let mut seen_names: Vec<String> = Vec::new();

    for (idx, record) in seq.iter().enumerate() {
        match parse_rule(record) {
            Ok(rule) => {
                if seen_names.iter().any(|n| *n == rule.name) {
                    errors.push(format!("rule '{}': duplicate rule name", rule.name));
                } else {
                    seen_names.push(rule.name.clone());
                }

                if let Err(e) = compile(&rule.condition) {
                    errors.push(format!("rule '{}': invalid condition: {e}", rule.name));
                }

                validate_mitre_ids(&rule, &mut errors);
            }
            Err(e) => errors.push(format!("{}: {e}", record_label(record, idx))),
        }
    }

    errors
}

/// Validate one rule file. IO failures become a report error rather than a
/// panic or early return, so a missing file is reported like any other
/// problem.
pub fn validate_rules_file(path: &Path) -> FileReport {
    let errors = match std::fs::read_to_string(path) {
        Ok(content) => validate_rules_str(&content),
        Err(e) => vec![format!("IO error: {e}")],
    };
    FileReport {
        path: path.to_path_buf(),
        errors,
    }
}

/// Validate every rule file (`*.yml`, `*.yaml`) under a directory,
/// recursively. Returns one report per file.
pub fn validate_rules_directory(dir: &Path) -> Result<Vec<FileReport>> {
    let mut files = Vec::new();

    fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                walk(&path, files)?;
            } else if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yml" | "yaml")
            ) {
                files.push(path);
            }
        }
        Ok(())
    }

    walk(dir, &mut files)?;
    files.sort();
    Ok(files.iter().map(|p| validate_rules_file(p)).collect())
}

// ---------------------------------------------------------------------------
// Individual checks
// ---------------------------------------------------------------------------

fn mitre_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^T\d{4}(\.\d{3})?$").expect("valid MITRE ID pattern"))
}

/// `metadata.mitre_attack`, when present, must be a list of strings matching
/// `T####` or `T####.###`.
fn validate_mitre_ids(rule: &Rule, errors: &mut Vec<String>) {
    let Some(ids) = rule.metadata.get("mitre_attack") else {
        return;
    };
    let serde_json::Value::Array(items) = ids else {
        errors.push(format!(
            "rule '{}': metadata.mitre_attack must be a list of technique IDs",
            rule.name
        ));
        return;
    };
    for item in items {
        match item.as_str() {
            Some(id) if mitre_regex().is_match(id) => {}
            Some(id) => errors.push(format!(
                "rule '{}': invalid MITRE ATT&CK technique ID '{id}'",
                rule.name
            )),
            None => errors.push(format!(
                "rule '{}': metadata.mitre_attack entries must be strings",
                rule.name
            )),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_file_has_no_errors() {
        let yaml = r#"
- name: impossible_travel
  description: Same credential observed from many networks
  severity: high
  action: step_up_auth
  condition: "unique_ips > 5 and in_set(region, ['EU', 'US'])"
  metadata:
    mitre_attack: [T1078, T1078.004]
"#;
        assert!(validate_rules_str(yaml).is_empty());
    }

    #[test]
    fn test_bad_condition_reported() {
        let yaml = r#"
- name: injection_attempt
  description: x
  severity: low
  action: deny
  condition: "__import__('os').system('id')"
  metadata: {}
"#;
        let errors = validate_rules_str(yaml);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("injection_attempt"));
        assert!(errors[0].contains("invalid condition"));
    }

    #[test]
    fn test_bad_mitre_ids_reported() {
        let yaml = r#"
- name: bad_ids
  description: x
  severity: low
  action: notify
  condition: "x > 1"
  metadata:
    mitre_attack: [T1078, "1078", T107, T1078.04]
"#;
        let errors = validate_rules_str(yaml);
        assert_eq!(errors.len(), 3);
        for err in &errors {
            assert!(err.contains("MITRE"));
        }
    }

    #[test]
    fn test_duplicate_names_reported() {
        let yaml = r#"
- name: twin
  description: x
  severity: low
  action: allow
  condition: "a"
  metadata: {}
- name: twin
  description: y
  severity: low
  action: allow
  condition: "b"
  metadata: {}
"#;
        let errors = validate_rules_str(yaml);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("duplicate"));
    }

    #[test]
    fn test_all_errors_reported_not_just_first() {
        let yaml = r#"
- name: first_bad
  description: x
  severity: nonsense
  action: allow
  condition: "a"
  metadata: {}
- name: second_bad
  description: x
  severity: low
  action: allow
  condition: "a +++ b"
  metadata: {}
"#;
        let errors = validate_rules_str(yaml);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_unparseable_yaml() {
        let errors = validate_rules_str(": not yaml :\n  - [");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("YAML"));
    }

    #[test]
    fn test_missing_file_reported() {
        let report = validate_rules_file(Path::new("/nonexistent/rules.yml"));
        assert!(!report.is_valid());
        assert!(report.errors[0].contains("IO error"));
    }

    #[test]
    fn test_validate_directory() {
        let good = r#"
- name: fine
  description: x
  severity: low
  action: allow
  condition: "x > 1"
  metadata: {}
"#;
        let bad = r#"
- name: broken
  description: x
  severity: low
  action: allow
  condition: "a + b"
  metadata: {}
"#;
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.yml"), good).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/bad.yaml"), bad).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a rule file").unwrap();

        let reports = validate_rules_directory(dir.path()).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports.iter().filter(|r| r.is_valid()).count(), 1);
        let invalid = reports.iter().find(|r| !r.is_valid()).unwrap();
        assert!(invalid.path.ends_with("bad.yaml"));
    }
}

//! Page-state probes.
//!
//! A probe names a value in the page's global object graph, e.g.
//! `window.game.stateManager.currentState`. Nothing about those names is
//! assumed here: paths come from configuration and are turned into guarded
//! expressions that evaluate to `null` when any segment is missing, instead
//! of throwing `TypeError` half way down the chain.

use crate::result::{LookoutError, LookoutResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn invalid(path: &str, message: impl Into<String>) -> LookoutError {
    LookoutError::InvalidProbe {
        path: path.to_string(),
        message: message.into(),
    }
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn is_index(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
}

/// Build a guarded expression reading a dotted global path.
///
/// A leading `window` or `globalThis` segment is accepted and treated as the
/// global object. Numeric segments index arrays.
///
/// # Errors
///
/// Returns [`LookoutError::InvalidProbe`] for empty paths or segments that
/// are neither identifiers nor array indices.
pub fn path_expression(path: &str) -> LookoutResult<String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(invalid(path, "path is empty"));
    }

    let mut segments = trimmed.split('.').peekable();
    if matches!(segments.peek(), Some(&("window" | "globalThis"))) {
        segments.next();
    }

    let mut expr = String::from("globalThis");
    let mut any = false;
    for segment in segments {
        if is_identifier(segment) {
            expr.push_str("?.");
            expr.push_str(segment);
        } else if is_index(segment) {
            expr.push_str("?.[");
            expr.push_str(segment);
            expr.push(']');
        } else {
            return Err(invalid(path, format!("bad segment `{segment}`")));
        }
        any = true;
    }
    if !any {
        return Err(invalid(path, "path names the global object itself"));
    }

    Ok(format!("({expr} ?? null)"))
}

/// Build an expression that is `true` when the path strictly equals `value`.
///
/// # Errors
///
/// Returns [`LookoutError::InvalidProbe`] for a bad path, or when `value` is
/// an array or object (those never compare equal by identity).
pub fn equals_expression(path: &str, value: &Value) -> LookoutResult<String> {
    if value.is_array() || value.is_object() {
        return Err(invalid(path, "can only compare against scalar values"));
    }
    let read = path_expression(path)?;
    Ok(format!("({read} === {value})"))
}

/// How a named probe is defined in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeSpec {
    /// Dotted global path
    Path(String),
    /// Raw page expression, used as-is
    Expression {
        /// Expression source
        expression: String,
    },
}

impl ProbeSpec {
    /// Page expression for this probe
    ///
    /// # Errors
    ///
    /// Returns error if a path probe is malformed or an expression is blank
    pub fn to_expression(&self) -> LookoutResult<String> {
        match self {
            Self::Path(path) => path_expression(path),
            Self::Expression { expression } if expression.trim().is_empty() => {
                Err(invalid("<expression>", "expression is empty"))
            }
            Self::Expression { expression } => Ok(expression.clone()),
        }
    }
}

/// Named probes loaded from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeSet {
    probes: BTreeMap<String, ProbeSpec>,
}

impl ProbeSet {
    /// Create an empty probe set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a probe
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, spec: ProbeSpec) -> Self {
        self.probes.insert(name.into(), spec);
        self
    }

    /// Resolve a probe name to its page expression
    ///
    /// # Errors
    ///
    /// Returns error if the name is unknown or the probe is malformed
    pub fn expression(&self, name: &str) -> LookoutResult<String> {
        self.probes
            .get(name)
            .ok_or_else(|| invalid(name, "no probe with this name"))?
            .to_expression()
    }

    /// Probe names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.keys().map(String::as_str)
    }

    /// Number of probes
    #[must_use]
    pub fn len(&self) -> usize {
        self.probes.len()
    }

    /// Whether there are no probes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod path_tests {
        use super::*;

        #[test]
        fn test_window_prefix_is_global() {
            assert_eq!(
                path_expression("window.game.stateManager.currentState").unwrap(),
                "(globalThis?.game?.stateManager?.currentState ?? null)"
            );
        }

        #[test]
        fn test_bare_path() {
            assert_eq!(
                path_expression("game.player").unwrap(),
                "(globalThis?.game?.player ?? null)"
            );
        }

        #[test]
        fn test_index_segment() {
            assert_eq!(
                path_expression("game.entities.0.x").unwrap(),
                "(globalThis?.game?.entities?.[0]?.x ?? null)"
            );
        }

        #[test]
        fn test_rejects_bad_paths() {
            for path in ["", "  ", "window", "game..x", "game.x-y", "game.x()", "a.b;alert(1)"] {
                assert!(path_expression(path).is_err(), "{path:?} should be rejected");
            }
        }
    }

    mod equals_tests {
        use super::*;

        #[test]
        fn test_string_literal_is_quoted() {
            assert_eq!(
                equals_expression("game.state", &json!("playing")).unwrap(),
                "((globalThis?.game?.state ?? null) === \"playing\")"
            );
        }

        #[test]
        fn test_number_and_null() {
            assert!(equals_expression("game.lives", &json!(3))
                .unwrap()
                .ends_with("=== 3)"));
            assert!(equals_expression("game.boss", &json!(null))
                .unwrap()
                .ends_with("=== null)"));
        }

        #[test]
        fn test_rejects_compound_values() {
            assert!(equals_expression("game.pos", &json!({"x": 1})).is_err());
            assert!(equals_expression("game.list", &json!([1])).is_err());
        }
    }

    mod probe_set_tests {
        use super::*;

        #[test]
        fn test_yaml_mixes_paths_and_expressions() {
            let yaml = r#"
state: window.game.stateManager.currentState
ready:
  expression: "document.readyState === 'complete'"
"#;
            let set: ProbeSet = serde_yaml_ng::from_str(yaml).unwrap();
            assert_eq!(set.len(), 2);
            assert_eq!(set.names().collect::<Vec<_>>(), vec!["ready", "state"]);
            assert_eq!(
                set.expression("ready").unwrap(),
                "document.readyState === 'complete'"
            );
            assert!(set.expression("state").unwrap().contains("currentState"));
        }

        #[test]
        fn test_unknown_probe() {
            let err = ProbeSet::new().expression("missing").unwrap_err();
            assert!(err.to_string().contains("missing"));
        }

        #[test]
        fn test_blank_expression_rejected() {
            let set = ProbeSet::new().with(
                "blank",
                ProbeSpec::Expression {
                    expression: " ".into(),
                },
            );
            assert!(set.expression("blank").is_err());
            assert!(!set.is_empty());
        }
    }
}

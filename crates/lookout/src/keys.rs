//! Key names to DOM keyboard-event fields.
//!
//! Canvas games usually listen for `keydown`/`keyup` and branch on
//! `event.key`, `event.code` or the legacy `keyCode`, so a synthetic press
//! has to fill in all three.

use crate::result::{LookoutError, LookoutResult};
use serde::Serialize;

/// Fields of a synthetic keyboard event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyDefinition {
    /// `KeyboardEvent.key`
    pub key: String,
    /// `KeyboardEvent.code`
    pub code: String,
    /// Legacy `keyCode` / Windows virtual key code
    pub key_code: i64,
    /// Text inserted by the key, if any
    pub text: Option<String>,
}

impl KeyDefinition {
    fn named(key: &str, code: &str, key_code: i64) -> Self {
        Self {
            key: key.to_string(),
            code: code.to_string(),
            key_code,
            text: None,
        }
    }

    fn printable(key: &str, code: &str, key_code: i64) -> Self {
        Self {
            text: Some(key.to_string()),
            ..Self::named(key, code, key_code)
        }
    }

    /// Look up a key by name (case-insensitive for named keys)
    ///
    /// # Errors
    ///
    /// Returns [`LookoutError::UnknownKey`] if the name is not in the table
    pub fn lookup(name: &str) -> LookoutResult<Self> {
        let lower = name.to_ascii_lowercase();
        let def = match lower.as_str() {
            "arrowleft" | "left" => Self::named("ArrowLeft", "ArrowLeft", 37),
            "arrowup" | "up" => Self::named("ArrowUp", "ArrowUp", 38),
            "arrowright" | "right" => Self::named("ArrowRight", "ArrowRight", 39),
            "arrowdown" | "down" => Self::named("ArrowDown", "ArrowDown", 40),
            "space" | " " => Self::printable(" ", "Space", 32),
            "enter" | "return" => Self {
                text: Some("\r".to_string()),
                ..Self::named("Enter", "Enter", 13)
            },
            "escape" | "esc" => Self::named("Escape", "Escape", 27),
            "tab" => Self::named("Tab", "Tab", 9),
            "backspace" => Self::named("Backspace", "Backspace", 8),
            "shift" => Self::named("Shift", "ShiftLeft", 16),
            "control" | "ctrl" => Self::named("Control", "ControlLeft", 17),
            "alt" => Self::named("Alt", "AltLeft", 18),
            _ => {
                return Self::single_char(Self::code_alias(&lower).unwrap_or(name));
            }
        };
        Ok(def)
    }

    /// `KeyA`/`Digit1` style names, resolved to the unshifted character
    fn code_alias(lower: &str) -> Option<&str> {
        lower
            .strip_prefix("key")
            .filter(|r| r.len() == 1 && r.bytes().all(|b| b.is_ascii_lowercase()))
            .or_else(|| {
                lower
                    .strip_prefix("digit")
                    .filter(|r| r.len() == 1 && r.bytes().all(|b| b.is_ascii_digit()))
            })
    }

    fn single_char(name: &str) -> LookoutResult<Self> {
        let mut chars = name.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return Err(LookoutError::UnknownKey {
                name: name.to_string(),
            });
        };

        if c.is_ascii_alphabetic() {
            let upper = c.to_ascii_uppercase();
            Ok(Self::printable(
                &c.to_string(),
                &format!("Key{upper}"),
                i64::from(u32::from(upper)),
            ))
        } else if c.is_ascii_digit() {
            Ok(Self::printable(
                &c.to_string(),
                &format!("Digit{c}"),
                i64::from(u32::from(c)),
            ))
        } else {
            Err(LookoutError::UnknownKey {
                name: name.to_string(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_keys_and_aliases() {
        let left = KeyDefinition::lookup("ArrowLeft").unwrap();
        assert_eq!(left.code, "ArrowLeft");
        assert_eq!(left.key_code, 37);
        assert!(left.text.is_none());
        assert_eq!(KeyDefinition::lookup("left").unwrap(), left);
        assert_eq!(KeyDefinition::lookup("RIGHT").unwrap().key_code, 39);
    }

    #[test]
    fn test_space_inserts_text() {
        let space = KeyDefinition::lookup("Space").unwrap();
        assert_eq!(space.key, " ");
        assert_eq!(space.code, "Space");
        assert_eq!(space.text.as_deref(), Some(" "));
    }

    #[test]
    fn test_letters_keep_case_in_key() {
        let a = KeyDefinition::lookup("a").unwrap();
        assert_eq!(a.key, "a");
        assert_eq!(a.code, "KeyA");
        assert_eq!(a.key_code, 65);
        let upper = KeyDefinition::lookup("Z").unwrap();
        assert_eq!(upper.key, "Z");
        assert_eq!(upper.code, "KeyZ");
    }

    #[test]
    fn test_digits() {
        let seven = KeyDefinition::lookup("7").unwrap();
        assert_eq!(seven.code, "Digit7");
        assert_eq!(seven.key_code, 55);
    }

    #[test]
    fn test_code_style_names() {
        let a = KeyDefinition::lookup("KeyA").unwrap();
        assert_eq!(a, KeyDefinition::lookup("a").unwrap());
        assert_eq!(a.code, "KeyA");
        assert_eq!(KeyDefinition::lookup("keyz").unwrap().code, "KeyZ");
        let one = KeyDefinition::lookup("Digit1").unwrap();
        assert_eq!(one, KeyDefinition::lookup("1").unwrap());
        assert_eq!(one.key_code, 49);
    }

    #[test]
    fn test_unknown_keys() {
        for name in ["", "F13", "jumpbutton", "é", "KeyAB", "Key1", "Digit10", "DigitX"] {
            let err = KeyDefinition::lookup(name).unwrap_err();
            assert!(matches!(err, LookoutError::UnknownKey { .. }), "{name}");
        }
    }
}

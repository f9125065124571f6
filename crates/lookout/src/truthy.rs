//! Boolean coercion for predicate values.
//!
//! Predicates over page state rarely return a clean `bool`: an in-page
//! expression yields whatever JSON the page produced. [`Truthy`] maps those
//! values to a yes/no answer using the same rules the page itself would.

use serde_json::Value;

/// A value that can be coerced to a boolean.
pub trait Truthy {
    /// Whether the value counts as "true"
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}

impl Truthy for str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

macro_rules! int_truthy {
    ($($t:ty),*) => {
        $(impl Truthy for $t {
            fn is_truthy(&self) -> bool {
                *self != 0
            }
        })*
    };
}

int_truthy!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

/// JavaScript rules: `null`, `false`, `0`, `-0`, `NaN` and `""` are falsy.
/// Every array and object is truthy, empty or not.
impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => n.as_f64().is_some_and(|f| f.is_truthy()),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) => true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod json_tests {
        use super::*;

        #[test]
        fn test_falsy_json_values() {
            for v in [json!(null), json!(false), json!(0), json!(-0.0), json!("")] {
                assert!(!v.is_truthy(), "{v} should be falsy");
            }
        }

        #[test]
        fn test_truthy_json_values() {
            for v in [
                json!(true),
                json!(1),
                json!(-3.5),
                json!("idle"),
                json!("false"),
                json!([]),
                json!({}),
                json!({"x": 0}),
            ] {
                assert!(v.is_truthy(), "{v} should be truthy");
            }
        }
    }

    mod native_tests {
        use super::*;

        #[test]
        fn test_bool() {
            assert!(true.is_truthy());
            assert!(!false.is_truthy());
        }

        #[test]
        fn test_option() {
            assert!(!None::<bool>.is_truthy());
            assert!(!Some(false).is_truthy());
            assert!(Some(true).is_truthy());
            assert!(Some(json!("playing")).is_truthy());
        }

        #[test]
        fn test_numbers() {
            assert!(!0_u32.is_truthy());
            assert!(7_i64.is_truthy());
            assert!(!f64::NAN.is_truthy());
            assert!(!0.0_f64.is_truthy());
            assert!(0.5_f64.is_truthy());
        }

        #[test]
        fn test_strings() {
            assert!(!"".is_truthy());
            assert!("x".is_truthy());
            assert!(String::from("menu").is_truthy());
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_json_string_matches_native(s in ".*") {
                prop_assert_eq!(Value::String(s.clone()).is_truthy(), s.is_truthy());
            }

            #[test]
            fn prop_json_integer_matches_native(n in any::<i64>()) {
                prop_assert_eq!(json!(n).is_truthy(), n.is_truthy());
            }
        }
    }
}

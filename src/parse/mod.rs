//! Safe JSON decoding.
//!
//! Every function in this module returns a [`ParseResult`] instead of
//! panicking or propagating an error, so malformed input is just another
//! value for the caller to branch on.
//!
//! # Example
//!
//! ```
//! use safe_fetch::parse::parse;
//!
//! let good = parse(r#"{"nombre": "Juan"}"#);
//! assert!(good.is_ok());
//!
//! let bad = parse(r#"{nombre: "Juan"}"#);
//! assert!(!bad.is_ok());
//! println!("{}", bad.error().map(ToString::to_string).unwrap_or_default());
//! ```
//!
//! Numbers keep their exact text, so values outside the `f64` range (such as
//! `1e400`) and integers wider than 64 bits decode. Nesting depth is not
//! limited; the stack grows on demand while decoding.
//!
//! Escaped lone surrogates (`"\ud800"`) are rejected: a Rust `String` must be
//! valid UTF-8 and cannot represent them.

mod result;

pub use result::{ParseFailure, ParseFailureKind, ParseResult};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Parses `text` as an arbitrary JSON value.
#[must_use]
pub fn parse(text: &str) -> ParseResult<Value> {
    parse_as(text)
}

/// Parses `text` directly into `T`.
///
/// Text that is valid JSON but does not fit `T` fails with
/// [`ParseFailureKind::Data`].
#[must_use]
pub fn parse_as<T: DeserializeOwned>(text: &str) -> ParseResult<T> {
    match decode::<T>(text) {
        Ok(data) => ParseResult::Parsed(data),
        Err(error) => {
            let failure = ParseFailure::from_serde(&error);
            warn!(
                line = failure.line,
                column = failure.column,
                error = %failure.message,
                "failed to parse JSON"
            );
            ParseResult::Failed(failure)
        }
    }
}

/// `serde_json::from_str` without the recursion limit.
fn decode<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let mut json = serde_json::Deserializer::from_str(text);
    json.disable_recursion_limit();
    let data = T::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(data)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    /// Typical hand-written JSON mistakes.
    const MALFORMED_SAMPLES: &[&str] = &[
        r#"{nombre: "Juan"}"#,
        r#"{"nombre": "Juan",}"#,
        r#"{"edad": undefined}"#,
        r#"{"comillas": 'simple'}"#,
    ];

    #[test]
    fn test_parse_valid_object() {
        let result = parse(r#"{"nombre": "Juan", "edad": 30}"#);
        assert_eq!(result.data(), Some(&json!({"nombre": "Juan", "edad": 30})));
    }

    #[test]
    fn test_parse_valid_values_roundtrip_through_reserialization() {
        let inputs = [
            "null",
            "true",
            "0",
            "-12.5",
            r#""texto""#,
            "[1, 2, [3, {\"a\": null}]]",
            r#"{"productos": [{"id": 1, "precio": 9.99}], "total": 1}"#,
            "  \n {\"espacios\": true} \t ",
        ];
        for input in inputs {
            let data = parse(input).into_data();
            assert!(data.is_some(), "expected {input:?} to parse");
            let data = data.unwrap();
            let reserialized = serde_json::to_string(&data).unwrap();
            assert_eq!(parse(&reserialized).into_data(), Some(data), "{input:?}");
        }
    }

    #[test]
    fn test_parse_malformed_samples_fail_without_panicking() {
        for sample in MALFORMED_SAMPLES {
            let result = parse(sample);
            assert!(!result.is_ok(), "expected {sample:?} to be rejected");
            let failure = result.error().unwrap();
            assert!(!failure.message.is_empty());
            assert_eq!(failure.kind, ParseFailureKind::Syntax, "{sample:?}");
        }
    }

    #[test]
    fn test_parse_reports_position() {
        let failure = parse("{\n  \"a\": 1,\n  b: 2\n}").into_result().unwrap_err();
        assert_eq!(failure.line, 3);
        assert!(failure.column > 0);
    }

    #[test]
    fn test_parse_empty_input_is_eof() {
        let failure = parse("").into_result().unwrap_err();
        assert_eq!(failure.kind, ParseFailureKind::Eof);

        let failure = parse(r#"{"abierto": "#).into_result().unwrap_err();
        assert_eq!(failure.kind, ParseFailureKind::Eof);
    }

    #[test]
    fn test_parse_trailing_garbage_rejected() {
        assert!(!parse(r#"{"a": 1} extra"#).is_ok());
    }

    #[test]
    fn test_parse_unterminated_deep_nesting_fails_cleanly() {
        let deep = "[".repeat(10_000);
        let failure = parse(&deep).into_result().unwrap_err();
        assert_eq!(failure.kind, ParseFailureKind::Eof);
    }

    #[test]
    fn test_parse_accepts_nesting_past_default_depth_limit() {
        for depth in [200, 1_000] {
            let text = format!("{}{}", "[".repeat(depth), "]".repeat(depth));
            let result = parse(&text);
            assert!(result.is_ok(), "depth {depth}: {:?}", result.error());
        }
    }

    #[test]
    fn test_parse_keeps_numbers_beyond_f64_range() {
        for text in ["1e400", "-1e400", "123456789012345678901234567890"] {
            let value = parse(text).into_data().unwrap();
            assert_eq!(serde_json::to_string(&value).unwrap(), text);
        }

        let nested = parse(r#"{"enorme": 1e400}"#).into_data().unwrap();
        assert_eq!(nested["enorme"].to_string(), "1e400");
    }

    #[test]
    fn test_parse_rejects_lone_surrogate_escape() {
        for text in [r#""\ud800""#, r#"{"a": "x\ud800"}"#] {
            let failure = parse(text).into_result().unwrap_err();
            assert_eq!(failure.kind, ParseFailureKind::Syntax, "{text}");
            assert!(!failure.message.is_empty());
        }
        // A well-formed surrogate pair is fine.
        assert_eq!(
            parse(r#""\ud83d\ude00""#).into_data(),
            Some(Value::String("\u{1f600}".to_string()))
        );
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Producto {
        id: u32,
        nombre: String,
    }

    #[test]
    fn test_parse_as_typed_value() {
        let result: ParseResult<Producto> = parse_as(r#"{"id": 3, "nombre": "Mesa"}"#);
        assert_eq!(
            result.into_data(),
            Some(Producto {
                id: 3,
                nombre: "Mesa".to_string()
            })
        );
    }

    #[test]
    fn test_parse_as_shape_mismatch_is_data_failure() {
        let result: ParseResult<Producto> = parse_as(r#"{"id": "tres"}"#);
        assert_eq!(result.error().unwrap().kind, ParseFailureKind::Data);
    }
}

//! Integration tests for safe JSON decoding through the public API.

use safe_fetch::{ParseFailureKind, ParseResult, parse, parse_as};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize, PartialEq)]
struct Usuario {
    nombre: String,
    edad: u32,
    #[serde(default)]
    correo: Option<String>,
}

#[test]
fn test_parse_never_panics_on_hostile_input() {
    let inputs = [
        "",
        " ",
        "{",
        "}",
        "[1, 2",
        "\"sin cerrar",
        "{\"a\": 1}}",
        "NaN",
        "Infinity",
        "01",
        "1e999999",
        "{\"\\uZZZZ\": 1}",
        "\u{feff}{}",
        "\0",
    ];
    for input in inputs {
        let result = parse(input);
        if let Some(failure) = result.error() {
            assert!(!failure.message.is_empty(), "{input:?}");
        }
    }
}

#[test]
fn test_parse_failure_carries_position_and_kind() {
    let result = parse("{\n  \"nombre\": \"Juan\",\n  edad: 30\n}");
    let failure = result.error().unwrap();
    assert_eq!(failure.kind, ParseFailureKind::Syntax);
    assert_eq!(failure.line, 3);
    assert!(failure.to_string().contains("line 3"));
}

#[test]
fn test_parse_as_fills_optional_fields() {
    let result: ParseResult<Usuario> = parse_as(r#"{"nombre": "Ana", "edad": 41}"#);
    assert_eq!(
        result.into_data(),
        Some(Usuario {
            nombre: "Ana".to_string(),
            edad: 41,
            correo: None,
        })
    );
}

#[test]
fn test_parse_as_wrong_shape_is_data_failure_not_panic() {
    let result: ParseResult<Usuario> = parse_as(r#"{"nombre": "Ana", "edad": -1}"#);
    assert_eq!(result.error().unwrap().kind, ParseFailureKind::Data);

    let result: ParseResult<Usuario> = parse_as("[]");
    assert_eq!(result.error().unwrap().kind, ParseFailureKind::Data);
}

#[test]
fn test_parse_result_converts_into_std_result() {
    fn edad(text: &str) -> Result<u32, safe_fetch::ParseFailure> {
        let usuario: Usuario = parse_as(text).into_result()?;
        Ok(usuario.edad)
    }

    assert_eq!(edad(r#"{"nombre": "Luis", "edad": 7}"#).unwrap(), 7);
    assert!(edad("{edad: 7}").is_err());
}

#[test]
fn test_envelope_serialization_matches_both_shapes() {
    let ok = serde_json::to_value(parse(r#"{"activo": true}"#)).unwrap();
    assert_eq!(ok, json!({"ok": true, "data": {"activo": true}}));

    let failed = serde_json::to_value(parse("{activo: true}")).unwrap();
    assert_eq!(failed["ok"], json!(false));
    assert!(failed["error"].as_str().is_some_and(|message| !message.is_empty()));
    assert!(failed.get("data").is_none());
}

#[test]
fn test_parse_accepts_extreme_but_valid_json() {
    let anidado = format!("{}{}", "[".repeat(500), "]".repeat(500));
    assert!(parse(&anidado).is_ok());

    let result = parse(r#"{"grande": 1e400, "id": 18446744073709551616}"#);
    let data = result.data().unwrap();
    assert_eq!(data["grande"].to_string(), "1e400");
    assert_eq!(data["id"].to_string(), "18446744073709551616");
}

#[test]
fn test_parse_reports_lone_surrogate_as_failure() {
    let result = parse(r#"{"texto": "\ud83d"}"#);
    let failure = result.error().unwrap();
    assert_eq!(failure.kind, ParseFailureKind::Syntax);
    assert!(!failure.message.is_empty());
}

//! Translation Tests
//!
//! Tests for command validation and rendering into backend lines.

use kvgate::protocol::{render, translate, Command, CommandType};
use kvgate::TranslationError;
use serde_json::{json, Value};

const LIMIT: usize = 4096;

fn line(value: Value) -> String {
    translate(value, LIMIT).unwrap().into_string()
}

// =============================================================================
// GET Rendering Tests
// =============================================================================

#[test]
fn test_get_renders_quoted_keys() {
    assert_eq!(line(json!({"command": "get", "key": ["a", "b"]})), "get ['a', 'b']");
}

#[test]
fn test_get_single_and_empty() {
    assert_eq!(line(json!({"command": "get", "key": ["only"]})), "get ['only']");
    assert_eq!(line(json!({"command": "get", "key": []})), "get []");
}

#[test]
fn test_get_preserves_key_order() {
    assert_eq!(
        line(json!({"command": "get", "key": ["z", "a", "m"]})),
        "get ['z', 'a', 'm']"
    );
}

// =============================================================================
// SET Rendering Tests
// =============================================================================

#[test]
fn test_set_renders_strings_and_booleans() {
    assert_eq!(
        line(json!({"command": "set", "key": {"x": "y", "ok": true}})),
        "set {'x': 'y', 'ok': True}"
    );
    assert_eq!(
        line(json!({"command": "set", "key": {"off": false}})),
        "set {'off': False}"
    );
}

#[test]
fn test_set_renders_other_values_as_json() {
    assert_eq!(
        line(json!({"command": "set", "key": {"n": 42, "f": 1.5, "z": null, "o": {"a": [1, 2]}, "l": ["s"]}})),
        r#"set {'n': 42, 'f': 1.5, 'z': null, 'o': {"a":[1,2]}, 'l': ["s"]}"#
    );
}

#[test]
fn test_set_preserves_insertion_order() {
    let value: Value =
        serde_json::from_str(r#"{"command": "set", "key": {"zeta": 1, "alpha": 2, "mid": 3}}"#).unwrap();
    assert_eq!(line(value), "set {'zeta': 1, 'alpha': 2, 'mid': 3}");
}

#[test]
fn test_set_empty_object() {
    assert_eq!(line(json!({"command": "set", "key": {}})), "set {}");
}

#[test]
fn test_strings_are_not_escaped() {
    assert_eq!(
        line(json!({"command": "set", "key": {"it's": "a 'quoted' value"}})),
        "set {'it's': 'a 'quoted' value'}"
    );
}

#[test]
fn test_extra_fields_are_ignored() {
    assert_eq!(
        line(json!({"command": "get", "key": ["a"], "id": 7})),
        "get ['a']"
    );
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_get_with_object_is_type_mismatch() {
    let err = translate(json!({"command": "get", "key": {"x": 1}}), LIMIT).unwrap_err();
    assert!(matches!(err, TranslationError::TypeMismatch(_)));
}

#[test]
fn test_get_with_non_string_element_is_type_mismatch() {
    for bad in [json!(1), json!(null), json!(true), json!(["nested"]), json!({"k": "v"})] {
        let err = translate(json!({"command": "get", "key": ["ok", bad]}), LIMIT).unwrap_err();
        assert!(matches!(err, TranslationError::TypeMismatch(_)), "element {:?}", bad);
    }
}

#[test]
fn test_set_with_array_is_type_mismatch() {
    let err = translate(json!({"command": "set", "key": ["a"]}), LIMIT).unwrap_err();
    assert!(matches!(err, TranslationError::TypeMismatch(_)));
}

#[test]
fn test_unknown_command_is_unsupported() {
    let err = translate(json!({"command": "delete", "key": []}), LIMIT).unwrap_err();
    assert_eq!(err, TranslationError::UnsupportedCommand("delete".to_string()));

    // Command names are case-sensitive
    let err = translate(json!({"command": "GET", "key": ["a"]}), LIMIT).unwrap_err();
    assert!(matches!(err, TranslationError::UnsupportedCommand(_)));
}

#[test]
fn test_shape_errors() {
    let cases = [
        json!(["get", ["a"]]),
        json!("get"),
        json!(42),
        json!({"key": ["a"]}),
        json!({"command": null, "key": ["a"]}),
        json!({"command": 1, "key": ["a"]}),
        json!({"command": "get"}),
    ];
    for value in cases {
        let err = translate(value.clone(), LIMIT).unwrap_err();
        assert!(matches!(err, TranslationError::Shape(_)), "value {}", value);
    }
}

// =============================================================================
// Size Limit Tests
// =============================================================================

#[test]
fn test_too_large_is_rejected() {
    let err = translate(json!({"command": "get", "key": ["abcdef"]}), 10).unwrap_err();
    assert_eq!(err, TranslationError::TooLarge { len: 14, max: 10 });
}

#[test]
fn test_exact_limit_fits() {
    // "get ['abcdef']" is 14 bytes
    let wire = translate(json!({"command": "get", "key": ["abcdef"]}), 14).unwrap();
    assert_eq!(wire.len(), 14);
}

// =============================================================================
// Command Tests
// =============================================================================

#[test]
fn test_command_from_value() {
    let cmd = Command::from_value(json!({"command": "set", "key": {"k": "v"}})).unwrap();
    assert_eq!(cmd.command_type(), CommandType::Set);
    assert_eq!(
        cmd,
        Command::Set {
            entries: vec![("k".to_string(), json!("v"))]
        }
    );
}

#[test]
fn test_render_without_limit() {
    let cmd = Command::Get {
        keys: vec!["x".repeat(5000)],
    };
    assert_eq!(render(&cmd).len(), 5000 + "get ['']".len());
}

use jsontok::{ErrorType, TokenReader};

#[test]
fn wrong_type_reports_index() {
    let input = r#"{"a": "text"}"#;
    let mut reader = TokenReader::new(input.as_bytes());
    assert_eq!(reader.next_object().unwrap(), Some("a"));

    let err = reader.next_bool().unwrap_err();
    assert!(matches!(err.error_type, ErrorType::WrongType { .. }));
    assert!(err.index >= 5, "index {}", err.index);
}

#[test]
fn trailing_data_fails_finish() {
    let mut reader = TokenReader::new(b"1 2");
    assert_eq!(reader.next_i64().unwrap(), 1);
    let err = reader.finish().unwrap_err();
    assert!(matches!(err.error_type, ErrorType::JsonError(_)));
}

#[test]
fn truncated_object() {
    let mut reader = TokenReader::new(br#"{"a": 1"#);
    assert_eq!(reader.next_object().unwrap(), Some("a"));
    assert_eq!(reader.next_i64().unwrap(), 1);
    assert!(reader.next_key().is_err());
}

#[test]
fn description_has_line_and_column() {
    let input = "{\n  \"a\": tru\n}";
    let mut reader = TokenReader::new(input.as_bytes());
    assert_eq!(reader.next_object().unwrap(), Some("a"));
    let err = reader.next_bool().unwrap_err();
    let description = err.description(&reader);
    assert!(description.contains("line 2"), "{description}");
}

//! Tests for domain error construction and serialisation.

use super::*;
use rstest::rstest;
use serde_json::json;

#[rstest]
fn invalid_request_constructor_sets_code() {
    let err = Error::invalid_request("bad");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "bad");
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn blank_message_falls_back_to_generic_text() {
    let err = Error::new(ErrorCode::ServiceUnavailable, "");
    assert_eq!(err.message(), GENERIC_NETWORK_FAILURE);
}

#[rstest]
#[case(Error::not_found("gone"), true)]
#[case(Error::conflict("clash"), false)]
#[case(Error::network_failure(), false)]
fn not_found_detection(#[case] err: Error, #[case] expected: bool) {
    assert_eq!(err.is_not_found(), expected);
}

#[rstest]
fn serialises_with_snake_case_code_and_details() {
    let err = Error::forbidden("nope").with_details(json!({"field": "email"}));
    let value = serde_json::to_value(&err).expect("serialise error");
    assert_eq!(
        value,
        json!({"code": "forbidden", "message": "nope", "details": {"field": "email"}})
    );
}

#[rstest]
fn deserialisation_rejects_blank_messages() {
    let result = serde_json::from_value::<Error>(json!({"code": "not_found", "message": " "}));
    assert!(result.is_err(), "blank messages must not round-trip");
}

#[rstest]
fn display_uses_message() {
    assert_eq!(Error::unauthorized("login required").to_string(), "login required");
}

// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn status_codes_match_spec_table() {
    assert_eq!(RelayError::Unauthorized.http_status(), 401);
    assert_eq!(RelayError::InvalidRequest.http_status(), 400);
    assert_eq!(RelayError::NotFound.http_status(), 404);
    assert_eq!(RelayError::MethodNotAllowed.http_status(), 405);
    assert_eq!(RelayError::Internal.http_status(), 500);
}

#[test]
fn error_body_carries_message() {
    let body = RelayError::InvalidRequest.to_error_body("missing session_id");
    assert_eq!(body.code, "INVALID_REQUEST");
    assert_eq!(body.message, "missing session_id");
}

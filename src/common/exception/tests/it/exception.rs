// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use pretty_assertions::assert_eq;
use searchql_common_exception::ErrorCode;
use searchql_common_exception::ErrorCodeResultExt;
use searchql_common_exception::Result;
use searchql_common_exception::ToErrorCode;

#[test]
fn test_format_with_error_codes() {
    assert_eq!(
        format!("{}", ErrorCode::Ok("test message 1")),
        "Ok. Code: 0, Text = test message 1."
    );

    assert_eq!(
        format!("{}", ErrorCode::MissingField("no field `id`")),
        "MissingField. Code: 1101, Text = no field `id`."
    );
}

#[test]
fn test_error_code_constants() {
    assert_eq!(ErrorCode::MISSING_FIELD, 1101);
    assert_eq!(ErrorCode::UPSTREAM_STREAM_ERROR, 1102);
    assert_eq!(ErrorCode::ILLEGAL_JOIN_STATE, 1103);
    assert_eq!(ErrorCode::UNKNOWN_VARIABLE, 2801);

    let err = ErrorCode::IllegalJoinState("probe before build");
    assert_eq!(err.code(), ErrorCode::ILLEGAL_JOIN_STATE);
    assert_eq!(err.name(), "IllegalJoinState");
}

#[test]
fn test_add_message() {
    let err = ErrorCode::UpstreamStreamError("connection reset")
        .add_message("scan employee");
    assert_eq!(err.message(), "scan employee\nconnection reset");

    let err = ErrorCode::Internal("oops").add_detail("more");
    assert_eq!(err.message(), "oops\nmore");
}

#[test]
fn test_from_foreign_errors() {
    let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
    let err = ErrorCode::from(io);
    assert_eq!(err.code(), ErrorCode::INTERNAL);
    assert_eq!(err.message(), "disk gone");
    assert!(std::error::Error::source(&err).is_some());

    let parsed: Result<serde_json::Value> = serde_json::from_str("{").map_err(ErrorCode::from);
    assert_eq!(parsed.unwrap_err().code(), ErrorCode::BAD_DATA_VALUE_TYPE);
}

#[test]
fn test_map_err_to_code() {
    let res: Result<u64> = "abc"
        .parse::<u64>()
        .map_err_to_code(ErrorCode::WrongValueForVariable, || "parse threshold");
    let err = res.unwrap_err();
    assert_eq!(err.code(), ErrorCode::WRONG_VALUE_FOR_VARIABLE);
    assert!(err.message().starts_with("parse threshold, cause: "));
}

#[test]
fn test_or_error_code() {
    let missing: Result<u8> = Err(ErrorCode::MissingField("x"));
    assert_eq!(missing.or_error_code(ErrorCode::MISSING_FIELD).unwrap(), None);

    let other: Result<u8> = Err(ErrorCode::Internal("x"));
    assert!(other.or_error_code(ErrorCode::MISSING_FIELD).is_err());

    let ok: Result<u8> = Ok(7);
    assert_eq!(ok.or_error_code(ErrorCode::MISSING_FIELD).unwrap(), Some(7));
}

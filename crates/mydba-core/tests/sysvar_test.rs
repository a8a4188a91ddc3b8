//! System variable reads

use mydba_core::error::{Error, ErrorCategory};
use mydba_core::sysvar::{get_global_variable, get_variable, Scope};
use mydba_core::testing::{MockFailure, MockServer};
use mydba_core::types::{Row, Value};

#[tokio::test]
async fn test_get_global_variable() {
    let server = MockServer::with_defaults();

    let format = get_global_variable(&server, "binlog_format").await.unwrap();
    assert_eq!(format, "ROW");
}

#[tokio::test]
async fn test_session_scope_prefers_session_value() {
    let server = MockServer::with_defaults();

    let mode = get_variable(&server, "sql_mode", Scope::Session).await.unwrap();
    assert_eq!(mode, "STRICT_TRANS_TABLES");

    // falls back to the global value
    let version = get_variable(&server, "version", Scope::Session).await.unwrap();
    assert_eq!(version, "8.0.36");

    assert_eq!(
        server.statements().last().map(String::as_str),
        Some("SELECT @@session.version AS val")
    );
}

#[tokio::test]
async fn test_unknown_variable_is_not_found() {
    let server = MockServer::with_defaults().without_global("binlog_row_image");

    let err = get_global_variable(&server, "binlog_row_image")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::NotFound { ref variable, .. } if variable == "binlog_row_image"));
}

#[tokio::test]
async fn test_codeless_unknown_variable_is_not_found() {
    let server = MockServer::new().fail_on(
        "@@global.gtid_mode",
        MockFailure::query("Unknown system variable 'gtid_mode'"),
    );

    let err = get_global_variable(&server, "gtid_mode").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::NotFound { ref variable, .. } if variable == "gtid_mode"));
}

#[tokio::test]
async fn test_codeless_query_error_is_not_not_found() {
    let server = MockServer::new().fail_on(
        "@@global.gtid_mode",
        MockFailure::query("Lost sync with the server"),
    );

    let err = get_global_variable(&server, "gtid_mode").await.unwrap_err();
    assert!(!err.is_not_found());
    assert_eq!(err.category(), ErrorCategory::Query);
}

#[tokio::test]
async fn test_connection_error_text_is_not_not_found() {
    let server = MockServer::new().fail_on(
        "@@global.gtid_mode",
        MockFailure::connection("Unknown system variable 'gtid_mode'"),
    );

    // a connection error is never a not-found, whatever its text
    let err = get_global_variable(&server, "gtid_mode").await.unwrap_err();
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_other_failure_is_annotated() {
    let server = MockServer::with_defaults().fail_on(
        "@@global.version",
        MockFailure::server(1045, "Access denied for user 'monitor'@'%'"),
    );

    let err = get_global_variable(&server, "version").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Query);
    assert_eq!(err.server_code(), Some(1045));
    assert!(err.to_string().contains("error to get value of var version"));
}

#[tokio::test]
async fn test_null_value_is_query_error() {
    let server = MockServer::with_defaults().respond_to(
        "SELECT @@global.gtid_executed AS val",
        vec![Row::new(vec!["val".into()], vec![Value::Null])],
    );

    let err = get_global_variable(&server, "gtid_executed")
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Query);
    assert!(err.to_string().contains("no value"));
}

#[tokio::test]
async fn test_no_row_is_query_error() {
    let server =
        MockServer::with_defaults().respond_to("SELECT @@global.version AS val", Vec::new());

    let err = get_global_variable(&server, "version").await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Query);
}

#[tokio::test]
async fn test_invalid_name_rejected_before_query() {
    let server = MockServer::with_defaults();

    let err = get_global_variable(&server, "version AS val; SELECT 1")
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(server.statements().is_empty());
}

//! Binlog checks and replication status

use mydba_core::error::{Error, ErrorCategory};
use mydba_core::replication::*;
use mydba_core::testing::{MockFailure, MockServer};

#[tokio::test]
async fn test_row_full_passes() {
    let server = MockServer::with_defaults();
    check_binlog_format_row_full(&server).await.unwrap();
}

#[tokio::test]
async fn test_row_without_row_image_passes() {
    let server = MockServer::with_defaults().without_global("binlog_row_image");
    check_binlog_format_row_full(&server).await.unwrap();
}

#[tokio::test]
async fn test_statement_format_fails() {
    let server = MockServer::with_defaults().with_global("binlog_format", "STATEMENT");

    let err = check_binlog_format_row_full(&server).await.unwrap_err();
    match err {
        Error::InvalidSetting {
            setting,
            expected,
            actual,
        } => {
            assert_eq!(setting, "binlog_format");
            assert_eq!(expected, "ROW");
            assert_eq!(actual, "STATEMENT");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_minimal_row_image_fails() {
    let server = MockServer::with_defaults().with_global("binlog_row_image", "MINIMAL");

    let err = check_binlog_format_row_full(&server).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::InvalidSetting);
    assert!(err.to_string().contains("MINIMAL"));
}

#[tokio::test]
async fn test_row_image_query_error_fails() {
    let server = MockServer::with_defaults().fail_on(
        "@@global.binlog_row_image",
        MockFailure::server(1045, "Access denied"),
    );

    let err = check_binlog_format_row_full(&server).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Query);
}

#[tokio::test]
async fn test_master_status() {
    let server = MockServer::with_defaults().with_master(
        "mysql-bin.000042",
        4711,
        "3e11fa47-71ca-11e1-9e33-c80aa9429562:1-5",
    );

    let position = show_master_status(&server).await.unwrap().unwrap();
    assert_eq!(position.file, "mysql-bin.000042");
    assert_eq!(position.position, 4711);
    assert_eq!(
        position.executed_gtid_set.as_deref(),
        Some("3e11fa47-71ca-11e1-9e33-c80aa9429562:1-5")
    );
}

#[tokio::test]
async fn test_master_status_without_binlog() {
    let server = MockServer::with_defaults().without_master();
    assert!(show_master_status(&server).await.unwrap().is_none());
}

#[tokio::test]
async fn test_slave_status() {
    let server = MockServer::with_defaults();
    assert!(show_slave_status(&server).await.unwrap().is_empty());

    let server = MockServer::with_defaults()
        .with_replica(&[
            ("Connection_name", "east"),
            ("Slave_IO_Running", "Yes"),
            ("Slave_SQL_Running", "Yes"),
            ("Seconds_Behind_Master", "0"),
        ])
        .with_replica(&[
            ("Connection_name", "west"),
            ("Slave_IO_Running", "Connecting"),
            ("Slave_SQL_Running", "Yes"),
            ("Seconds_Behind_Master", ""),
        ]);

    let channels = show_all_slaves_status(&server).await.unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0]["Connection_name"], "east");
    assert_eq!(channels[1]["Slave_IO_Running"], "Connecting");
}

/// Tests for the logging system
///
/// These tests install a capturing logger, so they are serialized to avoid
/// racing on the global logger storage.

use super::*;
use crate::error::Error;
use serial_test::serial;
use std::sync::{Arc, Mutex};

/// Test logger that captures entries into a shared vector
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn install_capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(CaptureLogger {
        entries: Arc::clone(&entries),
    });
    entries
}

#[test]
#[serial]
fn test_info_macro_captures_severity_and_source() {
    let entries = install_capture();

    crate::engine_info!("pulsar::test", "hello {}", 42);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Info);
    assert_eq!(entries[0].source, "pulsar::test");
    assert_eq!(entries[0].message, "hello 42");
    assert!(entries[0].file.is_none());

    drop(entries);
    reset_logger();
}

#[test]
#[serial]
fn test_error_macro_records_file_and_line() {
    let entries = install_capture();

    crate::engine_error!("pulsar::test", "boom");

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert!(entries[0].file.is_some());
    assert!(entries[0].line.is_some());

    drop(entries);
    reset_logger();
}

#[test]
#[serial]
fn test_engine_err_logs_and_produces_error() {
    let entries = install_capture();

    let err = crate::engine_err!("pulsar::test", "bad thing {}", 1);
    assert_eq!(err, Error::BackendError("bad thing 1".to_string()));

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert_eq!(entries[0].message, "bad thing 1");

    drop(entries);
    reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_returns_err() {
    let entries = install_capture();

    fn failing() -> crate::error::Result<()> {
        crate::engine_bail!("pulsar::test", "cannot continue");
    }

    let result = failing();
    assert!(matches!(result, Err(Error::BackendError(msg)) if msg == "cannot continue"));
    assert_eq!(entries.lock().unwrap().len(), 1);

    reset_logger();
}

#[test]
#[serial]
fn test_engine_warn_err_uses_warn_severity() {
    let entries = install_capture();

    let err = crate::engine_warn_err!("pulsar::test", "soft failure");
    assert!(matches!(err, Error::BackendError(_)));
    assert_eq!(entries.lock().unwrap()[0].severity, LogSeverity::Warn);

    reset_logger();
}

#[test]
#[serial]
fn test_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
#[serial]
fn test_reset_logger_restores_default() {
    let entries = install_capture();
    reset_logger();

    // After reset, the capture logger no longer receives entries
    crate::engine_info!("pulsar::test", "into the void");
    assert_eq!(entries.lock().unwrap().len(), 0);
}

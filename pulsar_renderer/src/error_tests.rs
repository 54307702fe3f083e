/// Tests for renderer error types

use super::*;

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("queue submit failed".to_string());
    assert_eq!(err.to_string(), "Backend error: queue submit failed");
}

#[test]
fn test_out_of_memory_display() {
    let err = Error::OutOfMemory;
    assert_eq!(err.to_string(), "Out of GPU memory");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("stale buffer id".to_string());
    assert_eq!(err.to_string(), "Invalid resource: stale buffer id");
}

#[test]
fn test_invalid_operation_display() {
    let err = Error::InvalidOperation("unbalanced marker scope".to_string());
    assert_eq!(err.to_string(), "Invalid operation: unbalanced marker scope");
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("no device".to_string());
    assert_eq!(err.to_string(), "Initialization failed: no device");
}

#[test]
fn test_error_is_std_error() {
    fn assert_std_error<E: std::error::Error>(_: &E) {}
    assert_std_error(&Error::OutOfMemory);
}

#[test]
fn test_result_alias() {
    let ok: Result<u32> = Ok(7);
    assert_eq!(ok.unwrap(), 7);

    let err: Result<u32> = Err(Error::OutOfMemory);
    assert!(err.is_err());
}

use thiserror::Error;

/// Top-level error type for the custom procedure subsystem.
/// Each variant corresponds to a distinct stage of the lifecycle:
/// parsing a signature, validating it, persisting it, registering
/// it, or invoking the resulting callable.
#[derive(Error, Debug)]
pub enum SigilError {
    /// Combined syntax diagnostic for a signature definition. The text
    /// is the complete user-facing message.
    #[error("{0}")]
    Signature(String),

    /// Fixed messages so client tooling can pattern-match on them.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Routing(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("{0}")]
    Registration(String),

    #[error("execution error: {0}")]
    Execution(String),

    /// Raised when invoking a name that is only present as a tombstone.
    /// The message is stable so callers can pattern-match on it.
    #[error("There is no procedure with the name `{0}` registered for this database instance. Please ensure you've spelled the procedure name correctly and that the procedure is properly deployed.")]
    UnknownProcedure(String),

    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("no such procedure or function: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type SigilResult<T> = Result<T, SigilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SigilError = io_err.into();
        assert!(matches!(err, SigilError::Io { .. }));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn display_formatting() {
        // User-facing messages carry no variant prefix.
        let err = SigilError::Validation("Query results do not match requested output.".to_string());
        assert_eq!(err.to_string(), "Query results do not match requested output.");

        let err = SigilError::Store("cannot parse store JSON".to_string());
        assert_eq!(err.to_string(), "store error: cannot parse store JSON");

        let err = SigilError::UnknownFunction("custom.answer".to_string());
        assert_eq!(err.to_string(), "Unknown function 'custom.answer'");
    }

    #[test]
    fn tombstone_message_is_stable() {
        let err = SigilError::UnknownProcedure("custom.answer".to_string());
        let text = err.to_string();
        assert!(text.starts_with("There is no procedure with the name `custom.answer`"));
        assert!(text.contains("properly deployed"));
    }

    #[test]
    fn result_alias_works() {
        fn returns_ok() -> SigilResult<i32> {
            Ok(42)
        }
        fn returns_err() -> SigilResult<i32> {
            Err(SigilError::Internal("oops".into()))
        }
        assert_eq!(returns_ok().unwrap(), 42);
        assert!(returns_err().is_err());
    }
}

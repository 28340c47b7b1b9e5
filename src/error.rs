//! Error taxonomy for the engine.
//!
//! Kinds follow the design in spec §7: validation errors stop a run before
//! it starts; recoverable conditions are logged and the run continues;
//! resource errors fail fast; protocol errors from the exchange are
//! retried when the code is known-retryable; fatal errors stop a run
//! mid-flight but still produce a well-formed result.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("resource: {0}")]
    Resource(String),

    #[error("protocol error (code={code}, retryable={retryable}): {message}")]
    Protocol {
        code: String,
        retryable: bool,
        message: String,
    },

    #[error("fatal: {0}")]
    Fatal(String),
}

/// Exchange error codes the order executor retries with exponential
/// backoff, per `original_source/backend/services/live_trading/order_executor.py::_is_retryable_error`.
pub const RETRYABLE_PROTOCOL_CODES: &[&str] = &["10002", "10006", "10016", "110001", "110003"];

pub fn is_retryable_code(code: &str) -> bool {
    RETRYABLE_PROTOCOL_CODES.contains(&code)
}

impl EngineError {
    pub fn protocol(code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let retryable = is_retryable_code(&code);
        EngineError::Protocol {
            code,
            retryable,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_are_retryable() {
        for code in RETRYABLE_PROTOCOL_CODES {
            assert!(is_retryable_code(code));
        }
    }

    #[test]
    fn unknown_code_is_not_retryable() {
        assert!(!is_retryable_code("99999"));
        let err = EngineError::protocol("99999", "unknown failure");
        match err {
            EngineError::Protocol { retryable, .. } => assert!(!retryable),
            _ => panic!("expected protocol variant"),
        }
    }
}

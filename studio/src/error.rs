//! Error codes shared by the studio error enums.

/// Grepable error code and retryable flag for surfaced failures.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

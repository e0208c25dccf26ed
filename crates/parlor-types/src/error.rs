use thiserror::Error;

/// Errors from repository operations (used by trait definitions in parlor-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to bot registry operations.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("bot not found")]
    NotFound,

    #[error("permission denied: caller does not own this bot")]
    PermissionDenied,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to chat session and message operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat session not found")]
    SessionNotFound,

    #[error("permission denied: caller does not own this session")]
    PermissionDenied,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from the completion gateway.
///
/// Network failures, non-success statuses, and unusable response bodies all
/// surface to callers as a single "completion failed" error; the variant
/// records the cause for logging but no retry is ever performed.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion failed: network error: {0}")]
    Network(String),

    #[error("completion failed: provider error: {0}")]
    Api(String),

    #[error("completion failed: malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors from the session controller.
///
/// These are pre-flight rejections: the operation was never started, so no
/// compensating action is needed. Failures after an optimistic apply are
/// reported via `SendOutcome::RolledBack` instead.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("bot not found")]
    BotNotFound,

    #[error("no chat session is selected")]
    NoSessionSelected,

    #[error("message text is empty")]
    EmptyMessage,

    #[error("operation '{0}' already in flight")]
    Busy(&'static str),

    #[error("cannot delete the last remaining session")]
    LastSession,

    #[error("session is not part of the current view")]
    UnknownSession,

    #[error("controller is not ready")]
    NotReady,

    #[error("storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_completion_errors_surface_as_completion_failed() {
        let errs: [CompletionError; 3] = [
            CompletionError::Network("timed out".to_string()),
            CompletionError::Api("500".to_string()),
            CompletionError::MalformedResponse("missing choices".to_string()),
        ];
        for err in errs {
            assert!(err.to_string().starts_with("completion failed:"));
        }
    }

    #[test]
    fn test_controller_busy_display() {
        let err = ControllerError::Busy("send");
        assert_eq!(err.to_string(), "operation 'send' already in flight");
    }
}

//! Error types for the event dispatcher

/// Errors raised while registering, resolving or invoking listeners.
///
/// Listener failures are never swallowed by the dispatcher: the first error
/// aborts the remaining listeners and is handed back to the caller of
/// `dispatch`, `until`, `flush` or `defer`.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A class-based listener has no method the dispatcher can call
    #[error("Invalid callable: {}", describe_callable(.class, .method))]
    InvalidCallable {
        class: String,
        method: Option<String>,
    },

    /// A class-based listener was dispatched but no container is configured
    #[error("No container configured to resolve listener class: {0}")]
    ContainerMissing(String),

    /// The container has no binding for the requested class
    #[error("Listener class not bound in container: {0}")]
    ListenerNotBound(String),

    /// A listener reported a failure
    #[error("Listener failed: {0}")]
    ListenerFailed(String),

    /// Deferral contexts nested deeper than the configured limit
    #[error("Deferred dispatch nested deeper than {0} contexts")]
    DeferDepthExceeded(usize),

    /// Configuration could not be parsed or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error raised from inside a listener
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

fn describe_callable(class: &str, method: &Option<String>) -> String {
    match method {
        Some(method) => format!("{class}@{method} does not exist"),
        None => format!("{class} has neither a handle method nor an invocable form"),
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Other(Box::new(err))
    }
}

impl From<toml::de::Error> for DispatchError {
    fn from(err: toml::de::Error) -> Self {
        DispatchError::Config(err.to_string())
    }
}

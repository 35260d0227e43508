//! Error types for bindings and channel media

use thiserror::Error;

/// Failure reported by a channel medium.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediumError {
    #[error("failed to release endpoint on topic '{topic}': {reason}")]
    Release { topic: String, reason: String },

    #[error("topic '{topic}' is closed")]
    Closed { topic: String },
}

/// Endpoints that could not be released cleanly.
///
/// Both endpoints are always released (and cleared from the binding) before
/// this is returned, so a failure on one side never leaks the other.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("release failed on topic '{topic}' (publisher: {}, subscriber: {})",
    side(.publisher), side(.subscriber))]
pub struct ReleaseError {
    pub topic: String,
    pub publisher: Option<MediumError>,
    pub subscriber: Option<MediumError>,
}

fn side(err: &Option<MediumError>) -> String {
    match err {
        Some(e) => e.to_string(),
        None => "ok".to_string(),
    }
}

/// Lifecycle errors raised by a binding itself.
///
/// Errors from user update closures never appear here; they are returned
/// from `update()` unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("binding on topic '{topic}' is closed")]
    Closed { topic: String },

    #[error(transparent)]
    Release(#[from] ReleaseError),

    #[error("{} binding(s) failed", .0.len())]
    Group(Vec<BindingError>),
}

/// One member's update failure inside a group pass.
#[derive(Error, Debug)]
#[error("update failed on topic '{topic}'")]
pub struct UpdateFailure<E: std::error::Error + 'static> {
    pub topic: String,
    #[source]
    pub source: E,
}

/// All update failures collected during one group pass.
#[derive(Error, Debug)]
#[error("{} binding update(s) failed", .failures.len())]
pub struct GroupUpdateError<E: std::error::Error + 'static> {
    pub failures: Vec<UpdateFailure<E>>,
}

/// Invalid group configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("group name must not be empty")]
    EmptyName,
}

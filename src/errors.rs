use anyhow::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug)]
pub struct ServerError(Error);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        log::error!("{:?}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            .into_response()
    }
}

// This enables using `?` on functions that return `Result<_, anyhow::Error>`
// to turn them into `Result<_, ServerError>`. That way you don't need to do
// that manually.
impl<E> From<E> for ServerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Everything that can go wrong inside a session operation. None of these
/// are fatal; the session controller turns each one into a notice.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Please select a valid image file")]
    NotAnImage,

    #[error("Upload a map first")]
    NoImage,

    #[error("Click inside the map image to place a location")]
    OutsideImage,

    #[error("Turn on location placement before clicking the map")]
    NotPlacing,

    #[error("A location needs a name")]
    MissingName,

    #[error("Session date must look like YYYY-MM-DD, got {0:?}")]
    InvalidDate(String),

    #[error("There are no locations to clear")]
    NoMarkers,

    #[error("No {kind} with id {id}")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Error saving session: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Error saving session: {0}")]
    Storage(#[source] std::io::Error),

    #[error("Error loading session: {0}")]
    StorageRead(#[source] std::io::Error),

    #[error("Error loading session: {0}")]
    Parse(#[source] serde_json::Error),
}

impl ToolError {
    /// Persistence failures are shown as errors; everything else is a
    /// validation problem the user can fix and is shown as information.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            ToolError::Serialize(_)
                | ToolError::Storage(_)
                | ToolError::StorageRead(_)
                | ToolError::Parse(_)
        )
    }
}

/// Result of an operation gated by a confirmation dialog. Declining is a
/// normal outcome, not an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Cancelled,
}

impl Outcome {
    pub fn gate(confirmed: bool) -> Self {
        if confirmed {
            Outcome::Applied
        } else {
            Outcome::Cancelled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_classification() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "quota");
        assert!(ToolError::Storage(io).is_persistence());
        assert!(!ToolError::OutsideImage.is_persistence());
        assert!(!ToolError::NotFound { kind: "note", id: 3 }.is_persistence());
    }

    #[test]
    fn test_storage_messages_name_the_direction() {
        let denied = || {
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
        };
        assert_eq!(
            ToolError::Storage(denied()).to_string(),
            "Error saving session: denied"
        );
        let read = ToolError::StorageRead(denied());
        assert_eq!(read.to_string(), "Error loading session: denied");
        assert!(read.is_persistence());
    }

    #[test]
    fn test_gate() {
        assert_eq!(Outcome::gate(true), Outcome::Applied);
        assert_eq!(Outcome::gate(false), Outcome::Cancelled);
    }
}

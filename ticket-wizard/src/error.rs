//! Error taxonomy for the wizard.
//!
//! Every error is recovered by the reducer and shown to the user as a
//! [`Notification`]; [`WizardError::notification`] holds the wording.

use crate::navigation::{NavEvent, WizardStep};
use crate::types::{Field, Notification, NotificationLevel};
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use crate::storage::StorageError;
pub use crate::upload::UploadError;

/// Navigation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// Proceeding without a selected offering
    #[error("no ticket selected")]
    NoSelection,

    /// The current step does not handle the event
    #[error("cannot {event} from {from}")]
    InvalidTransition {
        /// Step the event was raised on
        from: WizardStep,
        /// Rejected event
        event: NavEvent,
    },

    /// Route name that matches no step
    #[error("unknown route '{0}'")]
    UnknownRoute(String),
}

/// A field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{field} is invalid")]
pub struct ValidationError {
    /// Failing field
    pub field: Field,
}

/// Any failure the wizard can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    /// One or more attendee fields are invalid
    #[error("{} field(s) failed validation", .0.len())]
    Validation(Vec<ValidationError>),

    /// Image upload failed or was refused
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Persisted ticket could not be read or written
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Navigation was refused
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    /// The selected offering could not be stored
    #[error("failed to store selection: {0}")]
    SelectionFailed(StorageError),

    /// Offering id not in the catalog
    #[error("unknown ticket offering '{0}'")]
    UnknownOffering(String),

    /// Submit while the profile picture is still uploading
    #[error("profile picture upload still in progress")]
    UploadInProgress,

    /// No reservation is stored
    #[error("no reservation stored")]
    NoReservation,

    /// Action not available on the current step
    #[error("{action} is not available on the {step} step")]
    WrongStep {
        /// What was attempted
        action: &'static str,
        /// Where it was attempted
        step: WizardStep,
    },
}

impl From<ValidationError> for WizardError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(vec![error])
    }
}

impl WizardError {
    /// User-facing notification for this error
    #[must_use]
    pub fn notification(&self, at: DateTime<Utc>) -> Notification {
        let (level, title, description) = match self {
            Self::Validation(_) => (
                NotificationLevel::Error,
                "Validation Failed",
                "Please fill all required fields correctly".to_string(),
            ),
            Self::Upload(UploadError::UnsupportedType { .. }) => (
                NotificationLevel::Error,
                "Invalid file type",
                "Please upload a JPEG, PNG, or GIF image".to_string(),
            ),
            Self::Upload(UploadError::TooLarge { .. }) => (
                NotificationLevel::Error,
                "File too large",
                "Maximum file size is 5MB".to_string(),
            ),
            Self::Upload(UploadError::UploadFailed(_)) => (
                NotificationLevel::Error,
                "Upload failed",
                "Please try again or check your connection".to_string(),
            ),
            Self::Storage(StorageError::ReadCorrupt(_)) => (
                NotificationLevel::Error,
                "Error retrieving ticket details",
                "Unable to parse ticket information".to_string(),
            ),
            Self::Storage(StorageError::WriteFailed(_)) => (
                NotificationLevel::Error,
                "Failed to save ticket",
                "Please try again".to_string(),
            ),
            Self::SelectionFailed(_) => (
                NotificationLevel::Error,
                "Failed to select ticket",
                "Please try again".to_string(),
            ),
            Self::Navigation(NavigationError::NoSelection) => (
                NotificationLevel::Error,
                "Please select a ticket",
                "You must choose a ticket to proceed".to_string(),
            ),
            Self::Navigation(error) => (
                NotificationLevel::Warning,
                "Navigation not allowed",
                error.to_string(),
            ),
            Self::UnknownOffering(id) => (
                NotificationLevel::Error,
                "Ticket not found",
                format!("No ticket with id '{id}' is on offer"),
            ),
            Self::UploadInProgress => (
                NotificationLevel::Warning,
                "Image Upload in Progress",
                "Please wait for the profile picture to finish uploading".to_string(),
            ),
            Self::NoReservation => (
                NotificationLevel::Error,
                "No ticket selected",
                "Please select a ticket first".to_string(),
            ),
            Self::WrongStep { .. } => (
                NotificationLevel::Warning,
                "Not available here",
                self.to_string(),
            ),
        };
        Notification::new(level, title, at).with_description(description)
    }
}

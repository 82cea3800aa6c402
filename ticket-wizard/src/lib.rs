//! # Ticket Wizard
//!
//! A three-step event ticket reservation flow:
//!
//! 1. **Selecting** - pick an offering from the fixed catalog
//! 2. **Details** - enter attendee details and upload a profile picture
//! 3. **Confirmation** - view the generated ticket
//!
//! Everything the steps share travels through one persisted
//! [`ReservationRecord`](types::ReservationRecord) held by a
//! [`TicketStorage`](storage::TicketStorage). Transient form input lives in an
//! [`AttendeeDraft`](types::AttendeeDraft) that is never persisted on its own.
//!
//! The flow is a reducer ([`WizardReducer`](reducer::WizardReducer)) driven by
//! the `wizard-runtime` `Store`. The only suspending operation, the image
//! upload, runs as an effect whose result comes back as
//! [`WizardAction::UploadFinished`](reducer::WizardAction::UploadFinished).
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ticket_wizard::prelude::*;
//! use wizard_core::environment::SystemClock;
//! use wizard_runtime::Store;
//!
//! let env = WizardEnvironment::new(
//!     Arc::new(InMemoryStorage::new()),
//!     Arc::new(MockUploadGateway::new()),
//!     Arc::new(SystemClock),
//! );
//! let store = Store::new(WizardState::default(), WizardReducer::new(), env);
//!
//! store.send(WizardAction::Start).await?;
//! store.send(WizardAction::SelectOffering { offering_id: "free-1".into() }).await?;
//! store.send(WizardAction::Proceed).await?;
//! ```

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod navigation;
pub mod reducer;
pub mod storage;
pub mod types;
pub mod upload;
pub mod validation;
pub mod view;

/// Commonly used types
pub mod prelude {
    pub use crate::catalog::{CATALOG, find_offering};
    pub use crate::config::{UploadConfig, WizardConfig};
    pub use crate::error::{NavigationError, ValidationError, WizardError};
    pub use crate::navigation::{NavEvent, WizardStep, transition};
    pub use crate::reducer::{WizardAction, WizardEnvironment, WizardReducer, WizardState};
    pub use crate::storage::{InMemoryStorage, JsonFileStorage, StorageError, TicketStorage};
    pub use crate::types::{
        AttendeeDetails, AttendeeDraft, Field, FieldErrors, ImageSlot, Notification,
        NotificationLevel, ReservationRecord, TextField, TicketKind, TicketOffering, UploadToken,
    };
    pub use crate::upload::{
        HttpUploadGateway, ImageFile, MockUploadGateway, UploadError, UploadGateway,
    };
    pub use crate::view::TicketView;
}

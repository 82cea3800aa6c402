//! Step order of the wizard.
//!
//! [`transition`] is the only place that decides where an event leads. The
//! reducer runs the leave/enter hooks around whatever step it returns.

use crate::error::NavigationError;
use std::fmt;
use std::str::FromStr;

/// A wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WizardStep {
    /// Choosing an offering
    #[default]
    Selecting,
    /// Entering attendee details
    Details,
    /// Viewing the ticket
    Confirmation,
}

impl WizardStep {
    /// Route name of the step
    #[must_use]
    pub const fn route(self) -> &'static str {
        match self {
            Self::Selecting => "selection",
            Self::Details => "details",
            Self::Confirmation => "ticket",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

impl FromStr for WizardStep {
    type Err = NavigationError;

    fn from_str(route: &str) -> Result<Self, Self::Err> {
        match route.trim().trim_start_matches('/') {
            "selection" | "" => Ok(Self::Selecting),
            "details" => Ok(Self::Details),
            "ticket" => Ok(Self::Confirmation),
            other => Err(NavigationError::UnknownRoute(other.to_string())),
        }
    }
}

/// Something that may move the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// "Next" on the selection step
    Proceed {
        /// An offering is selected
        selected: bool,
        /// The stored record for that offering is complete
        record_complete: bool,
    },
    /// Attendee details were validated and stored
    DetailsSubmitted,
    /// Back to the previous step
    Back,
    /// Direct route change
    Visit {
        /// Requested step
        target: WizardStep,
        /// An offering is selected or stored
        selected: bool,
    },
}

impl fmt::Display for NavEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed { .. } => f.write_str("proceed"),
            Self::DetailsSubmitted => f.write_str("submit details"),
            Self::Back => f.write_str("back"),
            Self::Visit { target, .. } => write!(f, "visit {target}"),
        }
    }
}

/// Resolves the step an event leads to
///
/// # Errors
///
/// Returns [`NavigationError::NoSelection`] when proceeding, or visiting any
/// step past the selection, without a selection, and [`NavigationError::InvalidTransition`] for events the
/// current step does not handle.
pub fn transition(step: WizardStep, event: NavEvent) -> Result<WizardStep, NavigationError> {
    use WizardStep::{Confirmation, Details, Selecting};

    match (step, event) {
        (_, NavEvent::Visit { target: Selecting, .. }) => Ok(Selecting),
        (_, NavEvent::Visit { selected: false, .. }) => Err(NavigationError::NoSelection),
        (_, NavEvent::Visit { target, .. }) => Ok(target),
        (Selecting, NavEvent::Proceed { selected: false, .. }) => Err(NavigationError::NoSelection),
        (Selecting, NavEvent::Proceed { record_complete: true, .. }) => Ok(Confirmation),
        (Selecting, NavEvent::Proceed { record_complete: false, .. }) => Ok(Details),
        (Details, NavEvent::DetailsSubmitted) => Ok(Confirmation),
        (Details, NavEvent::Back) => Ok(Selecting),
        (Confirmation, NavEvent::Back) => Ok(Details),
        (from, event) => Err(NavigationError::InvalidTransition { from, event }),
    }
}

//! The wizard reducer.
//!
//! One reducer owns every step. Navigation goes through
//! [`transition`](crate::navigation::transition); whenever the step actually
//! changes, the leave hook of the old step runs before the enter hook of the
//! new one:
//!
//! | Step | on leave | on enter |
//! |---|---|---|
//! | Selecting | forget the selection | load the selection from storage |
//! | Details | reset the draft | pre-fill the draft from stored attendee details |
//! | Confirmation | forget the loaded ticket | load the ticket, or redirect to Selecting |
//!
//! Hooks only touch transient state. The persisted record changes only on
//! selection, submit and clear.

use crate::catalog::find_offering;
use crate::error::{ValidationError, WizardError};
use crate::navigation::{NavEvent, WizardStep, transition};
use crate::storage::TicketStorage;
use crate::types::{
    AttendeeDetails, AttendeeDraft, ImageSlot, Notification, NotificationLevel, ReservationRecord,
    TextField, TicketKind, UploadToken,
};
use crate::upload::{ImageFile, UploadError, UploadGateway, preflight};
use crate::validation::{validate_draft, validate_text};
use crate::view::TicketView;
use std::sync::Arc;
use wizard_core::{Effects, SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};

/// Everything the wizard shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardState {
    /// Current step
    pub step: WizardStep,
    /// Offering chosen on the selection step
    pub selection: Option<ReservationRecord>,
    /// Attendee form
    pub draft: AttendeeDraft,
    /// Record shown on the confirmation step
    pub ticket: Option<ReservationRecord>,
    /// Notifications not yet dismissed, oldest first
    pub notifications: Vec<Notification>,
    /// Last issued upload token; survives draft resets
    pub last_upload_token: UploadToken,
}

impl WizardState {
    /// Confirmation view of the loaded ticket
    #[must_use]
    pub fn ticket_view(&self) -> Option<TicketView> {
        self.ticket.as_ref().map(TicketView::from_record)
    }

    /// Most recent notification
    #[must_use]
    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    fn issue_upload_token(&mut self) -> UploadToken {
        self.last_upload_token = self.last_upload_token.next();
        self.last_upload_token
    }
}

/// Inputs to the wizard
#[derive(Debug, Clone)]
pub enum WizardAction {
    /// Runs the enter hook of the initial step
    Start,
    /// Picks an offering by id
    SelectOffering {
        /// Catalog id
        offering_id: String,
    },
    /// "Next" on the selection step
    Proceed,
    /// Direct route change
    Navigate(WizardStep),
    /// Back to the previous step
    Back,
    /// Text input on the details step
    EditField {
        /// Edited field
        field: TextField,
        /// New value
        value: String,
    },
    /// A profile picture was chosen
    BeginUpload {
        /// Chosen file
        file: ImageFile,
    },
    /// An upload effect finished
    UploadFinished {
        /// Token issued when the upload began
        token: UploadToken,
        /// URL or failure
        outcome: Result<String, UploadError>,
    },
    /// Validate and store the attendee details
    SubmitDetails,
    /// Remove the stored reservation
    ClearReservation,
    /// Drop the oldest `seen` notifications
    DismissNotifications {
        /// How many were displayed
        seen: usize,
    },
}

/// Dependencies of the wizard
#[derive(Clone)]
pub struct WizardEnvironment {
    /// Persisted reservation slot
    pub storage: Arc<dyn TicketStorage>,
    /// Image upload service
    pub uploader: Arc<dyn UploadGateway>,
    /// Timestamps for notifications
    pub clock: Arc<dyn Clock>,
}

impl WizardEnvironment {
    /// Creates an environment
    #[must_use]
    pub fn new(
        storage: Arc<dyn TicketStorage>,
        uploader: Arc<dyn UploadGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            uploader,
            clock,
        }
    }
}

type Outcome = Result<Effects<WizardAction>, WizardError>;

/// Reducer for the ticket wizard
#[derive(Clone, Debug, Default)]
pub struct WizardReducer;

impl WizardReducer {
    /// Creates a new `WizardReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn notify(
        state: &mut WizardState,
        env: &WizardEnvironment,
        level: NotificationLevel,
        title: impl Into<String>,
        description: Option<&str>,
    ) {
        let mut notification = Notification::new(level, title, env.clock.now());
        if let Some(description) = description {
            notification = notification.with_description(description);
        }
        state.notifications.push(notification);
    }

    fn report(state: &mut WizardState, env: &WizardEnvironment, error: &WizardError) {
        tracing::warn!(step = %state.step, %error, "Wizard action rejected");
        state.notifications.push(error.notification(env.clock.now()));
    }

    fn require_step(
        state: &WizardState,
        expected: WizardStep,
        action: &'static str,
    ) -> Result<(), WizardError> {
        if state.step == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                action,
                step: state.step,
            })
        }
    }

    /// Reads the stored record, reporting corruption and treating it as absent
    fn load_record(state: &mut WizardState, env: &WizardEnvironment) -> Option<ReservationRecord> {
        match env.storage.get() {
            Ok(record) => record,
            Err(error) => {
                Self::report(state, env, &error.into());
                None
            },
        }
    }

    fn move_to(state: &mut WizardState, env: &WizardEnvironment, next: WizardStep) {
        if next == state.step {
            return;
        }
        let from = state.step;
        Self::on_leave(state, from);
        state.step = next;
        tracing::info!(%from, to = %next, "Step changed");
        Self::on_enter(state, env);
    }

    fn on_leave(state: &mut WizardState, step: WizardStep) {
        match step {
            WizardStep::Selecting => state.selection = None,
            WizardStep::Details => state.draft = AttendeeDraft::default(),
            WizardStep::Confirmation => state.ticket = None,
        }
    }

    fn on_enter(state: &mut WizardState, env: &WizardEnvironment) {
        match state.step {
            WizardStep::Selecting => {
                state.selection = Self::load_record(state, env);
            },
            WizardStep::Details => {
                state.draft = Self::load_record(state, env)
                    .and_then(|record| record.attendee)
                    .map(|attendee| AttendeeDraft::from_attendee(&attendee))
                    .unwrap_or_default();
            },
            WizardStep::Confirmation => match env.storage.get() {
                Ok(Some(record)) => state.ticket = Some(record),
                Ok(None) => {
                    Self::report(state, env, &WizardError::NoReservation);
                    Self::move_to(state, env, WizardStep::Selecting);
                },
                Err(error) => {
                    Self::report(state, env, &error.into());
                    Self::move_to(state, env, WizardStep::Selecting);
                },
            },
        }
    }

    fn select(state: &mut WizardState, env: &WizardEnvironment, offering_id: &str) -> Outcome {
        Self::require_step(state, WizardStep::Selecting, "Selecting a ticket")?;
        let offering = find_offering(offering_id)
            .ok_or_else(|| WizardError::UnknownOffering(offering_id.to_string()))?;

        let record = ReservationRecord::from_offering(offering);
        env.storage.set(&record).map_err(WizardError::SelectionFailed)?;

        tracing::info!(ticket_id = offering.id, kind = %offering.kind, "Ticket selected");
        state.selection = Some(record);
        let hint = match offering.kind {
            TicketKind::Free => "Proceed to attendee details",
            TicketKind::Paid => "Proceed to payment",
        };
        Self::notify(
            state,
            env,
            NotificationLevel::Success,
            format!("{} selected", offering.name),
            Some(hint),
        );
        Ok(SmallVec::new())
    }

    fn proceed(state: &mut WizardState, env: &WizardEnvironment) -> Outcome {
        let selected_id = state.selection.as_ref().map(|record| record.id.clone());
        // Completeness only counts when the stored record is the selected one.
        let record_complete = match &selected_id {
            Some(id) => match env.storage.get() {
                Ok(Some(stored)) => stored.id == *id && stored.is_complete(),
                Ok(None) => false,
                Err(error) => {
                    tracing::warn!(%error, "Stored ticket unreadable, treating as incomplete");
                    false
                },
            },
            None => false,
        };

        let next = transition(
            state.step,
            NavEvent::Proceed {
                selected: selected_id.is_some(),
                record_complete,
            },
        )?;
        Self::move_to(state, env, next);
        Ok(SmallVec::new())
    }

    /// An offering is selected, or a record is stored
    ///
    /// An unreadable record counts as stored so the enter hook can report it.
    fn has_selection(state: &WizardState, env: &WizardEnvironment) -> bool {
        state.selection.is_some() || !matches!(env.storage.get(), Ok(None))
    }

    fn visit(state: &mut WizardState, env: &WizardEnvironment, target: WizardStep) -> Outcome {
        let selected = Self::has_selection(state, env);
        Self::navigate(state, env, NavEvent::Visit { target, selected })
    }

    fn navigate(state: &mut WizardState, env: &WizardEnvironment, event: NavEvent) -> Outcome {
        let next = transition(state.step, event)?;
        Self::move_to(state, env, next);
        Ok(SmallVec::new())
    }

    fn edit_field(state: &mut WizardState, field: TextField, value: String) -> Outcome {
        Self::require_step(state, WizardStep::Details, "Editing attendee details")?;
        let valid = validate_text(field, &value);
        state.draft.set_text(field, value);
        state.draft.errors.set(field.into(), !valid);
        Ok(SmallVec::new())
    }

    fn begin_upload(state: &mut WizardState, env: &WizardEnvironment, file: ImageFile) -> Outcome {
        Self::require_step(state, WizardStep::Details, "Uploading a profile picture")?;

        if let Err(error) = preflight(&file) {
            state.draft.image = ImageSlot::Empty;
            state.draft.errors.file = true;
            return Err(error.into());
        }

        let token = state.issue_upload_token();
        tracing::info!(%token, file_name = %file.file_name, size = file.size(), "Upload started");
        state.draft.image = ImageSlot::Uploading {
            token,
            file_name: file.file_name.clone(),
        };
        state.draft.errors.file = false;
        Self::notify(state, env, NotificationLevel::Info, "Uploading file...", None);

        let upload = env.uploader.upload(file);
        Ok(smallvec![Effect::future(async move {
            let outcome = upload.await;
            Some(WizardAction::UploadFinished { token, outcome })
        })])
    }

    fn finish_upload(
        state: &mut WizardState,
        env: &WizardEnvironment,
        token: UploadToken,
        outcome: Result<String, UploadError>,
    ) -> Outcome {
        let in_flight = matches!(
            state.draft.image,
            ImageSlot::Uploading { token: current, .. } if current == token
        );
        if !in_flight {
            tracing::debug!(%token, "Discarding stale upload result");
            return Ok(SmallVec::new());
        }

        // A blank reference would later store an incomplete record.
        let outcome = outcome.and_then(|url| {
            if url.trim().is_empty() {
                Err(UploadError::UploadFailed("upload returned an empty URL".to_string()))
            } else {
                Ok(url)
            }
        });

        match outcome {
            Ok(url) => {
                tracing::info!(%token, %url, "Upload finished");
                state.draft.image = ImageSlot::Uploaded { url };
                state.draft.errors.file = false;
                Self::notify(state, env, NotificationLevel::Success, "Profile picture uploaded", None);
                Ok(SmallVec::new())
            },
            Err(error) => {
                state.draft.image = ImageSlot::Empty;
                state.draft.errors.file = true;
                Err(error.into())
            },
        }
    }

    fn submit(state: &mut WizardState, env: &WizardEnvironment) -> Outcome {
        Self::require_step(state, WizardStep::Details, "Submitting attendee details")?;

        let errors = validate_draft(&state.draft);
        state.draft.errors = errors;
        if errors.any() {
            return Err(WizardError::Validation(
                errors
                    .failing()
                    .into_iter()
                    .map(|field| ValidationError { field })
                    .collect(),
            ));
        }
        if state.draft.image.is_uploading() {
            return Err(WizardError::UploadInProgress);
        }

        let mut record = env.storage.get()?.ok_or(WizardError::NoReservation)?;
        let draft = &state.draft;
        record.attendee = Some(AttendeeDetails {
            name: draft.name.clone(),
            email: draft.email.clone(),
            special_request: Some(draft.special_request.clone()),
            profile_image_url: draft.image.url().map(str::to_string),
        });
        env.storage.set(&record)?;

        tracing::info!(ticket_id = %record.id, "Attendee details submitted");
        Self::notify(
            state,
            env,
            NotificationLevel::Success,
            "Form Submitted Successfully",
            Some("Your details have been recorded"),
        );
        let next = transition(state.step, NavEvent::DetailsSubmitted)?;
        Self::move_to(state, env, next);
        Ok(SmallVec::new())
    }

    fn clear(state: &mut WizardState, env: &WizardEnvironment) -> Outcome {
        env.storage.clear()?;
        tracing::info!("Reservation cleared");

        state.selection = None;
        state.ticket = None;
        state.draft = AttendeeDraft::default();
        Self::notify(state, env, NotificationLevel::Info, "Reservation cleared", None);
        Self::move_to(state, env, WizardStep::Selecting);
        Ok(SmallVec::new())
    }
}

impl Reducer for WizardReducer {
    type State = WizardState;
    type Action = WizardAction;
    type Environment = WizardEnvironment;

    fn reduce(
        &self,
        state: &mut WizardState,
        action: WizardAction,
        env: &WizardEnvironment,
    ) -> Effects<WizardAction> {
        let outcome = match action {
            WizardAction::Start => {
                Self::on_enter(state, env);
                Ok(SmallVec::new())
            },
            WizardAction::SelectOffering { offering_id } => Self::select(state, env, &offering_id),
            WizardAction::Proceed => Self::proceed(state, env),
            WizardAction::Navigate(step) => Self::visit(state, env, step),
            WizardAction::Back => Self::navigate(state, env, NavEvent::Back),
            WizardAction::EditField { field, value } => Self::edit_field(state, field, value),
            WizardAction::BeginUpload { file } => Self::begin_upload(state, env, file),
            WizardAction::UploadFinished { token, outcome } => {
                Self::finish_upload(state, env, token, outcome)
            },
            WizardAction::SubmitDetails => Self::submit(state, env),
            WizardAction::ClearReservation => Self::clear(state, env),
            WizardAction::DismissNotifications { seen } => {
                let seen = seen.min(state.notifications.len());
                state.notifications.drain(..seen);
                Ok(SmallVec::new())
            },
        };

        outcome.unwrap_or_else(|error| {
            Self::report(state, env, &error);
            SmallVec::new()
        })
    }
}

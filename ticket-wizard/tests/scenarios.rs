//! End-to-end wizard flows through the `Store`
//!
//! Each test wires the reducer to in-memory storage and a scripted upload
//! gateway, then drives it the way the terminal front-end does.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use std::sync::Arc;
use std::time::Duration;
use ticket_wizard::prelude::*;
use wizard_runtime::{EffectHandle, Store};
use wizard_testing::test_clock;

const WAIT: Duration = Duration::from_secs(2);

// ============================================================================
// Test Fixtures
// ============================================================================

struct Wizard {
    store: Store<WizardState, WizardAction, WizardEnvironment, WizardReducer>,
    storage: Arc<InMemoryStorage>,
    uploader: MockUploadGateway,
}

impl Wizard {
    async fn start(storage: InMemoryStorage) -> Self {
        let storage = Arc::new(storage);
        let uploader = MockUploadGateway::new();
        let env = WizardEnvironment::new(
            Arc::clone(&storage) as Arc<dyn TicketStorage>,
            Arc::new(uploader.clone()),
            Arc::new(test_clock()),
        );
        let wizard = Self {
            store: Store::new(WizardState::default(), WizardReducer::new(), env),
            storage,
            uploader,
        };
        wizard.send(WizardAction::Start).await;
        wizard
    }

    async fn send(&self, action: WizardAction) -> EffectHandle {
        self.store.send(action).await.unwrap()
    }

    async fn edit(&self, field: TextField, value: &str) {
        self.send(WizardAction::EditField {
            field,
            value: value.to_string(),
        })
        .await;
    }

    async fn fill(&self, name: &str, email: &str, request: &str) {
        self.edit(TextField::Name, name).await;
        self.edit(TextField::Email, email).await;
        self.edit(TextField::SpecialRequest, request).await;
    }

    async fn upload(&self, file: ImageFile) -> EffectHandle {
        self.send(WizardAction::BeginUpload { file }).await
    }

    async fn state(&self) -> WizardState {
        self.store.state(Clone::clone).await
    }

    fn stored(&self) -> Option<ReservationRecord> {
        self.storage.get().unwrap()
    }
}

fn png(name: &str, size: usize) -> ImageFile {
    ImageFile::new(name, "image/png", vec![0x89_u8; size])
}

fn last_title(state: &WizardState) -> String {
    state.last_notification().map(|n| n.title.clone()).unwrap_or_default()
}

/// A paid-1 record with every attendee field filled in
fn complete_record() -> ReservationRecord {
    let mut record = ReservationRecord::from_offering(find_offering("paid-1").unwrap());
    record.attendee = Some(AttendeeDetails {
        name: "Grace Hopper".into(),
        email: "grace@navy.mil".into(),
        special_request: Some("Front row".into()),
        profile_image_url: Some("https://cdn.example/grace.png".into()),
    });
    record
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn free_ticket_flow_stores_and_shows_attendee_details() {
    let wizard = Wizard::start(InMemoryStorage::new()).await;

    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "free-1".into(),
        })
        .await;
    let selected = wizard.stored().unwrap();
    assert_eq!(selected.id, "free-1");
    assert_eq!(selected.price, 0);
    assert_eq!(selected.kind, TicketKind::Free);
    assert!(selected.attendee.is_none());

    wizard.send(WizardAction::Proceed).await;
    assert_eq!(wizard.state().await.step, WizardStep::Details);

    wizard.fill("Ada Lovelace", "ada@example.com", "Vegetarian meal").await;
    wizard.upload(png("ada.png", 1024)).await.wait_with_timeout(WAIT).await.unwrap();
    let state = wizard.state().await;
    assert_eq!(state.draft.image.url(), Some("https://uploads.invalid/ada.png"));
    assert_eq!(last_title(&state), "Profile picture uploaded");

    wizard.send(WizardAction::SubmitDetails).await;
    let stored = wizard.stored().unwrap();
    assert!(stored.is_complete());
    assert_eq!(
        stored.attendee,
        Some(AttendeeDetails {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            special_request: Some("Vegetarian meal".into()),
            profile_image_url: Some("https://uploads.invalid/ada.png".into()),
        })
    );

    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Confirmation);
    let view = state.ticket_view().unwrap();
    assert_eq!(view.ticket_name, "Basic Free Ticket");
    assert_eq!(view.price_label, "Free");
    assert_eq!(view.attendee_name, "Ada Lovelace");
    assert_eq!(view.attendee_email, "ada@example.com");
    assert_eq!(view.special_request, "Vegetarian meal");
    assert_eq!(view.profile_image_url.as_deref(), Some("https://uploads.invalid/ada.png"));
}

#[tokio::test]
async fn submit_with_empty_name_is_rejected_without_writing() {
    let wizard = Wizard::start(InMemoryStorage::new()).await;
    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "paid-2".into(),
        })
        .await;
    wizard.send(WizardAction::Proceed).await;
    wizard.fill("", "ada@example.com", "Aisle seat").await;
    wizard.upload(png("ada.png", 64)).await.wait_with_timeout(WAIT).await.unwrap();

    let writes_before = wizard.storage.write_count();
    let before = wizard.stored();
    wizard.send(WizardAction::SubmitDetails).await;

    assert_eq!(wizard.storage.write_count(), writes_before);
    assert_eq!(wizard.stored(), before);
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Details);
    assert!(state.draft.errors.name);
    assert!(!state.draft.errors.email);
    assert_eq!(last_title(&state), "Validation Failed");
}

#[tokio::test]
async fn oversized_upload_is_refused_before_any_request() {
    let wizard = Wizard::start(InMemoryStorage::new()).await;
    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "free-1".into(),
        })
        .await;
    wizard.send(WizardAction::Proceed).await;

    let handle = wizard.upload(png("huge.png", 6 * 1024 * 1024)).await;
    assert_eq!(handle.pending(), 0);
    assert!(wizard.uploader.uploaded_files().is_empty());

    let state = wizard.state().await;
    assert_eq!(state.draft.image, ImageSlot::Empty);
    assert!(state.draft.errors.file);
    let notice = state.last_notification().unwrap();
    assert_eq!(notice.title, "File too large");
    assert_eq!(notice.level, NotificationLevel::Error);
}

#[tokio::test]
async fn latest_upload_wins_when_earlier_one_resolves_last() {
    let wizard = Wizard::start(InMemoryStorage::new()).await;
    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "paid-1".into(),
        })
        .await;
    wizard.send(WizardAction::Proceed).await;
    wizard.fill("Ada Lovelace", "ada@example.com", "None").await;

    let first_reply = wizard.uploader.defer_reply();
    let second_reply = wizard.uploader.defer_reply();
    let mut first = wizard.upload(png("first.png", 16)).await;
    let mut second = wizard.upload(png("second.png", 16)).await;
    assert_eq!(wizard.uploader.uploaded_files(), ["first.png", "second.png"]);

    assert!(second_reply.resolve(Ok("https://cdn.example/second.png".into())));
    second.wait_with_timeout(WAIT).await.unwrap();
    assert!(first_reply.resolve(Ok("https://cdn.example/first.png".into())));
    first.wait_with_timeout(WAIT).await.unwrap();

    let state = wizard.state().await;
    assert_eq!(state.draft.image.url(), Some("https://cdn.example/second.png"));

    wizard.send(WizardAction::SubmitDetails).await;
    let attendee = wizard.stored().unwrap().attendee.unwrap();
    assert_eq!(
        attendee.profile_image_url.as_deref(),
        Some("https://cdn.example/second.png")
    );
}

#[tokio::test]
async fn superseded_upload_resolving_first_is_ignored() {
    let wizard = Wizard::start(InMemoryStorage::new()).await;
    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "paid-1".into(),
        })
        .await;
    wizard.send(WizardAction::Proceed).await;

    let first_reply = wizard.uploader.defer_reply();
    let second_reply = wizard.uploader.defer_reply();
    let mut first = wizard.upload(png("first.png", 16)).await;
    let mut second = wizard.upload(png("second.png", 16)).await;

    assert!(first_reply.resolve(Ok("https://cdn.example/first.png".into())));
    first.wait_with_timeout(WAIT).await.unwrap();
    assert!(wizard.state().await.draft.image.is_uploading());

    assert!(second_reply.resolve(Err(UploadError::UploadFailed("503".into()))));
    second.wait_with_timeout(WAIT).await.unwrap();

    let state = wizard.state().await;
    assert_eq!(state.draft.image, ImageSlot::Empty);
    assert!(state.draft.errors.file);
    assert_eq!(last_title(&state), "Upload failed");
}

#[tokio::test]
async fn leaving_details_mid_fill_discards_the_draft_only() {
    let wizard = Wizard::start(InMemoryStorage::new()).await;
    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "free-1".into(),
        })
        .await;
    wizard.send(WizardAction::Proceed).await;
    wizard.fill("Half", "half@", "").await;

    wizard.send(WizardAction::Navigate(WizardStep::Selecting)).await;
    assert_eq!(wizard.state().await.draft, AttendeeDraft::default());

    wizard.send(WizardAction::Navigate(WizardStep::Details)).await;
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Details);
    assert!(state.draft.is_empty());
    assert!(wizard.stored().unwrap().attendee.is_none());
}

#[tokio::test]
async fn leaving_details_keeps_a_completed_reservation() {
    let record = complete_record();
    let wizard = Wizard::start(InMemoryStorage::with_record(&record)).await;

    wizard.send(WizardAction::Navigate(WizardStep::Details)).await;
    wizard.edit(TextField::Name, "Someone Else").await;
    wizard.edit(TextField::Email, "").await;

    wizard.send(WizardAction::Back).await;
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Selecting);
    assert_eq!(state.draft, AttendeeDraft::default());
    assert_eq!(wizard.stored(), Some(record.clone()));
    assert_eq!(wizard.storage.write_count(), 0);

    // Returning shows the stored details, not the abandoned edits.
    wizard.send(WizardAction::Navigate(WizardStep::Details)).await;
    let draft = wizard.state().await.draft;
    assert_eq!(draft.name, "Grace Hopper");
    assert_eq!(draft.email, "grace@navy.mil");
    assert_eq!(draft.image.url(), Some("https://cdn.example/grace.png"));
}

// ============================================================================
// Navigation and failure handling
// ============================================================================

#[tokio::test]
async fn proceeding_with_a_complete_record_skips_details() {
    let wizard = Wizard::start(InMemoryStorage::with_record(&complete_record())).await;
    assert_eq!(wizard.state().await.selection.unwrap().id, "paid-1");

    wizard.send(WizardAction::Proceed).await;
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Confirmation);
    assert_eq!(state.ticket_view().unwrap().attendee_name, "Grace Hopper");
}

#[tokio::test]
async fn reselecting_forces_details_again() {
    let wizard = Wizard::start(InMemoryStorage::with_record(&complete_record())).await;

    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "paid-2".into(),
        })
        .await;
    assert!(wizard.stored().unwrap().attendee.is_none());

    wizard.send(WizardAction::Proceed).await;
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Details);
    assert!(state.draft.is_empty());
}

#[tokio::test]
async fn submit_waits_for_the_profile_picture() {
    let wizard = Wizard::start(InMemoryStorage::new()).await;
    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "free-1".into(),
        })
        .await;
    wizard.send(WizardAction::Proceed).await;
    wizard.fill("Ada Lovelace", "ada@example.com", "None").await;

    let reply = wizard.uploader.defer_reply();
    let mut upload = wizard.upload(png("ada.png", 16)).await;
    wizard.send(WizardAction::SubmitDetails).await;

    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Details);
    assert_eq!(last_title(&state), "Image Upload in Progress");
    assert!(wizard.stored().unwrap().attendee.is_none());

    assert!(reply.resolve(Ok("https://cdn.example/ada.png".into())));
    upload.wait_with_timeout(WAIT).await.unwrap();
    wizard.send(WizardAction::SubmitDetails).await;
    assert_eq!(wizard.state().await.step, WizardStep::Confirmation);
}

#[tokio::test]
async fn corrupt_storage_on_confirmation_redirects_to_selection() {
    let wizard = Wizard::start(InMemoryStorage::with_raw("{not json")).await;
    let state = wizard.state().await;
    assert!(state.selection.is_none());
    assert_eq!(last_title(&state), "Error retrieving ticket details");

    wizard.send(WizardAction::Navigate(WizardStep::Confirmation)).await;
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Selecting);
    assert!(state.ticket.is_none());
    assert_eq!(last_title(&state), "Error retrieving ticket details");
}

#[tokio::test]
async fn failed_selection_write_is_reported() {
    let storage = InMemoryStorage::new();
    storage.set_fail_writes(true);
    let wizard = Wizard::start(storage).await;

    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "free-1".into(),
        })
        .await;
    let state = wizard.state().await;
    assert!(state.selection.is_none());
    assert_eq!(last_title(&state), "Failed to select ticket");

    wizard.send(WizardAction::Proceed).await;
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Selecting);
    assert_eq!(last_title(&state), "Please select a ticket");
}

#[tokio::test]
async fn clearing_returns_to_an_empty_selection() {
    let wizard = Wizard::start(InMemoryStorage::with_record(&complete_record())).await;
    wizard.send(WizardAction::Proceed).await;
    assert_eq!(wizard.state().await.step, WizardStep::Confirmation);

    wizard.send(WizardAction::ClearReservation).await;
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Selecting);
    assert!(state.selection.is_none());
    assert!(state.ticket.is_none());
    assert_eq!(wizard.stored(), None);
}

#[tokio::test]
async fn shutdown_waits_for_pending_uploads() {
    let wizard = Wizard::start(InMemoryStorage::new()).await;
    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "free-1".into(),
        })
        .await;
    wizard.send(WizardAction::Proceed).await;

    let reply = wizard.uploader.defer_reply();
    let _upload = wizard.upload(png("ada.png", 16)).await;
    assert_eq!(wizard.store.pending_effects(), 1);
    assert!(wizard.store.shutdown(Duration::from_millis(50)).await.is_err());

    assert!(reply.resolve(Ok("https://cdn.example/ada.png".into())));
    wizard.store.shutdown(WAIT).await.unwrap();
}

#[tokio::test]
async fn route_change_without_a_ticket_stays_on_selection() {
    let wizard = Wizard::start(InMemoryStorage::new()).await;

    wizard.send(WizardAction::Navigate(WizardStep::Details)).await;
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Selecting);
    assert_eq!(last_title(&state), "Please select a ticket");

    wizard.edit(TextField::Name, "Ada").await;
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Selecting);
    assert!(state.draft.is_empty());
    assert_eq!(wizard.stored(), None);
}

#[tokio::test]
async fn empty_upload_reference_blocks_submit() {
    let wizard = Wizard::start(InMemoryStorage::new()).await;
    wizard
        .send(WizardAction::SelectOffering {
            offering_id: "free-1".into(),
        })
        .await;
    wizard.send(WizardAction::Proceed).await;
    wizard.fill("Ada Lovelace", "ada@example.com", "None").await;

    wizard.uploader.push_reply(Ok(String::new()));
    wizard.upload(png("ada.png", 16)).await.wait_with_timeout(WAIT).await.unwrap();
    let state = wizard.state().await;
    assert_eq!(state.draft.image, ImageSlot::Empty);
    assert!(state.draft.errors.file);
    assert_eq!(last_title(&state), "Upload failed");

    wizard.send(WizardAction::SubmitDetails).await;
    let state = wizard.state().await;
    assert_eq!(state.step, WizardStep::Details);
    assert_eq!(last_title(&state), "Validation Failed");
    assert!(wizard.stored().unwrap().attendee.is_none());
}

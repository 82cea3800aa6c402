//! Read-only projections for display.

use crate::catalog::CATALOG;
use crate::navigation::WizardStep;
use crate::reducer::WizardState;
use crate::types::{ImageSlot, ReservationRecord, TicketKind, TicketOffering};
use std::fmt::Write as _;

/// Shown for missing name or email
pub const NOT_PROVIDED: &str = "Not provided";

/// Shown for a missing special request
pub const NO_SPECIAL_REQUEST: &str = "Nil";

/// The confirmation ticket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketView {
    /// Offering name
    pub ticket_name: String,
    /// `Free` or the price with a currency sign
    pub price_label: String,
    /// Offering description
    pub description: String,
    /// Attendee name or [`NOT_PROVIDED`]
    pub attendee_name: String,
    /// Attendee email or [`NOT_PROVIDED`]
    pub attendee_email: String,
    /// Special request or [`NO_SPECIAL_REQUEST`]
    pub special_request: String,
    /// Profile picture, if uploaded
    pub profile_image_url: Option<String>,
}

fn or_fallback(value: Option<&str>, fallback: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// `Free` for free offerings, `$<price>` otherwise
#[must_use]
pub fn price_label(kind: TicketKind, price: u32) -> String {
    match kind {
        TicketKind::Free => "Free".to_string(),
        TicketKind::Paid => format!("${price}"),
    }
}

impl TicketView {
    /// Builds the view from a stored record
    #[must_use]
    pub fn from_record(record: &ReservationRecord) -> Self {
        let attendee = record.attendee.as_ref();
        Self {
            ticket_name: record.name.clone(),
            price_label: price_label(record.kind, record.price),
            description: record.description.clone(),
            attendee_name: or_fallback(attendee.map(|a| a.name.as_str()), NOT_PROVIDED),
            attendee_email: or_fallback(attendee.map(|a| a.email.as_str()), NOT_PROVIDED),
            special_request: or_fallback(
                attendee.and_then(|a| a.special_request.as_deref()),
                NO_SPECIAL_REQUEST,
            ),
            profile_image_url: attendee
                .and_then(|a| a.profile_image_url.clone())
                .filter(|url| !url.trim().is_empty()),
        }
    }
}

/// One line per offering
#[must_use]
pub fn render_catalog() -> String {
    let mut out = String::new();
    for TicketOffering {
        id,
        name,
        price,
        description,
        kind,
    } in CATALOG
    {
        let _ = writeln!(out, "  {id:<8} {name:<20} {:<6} {description}", price_label(*kind, *price));
    }
    out
}

/// Multi-line ticket card
#[must_use]
pub fn render_ticket(view: &TicketView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "  Ticket:          {} ({})", view.ticket_name, view.price_label);
    let _ = writeln!(out, "  Includes:        {}", view.description);
    let _ = writeln!(out, "  Name:            {}", view.attendee_name);
    let _ = writeln!(out, "  Email:           {}", view.attendee_email);
    let _ = writeln!(out, "  Special request: {}", view.special_request);
    let _ = writeln!(
        out,
        "  Photo:           {}",
        view.profile_image_url.as_deref().unwrap_or(NOT_PROVIDED)
    );
    out
}

/// Summary of the current step
#[must_use]
pub fn render_state(state: &WizardState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Step: {}", state.step);
    match state.step {
        WizardStep::Selecting => match &state.selection {
            Some(record) => {
                let _ = writeln!(out, "  Selected: {} [{}]", record.name, record.id);
            },
            None => {
                let _ = writeln!(out, "  Selected: none");
            },
        },
        WizardStep::Details => {
            let draft = &state.draft;
            let flag = |invalid: bool| if invalid { "  (invalid)" } else { "" };
            let _ = writeln!(out, "  Name:            {}{}", draft.name, flag(draft.errors.name));
            let _ = writeln!(out, "  Email:           {}{}", draft.email, flag(draft.errors.email));
            let _ = writeln!(
                out,
                "  Special request: {}{}",
                draft.special_request,
                flag(draft.errors.special_request)
            );
            let photo = match &draft.image {
                ImageSlot::Empty => "none".to_string(),
                ImageSlot::Uploading { file_name, .. } => format!("uploading {file_name}..."),
                ImageSlot::Uploaded { url } => url.clone(),
            };
            let _ = writeln!(out, "  Photo:           {photo}{}", flag(draft.errors.file));
        },
        WizardStep::Confirmation => {
            if let Some(view) = state.ticket_view() {
                out.push_str(&render_ticket(&view));
            }
        },
    }
    out
}

//! Attendee form validation.
//!
//! Pure functions, re-run on every field edit and again on submit.

use crate::types::{AttendeeDraft, Field, FieldErrors, ImageSlot, TextField};
use regex::Regex;
use std::sync::LazyLock;

/// Accepted email shape, matched against the lower-cased input
pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

static EMAIL_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Name must contain something besides whitespace
#[must_use]
pub fn validate_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// Email must look like `local@domain.tld`
#[must_use]
pub fn validate_email(email: &str) -> bool {
    EMAIL_REGEX
        .as_ref()
        .is_some_and(|re| re.is_match(&email.to_lowercase()))
}

/// The special request is required
#[must_use]
pub fn validate_special_request(request: &str) -> bool {
    !request.trim().is_empty()
}

/// A file must be selected or already uploaded
#[must_use]
pub const fn validate_file(image: &ImageSlot) -> bool {
    image.is_present()
}

/// Validates a single text field
#[must_use]
pub fn validate_text(field: TextField, value: &str) -> bool {
    match field {
        TextField::Name => validate_name(value),
        TextField::Email => validate_email(value),
        TextField::SpecialRequest => validate_special_request(value),
    }
}

/// Runs every check against a draft
#[must_use]
pub fn validate_draft(draft: &AttendeeDraft) -> FieldErrors {
    let mut errors = FieldErrors::default();
    errors.set(Field::Name, !validate_name(&draft.name));
    errors.set(Field::Email, !validate_email(&draft.email));
    errors.set(Field::SpecialRequest, !validate_special_request(&draft.special_request));
    errors.set(Field::File, !validate_file(&draft.image));
    errors
}

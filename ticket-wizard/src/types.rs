//! Domain types for the ticket wizard.
//!
//! Two families live here and are kept deliberately apart:
//!
//! - **Persisted**: [`ReservationRecord`] and [`AttendeeDetails`], serialized
//!   into the single storage slot.
//! - **Transient**: [`AttendeeDraft`], [`ImageSlot`] and [`FieldErrors`], which
//!   exist only while the details step is active.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an offering costs money
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketKind {
    /// Price is zero
    Free,
    /// Price is above zero
    Paid,
}

impl TicketKind {
    /// Derives the kind from a price
    #[must_use]
    pub const fn from_price(price: u32) -> Self {
        if price == 0 { Self::Free } else { Self::Paid }
    }
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// A ticket type that can be offered for selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketOffering {
    /// Unique identifier
    pub id: &'static str,
    /// Display label (not unique)
    pub name: &'static str,
    /// Price in whole currency units, `0` for free tickets
    pub price: u32,
    /// Display description
    pub description: &'static str,
    /// Always consistent with `price`
    pub kind: TicketKind,
}

impl TicketOffering {
    /// Creates an offering, deriving its kind from the price
    #[must_use]
    pub const fn new(
        id: &'static str,
        name: &'static str,
        price: u32,
        description: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            price,
            description,
            kind: TicketKind::from_price(price),
        }
    }
}

/// Attendee details merged into a record on submit
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeDetails {
    /// Attendee name
    #[serde(default)]
    pub name: String,
    /// Attendee email
    #[serde(default)]
    pub email: String,
    /// Free-form request shown on the ticket
    #[serde(default)]
    pub special_request: Option<String>,
    /// URL of the uploaded profile picture
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

impl AttendeeDetails {
    /// True when name, email and profile image URL are all non-empty
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.email.trim().is_empty()
            && self
                .profile_image_url
                .as_deref()
                .is_some_and(|url| !url.trim().is_empty())
    }
}

/// The single persisted reservation
///
/// Offering fields are copied at selection time so later catalog changes never
/// alter an existing reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRecord {
    /// Offering id
    pub id: String,
    /// Offering name
    pub name: String,
    /// Offering price
    pub price: u32,
    /// Offering description
    pub description: String,
    /// Free or paid
    #[serde(rename = "type")]
    pub kind: TicketKind,
    /// Absent until the details step is submitted
    #[serde(
        rename = "attendeeDetails",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub attendee: Option<AttendeeDetails>,
}

impl ReservationRecord {
    /// Builds a fresh record for an offering, with no attendee
    #[must_use]
    pub fn from_offering(offering: &TicketOffering) -> Self {
        Self {
            id: offering.id.to_string(),
            name: offering.name.to_string(),
            price: offering.price,
            description: offering.description.to_string(),
            kind: offering.kind,
            attendee: None,
        }
    }

    /// Whether the attendee step can be skipped for this record
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.attendee.as_ref().is_some_and(AttendeeDetails::is_complete)
    }
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    /// Something worked
    Success,
    /// Progress or neutral information
    Info,
    /// The action was refused but nothing is wrong
    Warning,
    /// The action failed
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// A transient user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Headline
    pub title: String,
    /// Optional detail line
    pub description: Option<String>,
    /// When it was raised
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification without a description
    #[must_use]
    pub fn new(level: NotificationLevel, title: impl Into<String>, raised_at: DateTime<Utc>) -> Self {
        Self {
            level,
            title: title.into(),
            description: None,
            raised_at,
        }
    }

    /// Adds a description line
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.title)?;
        if let Some(description) = &self.description {
            write!(f, ": {description}")?;
        }
        Ok(())
    }
}

/// Identifies one upload request
///
/// Tokens are issued in increasing order. Only the completion carrying the
/// token currently held in the draft is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UploadToken(u64);

impl UploadToken {
    /// Wraps a raw token value
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The token issued after this one
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Raw value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UploadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Profile picture state of the draft
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageSlot {
    /// Nothing selected
    #[default]
    Empty,
    /// An upload is in flight
    Uploading {
        /// Token of the in-flight request
        token: UploadToken,
        /// Name of the selected file
        file_name: String,
    },
    /// Upload finished
    Uploaded {
        /// Reference returned by the upload service
        url: String,
    },
}

impl ImageSlot {
    /// The uploaded image URL, if any
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Uploaded { url } => Some(url),
            Self::Empty | Self::Uploading { .. } => None,
        }
    }

    /// True while an upload is in flight
    #[must_use]
    pub const fn is_uploading(&self) -> bool {
        matches!(self, Self::Uploading { .. })
    }

    /// True when a file is selected or an image reference exists
    #[must_use]
    pub const fn is_present(&self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// Fields of the attendee form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Attendee name
    Name,
    /// Attendee email
    Email,
    /// Special request
    SpecialRequest,
    /// Profile picture
    File,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::SpecialRequest => "special request",
            Self::File => "profile picture",
        };
        f.write_str(label)
    }
}

/// Form fields edited as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    /// Attendee name
    Name,
    /// Attendee email
    Email,
    /// Special request
    SpecialRequest,
}

impl From<TextField> for Field {
    fn from(field: TextField) -> Self {
        match field {
            TextField::Name => Self::Name,
            TextField::Email => Self::Email,
            TextField::SpecialRequest => Self::SpecialRequest,
        }
    }
}

/// Per-field error flags, `true` meaning invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldErrors {
    /// Name is invalid
    pub name: bool,
    /// Email is invalid
    pub email: bool,
    /// Special request is invalid
    pub special_request: bool,
    /// Profile picture is missing
    pub file: bool,
}

impl FieldErrors {
    /// Reads the flag for a field
    #[must_use]
    pub const fn get(&self, field: Field) -> bool {
        match field {
            Field::Name => self.name,
            Field::Email => self.email,
            Field::SpecialRequest => self.special_request,
            Field::File => self.file,
        }
    }

    /// Sets the flag for a field
    pub const fn set(&mut self, field: Field, invalid: bool) {
        match field {
            Field::Name => self.name = invalid,
            Field::Email => self.email = invalid,
            Field::SpecialRequest => self.special_request = invalid,
            Field::File => self.file = invalid,
        }
    }

    /// True if any flag is set
    #[must_use]
    pub const fn any(&self) -> bool {
        self.name || self.email || self.special_request || self.file
    }

    /// Flagged fields in form order
    #[must_use]
    pub fn failing(&self) -> Vec<Field> {
        [Field::Name, Field::Email, Field::SpecialRequest, Field::File]
            .into_iter()
            .filter(|field| self.get(*field))
            .collect()
    }
}

/// Transient attendee form state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttendeeDraft {
    /// Name input
    pub name: String,
    /// Email input
    pub email: String,
    /// Special request input
    pub special_request: String,
    /// Profile picture state
    pub image: ImageSlot,
    /// Validation flags
    pub errors: FieldErrors,
}

impl AttendeeDraft {
    /// Pre-fills a draft from previously submitted details
    #[must_use]
    pub fn from_attendee(attendee: &AttendeeDetails) -> Self {
        let image = match attendee.profile_image_url.as_deref() {
            Some(url) if !url.trim().is_empty() => ImageSlot::Uploaded {
                url: url.to_string(),
            },
            _ => ImageSlot::Empty,
        };
        Self {
            name: attendee.name.clone(),
            email: attendee.email.clone(),
            special_request: attendee.special_request.clone().unwrap_or_default(),
            image,
            errors: FieldErrors::default(),
        }
    }

    /// Current text of a field
    #[must_use]
    pub fn text(&self, field: TextField) -> &str {
        match field {
            TextField::Name => &self.name,
            TextField::Email => &self.email,
            TextField::SpecialRequest => &self.special_request,
        }
    }

    /// Replaces the text of a field
    pub fn set_text(&mut self, field: TextField, value: String) {
        match field {
            TextField::Name => self.name = value,
            TextField::Email => self.email = value,
            TextField::SpecialRequest => self.special_request = value,
        }
    }

    /// True when the draft holds nothing the user entered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

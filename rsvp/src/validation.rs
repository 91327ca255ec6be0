//! Input validation for registrations and event creation.
//!
//! Every function trims its input first and returns the normalized value, so
//! callers never store untrimmed names or mixed-case emails.

use crate::error::{RegistrationError, Result};
use crate::types::{Capacity, NewEvent, Registrant};
use chrono::{DateTime, Utc};

/// Shortest accepted attendee name, in characters.
pub const NAME_MIN_CHARS: usize = 2;
/// Longest accepted attendee name, in characters.
pub const NAME_MAX_CHARS: usize = 100;
/// Longest accepted event name or location, in characters.
pub const EVENT_TEXT_MAX_CHARS: usize = 200;

const EMAIL_MIN_LEN: usize = 3;
const EMAIL_MAX_LEN: usize = 254;

/// Validate and trim an attendee name.
///
/// # Errors
///
/// Returns [`RegistrationError::InvalidInput`] for `name` when the trimmed value
/// is empty, outside 2..=100 characters, or contains anything other than ASCII
/// letters, whitespace, hyphens and apostrophes.
pub fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();

    if name.is_empty() {
        return Err(RegistrationError::invalid(
            "name",
            "Name cannot be empty or contain only whitespace.",
        ));
    }

    let chars = name.chars().count();
    if chars < NAME_MIN_CHARS {
        return Err(RegistrationError::invalid(
            "name",
            format!("Ensure this field has at least {NAME_MIN_CHARS} characters."),
        ));
    }
    if chars > NAME_MAX_CHARS {
        return Err(RegistrationError::invalid(
            "name",
            format!("Ensure this field has no more than {NAME_MAX_CHARS} characters."),
        ));
    }

    let allowed = |c: char| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-' || c == '\'';
    if !name.chars().all(allowed) {
        return Err(RegistrationError::invalid(
            "name",
            "Name can only contain letters, spaces, hyphens, and apostrophes.",
        ));
    }

    Ok(name.to_string())
}

/// Validate, trim and lowercase an email address.
///
/// # Errors
///
/// Returns [`RegistrationError::InvalidInput`] for `email` when the value is
/// blank or not a plausible address.
pub fn validate_email(raw: &str) -> Result<String> {
    let email = raw.trim();

    if email.is_empty() {
        return Err(RegistrationError::invalid("email", "Email cannot be empty"));
    }

    if !is_valid_email(email) {
        return Err(RegistrationError::invalid(
            "email",
            "Enter a valid email address.",
        ));
    }

    Ok(email.to_lowercase())
}

/// Address check: one `@`, a dot-atom local part (RFC 5322 `atext` between
/// single dots) and a dotted domain of letters, digits and hyphens with no
/// empty labels.
fn is_valid_email(email: &str) -> bool {
    if email.len() < EMAIL_MIN_LEN || email.len() > EMAIL_MAX_LEN {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return false;
    }

    let atext = |c: char| {
        c.is_alphanumeric()
            || matches!(
                c,
                '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '/' | '=' | '?' | '^' | '_' | '`'
                    | '{' | '|' | '}' | '~' | '-'
            )
    };
    let valid_domain = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    local
        .split('.')
        .all(|atom| !atom.is_empty() && atom.chars().all(atext))
        && domain.chars().all(valid_domain)
}

/// Validate both registration fields.
///
/// # Errors
///
/// Returns the first failing field, name before email.
pub fn validate_registrant(name: &str, email: &str) -> Result<Registrant> {
    Ok(Registrant {
        name: validate_name(name)?,
        email: validate_email(email)?,
    })
}

/// Unvalidated event creation input, times already resolved to UTC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDraft {
    /// Raw name
    pub name: String,
    /// Raw location
    pub location: String,
    /// Start instant
    pub start_time: DateTime<Utc>,
    /// End instant
    pub end_time: DateTime<Utc>,
    /// Requested capacity as sent by the caller
    pub max_capacity: i64,
}

/// Validate an event draft into a [`NewEvent`].
///
/// # Errors
///
/// Returns [`RegistrationError::InvalidInput`] when the name or location is
/// blank or longer than 200 characters, the capacity is outside
/// `1..=i32::MAX`, or the end time is not after the start time.
pub fn validate_new_event(draft: EventDraft) -> Result<NewEvent> {
    let name = validate_event_text("name", &draft.name)?;
    let location = validate_event_text("location", &draft.location)?;

    if draft.max_capacity < 1 {
        return Err(RegistrationError::invalid(
            "max_capacity",
            "Ensure this value is greater than or equal to 1.",
        ));
    }
    let max_capacity = u32::try_from(draft.max_capacity)
        .ok()
        .and_then(Capacity::new)
        .ok_or_else(|| {
            RegistrationError::invalid(
                "max_capacity",
                format!("Ensure this value is less than or equal to {}.", Capacity::MAX),
            )
        })?;

    if draft.end_time <= draft.start_time {
        return Err(RegistrationError::invalid(
            "end_time",
            "End time must be after start time.",
        ));
    }

    Ok(NewEvent {
        name,
        location,
        start_time: draft.start_time,
        end_time: draft.end_time,
        max_capacity,
    })
}

fn validate_event_text(field: &'static str, raw: &str) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(RegistrationError::invalid(field, "This field may not be blank."));
    }
    if value.chars().count() > EVENT_TEXT_MAX_CHARS {
        return Err(RegistrationError::invalid(
            field,
            format!("Ensure this field has no more than {EVENT_TEXT_MAX_CHARS} characters."),
        ));
    }
    Ok(value.to_string())
}

//! Core submission types for formrelay.
//!
//! This module defines the data structures for representing a contact-form
//! submission and its delivery outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker stored for a channel whose send did not succeed.
pub const FAILED_MARKER: &str = "failed";

/// Reference prefix for submissions that went through the full pipeline.
pub const REFERENCE_PREFIX: &str = "NL";

/// Reference prefix for raw saves that bypassed the mail pipeline.
pub const BACKUP_PREFIX: &str = "BACKUP-";

/// Overall delivery status of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The submission went through the mail pipeline.
    Sent,
    /// Processing failed; the record was kept for later follow-up.
    Failed,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sent => write!(f, "sent"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Per-channel send outcomes.
///
/// Each field holds the SMTP message id reported by the transport, or
/// [`FAILED_MARKER`] when that send did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailOutcomes {
    /// Outcome of the support notification.
    pub support: String,
    /// Outcome of the auto-reply to the submitter.
    pub auto_reply: String,
}

impl EmailOutcomes {
    /// Build outcomes from the optional message ids of both sends.
    #[must_use]
    pub fn new(support: Option<String>, auto_reply: Option<String>) -> Self {
        Self {
            support: support.unwrap_or_else(|| FAILED_MARKER.to_string()),
            auto_reply: auto_reply.unwrap_or_else(|| FAILED_MARKER.to_string()),
        }
    }

    /// Whether the support notification was delivered.
    #[must_use]
    pub fn support_sent(&self) -> bool {
        self.support != FAILED_MARKER
    }

    /// Whether the auto-reply was delivered.
    #[must_use]
    pub fn auto_reply_sent(&self) -> bool {
        self.auto_reply != FAILED_MARKER
    }
}

/// Generate a reference id from the current time.
///
/// The id is the given prefix plus the last eight decimal digits of the
/// Unix timestamp in milliseconds, zero-padded.
#[must_use]
pub fn generate_reference(prefix: &str) -> String {
    reference_from_millis(prefix, Utc::now().timestamp_millis())
}

/// Generate a reference id from an explicit millisecond timestamp.
#[must_use]
pub fn reference_from_millis(prefix: &str, millis: i64) -> String {
    let digits = millis.rem_euclid(100_000_000);
    format!("{prefix}{digits:08}")
}

/// A validated contact-form payload.
///
/// Produced by the submission handler once the presence checks pass; the
/// mail templates and the result record are both built from this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionForm {
    /// Submitter's name.
    pub name: String,
    /// Submitter's email address.
    pub email: String,
    /// Submitter's phone number.
    pub phone: Option<String>,
    /// The service the submitter asked about.
    pub service: String,
    /// The free-text message.
    pub message: String,
}

impl SubmissionForm {
    /// The phone number to display, `"Not provided"` when absent.
    #[must_use]
    pub fn phone_display(&self) -> &str {
        self.phone.as_deref().unwrap_or("Not provided")
    }
}

/// One contact-form submission with its delivery outcome.
///
/// Records are appended once to the submission log and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    /// Reference id, e.g. `NL12345678`.
    pub id: String,

    /// When this record was created.
    pub timestamp: DateTime<Utc>,

    /// Submitter's name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Submitter's email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Submitter's phone number, `"Not provided"` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// The service the submitter asked about.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    /// The free-text message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Overall delivery status.
    pub status: DeliveryStatus,

    /// Per-channel send outcomes, absent for raw saves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<EmailOutcomes>,

    /// Error description when `status` is `failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Caller-supplied fields from raw saves.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SubmissionRecord {
    /// Create a record for a submission that went through the mail pipeline.
    #[must_use]
    pub fn sent(id: String, form: &SubmissionForm, emails: EmailOutcomes) -> Self {
        Self {
            id,
            timestamp: Utc::now(),
            name: Some(form.name.clone()),
            email: Some(form.email.clone()),
            phone: Some(form.phone_display().to_string()),
            service: Some(form.service.clone()),
            message: Some(form.message.clone()),
            status: DeliveryStatus::Sent,
            emails: Some(emails),
            error: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Field names owned by the record itself. Caller-supplied keys under
    /// these names would serialize as duplicate JSON keys and make the log
    /// unreadable on the next parse.
    const RESERVED_FIELDS: [&'static str; 10] = [
        "id",
        "timestamp",
        "name",
        "email",
        "phone",
        "service",
        "message",
        "status",
        "emails",
        "error",
    ];

    /// Create a raw-save record wrapping arbitrary caller-supplied fields.
    ///
    /// Keys that collide with the record's own fields are dropped so every
    /// key serializes exactly once and the record round-trips.
    #[must_use]
    pub fn backup(mut extra: serde_json::Map<String, serde_json::Value>) -> Self {
        for key in Self::RESERVED_FIELDS {
            extra.remove(key);
        }
        Self {
            id: generate_reference(BACKUP_PREFIX),
            timestamp: Utc::now(),
            name: None,
            email: None,
            phone: None,
            service: None,
            message: None,
            status: DeliveryStatus::Sent,
            emails: None,
            error: None,
            extra,
        }
    }
}

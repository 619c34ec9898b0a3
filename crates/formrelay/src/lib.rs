//! `formrelay` - Contact-form intake service
//!
//! This library provides the core functionality for accepting contact-form
//! submissions over HTTP, relaying them over SMTP, and recording them in a
//! local JSON log.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod server;
pub mod storage;
pub mod submission;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use mailer::{Mailer, OutboundEmail, SmtpMailer};
pub use storage::SubmissionLog;
pub use submission::{DeliveryStatus, SubmissionForm, SubmissionRecord};

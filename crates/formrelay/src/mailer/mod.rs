//! Outbound mail for formrelay.
//!
//! This module provides the [`Mailer`] trait, its SMTP implementation over
//! lettre, and the message templates for the three kinds of email the
//! service sends (support notification, auto-reply, test email).

mod smtp;
pub mod templates;

pub use smtp::SmtpMailer;

use async_trait::async_trait;

use crate::error::Result;

/// A fully composed outbound email, ready to hand to a [`Mailer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    /// Recipient address.
    pub to: String,
    /// Reply-To address, if different from the sender.
    pub reply_to: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

impl OutboundEmail {
    /// Create an email with plain-text and HTML bodies.
    #[must_use]
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        text: impl Into<String>,
        html: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            reply_to: None,
            subject: subject.into(),
            text: text.into(),
            html: html.into(),
        }
    }

    /// Set the Reply-To address.
    #[must_use]
    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

/// Outbound mail client.
///
/// The server holds one of these behind an `Arc` and injects it into every
/// handler; tests substitute a mock.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one email.
    ///
    /// Returns the message id (or queue detail) reported by the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be built or the transport
    /// rejects it.
    async fn send(&self, email: &OutboundEmail) -> Result<String>;

    /// Check that the mail transport is reachable and accepts our
    /// credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection attempt itself fails.
    async fn verify(&self) -> Result<bool>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording mock mailer for handler tests.

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{Mailer, OutboundEmail};
    use crate::error::{Error, Result};

    /// A mailer that records every send and can be switched into a failure
    /// mode.
    #[derive(Debug, Default)]
    pub struct MockMailer {
        sent: Mutex<Vec<OutboundEmail>>,
        fail_sends: AtomicBool,
    }

    impl MockMailer {
        /// Make every subsequent `send` fail.
        pub fn fail_sends(&self) {
            self.fail_sends.store(true, Ordering::SeqCst);
        }

        /// Get a copy of every email sent so far.
        pub fn sent(&self) -> Vec<OutboundEmail> {
            self.sent.lock().expect("mock mailer lock poisoned").clone()
        }
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<String> {
            if self.fail_sends.load(Ordering::SeqCst) {
                return Err(Error::delivery("mock transport failure"));
            }
            let mut sent = self.sent.lock().expect("mock mailer lock poisoned");
            sent.push(email.clone());
            Ok(format!("mock-{}", sent.len()))
        }

        async fn verify(&self) -> Result<bool> {
            Ok(!self.fail_sends.load(Ordering::SeqCst))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockMailer;
    use super::*;

    #[test]
    fn test_outbound_email_builder() {
        let email = OutboundEmail::new("to@example.com", "Hi", "plain", "<p>html</p>")
            .with_reply_to("visitor@example.com");

        assert_eq!(email.to, "to@example.com");
        assert_eq!(email.reply_to.as_deref(), Some("visitor@example.com"));
        assert_eq!(email.subject, "Hi");
    }

    #[tokio::test]
    async fn test_mock_mailer_records_sends() {
        let mailer = MockMailer::default();
        let email = OutboundEmail::new("to@example.com", "Hi", "plain", "<p>html</p>");

        let id = mailer.send(&email).await.unwrap();
        assert_eq!(id, "mock-1");
        assert_eq!(mailer.sent().len(), 1);
        assert!(mailer.verify().await.unwrap());
    }

    #[tokio::test]
    async fn test_mock_mailer_failure_mode() {
        let mailer = MockMailer::default();
        mailer.fail_sends();

        let email = OutboundEmail::new("to@example.com", "Hi", "plain", "<p>html</p>");
        let result = mailer.send(&email).await;
        assert!(result.is_err());
        assert!(mailer.sent().is_empty());
    }
}

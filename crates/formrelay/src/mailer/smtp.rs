//! SMTP mailer over lettre's async transport.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::{Mailer, OutboundEmail};
use crate::config::Config;
use crate::error::Result;

/// SMTP-backed [`Mailer`] built from configuration.
///
/// The transport is constructed once at startup and injected wherever mail
/// is sent; there is no global transport state.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Build an SMTP mailer from the application configuration.
    ///
    /// Honors host, port, credentials, the implicit-TLS vs STARTTLS choice,
    /// the invalid-certificate escape hatch, and the connect timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS parameters cannot be built or the
    /// configured from address does not parse.
    pub fn from_config(config: &Config) -> Result<Self> {
        let from: Mailbox = config.from_mailbox().parse()?;

        let tls_parameters = TlsParameters::builder(config.smtp.host.clone())
            .dangerous_accept_invalid_certs(config.smtp.accept_invalid_certs)
            .build()?;
        let tls = if config.smtp.implicit_tls {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Required(tls_parameters)
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp.host)
                .port(config.smtp.port)
                .tls(tls)
                .timeout(Some(config.smtp_timeout()));

        if let (Some(username), Some(password)) = (&config.smtp.username, &config.smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    /// Compose a lettre message from an [`OutboundEmail`].
    fn compose(&self, email: &OutboundEmail) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(email.to.parse::<Mailbox>()?)
            .subject(&email.subject);

        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(reply_to.parse::<Mailbox>()?);
        }

        let message = builder.multipart(MultiPart::alternative_plain_html(
            email.text.clone(),
            email.html.clone(),
        ))?;
        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<String> {
        let message = self.compose(email)?;
        let response = self.transport.send(message).await?;

        let detail = response.message().collect::<Vec<&str>>().join(" ");
        let id = if detail.is_empty() {
            response.code().to_string()
        } else {
            detail
        };
        debug!("SMTP accepted message for {}: {}", email.to, id);
        Ok(id)
    }

    async fn verify(&self) -> Result<bool> {
        Ok(self.transport.test_connection().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        let mut config = Config::default();
        config.smtp.host = "smtp.example.com".to_string();
        config.mail.from_name = "Acme Intake".to_string();
        config.mail.from_address = "relay@example.com".to_string();
        config
    }

    #[tokio::test]
    async fn test_from_config_builds() {
        let mailer = SmtpMailer::from_config(&config()).unwrap();
        assert_eq!(mailer.from.email.to_string(), "relay@example.com");
    }

    #[tokio::test]
    async fn test_from_config_with_credentials() {
        let mut cfg = config();
        cfg.smtp.username = Some("relay".to_string());
        cfg.smtp.password = Some("hunter2".to_string());
        assert!(SmtpMailer::from_config(&cfg).is_ok());
    }

    #[tokio::test]
    async fn test_from_config_implicit_tls() {
        let mut cfg = config();
        cfg.smtp.implicit_tls = true;
        cfg.smtp.port = 465;
        assert!(SmtpMailer::from_config(&cfg).is_ok());
    }

    #[test]
    fn test_from_config_rejects_bad_from_address() {
        let mut cfg = config();
        cfg.mail.from_address = "not an address".to_string();
        assert!(SmtpMailer::from_config(&cfg).is_err());
    }

    #[tokio::test]
    async fn test_compose_sets_reply_to() {
        let mailer = SmtpMailer::from_config(&config()).unwrap();
        let email = OutboundEmail::new("dest@example.com", "Subject", "text", "<p>html</p>")
            .with_reply_to("visitor@example.com");

        let message = mailer.compose(&email).unwrap();
        let headers = String::from_utf8(message.formatted()).unwrap();
        assert!(headers.contains("Reply-To"));
        assert!(headers.contains("visitor@example.com"));
    }

    #[tokio::test]
    async fn test_compose_rejects_bad_recipient() {
        let mailer = SmtpMailer::from_config(&config()).unwrap();
        let email = OutboundEmail::new("not an address", "Subject", "text", "<p>html</p>");
        assert!(mailer.compose(&email).is_err());
    }
}

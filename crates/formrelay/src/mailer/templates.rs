//! Message templates for the emails the service sends.
//!
//! Each template composes an [`OutboundEmail`] with matching plain-text and
//! HTML bodies. User-supplied values are HTML-escaped before interpolation.

use chrono::{DateTime, Utc};

use super::OutboundEmail;
use crate::submission::SubmissionForm;

/// Escape a string for safe interpolation into HTML.
#[must_use]
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a multi-line message and turn newlines into `<br>`.
fn escape_multiline(input: &str) -> String {
    escape_html(input).replace('\n', "<br>")
}

/// Notification sent to the support inbox for a new submission.
///
/// Reply-To is set to the submitter so support can answer directly.
#[must_use]
pub fn support_notification(
    form: &SubmissionForm,
    reference: &str,
    timestamp: DateTime<Utc>,
    support_address: &str,
    site_name: &str,
) -> OutboundEmail {
    let subject = format!("New Contact: {} - {}", form.name, form.service);

    let text = format!(
        "New contact form submission\n\n\
         Name: {name}\n\
         Email: {email}\n\
         Phone: {phone}\n\
         Service: {service}\n\
         Reference: {reference}\n\n\
         Message:\n{message}\n\n\
         Submitted: {submitted}\n",
        name = form.name,
        email = form.email,
        phone = form.phone_display(),
        service = form.service,
        message = form.message,
        submitted = timestamp.to_rfc3339(),
    );

    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 700px; margin: 0 auto;\">\
           <h1>New Contact Form Submission</h1>\
           <p>{site}</p>\
           <h2>Client Information</h2>\
           <p><strong>Name:</strong> {name}</p>\
           <p><strong>Email:</strong> {email}</p>\
           <p><strong>Phone:</strong> {phone}</p>\
           <p><strong>Service:</strong> {service}</p>\
           <p><strong>Reference:</strong> {reference}</p>\
           <h3>Message</h3>\
           <p>{message}</p>\
           <p><em>Submitted: {submitted}</em></p>\
         </div>",
        site = escape_html(site_name),
        name = escape_html(&form.name),
        email = escape_html(&form.email),
        phone = escape_html(form.phone_display()),
        service = escape_html(&form.service),
        reference = escape_html(reference),
        message = escape_multiline(&form.message),
        submitted = timestamp.to_rfc3339(),
    );

    OutboundEmail::new(support_address, subject, text, html).with_reply_to(form.email.clone())
}

/// Auto-reply sent back to the submitter.
#[must_use]
pub fn auto_reply(form: &SubmissionForm, reference: &str, site_name: &str) -> OutboundEmail {
    let subject = format!("We've received your inquiry - {site_name}");
    let contact_via = form.phone.as_deref().unwrap_or("your email");

    let text = format!(
        "Dear {name},\n\n\
         Thank you for contacting {site} regarding our {service} service.\n\n\
         What happens next?\n\
         - Our team will review your requirements\n\
         - You'll receive a detailed proposal within 24-48 hours\n\
         - We'll contact you at {contact_via}\n\n\
         Reference: {reference}\n",
        name = form.name,
        site = site_name,
        service = form.service,
    );

    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
           <h1>Thank You, {name}!</h1>\
           <p>Your inquiry has been received</p>\
           <p>Dear {name},</p>\
           <p>Thank you for contacting {site} regarding our {service} service.</p>\
           <h3>What Happens Next?</h3>\
           <p>&bull; Our team will review your requirements</p>\
           <p>&bull; You'll receive a detailed proposal within <strong>24-48 hours</strong></p>\
           <p>&bull; We'll contact you at {contact_via}</p>\
           <p><strong>Reference:</strong> {reference}</p>\
         </div>",
        name = escape_html(&form.name),
        site = escape_html(site_name),
        service = escape_html(&form.service),
        contact_via = escape_html(contact_via),
        reference = escape_html(reference),
    );

    OutboundEmail::new(form.email.clone(), subject, text, html)
}

/// Test email sent to the support address by the `/test` endpoint.
#[must_use]
pub fn test_email(to: &str, site_name: &str, now: DateTime<Utc>) -> OutboundEmail {
    let subject = format!("{site_name} - Server Test");

    let text = format!(
        "Test email from the {site_name} server\n\nTime: {}\n",
        now.to_rfc3339()
    );

    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
           <h1>Test Email Successful</h1>\
           <p>{site} email server</p>\
           <p>Your email server is working correctly!</p>\
           <p><strong>Time:</strong> {time}</p>\
         </div>",
        site = escape_html(site_name),
        time = now.to_rfc3339(),
    );

    OutboundEmail::new(to, subject, text, html)
}

/// Single notification used by the simplified `/send` endpoint.
#[must_use]
pub fn simple_notification(form: &SubmissionForm, to: &str, now: DateTime<Utc>) -> OutboundEmail {
    let subject = format!("Contact Form: {}", form.name);

    let text = format!(
        "Name: {name}\nEmail: {email}\nPhone: {phone}\nService: {service}\nMessage: {message}\n",
        name = form.name,
        email = form.email,
        phone = form.phone.as_deref().unwrap_or("N/A"),
        service = form.service,
        message = form.message,
    );

    let html = format!(
        "<h2>New Contact Form Submission</h2>\
         <p><strong>Name:</strong> {name}</p>\
         <p><strong>Email:</strong> {email}</p>\
         <p><strong>Phone:</strong> {phone}</p>\
         <p><strong>Service:</strong> {service}</p>\
         <p><strong>Message:</strong> {message}</p>\
         <p><em>Time: {time}</em></p>",
        name = escape_html(&form.name),
        email = escape_html(&form.email),
        phone = escape_html(form.phone.as_deref().unwrap_or("N/A")),
        service = escape_html(&form.service),
        message = escape_multiline(&form.message),
        time = now.to_rfc3339(),
    );

    OutboundEmail::new(to, subject, text, html).with_reply_to(form.email.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> SubmissionForm {
        SubmissionForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
            service: "web".to_string(),
            message: "line one\nline two".to_string(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>&\"'"),
            "&lt;script&gt;&amp;&quot;&#39;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_support_notification_content() {
        let email =
            support_notification(&form(), "NL12345678", Utc::now(), "support@example.com", "Acme");

        assert_eq!(email.to, "support@example.com");
        assert_eq!(email.reply_to.as_deref(), Some("ada@example.com"));
        assert!(email.subject.contains("Ada"));
        assert!(email.subject.contains("web"));
        assert!(email.text.contains("NL12345678"));
        assert!(email.text.contains("Not provided"));
        assert!(email.html.contains("line one<br>line two"));
    }

    #[test]
    fn test_support_notification_escapes_html() {
        let mut f = form();
        f.name = "<b>Ada</b>".to_string();
        let email = support_notification(&f, "NL12345678", Utc::now(), "s@example.com", "Acme");

        assert!(!email.html.contains("<b>Ada</b>"));
        assert!(email.html.contains("&lt;b&gt;Ada&lt;/b&gt;"));
        // Plain text is left as-is
        assert!(email.text.contains("<b>Ada</b>"));
    }

    #[test]
    fn test_auto_reply_content() {
        let email = auto_reply(&form(), "NL12345678", "Acme");

        assert_eq!(email.to, "ada@example.com");
        assert!(email.reply_to.is_none());
        assert!(email.subject.contains("Acme"));
        assert!(email.text.contains("NL12345678"));
        assert!(email.text.contains("your email"));
    }

    #[test]
    fn test_auto_reply_uses_phone_when_present() {
        let mut f = form();
        f.phone = Some("555-0100".to_string());
        let email = auto_reply(&f, "NL12345678", "Acme");
        assert!(email.text.contains("555-0100"));
    }

    #[test]
    fn test_test_email_content() {
        let email = test_email("support@example.com", "Acme", Utc::now());
        assert_eq!(email.to, "support@example.com");
        assert!(email.subject.contains("Server Test"));
    }

    #[test]
    fn test_simple_notification_content() {
        let email = simple_notification(&form(), "support@example.com", Utc::now());

        assert_eq!(email.to, "support@example.com");
        assert_eq!(email.reply_to.as_deref(), Some("ada@example.com"));
        assert!(email.text.contains("N/A"));
        assert!(email.subject.contains("Ada"));
    }
}

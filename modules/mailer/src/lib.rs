pub mod error;
pub mod log;
pub mod mailgun;
pub mod postmark;
pub mod resend;
pub mod sendgrid;

pub use error::{MailerError, Result};
pub use log::LogMailer;
pub use mailgun::MailgunMailer;
pub use postmark::PostmarkMailer;
pub use resend::ResendMailer;
pub use sendgrid::SendGridMailer;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl EmailMessage {
    /// Reject empty or malformed recipient lists before spending an API call.
    pub fn validate(&self) -> Result<()> {
        if !is_email(&self.from) {
            return Err(MailerError::InvalidRecipient(format!("sender {}", self.from)));
        }
        if self.to.is_empty() {
            return Err(MailerError::InvalidRecipient("no recipients".into()));
        }
        if let Some(bad) = self.to.iter().find(|r| !is_email(r)) {
            return Err(MailerError::InvalidRecipient(bad.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    pub provider: &'static str,
    pub message_id: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt>;
}

/// Check if a string looks like an email address.
///
/// Accepts the `Name <addr@host>` form used for senders.
pub fn is_email(identifier: &str) -> bool {
    let (_, addr) = split_mailbox(identifier);
    let Some((local, domain)) = addr.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !addr.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}

/// Split `Name <addr@host>` into display name and bare address.
/// A plain address comes back with no name.
pub fn split_mailbox(mailbox: &str) -> (Option<&str>, &str) {
    match (mailbox.find('<'), mailbox.rfind('>')) {
        (Some(start), Some(end)) if start < end => {
            let name = mailbox[..start].trim().trim_matches('"').trim();
            ((!name.is_empty()).then_some(name), mailbox[start + 1..end].trim())
        }
        _ => (None, mailbox.trim()),
    }
}

/// Supported delivery backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailProvider {
    SendGrid,
    Resend,
    Mailgun,
    Postmark,
    Log,
}

impl MailProvider {
    pub fn from_str_loose(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sendgrid" => Ok(Self::SendGrid),
            "resend" => Ok(Self::Resend),
            "mailgun" => Ok(Self::Mailgun),
            "postmark" => Ok(Self::Postmark),
            "log" | "none" | "stdout" => Ok(Self::Log),
            other => Err(MailerError::Config(format!("unknown email provider: {other}"))),
        }
    }
}

impl std::fmt::Display for MailProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MailProvider::SendGrid => write!(f, "sendgrid"),
            MailProvider::Resend => write!(f, "resend"),
            MailProvider::Mailgun => write!(f, "mailgun"),
            MailProvider::Postmark => write!(f, "postmark"),
            MailProvider::Log => write!(f, "log"),
        }
    }
}

/// Build a mailer for `provider`. Every provider except `Log` needs an API key;
/// Mailgun also needs its sending domain.
pub fn build_mailer(
    provider: MailProvider,
    api_key: Option<&str>,
    mailgun_domain: Option<&str>,
) -> Result<Arc<dyn Mailer>> {
    let key = || {
        api_key
            .filter(|k| !k.is_empty())
            .ok_or_else(|| MailerError::Config(format!("EMAIL_API_KEY is required for {provider}")))
    };
    let mailer: Arc<dyn Mailer> = match provider {
        MailProvider::SendGrid => Arc::new(SendGridMailer::new(key()?)),
        MailProvider::Resend => Arc::new(ResendMailer::new(key()?)),
        MailProvider::Postmark => Arc::new(PostmarkMailer::new(key()?)),
        MailProvider::Mailgun => {
            let domain = mailgun_domain
                .filter(|d| !d.is_empty())
                .ok_or_else(|| MailerError::Config("MAILGUN_DOMAIN is required for mailgun".into()))?;
            Arc::new(MailgunMailer::new(key()?, domain))
        }
        MailProvider::Log => Arc::new(LogMailer),
    };
    Ok(mailer)
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build HTTP client")
}

#[cfg(test)]
pub(crate) fn test_message() -> EmailMessage {
    EmailMessage {
        from: "IPO Radar <digest@example.com>".into(),
        to: vec!["alice@example.com".into(), "bob@example.org".into()],
        subject: "India IPO digest".into(),
        html: "<p>hello</p>".into(),
        text: "hello".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_splits_name_from_address() {
        assert_eq!(split_mailbox("IPO Radar <digest@example.com>"), (Some("IPO Radar"), "digest@example.com"));
        assert_eq!(split_mailbox("\"Radar, IPO\" <digest@example.com>"), (Some("Radar, IPO"), "digest@example.com"));
        assert_eq!(split_mailbox("<digest@example.com>"), (None, "digest@example.com"));
        assert_eq!(split_mailbox(" alice@example.com "), (None, "alice@example.com"));
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("user@example.com"));
        assert!(is_email("test.user@domain.co.in"));
        assert!(is_email("IPO Radar <digest@example.com>"));

        assert!(!is_email("user@example"));
        assert!(!is_email("userexample.com"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("user name@example.com"));
        assert!(!is_email("+919876543210"));
    }

    #[test]
    fn validate_rejects_empty_and_bad_recipients() {
        let mut msg = test_message();
        assert!(msg.validate().is_ok());

        msg.to.push("not-an-email".into());
        assert!(matches!(msg.validate(), Err(MailerError::InvalidRecipient(r)) if r == "not-an-email"));

        msg.to.clear();
        assert!(msg.validate().is_err());
    }

    #[test]
    fn build_mailer_requires_keys() {
        assert!(build_mailer(MailProvider::SendGrid, None, None).is_err());
        assert!(build_mailer(MailProvider::Mailgun, Some("k"), None).is_err());
        assert_eq!(
            build_mailer(MailProvider::Mailgun, Some("k"), Some("mg.example.com"))
                .unwrap()
                .provider(),
            "mailgun"
        );
        assert_eq!(build_mailer(MailProvider::Log, None, None).unwrap().provider(), "log");
    }

    #[test]
    fn provider_names_round_trip() {
        for p in [
            MailProvider::SendGrid,
            MailProvider::Resend,
            MailProvider::Mailgun,
            MailProvider::Postmark,
            MailProvider::Log,
        ] {
            assert_eq!(MailProvider::from_str_loose(&p.to_string()).unwrap(), p);
        }
        assert!(MailProvider::from_str_loose("smtp").is_err());
    }
}

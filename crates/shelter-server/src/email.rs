//! Email transport that records each message in the log.
//!
//! Used when no SMTP relay is wired in. It is configured only when a
//! sender address is set, so a bare deployment skips delivery instead
//! of logging mail it never sends.

use shelter_service::{EmailSender, NotifyError};
use tracing::info;

use crate::config::EmailConfig;

#[derive(Debug, Clone)]
pub struct LogEmailSender {
    from_address: Option<String>,
}

impl LogEmailSender {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            from_address: config
                .from_address
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
        }
    }
}

impl EmailSender for LogEmailSender {
    fn is_configured(&self) -> bool {
        self.from_address.is_some()
    }

    async fn send_announcement_email(
        &self,
        address: &str,
        title: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        let Some(from) = self.from_address.as_deref() else {
            return Err(NotifyError::Delivery {
                recipient: address.into(),
                reason: "no sender address configured".into(),
            });
        };
        if !address.contains('@') {
            return Err(NotifyError::Delivery {
                recipient: address.into(),
                reason: "malformed address".into(),
            });
        }
        info!(from, to = address, title, bytes = body.len(), "Announcement email");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_sender_is_unconfigured() {
        let sender = LogEmailSender::new(&EmailConfig {
            from_address: Some("  ".into()),
        });
        assert!(!sender.is_configured());
        assert!(!LogEmailSender::new(&EmailConfig::default()).is_configured());
    }

    #[tokio::test]
    async fn rejects_malformed_recipient() {
        let sender = LogEmailSender::new(&EmailConfig {
            from_address: Some("rescue@example.org".into()),
        });
        assert!(sender.is_configured());
        assert!(sender.send_announcement_email("a@example.org", "t", "b").await.is_ok());
        assert!(matches!(
            sender.send_announcement_email("nobody", "t", "b").await,
            Err(NotifyError::Delivery { .. })
        ));
    }
}

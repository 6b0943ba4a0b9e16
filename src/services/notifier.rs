// src/services/notifier.rs

//! Mail notification for newly discovered events.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::error::Result;
use crate::models::{Event, MailSettings, SmtpSettings};

/// Port that speaks TLS from the first byte instead of STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Delivers a finished message.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, settings: &SmtpSettings, message: Message) -> Result<()>;
}

/// SMTP delivery with authentication and TLS.
#[derive(Debug, Default, Clone, Copy)]
pub struct SmtpMailer;

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, settings: &SmtpSettings, message: Message) -> Result<()> {
        let builder = if settings.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        };
        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ))
            .build();

        transport.send(message).await?;
        Ok(())
    }
}

/// What a notification attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Nothing new, nothing sent
    Skipped,
    Sent { recipients: usize, events: usize },
}

/// Sends one summary mail per batch of new events.
pub struct Notifier {
    settings: MailSettings,
    transport: Arc<dyn MailTransport>,
    base_url: String,
}

impl Notifier {
    pub fn new(
        settings: MailSettings,
        transport: Arc<dyn MailTransport>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            transport,
            base_url: base_url.into(),
        }
    }

    /// Mail the batch to every recipient.
    ///
    /// An empty batch succeeds without touching settings or transport.
    /// Incomplete settings yield `AppError::MailConfig`, delivery problems
    /// `AppError::Mail`; both are logged here.
    pub async fn notify(&self, batch: &[Event]) -> Result<NotifyOutcome> {
        if batch.is_empty() {
            log::debug!("No new events, skipping notification");
            return Ok(NotifyOutcome::Skipped);
        }

        let smtp = self
            .settings
            .resolve()
            .inspect_err(|e| log::error!("Notification disabled: {}", e))?;

        let message = self
            .build_message(&smtp, batch)
            .inspect_err(|e| log::error!("Could not build notification mail: {}", e))?;

        self.transport
            .send(&smtp, message)
            .await
            .inspect_err(|e| {
                log::error!(
                    "Sending notification via {}:{} failed: {}",
                    smtp.host,
                    smtp.port,
                    e
                )
            })?;

        log::info!(
            "Notified {} recipient(s) about {} new event(s)",
            smtp.recipients.len(),
            batch.len()
        );
        Ok(NotifyOutcome::Sent {
            recipients: smtp.recipients.len(),
            events: batch.len(),
        })
    }

    fn build_message(&self, smtp: &SmtpSettings, batch: &[Event]) -> Result<Message> {
        let mut builder = Message::builder()
            .from(smtp.from.parse::<Mailbox>()?)
            .subject(subject(batch.len()));
        for recipient in &smtp.recipients {
            builder = builder.to(recipient.parse::<Mailbox>()?);
        }

        let message = builder.multipart(MultiPart::alternative_plain_html(
            self.render_plain(batch),
            self.render_html(batch),
        ))?;
        Ok(message)
    }

    fn render_plain(&self, batch: &[Event]) -> String {
        let mut text = String::new();
        for event in batch {
            text.push_str(&event.title);
            text.push('\n');
            text.push_str(&event.formatted_date());
            text.push('\n');
            if let Some(window) = event.time_window() {
                text.push_str(&window);
                text.push('\n');
            }
            text.push_str(&event.location);
            text.push('\n');
            text.push_str(&event.link(&self.base_url));
            text.push_str("\n\n");
        }
        text
    }

    fn render_html(&self, batch: &[Event]) -> String {
        let mut html = String::from("<html><body>");
        for event in batch {
            html.push_str("<div>");
            if let Some(photo) = &event.photo {
                html.push_str(&format!(
                    r#"<img src="{}" style="max-width: 100%;" />"#,
                    html_escape::encode_double_quoted_attribute(photo)
                ));
            }
            html.push_str(&format!(
                r#"<h2><a href="{}">{}</a></h2>"#,
                html_escape::encode_double_quoted_attribute(&event.link(&self.base_url)),
                html_escape::encode_text(&event.title)
            ));
            html.push_str(&format!(
                "<p>{}</p>",
                html_escape::encode_text(&event.formatted_date())
            ));
            if let Some(window) = event.time_window() {
                html.push_str(&format!("<p>{}</p>", html_escape::encode_text(&window)));
            }
            html.push_str(&format!(
                "<p>{}</p>",
                html_escape::encode_text(&event.location)
            ));
            html.push_str("</div><hr />");
        }
        html.push_str("</body></html>");
        html
    }
}

fn subject(count: usize) -> String {
    match count {
        1 => "Wuppertal Live: 1 neue Veranstaltung".to_string(),
        n => format!("Wuppertal Live: {n} neue Veranstaltungen"),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;
    use crate::error::AppError;

    /// Transport that records messages instead of sending them.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<Message>>,
        pub fail: bool,
    }

    impl RecordingTransport {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, _settings: &SmtpSettings, message: Message) -> Result<()> {
            if self.fail {
                return Err(AppError::mail("connection refused"));
            }
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    pub fn complete_settings() -> MailSettings {
        MailSettings {
            from: Some("Wuppertal Live <feed@example.com>".to_string()),
            to: Some("a@example.com,b@example.com".to_string()),
            host: Some("smtp.example.com".to_string()),
            port: Some("587".to_string()),
            user: Some("feed".to_string()),
            password: Some("secret".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordingTransport, complete_settings};
    use super::*;
    use crate::error::AppError;
    use crate::models::sample_event;

    const BASE: &str = "https://www.wuppertal-live.de";

    fn notifier(settings: MailSettings, transport: Arc<RecordingTransport>) -> Notifier {
        Notifier::new(settings, transport, BASE)
    }

    #[tokio::test]
    async fn test_empty_batch_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let outcome = notifier(MailSettings::default(), Arc::clone(&transport))
            .notify(&[])
            .await
            .unwrap();

        assert_eq!(outcome, NotifyOutcome::Skipped);
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_settings_is_config_error() {
        let transport = Arc::new(RecordingTransport::default());
        let mut settings = complete_settings();
        settings.host = None;

        let err = notifier(settings, Arc::clone(&transport))
            .notify(&[sample_event(1)])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MailConfig { ref missing } if missing == &vec!["SMTP_HOST"]));
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_mail_error() {
        let transport = Arc::new(RecordingTransport::failing());
        let err = notifier(complete_settings(), transport)
            .notify(&[sample_event(1)])
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Mail(_)));
    }

    #[tokio::test]
    async fn test_sends_one_message_to_all_recipients() {
        let transport = Arc::new(RecordingTransport::default());
        let outcome = notifier(complete_settings(), Arc::clone(&transport))
            .notify(&[sample_event(1), sample_event(2)])
            .await
            .unwrap();

        assert_eq!(
            outcome,
            NotifyOutcome::Sent {
                recipients: 2,
                events: 2
            }
        );
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].envelope().to().len(), 2);
        let raw = String::from_utf8(sent[0].formatted()).unwrap();
        assert!(raw.contains("Subject: Wuppertal Live: 2 neue Veranstaltungen"));
        assert!(raw.contains("multipart/alternative"));
    }

    #[tokio::test]
    async fn test_invalid_sender_address_is_mail_error() {
        let transport = Arc::new(RecordingTransport::default());
        let mut settings = complete_settings();
        settings.from = Some("not an address".to_string());

        let err = notifier(settings, Arc::clone(&transport))
            .notify(&[sample_event(1)])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Mail(_)));
        assert_eq!(transport.sent_count(), 0);
    }

    #[test]
    fn test_html_body_lists_every_event() {
        let mut event = sample_event(3);
        event.title = "Jazz & Blues".to_string();
        event.photo = Some("https://www.wuppertal-live.de/img/3.jpg".to_string());
        let n = Notifier::new(
            MailSettings::default(),
            Arc::new(RecordingTransport::default()),
            BASE,
        );

        let html = n.render_html(&[event, sample_event(4)]);
        assert!(html.contains("Jazz &amp; Blues"));
        assert!(html.contains(r#"<img src="https://www.wuppertal-live.de/img/3.jpg""#));
        assert!(html.contains("https://www.wuppertal-live.de/4"));
        assert!(html.contains("<p>Montag, 15. Januar 2024</p>"));
        assert_eq!(html.matches("<h2>").count(), 2);

        let plain = n.render_plain(&[sample_event(4)]);
        assert!(plain.starts_with("Konzert 4\nMontag, 15. Januar 2024\n19:00 - 22:00\nHalle 1\n"));
    }

    #[test]
    fn test_subject() {
        assert_eq!(subject(1), "Wuppertal Live: 1 neue Veranstaltung");
        assert_eq!(subject(3), "Wuppertal Live: 3 neue Veranstaltungen");
    }
}

// src/pipeline/cycle.rs

//! One refresh cycle: fetch → extract → publish → diff/persist → notify.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::models::{Config, MailSettings};
use crate::pipeline::diff::detect_changes;
use crate::services::{
    EventExtractor, FeedPublisher, FeedReader, FeedRenderer, HttpSource, MailTransport,
    Notifier, NotifyOutcome, PageSource, SmtpMailer, feed_channel,
};
use crate::storage::EventStore;

/// Summary of a completed cycle.
#[derive(Debug)]
pub struct CycleReport {
    pub extracted: usize,
    pub parse_failures: usize,
    pub new_events: usize,
    pub known_events: usize,
    /// Outcome of the mail step; failures are already logged
    pub notification: Result<NotifyOutcome>,
}

/// The ingestion pipeline and its collaborators.
pub struct Pipeline {
    source: Arc<dyn PageSource>,
    extractor: EventExtractor,
    renderer: FeedRenderer,
    publisher: FeedPublisher,
    store: Arc<dyn EventStore>,
    notifier: Notifier,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn PageSource>,
        extractor: EventExtractor,
        renderer: FeedRenderer,
        publisher: FeedPublisher,
        store: Arc<dyn EventStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            source,
            extractor,
            renderer,
            publisher,
            store,
            notifier,
        }
    }

    /// Wire the production pipeline: HTTP source and SMTP delivery.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn EventStore>,
        mail: MailSettings,
    ) -> Result<(Self, FeedReader)> {
        let source = Arc::new(HttpSource::new(&config.source)?);
        let transport: Arc<dyn MailTransport> = Arc::new(SmtpMailer);
        let (publisher, reader) = feed_channel();

        let pipeline = Self::new(
            source,
            EventExtractor::new(&config.source.base_url)?,
            FeedRenderer::new(config.feed.clone(), config.source.base_url.clone()),
            publisher,
            store,
            Notifier::new(mail, transport, config.source.base_url.clone()),
        );
        Ok((pipeline, reader))
    }

    pub fn reader(&self) -> FeedReader {
        self.publisher.reader()
    }

    /// Run one cycle to completion.
    ///
    /// A fetch failure returns early with the error and leaves the published
    /// feed and the store untouched. Notification failures never fail the
    /// cycle; they are reported in `CycleReport::notification`.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        log::info!("Refreshing feed from {}", self.source.location());

        let markup = self.source.fetch().await.inspect_err(|e| {
            log::error!(
                "Error downloading {}: {}. Keeping previous feed.",
                self.source.location(),
                e
            )
        })?;

        let extraction = self.extractor.extract(&markup);
        log::info!(
            "Extracted {} event(s), {} block(s) skipped",
            extraction.events.len(),
            extraction.failure_count()
        );

        // The feed mirrors the current listing, not the full history.
        let document = self.renderer.render(&extraction.events, Utc::now())?;
        let document = self.publisher.publish(document);
        log::info!("Published feed with {} item(s)", document.item_count);

        let diff = detect_changes(self.store.as_ref(), &extraction.events).await?;

        let notification = self.notifier.notify(&diff.added).await;

        Ok(CycleReport {
            extracted: extraction.events.len(),
            parse_failures: extraction.failure_count(),
            new_events: diff.added.len(),
            known_events: diff.known.len(),
            notification,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;
    use crate::models::{FeedConfig, MailSettings};
    use crate::services::notifier::testing::{RecordingTransport, complete_settings};
    use crate::storage::MemoryStore;

    const BASE: &str = "https://www.wuppertal-live.de";

    const LISTING: &str = r#"
        <div id="event42">
            <div class="zeitraum">Januar 2024</div>
            <div class="datum-veranstaltungen">
                <span class="monat">Januar</span>
                <span class="tag">15.</span>
            </div>
            <h1>Test Konzert</h1>
            <div class="location">Halle 1</div>
        </div>"#;

    /// Serves queued responses, one per fetch.
    struct StubSource {
        responses: Mutex<Vec<Result<String>>>,
    }

    impl StubSource {
        fn new(responses: Vec<Result<String>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
            }
        }
    }

    #[async_trait]
    impl PageSource for StubSource {
        async fn fetch(&self) -> Result<String> {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AppError::validation("no more responses")))
        }

        fn location(&self) -> &str {
            "stub://listing"
        }
    }

    struct Harness {
        pipeline: Pipeline,
        reader: FeedReader,
        store: Arc<MemoryStore>,
        transport: Arc<RecordingTransport>,
    }

    fn harness(responses: Vec<Result<String>>, mail: MailSettings) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::default());
        let (publisher, reader) = feed_channel();
        let pipeline = Pipeline::new(
            Arc::new(StubSource::new(responses)),
            EventExtractor::new(BASE).unwrap(),
            FeedRenderer::new(FeedConfig::default(), BASE),
            publisher,
            store.clone(),
            Notifier::new(mail, transport.clone(), BASE),
        );
        Harness {
            pipeline,
            reader,
            store,
            transport,
        }
    }

    fn server_error() -> Result<String> {
        Err(AppError::Fetch {
            url: "stub://listing".to_string(),
            status: 500,
        })
    }

    #[tokio::test]
    async fn test_first_cycle_notifies_second_does_not() {
        let h = harness(
            vec![Ok(LISTING.to_string()), Ok(LISTING.to_string())],
            complete_settings(),
        );

        let first = h.pipeline.run_cycle().await.unwrap();
        assert_eq!(first.extracted, 1);
        assert_eq!(first.new_events, 1);
        assert!(matches!(
            first.notification,
            Ok(NotifyOutcome::Sent { events: 1, .. })
        ));
        assert_eq!(h.store.len().await.unwrap(), 1);
        assert_eq!(h.transport.sent_count(), 1);

        let second = h.pipeline.run_cycle().await.unwrap();
        assert_eq!(second.new_events, 0);
        assert_eq!(second.known_events, 1);
        assert!(matches!(second.notification, Ok(NotifyOutcome::Skipped)));
        assert_eq!(h.store.len().await.unwrap(), 1);
        assert_eq!(h.transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_state() {
        let h = harness(
            vec![Ok(LISTING.to_string()), server_error()],
            complete_settings(),
        );

        h.pipeline.run_cycle().await.unwrap();
        let before = h.reader.current().unwrap();

        let err = h.pipeline.run_cycle().await.unwrap_err();
        assert!(err.is_fetch());

        let after = h.reader.current().unwrap();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(h.store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_before_any_cycle_leaves_feed_empty() {
        let h = harness(vec![server_error()], complete_settings());

        assert!(h.pipeline.run_cycle().await.is_err());
        assert!(h.reader.current().is_none());
        assert_eq!(h.store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_mail_config_still_persists() {
        let h = harness(vec![Ok(LISTING.to_string())], MailSettings::default());

        let report = h.pipeline.run_cycle().await.unwrap();
        assert_eq!(report.new_events, 1);
        assert!(matches!(
            report.notification,
            Err(AppError::MailConfig { .. })
        ));
        assert_eq!(h.store.len().await.unwrap(), 1);
        assert!(h.reader.current().unwrap().xml.contains("Test Konzert"));
    }

    #[tokio::test]
    async fn test_feed_mirrors_current_listing() {
        let later = LISTING.replace("event42", "event43").replace("Test Konzert", "Jazzabend");
        let h = harness(
            vec![Ok(LISTING.to_string()), Ok(later)],
            MailSettings::default(),
        );

        h.pipeline.run_cycle().await.unwrap();
        h.pipeline.run_cycle().await.unwrap();

        let xml = &h.reader.current().unwrap().xml;
        assert!(xml.contains("Jazzabend"));
        assert!(!xml.contains("Test Konzert"));
        assert_eq!(h.store.len().await.unwrap(), 2);
        assert_eq!(h.pipeline.reader().current().unwrap().item_count, 1);
    }
}

// src/services/feed.rs

//! RSS rendering and publication.
//!
//! The rendered document is an immutable snapshot. Publishing swaps the
//! snapshot held by a single-slot watch channel, so HTTP readers always see
//! a complete document: the previous one or the new one.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use rss::extension::atom::{AtomExtension, Link};
use rss::{ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use tokio::sync::watch;

use crate::error::{AppError, Result};
use crate::models::{Event, FeedConfig};

/// A rendered feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    pub xml: String,
    pub built_at: DateTime<Utc>,
    pub item_count: usize,
}

/// Renders events into an RSS 2.0 document.
#[derive(Debug, Clone)]
pub struct FeedRenderer {
    config: FeedConfig,
    base_url: String,
}

impl FeedRenderer {
    /// `base_url` is the site root used for item links.
    pub fn new(config: FeedConfig, base_url: impl Into<String>) -> Self {
        Self {
            config,
            base_url: base_url.into(),
        }
    }

    pub fn render(&self, events: &[Event], built_at: DateTime<Utc>) -> Result<FeedDocument> {
        let self_link = Link {
            href: self.config.self_link.clone(),
            rel: "self".to_string(),
            mime_type: Some("application/rss+xml".to_string()),
            ..Default::default()
        };

        let channel = ChannelBuilder::default()
            .title(self.config.title.clone())
            .link(self.config.link.clone())
            .description(self.config.description.clone())
            .language(Some(self.config.language.clone()))
            .last_build_date(Some(rfc822_gmt(built_at)))
            .ttl(Some(self.config.ttl_minutes.to_string()))
            .atom_ext(Some(AtomExtension {
                links: vec![self_link],
            }))
            .items(events.iter().map(|e| self.item(e)).collect::<Vec<_>>())
            .build();

        let bytes = channel
            .write_to(Vec::new())
            .map_err(|e| AppError::Feed(e.to_string()))?;
        let xml = String::from_utf8(bytes).map_err(|e| AppError::Feed(e.to_string()))?;

        Ok(FeedDocument {
            xml,
            built_at,
            item_count: events.len(),
        })
    }

    fn item(&self, event: &Event) -> Item {
        let link = event.link(&self.base_url);
        ItemBuilder::default()
            .guid(Some(GuidBuilder::default().value(link.clone()).permalink(true).build()))
            .title(Some(event.title.clone()))
            .link(Some(link))
            .description(Some(item_description(event)))
            .pub_date(Some(pub_date(event)))
            .build()
    }
}

/// HTML fragment embedded as CDATA in the item description.
fn item_description(event: &Event) -> String {
    let mut html = String::new();
    if let Some(photo) = &event.photo {
        html.push_str(&format!(
            r#"<img src="{}" />"#,
            html_escape::encode_double_quoted_attribute(photo)
        ));
    }
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
    html
}

/// Event day at local midnight.
fn pub_date(event: &Event) -> String {
    let midnight = event.date.and_time(NaiveTime::MIN);
    match Berlin.from_local_datetime(&midnight).earliest() {
        Some(local) => local.to_rfc2822(),
        None => Utc.from_utc_datetime(&midnight).to_rfc2822(),
    }
}

fn rfc822_gmt(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Write side of the shared feed cell.
pub struct FeedPublisher {
    tx: watch::Sender<Option<Arc<FeedDocument>>>,
}

/// Read side of the shared feed cell.
#[derive(Clone)]
pub struct FeedReader {
    rx: watch::Receiver<Option<Arc<FeedDocument>>>,
}

/// Create an empty feed cell.
pub fn feed_channel() -> (FeedPublisher, FeedReader) {
    let (tx, rx) = watch::channel(None);
    (FeedPublisher { tx }, FeedReader { rx })
}

impl FeedPublisher {
    /// Replace the published document.
    pub fn publish(&self, document: FeedDocument) -> Arc<FeedDocument> {
        let document = Arc::new(document);
        self.tx.send_replace(Some(Arc::clone(&document)));
        document
    }

    pub fn reader(&self) -> FeedReader {
        FeedReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl FeedReader {
    /// The latest published document, if any cycle has completed.
    pub fn current(&self) -> Option<Arc<FeedDocument>> {
        self.rx.borrow().clone()
    }
}

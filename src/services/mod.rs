//! Service layer for the feed service.
//!
//! This module contains the business logic for:
//! - Listing retrieval (`PageSource`, `HttpSource`)
//! - Event extraction (`EventExtractor`)
//! - Feed rendering and publication (`FeedRenderer`, `FeedPublisher`)
//! - Mail notification (`Notifier`)

pub mod events;
pub mod feed;
pub mod fetcher;
pub mod notifier;

pub use events::{EventExtractor, ExtractError, Extraction};
pub use feed::{FeedDocument, FeedPublisher, FeedReader, FeedRenderer, feed_channel};
pub use fetcher::{HttpSource, PageSource};
pub use notifier::{MailTransport, Notifier, NotifyOutcome, SmtpMailer};

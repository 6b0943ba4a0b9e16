// src/models/mod.rs

//! Domain models for the feed service.

mod config;
mod event;
mod mail;

pub use config::{Config, FeedConfig, ScheduleConfig, ServerConfig, SourceConfig, StorageConfig};
pub use event::Event;
pub use mail::{MailSettings, SmtpSettings};

#[cfg(test)]
pub(crate) use event::sample_event;

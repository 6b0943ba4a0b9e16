// src/lib.rs

//! wuppertal-live feed library
//!
//! Scrapes the wuppertal-live.de event listing, publishes it as RSS and
//! mails newly discovered events.

pub mod error;
pub mod locale;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;

// src/services/events.rs

//! Event extraction from the listing markup.
//!
//! The listing is a flat sequence of `<div id="event…">` blocks. A block may
//! open with a `.zeitraum` header ("Januar 2024") that sets the year for
//! every following block until the next header, so the walk threads the
//! current year through a fold instead of a mutable outer variable.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

use crate::error::{AppError, Result};
use crate::locale;
use crate::models::Event;
use crate::utils::{normalize_whitespace, resolve_url};

const EVENT_ID_PREFIX: &str = "event";
const NO_END_TIME: &str = "Uhr";

/// Why a single event block was skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("block id '{raw}' has no numeric event id")]
    InvalidId { raw: String },

    #[error("event {id}: missing {element} element")]
    MissingElement { id: u64, element: &'static str },

    #[error("event {id}: {field} is empty")]
    EmptyField { id: u64, field: &'static str },

    #[error("event {id}: no period header seen yet, year unknown ({text})")]
    MissingYear { id: u64, text: String },

    #[error("event {id}: unknown month name '{month}'")]
    UnknownMonth { id: u64, month: String },

    #[error("event {id}: invalid day '{day}'")]
    InvalidDay { id: u64, day: String },

    #[error("event {id}: {year}-{month:02}-{day:02} is not a calendar date")]
    InvalidDate {
        id: u64,
        year: i32,
        month: u32,
        day: u32,
    },
}

/// Result of one extraction run.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Accepted events in listing order
    pub events: Vec<Event>,
    /// Blocks that were skipped
    pub failures: Vec<ExtractError>,
}

impl Extraction {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// Accumulator threaded through the block walk.
#[derive(Default)]
struct Walk {
    year: Option<i32>,
    extraction: Extraction,
}

struct Selectors {
    period: Selector,
    date: Selector,
    month: Selector,
    day: Selector,
    photo: Selector,
    time: Selector,
    start: Selector,
    end: Selector,
    title: Selector,
    location: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            period: parse_selector(".zeitraum")?,
            date: parse_selector(".datum-veranstaltungen")?,
            month: parse_selector(".monat")?,
            day: parse_selector(".tag")?,
            photo: parse_selector("img.lazy")?,
            time: parse_selector(".genre-uhrzeit")?,
            start: parse_selector(".beginn")?,
            end: parse_selector(".ende")?,
            title: parse_selector("h1")?,
            location: parse_selector(".location")?,
        })
    }
}

/// Parses listing markup into events.
pub struct EventExtractor {
    base_url: Url,
    selectors: Selectors,
}

impl EventExtractor {
    /// Create an extractor resolving photo paths against `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            selectors: Selectors::new()?,
        })
    }

    /// Extract all events from the markup, in listing order.
    ///
    /// Broken blocks are logged and reported in `Extraction::failures`;
    /// they never stop the walk.
    pub fn extract(&self, markup: &str) -> Extraction {
        let document = Html::parse_fragment(markup);

        let walk = document
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .filter(is_event_block)
            .fold(Walk::default(), |walk, block| self.step(walk, block));

        walk.extraction
    }

    fn step(&self, mut walk: Walk, block: ElementRef<'_>) -> Walk {
        let header = block.select(&self.selectors.period).next();
        if let Some(header) = header {
            let text = normalize_whitespace(&header.text().collect::<String>());
            match parse_period_year(&text) {
                Some(year) => walk.year = Some(year),
                None => log::warn!("Ignoring unparsable period header '{}'", text),
            }
        }

        match self.parse_block(block, walk.year, header.is_some()) {
            Ok(Some(event)) => walk.extraction.events.push(event),
            Ok(None) => {}
            Err(error) => {
                log::warn!("Skipping event block: {}", error);
                walk.extraction.failures.push(error);
            }
        }

        walk
    }

    /// Parse one block; `Ok(None)` for a header-only block.
    fn parse_block(
        &self,
        block: ElementRef<'_>,
        year: Option<i32>,
        has_header: bool,
    ) -> std::result::Result<Option<Event>, ExtractError> {
        let sel = &self.selectors;
        let id = parse_event_id(block)?;

        let Some(date_block) = block.select(&sel.date).next() else {
            if has_header {
                return Ok(None);
            }
            return Err(ExtractError::MissingElement {
                id,
                element: "date",
            });
        };
        let date = self.parse_date(id, date_block, year)?;

        let photo = block
            .select(&sel.photo)
            .next()
            .and_then(|img| img.value().attr("data-src"))
            .map(str::trim)
            .filter(|src| !src.is_empty())
            .and_then(|src| resolve_url(&self.base_url, src));

        let (start, end) = match block.select(&sel.time).next() {
            Some(time) => (
                time.select(&sel.start)
                    .next()
                    .map(element_text)
                    .filter(|s| !s.is_empty()),
                time.select(&sel.end)
                    .next()
                    .and_then(|el| parse_end_time(&element_text(el))),
            ),
            None => (None, None),
        };

        let title = required_text(block, &sel.title, id, "title")?;
        let location = required_text(block, &sel.location, id, "location")?;

        Ok(Some(Event {
            id,
            title,
            date,
            start,
            end,
            location,
            photo,
        }))
    }

    fn parse_date(
        &self,
        id: u64,
        date_block: ElementRef<'_>,
        year: Option<i32>,
    ) -> std::result::Result<NaiveDate, ExtractError> {
        let month_text = date_block
            .select(&self.selectors.month)
            .next()
            .map(element_text)
            .ok_or(ExtractError::MissingElement {
                id,
                element: "month",
            })?;
        let day_text = date_block
            .select(&self.selectors.day)
            .next()
            .map(|el| element_text(el).replace('.', "").trim().to_string())
            .ok_or(ExtractError::MissingElement { id, element: "day" })?;

        let year = year.ok_or_else(|| ExtractError::MissingYear {
            id,
            text: normalize_whitespace(&date_block.text().collect::<String>()),
        })?;
        let month = locale::month_from_name(&month_text).ok_or_else(|| {
            ExtractError::UnknownMonth {
                id,
                month: month_text.clone(),
            }
        })?;
        let day = day_text
            .parse::<u32>()
            .map_err(|_| ExtractError::InvalidDay {
                id,
                day: day_text.clone(),
            })?;

        NaiveDate::from_ymd_opt(year, month, day).ok_or(ExtractError::InvalidDate {
            id,
            year,
            month,
            day,
        })
    }
}

fn is_event_block(element: &ElementRef<'_>) -> bool {
    element.value().name() == "div"
        && element
            .value()
            .attr("id")
            .is_some_and(|id| id.starts_with(EVENT_ID_PREFIX))
}

fn parse_event_id(block: ElementRef<'_>) -> std::result::Result<u64, ExtractError> {
    let raw = block.value().attr("id").unwrap_or_default();
    raw.strip_prefix(EVENT_ID_PREFIX)
        .unwrap_or(raw)
        .trim()
        .parse()
        .map_err(|_| ExtractError::InvalidId {
            raw: raw.to_string(),
        })
}

/// Year token of a "<MonthName> <Year>" header.
fn parse_period_year(text: &str) -> Option<i32> {
    text.split_whitespace().nth(1)?.parse().ok()
}

/// The end element reads "bis 22:00 Uhr"; a bare "Uhr" means no end time.
fn parse_end_time(text: &str) -> Option<String> {
    let token = text.split_whitespace().nth(1)?;
    if token == NO_END_TIME {
        return None;
    }
    Some(token.to_string())
}

fn required_text(
    block: ElementRef<'_>,
    selector: &Selector,
    id: u64,
    field: &'static str,
) -> std::result::Result<String, ExtractError> {
    let text = block
        .select(selector)
        .next()
        .map(element_text)
        .ok_or(ExtractError::MissingElement { id, element: field })?;
    if text.is_empty() {
        return Err(ExtractError::EmptyField { id, field });
    }
    Ok(text)
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

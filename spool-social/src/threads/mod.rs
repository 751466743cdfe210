//! Threads profile pages: fetching and post extraction.
//!
//! Extraction runs leaf-first through these stages:
//!
//! 1. [`fragments::locate`] finds `application/json` script blocks (or falls
//!    back to the whole page),
//! 2. [`extract::extract`] pulls `taken_at` / `text` tokens out of each
//!    fragment and pairs them via a [`pairing::PairingPolicy`],
//! 3. [`normalize::normalize`] decodes each text token,
//! 4. [`finalize::finalize`] dedups, sorts newest-first and truncates.
//!
//! [`pipeline::Pipeline`] drives the stages and [`scraper::ThreadsScraper`]
//! glues it to the HTTP fetch.
pub mod client;
pub mod extract;
pub mod finalize;
pub mod fragments;
pub mod normalize;
pub mod pairing;
pub mod pipeline;
pub mod scraper;
pub mod types;

pub use client::{FetchConfig, FetchError, ProfileFetcher, ThreadsClient};
pub use pipeline::{Pipeline, run};
pub use scraper::{ScrapeError, ThreadsScraper};
pub use types::{ExtractionFailure, PostRecord, PostView};

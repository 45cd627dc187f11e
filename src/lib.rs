//! Per-day health series for a personal dashboard.
//!
//! Raw step, exercise and sleep samples are pulled from a [`SampleSource`],
//! bucketed into one value per calendar day and kept in a [`SeriesStore`]
//! keyed by metric name. Hand-entered series can be added next to them.
//!
//! [`SampleSource`]: application::sample_source::SampleSource
//! [`SeriesStore`]: application::series_store::SeriesStore
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

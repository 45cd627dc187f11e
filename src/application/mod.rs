// Application layer - Use cases and the sample source seam
pub mod bucketer;
pub mod clock;
pub mod custom_series;
pub mod dashboard_service;
pub mod range_controller;
pub mod sample_source;
pub mod series_store;

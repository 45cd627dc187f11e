// Presentation layer - HTTP surface for the chart layer
pub mod app_state;
pub mod handlers;
pub mod router;

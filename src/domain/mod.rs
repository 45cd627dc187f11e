// Domain layer - Plain data shared by every other layer
pub mod calendar;
pub mod metric;
pub mod range;
pub mod sample;
pub mod series;

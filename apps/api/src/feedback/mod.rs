// Stored customer feedback: status lifecycle, SQL store, background
// processing through the pipeline, and live analytics.

pub mod analytics;
pub mod handlers;
pub mod models;
pub mod processing;
pub mod store;

pub mod analytics;
pub mod calendar;
pub mod config;
pub mod output;
pub mod warehouse;

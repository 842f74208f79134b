pub mod analytics;
pub mod config;
pub mod driver;
pub mod logging;
pub mod telemetry;

pub mod analyzers;
pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod model;
pub mod output;

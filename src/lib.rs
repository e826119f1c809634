pub mod charts;
pub mod config;
pub mod demo;
pub mod directory;
pub mod document;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod lookup;
pub mod pipeline;
pub mod session;
pub mod shots;
pub mod state;
pub mod stats;
pub mod store;

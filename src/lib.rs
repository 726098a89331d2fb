//! reporthub: data source and report management with asynchronous report
//! generation to CSV or JSON files.

pub mod config;
pub mod database;
pub mod errors;
pub mod export;
pub mod models;
pub mod query;
pub mod services;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

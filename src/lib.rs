// Library exports for testing
pub mod api;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod database;
pub mod diagnostics;
pub mod error;
pub mod local;
pub mod models;
pub mod naming;
pub mod store;
pub mod sync;
pub mod transcode;
pub mod transform;

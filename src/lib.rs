// StreamVault Console
// Client-side core for the live stream ingestion dashboard

pub mod config;
pub mod context;
pub mod models;
pub mod services;

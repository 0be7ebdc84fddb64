//! getter: a read-only JSON API over a directory of JSON files

pub mod cli;
pub mod config;
pub mod error;
pub mod files;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod store;

//! Core imgdrive library (API client, session, folder browser, config).

pub mod api;
pub mod browser;
pub mod config;
pub mod logging;
pub mod session;
pub mod task;
pub mod token;
pub mod upload;

//! CLI command handlers

pub mod cache;
pub mod classify;
pub mod extract;
pub mod geocode;
pub mod ls;
pub mod report;
pub mod rm;
pub mod status;

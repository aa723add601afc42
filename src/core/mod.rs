//! Core functionality for sheets, file envelopes, local files, and configuration

pub mod config;
pub mod document;
pub mod envelope;
pub mod file_system;

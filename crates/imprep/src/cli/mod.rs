//! Command handlers for the imprep CLI.

mod common;
pub mod config;
pub mod dupes;
pub mod query;
pub mod scan;

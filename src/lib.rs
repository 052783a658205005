//! topanime library
//!
//! Paging, caching and filtering of the Jikan top anime list, independent of
//! the terminal UI in the binary. Exposed for the binary and integration tests.

pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod data;
pub mod detail;
pub mod logging;
pub mod theme;

//! Library half of the `projsync` CLI: configuration loading and merging.

pub mod config;

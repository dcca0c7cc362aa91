// topicsift: zero-shot topic extraction service
//
// This is the library root. classify holds the pipeline core, scorer the
// swappable model backends, and web the HTTP boundary.

pub mod classify;
pub mod config;
pub mod output;
pub mod scorer;

#[cfg(feature = "web")]
pub mod web;

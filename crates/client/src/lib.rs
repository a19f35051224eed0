//! `chartboard-client` library crate.
//!
//! HTTP access to the data-modeling service, remote execution of widget
//! queries, and the dashboard editing session. The binary entrypoint lives
//! in `main.rs`.

pub mod api;
pub mod binding;
pub mod collaborators;
pub mod config;
pub mod events;
pub mod session;

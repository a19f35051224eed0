//! Dashboard chart-builder domain logic.
//!
//! This crate has no I/O: canvas geometry, widget state, SQL synthesis and
//! dataset shaping are plain functions and types. Remote collaborators live
//! in `chartboard-client`.

pub mod binding;
pub mod canvas;
pub mod columns;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod query;
pub mod types;
pub mod widget;

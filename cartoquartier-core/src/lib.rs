//! Core rules for the CartoQuartier sector map.
//!
//! This crate holds everything that does not touch I/O: the GeoJSON data model,
//! the style resolver, the phase animation rule and the selection/editor state.
//! The service crate wires these to storage, HTTP and timers.

pub mod animator;
pub mod editor;
pub mod error;
pub mod models;
pub mod style;

pub use error::CoreError;

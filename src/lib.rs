pub mod animator;
pub mod api;
pub mod config;
pub mod db;
pub mod session;
pub mod store;
pub mod sync;

pub use cartoquartier_core::{editor, models, style, CoreError};

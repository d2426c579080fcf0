//! Data model for sector maps.
//!
//! # Core Concepts
//!
//! - [`Feature`]: one sector or unit, a GeoJSON feature whose geometry is kept
//!   opaque and whose [`FeatureProperties`] carry the editable fields.
//! - [`FeatureCollection`]: the ordered set of features currently loaded. Edits
//!   replace one element in place and never reorder.
//! - [`FilterState`]: the phase and level filters applied when styling.
//!
//! [`Phase`] and [`Status`] keep unknown values verbatim so a document survives
//! a load/edit/save cycle without losing data.

mod feature;
mod filter;

pub use feature::*;
pub use filter::*;

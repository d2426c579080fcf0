//! Style resolution for sector polygons.
//!
//! [`resolve_style`] is a pure function of a feature and the current filters.
//! Hover emphasis is applied by the renderer on top of the resolved style via
//! [`Style::hovered`]; it is never part of the view state.

use serde::Serialize;

use crate::models::{Feature, FilterState, Phase, Status};

pub const OCCUPIED_COLOR: &str = "#d62828";
pub const RESERVED_COLOR: &str = "#f77f00";
pub const PHASE_1_COLOR: &str = "#1f77b4";
pub const PHASE_2_COLOR: &str = "#2ca02c";
/// Phase 3, unset and unrecognized phases.
pub const DEFAULT_COLOR: &str = "#ff7f0e";

pub const BASE_OPACITY: f32 = 0.6;
pub const DIMMED_OPACITY: f32 = 0.15;
pub const STROKE_WEIGHT: u32 = 2;
pub const HOVER_WEIGHT: u32 = 3;

/// Render attributes of one feature. Derived on every render, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub color: &'static str,
    pub weight: u32,
    pub fill_opacity: f32,
}

impl Style {
    /// The same style with the pointer-over stroke weight.
    pub fn hovered(self) -> Self {
        Self {
            weight: HOVER_WEIGHT,
            ..self
        }
    }
}

pub fn resolve_style(feature: &Feature, filter: &FilterState) -> Style {
    Style {
        color: color_for(feature),
        weight: STROKE_WEIGHT,
        fill_opacity: if is_dimmed(feature, filter) {
            DIMMED_OPACITY
        } else {
            BASE_OPACITY
        },
    }
}

/// Status colours win over phase colours.
pub fn color_for(feature: &Feature) -> &'static str {
    let props = &feature.properties;
    match props.status() {
        Status::Occupied => OCCUPIED_COLOR,
        Status::Reserved => RESERVED_COLOR,
        Status::Free | Status::Other(_) => match props.phase {
            Some(Phase::One) => PHASE_1_COLOR,
            Some(Phase::Two) => PHASE_2_COLOR,
            _ => DEFAULT_COLOR,
        },
    }
}

/// A feature is dimmed when it fails either filter. The two conditions do not
/// stack.
pub fn is_dimmed(feature: &Feature, filter: &FilterState) -> bool {
    let props = &feature.properties;
    !filter.phase.admits(props.phase.as_ref()) || !filter.level.admits(props.level.as_ref())
}

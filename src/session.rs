//! State of one map view: loaded features, current filters and the editor.
//!
//! All mutations are short, synchronous state transitions. The session is
//! shared between HTTP handlers and the phase animator behind a mutex.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;

use crate::editor::{Draft, EditField, Editor, SaveOutcome};
use crate::models::{
    Feature, FeatureCollection, FeatureId, FilterState, PhaseFilter,
};
use crate::store::FeatureStore;
use crate::style::{resolve_style, Style};
use crate::CoreError;

pub type SharedSession = Arc<Mutex<MapSession>>;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Feature not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// A feature together with its resolved style, as handed to the renderer.
///
/// The renderer always receives the whole collection; filtered-out features
/// are dimmed, not hidden, and stay selectable.
#[derive(Debug, Clone, Serialize)]
pub struct StyledFeature {
    pub id: Option<FeatureId>,
    pub label: String,
    pub style: Style,
    pub feature: Feature,
}

pub struct MapSession {
    store: FeatureStore,
    filter: FilterState,
    editor: Editor,
}

impl MapSession {
    pub fn new(store: FeatureStore) -> Self {
        Self {
            store,
            filter: FilterState::default(),
            editor: Editor::new(),
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn collection(&self) -> &FeatureCollection {
        self.store.collection()
    }

    // ============================================================
    // Filters
    // ============================================================

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        tracing::debug!(phase = %filter.phase, level = %filter.level, "filter changed");
        self.filter = filter;
    }

    pub fn set_phase_filter(&mut self, phase: PhaseFilter) {
        self.filter.phase = phase;
    }

    /// Move the phase filter one step along the animation cycle.
    pub fn advance_phase(&mut self) -> PhaseFilter {
        self.filter.phase = cartoquartier_core::animator::advance(&self.filter.phase);
        self.filter.phase.clone()
    }

    // ============================================================
    // Styling
    // ============================================================

    pub fn styled_features(&self) -> Vec<StyledFeature> {
        self.store
            .collection()
            .iter()
            .map(|feature| StyledFeature {
                id: feature.key().cloned(),
                label: feature.label().to_string(),
                style: resolve_style(feature, &self.filter),
                feature: feature.clone(),
            })
            .collect()
    }

    pub fn style_of(&self, key: &str) -> Option<Style> {
        self.store
            .get(key)
            .map(|feature| resolve_style(feature, &self.filter))
    }

    // ============================================================
    // Selection and editing
    // ============================================================

    pub fn select(&mut self, key: &str) -> Result<Draft, SessionError> {
        let feature = self
            .store
            .get(key)
            .ok_or_else(|| SessionError::NotFound(key.to_string()))?;
        Ok(self.editor.select(feature).clone())
    }

    pub fn selection(&self) -> Option<&Draft> {
        self.editor.selected()
    }

    pub fn update(&mut self, field: EditField, value: &str) -> Result<Draft, SessionError> {
        Ok(self.editor.update(field, value)?.clone())
    }

    pub fn save(&mut self) -> Result<SaveOutcome, SessionError> {
        Ok(self.store.save(&mut self.editor)?)
    }

    pub fn cancel(&mut self) -> Option<Draft> {
        self.editor.cancel()
    }
}

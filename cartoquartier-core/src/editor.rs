//! Selection and property editing.
//!
//! Clicking a feature seeds a [`Draft`] from its current properties. The form
//! mutates the draft field by field through [`Editor::update`]; saving merges the
//! draft into the collection and clears the selection, cancelling just drops it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use crate::models::parse_level;
use crate::models::{
    Feature, FeatureCollection, FeatureId, FeatureProperties, Level, Phase, Status,
};
use crate::CoreError;

/// A form field of the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditField {
    Name,
    Type,
    Phase,
    Status,
    Level,
    Description,
}

impl FromStr for EditField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "type" => Ok(Self::Type),
            "phase" => Ok(Self::Phase),
            "status" => Ok(Self::Status),
            "level" => Ok(Self::Level),
            "description" => Ok(Self::Description),
            other => Err(CoreError::UnknownField(other.to_string())),
        }
    }
}

/// An in-progress edit of one feature's properties.
///
/// `id` is carried through unchanged and used as the match key on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: Option<FeatureId>,
    pub properties: FeatureProperties,
}

impl Draft {
    pub fn from_feature(feature: &Feature) -> Self {
        Self {
            id: feature.key().cloned(),
            properties: feature.properties.clone(),
        }
    }

    /// Apply one text input to the draft. Level input that is not an integer
    /// is stored as `0`.
    pub fn set(&mut self, field: EditField, value: &str) {
        let props = &mut self.properties;
        match field {
            EditField::Name => props.name = Some(value.to_string()),
            EditField::Type => props.kind = Some(value.to_string()),
            EditField::Phase => props.phase = Some(Phase::from(value.to_string())),
            EditField::Status => props.status = Some(Status::from(value.to_string())),
            EditField::Level => props.level = Some(Level::Floor(parse_level(value))),
            EditField::Description => props.description = Some(value.to_string()),
        }
    }
}

/// Result of a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveOutcome {
    /// False when no feature in the collection carries the draft's id.
    pub applied: bool,
    pub feature: Option<Feature>,
}

/// Selection state of the side panel. At most one feature is selected.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    draft: Option<Draft>,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `feature`, discarding any previous draft.
    pub fn select(&mut self, feature: &Feature) -> &Draft {
        tracing::debug!(feature = %feature.label(), "feature selected");
        self.draft.insert(Draft::from_feature(feature))
    }

    pub fn selected(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn update(&mut self, field: EditField, value: &str) -> Result<&Draft, CoreError> {
        let draft = self.draft.as_mut().ok_or(CoreError::NoSelection)?;
        draft.set(field, value);
        Ok(draft)
    }

    /// Drop the draft and clear the selection. The collection is not touched.
    pub fn cancel(&mut self) -> Option<Draft> {
        self.draft.take()
    }

    /// Merge the draft into `collection`.
    ///
    /// When the draft's id matches nothing, the collection and the selection
    /// are left as they are and the outcome reports `applied = false`.
    pub fn save(&mut self, collection: &mut FeatureCollection) -> Result<SaveOutcome, CoreError> {
        let draft = self.draft.as_ref().ok_or(CoreError::NoSelection)?;

        let updated = draft
            .id
            .as_ref()
            .and_then(|id| collection.merge_properties(id, &draft.properties))
            .cloned();

        match updated {
            Some(feature) => {
                self.draft = None;
                Ok(SaveOutcome {
                    applied: true,
                    feature: Some(feature),
                })
            }
            None => {
                tracing::warn!(id = ?draft.id, "save target not found in collection");
                Ok(SaveOutcome {
                    applied: false,
                    feature: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn geometry() -> Value {
        json!({"type": "Polygon", "coordinates": [[[0, 0], [0, 1], [1, 1], [0, 0]]]})
    }

    fn sample() -> FeatureCollection {
        FeatureCollection::new(vec![
            Feature::new(
                1,
                FeatureProperties {
                    phase: Some(Phase::One),
                    ..Default::default()
                },
                geometry(),
            ),
            Feature::new(
                2,
                FeatureProperties {
                    phase: Some(Phase::Two),
                    ..Default::default()
                },
                geometry(),
            ),
        ])
    }

    #[test]
    fn save_merges_draft_over_existing_properties() {
        let mut collection = sample();
        let mut editor = Editor::new();
        editor.select(&collection.features[1]);
        editor.draft = Some(Draft {
            id: Some(FeatureId::Number(2)),
            properties: FeatureProperties {
                status: Some(Status::Occupied),
                ..Default::default()
            },
        });

        let outcome = editor.save(&mut collection).unwrap();

        assert!(outcome.applied);
        assert_eq!(collection.features[0].key(), Some(&FeatureId::Number(1)));
        assert_eq!(collection.features[0].properties.phase, Some(Phase::One));
        assert_eq!(collection.features[0].properties.status, None);
        assert_eq!(collection.features[1].key(), Some(&FeatureId::Number(2)));
        assert_eq!(collection.features[1].properties.phase, Some(Phase::Two));
        assert_eq!(collection.features[1].properties.status, Some(Status::Occupied));
        assert!(!editor.is_editing());
    }

    #[test]
    fn save_with_unknown_id_is_a_no_op() {
        let mut collection = sample();
        let before = collection.clone();
        let mut editor = Editor::new();
        editor.draft = Some(Draft {
            id: Some(FeatureId::Number(42)),
            properties: FeatureProperties {
                name: Some("ghost".to_string()),
                ..Default::default()
            },
        });

        let outcome = editor.save(&mut collection).unwrap();

        assert!(!outcome.applied);
        assert!(outcome.feature.is_none());
        assert_eq!(collection, before);
        assert!(editor.is_editing());
    }

    #[test]
    fn level_input_is_coerced_to_integer() {
        for (input, expected) in [("", 0), ("abc", 0), ("2", 2), ("-1", -1)] {
            let mut collection = sample();
            let mut editor = Editor::new();
            editor.select(&collection.features[0]);
            editor.update(EditField::Level, input).unwrap();
            editor.save(&mut collection).unwrap();
            assert_eq!(collection.features[0].properties.level, Some(Level::Floor(expected)));
        }
    }

    #[test]
    fn form_updates_touch_only_the_draft() {
        let collection = sample();
        let mut editor = Editor::new();
        editor.select(&collection.features[0]);

        editor.update(EditField::Name, "Ilot B").unwrap();
        editor.update(EditField::Status, "réservé").unwrap();
        let draft = editor.update(EditField::Phase, "phase 3").unwrap();

        assert_eq!(draft.properties.name.as_deref(), Some("Ilot B"));
        assert_eq!(draft.properties.status, Some(Status::Reserved));
        assert_eq!(draft.properties.phase, Some(Phase::Three));
        assert_eq!(collection, sample());
    }

    #[test]
    fn cancel_clears_selection_and_keeps_collection() {
        let collection = sample();
        let mut editor = Editor::new();
        editor.select(&collection.features[1]);
        editor.update(EditField::Description, "à démolir").unwrap();

        let dropped = editor.cancel();

        assert!(dropped.is_some());
        assert!(editor.selected().is_none());
        assert_eq!(collection, sample());
    }

    #[test]
    fn selecting_again_replaces_the_draft() {
        let collection = sample();
        let mut editor = Editor::new();
        editor.select(&collection.features[0]);
        editor.update(EditField::Name, "draft").unwrap();
        editor.select(&collection.features[1]);

        let draft = editor.selected().unwrap();
        assert_eq!(draft.id, Some(FeatureId::Number(2)));
        assert!(draft.properties.name.is_none());
    }

    #[test]
    fn editing_without_selection_fails() {
        let mut editor = Editor::new();
        let mut collection = sample();
        assert!(matches!(
            editor.update(EditField::Name, "x"),
            Err(CoreError::NoSelection)
        ));
        assert!(matches!(editor.save(&mut collection), Err(CoreError::NoSelection)));
    }

    #[test]
    fn unknown_field_names_are_rejected() {
        assert!("geometry".parse::<EditField>().is_err());
        assert_eq!("level".parse::<EditField>().unwrap(), EditField::Level);
    }
}

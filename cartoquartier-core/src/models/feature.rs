use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::CoreError;

/// GeoJSON `type` tag of a feature collection.
pub const COLLECTION_TYPE: &str = "FeatureCollection";
/// GeoJSON `type` tag of a feature.
pub const FEATURE_TYPE: &str = "Feature";
/// Tooltip text for a feature that has no name.
pub const UNNAMED_LABEL: &str = "secteur";

/// Identifier of a feature, unique within its collection.
///
/// GeoJSON allows both numbers and strings. Ids are compared by their textual
/// form when they come from a URL path, see [`FeatureId::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    Text(String),
}

impl FeatureId {
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Number(n) => key.trim().parse::<i64>().is_ok_and(|k| k == *n),
            Self::Text(s) => s == key,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FeatureId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A renewal stage. The three named phases form the animation cycle, in order.
///
/// Any other tag is kept as-is: it matches no phase filter and styles in the
/// default colour bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Phase {
    One,
    Two,
    Three,
    Other(String),
}

impl Phase {
    /// The animation cycle.
    pub const CYCLE: [Phase; 3] = [Phase::One, Phase::Two, Phase::Three];

    pub fn as_str(&self) -> &str {
        match self {
            Self::One => "phase 1",
            Self::Two => "phase 2",
            Self::Three => "phase 3",
            Self::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "phase 1" => Self::One,
            "phase 2" => Self::Two,
            "phase 3" => Self::Three,
            other => Self::Other(other.to_string()),
        }
    }

    /// Index within [`Phase::CYCLE`], `None` for unrecognized tags.
    pub fn position(&self) -> Option<usize> {
        Self::CYCLE.iter().position(|p| p == self)
    }
}

impl From<String> for Phase {
    fn from(s: String) -> Self {
        match Self::parse(&s) {
            Self::Other(_) => Self::Other(s),
            known => known,
        }
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        match phase {
            Phase::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Occupancy state of a sector.
///
/// Documents written by the field teams use the French labels, so `libre`,
/// `occupé` and `réservé` are accepted on input. Output always uses the
/// English names. Unknown values are preserved and style like `Free`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Free,
    Occupied,
    Reserved,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Free => "free",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
            Self::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "free" | "libre" => Self::Free,
            "occupied" | "occupé" | "occupe" => Self::Occupied,
            "reserved" | "réservé" | "reserve" => Self::Reserved,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match Self::parse(&s) {
            Self::Other(_) => Self::Other(s),
            known => known,
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// Floor of a sector, as stored in the document.
///
/// Integers, integral floats and canonical integer strings (`"-1"`, `"2"`) are
/// floors. Anything else (`""`, `"abc"`, `1.5`, ...) is kept verbatim, written
/// back unchanged, and matches no level filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Level {
    Floor(i64),
    Raw(Value),
}

impl Level {
    pub fn floor(&self) -> Option<i64> {
        match self {
            Self::Floor(n) => Some(*n),
            Self::Raw(_) => None,
        }
    }
}

impl From<i64> for Level {
    fn from(n: i64) -> Self {
        Self::Floor(n)
    }
}

impl From<Value> for Level {
    fn from(value: Value) -> Self {
        let floor = match &value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.parse::<i64>().ok().filter(|n| n.to_string() == *s),
            _ => None,
        };
        match floor {
            Some(n) => Self::Floor(n),
            None => Self::Raw(value),
        }
    }
}

impl From<Level> for Value {
    fn from(level: Level) -> Self {
        match level {
            Level::Floor(n) => Value::from(n),
            Level::Raw(value) => value,
        }
    }
}

/// The editable property bag of a feature.
///
/// Properties the editor does not know about are kept in `extra` and written
/// back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FeatureProperties {
    /// Status with the `free` fallback applied.
    pub fn status(&self) -> Status {
        self.status.clone().unwrap_or(Status::Free)
    }

    /// Shallow merge: every field set in `other` overwrites ours, fields it
    /// leaves unset survive.
    pub fn merge_from(&mut self, other: &FeatureProperties) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }

        take(&mut self.id, &other.id);
        take(&mut self.name, &other.name);
        take(&mut self.kind, &other.kind);
        take(&mut self.phase, &other.phase);
        take(&mut self.status, &other.status);
        take(&mut self.level, &other.level);
        take(&mut self.description, &other.description);
        for (key, value) in &other.extra {
            self.extra.insert(key.clone(), value.clone());
        }
    }
}

/// One mapped sector or unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: FeatureProperties,
    /// Polygon boundary. Opaque here; the rendering side interprets it.
    #[serde(default)]
    pub geometry: Value,
}

impl Feature {
    pub fn new(id: impl Into<FeatureId>, properties: FeatureProperties, geometry: Value) -> Self {
        Self {
            kind: feature_type(),
            id: Some(id.into()),
            properties,
            geometry,
        }
    }

    /// The match key: the GeoJSON `id`, or `properties.id` when it is absent.
    pub fn key(&self) -> Option<&FeatureId> {
        self.id.as_ref().or(self.properties.id.as_ref())
    }

    pub fn label(&self) -> &str {
        match self.properties.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => UNNAMED_LABEL,
        }
    }
}

/// The ordered set of features currently loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::empty()
    }
}

impl FeatureCollection {
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: COLLECTION_TYPE.to_string(),
            features,
        }
    }

    /// Parse and validate a GeoJSON document.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let collection: Self = serde_json::from_str(json)?;
        collection.validate()?;
        Ok(collection)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.kind != COLLECTION_TYPE {
            return Err(CoreError::NotACollection(self.kind.clone()));
        }
        if let Some(index) = self.features.iter().position(|f| f.geometry.is_null()) {
            return Err(CoreError::MissingGeometry(index));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Look a feature up by the textual form of its id.
    pub fn get(&self, key: &str) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.key().is_some_and(|id| id.matches(key)))
    }

    pub fn position_of(&self, id: &FeatureId) -> Option<usize> {
        self.features.iter().position(|f| f.key() == Some(id))
    }

    /// Merge `properties` into the feature keyed by `id`, in place.
    ///
    /// Returns the updated feature, or `None` when no feature has that id, in
    /// which case the collection is left untouched. Geometry is never modified.
    pub fn merge_properties(
        &mut self,
        id: &FeatureId,
        properties: &FeatureProperties,
    ) -> Option<&Feature> {
        let index = self.position_of(id)?;
        let feature = &mut self.features[index];
        feature.properties.merge_from(properties);
        Some(feature)
    }
}

/// Parse free-text level input the way the editor form does.
///
/// Leading whitespace is skipped, then an optional sign and the leading run of
/// decimal digits are read. Anything unparseable, including empty input,
/// yields `0`.
pub fn parse_level(input: &str) -> i64 {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    match rest[..digits_end].parse::<i64>() {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) => 0,
    }
}

fn feature_type() -> String {
    FEATURE_TYPE.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

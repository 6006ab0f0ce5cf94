//! Catalog data model: phases, choices and their effect maps.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::catalog::{CatalogLoadError, SkippedRecord};
use crate::constants::{
    FALLBACK_OPTION_DESCRIPTION, FALLBACK_OPTION_ID, FALLBACK_OPTION_TEXT, FALLBACK_PHASE_ID,
    FALLBACK_PHASE_QUESTION, FALLBACK_PHASE_TITLE,
};

/// Signed indicator deltas applied when a choice is selected.
///
/// Indicators not present in the map are untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Effects(BTreeMap<String, i32>);

impl Effects {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, i32)>,
        K: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    #[must_use]
    pub fn get(&self, indicator: &str) -> Option<i32> {
        self.0.get(indicator).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(name, delta)| (name.as_str(), *delta))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// History keys a choice needs before it becomes visible.
///
/// The catalog accepts a single key or a list; both collapse into one set here.
/// An empty set means the choice is always available.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RequiresRepr", into = "Vec<String>")]
pub struct Requires(BTreeSet<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RequiresRepr {
    One(String),
    Many(Vec<String>),
    Absent(()),
}

impl From<RequiresRepr> for Requires {
    fn from(repr: RequiresRepr) -> Self {
        let keys = match repr {
            RequiresRepr::One(key) => vec![key],
            RequiresRepr::Many(keys) => keys,
            RequiresRepr::Absent(()) => Vec::new(),
        };
        Self(keys.into_iter().filter(|key| !key.is_empty()).collect())
    }
}

impl From<Requires> for Vec<String> {
    fn from(requires: Requires) -> Self {
        requires.0.into_iter().collect()
    }
}

impl Requires {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn all_of<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Required keys absent from `history`, in sorted order.
    #[must_use]
    pub fn missing_from(&self, history: &HashSet<String>) -> Vec<String> {
        self.0
            .iter()
            .filter(|key| !history.contains(*key))
            .cloned()
            .collect()
    }
}

/// A selectable option within a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub effects: Effects,
    /// Presentation tag only; never read by the rules.
    #[serde(default, deserialize_with = "null_as_default")]
    pub strategy_type: String,
    #[serde(default, deserialize_with = "non_empty_key")]
    pub unlocks: Option<String>,
    #[serde(default)]
    pub requires: Requires,
    #[serde(default, deserialize_with = "non_empty_key")]
    pub synergy_with: Option<String>,
    #[serde(default)]
    pub synergy_bonus: Option<Effects>,
}

/// Treats an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn non_empty_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let key = Option::<String>::deserialize(deserializer)?;
    Ok(key.filter(|key| !key.is_empty()))
}

impl Choice {
    /// Build a choice with only base effects (useful for tests and fallbacks).
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>, effects: Effects) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            description: String::new(),
            effects,
            strategy_type: String::new(),
            unlocks: None,
            requires: Requires::none(),
            synergy_with: None,
            synergy_bonus: None,
        }
    }

    #[must_use]
    pub fn with_requires(mut self, requires: Requires) -> Self {
        self.requires = requires;
        self
    }

    #[must_use]
    pub fn with_unlocks(mut self, key: impl Into<String>) -> Self {
        self.unlocks = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_synergy(mut self, source: impl Into<String>, bonus: Effects) -> Self {
        self.synergy_with = Some(source.into());
        self.synergy_bonus = Some(bonus);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Synergy source and bonus when both halves are present.
    #[must_use]
    pub fn synergy(&self) -> Option<(&str, &Effects)> {
        match (&self.synergy_with, &self.synergy_bonus) {
            (Some(source), Some(bonus)) => Some((source.as_str(), bonus)),
            _ => None,
        }
    }
}

/// One stage of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    /// One-based by catalog convention; feeds the history key.
    pub id: u32,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub decisions: Vec<Choice>,
}

/// Phase record with its options left unparsed so bad options can be skipped
/// one by one.
#[derive(Deserialize)]
struct PhaseHeader {
    id: u32,
    title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    question: String,
    #[serde(default, deserialize_with = "null_as_default")]
    decisions: Vec<Value>,
}

/// Immutable, ordered list of phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct Catalog {
    phases: Vec<Phase>,
}

impl Catalog {
    #[must_use]
    pub fn from_phases(phases: Vec<Phase>) -> Self {
        Self { phases }
    }

    /// Parse a catalog document, skipping malformed phase or option records.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not JSON, has no `phases` array, or
    /// no phase record survives parsing.
    pub fn from_json(json: &str) -> Result<(Self, Vec<SkippedRecord>), CatalogLoadError> {
        let root: Value = serde_json::from_str(json)?;
        let raw_phases = root
            .get("phases")
            .and_then(Value::as_array)
            .ok_or(CatalogLoadError::MissingPhases)?;

        let mut skipped = Vec::new();
        let mut phases = Vec::with_capacity(raw_phases.len());
        for (phase_index, raw_phase) in raw_phases.iter().enumerate() {
            let header = match PhaseHeader::deserialize(raw_phase) {
                Ok(header) => header,
                Err(err) => {
                    skipped.push(SkippedRecord::phase(phase_index, err.to_string()));
                    continue;
                }
            };
            let decisions = parse_choices(phase_index, &header.decisions, &mut skipped);
            phases.push(Phase {
                id: header.id,
                title: header.title,
                question: header.question,
                decisions,
            });
        }

        if phases.is_empty() {
            return Err(CatalogLoadError::Empty);
        }
        Ok((Self { phases }, skipped))
    }

    /// Minimal catalog used when the real one cannot be loaded: one phase with
    /// one option that changes nothing.
    #[must_use]
    pub fn fallback() -> Self {
        let choice = Choice::new(FALLBACK_OPTION_ID, FALLBACK_OPTION_TEXT, Effects::new())
            .with_description(FALLBACK_OPTION_DESCRIPTION);
        Self {
            phases: vec![Phase {
                id: FALLBACK_PHASE_ID,
                title: FALLBACK_PHASE_TITLE.to_string(),
                question: FALLBACK_PHASE_QUESTION.to_string(),
                decisions: vec![choice],
            }],
        }
    }

    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    #[must_use]
    pub fn phase(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

fn parse_choices(
    phase_index: usize,
    raw_choices: &[Value],
    skipped: &mut Vec<SkippedRecord>,
) -> Vec<Choice> {
    let mut seen = HashSet::new();
    let mut choices = Vec::with_capacity(raw_choices.len());
    for (option_index, raw_choice) in raw_choices.iter().enumerate() {
        match Choice::deserialize(raw_choice) {
            Ok(choice) if !seen.insert(choice.id.clone()) => {
                skipped.push(SkippedRecord::option(
                    phase_index,
                    option_index,
                    format!("duplicate option id `{}`", choice.id),
                ));
            }
            Ok(choice) => choices.push(choice),
            Err(err) => {
                skipped.push(SkippedRecord::option(
                    phase_index,
                    option_index,
                    err.to_string(),
                ));
            }
        }
    }
    choices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_from_json_parses_every_field() {
        let json = r#"{
            "phases": [
                {
                    "id": 1,
                    "title": "Island 1",
                    "question": "Pick one",
                    "decisions": [
                        {
                            "id": "A",
                            "text": "A) Negotiate",
                            "description": "Push suppliers",
                            "effects": { "Liquidez": 10, "Reputación": -5 },
                            "strategy_type": "aggressive",
                            "unlocks": "isla_4_E",
                            "requires": ["isla_0_X", "isla_0_Y"],
                            "synergy_with": "isla_0_X",
                            "synergy_bonus": { "Liquidez": 3 }
                        }
                    ]
                }
            ]
        }"#;

        let (catalog, skipped) = Catalog::from_json(json).unwrap();
        assert!(skipped.is_empty());
        assert_eq!(catalog.len(), 1);
        let choice = &catalog.phases()[0].decisions[0];
        assert_eq!(choice.effects.get("Liquidez"), Some(10));
        assert_eq!(choice.effects.get("Reputación"), Some(-5));
        assert_eq!(choice.unlocks.as_deref(), Some("isla_4_E"));
        assert_eq!(
            choice.requires.keys().collect::<Vec<_>>(),
            vec!["isla_0_X", "isla_0_Y"]
        );
        let (source, bonus) = choice.synergy().unwrap();
        assert_eq!(source, "isla_0_X");
        assert_eq!(bonus.get("Liquidez"), Some(3));
    }

    #[test]
    fn requires_accepts_string_list_and_null() {
        let one: Requires = serde_json::from_str(r#""isla_1_A""#).unwrap();
        let many: Requires = serde_json::from_str(r#"["isla_1_A", "isla_2_B"]"#).unwrap();
        let null: Requires = serde_json::from_str("null").unwrap();
        let blank: Requires = serde_json::from_str(r#""""#).unwrap();

        assert_eq!(one, Requires::all_of(["isla_1_A"]));
        assert_eq!(many, Requires::all_of(["isla_2_B", "isla_1_A"]));
        assert!(null.is_empty());
        assert!(blank.is_empty());
    }

    #[test]
    fn missing_optional_fields_default_to_empty() {
        let choice: Choice = serde_json::from_str(r#"{ "id": "B", "text": "B) Wait" }"#).unwrap();
        assert!(choice.effects.is_empty());
        assert!(choice.requires.is_empty());
        assert!(choice.unlocks.is_none());
        assert!(choice.synergy().is_none());
        assert_eq!(choice.description, "");
    }

    #[test]
    fn synergy_needs_both_halves() {
        let choice: Choice = serde_json::from_str(
            r#"{ "id": "C", "text": "C", "synergy_with": "isla_1_A" }"#,
        )
        .unwrap();
        assert!(choice.synergy().is_none());
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let json = r#"{
            "phases": [
                { "title": "no id" },
                {
                    "id": 2,
                    "title": "Island 2",
                    "question": "?",
                    "decisions": [
                        { "id": "A", "text": "ok", "effects": { "Liquidez": 1 } },
                        { "id": "B", "effects": { "Liquidez": 1 } },
                        { "id": "C", "text": "bad effects", "effects": { "Liquidez": "lots" } },
                        { "id": "A", "text": "dup" }
                    ]
                }
            ]
        }"#;

        let (catalog, skipped) = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.phases()[0].decisions.len(), 1);
        assert_eq!(skipped.len(), 4);
        assert_eq!(skipped[0].phase_index, 0);
        assert_eq!(skipped[0].option_index, None);
        assert_eq!(
            skipped
                .iter()
                .filter_map(|record| record.option_index)
                .collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert!(skipped[3].reason.contains("duplicate"));
    }

    #[test]
    fn null_optional_fields_read_as_empty() {
        let json = r#"{
            "phases": [
                {
                    "id": 1,
                    "title": "Island 1",
                    "question": null,
                    "decisions": [
                        { "id": "A", "text": "A)", "strategy_type": null, "effects": null },
                        { "id": "B", "text": "B)", "description": null, "unlocks": null }
                    ]
                },
                { "id": 2, "title": "Island 2", "decisions": null }
            ]
        }"#;

        let (catalog, skipped) = Catalog::from_json(json).unwrap();
        assert!(skipped.is_empty(), "{skipped:?}");
        assert_eq!(catalog.len(), 2);
        let phase = &catalog.phases()[0];
        assert_eq!(phase.question, "");
        assert_eq!(phase.decisions.len(), 2);
        assert_eq!(phase.decisions[0].strategy_type, "");
        assert!(phase.decisions[0].effects.is_empty());
        assert_eq!(phase.decisions[1].description, "");
        assert_eq!(phase.decisions[1].unlocks, None);
        assert!(catalog.phases()[1].decisions.is_empty());
    }

    #[test]
    fn document_level_failures_are_errors() {
        assert!(matches!(
            Catalog::from_json("not json"),
            Err(CatalogLoadError::Json(_))
        ));
        assert!(matches!(
            Catalog::from_json(r#"{ "islands": [] }"#),
            Err(CatalogLoadError::MissingPhases)
        ));
        assert!(matches!(
            Catalog::from_json(r#"{ "phases": [ { "title": 3 } ] }"#),
            Err(CatalogLoadError::Empty)
        ));
    }

    #[test]
    fn fallback_is_single_noop_phase() {
        let catalog = Catalog::fallback();
        assert_eq!(catalog.len(), 1);
        let phase = &catalog.phases()[0];
        assert_eq!(phase.id, 1);
        assert_eq!(phase.decisions.len(), 1);
        assert!(phase.decisions[0].effects.is_empty());
    }
}

//! Named business gauges and their severity levels.
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::EngineConfig;
use crate::constants::{INDICATOR_MAX, INDICATOR_MIN, WARNING_THRESHOLD};

/// Clamp a raw value into the indicator range.
#[must_use]
pub fn clamp_indicator(value: i32) -> i32 {
    value.clamp(INDICATOR_MIN, INDICATOR_MAX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub name: String,
    pub value: i32,
}

/// Current indicator values in display order.
///
/// Serializes as a `{ name: value }` map that keeps the display order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Indicators(Vec<Indicator>);

impl Indicators {
    /// Every named indicator starting at the same value.
    #[must_use]
    pub fn uniform<S: AsRef<str>>(names: &[S], value: i32) -> Self {
        let value = clamp_indicator(value);
        Self(
            names
                .iter()
                .map(|name| Indicator {
                    name: name.as_ref().to_string(),
                    value,
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<i32> {
        self.0
            .iter()
            .find(|indicator| indicator.name == name)
            .map(|indicator| indicator.value)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|indicator| indicator.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Indicator> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Add `delta` to a named indicator and clamp. Returns the clamped
    /// `(old, new)` pair, or `None` when the name is not tracked.
    pub(crate) fn apply_delta(&mut self, name: &str, delta: i32) -> Option<(i32, i32)> {
        let indicator = self.0.iter_mut().find(|indicator| indicator.name == name)?;
        let old = indicator.value;
        indicator.value = clamp_indicator(old.saturating_add(delta));
        Some((old, indicator.value))
    }

    /// Arithmetic mean of all values; `0.0` for an empty set.
    #[must_use]
    pub fn average(&self) -> f64 {
        if self.0.is_empty() {
            return 0.0;
        }
        let total: f64 = self.0.iter().map(|indicator| f64::from(indicator.value)).sum();
        #[allow(clippy::cast_precision_loss)]
        let count = self.0.len() as f64;
        total / count
    }

    /// Names of indicators strictly below `threshold`, in display order.
    #[must_use]
    pub fn below(&self, threshold: i32) -> Vec<String> {
        self.0
            .iter()
            .filter(|indicator| indicator.value < threshold)
            .map(|indicator| indicator.name.clone())
            .collect()
    }
}

impl Serialize for Indicators {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for indicator in &self.0 {
            map.serialize_entry(&indicator.name, &indicator.value)?;
        }
        map.end()
    }
}

/// Abstract severity for an indicator value. Front ends map these to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorLevel {
    /// Below the failure threshold; ends the run.
    Failed,
    /// Below the critical threshold; a warning only.
    Critical,
    Warning,
    Healthy,
}

impl IndicatorLevel {
    #[must_use]
    pub fn classify(value: i32, config: &EngineConfig) -> Self {
        if value < config.failure_threshold {
            Self::Failed
        } else if value < config.critical_threshold {
            Self::Critical
        } else if value < WARNING_THRESHOLD {
            Self::Warning
        } else {
            Self::Healthy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Indicators {
        Indicators::uniform(&["Liquidez", "Reputación", "Rentabilidad"], 50)
    }

    #[test]
    fn apply_delta_clamps_both_ends() {
        let mut indicators = sample();
        assert_eq!(indicators.apply_delta("Liquidez", 80), Some((50, 100)));
        assert_eq!(indicators.apply_delta("Reputación", -70), Some((50, 0)));
        assert_eq!(indicators.apply_delta("Rentabilidad", i32::MIN), Some((50, 0)));
        assert_eq!(indicators.apply_delta("Liquidez", i32::MAX), Some((100, 100)));
    }

    #[test]
    fn apply_delta_ignores_unknown_names() {
        let mut indicators = sample();
        assert_eq!(indicators.apply_delta("Morale", 10), None);
        assert_eq!(indicators, sample());
    }

    #[test]
    fn average_and_below() {
        let mut indicators = sample();
        indicators.apply_delta("Liquidez", -46);
        indicators.apply_delta("Reputación", -35);
        assert_eq!(indicators.below(5), vec!["Liquidez".to_string()]);
        assert_eq!(
            indicators.below(20),
            vec!["Liquidez".to_string(), "Reputación".to_string()]
        );
        assert!((indicators.average() - (4.0 + 15.0 + 50.0) / 3.0).abs() < f64::EPSILON);
        assert!(Indicators::default().average().abs() < f64::EPSILON);
    }

    #[test]
    fn serializes_as_ordered_map() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"Liquidez":50,"Reputación":50,"Rentabilidad":50}"#);
    }

    #[test]
    fn classify_levels() {
        let config = EngineConfig::default();
        assert_eq!(IndicatorLevel::classify(0, &config), IndicatorLevel::Failed);
        assert_eq!(IndicatorLevel::classify(4, &config), IndicatorLevel::Failed);
        assert_eq!(IndicatorLevel::classify(5, &config), IndicatorLevel::Critical);
        assert_eq!(IndicatorLevel::classify(19, &config), IndicatorLevel::Critical);
        assert_eq!(IndicatorLevel::classify(20, &config), IndicatorLevel::Warning);
        assert_eq!(IndicatorLevel::classify(49, &config), IndicatorLevel::Warning);
        assert_eq!(IndicatorLevel::classify(50, &config), IndicatorLevel::Healthy);
    }
}

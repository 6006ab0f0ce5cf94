//! bizsim Game Engine
//!
//! Platform-agnostic decision engine for a phase-by-phase business strategy
//! simulation. Each phase offers options whose effects move a fixed set of
//! indicators; earlier picks gate later options and trigger one-shot synergies.
//! This crate holds the rules only: no UI and no persistence.

pub mod catalog;
pub mod config;
pub mod constants;
pub mod data;
pub mod indicators;
pub mod outcome;
pub mod result;
pub mod session;
pub mod state;
pub mod trace;

use std::sync::Arc;

// Re-export commonly used types
pub use catalog::{
    CatalogLoadError, CatalogSource, FileCatalogLoader, JsonCatalogLoader, LoadedCatalog,
    SkippedRecord,
};
pub use config::{ConfigError, EngineConfig};
pub use data::{Catalog, Choice, Effects, Phase, Requires};
pub use indicators::{Indicator, IndicatorLevel, Indicators, clamp_indicator};
pub use outcome::{
    DecisionOutcome, EffectChange, IndicatorSnapshot, Progress, VisibleOption, VisiblePhase,
};
pub use result::{FinalResults, ScoreBands, ScoreCategory, final_results};
pub use session::{DecisionError, DecisionSession};
pub use state::{RunState, RunStatus, history_key, synergy_activation_id};
pub use trace::{EventSeverity, GateDecision, RuleEvent};

/// Trait for abstracting catalog loading.
/// Platform-specific front ends can provide their own source.
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load and parse the phase catalog, reporting records that were skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable catalog can be produced.
    fn load_catalog(&self) -> Result<(Catalog, Vec<SkippedRecord>), Self::Error>;
}

/// Main game engine: loads the catalog once and hands out independent runs.
pub struct GameEngine<L>
where
    L: CatalogLoader,
{
    loader: L,
    loaded: LoadedCatalog,
    config: EngineConfig,
}

impl<L> GameEngine<L>
where
    L: CatalogLoader,
{
    /// Load the catalog through `loader`, falling back to the built-in catalog
    /// when it cannot be read.
    pub fn new(loader: L) -> Self {
        let loaded = Catalog::load_or_fallback(&loader);
        Self {
            loader,
            loaded,
            config: EngineConfig::default(),
        }
    }

    /// Like [`GameEngine::new`] with a custom rule configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration breaks an invariant.
    pub fn with_config(loader: L, config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut engine = Self::new(loader);
        engine.config = config;
        Ok(engine)
    }

    /// Catalog in use together with how it was obtained.
    pub const fn loaded(&self) -> &LoadedCatalog {
        &self.loaded
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub const fn loader(&self) -> &L {
        &self.loader
    }

    /// Re-run the loader and swap in the new catalog. Sessions already
    /// created keep the catalog they started with.
    pub fn reload(&mut self) -> &LoadedCatalog {
        self.loaded = Catalog::load_or_fallback(&self.loader);
        &self.loaded
    }

    /// Start a fresh run over the loaded catalog.
    #[must_use]
    pub fn new_session(&self) -> DecisionSession {
        DecisionSession::from_validated(Arc::clone(&self.loaded.catalog), self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::convert::Infallible;

    #[derive(Default)]
    struct CountingLoader {
        calls: Cell<u32>,
    }

    impl CatalogLoader for CountingLoader {
        type Error = Infallible;

        fn load_catalog(&self) -> Result<(Catalog, Vec<SkippedRecord>), Self::Error> {
            self.calls.set(self.calls.get() + 1);
            Ok((Catalog::fallback(), Vec::new()))
        }
    }

    #[test]
    fn engine_creates_independent_sessions() {
        let engine = GameEngine::new(JsonCatalogLoader::bundled());
        assert!(!engine.loaded().used_fallback());
        let mut first = engine.new_session();
        let second = engine.new_session();
        first.apply_decision(0).unwrap();
        assert_eq!(first.progress().phase_index, 1);
        assert_eq!(second.progress().phase_index, 0);
        assert!(second.history().is_empty());
    }

    #[test]
    fn engine_falls_back_on_bad_source() {
        let engine = GameEngine::new(JsonCatalogLoader::new("[]"));
        assert!(engine.loaded().used_fallback());
        let mut session = engine.new_session();
        let outcome = session.apply_decision(0).unwrap();
        assert!(outcome.game_completed);
        assert!(outcome.effects.is_empty());
    }

    #[test]
    fn reload_calls_loader_again() {
        let mut engine = GameEngine::new(CountingLoader::default());
        assert_eq!(engine.loader().calls.get(), 1);
        engine.reload();
        assert_eq!(engine.loader().calls.get(), 2);
    }

    #[test]
    fn with_config_validates_and_applies() {
        let config = EngineConfig {
            initial_value: 70,
            ..EngineConfig::default()
        };
        let engine = GameEngine::with_config(JsonCatalogLoader::bundled(), config).unwrap();
        let session = engine.new_session();
        assert_eq!(session.indicators().get("Liquidez"), Some(70));
        assert_eq!(session.final_results().category, ScoreCategory::Excellent);

        let broken = EngineConfig {
            failure_threshold: 50,
            ..EngineConfig::default()
        };
        assert!(GameEngine::with_config(JsonCatalogLoader::bundled(), broken).is_err());
    }
}

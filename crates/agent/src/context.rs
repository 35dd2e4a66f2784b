//! Explicit turn context: every collaborator a turn touches.
//!
//! Nothing in a turn reaches for global state: the perception source, the
//! dispatch sink, slot storage, the step computer, retrieval, randomness and
//! the event bus all travel in a [`TurnContext`].

use std::sync::Arc;

use soulturn_config::AppConfig;
use soulturn_core::cognition::StepComputer;
use soulturn_core::dispatch::DispatchSink;
use soulturn_core::error::RetrievalError;
use soulturn_core::event::EventBus;
use soulturn_core::memory::SlotStore;
use soulturn_core::perception::PendingPerceptions;
use soulturn_core::retrieval::{NoRetrieval, Retriever};
use soulturn_memory::{FileSlots, InMemorySlots, KnowledgeStore, NoopSlots};
use tracing::info;

use crate::random::{RandomSource, SeededRandom, ThreadRandom};

/// Tunables of the turn policy.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// The soul's name, used in prompts and memories
    pub soul_name: String,
    /// Backlog ceiling; admission proceeds while pending ≤ this
    pub max_pending_perceptions: usize,
    pub max_message_parts: usize,
    pub avg_words_per_message: usize,
    /// Per-part word ceilings vary in `[avg - jitter, avg + jitter)`
    pub word_jitter: usize,
    pub thought_to_speech_ratio: f64,
    /// Probability of joining in when the addressee is unclear
    pub chime_in_probability: f64,
    pub reaction_probability: f64,
    /// Content that simulates a join outside the live platform
    pub welcome_sentinel: String,
    pub rag_topics: String,
    /// Emotion assumed until the emotional-state slot is written
    pub default_emotion: String,
    pub welcome: WelcomeSettings,
}

/// Facts every welcome message must mention.
#[derive(Debug, Clone)]
pub struct WelcomeSettings {
    pub areas: Vec<String>,
    pub current_area: String,
    pub recommended_area: String,
    pub holder_area: String,
    pub holder_verify_channel: String,
}

impl TurnSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let turn = &config.turn;
        let welcome = &config.welcome;
        Self {
            soul_name: config.soul.name.clone(),
            max_pending_perceptions: turn.max_pending_perceptions,
            max_message_parts: turn.max_message_parts,
            avg_words_per_message: turn.avg_words_per_message,
            word_jitter: turn.word_jitter,
            thought_to_speech_ratio: turn.thought_to_speech_ratio,
            chime_in_probability: turn.chime_in_probability,
            reaction_probability: turn.reaction_probability,
            welcome_sentinel: turn.welcome_sentinel.clone(),
            rag_topics: turn.rag_topics.clone(),
            default_emotion: turn.default_emotion.clone(),
            welcome: WelcomeSettings {
                areas: welcome.areas.clone(),
                current_area: welcome.current_area.clone(),
                recommended_area: welcome.recommended_area.clone(),
                holder_area: welcome.holder_area.clone(),
                holder_verify_channel: welcome.holder_verify_channel.clone(),
            },
        }
    }
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Everything one turn needs, passed explicitly.
#[derive(Clone)]
pub struct TurnContext {
    pub perceptions: Arc<dyn PendingPerceptions>,
    pub sink: Arc<dyn DispatchSink>,
    pub slots: Arc<dyn SlotStore>,
    pub computer: Arc<dyn StepComputer>,
    pub retriever: Arc<dyn Retriever>,
    pub rng: Arc<dyn RandomSource>,
    pub events: Arc<EventBus>,
    pub settings: Arc<TurnSettings>,
}

impl TurnContext {
    /// Build a context with default settings, no retrieval and OS randomness.
    pub fn new(
        perceptions: Arc<dyn PendingPerceptions>,
        sink: Arc<dyn DispatchSink>,
        slots: Arc<dyn SlotStore>,
        computer: Arc<dyn StepComputer>,
    ) -> Self {
        Self {
            perceptions,
            sink,
            slots,
            computer,
            retriever: Arc::new(NoRetrieval),
            rng: Arc::new(ThreadRandom),
            events: Arc::new(EventBus::default()),
            settings: Arc::new(TurnSettings::default()),
        }
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn with_rng(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn with_settings(mut self, settings: TurnSettings) -> Self {
        self.settings = Arc::new(settings);
        self
    }

    /// Apply a configuration: settings, plus a seeded RNG if `turn.seed` is set.
    pub fn configured(self, config: &AppConfig) -> Self {
        let ctx = self.with_settings(TurnSettings::from_config(config));
        match config.turn.seed {
            Some(seed) => ctx.with_rng(Arc::new(SeededRandom::new(seed))),
            None => ctx,
        }
    }

    pub fn soul_name(&self) -> &str {
        &self.settings.soul_name
    }
}

/// Create the slot store named by `memory.backend`.
pub fn build_slot_store(config: &AppConfig) -> Arc<dyn SlotStore> {
    let store: Arc<dyn SlotStore> = match config.memory.backend.as_str() {
        "file" => Arc::new(FileSlots::new(config.slots_path())),
        "none" => Arc::new(NoopSlots),
        _ => Arc::new(InMemorySlots::new()),
    };
    info!(backend = store.name(), "Slot store ready");
    store
}

/// Create the retriever: a knowledge store if `knowledge.path` is set.
pub fn build_retriever(config: &AppConfig) -> Result<Arc<dyn Retriever>, RetrievalError> {
    match &config.knowledge.path {
        Some(path) => Ok(Arc::new(KnowledgeStore::from_file(path, config.knowledge.limit)?)),
        None => Ok(Arc::new(NoRetrieval)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let mut config = AppConfig::default();
        config.soul.name = "Zed".into();
        config.turn.max_message_parts = 5;
        config.welcome.holder_verify_channel = "#verify".into();

        let settings = TurnSettings::from_config(&config);
        assert_eq!(settings.soul_name, "Zed");
        assert_eq!(settings.max_message_parts, 5);
        assert_eq!(settings.welcome.holder_verify_channel, "#verify");
    }

    #[test]
    fn slot_store_follows_backend() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        assert_eq!(build_slot_store(&config).name(), "in_memory");

        config.memory.backend = "none".into();
        assert_eq!(build_slot_store(&config).name(), "none");

        config.memory.backend = "file".into();
        config.memory.path = Some(dir.path().join("slots.json"));
        assert_eq!(build_slot_store(&config).name(), "file");
    }

    #[test]
    fn retriever_defaults_to_none() {
        let config = AppConfig::default();
        assert_eq!(build_retriever(&config).unwrap().name(), "none");

        let mut config = AppConfig::default();
        config.knowledge.path = Some("/nonexistent/knowledge.toml".into());
        assert!(build_retriever(&config).is_err());
    }

    #[test]
    fn defaults_match_turn_policy() {
        let settings = TurnSettings::default();
        assert_eq!(settings.max_pending_perceptions, 10);
        assert_eq!(settings.max_message_parts, 3);
        assert_eq!(settings.avg_words_per_message, 40);
        assert_eq!(settings.word_jitter, 20);
        assert!((settings.thought_to_speech_ratio - 1.2).abs() < f64::EPSILON);
        assert_eq!(settings.welcome.current_area, "welcome area");
    }
}

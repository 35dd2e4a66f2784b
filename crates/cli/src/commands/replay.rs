//! `soulturn replay`: Drive a scripted session through the turn coordinator.
//!
//! A session file lists the perceptions to enqueue and the scripted answers
//! the step computer gives:
//!
//! ```toml
//! soul = "Julio"
//! random = [0.9]
//!
//! [slots]
//! alice = "- Display name: \"Alice\""
//!
//! [[perceptions]]
//! action = "said"
//! name = "alice"
//! content = "hey julio"
//!
//! [[script]]
//! kind = "decide"
//! responses = ["julio"]
//! ```
//!
//! All perceptions are queued before the first turn starts, so later ones
//! are pending while earlier ones are handled.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use soulturn_agent::{
    build_retriever, build_slot_store, FixedRandom, RecordedAction, RecordingSink, ScriptRule,
    ScriptedComputer, SoulRuntime, TurnContext, TurnDisposition, TurnOutcome,
};
use soulturn_config::AppConfig;
use soulturn_core::error::Error;
use soulturn_core::memory::SlotStore;
use soulturn_core::perception::{Perception, PerceptionQueue};
use tracing::info;

use super::config_cmd;

/// A replayable session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    /// Overrides `soul.name`
    #[serde(default)]
    pub soul: Option<String>,

    /// Overrides `turn.seed`
    #[serde(default)]
    pub seed: Option<u64>,

    /// Fixed random draws, cycled; takes precedence over any seed
    #[serde(default)]
    pub random: Vec<f64>,

    /// Slot values written before the first turn
    #[serde(default)]
    pub slots: BTreeMap<String, serde_json::Value>,

    #[serde(default)]
    pub perceptions: Vec<Perception>,

    #[serde(default)]
    pub script: Vec<ScriptRule>,
}

impl Session {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse session {}", path.display()))
    }
}

/// What a replay produced.
pub struct ReplayReport {
    pub turns: Vec<(Perception, Result<TurnOutcome, Error>)>,
    /// Every dispatched action, streams fully drained
    pub actions: Vec<RecordedAction>,
    /// Number of step computations performed
    pub computations: usize,
}

/// Run `session` to completion.
pub async fn replay(config: &AppConfig, session: Session) -> anyhow::Result<ReplayReport> {
    let mut config = config.clone();
    if let Some(soul) = session.soul {
        config.soul.name = soul;
    }
    if session.seed.is_some() {
        config.turn.seed = session.seed;
    }

    let slots = build_slot_store(&config);
    for (key, value) in session.slots {
        slots
            .save(&key, value)
            .with_context(|| format!("failed to preset slot {key}"))?;
    }
    let retriever = build_retriever(&config).context("failed to load knowledge")?;

    let queue = PerceptionQueue::new();
    for perception in session.perceptions {
        queue.push(perception);
    }

    let sink = Arc::new(RecordingSink::new());
    let computer = Arc::new(ScriptedComputer::new(session.script));
    let mut ctx = TurnContext::new(Arc::new(queue.clone()), sink.clone(), slots, computer.clone())
        .configured(&config)
        .with_retriever(retriever);
    if !session.random.is_empty() {
        ctx = ctx.with_rng(Arc::new(FixedRandom::new(session.random)));
    }

    info!(soul = %config.soul.name, perceptions = queue.len(), "Replaying session");
    let mut runtime = SoulRuntime::new(queue, ctx);
    let turns = runtime.drain().await;
    sink.settled().await;

    Ok(ReplayReport {
        turns,
        actions: sink.actions(),
        computations: computer.calls().len(),
    })
}

fn describe(disposition: &TurnDisposition) -> String {
    match disposition {
        TurnDisposition::Skipped(reason) => format!("skipped ({})", reason.as_str()),
        TurnDisposition::Abandoned(reason) => format!("abandoned ({})", reason.as_str()),
        TurnDisposition::Welcomed { parts } => format!("welcomed in {parts} part(s)"),
        TurnDisposition::Replied { parts } => format!("replied in {parts} part(s)"),
    }
}

pub async fn run(path: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = config_cmd::load(config_path)?;
    let session = Session::from_file(path)?;
    let report = replay(&config, session).await?;

    println!("🎬 Turns");
    for (i, (perception, result)) in report.turns.iter().enumerate() {
        let outcome = match result {
            Ok(outcome) => describe(&outcome.disposition),
            Err(e) => format!("failed: {e}"),
        };
        println!(
            "   {:>2}. {}: {:?} → {outcome}",
            i + 1,
            perception.user_name(),
            perception.content
        );
    }

    println!();
    println!("📤 Actions");
    if report.actions.is_empty() {
        println!("   (none)");
    }
    for action in &report.actions {
        println!(
            "   {} [{}] {}",
            action.kind.as_str(),
            action.send_as.as_str(),
            action.text
        );
    }

    println!();
    println!("   {} step computation(s)", report.computations);
    Ok(())
}

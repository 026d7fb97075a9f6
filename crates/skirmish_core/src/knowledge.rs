//! Knowledge shared by every agent instance of a process.
//!
//! The first agent to [`join`](SharedKnowledge::join) builds the
//! [`BuildTree`] and loads learned data (or falls back to defaults). The
//! last agent to [`leave`](SharedKnowledge::leave) writes learned data back
//! and releases the tables. Instance counting is explicit; there are no
//! process globals.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{info, warn};

use crate::config::AiConfig;
use crate::data::FactionData;
use crate::error::Result;
use crate::learning::{
    AttackedByRates, GamePhase, GamePhaseRates, LearnedData, MapType, LEARNED_DATA_FORMAT,
};
use crate::registry::BuildTree;

/// What an agent receives on joining.
#[derive(Debug, Clone)]
pub struct KnowledgeView {
    tree: Arc<BuildTree>,
    rates: Arc<RwLock<AttackedByRates>>,
}

impl KnowledgeView {
    /// The shared unit tables.
    #[must_use]
    pub fn tree(&self) -> Arc<BuildTree> {
        Arc::clone(&self.tree)
    }

    /// A copy of the current attacked-by rates.
    #[must_use]
    pub fn attacked_by_rates(&self) -> AttackedByRates {
        *self.rates.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Default)]
struct State {
    instances: usize,
    view: Option<KnowledgeView>,
}

/// Process-wide unit tables and learned statistics.
#[derive(Debug)]
pub struct SharedKnowledge {
    factions: Vec<FactionData>,
    learn_path: Option<PathBuf>,
    rate_decay: f32,
    state: Mutex<State>,
}

impl SharedKnowledge {
    /// Create the shared store. Nothing is loaded until the first join.
    #[must_use]
    pub fn new(factions: Vec<FactionData>, learn_path: Option<PathBuf>, rate_decay: f32) -> Self {
        Self {
            factions,
            learn_path,
            rate_decay,
            state: Mutex::new(State::default()),
        }
    }

    /// Create the shared store with the decay from `config`.
    #[must_use]
    pub fn from_config(
        factions: Vec<FactionData>,
        learn_path: Option<PathBuf>,
        config: &AiConfig,
    ) -> Self {
        Self::new(factions, learn_path, config.rating.learned_rate_decay)
    }

    /// Number of agents currently joined.
    #[must_use]
    pub fn instances(&self) -> usize {
        self.lock().instances
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an agent. The first one builds the tables.
    ///
    /// # Errors
    /// Returns an error if the rosters are inconsistent. Learned data
    /// problems are not errors; they fall back to defaults.
    pub fn join(&self) -> Result<KnowledgeView> {
        let mut state = self.lock();
        let view = match &state.view {
            Some(view) => view.clone(),
            None => {
                let view = self.load()?;
                state.view = Some(view.clone());
                view
            }
        };
        state.instances += 1;
        info!(instances = state.instances, "Agent joined shared knowledge");
        Ok(view)
    }

    fn load(&self) -> Result<KnowledgeView> {
        let tree = BuildTree::from_factions(&self.factions)?;

        let learned = self.learn_path.as_ref().and_then(|path| {
            LearnedData::load(path, LEARNED_DATA_FORMAT, tree.len())
                .map_err(|e| warn!(path = %path.display(), error = %e, "Using default learned data"))
                .ok()
        });

        let (tree, rates) = match learned {
            Some(data) => {
                info!("Loaded learned data");
                (tree.with_combat_power(data.combat_power), data.attacked_by_rates)
            }
            None => (tree, AttackedByRates::default()),
        };

        Ok(KnowledgeView {
            tree: Arc::new(tree),
            rates: Arc::new(RwLock::new(rates)),
        })
    }

    /// Unregister an agent and merge the rates it observed.
    ///
    /// The last agent to leave saves learned data (if a path is configured)
    /// and releases the tables.
    ///
    /// # Errors
    /// Returns an error if saving fails. The tables are released regardless.
    pub fn leave(
        &self,
        map: MapType,
        reached: GamePhase,
        observed: &GamePhaseRates,
    ) -> Result<()> {
        let mut state = self.lock();
        let Some(view) = state.view.clone() else {
            warn!("Leave without matching join");
            return Ok(());
        };

        view.rates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge_game(map, reached, observed, self.rate_decay);

        state.instances = state.instances.saturating_sub(1);
        if state.instances > 0 {
            return Ok(());
        }
        state.view = None;
        drop(state);

        if let Some(path) = &self.learn_path {
            let data = LearnedData {
                format_tag: LEARNED_DATA_FORMAT.to_string(),
                attacked_by_rates: view.attacked_by_rates(),
                combat_power: view.tree.combat_power_table().to_vec(),
            };
            data.save(path)?;
            info!(path = %path.display(), "Saved learned data");
        }
        Ok(())
    }
}

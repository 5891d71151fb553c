//! Without-replacement sampling over the files of one source directory.
use std::collections::{BTreeMap, BTreeSet};

use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::history::Timestamp;

/// Sampler state for every source directory, keyed by directory path.
pub type SamplerBook = BTreeMap<String, SamplerState>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerPhase {
    Empty,
    Sampling,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetCause {
    PopulationChanged,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawOutcome {
    pub pick: Option<String>,
    pub reset: Option<ResetCause>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SamplerState {
    pub all_known: BTreeSet<String>,
    pub drawn: BTreeSet<String>,
    pub timestamp: Timestamp,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SamplerState {
    pub fn phase(&self) -> SamplerPhase {
        if self.all_known.is_empty() {
            SamplerPhase::Empty
        } else if self.drawn.is_superset(&self.all_known) {
            SamplerPhase::Exhausted
        } else {
            SamplerPhase::Sampling
        }
    }

    pub fn remaining(&self) -> usize {
        self.all_known.difference(&self.drawn).count()
    }

    pub fn reset(&mut self) {
        self.drawn.clear();
    }

    /// Adopt a freshly enumerated population. Any difference from the known
    /// set clears `drawn`; returns whether that happened.
    pub fn sync_population(&mut self, population: BTreeSet<String>) -> bool {
        if population == self.all_known {
            let known = &self.all_known;
            self.drawn.retain(|path| known.contains(path));
            return false;
        }
        self.all_known = population;
        self.drawn.clear();
        true
    }

    /// Pick uniformly among the not-yet-drawn members of `population`.
    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        population: BTreeSet<String>,
        rng: &mut R,
        now: Timestamp,
    ) -> DrawOutcome {
        let mut reset = self
            .sync_population(population)
            .then_some(ResetCause::PopulationChanged);

        if self.phase() == SamplerPhase::Empty {
            return DrawOutcome { pick: None, reset };
        }
        if self.phase() == SamplerPhase::Exhausted {
            self.reset();
            reset = reset.or(Some(ResetCause::Exhausted));
        }

        let pick = self
            .all_known
            .difference(&self.drawn)
            .choose(rng)
            .cloned();
        if let Some(path) = &pick {
            self.drawn.insert(path.clone());
            self.timestamp = now;
        }
        DrawOutcome { pick, reset }
    }
}

/// Clear `drawn` for every directory.
pub fn reset_all(book: &mut SamplerBook) {
    for state in book.values_mut() {
        state.reset();
    }
}

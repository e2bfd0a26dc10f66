//! Replays recorded interactions from a cassette.

use std::collections::{HashMap, VecDeque};

use super::format::{Cassette, Interaction};

/// Replays interactions from a loaded cassette, serving them in recorded
/// order per port/method pair.
pub struct CassetteReplayer {
    queues: HashMap<(String, String), VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<(String, String), VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push_back(interaction.clone());
        }
        Self { queues }
    }

    /// Take the next interaction for the given port and method.
    ///
    /// # Panics
    ///
    /// Panics if the cassette has no (more) interactions for the given
    /// port/method combination, listing what is still available.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Interaction {
        let key = (port.to_string(), method.to_string());
        if let Some(interaction) = self.queues.get_mut(&key).and_then(VecDeque::pop_front) {
            return interaction;
        }

        let mut available: Vec<String> = self
            .queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|((p, m), queue)| format!("{p}::{m} ({})", queue.len()))
            .collect();
        available.sort();
        panic!(
            "Cassette exhausted: no interactions left for port={port:?} method={method:?}. \
             Remaining: [{}]",
            available.join(", ")
        );
    }

    /// Number of interactions not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}

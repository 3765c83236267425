//! Autoconnect candidate list.
//!
//! Rebuilt after every scan cycle while the station is in autoconnect
//! mode. Only known networks become candidates; each contributes its best
//! access point, weighted by the network's trust modifier. Candidates with
//! equal effective rank keep the catalogue's rank order.

use log::debug;
use std::collections::VecDeque;

use crate::core::catalogue::Catalogue;
use crate::core::link::CredentialStore;

/// One connect attempt the selector may make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Access point rank weighted by the network's trust modifier
    pub effective_rank: u32,
    /// Path of the network
    pub network: String,
    /// Address of the network's best access point
    pub bss: [u8; 6],
}

/// Candidates by descending effective rank, consumed head first.
#[derive(Debug, Default)]
pub struct AutoconnectQueue {
    entries: VecDeque<Candidate>,
}

impl AutoconnectQueue {
    pub(crate) fn build(catalogue: &Catalogue, store: &dyn CredentialStore) -> Self {
        let mut entries: Vec<Candidate> = catalogue
            .ranked()
            .filter_map(|network| {
                let modifier = store.rank_modifier(network.ssid(), network.security())?;
                let best = network.best_bss()?;
                Some(Candidate {
                    effective_rank: (f64::from(best.rank) * modifier) as u32,
                    network: network.path().to_string(),
                    bss: best.addr,
                })
            })
            .collect();

        entries.sort_by(|a, b| b.effective_rank.cmp(&a.effective_rank));
        debug!("{} autoconnect candidates", entries.len());

        Self {
            entries: entries.into(),
        }
    }

    /// Takes the next candidate. It is never offered again.
    pub(crate) fn pop(&mut self) -> Option<Candidate> {
        self.entries.pop_front()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter()
    }
}

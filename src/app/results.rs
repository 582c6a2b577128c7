//! The in-progress result set for one resolution call.
//!
//! Every accept-or-update path runs inside one critical section (the
//! session's mutex around [`ResultSet`]), so the dedup check-and-insert is
//! atomic and the poster/overview guards are check-then-write.

use std::collections::HashMap;

use crate::app::images::{is_empty_poster, upscale};
use crate::app::overview::OverviewSource;
use crate::app::types::{Film, FilmStub};

/// Lifecycle of one resolution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Discovering,
    Enriching,
    Finalizing,
    Done,
}

/// Outcome of offering a stub to the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    Added { fetch_overview: bool },
    Duplicate,
    CapReached,
    Rejected,
}

#[derive(Debug)]
struct Entry {
    film: Film,
    poster_resolved: bool,
    overview_source: Option<OverviewSource>,
}

#[derive(Debug)]
pub struct ResultSet {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    cap: usize,
    overview_budget: usize,
    phase: SessionPhase,
}

impl ResultSet {
    pub fn new(cap: usize, overview_budget: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            cap,
            overview_budget,
            phase: SessionPhase::Idle,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: SessionPhase) {
        self.phase = phase;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.cap
    }

    /// Dedup, cap check and append in one step.
    ///
    /// Films past the cap are dropped, not queued. The inline listing poster
    /// is kept as a starting value but does not count as resolved.
    pub fn accept(&mut self, stub: FilmStub) -> Accepted {
        if self.phase == SessionPhase::Done || stub.identity.is_empty() || stub.name.is_empty() {
            return Accepted::Rejected;
        }
        if self.index.contains_key(&stub.identity) {
            return Accepted::Duplicate;
        }
        if self.is_full() {
            return Accepted::CapReached;
        }

        let inline = upscale(&stub.inline_poster);
        let poster_url = if is_empty_poster(&inline) {
            String::new()
        } else {
            inline
        };

        self.index.insert(stub.identity.clone(), self.entries.len());
        self.entries.push(Entry {
            film: stub.into_film(poster_url),
            poster_resolved: false,
            overview_source: None,
        });

        Accepted::Added {
            fetch_overview: self.entries.len() <= self.overview_budget,
        }
    }

    /// Stores a resolved poster unless one is already resolved.
    ///
    /// This is also the landing point for fast-path fetches that lost their
    /// timeout race: once a poster is resolved, or the set has been
    /// finalized, their late write is a no-op.
    pub fn offer_poster(&mut self, identity: &str, candidate: &str) -> bool {
        if is_empty_poster(candidate) {
            return false;
        }
        let Some(entry) = self.entry_mut(identity) else {
            return false;
        };
        if entry.poster_resolved {
            return false;
        }

        entry.film.poster_url = candidate.to_string();
        entry.poster_resolved = true;
        true
    }

    pub fn has_resolved_poster(&self, identity: &str) -> bool {
        self.index
            .get(identity)
            .and_then(|idx| self.entries.get(*idx))
            .is_some_and(|entry| entry.poster_resolved)
    }

    /// Stores an overview unless an equal-or-higher priority source already
    /// wrote one. Same-priority writes replace each other.
    pub fn offer_overview(&mut self, identity: &str, source: OverviewSource, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let Some(entry) = self.entry_mut(identity) else {
            return false;
        };
        if entry.overview_source.is_some_and(|current| current < source) {
            return false;
        }

        entry.film.overview = text.to_string();
        entry.overview_source = Some(source);
        true
    }

    /// Substitutes the placeholder for unresolved posters and hands out the
    /// films in discovery order. The set is empty afterwards.
    pub fn finalize(&mut self, placeholder: &str) -> Vec<Film> {
        self.phase = SessionPhase::Finalizing;
        self.index.clear();
        let films = std::mem::take(&mut self.entries)
            .into_iter()
            .map(|entry| {
                let mut film = entry.film;
                if is_empty_poster(&film.poster_url) {
                    film.poster_url = placeholder.to_string();
                }
                film
            })
            .collect();
        self.phase = SessionPhase::Done;
        films
    }

    fn entry_mut(&mut self, identity: &str) -> Option<&mut Entry> {
        let idx = *self.index.get(identity)?;
        self.entries.get_mut(idx)
    }
}

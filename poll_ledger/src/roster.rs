use std::collections::HashMap;
use std::collections::HashSet;

use log::{debug, info};

use crate::model::{BatchOutcome, Candidate, CandidateId, LedgerError, SortOrder};
use crate::validate;

/// The flat single-choice election: a roster of candidates, their
/// running tallies, and the append-only vote history that backs undo.
///
/// Candidates live in a dense vector in insertion order; the
/// id-to-position index is a derived cache rebuilt after every
/// structural change, so lookups stay O(1) while iteration order is
/// preserved for presentation and for the majority scan.
#[derive(Debug, Clone, Default)]
pub struct CandidateRoster {
    candidates: Vec<Candidate>,
    index: HashMap<CandidateId, usize>,
    // One entry per single vote cast, in cast order. Append-only
    // except for undo, which pops from the end. Entries for
    // since-deleted candidates stay: the history is an audit trail,
    // not a mirror of the tallies.
    history: Vec<CandidateId>,
}

impl CandidateRoster {
    pub fn new() -> CandidateRoster {
        CandidateRoster::default()
    }

    // The index must reflect `candidates` exactly after any change
    // that shifts positions.
    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, c) in self.candidates.iter().enumerate() {
            self.index.insert(c.id, pos);
        }
    }

    /// Registers a new zero-vote candidate.
    pub fn add_candidate(
        &mut self,
        id: CandidateId,
        name: &str,
        department: Option<&str>,
    ) -> Result<(), LedgerError> {
        if id == 0 {
            return Err(LedgerError::InvalidId);
        }
        if !validate::is_valid_candidate_name(name) {
            return Err(LedgerError::InvalidName);
        }
        if self.index.contains_key(&id) {
            return Err(LedgerError::DuplicateCandidate);
        }
        self.candidates.push(Candidate {
            id,
            name: name.to_string(),
            department: department.map(|d| d.to_string()),
            vote_count: 0,
        });
        self.rebuild_index();
        debug!("add_candidate: id {} added, roster size {}", id, self.candidates.len());
        Ok(())
    }

    /// Overwrites name and department in place, keeping the vote
    /// count and the roster position.
    pub fn modify_candidate(
        &mut self,
        id: CandidateId,
        new_name: &str,
        new_department: Option<&str>,
    ) -> Result<(), LedgerError> {
        let pos = *self.index.get(&id).ok_or(LedgerError::UnknownCandidate)?;
        if !validate::is_valid_candidate_name(new_name) {
            return Err(LedgerError::InvalidName);
        }
        let c = &mut self.candidates[pos];
        c.name = new_name.to_string();
        c.department = new_department.map(|d| d.to_string());
        debug!("modify_candidate: id {} renamed", id);
        Ok(())
    }

    /// Removes a candidate. Past history entries for this id are kept
    /// as dangling audit entries and no longer affect any tally.
    pub fn delete_candidate(&mut self, id: CandidateId) -> Result<(), LedgerError> {
        let pos = *self.index.get(&id).ok_or(LedgerError::UnknownCandidate)?;
        self.candidates.remove(pos);
        self.rebuild_index();
        debug!("delete_candidate: id {} removed, roster size {}", id, self.candidates.len());
        Ok(())
    }

    pub fn candidate(&self, id: CandidateId) -> Option<&Candidate> {
        self.index.get(&id).map(|&pos| &self.candidates[pos])
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Applies a vote vector cumulatively.
    ///
    /// Every id is appended to the history; ids matching a live
    /// candidate increment its tally, the rest are reported as
    /// invalid. Prior tallies are never cleared here; callers wanting
    /// a fresh count call [`CandidateRoster::reset_votes`] first.
    pub fn apply_vote_vector(&mut self, votes: &[CandidateId]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for &vid in votes {
            self.history.push(vid);
            match self.index.get(&vid) {
                Some(&pos) => {
                    self.candidates[pos].vote_count += 1;
                    outcome.applied += 1;
                }
                None => outcome.invalid += 1,
            }
        }
        info!(
            "apply_vote_vector: {} applied, {} invalid, history length {}",
            outcome.applied,
            outcome.invalid,
            self.history.len()
        );
        outcome
    }

    /// Casts a single vote. On failure nothing is recorded, not even
    /// a history entry.
    pub fn cast_vote(&mut self, id: CandidateId) -> Result<(), LedgerError> {
        let pos = *self.index.get(&id).ok_or(LedgerError::UnknownCandidate)?;
        self.candidates[pos].vote_count += 1;
        self.history.push(id);
        Ok(())
    }

    /// The majority winner: the candidate whose tally strictly
    /// exceeds half of all cast votes, or `None` when no one does.
    ///
    /// A direct O(n) scan in roster order. At most one candidate can
    /// clear the strict-majority threshold, so first match wins.
    pub fn find_winner(&self) -> Option<CandidateId> {
        let total = self.total_votes();
        if total == 0 {
            return None;
        }
        self.candidates
            .iter()
            .find(|c| c.vote_count > total / 2)
            .map(|c| c.id)
    }

    /// Reverses the most recent vote: pops the newest history entry
    /// and, if it still names a live candidate with a positive tally,
    /// decrements that tally. Returns the popped id.
    pub fn undo_last_vote(&mut self) -> Result<CandidateId, LedgerError> {
        let vid = self.history.pop().ok_or(LedgerError::EmptyHistory)?;
        if let Some(&pos) = self.index.get(&vid) {
            let c = &mut self.candidates[pos];
            if c.vote_count > 0 {
                c.vote_count -= 1;
            }
        }
        debug!("undo_last_vote: id {}, history length {}", vid, self.history.len());
        Ok(vid)
    }

    /// Undoes up to `count` votes in LIFO order; returns how many
    /// were actually undone. `count == 0` is a no-op.
    pub fn undo_last_votes(&mut self, count: usize) -> usize {
        let mut undone = 0;
        while undone < count && self.undo_last_vote().is_ok() {
            undone += 1;
        }
        if undone > 0 {
            info!("undo_last_votes: undid {} of {} requested", undone, count);
        }
        undone
    }

    /// Zeroes every tally and clears the history; the roster stays.
    pub fn reset_votes(&mut self) {
        for c in self.candidates.iter_mut() {
            c.vote_count = 0;
        }
        self.history.clear();
        info!("reset_votes: tallies zeroed, roster size {}", self.candidates.len());
    }

    /// Drops candidates, index and history.
    pub fn clear(&mut self) {
        self.candidates.clear();
        self.index.clear();
        self.history.clear();
    }

    pub fn history(&self) -> &[CandidateId] {
        &self.history
    }

    /// How many entries of the given vote vector match no live
    /// candidate. Pre-flight variant of [`apply_vote_vector`]; does
    /// not touch any state.
    ///
    /// [`apply_vote_vector`]: CandidateRoster::apply_vote_vector
    pub fn count_invalid_votes(&self, votes: &[CandidateId]) -> usize {
        let valid: HashSet<CandidateId> = self.index.keys().copied().collect();
        validate::count_invalid_votes(votes, &valid)
    }

    // ********* Summary statistics *********

    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.vote_count).sum()
    }

    pub fn average_votes(&self) -> f64 {
        if self.candidates.is_empty() {
            return 0.0;
        }
        self.total_votes() as f64 / self.candidates.len() as f64
    }

    pub fn max_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.vote_count).max().unwrap_or(0)
    }

    pub fn min_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.vote_count).min().unwrap_or(0)
    }

    /// A value copy of the roster in the requested order, for
    /// presentation. The roster itself keeps insertion order.
    pub fn sorted_candidates(&self, order: SortOrder) -> Vec<Candidate> {
        let mut copy = self.candidates.clone();
        match order {
            SortOrder::VotesDescending => copy.sort_by(|a, b| b.vote_count.cmp(&a.vote_count)),
            SortOrder::VotesAscending => copy.sort_by_key(|c| c.vote_count),
            SortOrder::ById => copy.sort_by_key(|c| c.id),
            SortOrder::ByName => copy.sort_by(|a, b| a.name.cmp(&b.name)),
        }
        copy
    }
}

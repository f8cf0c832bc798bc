use std::collections::{HashMap, HashSet};

use chrono::Utc;
use log::{debug, info};

use crate::model::{LedgerError, OptionId, TopicId, TopicVoteRecord, VoteOption, VoteTopic};
use crate::validate;

/// The multi-topic side of the ledger: independent polls, each with
/// its own option set and per-voter quota, plus the single global
/// vote history that backs undo.
///
/// Topics follow the same arena+index pattern as the candidate
/// roster. Quota state is a per-topic map from voter id to the set of
/// option slots that voter has consumed; it is purged with its topic.
/// The history is shared across all topics and strictly time-ordered,
/// so undo always reverses the most recent vote system-wide,
/// regardless of which topic it belongs to.
#[derive(Debug, Clone)]
pub struct TopicBoard {
    topics: Vec<VoteTopic>,
    index: HashMap<TopicId, usize>,
    // Starts at 1: topic ids are positive, zero is never assigned.
    next_topic_id: TopicId,
    voter_slots: HashMap<TopicId, HashMap<String, HashSet<OptionId>>>,
    history: Vec<TopicVoteRecord>,
}

impl Default for TopicBoard {
    fn default() -> TopicBoard {
        TopicBoard::new()
    }
}

impl TopicBoard {
    pub fn new() -> TopicBoard {
        TopicBoard {
            topics: Vec::new(),
            index: HashMap::new(),
            next_topic_id: 1,
            voter_slots: HashMap::new(),
            history: Vec::new(),
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (pos, t) in self.topics.iter().enumerate() {
            self.index.insert(t.id, pos);
        }
    }

    /// Publishes a new topic and returns its id.
    ///
    /// Option texts are trimmed and empty ones dropped; at least two
    /// must survive. Option ids are 1..k in input order. The quota
    /// must be between 1 and the number of surviving options.
    pub fn create_topic(
        &mut self,
        title: &str,
        description: &str,
        option_texts: &[String],
        votes_per_voter: u32,
    ) -> Result<TopicId, LedgerError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LedgerError::EmptyTitle);
        }
        let texts: Vec<&str> = option_texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.len() < 2 {
            return Err(LedgerError::NotEnoughOptions);
        }
        if votes_per_voter == 0 || votes_per_voter as usize > texts.len() {
            return Err(LedgerError::QuotaOutOfRange);
        }

        let id = self.next_topic_id;
        self.next_topic_id += 1;
        let options: Vec<VoteOption> = texts
            .iter()
            .enumerate()
            .map(|(idx, t)| VoteOption {
                id: (idx + 1) as OptionId,
                text: t.to_string(),
                vote_count: 0,
            })
            .collect();
        self.topics.push(VoteTopic {
            id,
            title: title.to_string(),
            description: description.to_string(),
            options,
            created_at: Utc::now(),
            votes_per_voter,
        });
        self.rebuild_index();
        info!(
            "create_topic: id {} with {} options, quota {}",
            id,
            texts.len(),
            votes_per_voter
        );
        Ok(id)
    }

    /// Removes a topic and purges its quota state. The global vote
    /// history is retained as an audit trail.
    pub fn delete_topic(&mut self, topic_id: TopicId) -> Result<(), LedgerError> {
        let pos = *self.index.get(&topic_id).ok_or(LedgerError::UnknownTopic)?;
        self.topics.remove(pos);
        self.rebuild_index();
        self.voter_slots.remove(&topic_id);
        info!("delete_topic: id {} removed", topic_id);
        Ok(())
    }

    pub fn topic(&self, topic_id: TopicId) -> Option<&VoteTopic> {
        self.index.get(&topic_id).map(|&pos| &self.topics[pos])
    }

    pub fn topics(&self) -> &[VoteTopic] {
        &self.topics
    }

    /// Sum of the option tallies; 0 for an unknown topic.
    pub fn topic_total_votes(&self, topic_id: TopicId) -> u64 {
        self.topic(topic_id)
            .map(|t| t.options.iter().map(|o| o.vote_count).sum())
            .unwrap_or(0)
    }

    /// Casts one vote for an option, on behalf of a voter.
    ///
    /// Enforces the per-voter quota: at most `votes_per_voter`
    /// distinct options per topic, never the same option twice. On
    /// success the option tally, the voter's slot set and the global
    /// history all move together.
    pub fn cast_vote(
        &mut self,
        topic_id: TopicId,
        option_id: OptionId,
        voter_id: &str,
    ) -> Result<(), LedgerError> {
        let pos = *self.index.get(&topic_id).ok_or(LedgerError::UnknownTopic)?;
        let voter = validate::normalize_voter_id(voter_id).ok_or(LedgerError::EmptyVoterId)?;
        let quota = self.topics[pos].votes_per_voter;
        // Unreachable through create_topic, which rejects a zero quota.
        if quota == 0 {
            return Err(LedgerError::QuotaOutOfRange);
        }
        if let Some(consumed) = self.voter_slots.get(&topic_id).and_then(|m| m.get(voter)) {
            if consumed.len() as u32 >= quota {
                return Err(LedgerError::QuotaExhausted);
            }
            if consumed.contains(&option_id) {
                return Err(LedgerError::DuplicateOptionVote);
            }
        }
        let opt_pos = self.topics[pos]
            .options
            .iter()
            .position(|o| o.id == option_id)
            .ok_or(LedgerError::UnknownOption)?;

        self.topics[pos].options[opt_pos].vote_count += 1;
        self.voter_slots
            .entry(topic_id)
            .or_default()
            .entry(voter.to_string())
            .or_default()
            .insert(option_id);
        self.history.push(TopicVoteRecord {
            topic_id,
            voter_id: voter.to_string(),
            option_id,
            voted_at: Utc::now(),
        });
        debug!(
            "cast_vote: topic {} option {} voter {:?}, history length {}",
            topic_id,
            option_id,
            voter,
            self.history.len()
        );
        Ok(())
    }

    /// Identity-free variant for settings without per-voter tracking:
    /// only the option tally moves. No quota bookkeeping, no history
    /// record, hence no undo for these votes.
    pub fn cast_anonymous_vote(
        &mut self,
        topic_id: TopicId,
        option_id: OptionId,
    ) -> Result<(), LedgerError> {
        let pos = *self.index.get(&topic_id).ok_or(LedgerError::UnknownTopic)?;
        let opt = self.topics[pos]
            .options
            .iter_mut()
            .find(|o| o.id == option_id)
            .ok_or(LedgerError::UnknownOption)?;
        opt.vote_count += 1;
        Ok(())
    }

    /// How many vote slots this voter still has for this topic: the
    /// full quota for a voter who has not voted yet, quota minus
    /// consumed otherwise, and 0 for an unknown topic.
    pub fn remaining_votes(&self, topic_id: TopicId, voter_id: &str) -> u32 {
        let quota = match self.topic(topic_id) {
            Some(t) => t.votes_per_voter,
            None => return 0,
        };
        let voter = match validate::normalize_voter_id(voter_id) {
            Some(v) => v,
            None => return quota,
        };
        match self.voter_slots.get(&topic_id).and_then(|m| m.get(voter)) {
            Some(consumed) => quota.saturating_sub(consumed.len() as u32),
            None => quota,
        }
    }

    /// Reverses the single most recent topic vote across all topics
    /// and returns the popped record for display.
    ///
    /// If the record's topic still exists, the option tally is
    /// decremented (floored at 0) and the option slot is released
    /// from the voter's quota set, pruning voter and topic entries
    /// that become empty. If the topic was deleted after the vote was
    /// cast, the record is consumed without any tally reversal; there
    /// is nothing left to reverse.
    pub fn undo_last_vote(&mut self) -> Result<TopicVoteRecord, LedgerError> {
        let rec = self.history.pop().ok_or(LedgerError::EmptyHistory)?;
        match self.index.get(&rec.topic_id) {
            Some(&pos) => {
                if let Some(opt) = self.topics[pos]
                    .options
                    .iter_mut()
                    .find(|o| o.id == rec.option_id)
                {
                    opt.vote_count = opt.vote_count.saturating_sub(1);
                }
                if let Some(voters) = self.voter_slots.get_mut(&rec.topic_id) {
                    if let Some(consumed) = voters.get_mut(&rec.voter_id) {
                        consumed.remove(&rec.option_id);
                        if consumed.is_empty() {
                            voters.remove(&rec.voter_id);
                        }
                    }
                    if voters.is_empty() {
                        self.voter_slots.remove(&rec.topic_id);
                    }
                }
                debug!(
                    "undo_last_vote: reversed topic {} option {} voter {:?}",
                    rec.topic_id, rec.option_id, rec.voter_id
                );
            }
            None => {
                info!(
                    "undo_last_vote: topic {} no longer exists, record consumed without reversal",
                    rec.topic_id
                );
            }
        }
        Ok(rec)
    }

    pub fn history(&self) -> &[TopicVoteRecord] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with_topic(votes_per_voter: u32) -> (TopicBoard, TopicId) {
        let mut b = TopicBoard::new();
        let opts = vec!["Red".to_string(), "Green".to_string(), "Blue".to_string()];
        let id = b
            .create_topic("Team color", "Pick the new colors", &opts, votes_per_voter)
            .unwrap();
        (b, id)
    }

    #[test]
    fn create_topic_validations() {
        let mut b = TopicBoard::new();
        let two = vec!["A".to_string(), "B".to_string()];
        assert!(b.create_topic("T", "", &two, 1).is_ok());
        assert_eq!(
            b.create_topic("  ", "", &two, 1),
            Err(LedgerError::EmptyTitle)
        );
        assert_eq!(
            b.create_topic("T", "", &["A".to_string()], 1),
            Err(LedgerError::NotEnoughOptions)
        );
        // Blank texts are dropped before the count check.
        assert_eq!(
            b.create_topic("T", "", &["A".to_string(), "  ".to_string()], 1),
            Err(LedgerError::NotEnoughOptions)
        );
        assert_eq!(
            b.create_topic("T", "", &two, 3),
            Err(LedgerError::QuotaOutOfRange)
        );
        assert_eq!(
            b.create_topic("T", "", &two, 0),
            Err(LedgerError::QuotaOutOfRange)
        );
    }

    #[test]
    fn default_board_assigns_positive_topic_ids() {
        let mut b = TopicBoard::default();
        let opts = vec!["A".to_string(), "B".to_string()];
        let t = b.create_topic("First", "", &opts, 1).unwrap();
        assert!(t >= 1);
        assert_eq!(b.topic(t).unwrap().id, t);
    }

    #[test]
    fn topic_ids_are_monotonic_and_options_sequential() {
        let mut b = TopicBoard::new();
        let opts = vec!["A".to_string(), "B".to_string()];
        let t1 = b.create_topic("First", "", &opts, 1).unwrap();
        let t2 = b.create_topic("Second", "", &opts, 1).unwrap();
        assert_eq!((t1, t2), (1, 2));
        b.delete_topic(t2).unwrap();
        // Deleted ids are never reassigned.
        let t3 = b.create_topic("Third", "", &opts, 1).unwrap();
        assert_eq!(t3, 3);

        let topic = b.topic(t1).unwrap();
        let ids: Vec<OptionId> = topic.options.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(topic.options[0].text, "A");
    }

    #[test]
    fn quota_and_duplicate_enforcement() {
        let (mut b, t) = board_with_topic(2);
        b.cast_vote(t, 1, "dana").unwrap();
        b.cast_vote(t, 2, "dana").unwrap();
        assert_eq!(b.remaining_votes(t, "dana"), 0);
        // Quota exhausted for a third distinct option.
        assert_eq!(b.cast_vote(t, 3, "dana"), Err(LedgerError::QuotaExhausted));
        // Same option twice is rejected even while under quota.
        let (mut b2, t2) = board_with_topic(2);
        b2.cast_vote(t2, 1, "dana").unwrap();
        assert_eq!(
            b2.cast_vote(t2, 1, "dana"),
            Err(LedgerError::DuplicateOptionVote)
        );
    }

    #[test]
    fn cast_vote_rejections_leave_no_trace() {
        let (mut b, t) = board_with_topic(1);
        assert_eq!(b.cast_vote(99, 1, "dana"), Err(LedgerError::UnknownTopic));
        assert_eq!(b.cast_vote(t, 9, "dana"), Err(LedgerError::UnknownOption));
        assert_eq!(b.cast_vote(t, 1, "   "), Err(LedgerError::EmptyVoterId));
        assert!(b.history().is_empty());
        assert_eq!(b.topic_total_votes(t), 0);
    }

    #[test]
    fn voter_ids_are_trimmed() {
        let (mut b, t) = board_with_topic(1);
        b.cast_vote(t, 1, "  dana ").unwrap();
        assert_eq!(b.history()[0].voter_id, "dana");
        // The padded spelling is the same voter.
        assert_eq!(b.cast_vote(t, 2, "dana"), Err(LedgerError::QuotaExhausted));
        assert_eq!(b.remaining_votes(t, " dana  "), 0);
    }

    #[test]
    fn remaining_votes_edge_cases() {
        let (b, t) = board_with_topic(2);
        assert_eq!(b.remaining_votes(t, "never-voted"), 2);
        assert_eq!(b.remaining_votes(99, "dana"), 0);
    }

    #[test]
    fn anonymous_votes_only_move_the_tally() {
        let (mut b, t) = board_with_topic(1);
        b.cast_anonymous_vote(t, 2).unwrap();
        assert_eq!(b.topic_total_votes(t), 1);
        assert!(b.history().is_empty());
        assert_eq!(b.remaining_votes(t, "dana"), 1);
        assert_eq!(b.cast_anonymous_vote(t, 9), Err(LedgerError::UnknownOption));
        assert_eq!(b.cast_anonymous_vote(99, 1), Err(LedgerError::UnknownTopic));
    }

    #[test]
    fn undo_reverses_the_most_recent_vote_globally() {
        let mut b = TopicBoard::new();
        let opts = vec!["A".to_string(), "B".to_string()];
        let ta = b.create_topic("Topic A", "", &opts, 1).unwrap();
        let tb = b.create_topic("Topic B", "", &opts, 1).unwrap();
        b.cast_vote(ta, 1, "dana").unwrap();
        b.cast_vote(tb, 2, "eric").unwrap();

        let rec = b.undo_last_vote().unwrap();
        // Only topic B's tally changes, even if A was cast first.
        assert_eq!(rec.topic_id, tb);
        assert_eq!(rec.voter_id, "eric");
        assert_eq!(b.topic_total_votes(ta), 1);
        assert_eq!(b.topic_total_votes(tb), 0);
    }

    #[test]
    fn undo_round_trip_restores_quota_and_tally() {
        let (mut b, t) = board_with_topic(2);
        assert_eq!(b.remaining_votes(t, "dana"), 2);
        b.cast_vote(t, 1, "dana").unwrap();
        assert_eq!(b.remaining_votes(t, "dana"), 1);

        let rec = b.undo_last_vote().unwrap();
        assert_eq!((rec.topic_id, rec.option_id), (t, 1));
        assert_eq!(b.remaining_votes(t, "dana"), 2);
        assert_eq!(b.topic_total_votes(t), 0);
        // The slot is free again.
        b.cast_vote(t, 1, "dana").unwrap();
    }

    #[test]
    fn undo_on_empty_history_fails() {
        let (mut b, _) = board_with_topic(1);
        assert_eq!(b.undo_last_vote().unwrap_err(), LedgerError::EmptyHistory);
    }

    #[test]
    fn undo_after_topic_delete_consumes_the_record() {
        // Pins the documented partial-failure case: the record is
        // consumed even though its topic is gone, and the next undo
        // moves on to the previous record.
        let mut b = TopicBoard::new();
        let opts = vec!["A".to_string(), "B".to_string()];
        let keep = b.create_topic("Keep", "", &opts, 1).unwrap();
        let gone = b.create_topic("Gone", "", &opts, 1).unwrap();
        b.cast_vote(keep, 1, "dana").unwrap();
        b.cast_vote(gone, 2, "eric").unwrap();
        b.delete_topic(gone).unwrap();

        let rec = b.undo_last_vote().unwrap();
        assert_eq!(rec.topic_id, gone);
        assert_eq!(b.history().len(), 1);
        assert_eq!(b.topic_total_votes(keep), 1);

        let rec2 = b.undo_last_vote().unwrap();
        assert_eq!(rec2.topic_id, keep);
        assert_eq!(b.topic_total_votes(keep), 0);
    }

    #[test]
    fn delete_topic_purges_quota_state() {
        let mut b = TopicBoard::new();
        let opts = vec!["A".to_string(), "B".to_string()];
        let t = b.create_topic("T", "", &opts, 1).unwrap();
        b.cast_vote(t, 1, "dana").unwrap();
        b.delete_topic(t).unwrap();
        assert_eq!(b.delete_topic(t), Err(LedgerError::UnknownTopic));
        // History survives the deletion as an audit trail.
        assert_eq!(b.history().len(), 1);
        assert_eq!(b.remaining_votes(t, "dana"), 0);
    }

    #[test]
    fn quota_slots_prune_on_undo() {
        let (mut b, t) = board_with_topic(3);
        b.cast_vote(t, 1, "dana").unwrap();
        b.cast_vote(t, 2, "dana").unwrap();
        b.undo_last_vote().unwrap();
        // Slot 2 is free again, slot 1 is still held.
        assert_eq!(b.remaining_votes(t, "dana"), 2);
        assert_eq!(b.cast_vote(t, 1, "dana"), Err(LedgerError::DuplicateOptionVote));
        b.undo_last_vote().unwrap();
        assert_eq!(b.remaining_votes(t, "dana"), 3);
    }
}

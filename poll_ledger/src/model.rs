// ********* Shared data model ***********

use std::error::Error;
use std::fmt::Display;

use chrono::{DateTime, Utc};

/// Identifier of a candidate in the flat roster.
///
/// Ids are chosen by the caller; zero is the only invalid value.
pub type CandidateId = u32;

/// Identifier of a poll topic. Assigned by the board, monotonically
/// increasing and never reused within one session.
pub type TopicId = u32;

/// Identifier of an option inside one topic. Options are numbered
/// 1..k in the order their texts were submitted.
pub type OptionId = u32;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub department: Option<String>,
    pub vote_count: u64,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteOption {
    pub id: OptionId,
    pub text: String,
    pub vote_count: u64,
}

/// An independently configured poll with its own option set and
/// per-voter quota.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteTopic {
    pub id: TopicId,
    pub title: String,
    pub description: String,
    pub options: Vec<VoteOption>,
    pub created_at: DateTime<Utc>,
    /// The maximum number of distinct options one voter may select
    /// within this topic. Always in `1..=options.len()`.
    pub votes_per_voter: u32,
}

/// One successful topic vote, as appended to the global topic history.
///
/// Reversing a record decrements the matching option tally and frees
/// the option slot in the voter's quota set.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TopicVoteRecord {
    pub topic_id: TopicId,
    pub voter_id: String,
    pub option_id: OptionId,
    pub voted_at: DateTime<Utc>,
}

/// Outcome of applying a vote vector in bulk.
///
/// Invalid entries are not errors: they are recorded in the history
/// and reported here, while the valid entries of the same batch are
/// still applied.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct BatchOutcome {
    pub applied: usize,
    pub invalid: usize,
}

/// Orderings available for presentation copies of the roster.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SortOrder {
    VotesDescending,
    VotesAscending,
    ById,
    ByName,
}

/// Errors surfaced by the ledger operations.
///
/// A failed operation leaves the ledger untouched. The one documented
/// exception is undoing a topic vote whose topic was deleted after the
/// vote was cast: the history record is consumed even though there is
/// no tally left to reverse (see `TopicBoard::undo_last_vote`).
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum LedgerError {
    InvalidId,
    InvalidName,
    DuplicateCandidate,
    UnknownCandidate,
    EmptyTitle,
    NotEnoughOptions,
    QuotaOutOfRange,
    UnknownTopic,
    UnknownOption,
    EmptyVoterId,
    QuotaExhausted,
    DuplicateOptionVote,
    EmptyHistory,
}

impl Error for LedgerError {}

impl Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            LedgerError::InvalidId => "candidate id must be a positive integer",
            LedgerError::InvalidName => "candidate name is empty, too long or contains disallowed characters",
            LedgerError::DuplicateCandidate => "a candidate with this id is already registered",
            LedgerError::UnknownCandidate => "no candidate with this id",
            LedgerError::EmptyTitle => "topic title may not be empty",
            LedgerError::NotEnoughOptions => "a topic needs at least two non-empty options",
            LedgerError::QuotaOutOfRange => "votes per voter must be between 1 and the number of options",
            LedgerError::UnknownTopic => "no topic with this id",
            LedgerError::UnknownOption => "no such option in this topic",
            LedgerError::EmptyVoterId => "voter id may not be empty",
            LedgerError::QuotaExhausted => "this voter has used all vote slots for this topic",
            LedgerError::DuplicateOptionVote => "this voter has already voted for this option",
            LedgerError::EmptyHistory => "there is no vote left to undo",
        };
        write!(f, "{}", msg)
    }
}

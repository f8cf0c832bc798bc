/*!
An in-memory election and poll ledger.

Two cooperating subsystems share one ledger:

- [`CandidateRoster`]: a flat roster of candidates with cumulative
  single-choice tallies, a strict-majority winner check, and a
  per-call-site LIFO undo over the vote history.
- [`TopicBoard`]: independent poll topics, each with its own option
  set and a per-voter quota, plus one globally time-ordered vote
  history whose undo always reverses the most recent vote
  system-wide.

All operations are synchronous and complete before returning. The
ledger is meant to be driven by a single logical actor; deployments
with several writers must serialize access around the whole ledger
themselves.
*/

mod model;
mod roster;
mod topics;
mod validate;

pub mod manual;

pub use crate::model::*;
pub use crate::roster::CandidateRoster;
pub use crate::topics::TopicBoard;
pub use crate::validate::{
    count_invalid_votes, is_valid_candidate_name, normalize_voter_id, MAX_NAME_CHARS,
};

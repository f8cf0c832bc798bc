/*!

This is the long-form manual for `poll_ledger` and `pollbook`.

## The two ledgers

The library keeps two independent audit trails and they must not be
confused:

* the **flat history** of the candidate roster: one candidate id per
  single vote, undone from the end one entry at a time
  (`undo_last_vote`, `undo_last_votes`);
* the **topic history**: one timestamped record per successful topic
  vote, shared by *all* topics. `TopicBoard::undo_last_vote` always
  reverses the most recent record system-wide, even when it belongs
  to a topic other than the one currently being looked at.

Votes cast through `cast_anonymous_vote` carry no voter identity and
are deliberately absent from the topic history: they cannot be undone.

## Vote vectors

`apply_vote_vector` is cumulative. Ids that match no live candidate
are not errors: they are appended to the history and reported in the
[`BatchOutcome`](crate::BatchOutcome). Call `reset_votes` first when a
fresh tally is wanted.

## Session files (`pollbook`)

The command line front end drives the ledger from a JSON session
description:

```json
{
    "name": "Board election 2026",
    "candidates": [
        { "id": 1, "name": "Alice", "department": "Engineering" },
        { "id": 2, "name": "Bob" }
    ],
    "votes": [1, 2, 1, 1],
    "voteFiles": ["more_votes.txt"],
    "topics": [
        {
            "title": "Offsite location",
            "description": "One vote per person",
            "options": ["Mountains", "Seaside"],
            "votesPerVoter": 1,
            "ballots": [
                { "voter": "dana", "option": 1 },
                { "voter": "eric", "option": 2 }
            ]
        }
    ],
    "undoVotes": 0,
    "undoTopicVotes": 0
}
```

Vote files referenced by `voteFiles` (or passed with `--votes`) are
plain text: whitespace-separated candidate ids, in cast order.

The summary of the session is written in JSON to `--out` (or stdout),
and `--report` produces a plain-text report with per-candidate
percentages and the majority winner. With `--reference`, the computed
summary is compared against an expected one and differences are shown.

`--export-roster` writes the roster as `id|name|department|votes`
lines; `--roster` reads the same format back, replaying the recorded
tallies through the regular voting operations.

*/

//! Delimited text import and export.
//!
//! Two formats, both plain text: vote vectors as whitespace-separated
//! candidate ids, and roster snapshots as one
//! `id|name|department|votes` line per candidate. The ledger itself
//! defines no file format; these are adapter concerns.

use std::fs;

use log::info;
use poll_ledger::{Candidate, CandidateId, CandidateRoster};
use snafu::prelude::*;

use super::{
    AppResult, LedgerSnafu, OpeningDataSnafu, ParsingRosterSnafu, ParsingVotesSnafu,
    WritingOutputSnafu,
};

/// Parses a vote vector: ids separated by any whitespace, including
/// newlines. Returns `(line, token)` for the first bad token.
pub fn parse_vote_vector(text: &str) -> Result<Vec<CandidateId>, (usize, String)> {
    let mut votes: Vec<CandidateId> = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        for token in line.split_whitespace() {
            match token.parse::<CandidateId>() {
                Ok(v) => votes.push(v),
                Err(_) => return Err((idx + 1, token.to_string())),
            }
        }
    }
    Ok(votes)
}

pub fn read_vote_vector(path: &str) -> AppResult<Vec<CandidateId>> {
    let text = fs::read_to_string(path).context(OpeningDataSnafu { path })?;
    let votes = parse_vote_vector(&text).map_err(|(line, token)| {
        ParsingVotesSnafu {
            path,
            line,
            token,
        }
        .build()
    })?;
    info!("read_vote_vector: {} votes from {}", votes.len(), path);
    Ok(votes)
}

pub fn write_vote_vector(path: &str, votes: &[CandidateId]) -> AppResult<()> {
    let mut text = votes
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<String>>()
        .join(" ");
    text.push('\n');
    fs::write(path, text).context(WritingOutputSnafu { path })?;
    info!("write_vote_vector: {} votes to {}", votes.len(), path);
    Ok(())
}

pub fn roster_snapshot_to_string(roster: &CandidateRoster) -> String {
    let mut out = String::new();
    for c in roster.candidates() {
        out.push_str(&format!(
            "{}|{}|{}|{}\n",
            c.id,
            c.name,
            c.department.as_deref().unwrap_or(""),
            c.vote_count
        ));
    }
    out
}

/// Parses a roster snapshot. Blank lines are skipped; anything else
/// must be a well-formed 4-field line. Returns the offending line
/// number otherwise.
pub fn parse_roster_snapshot(text: &str) -> Result<Vec<Candidate>, usize> {
    let mut res: Vec<Candidate> = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        res.push(parse_roster_line(line).ok_or(idx + 1)?);
    }
    Ok(res)
}

fn parse_roster_line(line: &str) -> Option<Candidate> {
    // '|' is not a permissible name character, so a plain split is safe.
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != 4 {
        return None;
    }
    let id = fields[0].trim().parse::<CandidateId>().ok()?;
    let name = fields[1].trim().to_string();
    let department = match fields[2].trim() {
        "" => None,
        d => Some(d.to_string()),
    };
    let vote_count = fields[3].trim().parse::<u64>().ok()?;
    Some(Candidate {
        id,
        name,
        department,
        vote_count,
    })
}

pub fn export_roster_snapshot(roster: &CandidateRoster, path: &str) -> AppResult<()> {
    fs::write(path, roster_snapshot_to_string(roster)).context(WritingOutputSnafu { path })?;
    info!("export_roster_snapshot: {} candidates to {}", roster.len(), path);
    Ok(())
}

/// Rebuilds roster state from a snapshot through the regular public
/// operations: candidates are registered, then each recorded tally is
/// replayed as single votes.
pub fn import_roster_snapshot(roster: &mut CandidateRoster, path: &str) -> AppResult<()> {
    let text = fs::read_to_string(path).context(OpeningDataSnafu { path })?;
    let snapshot =
        parse_roster_snapshot(&text).map_err(|line| ParsingRosterSnafu { path, line }.build())?;
    for c in snapshot.iter() {
        roster
            .add_candidate(c.id, &c.name, c.department.as_deref())
            .context(LedgerSnafu {
                what: format!("imported candidate {}", c.id),
            })?;
        for _ in 0..c.vote_count {
            roster.cast_vote(c.id).context(LedgerSnafu {
                what: format!("replayed vote for candidate {}", c.id),
            })?;
        }
    }
    info!("import_roster_snapshot: {} candidates from {}", snapshot.len(), path);
    Ok(())
}

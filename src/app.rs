use log::{info, warn};

use poll_ledger::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::app::session_reader::*;
use crate::args::Args;

pub mod io_votes;

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Error opening session file {path}"))]
    OpeningSession {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening data file {path}"))]
    OpeningData {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Bad entry {token:?} in vote file {path} (line {line})"))]
    ParsingVotes {
        path: String,
        line: usize,
        token: String,
    },
    #[snafu(display("Bad roster line {line} in {path}"))]
    ParsingRoster { path: String, line: usize },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The ledger rejected {what}: {source}"))]
    Ledger { source: LedgerError, what: String },
    #[snafu(display(""))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AppResult<T> = Result<T, AppError>;

pub mod session_reader {
    use super::*;

    /// A full session: the candidates and votes of the flat election,
    /// the poll topics with their ballots, and optional undo counts
    /// applied after everything else.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct SessionConfig {
        pub name: String,
        #[serde(default)]
        pub candidates: Vec<SessionCandidate>,
        #[serde(default)]
        pub votes: Vec<CandidateId>,
        #[serde(rename = "voteFiles", default)]
        pub vote_files: Vec<String>,
        #[serde(default)]
        pub topics: Vec<SessionTopic>,
        #[serde(rename = "undoVotes", default)]
        pub undo_votes: usize,
        #[serde(rename = "undoTopicVotes", default)]
        pub undo_topic_votes: usize,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct SessionCandidate {
        pub id: CandidateId,
        pub name: String,
        pub department: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct SessionTopic {
        pub title: String,
        #[serde(default)]
        pub description: String,
        pub options: Vec<String>,
        #[serde(rename = "votesPerVoter")]
        pub votes_per_voter: u32,
        #[serde(default)]
        pub ballots: Vec<SessionBallot>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct SessionBallot {
        pub voter: String,
        pub option: OptionId,
    }
}

pub fn run_session(args: &Args) -> AppResult<()> {
    let session_str = fs::read_to_string(&args.session).context(OpeningSessionSnafu {
        path: args.session.clone(),
    })?;
    let session: SessionConfig =
        serde_json::from_str(&session_str).context(ParsingJsonSnafu {})?;
    info!("session: {:?}", session.name);

    let mut roster = CandidateRoster::new();
    let mut board = TopicBoard::new();

    if let Some(p) = &args.roster {
        io_votes::import_roster_snapshot(&mut roster, p)?;
    }

    for c in session.candidates.iter() {
        roster
            .add_candidate(c.id, &c.name, c.department.as_deref())
            .context(LedgerSnafu {
                what: format!("candidate {}", c.id),
            })?;
    }

    // Vote vectors: inline, then files relative to the session file,
    // then the extra file from the command line. Invalid entries are
    // counted, not fatal.
    let mut invalid = 0usize;
    invalid += roster.apply_vote_vector(&session.votes).invalid;

    let root_p = Path::new(&args.session)
        .parent()
        .context(MissingParentDirSnafu {})?;
    for vf in session.vote_files.iter() {
        let p: PathBuf = root_p.join(vf);
        let votes = io_votes::read_vote_vector(&p.display().to_string())?;
        invalid += roster.apply_vote_vector(&votes).invalid;
    }
    if let Some(p) = &args.votes {
        let votes = io_votes::read_vote_vector(p)?;
        invalid += roster.apply_vote_vector(&votes).invalid;
    }

    for t in session.topics.iter() {
        let tid = board
            .create_topic(&t.title, &t.description, &t.options, t.votes_per_voter)
            .context(LedgerSnafu {
                what: format!("topic {:?}", t.title),
            })?;
        for b in t.ballots.iter() {
            board.cast_vote(tid, b.option, &b.voter).context(LedgerSnafu {
                what: format!("ballot by {:?} in topic {}", b.voter, tid),
            })?;
        }
    }

    if session.undo_votes > 0 {
        let undone = roster.undo_last_votes(session.undo_votes);
        info!("undid {} of {} flat votes", undone, session.undo_votes);
    }
    for _ in 0..session.undo_topic_votes {
        match board.undo_last_vote() {
            Ok(rec) => info!(
                "undid the vote of {:?} on topic {} option {}",
                rec.voter_id, rec.topic_id, rec.option_id
            ),
            Err(_) => {
                warn!("no topic vote left to undo");
                break;
            }
        }
    }

    let summary_js = build_summary_js(&session.name, &roster, &board, invalid);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    match args.out.as_deref() {
        None | Some("stdout") => println!("{}", pretty_js_stats),
        Some(p) => fs::write(p, format!("{}\n", pretty_js_stats))
            .context(WritingOutputSnafu { path: p.to_string() })?,
    }

    if let Some(p) = &args.report {
        fs::write(p, build_report(&roster))
            .context(WritingOutputSnafu { path: p.clone() })?;
    }
    if let Some(p) = &args.export_roster {
        io_votes::export_roster_snapshot(&roster, p)?;
    }
    if let Some(p) = &args.export_votes {
        io_votes::write_vote_vector(p, roster.history())?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let ref_str = fs::read_to_string(summary_p).context(OpeningDataSnafu {
            path: summary_p.clone(),
        })?;
        let summary_ref: JSValue =
            serde_json::from_str(&ref_str).context(ParsingJsonSnafu {})?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between computed summary and reference summary")
        }
    }

    Ok(())
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

fn build_summary_js(
    session_name: &str,
    roster: &CandidateRoster,
    board: &TopicBoard,
    invalid: usize,
) -> JSValue {
    let total = roster.total_votes();
    let winner = match roster.find_winner().and_then(|id| roster.candidate(id)) {
        Some(c) => json!({
            "id": c.id,
            "name": c.name,
            "votes": c.vote_count.to_string(),
            "percentage": format!("{:.2}", percentage(c.vote_count, total)),
        }),
        None => JSValue::Null,
    };
    let candidates: Vec<JSValue> = roster
        .sorted_candidates(SortOrder::VotesDescending)
        .iter()
        .map(|c| {
            json!({
                "id": c.id,
                "name": c.name,
                "department": c.department,
                "votes": c.vote_count.to_string(),
                "percentage": format!("{:.2}", percentage(c.vote_count, total)),
            })
        })
        .collect();
    json!({
        "session": session_name,
        "totalVotes": total.to_string(),
        "invalidVotes": invalid.to_string(),
        "winner": winner,
        "candidates": candidates,
        "topics": topic_summary_js(board),
    })
}

fn topic_summary_js(board: &TopicBoard) -> Vec<JSValue> {
    let mut res: Vec<JSValue> = Vec::new();
    for t in board.topics() {
        let total = board.topic_total_votes(t.id);
        let options: Vec<JSValue> = t
            .options
            .iter()
            .map(|o| {
                json!({
                    "id": o.id,
                    "text": o.text,
                    "votes": o.vote_count.to_string(),
                    "percentage": format!("{:.2}", percentage(o.vote_count, total)),
                })
            })
            .collect();
        // Distinct voters in first-vote order, with their remaining quota.
        let mut voters: Vec<&str> = Vec::new();
        for rec in board.history() {
            if rec.topic_id == t.id && !voters.contains(&rec.voter_id.as_str()) {
                voters.push(rec.voter_id.as_str());
            }
        }
        let voters_js: Vec<JSValue> = voters
            .iter()
            .map(|v| {
                json!({
                    "voter": v,
                    "remaining": board.remaining_votes(t.id, v),
                })
            })
            .collect();
        res.push(json!({
            "id": t.id,
            "title": t.title,
            "votesPerVoter": t.votes_per_voter,
            "totalVotes": total.to_string(),
            "options": options,
            "voters": voters_js,
        }));
    }
    res
}

fn build_report(roster: &CandidateRoster) -> String {
    let total = roster.total_votes();
    let mut out = String::new();
    out.push_str("========================================\n");
    out.push_str("            Election report\n");
    out.push_str("========================================\n");
    out.push_str(&format!("Total votes: {}\n", total));
    out.push_str(&format!("Candidates:  {}\n\n", roster.len()));
    out.push_str(&format!(
        "{:<6}{:<26}{:<20}{:>8}{:>9}\n",
        "id", "name", "department", "votes", "share"
    ));
    out.push_str("----------------------------------------\n");
    for c in roster.sorted_candidates(SortOrder::VotesDescending) {
        out.push_str(&format!(
            "{:<6}{:<26}{:<20}{:>8}{:>8.2}%\n",
            c.id,
            c.name,
            c.department.as_deref().unwrap_or(""),
            c.vote_count,
            percentage(c.vote_count, total)
        ));
    }
    out.push_str("\n----------------------------------------\n");
    match roster.find_winner().and_then(|id| roster.candidate(id)) {
        Some(c) => out.push_str(&format!(
            "Majority winner: {} (id {}, {} votes, {:.2}%)\n",
            c.name,
            c.id,
            c.vote_count,
            percentage(c.vote_count, total)
        )),
        None => out.push_str("No candidate reached a strict majority.\n"),
    }
    out.push_str("========================================\n");
    out
}

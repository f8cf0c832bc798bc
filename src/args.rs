use clap::Parser;

/// This is an election and poll session runner.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON session file describing candidates, votes, topics and
    /// topic ballots. See the library manual for the format.
    #[clap(short, long, value_parser)]
    pub session: String,

    /// (file path) An extra vote-vector file: whitespace-separated candidate ids,
    /// applied after the votes of the session file.
    #[clap(long, value_parser)]
    pub votes: Option<String>,

    /// (file path) A candidate roster snapshot ('id|name|department|votes' lines)
    /// imported before the session candidates.
    #[clap(long, value_parser)]
    pub roster: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the session will be
    /// written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) If specified, a plain-text report with tallies, percentages and the
    /// majority winner will be written to the given location.
    #[clap(long, value_parser)]
    pub report: Option<String>,

    /// (file path) If specified, the final candidate roster is exported as a snapshot
    /// to the given location.
    #[clap(long, value_parser)]
    pub export_roster: Option<String>,

    /// (file path) If specified, the flat vote history is exported as a vote-vector
    /// file to the given location.
    #[clap(long, value_parser)]
    pub export_votes: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, pollbook will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "pbiq",
    about = "Discover local Power BI Desktop sessions and query their tabular models",
    version
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List the Power BI Desktop sessions running on this machine
    ListSessions {
        /// Only sessions whose title matches this pattern (`*` and `?`
        /// wildcards, case-insensitive)
        #[clap(long)]
        title: Option<String>,
    },

    /// List the model tables of exactly one session
    ListTables {
        /// Only sessions whose title matches this pattern
        #[clap(long)]
        title: Option<String>,

        /// Also show tables the model marks as hidden
        #[clap(long)]
        include_hidden: bool,
    },

    /// Evaluate a whole table of exactly one session and print its rows
    ReadTable {
        /// Table name, interpolated verbatim; double any `'` it contains
        #[clap(long)]
        table: String,

        /// Only sessions whose title matches this pattern
        #[clap(long)]
        title: Option<String>,
    },
}

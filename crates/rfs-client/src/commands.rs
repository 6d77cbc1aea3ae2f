//! Interactive command table.
//!
//! Each input line is parsed with clap in multicall mode: the first word
//! selects the command and the rest are its arguments.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "client", multicall = true)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect to a server (example: connect localhost 9999)
    Connect { host: String, port: String },

    /// Fetch a remote file and print it (example: get /index.html)
    Get { target: String },

    /// Upload a local file (example: put /test.html /finance/index.html)
    Put { source: String, target: String },

    /// Delete a remote file or empty directory (example: delete /finance/test.html)
    Delete { target: String },

    /// Close the connection to the server
    Disconnect,

    /// List files in the local directory
    List,

    /// Disconnect and leave the client
    #[command(visible_aliases = ["x", "q", "quit"])]
    Exit,
}

/// Result of reading one input line.
#[derive(Debug, PartialEq, Eq)]
pub enum Parsed {
    Empty,
    Command(Command),
    /// Help text that was asked for.
    Help(String),
    /// Unknown command or wrong arguments, with the message to show.
    Invalid(String),
}

pub fn parse_line(line: &str) -> Parsed {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(&name) = words.first() else {
        return Parsed::Empty;
    };

    if name != "help" && CommandLine::command().find_subcommand(name).is_none() {
        return Parsed::Invalid(format!(
            "{} not a valid command!! Type help to list commands",
            line.trim()
        ));
    }

    match CommandLine::try_parse_from(words) {
        Ok(parsed) => Parsed::Command(parsed.command),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                Parsed::Help(err.render().to_string())
            }
            _ => Parsed::Invalid(err.render().to_string()),
        },
    }
}

//! Command line parsing
//!
//! `getter <folder>` takes exactly one positional argument, the data root.

use crate::error::StartupError;

pub const USAGE: &str = "Usage: getter <folder>  Example:  getter '~/tempData'";

/// What the command line asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Serve the given (unresolved) data directory
    Run(String),
    Help,
}

/// Parse the arguments that follow the program name
pub fn parse_args<I>(args: I) -> Result<CliCommand, StartupError>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    match args.as_slice() {
        [flag] if flag == "-h" || flag == "--help" => Ok(CliCommand::Help),
        [folder] => Ok(CliCommand::Run(folder.clone())),
        _ => Err(StartupError::Argument(USAGE.to_string())),
    }
}

use std::ffi::OsString;

use clap::{error::ErrorKind, Parser};
use eyre::{eyre, Result};

/// Deploys the `Project` contract.
///
/// Everything besides the contract itself is configured through `DEPLOYER_*`
/// environment variables or a `.env` file.
#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
pub struct Args {}

impl Args {
    /// Parse the command line.
    ///
    /// `--help` and `--version` print and exit with success, any other argument
    /// is an error that fails the run like every other failure.
    pub fn parse_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Self::try_parse_from(args) {
            Ok(args) => Ok(args),
            Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
                e.exit()
            }
            Err(e) => Err(eyre!("{e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Args;

    #[test]
    fn no_arguments_are_accepted() {
        Args::parse_args(["project-deployer"]).unwrap();
    }

    #[test]
    fn stray_arguments_are_errors() {
        let err = Args::parse_args(["project-deployer", "--fee", "7"]).unwrap_err();
        assert!(err.to_string().contains("--fee"), "{err}");

        Args::parse_args(["project-deployer", "extra"]).unwrap_err();
    }
}

//! Command-line interface.
//!
//! Credentials come from the two positional arguments or from
//! `DERIV_EMAIL`/`DERIV_PASSWORD`; there are no built-in defaults. Passing
//! them on the command line implies an unattended run, so the browser goes
//! headless unless `--headed` says otherwise.

use crate::config::{Config, Credentials};
use anyhow::{Result, bail};
use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "deriv-tokgen",
    version,
    about = "Create a Deriv API token by driving the account pages in a real Chromium session"
)]
pub struct Cli {
    /// Deriv account email (or DERIV_EMAIL)
    #[arg(value_name = "EMAIL", env = "DERIV_EMAIL")]
    pub email: Option<String>,

    /// Deriv account password (or DERIV_PASSWORD)
    #[arg(value_name = "PASSWORD", env = "DERIV_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// OAuth application id
    #[arg(long, value_name = "ID")]
    pub app_id: Option<String>,

    /// Where to write the result file
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Run the browser headless
    #[arg(long, conflicts_with = "headed")]
    pub headless: bool,

    /// Show the browser window even when credentials came from the command line
    #[arg(long)]
    pub headed: bool,

    /// Config file (TOML)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// A parsed invocation, remembering where the credentials came from.
#[derive(Debug)]
pub struct Invocation {
    pub cli: Cli,
    creds_from_cli: bool,
}

/// Parse `std::env::args`, exiting with clap's usage output on error.
pub fn parse() -> Invocation {
    let matches = Cli::command().get_matches();
    let from_cli = |id: &str| matches.value_source(id) == Some(ValueSource::CommandLine);
    let creds_from_cli = from_cli("email") && from_cli("password");
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    Invocation {
        cli,
        creds_from_cli,
    }
}

impl Invocation {
    /// Resolve credentials, failing usage-style when either half is missing.
    pub fn credentials(&self) -> Result<Credentials> {
        match (self.cli.email.clone(), self.cli.password.clone()) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => bail!(
                "credentials required: pass EMAIL and PASSWORD as arguments \
                 or set DERIV_EMAIL and DERIV_PASSWORD"
            ),
        }
    }

    /// Headless unless told otherwise: explicit flags win, then
    /// command-line credentials imply an unattended (headless) run.
    pub fn headless(&self) -> bool {
        if self.cli.headed {
            false
        } else if self.cli.headless {
            true
        } else {
            self.creds_from_cli
        }
    }

    /// Fold CLI overrides into a loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(app_id) = &self.cli.app_id {
            config.app_id = app_id.clone();
        }
        if let Some(out) = &self.cli.out {
            config.output_path = out.clone();
        }
    }

    #[cfg(test)]
    fn for_test(cli: Cli, creds_from_cli: bool) -> Self {
        Self {
            cli,
            creds_from_cli,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn missing_credentials_is_a_usage_error() {
        let cli = Cli::try_parse_from(["deriv-tokgen"]).unwrap();
        let invocation = Invocation::for_test(cli, false);
        // Depending on the environment the vars may be set; only assert the
        // error path when they are absent.
        if std::env::var("DERIV_EMAIL").is_err() || std::env::var("DERIV_PASSWORD").is_err() {
            assert!(invocation.credentials().is_err());
        }
    }

    #[test]
    fn command_line_credentials_force_headless() {
        let cli = Cli::try_parse_from(["deriv-tokgen", "a@b.c", "hunter2"]).unwrap();
        let invocation = Invocation::for_test(cli, true);
        assert!(invocation.headless());
        assert_eq!(invocation.credentials().unwrap().email, "a@b.c");
    }

    #[test]
    fn headed_flag_overrides_headless_default() {
        let cli = Cli::try_parse_from(["deriv-tokgen", "a@b.c", "hunter2", "--headed"]).unwrap();
        let invocation = Invocation::for_test(cli, true);
        assert!(!invocation.headless());
    }

    #[test]
    fn overrides_reach_the_config() {
        let cli =
            Cli::try_parse_from(["deriv-tokgen", "--app-id", "1234", "--out", "/tmp/t.txt"])
                .unwrap();
        let invocation = Invocation::for_test(cli, false);
        let mut config = Config::default();
        invocation.apply_overrides(&mut config);
        assert_eq!(config.app_id, "1234");
        assert_eq!(config.output_path, PathBuf::from("/tmp/t.txt"));
    }
}

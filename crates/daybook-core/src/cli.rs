use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "daybook",
    version,
    about = "Daybook: start-of-day planning and end-of-day review",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Alternate daybookrc file.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory for the local backend.
    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    /// Base URL of the task API; implies the http backend.
    #[arg(long = "api", conflicts_with = "local")]
    pub api: Option<String>,

    /// Use the local file backend instead of the task API.
    #[arg(long = "local")]
    pub local: bool,

    /// Day to operate on: YYYY-MM-DD, today, yesterday or tomorrow.
    #[arg(long = "date")]
    pub date: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Save the day's planned tasks and send the SOD email.
    Sod {
        /// `TITLE` or `TITLE::NOTE`, one per task.
        tasks: Vec<String>,

        /// Also carry over yesterday's pending tasks.
        #[arg(long)]
        include_pending: bool,
    },

    /// Review the selected day.
    Eod {
        #[command(subcommand)]
        action: Option<EodAction>,
    },

    /// Today's completed and incomplete tasks.
    Summary,

    /// Show a single task.
    Show { id: u64 },

    /// Print the email that would be sent, without sending it.
    Preview {
        #[arg(value_enum)]
        kind: PreviewKind,

        /// Planned tasks for an SOD preview, `TITLE` or `TITLE::NOTE`.
        tasks: Vec<String>,
    },

    /// Interactive session (the default).
    Shell {
        /// Skip the home screen.
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum EodAction {
    /// List the day's tasks.
    List,
    /// Mark a task completed.
    Done { id: u64 },
    /// Mark a task pending again.
    Undo { id: u64 },
    /// Record an unplanned task that is already done.
    Add {
        text: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Send the EOD email.
    Send,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Sod,
    Eod,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    Sod,
    Eod,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.KEY=VALUE` / `rc.KEY:VALUE` overrides out of argv.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use clap::Parser;

    use super::{Command, EodAction, GlobalCli, preprocess_args};

    fn args(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_stripped() {
        let pre = preprocess_args(&args(&[
            "daybook",
            "rc.api.backend=local",
            "summary",
            "rc.color:off",
        ]))
        .expect("preprocess");
        assert_eq!(pre.cleaned_args, args(&["daybook", "summary"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.api.backend".to_string(), "local".to_string()),
                ("rc.color".to_string(), "off".to_string()),
            ]
        );
    }

    #[test]
    fn parses_eod_add_with_note() {
        let cli = GlobalCli::parse_from(args(&[
            "daybook",
            "--date",
            "2024-01-15",
            "eod",
            "add",
            "Fix bug",
            "--note",
            "hotfix",
        ]));
        assert_eq!(cli.date.as_deref(), Some("2024-01-15"));
        match cli.command {
            Some(Command::Eod {
                action: Some(EodAction::Add { text, note }),
            }) => {
                assert_eq!(text, "Fix bug");
                assert_eq!(note.as_deref(), Some("hotfix"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn api_and_local_conflict() {
        assert!(
            GlobalCli::try_parse_from(args(&["daybook", "--api", "http://x", "--local"])).is_err()
        );
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "wellkeep")]
#[command(about = "Offline-first sleep, caffeine, fasting and to-do state with optional account sync")]
#[command(long_about = "wellkeep - offline-first personal planner state

Every change is written to a local database first. When you are signed in
and a backend is configured, changes are also pushed to your account, and
the first command of a run pulls your account's latest state once.

QUICK START:
  wellkeep sleep set --mode wake --time 06:30   Suggested bedtimes
  wellkeep todo add \"Stretch\" --priority high   Add a task
  wellkeep fasting start --protocol 18:6       Start a fast
  wellkeep sync status                         Show sync state

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  wellkeep <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output (default),
    /// or 'json' for machine-readable output suitable for scripting.
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub output: OutputFormat,

    /// Data directory (default: ~/.wellkeep)
    #[arg(long, env = "WELLKEEP_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the value stored under a slot key
    ///
    /// # Examples
    ///
    ///   wellkeep get sleep-time
    ///   wellkeep get todo-data -o json
    Get {
        /// Slot key (e.g. sleep-state, todo-data, fasting-state)
        key: String,
    },

    /// Replace the value stored under a slot key
    ///
    /// The value is JSON; anything that is not valid JSON is stored as a
    /// plain string. Structured slots are validated before they are saved.
    ///
    /// # Examples
    ///
    ///   wellkeep set sleep-time 07:30
    ///   wellkeep set sleep-state '{"mode":"wake","time":"06:00"}'
    Set {
        /// Slot key
        key: String,
        /// New value
        value: String,
    },

    /// Change one field of a structured slot
    ///
    /// # Examples
    ///
    ///   wellkeep field fasting-state goal_hours 18
    ///   wellkeep field sleep-state selected_time '"22:16"'
    Field {
        /// Slot key
        key: String,
        /// Field name
        field: String,
        /// New field value (JSON, or a plain string)
        value: String,
    },

    /// Sleep cycle calculator
    #[command(alias = "s")]
    Sleep(SleepArgs),

    /// Caffeine timing planner
    #[command(alias = "c")]
    Caffeine(CaffeineArgs),

    /// To-do list
    #[command(alias = "t")]
    Todo(TodoArgs),

    /// Intermittent fasting tracker
    #[command(alias = "f")]
    Fasting(FastingArgs),

    /// Account sync
    Sync(SyncArgs),

    /// Push local data to the signed-in account (once per account)
    Migrate,

    /// Record a session obtained from the backend
    ///
    /// Pushes existing local data to the account the first time.
    Login {
        /// Account id
        #[arg(long)]
        account: String,
        /// Access token
        #[arg(long, env = "WELLKEEP_TOKEN")]
        token: String,
    },

    /// Forget the stored session
    Logout,

    /// Generate shell completions
    ///
    /// # Examples
    ///
    ///   wellkeep completions zsh > ~/.zfunc/_wellkeep
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the sleep calculator.
#[derive(Args)]
pub struct SleepArgs {
    #[command(subcommand)]
    pub command: Option<SleepCommands>,
}

/// Sleep calculator subcommands.
#[derive(Subcommand)]
pub enum SleepCommands {
    /// Show the current mode, time and suggestions
    Show,

    /// Change mode, anchor time, or the selected suggestion
    Set {
        /// wake (suggest bedtimes) or bed (suggest wake times)
        #[arg(long)]
        mode: Option<String>,
        /// Anchor time, HH:MM
        #[arg(long)]
        time: Option<String>,
        /// One of the suggested times, HH:MM
        #[arg(long)]
        selected: Option<String>,
    },
}

/// Arguments for the caffeine planner.
#[derive(Args)]
pub struct CaffeineArgs {
    #[command(subcommand)]
    pub command: Option<CaffeineCommands>,
}

/// Caffeine planner subcommands.
#[derive(Subcommand)]
pub enum CaffeineCommands {
    /// Show the wake time and dose schedule
    Show,

    /// Set the wake time
    Wake {
        /// HH:MM
        time: String,
    },

    /// Add a planned dose
    Dose {
        /// HH:MM
        time: String,
        /// Short label (e.g. "espresso")
        #[arg(long, default_value = "")]
        label: String,
    },

    /// Remove every planned dose
    Clear,
}

/// Arguments for the to-do list.
#[derive(Args)]
pub struct TodoArgs {
    #[command(subcommand)]
    pub command: Option<TodoCommands>,
}

/// To-do subcommands.
#[derive(Subcommand)]
pub enum TodoCommands {
    /// List open tasks, highest priority first
    List {
        /// Include completed tasks
        #[arg(long, short)]
        all: bool,
    },

    /// Add a task
    Add {
        /// Task text
        text: String,
        /// Priority label valid under the current method
        #[arg(long, short)]
        priority: Option<String>,
    },

    /// Mark a task completed
    Done {
        /// Task id (a unique prefix is enough)
        id: String,
    },

    /// Switch prioritization method (simple, eisenhower, abcde, moscow)
    Method {
        method: String,
    },
}

/// Arguments for the fasting tracker.
#[derive(Args)]
pub struct FastingArgs {
    #[command(subcommand)]
    pub command: Option<FastingCommands>,
}

/// Fasting subcommands.
#[derive(Subcommand)]
pub enum FastingCommands {
    /// Show protocol, progress and goal
    Show,

    /// Start a fast
    Start {
        /// FAST:EAT hours, e.g. 16:8
        #[arg(long)]
        protocol: Option<String>,
    },

    /// End the running fast
    Stop,
}

/// Arguments for account sync.
#[derive(Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommands,
}

/// Sync subcommands.
#[derive(Subcommand)]
pub enum SyncCommands {
    /// Show session, backend and migration state
    Status,

    /// Pull once, then push every slot now
    Run,

    /// Keep syncing on a timer until interrupted
    Watch {
        /// Seconds between pushes (default: sync.interval_seconds)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["wellkeep", "get", "sleep-time", "-o", "json", "--home", "/tmp/wk"])
            .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/wk")));
        assert!(matches!(cli.command, Commands::Get { key } if key == "sleep-time"));
    }

    #[test]
    fn test_subcommand_defaults_to_show() {
        let cli = Cli::try_parse_from(["wellkeep", "sleep"]).unwrap();
        assert!(matches!(cli.command, Commands::Sleep(SleepArgs { command: None })));
    }
}

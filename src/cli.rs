use crate::rules::{RuleSetKind, Strategy};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "typeshift")]
#[command(about = "Rewrite expectTypeOf assertions to the Ts.Assert call syntax")]
#[command(long_about = "typeshift rewrites type assertions in test files.

Each target file is read, an ordered list of rewrite rules is applied, and the
file is written back only if its content changed. A file that cannot be read or
written is reported and skipped; the remaining files are still processed.

REWRITES:
  expectTypeOf(x).toEqualTypeOf(y)              Ts.Assert.exact.ofAs<typeof y>().on(x)
  expectTypeOf(x).toMatchTypeOf<T>()            Ts.Assert.sub.ofAs<T>().on(x)
  expectTypeOf<A>().toMatchTypeOf<B>()          Ts.Assert.sub.ofAs<B>().onAs<A>()
  expectTypeOf<A>().not.toMatchTypeOf<B>()      Ts.Assert.not.sub.ofAs<B>().onAs<A>()
  expectTypeOf(x).toEqualTypeOf<T>()            Ts.Assert.exact.ofAs<T>().on(x)
  expectTypeOf<A>().toEqualTypeOf<B>()          Ts.Assert.exact.ofAs<B>().onAs<A>()

TARGETS:
  Files given on the command line, else --files-from, else [targets] in the
  config file, else the built-in list of test files.

EXAMPLES:
  typeshift                                    Rewrite the configured targets
  typeshift --dry-run src/a.test.ts            Show the diff without writing
  typeshift --strategy balanced src/*.test.ts  Handle nested brackets in operands
  typeshift --backup                           Keep a copy before writing
  typeshift rollback                           Undo the last backed-up run")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Files to rewrite
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Read target paths from a file, one per line
    #[arg(long, value_name = "FILE", conflicts_with = "files")]
    files_from: Option<PathBuf>,

    /// Resolve relative target paths against this directory
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Preview changes as a diff without writing
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Built-in rule set
    #[arg(long, value_enum)]
    ruleset: Option<RuleSetKind>,

    /// How call chains are matched
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Config file (default: ./.typeshift.toml, then ~/.typeshift/config.toml)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Back up files before rewriting them
    #[arg(long)]
    backup: bool,

    /// Custom backup directory (default: ~/.typeshift/backups)
    #[arg(long, value_name = "DIR", global = true)]
    backup_dir: Option<PathBuf>,

    /// Context lines in --dry-run diffs
    #[arg(long, value_name = "NUM")]
    context: Option<usize>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Write a debug log to ~/.typeshift/typeshift.log
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Restore files from a backup
    #[command(long_about = "Restore files from a backup.

If no backup ID is given, the most recent backup is restored.
Use 'typeshift history' to list backups.")]
    Rollback {
        /// Backup ID (defaults to the most recent)
        #[arg(value_name = "ID")]
        id: Option<String>,
    },

    /// List backups
    History,

    /// Show or create the configuration file
    Config {
        /// Print the effective configuration
        #[arg(long, conflicts_with = "init")]
        show: bool,

        /// Write a commented template to ./.typeshift.toml
        #[arg(long)]
        init: bool,
    },

    /// List the active rules in the order they are applied
    Rules {
        /// Built-in rule set
        #[arg(long, value_enum)]
        ruleset: Option<RuleSetKind>,

        /// How call chains are matched
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },
}

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    pub no_color: bool,
    pub verbose: bool,
}

#[derive(Debug)]
pub enum Args {
    Run {
        files: Vec<PathBuf>,
        files_from: Option<PathBuf>,
        root: Option<PathBuf>,
        dry_run: bool,
        ruleset: Option<RuleSetKind>,
        strategy: Option<Strategy>,
        backup: bool,
        context: Option<usize>,
    },
    Rollback {
        id: Option<String>,
    },
    History,
    Config {
        show: bool,
        init: bool,
    },
    Rules {
        ruleset: Option<RuleSetKind>,
        strategy: Option<Strategy>,
    },
}

pub fn parse_args() -> (GlobalArgs, Args) {
    from_cli(Cli::parse())
}

fn from_cli(cli: Cli) -> (GlobalArgs, Args) {
    let global = GlobalArgs {
        config: cli.config,
        backup_dir: cli.backup_dir,
        no_color: cli.no_color,
        verbose: cli.verbose,
    };

    let args = match cli.command {
        Some(Commands::Rollback { id }) => Args::Rollback { id },
        Some(Commands::History) => Args::History,
        Some(Commands::Config { show, init }) => Args::Config { show, init },
        Some(Commands::Rules { ruleset, strategy }) => Args::Rules {
            ruleset: ruleset.or(cli.ruleset),
            strategy: strategy.or(cli.strategy),
        },
        None => Args::Run {
            files: cli.files,
            files_from: cli.files_from,
            root: cli.root,
            dry_run: cli.dry_run,
            ruleset: cli.ruleset,
            strategy: cli.strategy,
            backup: cli.backup,
            context: cli.context,
        },
    };

    (global, args)
}

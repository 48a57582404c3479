use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use typeshift::backup_manager::BackupManager;
use typeshift::cli::{parse_args, Args, GlobalArgs};
use typeshift::config::{self, Config};
use typeshift::processor::{self, Mode, Rewriter};
use typeshift::report::Reporter;
use typeshift::{logger, RuleSetKind, Strategy};

fn main() -> ExitCode {
    let (global, args) = parse_args();

    match dispatch(&global, args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "run aborted");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(global: &GlobalArgs, args: Args) -> Result<ExitCode> {
    let (mut config, config_path) = config::load_config(global.config.as_deref())?;

    if let Some(log_path) = logger::init_logging(config.logging.debug, global.verbose)? {
        tracing::info!(
            log = %log_path.display(),
            config = ?config_path,
            "typeshift {} starting",
            env!("CARGO_PKG_VERSION")
        );
    }

    if global.no_color {
        config.output.color = false;
    }
    if let Some(dir) = &global.backup_dir {
        config.backup.backup_dir = Some(dir.display().to_string());
    }

    match args {
        Args::Run {
            files,
            files_from,
            root,
            dry_run,
            ruleset,
            strategy,
            backup,
            context,
        } => {
            apply_overrides(&mut config, ruleset, strategy);
            if backup {
                config.backup.enabled = true;
            }
            if let Some(n) = context {
                config.output.context_lines = n;
            }
            config::validate_config(&config)?;

            let targets = resolve_targets(&config, files, files_from.as_deref(), root.as_deref())?;
            let mode = if dry_run { Mode::DryRun } else { Mode::Apply };
            Ok(if execute(&config, &targets, mode)? {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Args::Rollback { id } => {
            rollback(&config, id)?;
            Ok(ExitCode::SUCCESS)
        }
        Args::History => {
            let manager = backup_manager(&config)?;
            let reporter = reporter(&config);
            println!("{}", reporter.format_history(&manager.list_backups()?));
            Ok(ExitCode::SUCCESS)
        }
        Args::Config { show, init } => {
            show_config(&config, config_path.as_deref(), show, init)?;
            Ok(ExitCode::SUCCESS)
        }
        Args::Rules { ruleset, strategy } => {
            apply_overrides(&mut config, ruleset, strategy);
            let rules = config.build_rules()?;
            print!("{}", reporter(&config).format_rules(&rules));
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn apply_overrides(config: &mut Config, ruleset: Option<RuleSetKind>, strategy: Option<Strategy>) {
    if let Some(ruleset) = ruleset {
        config.rewrite.ruleset = ruleset;
    }
    if let Some(strategy) = strategy {
        config.rewrite.strategy = strategy;
    }
}

fn reporter(config: &Config) -> Reporter {
    Reporter::new(
        Reporter::should_use_color(config.output.color),
        config.output.context_lines,
    )
}

fn backup_manager(config: &Config) -> Result<BackupManager> {
    match &config.backup.backup_dir {
        Some(dir) => BackupManager::with_directory(dir),
        None => BackupManager::new(),
    }
}

/// Command line, then --files-from, then config, then the built-in list
fn resolve_targets(
    config: &Config,
    files: Vec<PathBuf>,
    files_from: Option<&Path>,
    root: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let targets = if !files.is_empty() {
        files
    } else if let Some(list) = files_from {
        let content = fs::read_to_string(list)
            .with_context(|| format!("Failed to read target list: {}", list.display()))?;
        parse_target_list(&content)
    } else {
        config.target_files()
    };

    Ok(match root {
        Some(root) => targets
            .into_iter()
            .map(|p| if p.is_absolute() { p } else { root.join(p) })
            .collect(),
        None => targets,
    })
}

/// One path per line; blank lines and `#` comments are skipped
fn parse_target_list(content: &str) -> Vec<PathBuf> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect()
}

/// Rewrite or preview every target; `false` if any file failed
fn execute(config: &Config, targets: &[PathBuf], mode: Mode) -> Result<bool> {
    let rewriter = Rewriter::new(config.build_rules()?);
    let reporter = reporter(config);
    let label = format!("{}/{}", config.rewrite.ruleset, config.rewrite.strategy);

    tracing::info!(targets = targets.len(), rules = %label, ?mode, "processing targets");

    let backup_id = if mode == Mode::Apply && config.backup.enabled {
        create_backup(config, &rewriter, targets, &label)?
    } else {
        None
    };

    let summary = processor::run(&rewriter, targets, mode, |report| {
        reporter.print_file(report, mode)
    });

    println!("{}", reporter.format_summary(&summary, mode));

    if let Some(id) = backup_id {
        println!("\nBackup ID: {}", id);
        println!("Rollback with: typeshift rollback {}", id);
    }

    tracing::info!(
        changed = summary.changed_count(),
        failed = summary.failed_count(),
        "run finished"
    );

    Ok(!summary.has_failures())
}

/// Back up only the files the run is going to change
fn create_backup(
    config: &Config,
    rewriter: &Rewriter,
    targets: &[PathBuf],
    label: &str,
) -> Result<Option<String>> {
    let changing: Vec<PathBuf> = targets
        .iter()
        .filter(|path| rewriter.preview(path).is_ok_and(|p| p.is_changed()))
        .cloned()
        .collect();

    if changing.is_empty() {
        return Ok(None);
    }

    let mut manager = backup_manager(config)?;
    let id = manager
        .create_backup(label, &changing)
        .context("Failed to create backup; no files were modified")?;
    Ok(Some(id))
}

fn rollback(config: &Config, id: Option<String>) -> Result<()> {
    let manager = backup_manager(config)?;

    let backup_id = match id {
        Some(id) => id,
        None => match manager.get_last_backup_id()? {
            Some(id) => {
                println!("Rolling back last operation: {}\n", id);
                id
            }
            None => anyhow::bail!("No backups found to rollback"),
        },
    };

    for path in manager.restore_backup(&backup_id)? {
        println!("Restored: {}", path.display());
    }
    println!("\n✅ Rollback complete");

    Ok(())
}

fn show_config(config: &Config, source: Option<&Path>, show: bool, init: bool) -> Result<()> {
    if init {
        let path = PathBuf::from(config::PROJECT_CONFIG_FILE);
        config::init_config(&path)?;
        println!("Created {}", path.display());
        return Ok(());
    }

    match source {
        Some(path) => println!("# Loaded from {}\n", path.display()),
        None => println!("# No config file found, using defaults\n"),
    }
    if !show {
        println!("# Run 'typeshift config --init' to create {}\n", config::PROJECT_CONFIG_FILE);
    }

    let toml_str = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", toml_str);
    Ok(())
}

//! Configuration management for typeshift
//!
//! Looked up in order: an explicit `--config` path, `./.typeshift.toml`,
//! then `~/.typeshift/config.toml`. Missing files fall back to defaults;
//! nothing is created unless `typeshift config --init` is run.

use crate::rules::{RewriteRule, RuleSet, RuleSetKind, Strategy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const PROJECT_CONFIG_FILE: &str = ".typeshift.toml";

const MAX_CONTEXT_LINES: usize = 10;

/// Test files the migration was written for
pub const DEFAULT_TARGETS: &[&str] = &[
    "src/utils/ts/print.test.ts",
    "src/utils/mask/mask.test-d.ts",
    "src/domains/str/match.test-d.ts",
    "src/utils/err/try.test.ts",
    "src/utils/sch/$.test-d.ts",
    "src/utils/ts/relation.test.ts",
    "src/utils/config-manager/ConfigManager.test.ts",
    "src/utils/fs/$.test.ts",
    "src/domains/group/$.test.ts",
    "src/domains/idx/$.test.ts",
    "src/domains/obj/filter.test-d.ts",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub targets: TargetsConfig,

    #[serde(default)]
    pub rewrite: RewriteConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Extra rules, applied after the built-in set in file order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsConfig {
    /// Files to rewrite; empty means the built-in list
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewriteConfig {
    #[serde(default)]
    pub ruleset: RuleSetKind,

    #[serde(default)]
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Context lines around changes in dry-run diffs
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,

    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
            color: default_color(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    pub pattern: String,
    pub replacement: String,

    /// Let `.` match newlines
    #[serde(default)]
    pub multiline: bool,
}

fn default_context_lines() -> usize { 2 }
fn default_color() -> bool { true }

impl Config {
    /// Target files from config, or the built-in list
    pub fn target_files(&self) -> Vec<PathBuf> {
        if self.targets.files.is_empty() {
            DEFAULT_TARGETS.iter().map(PathBuf::from).collect()
        } else {
            self.targets.files.iter().map(PathBuf::from).collect()
        }
    }

    /// Built-in rules for the configured set and strategy, then the extra rules
    pub fn build_rules(&self) -> Result<RuleSet> {
        let mut rules = RuleSet::builtin(self.rewrite.ruleset, self.rewrite.strategy)?;
        for rule in &self.rules {
            rules.push(compile_rule(rule)?);
        }
        Ok(rules)
    }
}

fn compile_rule(rule: &RuleConfig) -> Result<RewriteRule> {
    if rule.multiline {
        RewriteRule::multiline_pattern(rule.name.as_str(), &rule.pattern, &rule.replacement)
    } else {
        RewriteRule::pattern(rule.name.as_str(), &rule.pattern, &rule.replacement)
    }
}

/// Get the per-user configuration file path
pub fn user_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".typeshift").join("config.toml"))
}

/// Find the config file to use, if any
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let project = PathBuf::from(PROJECT_CONFIG_FILE);
    if project.exists() {
        return Ok(Some(project));
    }

    let user = user_config_path()?;
    if user.exists() {
        return Ok(Some(user));
    }

    Ok(None)
}

/// Load and validate configuration
///
/// Returns the config and the file it came from (`None` for defaults).
pub fn load_config(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    let Some(path) = resolve_config_path(explicit)? else {
        return Ok((Config::default(), None));
    };

    let config = load_config_from(&path)?;
    Ok((config, Some(path)))
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = parse_config(&config_str)
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}

pub fn parse_config(config_str: &str) -> Result<Config> {
    let config: Config = toml::from_str(config_str).context("Failed to parse TOML")?;
    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    if config.output.context_lines > MAX_CONTEXT_LINES {
        anyhow::bail!(
            "Invalid context_lines: {} (max {})",
            config.output.context_lines,
            MAX_CONTEXT_LINES
        );
    }

    for (i, rule) in config.rules.iter().enumerate() {
        if rule.name.trim().is_empty() {
            anyhow::bail!("Rule #{} has an empty name", i + 1);
        }
        if rule.pattern.is_empty() {
            anyhow::bail!("Rule '{}' has an empty pattern", rule.name);
        }
        compile_rule(rule)?;
    }

    Ok(())
}

/// Get the default configuration file content with comments
pub fn default_config_content() -> String {
    let mut targets = String::new();
    for target in DEFAULT_TARGETS {
        targets.push_str(&format!("  \"{}\",\n", target));
    }

    format!(
        r#"# typeshift configuration
#
# Command-line flags override values set here.

[targets]
# Files to rewrite, relative to the project root.
# Leave empty to use the built-in list.
files = [
{targets}]

[rewrite]
# "all" (every assertion form) or "remaining" (toEqualTypeOf<T>() forms only)
ruleset = "all"

# "regex" stops at the first closing delimiter.
# "balanced" tracks bracket nesting, so operands like fn(a) or Map<K, V> work.
strategy = "regex"

[output]
# Context lines around changes in --dry-run diffs (max 10)
context_lines = 2
color = true

[backup]
# Copy files to ~/.typeshift/backups before rewriting them
enabled = false
#backup_dir = "/mnt/backups/typeshift"

[logging]
# Write a debug log to ~/.typeshift/typeshift.log
debug = false

# Extra rules run after the built-in ones, in this order.
# Group references may be written \1 or ${{1}}; a literal $ is $$.
#[[rules]]
#name = "assert-type"
#pattern = 'assertType<(.+?)>\((.+?)\)'
#replacement = 'Ts.Assert.exact.ofAs<\1>().on(\2)'
"#
    )
}

/// Write the commented template to `path`, refusing to overwrite
pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config file already exists: {}", path.display());
    }
    fs::write(path, default_config_content())
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

use crate::backup_manager::BackupMetadata;
use crate::error::RewriteError;
use crate::processor::{FileOutcome, FileReport, Mode, Preview, RunSummary};
use crate::rules::RuleSet;
use colored::*;
use similar::TextDiff;
use std::path::Path;

/// Console output for a run
pub struct Reporter {
    use_color: bool,
    context: usize,
}

impl Reporter {
    pub fn new(use_color: bool, context: usize) -> Self {
        Self { use_color, context }
    }

    /// Auto-detect if we should use colors
    ///
    /// `colored` already honours NO_COLOR, CLICOLOR and whether stdout is a terminal.
    pub fn should_use_color(enabled: bool) -> bool {
        enabled && colored::control::SHOULD_COLORIZE.should_colorize()
    }

    /// Print the line (and dry-run diff) for one processed file
    pub fn print_file(&self, report: &FileReport, mode: Mode) {
        match &report.outcome {
            FileOutcome::Changed => {
                println!("{}", self.format_changed(&report.path, mode));
                if let Some(preview) = &report.preview {
                    print!("{}", self.format_diff(preview));
                }
            }
            FileOutcome::Unchanged => println!("{}", self.format_unchanged(&report.path)),
            FileOutcome::Failed(err) => eprintln!("{}", self.format_error(err)),
        }
    }

    pub fn format_changed(&self, path: &Path, mode: Mode) -> String {
        let (marker, verb) = match mode {
            Mode::Apply => ("✓", "Fixed"),
            Mode::DryRun => ("~", "Would fix"),
        };
        if self.use_color {
            format!("{} {} {}", marker.green().bold(), verb, path.display().to_string().bold())
        } else {
            format!("{} {} {}", marker, verb, path.display())
        }
    }

    pub fn format_unchanged(&self, path: &Path) -> String {
        let line = format!("  No changes in {}", path.display());
        if self.use_color {
            line.dimmed().to_string()
        } else {
            line
        }
    }

    /// Error line for a failed file, followed by suggested fixes when there are any
    pub fn format_error(&self, err: &RewriteError) -> String {
        let head = format!("Error processing {}:", err.path().display());
        let mut output = if self.use_color {
            format!("{} {}", head.red().bold(), err)
        } else {
            format!("{} {}", head, err)
        };

        if let Some(hint) = err.hint() {
            output.push_str("\n\n");
            for line in hint.lines() {
                if !line.is_empty() {
                    output.push_str("    ");
                    output.push_str(line);
                }
                output.push('\n');
            }
        }

        output
    }

    /// Unified diff between the original and rewritten text
    pub fn format_diff(&self, preview: &Preview) -> String {
        let name = preview.path.display().to_string();
        let diff = TextDiff::from_lines(&preview.original, &preview.rewritten);
        let unified = diff
            .unified_diff()
            .context_radius(self.context)
            .header(&format!("a/{}", name), &format!("b/{}", name))
            .to_string();

        if !self.use_color {
            return unified;
        }

        let mut output = String::with_capacity(unified.len());
        for line in unified.lines() {
            let colored_line = if line.starts_with("+++") || line.starts_with("---") {
                line.bold().to_string()
            } else if line.starts_with("@@") {
                line.cyan().to_string()
            } else if line.starts_with('+') {
                line.green().to_string()
            } else if line.starts_with('-') {
                line.red().to_string()
            } else {
                line.dimmed().to_string()
            };
            output.push_str(&colored_line);
            output.push('\n');
        }
        output
    }

    pub fn format_summary(&self, summary: &RunSummary, mode: Mode) -> String {
        let verb = match mode {
            Mode::Apply => "Fixed",
            Mode::DryRun => "Would fix",
        };
        let changed = summary.changed_count();
        let failed = summary.failed_count();

        let mut output = if self.use_color {
            format!("\n{} {} files", verb, changed.to_string().bold().white())
        } else {
            format!("\n{} {} files", verb, changed)
        };

        if failed > 0 {
            let failures = format!("{} failed", failed);
            if self.use_color {
                output.push_str(&format!(", {}", failures.red()));
            } else {
                output.push_str(&format!(", {}", failures));
            }
        }
        output
    }

    /// Numbered list of the active rules in application order
    pub fn format_rules(&self, rules: &RuleSet) -> String {
        let mut output = String::new();
        for (i, rule) in rules.rules().iter().enumerate() {
            if self.use_color {
                output.push_str(&format!("{:>2}. {}\n", i + 1, rule.to_string().cyan()));
            } else {
                output.push_str(&format!("{:>2}. {}\n", i + 1, rule));
            }
        }
        output
    }

    pub fn format_history(&self, backups: &[BackupMetadata]) -> String {
        if backups.is_empty() {
            return "No backups found.".to_string();
        }

        let mut output = String::from("Backup history (most recent first):\n\n");
        for backup in backups.iter().rev() {
            let id = if self.use_color {
                backup.id.yellow().to_string()
            } else {
                backup.id.clone()
            };
            output.push_str(&format!(
                "{}  {}  {}\n",
                id,
                backup.timestamp.format("%Y-%m-%d %H:%M:%S"),
                backup.label
            ));
            for file in &backup.files {
                output.push_str(&format!("    {}\n", file.original_path.display()));
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup_manager::FileBackup;
    use crate::rules::{RuleSetKind, Strategy};
    use chrono::Utc;
    use std::io;
    use std::path::PathBuf;

    fn plain() -> Reporter {
        Reporter::new(false, 1)
    }

    fn report(path: &str, outcome: FileOutcome) -> FileReport {
        FileReport {
            path: PathBuf::from(path),
            outcome,
            preview: None,
        }
    }

    #[test]
    fn test_changed_and_unchanged_lines() {
        let r = plain();
        let path = Path::new("src/utils/ts/print.test.ts");
        assert_eq!(r.format_changed(path, Mode::Apply), "✓ Fixed src/utils/ts/print.test.ts");
        assert_eq!(r.format_changed(path, Mode::DryRun), "~ Would fix src/utils/ts/print.test.ts");
        assert_eq!(r.format_unchanged(path), "  No changes in src/utils/ts/print.test.ts");
    }

    #[test]
    fn test_error_line_with_hint() {
        let err =
            RewriteError::read(Path::new("gone.ts"), io::Error::new(io::ErrorKind::NotFound, "x"));
        let out = plain().format_error(&err);
        assert!(out.starts_with("Error processing gone.ts: file not found: gone.ts"));
        assert!(out.contains("    Possible fixes:"));
    }

    #[test]
    fn test_summary() {
        let summary = RunSummary {
            reports: vec![
                report("a.ts", FileOutcome::Changed),
                report("b.ts", FileOutcome::Unchanged),
                report("c.ts", FileOutcome::Changed),
            ],
        };
        assert_eq!(plain().format_summary(&summary, Mode::Apply), "\nFixed 2 files");
        assert_eq!(plain().format_summary(&summary, Mode::DryRun), "\nWould fix 2 files");
    }

    #[test]
    fn test_summary_with_failures() {
        let err =
            RewriteError::read(Path::new("b.ts"), io::Error::new(io::ErrorKind::NotFound, "x"));
        let summary = RunSummary {
            reports: vec![
                report("a.ts", FileOutcome::Unchanged),
                report("b.ts", FileOutcome::Failed(err)),
            ],
        };
        assert_eq!(plain().format_summary(&summary, Mode::Apply), "\nFixed 0 files, 1 failed");
    }

    #[test]
    fn test_diff_output() {
        let preview = Preview {
            path: PathBuf::from("x.test.ts"),
            original: "a\nexpectTypeOf<A>().toEqualTypeOf<B>()\nb\n".to_string(),
            rewritten: "a\nTs.Assert.exact.ofAs<B>().onAs<A>()\nb\n".to_string(),
        };
        let out = plain().format_diff(&preview);
        assert!(out.contains("--- a/x.test.ts"));
        assert!(out.contains("+++ b/x.test.ts"));
        assert!(out.contains("-expectTypeOf<A>().toEqualTypeOf<B>()"));
        assert!(out.contains("+Ts.Assert.exact.ofAs<B>().onAs<A>()"));
        assert!(out.contains(" a\n"));
    }

    #[test]
    fn test_rules_listing() {
        let rules = RuleSet::builtin(RuleSetKind::Remaining, Strategy::Regex).unwrap();
        let out = plain().format_rules(&rules);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(" 1. value-equal-type"));
        assert!(lines[1].starts_with(" 2. type-equal-type"));
    }

    #[test]
    fn test_history() {
        assert_eq!(plain().format_history(&[]), "No backups found.");

        let backups = vec![
            BackupMetadata {
                id: "older".to_string(),
                timestamp: Utc::now(),
                label: "typeshift all/regex".to_string(),
                files: vec![FileBackup {
                    original_path: PathBuf::from("a.ts"),
                    backup_path: PathBuf::from("/b/0-a.ts"),
                }],
            },
            BackupMetadata {
                id: "newer".to_string(),
                timestamp: Utc::now(),
                label: "typeshift all/regex".to_string(),
                files: vec![],
            },
        ];
        let out = plain().format_history(&backups);
        assert!(out.find("newer").unwrap() < out.find("older").unwrap());
        assert!(out.contains("    a.ts"));
    }
}

use crate::error::RewriteError;
use crate::rules::RuleSet;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Original and rewritten text of one file
#[derive(Debug, Clone)]
pub struct Preview {
    pub path: PathBuf,
    pub original: String,
    pub rewritten: String,
}

impl Preview {
    pub fn is_changed(&self) -> bool {
        self.original != self.rewritten
    }
}

/// Whether files are written or only previewed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Apply,
    DryRun,
}

#[derive(Debug)]
pub enum FileOutcome {
    Changed,
    Unchanged,
    Failed(RewriteError),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
    /// Present for changed files in dry-run mode
    pub preview: Option<Preview>,
}

/// Outcomes of a batch, in processing order
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<FileReport>,
}

impl RunSummary {
    pub fn changed_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Changed))
    }

    pub fn unchanged_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Unchanged))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Applies a rule set to files, writing back only what changed
pub struct Rewriter {
    rules: RuleSet,
}

impl Rewriter {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn rewrite_str<'a>(&self, content: &'a str) -> Cow<'a, str> {
        self.rules.apply(content)
    }

    /// Read and rewrite a file in memory without touching it on disk
    pub fn preview(&self, path: &Path) -> Result<Preview, RewriteError> {
        let original = fs::read_to_string(path).map_err(|e| RewriteError::read(path, e))?;
        let rewritten = self.rules.apply(&original).into_owned();

        Ok(Preview {
            path: path.to_path_buf(),
            original,
            rewritten,
        })
    }

    /// Rewrite a file in place. Returns `true` if the content changed.
    ///
    /// An unchanged file is never written.
    pub fn rewrite(&self, path: &Path) -> Result<bool, RewriteError> {
        let original = fs::read_to_string(path).map_err(|e| RewriteError::read(path, e))?;

        let rewritten = match self.rules.apply(&original) {
            Cow::Borrowed(_) => return Ok(false),
            Cow::Owned(text) if text == original => return Ok(false),
            Cow::Owned(text) => text,
        };

        write_in_place(path, &rewritten)?;
        tracing::info!(path = %path.display(), "rewrote file");
        Ok(true)
    }
}

/// Replace `path` with `content` through a temp file next to the real file
///
/// Symlinks are resolved first so the link stays a link and its target is
/// the file that changes.
fn write_in_place(path: &Path, content: &str) -> Result<(), RewriteError> {
    let target = fs::canonicalize(path).map_err(|e| RewriteError::write(path, e))?;
    let parent_dir = target.parent().unwrap_or(Path::new("."));

    let mut temp_file =
        NamedTempFile::new_in(parent_dir).map_err(|e| RewriteError::write(path, e))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| RewriteError::write(path, e))?;
    temp_file.flush().map_err(|e| RewriteError::write(path, e))?;

    // Keep the target's mode; the temp file is created 0600
    if let Ok(metadata) = fs::metadata(&target) {
        temp_file
            .as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| RewriteError::write(path, e))?;
    }

    temp_file
        .persist(&target)
        .map_err(|e| RewriteError::write(path, e.error))?;
    Ok(())
}

/// Process `paths` one at a time, in order
///
/// A failing file is recorded and the batch continues. Repeated paths are
/// processed once. `on_file` sees each report as soon as it is available.
pub fn run<F>(rewriter: &Rewriter, paths: &[PathBuf], mode: Mode, mut on_file: F) -> RunSummary
where
    F: FnMut(&FileReport),
{
    let mut summary = RunSummary::default();
    let mut seen = HashSet::new();

    for path in paths {
        if !seen.insert(path.as_path()) {
            tracing::debug!(path = %path.display(), "skipping duplicate target");
            continue;
        }

        let _span = tracing::info_span!("file", path = %path.display()).entered();

        let result = match mode {
            Mode::Apply => rewriter.rewrite(path).map(|changed| (changed, None)),
            Mode::DryRun => rewriter.preview(path).map(|p| {
                let changed = p.is_changed();
                (changed, changed.then_some(p))
            }),
        };

        let report = match result {
            Ok((true, preview)) => FileReport {
                path: path.clone(),
                outcome: FileOutcome::Changed,
                preview,
            },
            Ok((false, _)) => FileReport {
                path: path.clone(),
                outcome: FileOutcome::Unchanged,
                preview: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to process file");
                FileReport {
                    path: path.clone(),
                    outcome: FileOutcome::Failed(e),
                    preview: None,
                }
            }
        };

        on_file(&report);
        summary.reports.push(report);
    }

    summary
}

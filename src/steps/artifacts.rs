//! Artifact materializer - the application tree under the install directory

use anyhow::{Context, Result, bail};
use runbook::{ApplyContext, ApplyResult, FailAs, FailureKind, Step, StepError};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Top-level source entries never copied: repository metadata and the
/// scraper's data file, which the running service appends to
const ALWAYS_SKIP: &[&str] = &[".git", "defi_oi_data.csv"];

/// Copies the source tree into the install directory and hands it to the
/// service account.
///
/// The copy is additive: files already in the install directory that are
/// not in the source tree are left where they are.
#[derive(Debug, Clone)]
pub struct ArtifactMaterializer {
    pub source_dir: PathBuf,
    pub install_dir: PathBuf,
    pub owner: String,
    /// Additional top-level names to leave out (the virtualenv)
    pub skip: Vec<String>,
}

/// What a copy did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
    pub links: usize,
}

impl ArtifactMaterializer {
    pub fn new(source_dir: impl Into<PathBuf>, install_dir: impl Into<PathBuf>, owner: &str) -> Self {
        Self {
            source_dir: source_dir.into(),
            install_dir: install_dir.into(),
            owner: owner.to_string(),
            skip: Vec::new(),
        }
    }

    pub fn skipping(mut self, name: impl Into<String>) -> Self {
        self.skip.push(name.into());
        self
    }

    fn is_skipped(&self, entry: &DirEntry, nested: Option<&Path>) -> bool {
        if let Some(nested) = nested
            && entry.path().strip_prefix(&self.source_dir).is_ok_and(|rel| rel == nested)
        {
            return true;
        }
        if entry.depth() != 1 {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        ALWAYS_SKIP.contains(&name.as_ref()) || self.skip.iter().any(|s| *s == name)
    }

    /// Where the install directory sits inside the source tree, if it does
    ///
    /// The walk must not descend into it or it would copy into itself.
    fn nested_install_dir(&self) -> Option<PathBuf> {
        let source = self.source_dir.canonicalize().ok()?;
        let install = self.install_dir.canonicalize().ok()?;
        install
            .strip_prefix(&source)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    /// Whether source and destination are the same directory
    fn is_in_place(&self) -> bool {
        match (self.source_dir.canonicalize(), self.install_dir.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Recursively copy the source tree over the install directory
    pub fn copy_tree(&self) -> Result<CopyStats> {
        if !self.source_dir.is_dir() {
            bail!("Source tree not found: {}", self.source_dir.display());
        }

        let nested = self.nested_install_dir();
        if let Some(rel) = &nested {
            log::warn!(
                "Install directory is inside the source tree; not copying {}",
                rel.display()
            );
        }

        let mut stats = CopyStats::default();
        let walker = WalkDir::new(&self.source_dir)
            .min_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.is_skipped(e, nested.as_deref()));

        for entry in walker {
            let entry = entry.context("Failed to walk source tree")?;
            let relative = entry.path().strip_prefix(&self.source_dir)?;
            let target = self.install_dir.join(relative);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("Failed to create {}", target.display()))?;
                stats.dirs += 1;
            } else if file_type.is_symlink() {
                copy_link(entry.path(), &target)?;
                stats.links += 1;
            } else {
                copy_file(entry.path(), &target)?;
                stats.files += 1;
            }
        }

        Ok(stats)
    }

    fn chown(&self, ctx: &ApplyContext) -> Result<()> {
        // Trailing colon: the account's login group, whatever it is named
        let owner = format!("{}:", self.owner);
        let dir = self.install_dir.to_string_lossy();
        ctx.run_checked("chown", &["-R", &owner, &dir])
            .with_context(|| format!("Failed to hand {} to '{}'", dir, self.owner))?;
        Ok(())
    }
}

fn remove_existing(target: &Path) -> Result<()> {
    if target.is_symlink() || target.is_file() {
        fs::remove_file(target)
            .with_context(|| format!("Failed to replace {}", target.display()))?;
    }
    Ok(())
}

fn copy_file(source: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    // Never write through a link left behind by an earlier deploy
    if target.is_symlink() {
        remove_existing(target)?;
    }
    fs::copy(source, target).with_context(|| {
        format!(
            "Failed to copy {} -> {}",
            source.display(),
            target.display()
        )
    })?;
    Ok(())
}

fn copy_link(source: &Path, target: &Path) -> Result<()> {
    let link = fs::read_link(source)
        .with_context(|| format!("Failed to read symlink {}", source.display()))?;
    remove_existing(target)?;
    std::os::unix::fs::symlink(&link, target).with_context(|| {
        format!(
            "Failed to create symlink: {} -> {}",
            target.display(),
            link.display()
        )
    })?;
    Ok(())
}

impl Step for ArtifactMaterializer {
    fn id(&self) -> &'static str {
        "artifacts"
    }

    fn description(&self) -> String {
        format!(
            "Copy application into {} owned by '{}'",
            self.install_dir.display(),
            self.owner
        )
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult, StepError> {
        let existed = self.install_dir.is_dir();
        fs::create_dir_all(&self.install_dir)
            .with_context(|| format!("Failed to create {}", self.install_dir.display()))
            .fail_as(FailureKind::Provision)?;

        if self.is_in_place() {
            log::warn!(
                "Source tree is the install directory ({}); skipping copy",
                self.install_dir.display()
            );
        } else {
            let stats = self.copy_tree().fail_as(FailureKind::Provision)?;
            log::info!(
                "Copied {} files, {} directories, {} links into {}",
                stats.files,
                stats.dirs,
                stats.links,
                self.install_dir.display()
            );
        }

        // Ownership is re-applied on every run, whatever it was before
        self.chown(ctx).fail_as(FailureKind::Provision)?;

        Ok(if existed {
            ApplyResult::Modified
        } else {
            ApplyResult::Created
        })
    }
}

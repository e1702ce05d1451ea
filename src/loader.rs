//! Document loading from the configured document root.
//!
//! [`load_documents`] runs once at startup: it walks the root recursively,
//! reads every file whose extension is in the allow-set, and reports each
//! attempt as a [`FileOutcome`]. Nothing here returns an error: a missing
//! root is created empty, and unreadable files are skipped with a warning.
//!
//! [`list_documents`] is the live counterpart used by `GET /documents`. It
//! is recomputed on every call and is independent of the startup context.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::DocumentsConfig;
use crate::models::Document;

/// Result of trying to load one candidate file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Loaded(Document),
    Skipped { path: PathBuf, reason: String },
}

/// Aggregated result of a load pass.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub skipped: Vec<(PathBuf, String)>,
    /// True if the root did not exist and was created by this pass.
    pub created_root: bool,
}

impl LoadReport {
    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Loaded(doc) => self.documents.push(doc),
            FileOutcome::Skipped { path, reason } => self.skipped.push((path, reason)),
        }
    }

    /// Concatenated, headered context string for prompt assembly.
    pub fn context(&self) -> String {
        build_context(&self.documents)
    }
}

/// Walks `config.root` and loads every file with an allowed extension.
pub fn load_documents(config: &DocumentsConfig) -> LoadReport {
    let root = &config.root;
    let mut report = LoadReport::default();

    if !root.exists() {
        warn!(root = %root.display(), "document root not found, creating it");
        match std::fs::create_dir_all(root) {
            Ok(()) => report.created_root = true,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "failed to create document root");
            }
        }
        return report;
    }

    let exclude_set = match build_globset(&config.exclude_globs) {
        Ok(set) => set,
        Err(e) => {
            warn!(error = %e, "ignoring invalid exclude globs");
            GlobSet::empty()
        }
    };

    let mut candidates = Vec::new();
    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                report.record(FileOutcome::Skipped {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(relative) {
            continue;
        }

        let allowed = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| config.accepts_extension(e));
        if allowed {
            candidates.push(path.to_path_buf());
        }
    }

    // Sort for deterministic ordering
    candidates.sort();

    for path in candidates {
        report.record(load_file(&path));
    }

    for (path, reason) in &report.skipped {
        warn!(path = %path.display(), reason = %reason, "skipped document");
    }

    report
}

/// Reads a single file as UTF-8.
pub fn load_file(path: &Path) -> FileOutcome {
    let name = file_name(path);
    match std::fs::read_to_string(path) {
        Ok(content) => {
            info!(name = %name, "loaded document");
            FileOutcome::Loaded(Document { name, content })
        }
        Err(e) => FileOutcome::Skipped {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    }
}

/// Joins documents into the context string, each preceded by a
/// `--- Document: <name> ---` header line.
pub fn build_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| format!("--- Document: {} ---\n{}\n", doc.name, doc.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lists the names of all files currently under `root`, recursively and
/// regardless of extension. A missing root yields an empty list.
pub fn list_documents(root: &Path) -> Vec<String> {
    if !root.exists() {
        return Vec::new();
    }

    let mut names: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| file_name(entry.path()))
        .collect();
    names.sort();
    names
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

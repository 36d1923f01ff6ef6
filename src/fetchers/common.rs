//! File selection shared by every ingestion strategy.
//!
//! Whatever the transport, a repository is reduced to a list of relative
//! paths, ranked, capped, and read. Keeping this in one place means the API
//! strategy and the local strategies pick the same files for the same tree.

use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use crate::types::{FetchedContent, FetchedFile, RepositoryProfile};
use crate::utils::truncate_chars;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Extensions worth showing to the model
pub const CODE_EXTENSIONS: &[&str] = &[
    // Systems programming languages
    "rs", "go", "c", "cpp", "cc", "h", "hpp",
    // Web development
    "js", "ts", "jsx", "tsx", "mjs", "html", "css", "scss", "vue", "svelte",
    // Scripting languages
    "py", "rb", "php", "sh", "bash", "lua",
    // JVM and .NET languages
    "java", "kt", "scala", "groovy", "cs", "fs",
    // Mobile development
    "swift", "m", "dart",
    // Configuration and docs
    "json", "yml", "yaml", "toml", "md", "rst", "sql",
];

/// Well-known files that carry no useful extension
pub const MANIFEST_NAMES: &[&str] = &[
    "Cargo.toml", "package.json", "requirements.txt", "pyproject.toml", "setup.py",
    "go.mod", "pom.xml", "build.gradle", "Gemfile", "composer.json",
    "Makefile", "CMakeLists.txt", "Dockerfile", "docker-compose.yml",
];

/// Directories never descended into
pub const IGNORED_DIRS: &[&str] = &[
    ".git", "node_modules", "target", "dist", "build", "out", "venv", ".venv",
    "__pycache__", "vendor", ".idea", ".vscode", ".pytest_cache", "coverage",
];

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__", "spec"];

// Earlier patterns weigh more.
const PRIORITY_PATTERNS: &[&str] = &[
    // Documentation
    "readme",
    // Manifests
    "cargo.toml", "package.json", "pyproject.toml", "requirements.txt", "go.mod",
    "pom.xml", "build.gradle", "gemfile", "dockerfile", "makefile",
    // Entry points
    "main.rs", "lib.rs", "main.go", "main.py", "app.py", "__init__.py",
    "index.js", "index.ts", "app.js", "app.ts", "server.js", "server.ts",
    "main.c", "main.cpp", "main.java",
    // Core modules
    "src/", "lib/", "app/", "core/", "internal/", "pkg/",
];

/// Whether a repository-relative path may be shown to the model
pub fn is_candidate(path: &str) -> bool {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(file_name) = segments.pop() else {
        return false;
    };

    if segments.iter().any(|dir| IGNORED_DIRS.contains(dir) || dir.starts_with('.')) {
        return false;
    }

    if MANIFEST_NAMES.contains(&file_name) || file_name.to_lowercase().starts_with("readme") {
        return true;
    }

    if file_name.starts_with('.') {
        return false;
    }

    file_name
        .rsplit_once('.')
        .map(|(_, ext)| CODE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Higher is more important
pub fn priority_score(path: &str) -> i64 {
    let lower = path.to_lowercase();
    let file_name = lower.rsplit('/').next().unwrap_or(&lower);
    let depth = lower.matches('/').count() as i64;

    let mut score = -depth * 10;
    for (idx, pattern) in PRIORITY_PATTERNS.iter().enumerate() {
        let weight = (PRIORITY_PATTERNS.len() - idx) as i64;
        let hit = if pattern.ends_with('/') {
            lower.starts_with(pattern)
        } else if *pattern == "readme" {
            depth == 0 && file_name.starts_with(pattern)
        } else {
            file_name == *pattern
        };
        if hit {
            score += weight * 5;
        }
    }

    if is_test_path(&lower) {
        score -= 25;
    }
    score
}

/// Picks at most `max_files` paths, most important first.
///
/// The first half of the budget goes to the highest-scoring files; the rest
/// prefers directories not yet represented so one large module cannot crowd
/// out the others. Ties are broken by path, so the result is deterministic.
pub fn select_important_files(paths: &[String], max_files: usize) -> Vec<String> {
    let mut scored: Vec<(i64, &String)> = paths.iter().map(|p| (priority_score(p), p)).collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);

    if scored.len() <= max_files {
        return scored.into_iter().map(|(_, p)| p.clone()).collect();
    }

    let mut selected: Vec<(i64, &String)> = Vec::with_capacity(max_files);
    let mut selected_dirs = HashSet::new();

    for entry in scored.iter().take(max_files / 2) {
        selected_dirs.insert(parent_dir(entry.1));
        selected.push(*entry);
    }

    for entry in scored.iter().skip(max_files / 2) {
        if selected.len() >= max_files {
            break;
        }
        if selected_dirs.insert(parent_dir(entry.1)) {
            selected.push(*entry);
        }
    }

    for entry in scored.iter() {
        if selected.len() >= max_files {
            break;
        }
        if !selected.iter().any(|(_, p)| *p == entry.1) {
            selected.push(*entry);
        }
    }

    selected.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    selected.into_iter().map(|(_, p)| p.clone()).collect()
}

/// Derives the repository profile from every file path in the tree
pub fn build_profile(all_paths: &[String], candidates: usize) -> RepositoryProfile {
    let has_root = |name: &str| all_paths.iter().any(|p| p == name);

    let project_type = if has_root("Cargo.toml") {
        "rust"
    } else if has_root("package.json") {
        "nodejs"
    } else if has_root("requirements.txt") || has_root("pyproject.toml") || has_root("setup.py") {
        "python"
    } else if has_root("go.mod") {
        "go"
    } else if has_root("pom.xml") || has_root("build.gradle") {
        "java"
    } else {
        "unknown"
    };

    RepositoryProfile {
        project_type: project_type.to_string(),
        readme_present: all_paths
            .iter()
            .any(|p| !p.contains('/') && p.to_lowercase().starts_with("readme")),
        tests_present: all_paths.iter().any(|p| is_test_path(&p.to_lowercase())),
        files_considered: candidates,
    }
}

/// Turns raw bytes into a `FetchedFile`, or `None` for binary content
pub fn to_fetched_file(path: &str, bytes: &[u8], max_chars: usize) -> Option<FetchedFile> {
    if content_inspector::inspect(bytes).is_binary() {
        debug!("Skipping binary file {}", path);
        return None;
    }

    let text = String::from_utf8_lossy(bytes);
    let (kept, truncated) = truncate_chars(&text, max_chars);
    Some(FetchedFile {
        path: path.to_string(),
        content: kept.to_string(),
        truncated,
    })
}

/// Candidate paths after the configured exclusion patterns
pub fn filter_candidates(all_paths: &[String], config: &Config) -> Result<Vec<String>> {
    let excluded = config.exclusion_set()?;
    Ok(all_paths
        .iter()
        .filter(|p| is_candidate(p) && !excluded.is_match(p))
        .cloned()
        .collect())
}

/// Reads a checked-out repository from disk.
///
/// Blocking; async callers go through [`collect_local`].
pub fn read_local_tree(root: &Path, config: &Config) -> Result<FetchedContent> {
    let mut all_paths = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !IGNORED_DIRS.contains(&&*entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().to_string())
                .collect();
            all_paths.push(parts.join("/"));
        }
    }

    let candidates = filter_candidates(&all_paths, config)?;
    let profile = build_profile(&all_paths, candidates.len());
    let selected = select_important_files(&candidates, config.ingest.max_files);

    let mut files = Vec::with_capacity(selected.len());
    for path in &selected {
        match fs::read(root.join(path)) {
            Ok(bytes) => {
                if let Some(file) = to_fetched_file(path, &bytes, config.ingest.max_file_chars) {
                    files.push(file);
                }
            }
            Err(e) => warn!("Skipping unreadable file {}: {}", path, e),
        }
    }

    if files.is_empty() {
        return Err(AnalyzerError::Fetch("no readable source files in repository".into()));
    }

    Ok(FetchedContent { files, profile })
}

/// Runs [`read_local_tree`] on the blocking pool
pub async fn collect_local(root: PathBuf, config: &Config) -> Result<FetchedContent> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || read_local_tree(&root, &config))
        .await
        .map_err(|e| AnalyzerError::Internal(format!("Join error: {}", e)))?
}

fn is_test_path(lower: &str) -> bool {
    let mut segments: Vec<&str> = lower.split('/').collect();
    let file_name = segments.pop().unwrap_or("");
    segments.iter().any(|dir| TEST_DIRS.contains(dir))
        || file_name.contains("test")
        || file_name.contains(".spec.")
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

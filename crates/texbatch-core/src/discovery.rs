//! Project discovery: find every directory holding a source document.
//!
//! Discovery never fails. A missing root or an unreadable unit is turned
//! into a [`DiscoveryWarning`] and the scan carries on.

use std::fmt;
use std::fs;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::constants::SOURCE_FILE_NAME;
use crate::project::ProjectDescriptor;

/// Non-fatal condition met while scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryWarning {
    /// The root directory does not exist.
    MissingRoot(PathBuf),
    /// A directory below the root could not be listed.
    UnreadableDirectory { path: PathBuf, reason: String },
    /// A source document could not be read (permissions, encoding).
    UnreadableSource { path: PathBuf, reason: String },
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot(path) => {
                write!(f, "project root {} not found", path.display())
            }
            Self::UnreadableDirectory { path, reason } => {
                write!(f, "cannot list {}: {reason}", path.display())
            }
            Self::UnreadableSource { path, reason } => {
                write!(f, "cannot read {}: {reason}", path.display())
            }
        }
    }
}

/// Result of a scan.
#[derive(Debug, Default, Clone)]
pub struct Discovery {
    /// Projects in traversal order.
    pub projects: Vec<ProjectDescriptor>,
    /// Conditions that caused directories or units to be skipped.
    pub warnings: Vec<DiscoveryWarning>,
}

/// Scan `root` recursively for project units.
///
/// Directories are visited depth-first with siblings sorted by name, so a
/// fixed tree always yields the same list. Symlinked directories are not
/// followed. The root itself is never a unit.
#[must_use]
pub fn discover(root: &Path) -> Discovery {
    let mut discovery = Discovery::default();

    if !root.is_dir() {
        tracing::warn!(root = %root.display(), "project root not found");
        discovery
            .warnings
            .push(DiscoveryWarning::MissingRoot(root.to_path_buf()));
        return discovery;
    }

    walk(root, &mut discovery);
    tracing::debug!(
        projects = discovery.projects.len(),
        warnings = discovery.warnings.len(),
        "discovery finished"
    );
    discovery
}

fn walk(dir: &Path, discovery: &mut Discovery) {
    let children = match sorted_subdirectories(dir) {
        Ok(children) => children,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "cannot list directory");
            discovery.warnings.push(DiscoveryWarning::UnreadableDirectory {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            });
            return;
        }
    };

    for child in &children {
        inspect_unit(child, discovery);
        walk(child, discovery);
    }
}

fn sorted_subdirectories(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // `DirEntry::file_type` does not follow symlinks.
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn inspect_unit(dir: &Path, discovery: &mut Discovery) {
    let source = dir.join(SOURCE_FILE_NAME);
    if !source.is_file() {
        return;
    }

    match read_title(&source) {
        Ok(title) if title.is_empty() => {
            tracing::debug!(source = %source.display(), "skipping unit with empty title");
        }
        Ok(title) => {
            tracing::debug!(title = %title, entry = %dir.display(), "found project");
            discovery.projects.push(ProjectDescriptor::new(title, dir));
        }
        Err(e) => {
            tracing::warn!(source = %source.display(), error = %e, "cannot read source");
            discovery.warnings.push(DiscoveryWarning::UnreadableSource {
                path: source,
                reason: e.to_string(),
            });
        }
    }
}

/// Read the title line of a source document.
pub fn read_title(source: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(fs::File::open(source)?);
    let mut first_line = String::new();
    reader.read_line(&mut first_line)?;
    Ok(extract_title(&first_line).to_string())
}

/// Strip the leading comment markers and surrounding whitespace from a title line.
#[must_use]
pub fn extract_title(line: &str) -> &str {
    line.trim_start_matches('\u{feff}')
        .trim()
        .trim_start_matches('%')
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(root: &Path, rel: &str, first_line: &str) -> PathBuf {
        let dir = root.join(rel);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SOURCE_FILE_NAME), format!("{first_line}\nbody\n")).unwrap();
        dir
    }

    #[test]
    fn extract_title_strips_comment_marker() {
        assert_eq!(extract_title("% Limits\n"), "Limits");
        assert_eq!(extract_title("%%  Series  \r\n"), "Series");
        assert_eq!(extract_title("Plain title"), "Plain title");
        assert_eq!(extract_title("\u{feff}% BOM title"), "BOM title");
    }

    #[test]
    fn extract_title_empty() {
        assert_eq!(extract_title("%   \n"), "");
        assert_eq!(extract_title(""), "");
    }

    #[test]
    fn missing_root_is_a_warning() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("contents");
        let found = discover(&root);
        assert!(found.projects.is_empty());
        assert_eq!(found.warnings, vec![DiscoveryWarning::MissingRoot(root)]);
    }

    #[test]
    fn finds_nested_units_in_sorted_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        unit(root, "b/derivatives", "% Derivatives");
        unit(root, "a", "% Limits");
        unit(root, "a/nested", "% Sequences");
        fs::create_dir_all(root.join("empty")).unwrap();

        let found = discover(root);
        let names: Vec<&str> = found.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Limits", "Sequences", "Derivatives"]);
        assert_eq!(found.projects[0].entry, root.join("a"));
        assert!(found.warnings.is_empty());
    }

    #[test]
    fn root_itself_is_not_a_unit() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join(SOURCE_FILE_NAME), "% Root\n").unwrap();
        assert!(discover(tmp.path()).projects.is_empty());
    }

    #[test]
    fn empty_title_is_skipped_silently() {
        let tmp = tempfile::tempdir().unwrap();
        unit(tmp.path(), "blank", "%");
        unit(tmp.path(), "named", "% Integrals");

        let found = discover(tmp.path());
        assert_eq!(found.projects.len(), 1);
        assert_eq!(found.projects[0].name, "Integrals");
        assert!(found.warnings.is_empty());
    }

    #[test]
    fn undecodable_source_is_isolated() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = tmp.path().join("bad");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join(SOURCE_FILE_NAME), [0xff, 0xfe, 0x00, b'\n']).unwrap();
        unit(tmp.path(), "good", "% Vectors");

        let found = discover(tmp.path());
        assert_eq!(found.projects.len(), 1);
        assert_eq!(found.projects[0].name, "Vectors");
        assert!(matches!(
            found.warnings.as_slice(),
            [DiscoveryWarning::UnreadableSource { .. }]
        ));
    }

    #[test]
    fn source_must_be_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("odd").join(SOURCE_FILE_NAME)).unwrap();
        assert!(discover(tmp.path()).projects.is_empty());
    }

    #[test]
    fn discovery_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        unit(tmp.path(), "x", "% One");
        unit(tmp.path(), "y/z", "% Two");
        unit(tmp.path(), "y", "% Three");

        let first = discover(tmp.path()).projects;
        let second = discover(tmp.path()).projects;
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}

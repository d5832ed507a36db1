//! Candidate-file discovery for the interactive wizard.
//!
//! Looks at the working directory and the user's Downloads folder for files
//! whose extension is in the format registry. Hidden files are ignored and
//! each location lists its most recently modified files first.

use crate::formats::is_supported_extension;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Files listed per location.
pub const MAX_FILES_PER_LOCATION: usize = 15;

/// A convertible file found by [`scan_for_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
}

/// Files found in the working directory and in Downloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub cwd: Vec<FileInfo>,
    pub downloads: Vec<FileInfo>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.cwd.is_empty() && self.downloads.is_empty()
    }
}

/// Scan `cwd` and the platform Downloads directory.
///
/// Downloads is skipped when it is `cwd` itself. Unreadable directories
/// yield empty lists.
pub fn scan_for_files(cwd: &Path) -> ScanResult {
    let downloads = dirs::download_dir()
        .filter(|d| !same_dir(d, cwd))
        .map(|d| list_convertible(&d))
        .unwrap_or_default();

    ScanResult {
        cwd: list_convertible(cwd),
        downloads,
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Convertible, non-hidden regular files in `dir`, newest first.
pub fn list_convertible(dir: &Path) -> Vec<FileInfo> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<FileInfo> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                return None;
            }
            let ext = Path::new(&name).extension()?.to_str()?;
            if !is_supported_extension(ext) {
                return None;
            }
            let meta = entry.metadata().ok()?;
            if !meta.is_file() {
                return None;
            }
            Some(FileInfo {
                path: entry.path(),
                name,
                size: meta.len(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            })
        })
        .collect();

    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    files.truncate(MAX_FILES_PER_LOCATION);
    files
}

/// Menu hint for a file, e.g. `1.2 MB · 3 days ago`.
pub fn format_hint(file: &FileInfo) -> String {
    let age = SystemTime::now()
        .duration_since(file.modified)
        .unwrap_or(Duration::ZERO);
    format!("{} · {}", format_size(file.size), format_age(age))
}

/// Human-readable byte count (`512 B`, `1.5 KB`, `2.0 MB`).
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    let (n, unit) = match secs {
        0..=59 => return "just now".to_string(),
        60..=3_599 => (secs / 60, "minute"),
        3_600..=86_399 => (secs / 3_600, "hour"),
        _ => (secs / 86_400, "day"),
    };
    let plural = if n == 1 { "" } else { "s" };
    format!("{n} {unit}{plural} ago")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_only_supported_visible_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["report.pdf", "notes.md", ".secret.pdf", "binary.exe", "noext"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("folder.pdf")).unwrap();

        let mut names: Vec<_> = list_convertible(dir.path())
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();
        assert_eq!(names, ["notes.md", "report.pdf"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        assert!(list_convertible(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(2 * 1024 * 1024), "2.0 MB");
    }

    #[test]
    fn ages() {
        assert_eq!(format_age(Duration::from_secs(5)), "just now");
        assert_eq!(format_age(Duration::from_secs(60)), "1 minute ago");
        assert_eq!(format_age(Duration::from_secs(7_200)), "2 hours ago");
        assert_eq!(format_age(Duration::from_secs(3 * 86_400)), "3 days ago");
    }

    #[test]
    fn hint_combines_size_and_age() {
        let f = FileInfo {
            path: PathBuf::from("a.pdf"),
            name: "a.pdf".into(),
            size: 100,
            modified: SystemTime::now(),
        };
        assert_eq!(format_hint(&f), "100 B · just now");
    }
}

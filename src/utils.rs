use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use log::{info, warn};

/// Predicate used to pick input files out of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFilter {
    /// Extension match, case-insensitive. Accepts `"ply"` as well as `".ply"`.
    Extension(String),
    /// File name prefix match, case-sensitive.
    Prefix(String),
    PrefixAndExtension { prefix: String, extension: String },
}

impl FileFilter {
    pub fn extension(ext: &str) -> Self {
        FileFilter::Extension(ext.trim_start_matches('.').to_string())
    }

    pub fn prefix(prefix: &str) -> Self {
        FileFilter::Prefix(prefix.to_string())
    }

    pub fn prefix_and_extension(prefix: &str, ext: &str) -> Self {
        FileFilter::PrefixAndExtension {
            prefix: prefix.to_string(),
            extension: ext.trim_start_matches('.').to_string(),
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self {
            FileFilter::Extension(ext) => has_extension(path, ext),
            FileFilter::Prefix(prefix) => has_prefix(path, prefix),
            FileFilter::PrefixAndExtension { prefix, extension } => {
                has_prefix(path, prefix) && has_extension(path, extension)
            }
        }
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    let ext = ext.trim_start_matches('.');
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn has_prefix(path: &Path, prefix: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(prefix))
        .unwrap_or(false)
}

/// Lists the regular files directly inside `directory` that match `filter`, in natural order.
///
/// A missing or unreadable directory is not an error: a warning is logged and the result is
/// empty, which callers treat as "nothing left to do".
pub fn find_sorted_files(directory: &Path, filter: &FileFilter) -> Vec<PathBuf> {
    if !directory.is_dir() {
        warn!("Directory not found: {}", directory.display());
        return vec![];
    }

    let dir_entry = match directory.read_dir() {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read directory {}: {e}", directory.display());
            return vec![];
        }
    };

    let mut files = vec![];
    for entry in dir_entry {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                // We do not recursively search
                if path.is_file() && filter.matches(&path) {
                    files.push(path);
                }
            }
            Err(e) => warn!("Skipping unreadable entry in {}: {e}", directory.display()),
        }
    }
    files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));

    match (files.first(), files.last()) {
        (Some(first), Some(last)) => info!(
            "Found {} matching files in {}, first: {}, last: {}",
            files.len(),
            directory.display(),
            file_name(first),
            file_name(last)
        ),
        _ => warn!("No matching files found in {}", directory.display()),
    }
    files
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Natural ("human") ordering of two file names.
///
/// Both names are split into maximal runs of ASCII digits and of non-digits. Digit runs compare
/// by numeric value, for any length. Other characters compare one by one by code point. If every
/// compared run is equal, the shorter name sorts first, so `f1` < `f01`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (mut i, mut j) = (0, 0);

    while i < a_chars.len() && j < b_chars.len() {
        if a_chars[i].is_ascii_digit() && b_chars[j].is_ascii_digit() {
            let a_end = digit_run_end(&a_chars, i);
            let b_end = digit_run_end(&b_chars, j);
            let ord = cmp_digit_runs(&a_chars[i..a_end], &b_chars[j..b_end]);
            if ord != Ordering::Equal {
                return ord;
            }
            i = a_end;
            j = b_end;
        } else {
            let ord = a_chars[i].cmp(&b_chars[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    a_chars.len().cmp(&b_chars.len())
}

fn digit_run_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|c| !c.is_ascii_digit())
        .map(|offset| start + offset)
        .unwrap_or(chars.len())
}

/// Compares two runs of ASCII digits by value without parsing them into a fixed-width integer.
fn cmp_digit_runs(a: &[char], b: &[char]) -> Ordering {
    let a = strip_leading_zeros(a);
    let b = strip_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn strip_leading_zeros(run: &[char]) -> &[char] {
    let first_non_zero = run.iter().position(|&c| c != '0').unwrap_or(run.len());
    &run[first_non_zero..]
}

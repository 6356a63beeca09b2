//! Bounded content fingerprinting of recently modified files.
//!
//! The walker enumerates regular files under the watched roots, keeps the
//! `max_files` most recently modified, drops anything over the size ceiling
//! and hashes the rest with SHA-256.
//!
//! Ordering: candidates are ranked by modification time, newest first.
//! Files with identical modification times are ordered by path, ascending.
//! Roots that do not exist and entries that cannot be read are skipped.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, info};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::models::{FileFingerprint, HostClass};
use crate::utils::hash::sha256_reader;

/// A regular file considered for fingerprinting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

/// Directories watched by default for a host class
pub fn watched_roots(host: HostClass, home: Option<&Path>) -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Some(home) = home {
        for dir in ["Downloads", "Desktop", "Documents"] {
            roots.push(home.join(dir));
        }
    }

    match host {
        HostClass::Windows => {
            if let Some(home) = home {
                roots.push(home.join("AppData\\Local\\Temp"));
                roots.push(home.join("AppData\\Roaming\\Microsoft\\Windows\\Start Menu\\Programs\\Startup"));
            }
        }
        HostClass::Apple => {
            roots.push(PathBuf::from("/private/tmp"));
            if let Some(home) = home {
                roots.push(home.join("Library/LaunchAgents"));
            }
        }
        HostClass::Unix => {
            roots.push(PathBuf::from("/tmp"));
            roots.push(PathBuf::from("/var/tmp"));
            roots.push(PathBuf::from("/dev/shm"));
        }
    }

    roots
}

/// Enumerate every regular file under the roots that exist
pub fn enumerate_candidates(roots: &[PathBuf]) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for root in roots {
        if !root.is_dir() {
            debug!("Skipping missing watch root {}", root.display());
            continue;
        }

        for entry in WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(metadata) = entry.metadata() else { continue };
            let Ok(modified) = metadata.modified() else { continue };
            candidates.push(Candidate {
                path: entry.into_path(),
                size: metadata.len(),
                modified,
            });
        }
    }

    // Overlapping roots would otherwise count a file twice
    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    candidates.dedup_by(|a, b| a.path == b.path);
    candidates
}

/// Newest first, ties by path, truncated to `max_files`
pub fn rank_candidates(mut candidates: Vec<Candidate>, max_files: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
    candidates.truncate(max_files);
    candidates
}

struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// Hash one candidate, or `None` if it is oversized or unreadable
pub fn fingerprint_candidate(candidate: &Candidate, max_size_bytes: u64) -> Option<FileFingerprint> {
    if candidate.size > max_size_bytes {
        debug!("Skipping oversized {} ({} bytes)", candidate.path.display(), candidate.size);
        return None;
    }

    let file = match File::open(&candidate.path) {
        Ok(file) => file,
        Err(e) => {
            debug!("Cannot open {}: {}", candidate.path.display(), e);
            return None;
        }
    };

    // Bound the read in case the file grew after it was listed
    let mut reader = CountingReader {
        inner: BufReader::new(file).take(max_size_bytes.saturating_add(1)),
        count: 0,
    };
    let digest = match sha256_reader(&mut reader) {
        Ok(digest) => digest,
        Err(e) => {
            debug!("Cannot read {}: {}", candidate.path.display(), e);
            return None;
        }
    };
    if reader.count > max_size_bytes {
        debug!("{} grew past the size ceiling while hashing", candidate.path.display());
        return None;
    }

    Some(FileFingerprint {
        path: candidate.path.to_string_lossy().to_string(),
        size_bytes: reader.count,
        sha256: digest,
        modified_at: chrono::DateTime::<chrono::Utc>::from(candidate.modified).to_rfc3339(),
    })
}

/// Fingerprint the most recently modified files under `roots`
///
/// Candidates are ranked newest first (ties broken by path) and cut to
/// `max_files` before any file is opened; the survivors are hashed in
/// parallel. Unreadable entries and files over the size ceiling are skipped.
///
/// # Arguments
///
/// * `roots` - Directories to walk; missing roots are ignored
/// * `max_files` - How many of the newest files to consider
/// * `max_size_bytes` - Files larger than this are not hashed
///
/// # Returns
///
/// * `Vec<FileFingerprint>` - One fingerprint per hashed file, in rank order
///
/// # Example
///
/// ```no_run
/// use host_snapshot::collectors::fingerprint::scan;
/// use std::path::PathBuf;
///
/// let roots = vec![PathBuf::from("/home/analyst/Downloads")];
/// for fp in scan(&roots, 100, 50 * 1024 * 1024) {
///     println!("{} {}", fp.sha256, fp.path);
/// }
/// ```
pub fn scan(roots: &[PathBuf], max_files: usize, max_size_bytes: u64) -> Vec<FileFingerprint> {
    let candidates = enumerate_candidates(roots);
    let total = candidates.len();
    let selected = rank_candidates(candidates, max_files);

    let fingerprints: Vec<FileFingerprint> = selected
        .par_iter()
        .filter_map(|candidate| fingerprint_candidate(candidate, max_size_bytes))
        .collect();

    info!(
        "Fingerprinted {} of {} candidate files ({} selected)",
        fingerprints.len(),
        total,
        selected.len()
    );
    fingerprints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::write_file_aged;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_keeps_most_recent() {
        let dir = TempDir::new().unwrap();
        for (i, name) in ["e", "d", "c", "b", "a"].iter().enumerate() {
            // a is newest, e is oldest
            write_file_aged(&dir.path().join(name), name.as_bytes(), 100 * (5 - i as u64)).unwrap();
        }

        let result = scan(&[dir.path().to_path_buf()], 3, 1024);
        let names: Vec<_> = result
            .iter()
            .map(|f| Path::new(&f.path).file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_oversized_file_excluded() {
        let dir = TempDir::new().unwrap();
        write_file_aged(&dir.path().join("big.bin"), &[0u8; 2048], 10).unwrap();
        write_file_aged(&dir.path().join("small.txt"), b"tiny", 20).unwrap();

        let result = scan(&[dir.path().to_path_buf()], 10, 1024);
        assert_eq!(result.len(), 1);
        assert!(result[0].path.ends_with("small.txt"));
        assert_eq!(result[0].size_bytes, 4);
    }

    #[test]
    fn test_oversized_file_still_counts_against_max_files() {
        let dir = TempDir::new().unwrap();
        write_file_aged(&dir.path().join("big.bin"), &[0u8; 2048], 10).unwrap();
        write_file_aged(&dir.path().join("small.txt"), b"tiny", 20).unwrap();

        let result = scan(&[dir.path().to_path_buf()], 1, 1024);
        assert!(result.is_empty());
    }

    #[test]
    fn test_missing_root_contributes_nothing() {
        let dir = TempDir::new().unwrap();
        write_file_aged(&dir.path().join("kept.txt"), b"kept", 5).unwrap();
        let roots = vec![dir.path().join("does-not-exist"), dir.path().to_path_buf()];

        assert!(enumerate_candidates(&roots[..1]).is_empty());
        let result = scan(&roots, 10, 1024);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_recurses_into_subdirectories() {
        let dir = TempDir::new().unwrap();
        write_file_aged(&dir.path().join("nested/deeper/file.txt"), b"x", 5).unwrap();

        let candidates = enumerate_candidates(&[dir.path().to_path_buf()]);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].path.ends_with("nested/deeper/file.txt"));
    }

    #[test]
    fn test_tied_mtimes_ordered_by_path() {
        let now = SystemTime::now();
        let candidates = vec![
            Candidate { path: PathBuf::from("/w/b"), size: 1, modified: now },
            Candidate { path: PathBuf::from("/w/a"), size: 1, modified: now },
            Candidate { path: PathBuf::from("/w/c"), size: 1, modified: now },
        ];

        let ranked = rank_candidates(candidates, 2);
        let paths: Vec<_> = ranked.iter().map(|c| c.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("/w/a"), PathBuf::from("/w/b")]);
    }

    #[test]
    fn test_overlapping_roots_do_not_duplicate() {
        let dir = TempDir::new().unwrap();
        write_file_aged(&dir.path().join("sub/file.txt"), b"x", 5).unwrap();
        let roots = vec![dir.path().to_path_buf(), dir.path().join("sub")];

        assert_eq!(enumerate_candidates(&roots).len(), 1);
    }

    #[test]
    fn test_deleted_candidate_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.txt");
        write_file_aged(&path, b"soon gone", 5).unwrap();
        let candidates = enumerate_candidates(&[dir.path().to_path_buf()]);
        fs::remove_file(&path).unwrap();

        assert!(fingerprint_candidate(&candidates[0], 1024).is_none());
    }

    #[test]
    fn test_file_grown_past_ceiling_is_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("growing.log");
        write_file_aged(&path, b"short", 5).unwrap();
        let candidates = enumerate_candidates(&[dir.path().to_path_buf()]);
        fs::write(&path, vec![b'x'; 4096]).unwrap();

        assert!(fingerprint_candidate(&candidates[0], 1024).is_none());
    }

    #[test]
    fn test_default_roots_include_downloads() {
        let home = PathBuf::from("/home/analyst");
        for host in HostClass::ALL {
            let roots = watched_roots(host, Some(&home));
            assert!(roots.contains(&home.join("Downloads")));
        }
        assert!(watched_roots(HostClass::Unix, None).contains(&PathBuf::from("/tmp")));
    }
}

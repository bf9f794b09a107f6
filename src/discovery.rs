//! Discovery of candidate certificate files.
//!
//! Each configured root is resolved in order:
//!
//! - a directory is listed (without recursion) and every entry other than a
//!   subdirectory whose name ends with one of the configured suffixes, and
//!   does not match the exclusion pattern, becomes a candidate. FIFOs, sockets
//!   and broken symlinks are kept so they surface as load errors;
//! - anything else (regular file, missing path, FIFO, ...) is yielded as is,
//!   so the collector either loads it or reports it as a load error.
//!
//! Explicitly named roots are never filtered by suffix or exclusion pattern.

use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use std::slice;

use regex::Regex;
use tracing::{debug, warn};

/// Where to look for certificates and which directory entries to keep.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Directories or files to inspect, in order
    pub paths: Vec<PathBuf>,
    /// File name suffixes to keep when listing a directory; empty keeps all
    pub suffixes: Vec<String>,
    /// File names matching this pattern are skipped when listing a directory
    pub exclude: Option<Regex>,
}

impl SearchConfig {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        SearchConfig {
            paths,
            suffixes: Vec::new(),
            exclude: None,
        }
    }

    pub fn with_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.suffixes = suffixes;
        self
    }

    pub fn with_exclude(mut self, exclude: Option<Regex>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Whether a file found inside a directory root should be attempted.
    pub fn accepts_file_name(&self, name: &str) -> bool {
        let suffix_match = self.suffixes.is_empty()
            || self.suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()));
        if !suffix_match {
            return false;
        }
        match &self.exclude {
            Some(pattern) => !pattern.is_match(name),
            None => true,
        }
    }

    /// Lazily walks the configured roots.
    pub fn discover(&self) -> Discovery<'_> {
        Discovery::new(self)
    }
}

/// A path the collector should try to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    /// Named directly as a root rather than found inside a directory
    pub explicit: bool,
}

/// Iterator over the candidates of every configured root, in root order.
pub struct Discovery<'a> {
    config: &'a SearchConfig,
    roots: slice::Iter<'a, PathBuf>,
    listing: Option<ReadDir>,
}

impl<'a> Discovery<'a> {
    pub fn new(config: &'a SearchConfig) -> Self {
        Discovery {
            config,
            roots: config.paths.iter(),
            listing: None,
        }
    }

    fn next_in_listing(&mut self) -> Option<Candidate> {
        let listing = self.listing.as_mut()?;
        for entry in listing {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Failed to read directory entry");
                    continue;
                }
            };
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            // only subdirectories are dropped; FIFOs, sockets and broken links
            // go through so the collector reports them as load errors
            if is_dir(&path) {
                debug!(path = %path.display(), "Skipping subdirectory");
                continue;
            }
            debug!(
                file = %name,
                suffixes = ?self.config.suffixes,
                "Matching filename against suffixes"
            );
            if self.config.accepts_file_name(&name) {
                debug!(path = %path.display(), "Found certificate candidate");
                return Some(Candidate {
                    path,
                    explicit: false,
                });
            }
        }
        self.listing = None;
        None
    }
}

impl Iterator for Discovery<'_> {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            if let Some(candidate) = self.next_in_listing() {
                return Some(candidate);
            }

            let root = self.roots.next()?;
            if !is_dir(root) {
                return Some(Candidate {
                    path: root.clone(),
                    explicit: true,
                });
            }

            debug!(path = %root.display(), "Looking for certificates in directory");
            match fs::read_dir(root) {
                Ok(listing) => self.listing = Some(listing),
                Err(e) => {
                    warn!(path = %root.display(), error = %e, "Failed to list directory");
                    return Some(Candidate {
                        path: root.clone(),
                        explicit: true,
                    });
                }
            }
        }
    }
}

fn is_dir(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

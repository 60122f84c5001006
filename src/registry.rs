//! Per-folder destination lists
//!
//! A folder opts in by carrying a text file (named `extra-copies` by
//! default) with one destination folder per line.

use crate::error::Result;
use crate::folder::Destination;
use std::fs::File;
use std::io::{self, BufRead, BufReader, ErrorKind};
use std::path::Path;
use tracing::debug;

/// The ordered destinations of one source folder.
///
/// Order is the copy order. Duplicates are kept: a folder listed twice
/// receives two copies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationRegistry {
    destinations: Vec<Destination>,
}

impl DestinationRegistry {
    #[must_use]
    pub const fn new(destinations: Vec<Destination>) -> Self {
        Self { destinations }
    }

    /// Read one destination per line. Surrounding whitespace is
    /// trimmed and blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut destinations = Vec::new();
        for line in reader.lines() {
            if let Some(dest) = Destination::new(line?.trim()) {
                destinations.push(dest);
            }
        }
        Ok(Self { destinations })
    }

    /// Load `dir/file_name`.
    ///
    /// Returns `Ok(None)` when the file or `dir` does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for any other failure to open or read the file.
    pub fn load(dir: &Path, file_name: &str) -> Result<Option<Self>> {
        let path = dir.join(file_name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if is_missing(&e) => {
                debug!("extra copies: file {:?} not found", path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        debug!("extra copies: reading file {:?}", path);
        Self::parse(BufReader::new(file)).map(Some)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.destinations.iter()
    }
}

impl<'a> IntoIterator for &'a DestinationRegistry {
    type Item = &'a Destination;
    type IntoIter = std::slice::Iter<'a, Destination>;

    fn into_iter(self) -> Self::IntoIter {
        self.destinations.iter()
    }
}

/// "No such file" and "a path component is not a directory" both mean
/// the folder has no destination list.
fn is_missing(e: &io::Error) -> bool {
    matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory)
}

use std::fs::{self, OpenOptions};
use std::io::{self, Write};

use camino::Utf8Path;
use tracing::{debug, info};

use crate::error::{Result, TdgError};
use crate::resolve::{EntryKind, ResolvedTemplate};

/// Creates resolved templates on disk.
///
/// Entries are created base first, then sub-directories, then files. Missing
/// parents are never created and existing directories are errors; files are
/// touched, so an existing file is left as is. A failure, including a failed
/// write to `out`, stops the run and leaves earlier entries in place.
#[derive(Clone, Copy, Debug, Default)]
pub struct Writer {
    pub dry_run: bool,
}

impl Writer {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Create every entry of `resolved`, writing `+ <path>` to `out` after
    /// each one. Returns the number of entries handled.
    pub fn write(&self, resolved: &ResolvedTemplate, out: &mut impl Write) -> Result<usize> {
        let mut count = 0;
        for (kind, path) in resolved.entries() {
            if self.dry_run {
                debug!(path = %path, ?kind, "dry run: skipping creation");
                writeln!(out, "+ {} (dry run)", path).map_err(TdgError::Output)?;
            } else {
                create(kind, path).map_err(|source| TdgError::PathCreation {
                    path: path.to_owned(),
                    source,
                })?;
                writeln!(out, "+ {}", path).map_err(TdgError::Output)?;
            }
            count += 1;
        }

        info!(base = %resolved.base_dir, entries = count, dry_run = self.dry_run, "template written");
        Ok(count)
    }
}

fn create(kind: EntryKind, path: &Utf8Path) -> io::Result<()> {
    match kind {
        EntryKind::Dir => fs::create_dir(path),
        EntryKind::File => OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(drop),
    }
}

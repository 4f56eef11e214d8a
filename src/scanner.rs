//! Source Scanner: walks configured roots and classifies files (§4.1).

use crate::{
    error::{FortunaError, Result},
    source::{SourceFile, SourceKind},
};
use std::path::Path;
use walkdir::WalkDir;

/// Walks `deep` roots recursively and `shallow` roots non-recursively, in that order,
/// classifying every regular file that matches a known extension.
///
/// An unreadable root is fatal (it was explicitly named); an unreadable entry found
/// while walking a root is logged and skipped.
pub fn scan(deep: &[impl AsRef<Path>], shallow: &[impl AsRef<Path>]) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for root in deep {
        scan_root(root.as_ref(), usize::MAX, &mut files)?;
    }
    for root in shallow {
        scan_root(root.as_ref(), 1, &mut files)?;
    }
    Ok(files)
}

fn scan_root(root: &Path, max_depth: usize, out: &mut Vec<SourceFile>) -> Result<()> {
    if !root.exists() {
        return Err(FortunaError::ScanDir {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "root does not exist"),
        });
    }

    let walker = WalkDir::new(root).max_depth(max_depth).follow_links(true);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                // A failure while walking a directory we already confirmed exists is treated
                // as a single-file hiccup, not fatal.
                warn!("skipping unreadable entry under {}: {err}", root.display());
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(kind) = SourceKind::classify(entry.path()) {
            // Absolute, and on Windows without the `\\?\` UNC prefix `canonicalize` would
            // otherwise add — `dunce` keeps paths comparable with what a user typed.
            let path = dunce::canonicalize(entry.path()).unwrap_or_else(|_| entry.path().to_path_buf());
            out.push(SourceFile::new(path, kind));
        }
    }

    Ok(())
}

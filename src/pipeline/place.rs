//! Media placement: relocate transcoded images into the canonical media
//! directory under collision-free names.
//!
//! The package writer draws every final asset from one directory, so every
//! transcoded image must land there exactly once. [`MediaStore`] owns that
//! directory for the lifetime of a run and keeps the per-run map that makes
//! placement idempotent: placing the same transcoded path twice yields the
//! same canonical path.
//!
//! ## Collision policy
//!
//! Two *different* source documents can legitimately reference distinct
//! images that transcode to the same filename (two `figure.pdf` in
//! different directories). Silently overwriting the earlier asset would
//! corrupt earlier chapters, so collisions are disambiguated with a counter
//! suffix: `figure.jpg`, `figure-1.jpg`, `figure-2.jpg`, …. The first
//! placement keeps the plain name; each occurrence's `<img>` tag points at
//! the name its own placement returned.

use crate::error::MediaError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The canonical media directory plus the per-run placement map.
#[derive(Debug)]
pub struct MediaStore {
    dir: PathBuf,
    placed: HashMap<PathBuf, PathBuf>,
}

impl MediaStore {
    /// Wrap a directory as the canonical media directory. The directory is
    /// created lazily on first placement.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            placed: HashMap::new(),
        }
    }

    /// The canonical media directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Place a transcoded image into the canonical directory.
    ///
    /// Returns the canonical path whose file name goes into the rewritten
    /// `<img>` tag. Idempotent per transcoded path within the run.
    pub fn place(&mut self, transcoded: &Path) -> Result<PathBuf, MediaError> {
        if let Some(existing) = self.placed.get(transcoded) {
            return Ok(existing.clone());
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| MediaError::PlacementFailed {
            path: transcoded.to_path_buf(),
            detail: e.to_string(),
        })?;

        let canonical = if transcoded.parent() == Some(self.dir.as_path()) {
            transcoded.to_path_buf()
        } else {
            let target = self.unique_target(transcoded)?;
            std::fs::copy(transcoded, &target).map_err(|e| MediaError::PlacementFailed {
                path: transcoded.to_path_buf(),
                detail: e.to_string(),
            })?;
            target
        };

        debug!(
            "Placed {} -> {}",
            transcoded.display(),
            canonical.display()
        );
        self.placed
            .insert(transcoded.to_path_buf(), canonical.clone());
        Ok(canonical)
    }

    /// First free target name: `<stem>.<ext>`, then `<stem>-1.<ext>`, ….
    fn unique_target(&self, transcoded: &Path) -> Result<PathBuf, MediaError> {
        let stem = transcoded
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| MediaError::PlacementFailed {
                path: transcoded.to_path_buf(),
                detail: "source has no usable file name".to_string(),
            })?;
        let ext = transcoded
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");

        let mut candidate = self.dir.join(format!("{stem}.{ext}"));
        let mut counter = 1u32;
        while candidate.exists() {
            candidate = self.dir.join(format!("{stem}-{counter}.{ext}"));
            counter += 1;
        }
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_directory_and_copies() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("fig.jpg");
        std::fs::write(&src, b"jpegdata").unwrap();

        let media = tmp.path().join("book/media");
        let mut store = MediaStore::new(&media);
        let canonical = store.place(&src).unwrap();

        assert_eq!(canonical, media.join("fig.jpg"));
        assert_eq!(std::fs::read(&canonical).unwrap(), b"jpegdata");
    }

    #[test]
    fn placement_is_idempotent_per_source() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("fig.jpg");
        std::fs::write(&src, b"jpegdata").unwrap();

        let mut store = MediaStore::new(tmp.path().join("media"));
        let first = store.place(&src).unwrap();
        let second = store.place(&src).unwrap();
        assert_eq!(first, second);

        let entries = std::fs::read_dir(tmp.path().join("media")).unwrap().count();
        assert_eq!(entries, 1, "one canonical file, not two");
    }

    #[test]
    fn colliding_names_from_different_sources_get_suffixes() {
        let tmp = tempfile::tempdir().unwrap();
        let a = tmp.path().join("doc_a/figure.jpg");
        let b = tmp.path().join("doc_b/figure.jpg");
        std::fs::create_dir_all(a.parent().unwrap()).unwrap();
        std::fs::create_dir_all(b.parent().unwrap()).unwrap();
        std::fs::write(&a, b"first").unwrap();
        std::fs::write(&b, b"second").unwrap();

        let media = tmp.path().join("media");
        let mut store = MediaStore::new(&media);
        let pa = store.place(&a).unwrap();
        let pb = store.place(&b).unwrap();

        assert_eq!(pa, media.join("figure.jpg"));
        assert_eq!(pb, media.join("figure-1.jpg"));
        assert_eq!(std::fs::read(&pa).unwrap(), b"first");
        assert_eq!(std::fs::read(&pb).unwrap(), b"second");
    }

    #[test]
    fn file_already_in_store_is_not_copied() {
        let tmp = tempfile::tempdir().unwrap();
        let media = tmp.path().join("media");
        std::fs::create_dir_all(&media).unwrap();
        let src = media.join("fig.jpg");
        std::fs::write(&src, b"jpegdata").unwrap();

        let mut store = MediaStore::new(&media);
        let canonical = store.place(&src).unwrap();
        assert_eq!(canonical, src);
        assert_eq!(std::fs::read_dir(&media).unwrap().count(), 1);
    }
}

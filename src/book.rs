//! Package accumulation and serialization.
//!
//! [`PackageBuilder`] is the explicit accumulator for one run: chapters in
//! spine order, media assets deduplicated by filename, and an optional
//! cover. It is passed through the assembly loop rather than living in any
//! global state, and the immutable [`PackageBuilder::finalize`] consumes it
//! to produce the serialized EPUB bytes via the `epub-builder` crate (which
//! owns manifest, spine, and default navigation structures).

use crate::error::Tex2EpubError;
use epub_builder::{EpubBuilder, EpubContent, ZipLibrary};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// One chapter of the package, in spine order.
#[derive(Debug, Clone)]
pub struct Chapter {
    /// 1-based position in the spine. No gaps: index == position of this
    /// chapter among successfully converted materials.
    pub index: usize,
    pub title: String,
    /// Generated content filename, `chapter_<index>.xhtml`.
    pub filename: String,
    /// Final HTML body (cleaned and rewritten).
    pub html: String,
}

/// One binary media asset.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// MIME type for a recognized image filename, `None` otherwise.
///
/// Only recognized files become package assets; anything else in the media
/// directory is ignored.
pub fn image_mime(filename: &str) -> Option<&'static str> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Accumulator for one package, finalized once at the end of the run.
#[derive(Debug)]
pub struct PackageBuilder {
    identifier: String,
    title: String,
    language: String,
    cover: Option<Vec<u8>>,
    chapters: Vec<Chapter>,
    assets: BTreeMap<String, MediaAsset>,
}

impl PackageBuilder {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            language: language.into(),
            cover: None,
            chapters: Vec::new(),
            assets: BTreeMap::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn assets(&self) -> impl Iterator<Item = &MediaAsset> {
        self.assets.values()
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn has_cover(&self) -> bool {
        self.cover.is_some()
    }

    /// Set the cover image bytes (always packaged as `cover.jpg`).
    pub fn set_cover(&mut self, bytes: Vec<u8>) {
        self.cover = Some(bytes);
    }

    /// Append a chapter. The index is the next spine position, so skipped
    /// materials leave no gaps in the numbering.
    pub fn push_chapter(&mut self, html: String) -> &Chapter {
        let index = self.chapters.len() + 1;
        self.chapters.push(Chapter {
            index,
            title: format!("Chapter {index}"),
            filename: format!("chapter_{index}.xhtml"),
            html,
        });
        self.chapters.last().expect("just pushed")
    }

    /// Register every recognized image file in `dir` as a package asset.
    ///
    /// Called once per document after it reaches the chaptered state. Assets
    /// are deduplicated by filename: a file already registered by an earlier
    /// document is not re-added. Returns the number of newly added assets.
    pub fn register_media_dir(&mut self, dir: &Path) -> usize {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };
        let mut paths: Vec<_> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        paths.sort();

        let mut added = 0;
        for path in paths {
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(mime) = image_mime(filename) else {
                continue;
            };
            if self.assets.contains_key(filename) {
                continue;
            }
            match std::fs::read(&path) {
                Ok(bytes) => {
                    debug!("Registered media asset '{}' ({})", filename, mime);
                    self.assets.insert(
                        filename.to_string(),
                        MediaAsset {
                            filename: filename.to_string(),
                            mime,
                            bytes,
                        },
                    );
                    added += 1;
                }
                Err(e) => {
                    tracing::warn!("Could not read media file '{}': {}", path.display(), e);
                }
            }
        }
        added
    }

    /// Serialize the accumulated package to EPUB bytes.
    ///
    /// Consumes the builder; a package is written exactly once per run. The
    /// underlying writer supplies the manifest, spine, and default NCX/nav
    /// documents.
    pub fn finalize(self) -> Result<Vec<u8>, Tex2EpubError> {
        // The writer reports failures as opaque reports; only the message
        // crosses our error boundary.
        fn write_err(e: impl std::fmt::Display) -> Tex2EpubError {
            Tex2EpubError::PackageWrite {
                detail: e.to_string(),
            }
        }

        let zip = ZipLibrary::new().map_err(write_err)?;
        let mut epub = EpubBuilder::new(zip).map_err(write_err)?;
        epub.metadata("title", self.title.clone()).map_err(write_err)?;
        epub.metadata("lang", self.language.clone()).map_err(write_err)?;
        epub.metadata("generator", "tex2epub").map_err(write_err)?;

        if let Some(cover) = &self.cover {
            epub.add_cover_image("cover.jpg", cover.as_slice(), "image/jpeg")
                .map_err(write_err)?;
        }

        for asset in self.assets.values() {
            epub.add_resource(&asset.filename, asset.bytes.as_slice(), asset.mime)
                .map_err(write_err)?;
        }

        for chapter in &self.chapters {
            epub.add_content(
                EpubContent::new(chapter.filename.clone(), chapter.html.as_bytes())
                    .title(chapter.title.clone()),
            )
            .map_err(write_err)?;
        }

        let mut out = Vec::new();
        epub.generate(&mut out).map_err(write_err)?;
        Ok(out)
    }
}

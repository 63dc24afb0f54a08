//! Image resolution: map a referenced filename to an actual file on disk.
//!
//! The converter references images by the name the source document used;
//! the actual file can live either in the per-document extracted-media
//! directory or next to the source document itself. Search order is fixed:
//! media directory first, source directory second, first existing match
//! wins. No merging, no globbing.
//!
//! Not-found is an `Option::None`, never an error — missing images are an
//! expected, common outcome (diagrams not yet drawn, media extraction
//! disabled) and must not abort the surrounding pipeline.

use std::path::{Path, PathBuf};
use tracing::debug;

/// A referenced image that was located on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// Where the file actually lives.
    pub source_path: PathBuf,
    /// Natural format class, judged by extension.
    pub format: SourceFormat,
}

/// How the transcoder must treat a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// A paginated or vector container (PDF, EPS, PS): only the first page
    /// is rendered, via the external transcoder.
    Paginated,
    /// A plain raster file: decoded and re-encoded in-process.
    Raster,
}

impl SourceFormat {
    /// Classify a path by its extension. Unknown extensions are treated as
    /// raster and left to the decoder to accept or reject.
    pub fn classify(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") | Some("eps") | Some("ps") => SourceFormat::Paginated,
            _ => SourceFormat::Raster,
        }
    }
}

/// Locate a referenced filename.
///
/// Checks `media_dir/filename` (when a media directory is known), then
/// `fallback_dir/filename` (the source document's own directory). Returns
/// `None` when neither exists.
pub fn resolve(
    filename: &str,
    media_dir: Option<&Path>,
    fallback_dir: &Path,
) -> Option<ResolvedImage> {
    let candidates = media_dir
        .into_iter()
        .chain(std::iter::once(fallback_dir))
        .map(|dir| dir.join(filename));

    for candidate in candidates {
        if candidate.is_file() {
            debug!("Resolved image '{}' -> {}", filename, candidate.display());
            let format = SourceFormat::classify(&candidate);
            return Some(ResolvedImage {
                source_path: candidate,
                format,
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_dir_takes_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        let media = tmp.path().join("media");
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&media).unwrap();
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(media.join("fig.png"), b"m").unwrap();
        std::fs::write(src.join("fig.png"), b"s").unwrap();

        let resolved = resolve("fig.png", Some(&media), &src).unwrap();
        assert_eq!(resolved.source_path, media.join("fig.png"));
        assert_eq!(resolved.format, SourceFormat::Raster);
    }

    #[test]
    fn falls_back_to_source_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let media = tmp.path().join("media"); // never created
        std::fs::write(tmp.path().join("diagram.pdf"), b"%PDF").unwrap();

        let resolved = resolve("diagram.pdf", Some(&media), tmp.path()).unwrap();
        assert_eq!(resolved.source_path, tmp.path().join("diagram.pdf"));
        assert_eq!(resolved.format, SourceFormat::Paginated);
    }

    #[test]
    fn not_found_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(resolve("ghost.png", None, tmp.path()).is_none());
    }

    #[test]
    fn classify_by_extension_case_insensitive() {
        assert_eq!(
            SourceFormat::classify(Path::new("a.PDF")),
            SourceFormat::Paginated
        );
        assert_eq!(
            SourceFormat::classify(Path::new("a.eps")),
            SourceFormat::Paginated
        );
        assert_eq!(
            SourceFormat::classify(Path::new("a.png")),
            SourceFormat::Raster
        );
        assert_eq!(SourceFormat::classify(Path::new("a")), SourceFormat::Raster);
    }
}

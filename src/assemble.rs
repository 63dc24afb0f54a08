//! Top-level assembly: drive every material through the document pipeline
//! and accumulate the package.
//!
//! The run is deliberately single-threaded and synchronous: each material is
//! converted, cleaned, and rewritten in configuration order, because chapter
//! numbering is positional and the canonical media directory is shared
//! mutable state. The failure policy is layered (see [`crate::error`]): a
//! document failure skips that material, an image failure leaves one
//! placeholder untouched, and only configuration or serialization problems
//! abort the run.

use crate::book::PackageBuilder;
use crate::config::BuildConfig;
use crate::error::{DocumentError, Tex2EpubError};
use crate::observer::{BuildObserver, DebugLog, NoopObserver};
use crate::pipeline::clean::clean;
use crate::pipeline::convert::convert_document;
use crate::pipeline::place::MediaStore;
use crate::pipeline::rewrite::rewrite;
use crate::pipeline::transcode::TranscodeOptions;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Summary of one completed run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AssembleStats {
    /// Materials named in the configuration.
    pub materials: usize,
    /// Chapters that made it into the package.
    pub chapters: usize,
    /// Materials skipped due to document-level failures.
    pub skipped_documents: usize,
    /// Media assets packaged alongside the chapters.
    pub media_assets: usize,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u128,
}

/// Assemble the package described by `config`.
///
/// Selects the observer from the configuration: the debug event log when
/// `config.debug` is set, otherwise a no-op. Returns the accumulated
/// package; call [`PackageBuilder::finalize`] to serialize it, or use
/// [`assemble_to_file`] to do both.
pub fn assemble(config: &BuildConfig) -> Result<PackageBuilder, Tex2EpubError> {
    // Validation precedes every side effect, including debug-dir creation.
    config.validate()?;
    if config.debug {
        let log = open_debug_log(config)?;
        assemble_with_observer(config, &log)
    } else {
        assemble_with_observer(config, &NoopObserver)
    }
}

/// Open the debug event log named by the configuration.
pub fn open_debug_log(config: &BuildConfig) -> Result<DebugLog, Tex2EpubError> {
    DebugLog::create(&config.debug_dir).map_err(|e| {
        Tex2EpubError::Internal(format!(
            "could not create debug directory '{}': {e}",
            config.debug_dir.display()
        ))
    })
}

/// Assemble the package with a caller-supplied observer.
///
/// This is the seam the CLI uses to hang its progress display off the run
/// (fanned out with the debug log when both are wanted).
pub fn assemble_with_observer(
    config: &BuildConfig,
    observer: &dyn BuildObserver,
) -> Result<PackageBuilder, Tex2EpubError> {
    config.validate()?;
    info!(
        "Assembling {} material(s) into '{}'",
        config.materials.len(),
        config.output.display()
    );

    let mut book = PackageBuilder::new(
        config.identifier.clone(),
        config.title.clone(),
        config.language.clone(),
    );
    load_cover(config, &mut book);

    // The canonical media directory lives for exactly one run.
    let media_tmp = tempfile::tempdir()
        .map_err(|e| Tex2EpubError::Internal(format!("could not create media directory: {e}")))?;
    let mut store = MediaStore::new(media_tmp.path().join("media"));
    let opts = TranscodeOptions::from_config(config);

    for input in &config.materials {
        match process_document(input, config, &mut store, &opts, observer, &mut book) {
            Ok(()) => {}
            Err(e) => {
                warn!("Skipping '{}': {}", input.display(), e);
                observer.on_document_skipped(input, &e.to_string());
            }
        }
    }

    observer.on_complete(book.chapters().len(), book.asset_count());
    Ok(book)
}

/// Assemble, serialize, and write the output EPUB.
///
/// The file is written atomically: bytes go to a temporary sibling first and
/// are renamed into place, so a failed run never leaves a truncated EPUB at
/// the output path.
pub fn assemble_to_file(config: &BuildConfig) -> Result<AssembleStats, Tex2EpubError> {
    config.validate()?;
    if config.debug {
        let log = open_debug_log(config)?;
        assemble_to_file_with_observer(config, &log)
    } else {
        assemble_to_file_with_observer(config, &NoopObserver)
    }
}

/// [`assemble_to_file`] with a caller-supplied observer.
///
/// The caller owns observer composition; in particular, debug logging is not
/// added implicitly here.
pub fn assemble_to_file_with_observer(
    config: &BuildConfig,
    observer: &dyn BuildObserver,
) -> Result<AssembleStats, Tex2EpubError> {
    let started = Instant::now();
    let book = assemble_with_observer(config, observer)?;

    let stats = AssembleStats {
        materials: config.materials.len(),
        chapters: book.chapters().len(),
        skipped_documents: config.materials.len() - book.chapters().len(),
        media_assets: book.asset_count(),
        duration_ms: 0,
    };
    let bytes = book.finalize()?;

    let io_err = |source: std::io::Error| Tex2EpubError::OutputWriteFailed {
        path: config.output.clone(),
        source,
    };
    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let tmp_path = config.output.with_extension("epub.part");
    std::fs::write(&tmp_path, &bytes).map_err(io_err)?;
    std::fs::rename(&tmp_path, &config.output).map_err(io_err)?;

    let stats = AssembleStats {
        duration_ms: started.elapsed().as_millis(),
        ..stats
    };
    info!(
        "Wrote '{}': {} chapter(s), {} asset(s), {} skipped, {} ms",
        config.output.display(),
        stats.chapters,
        stats.media_assets,
        stats.skipped_documents,
        stats.duration_ms
    );
    Ok(stats)
}

/// Read the cover image if one is configured. A missing or unreadable cover
/// is a warning; the package is simply built without one.
fn load_cover(config: &BuildConfig, book: &mut PackageBuilder) {
    let Some(ref path) = config.cover else {
        return;
    };
    match std::fs::read(path) {
        Ok(bytes) => book.set_cover(bytes),
        Err(e) => warn!(
            "Cover image '{}' could not be read, continuing without a cover: {}",
            path.display(),
            e
        ),
    }
}

/// Take one material from source file to chapter.
///
/// Pipeline order matters: cleaning runs before placeholder rewriting so the
/// rewriter scans layout-free HTML, and media registration runs after the
/// rewrite so every image placed for this chapter is picked up.
fn process_document(
    input: &Path,
    config: &BuildConfig,
    store: &mut MediaStore,
    opts: &TranscodeOptions,
    observer: &dyn BuildObserver,
    book: &mut PackageBuilder,
) -> Result<(), DocumentError> {
    if !input.is_file() {
        return Err(DocumentError::MissingInput {
            path: input.to_path_buf(),
        });
    }

    observer.on_convert_start(input);
    let conversion = match convert_document(input, config) {
        Ok(c) => c,
        Err(e) => {
            observer.on_convert_failure(input, &e.to_string());
            return Err(e);
        }
    };
    observer.on_convert_success(input);

    let html = std::fs::read_to_string(&conversion.html_path).map_err(|source| {
        DocumentError::OutputUnreadable {
            path: input.to_path_buf(),
            source,
        }
    })?;

    let source_dir = input.parent().unwrap_or_else(|| Path::new("."));
    let cleaned = clean(&html);
    let rewritten = rewrite(
        &cleaned,
        conversion.media_dir.as_deref(),
        source_dir,
        store,
        opts,
        observer,
    );

    let chapter = book.push_chapter(rewritten);
    observer.on_chapter_added(chapter.index, &chapter.filename);
    book.register_media_dir(store.dir());

    // The converted HTML is an intermediate; delete it unless the observer
    // keeps it for inspection.
    if !observer.retain_artifact(&conversion.html_path) {
        let _ = std::fs::remove_file(&conversion.html_path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_materials_fails_before_any_side_effect() {
        let tmp = tempfile::tempdir().unwrap();
        let debug_dir = tmp.path().join("debug");
        let config = BuildConfig {
            debug: true,
            debug_dir: debug_dir.clone(),
            ..BuildConfig::default()
        };

        let err = assemble(&config).unwrap_err();
        assert!(matches!(err, Tex2EpubError::NoMaterials));
        assert!(!debug_dir.exists(), "no directory before validation passes");
    }

    #[test]
    fn missing_material_is_skipped_and_run_completes() {
        let tmp = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            materials: vec![tmp.path().join("never-written.tex")],
            ..BuildConfig::default()
        };

        let book = assemble(&config).unwrap();
        assert!(book.chapters().is_empty());
        assert_eq!(book.asset_count(), 0);
    }

    #[test]
    fn unreadable_cover_is_warning_not_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            cover: Some(tmp.path().join("missing-cover.jpg")),
            materials: vec![PathBuf::from("/no/such/doc.tex")],
            ..BuildConfig::default()
        };

        let book = assemble(&config).unwrap();
        assert!(!book.has_cover());
    }

    #[test]
    fn readable_cover_is_attached() {
        let tmp = tempfile::tempdir().unwrap();
        let cover = tmp.path().join("cover.jpg");
        std::fs::write(&cover, b"jpegdata").unwrap();
        let config = BuildConfig {
            cover: Some(cover),
            materials: vec![PathBuf::from("/no/such/doc.tex")],
            ..BuildConfig::default()
        };

        let book = assemble(&config).unwrap();
        assert!(book.has_cover());
    }

    #[cfg(unix)]
    #[test]
    fn converter_output_becomes_a_chapter() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("ch1.tex");
        std::fs::write(&input, "\\section{Hi}").unwrap();

        // Stand-in converter: writes fixed HTML to the -o argument.
        let script = tmp.path().join("fake-converter");
        std::fs::write(
            &script,
            "#!/bin/sh\nout=\"\"\nwhile [ $# -gt 0 ]; do\n  if [ \"$1\" = \"-o\" ]; then out=\"$2\"; shift; fi\n  shift\ndone\nprintf '<h1>Hi</h1>' > \"$out\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let config = BuildConfig {
            materials: vec![input.clone()],
            converter: script.to_string_lossy().into_owned(),
            ..BuildConfig::default()
        };

        let book = assemble(&config).unwrap();
        assert_eq!(book.chapters().len(), 1);
        assert_eq!(book.chapters()[0].html, "<h1>Hi</h1>");
        assert!(
            !input.with_extension("html").exists(),
            "intermediate HTML is deleted outside debug mode"
        );
    }
}

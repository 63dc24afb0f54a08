//! External converter invocation: one LaTeX document in, one HTML file out.
//!
//! The converter (pandoc by default) owns the markup dialect; this module
//! only owns the invocation contract: deterministic output path (input with
//! its extension replaced by `html`), optional template pass-through, and
//! optional media extraction into a sibling `<stem>_media` directory.
//! Failure is signalled by a non-zero exit or a missing output file and is
//! always a per-document, recoverable error.

use crate::config::BuildConfig;
use crate::error::DocumentError;
use crate::process::run_tool;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What one converter run produced.
#[derive(Debug)]
pub struct ConversionResult {
    /// The emitted HTML file. Exists when this struct exists.
    pub html_path: PathBuf,

    /// Directory the converter was asked to extract embedded media into.
    /// `Some` only when extraction was requested; the directory itself may
    /// still not exist (e.g. the document embeds nothing) — the resolver
    /// checks existence per file.
    pub media_dir: Option<PathBuf>,
}

/// Deterministic HTML output path for an input document.
pub fn html_output_path(input: &Path) -> PathBuf {
    input.with_extension("html")
}

/// Deterministic media-extraction directory for an input document.
pub fn media_dir_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}_media"))
}

/// Run the external converter for one document.
///
/// The caller has already checked that `input` exists. On success the HTML
/// file is guaranteed to exist; a converter that exits zero without writing
/// its output is still a failure.
pub fn convert_document(
    input: &Path,
    config: &BuildConfig,
) -> Result<ConversionResult, DocumentError> {
    let html_path = html_output_path(input);

    let mut args: Vec<OsString> = vec![input.into(), "-o".into(), html_path.clone().into()];
    if let Some(ref template) = config.template {
        args.push("--template".into());
        args.push(template.into());
    }
    let media_dir = if config.extract_media {
        let dir = media_dir_path(input);
        let mut flag = OsString::from("--extract-media=");
        flag.push(&dir);
        args.push(flag);
        Some(dir)
    } else {
        None
    };

    run_tool(&config.converter, &args).map_err(|failure| DocumentError::ConverterFailed {
        path: input.to_path_buf(),
        detail: failure.to_string(),
    })?;

    if !html_path.is_file() {
        return Err(DocumentError::ConverterFailed {
            path: input.to_path_buf(),
            detail: format!("converter produced no output at '{}'", html_path.display()),
        });
    }

    debug!("Converted {} -> {}", input.display(), html_path.display());
    Ok(ConversionResult {
        html_path,
        media_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_replaces_extension() {
        assert_eq!(
            html_output_path(Path::new("/book/ch1.tex")),
            PathBuf::from("/book/ch1.html")
        );
    }

    #[test]
    fn media_dir_is_sibling_of_input() {
        assert_eq!(
            media_dir_path(Path::new("/book/ch1.tex")),
            PathBuf::from("/book/ch1_media")
        );
    }

    #[test]
    fn missing_converter_is_recoverable_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("ch1.tex");
        std::fs::write(&input, "\\section{Hi}").unwrap();

        let mut config = BuildConfig::default();
        config.converter = "tex2epub-no-such-converter".to_string();

        let err = convert_document(&input, &config).unwrap_err();
        assert!(matches!(err, DocumentError::ConverterFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn zero_exit_without_output_is_failure() {
        // `true` exits zero but writes nothing.
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("ch1.tex");
        std::fs::write(&input, "\\section{Hi}").unwrap();

        let mut config = BuildConfig::default();
        config.converter = "true".to_string();

        let err = convert_document(&input, &config).unwrap_err();
        match err {
            DocumentError::ConverterFailed { detail, .. } => {
                assert!(detail.contains("no output"), "got: {detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

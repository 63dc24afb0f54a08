//! Error types for the tex2epub library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`Tex2EpubError`] — **Fatal**: the run cannot proceed at all (empty
//!   materials list, unreadable config, package serialization failure).
//!   Returned as `Err(Tex2EpubError)` from the top-level `assemble*`
//!   functions.
//!
//! * [`DocumentError`] — **Per-document recoverable**: one material failed
//!   (missing input, converter exit failure, unreadable output). The
//!   document is skipped and the run continues with the next material.
//!
//! * [`MediaError`] — **Per-reference recoverable**: one image placeholder
//!   failed (not found, transcode failure, copy failure). That occurrence
//!   is left untouched in the chapter HTML and the run continues.
//!
//! The separation keeps the propagation policy mechanical: only
//! [`Tex2EpubError`] ever crosses `assemble`'s boundary; the other two are
//! reported at the point of detection and swallowed.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the tex2epub library.
///
/// Document- and image-level failures use [`DocumentError`] and
/// [`MediaError`] and never abort the run.
#[derive(Debug, Error)]
pub enum Tex2EpubError {
    /// The configuration names no materials; there is nothing to assemble.
    #[error("No materials specified in the configuration.\nAdd at least one entry to \"materials\".")]
    NoMaterials,

    /// The configuration file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::BuildConfig`].
    #[error("Failed to parse config file '{path}': {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The package writer could not serialize the EPUB container.
    #[error("Failed to serialize EPUB package: {detail}")]
    PackageWrite { detail: String },

    /// Could not create or write the output EPUB file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A recoverable failure for a single input document.
///
/// The assembler logs the error, notifies the observer, and moves on to the
/// next material; a failed document contributes no chapter and no media.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The input path named in the configuration does not exist.
    #[error("input file not found: '{path}'")]
    MissingInput { path: PathBuf },

    /// The external converter exited non-zero or produced no output file.
    #[error("conversion of '{path}' failed: {detail}")]
    ConverterFailed { path: PathBuf, detail: String },

    /// The converter reported success but its output could not be read.
    #[error("converted output for '{path}' is unreadable: {source}")]
    OutputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A recoverable failure for a single image reference.
///
/// The rewriter leaves the affected placeholder byte-identical and
/// continues with the next occurrence.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The referenced file exists in neither candidate directory.
    ///
    /// Expected and common (e.g. diagrams not yet extracted); callers must
    /// treat it as "leave the placeholder unresolved", never as abort.
    #[error("image '{name}' not found in any candidate directory")]
    NotFound { name: String },

    /// Transcoding failed: missing external tool, unreadable source, or
    /// non-zero exit from the transcoding process.
    #[error("failed to transcode '{path}': {detail}")]
    TranscodeFailed { path: PathBuf, detail: String },

    /// Copying the transcoded image into the canonical media directory failed.
    #[error("failed to place '{path}' into the media directory: {detail}")]
    PlacementFailed { path: PathBuf, detail: String },
}

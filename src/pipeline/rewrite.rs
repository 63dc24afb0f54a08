//! Placeholder rewriting: turn converter image markers into final `<img>` tags.
//!
//! HTML cannot display PDF or EPS figures inline, so the converter leaves a
//! placeholder where each one belongs: an `<embed src="FILE" …>` element
//! (optionally with inner text, `<embed …>caption</embed>`) carrying the
//! original reference filename in its `src` attribute. This module scans
//! for those placeholders and drives, per occurrence, the
//! resolve → transcode → place pipeline, substituting a minimal
//! `<img src="NAME.jpg" />` tag on success.
//!
//! Failures are strictly per-reference: any failed step leaves that
//! occurrence's original markup byte-identical and moves on to the next.
//! Everything outside the recognized placeholder pattern passes through
//! untouched — the scanner yields structured occurrences with exact byte
//! spans rather than splicing text ad hoc, so the "leave untouched on
//! failure" contract is exact.

use crate::error::MediaError;
use crate::observer::BuildObserver;
use crate::pipeline::place::MediaStore;
use crate::pipeline::resolve::resolve;
use crate::pipeline::transcode::{transcode, TranscodeOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

/// One placeholder occurrence inside converted HTML.
///
/// `raw` is the exact byte sequence of the whole placeholder; it is what
/// stays in the chapter when resolution fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference<'a> {
    /// The complete matched placeholder markup.
    pub raw: &'a str,
    /// Value of the `src` attribute: the original referenced filename.
    pub filename: &'a str,
    /// Inner text, for the `<embed …>text</embed>` form.
    pub inner_text: Option<&'a str>,
    /// Byte span of `raw` within the scanned HTML.
    pub span: Range<usize>,
}

static RE_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<embed\b[^>]*\bsrc="([^"]+)"[^>]*>(?:([^<]*)</embed>)?"#).unwrap()
});

/// Scan HTML for image-reference placeholders.
///
/// Returns occurrences in document order with non-overlapping spans.
/// `<embed>` elements without a `src` attribute are not placeholders and
/// are not matched.
pub fn scan(html: &str) -> Vec<ImageReference<'_>> {
    RE_PLACEHOLDER
        .captures_iter(html)
        .map(|caps| {
            let whole = caps.get(0).expect("group 0 always present");
            ImageReference {
                raw: whole.as_str(),
                filename: caps.get(1).expect("src group").as_str(),
                inner_text: caps.get(2).map(|m| m.as_str()),
                span: whole.range(),
            }
        })
        .collect()
}

/// Rewrite all placeholders in `html`.
///
/// * `media_dir` — the document's extracted-media directory, if known.
/// * `source_dir` — the source document's own directory (fallback).
/// * `store` — canonical media directory for the run.
///
/// Never fails: each unresolvable occurrence is reported to the observer
/// and left byte-identical.
pub fn rewrite(
    html: &str,
    media_dir: Option<&Path>,
    source_dir: &Path,
    store: &mut MediaStore,
    opts: &TranscodeOptions,
    observer: &dyn BuildObserver,
) -> String {
    let references = scan(html);
    if references.is_empty() {
        return html.to_string();
    }
    debug!("Found {} image placeholder(s)", references.len());

    let mut out = String::with_capacity(html.len());
    let mut cursor = 0usize;
    for reference in references {
        out.push_str(&html[cursor..reference.span.start]);
        match resolve_reference(&reference, media_dir, source_dir, store, opts) {
            Ok(final_name) => {
                out.push_str(&format!("<img src=\"{final_name}\" />"));
            }
            Err(e) => {
                warn!("Image '{}' left unresolved: {}", reference.filename, e);
                observer.on_image_unresolved(reference.filename, &e.to_string());
                out.push_str(reference.raw);
            }
        }
        cursor = reference.span.end;
    }
    out.push_str(&html[cursor..]);
    out
}

/// Drive resolve → transcode → place for one occurrence and return the
/// final file name for the `<img>` tag.
fn resolve_reference(
    reference: &ImageReference<'_>,
    media_dir: Option<&Path>,
    source_dir: &Path,
    store: &mut MediaStore,
    opts: &TranscodeOptions,
) -> Result<String, MediaError> {
    let resolved =
        resolve(reference.filename, media_dir, source_dir).ok_or_else(|| MediaError::NotFound {
            name: reference.filename.to_string(),
        })?;
    let transcoded = transcode(&resolved, opts)?;
    let canonical = store.place(&transcoded)?;
    canonical
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MediaError::PlacementFailed {
            path: canonical.clone(),
            detail: "canonical path has no file name".to_string(),
        })
}

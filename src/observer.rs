//! Lifecycle observation: debug logging and artifact retention.
//!
//! Debug mode is not a boolean threaded through every step. Instead every
//! component calls a [`BuildObserver`] unconditionally; when debug is off
//! the observer is a [`NoopObserver`] and every call disappears. The same
//! seam lets the CLI hang a progress display off the run without the
//! library knowing about terminals.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Receiver for lifecycle events during an assembly run.
///
/// All methods have no-op defaults so implementors override only what they
/// care about. Implementations must not panic; they are called from the
/// middle of document processing.
pub trait BuildObserver {
    /// The external converter is about to run for `input`.
    fn on_convert_start(&self, _input: &Path) {}

    /// The external converter produced readable output for `input`.
    fn on_convert_success(&self, _input: &Path) {}

    /// The external converter failed for `input`.
    fn on_convert_failure(&self, _input: &Path, _detail: &str) {}

    /// The document at `input` was skipped; no chapter was produced.
    fn on_document_skipped(&self, _input: &Path, _reason: &str) {}

    /// An image reference could not be resolved or converted; the
    /// placeholder stays in the chapter body.
    fn on_image_unresolved(&self, _name: &str, _reason: &str) {}

    /// A chapter was added to the package.
    fn on_chapter_added(&self, _index: usize, _filename: &str) {}

    /// The run finished; the package holds `chapters` chapters and
    /// `assets` media assets.
    fn on_complete(&self, _chapters: usize, _assets: usize) {}

    /// Offer the converted HTML for retention after it has been consumed.
    ///
    /// Return `true` if the observer took ownership of the file (moved it
    /// somewhere persistent); the assembler deletes it otherwise.
    fn retain_artifact(&self, _html: &Path) -> bool {
        false
    }
}

/// Observer that ignores every event. Used when debug mode is off.
pub struct NoopObserver;

impl BuildObserver for NoopObserver {}

/// Debug observer: append-only event log plus converted-HTML retention.
///
/// Writes one line per lifecycle event to `<debug_dir>/build.log` and moves
/// each consumed converted-HTML file into the debug directory for
/// inspection after the run.
pub struct DebugLog {
    dir: PathBuf,
    log: Mutex<File>,
}

impl DebugLog {
    /// Create the debug directory (if needed) and open the event log for
    /// appending.
    pub fn create(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("build.log"))?;
        Ok(Self {
            dir,
            log: Mutex::new(log),
        })
    }

    /// Path of the debug directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn line(&self, event: &str, detail: &str) {
        if let Ok(mut log) = self.log.lock() {
            // A failed log write must never fail the run.
            let _ = writeln!(log, "{event}\t{detail}");
        }
    }
}

impl BuildObserver for DebugLog {
    fn on_convert_start(&self, input: &Path) {
        self.line("convert:start", &input.display().to_string());
    }

    fn on_convert_success(&self, input: &Path) {
        self.line("convert:ok", &input.display().to_string());
    }

    fn on_convert_failure(&self, input: &Path, detail: &str) {
        self.line("convert:fail", &format!("{} {detail}", input.display()));
    }

    fn on_document_skipped(&self, input: &Path, reason: &str) {
        self.line("skip", &format!("{} {reason}", input.display()));
    }

    fn on_image_unresolved(&self, name: &str, reason: &str) {
        self.line("image:unresolved", &format!("{name} {reason}"));
    }

    fn on_chapter_added(&self, index: usize, filename: &str) {
        self.line("chapter", &format!("{index} {filename}"));
    }

    fn on_complete(&self, chapters: usize, assets: usize) {
        self.line("done", &format!("{chapters} chapters, {assets} assets"));
    }

    fn retain_artifact(&self, html: &Path) -> bool {
        let Some(name) = html.file_name() else {
            return false;
        };
        let target = self.dir.join(name);
        match std::fs::rename(html, &target) {
            Ok(()) => true,
            Err(_) => {
                // Rename fails across filesystems; fall back to copy+remove.
                match std::fs::copy(html, &target) {
                    Ok(_) => {
                        let _ = std::fs::remove_file(html);
                        true
                    }
                    Err(e) => {
                        warn!("Failed to retain debug artifact {}: {}", html.display(), e);
                        false
                    }
                }
            }
        }
    }
}

/// Fan events out to two observers.
///
/// Lets the CLI combine its progress display with the debug log. For
/// artifact retention the first observer that takes the file wins.
pub struct Fanout<'a>(pub &'a dyn BuildObserver, pub &'a dyn BuildObserver);

impl BuildObserver for Fanout<'_> {
    fn on_convert_start(&self, input: &Path) {
        self.0.on_convert_start(input);
        self.1.on_convert_start(input);
    }

    fn on_convert_success(&self, input: &Path) {
        self.0.on_convert_success(input);
        self.1.on_convert_success(input);
    }

    fn on_convert_failure(&self, input: &Path, detail: &str) {
        self.0.on_convert_failure(input, detail);
        self.1.on_convert_failure(input, detail);
    }

    fn on_document_skipped(&self, input: &Path, reason: &str) {
        self.0.on_document_skipped(input, reason);
        self.1.on_document_skipped(input, reason);
    }

    fn on_image_unresolved(&self, name: &str, reason: &str) {
        self.0.on_image_unresolved(name, reason);
        self.1.on_image_unresolved(name, reason);
    }

    fn on_chapter_added(&self, index: usize, filename: &str) {
        self.0.on_chapter_added(index, filename);
        self.1.on_chapter_added(index, filename);
    }

    fn on_complete(&self, chapters: usize, assets: usize) {
        self.0.on_complete(chapters, assets);
        self.1.on_complete(chapters, assets);
    }

    fn retain_artifact(&self, html: &Path) -> bool {
        self.0.retain_artifact(html) || self.1.retain_artifact(html)
    }
}

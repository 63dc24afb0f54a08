//! Pipeline stages for per-document EPUB assembly.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the transcoding backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! convert ──▶ clean ──▶ rewrite ─┬─▶ resolve
//! (pandoc)   (layout)  (per ref) ├─▶ transcode
//!                                └─▶ place
//! ```
//!
//! 1. [`convert`]   — invoke the external converter; LaTeX in, HTML out
//! 2. [`clean`]     — strip multi-column layout artifacts from the HTML
//! 3. [`rewrite`]   — scan for image placeholders and drive, per reference:
//! 4. [`resolve`]   — locate the referenced file across candidate dirs
//! 5. [`transcode`] — normalize it to a single JPEG (first page only for
//!    paginated formats)
//! 6. [`place`]     — relocate the JPEG into the canonical media directory
//!    under a collision-free name

pub mod clean;
pub mod convert;
pub mod place;
pub mod resolve;
pub mod rewrite;
pub mod transcode;

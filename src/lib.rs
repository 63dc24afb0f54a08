//! # tex2epub
//!
//! Assemble EPUB e-books from LaTeX source documents.
//!
//! The heavy lifting of markup conversion is delegated to an external
//! converter (pandoc by default); this crate owns everything around it:
//! driving the converter per document, repairing layout constructs that do
//! not survive conversion, resolving and transcoding referenced images into
//! an e-reader-friendly form, and packaging the results as a valid EPUB.
//!
//! ## Pipeline
//!
//! ```text
//!   config (JSON or builder)
//!        │
//!        ▼
//!   ┌──────────┐   per material   ┌─────────┐   ┌─────────────────────┐
//!   │ assemble │ ───────────────▶ │ convert │ ─▶│ clean layout leaks  │
//!   └──────────┘                  └─────────┘   └─────────────────────┘
//!        │                                                │
//!        │                                                ▼
//!        │                                 ┌──────────────────────────┐
//!        │                                 │ rewrite image refs:      │
//!        │                                 │ resolve→transcode→place  │
//!        │                                 └──────────────────────────┘
//!        │                                                │
//!        ▼                                                ▼
//!   ┌────────────────┐        chapters + assets   ┌───────────────┐
//!   │ output.epub    │ ◀───────────────────────── │ PackageBuilder│
//!   └────────────────┘         finalize()         └───────────────┘
//! ```
//!
//! Failures are layered: a bad image reference costs one `<img>` tag, a bad
//! document costs one chapter, and only configuration or packaging problems
//! abort the run.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tex2epub::{assemble_to_file, BuildConfig};
//!
//! fn main() -> Result<(), tex2epub::Tex2EpubError> {
//!     let config = BuildConfig::builder()
//!         .material("chapter1.tex")
//!         .material("chapter2.tex")
//!         .cover("cover.jpg")
//!         .output("book.epub")
//!         .build()?;
//!     let stats = assemble_to_file(&config)?;
//!     println!("{} chapters, {} assets", stats.chapters, stats.media_assets);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! * `cli` (default) — command-line binary with progress display.

pub mod assemble;
pub mod book;
pub mod config;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod process;

pub use assemble::{
    assemble, assemble_to_file, assemble_to_file_with_observer, assemble_with_observer,
    open_debug_log, AssembleStats,
};
pub use book::{Chapter, MediaAsset, PackageBuilder};
pub use config::{BuildConfig, BuildConfigBuilder};
pub use error::{DocumentError, MediaError, Tex2EpubError};
pub use observer::{BuildObserver, DebugLog, Fanout, NoopObserver};

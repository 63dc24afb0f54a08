//! Configuration for an EPUB assembly run.
//!
//! All behaviour is controlled through [`BuildConfig`], which can be read
//! from the JSON config file the CLI consumes or built programmatically via
//! [`BuildConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to serialise a run's settings for logging and to diff two runs to
//! understand why their outputs differ.
//!
//! # Config file
//! The file format follows the historical JSON layout:
//!
//! ```json
//! {
//!   "cover": "cover.jpg",
//!   "materials": ["ch1.tex", "ch2.tex"],
//!   "template": "book.html",
//!   "extractMedia": true,
//!   "debug": false
//! }
//! ```
//!
//! Every other field has a default and may be set either in the file or
//! through the builder.

use crate::error::Tex2EpubError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for one assembly run.
///
/// Built via [`BuildConfig::builder()`], [`BuildConfig::from_file()`], or
/// `BuildConfig::default()` plus field assignment.
///
/// # Example
/// ```rust
/// use tex2epub::BuildConfig;
///
/// let config = BuildConfig::builder()
///     .material("chapter1.tex")
///     .quality(90)
///     .dpi(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.materials.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    /// Optional cover image path. A missing cover is a warning, not an error.
    pub cover: Option<PathBuf>,

    /// Ordered list of LaTeX source files. Order here is chapter order in
    /// the output spine. Required, non-empty.
    pub materials: Vec<PathBuf>,

    /// Optional pandoc template passed through as `--template`.
    pub template: Option<PathBuf>,

    /// Ask the converter to extract embedded media into a per-document
    /// directory (`--extract-media`). Default: false.
    pub extract_media: bool,

    /// Debug mode: write an append-only event log and retain converted HTML
    /// in [`BuildConfig::debug_dir`] instead of deleting it. Default: false.
    pub debug: bool,

    /// Directory for the debug log and retained artifacts. Default:
    /// `tex2epub-debug`.
    pub debug_dir: PathBuf,

    /// Output EPUB path. Default: `output.epub`.
    pub output: PathBuf,

    /// Package identifier written to the EPUB metadata.
    pub identifier: String,

    /// Package title written to the EPUB metadata.
    pub title: String,

    /// BCP-47 language tag written to the EPUB metadata.
    pub language: String,

    /// JPEG re-encode quality (1–100). Default: 85.
    ///
    /// Applied when a raster source is re-encoded in-process. 85 keeps
    /// photographic figures visually clean while cutting file size roughly
    /// in half compared to quality 100; e-reader screens do not reward
    /// anything higher.
    pub quality: u8,

    /// First-page render resolution for paginated sources (72–400). Default: 150.
    ///
    /// 150 DPI is the sweet spot for e-reader displays: line art and labels
    /// stay sharp while a full-page figure lands well under a megabyte.
    pub dpi: u32,

    /// Program name of the external markup converter. Default: `pandoc`.
    ///
    /// Overridable so tests (and exotic installs) can point at a different
    /// executable; the invocation contract stays the same.
    pub converter: String,

    /// Program name of the external paginated-image transcoder.
    /// Default: `pdftoppm`.
    pub transcoder: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cover: None,
            materials: Vec::new(),
            template: None,
            extract_media: false,
            debug: false,
            debug_dir: PathBuf::from("tex2epub-debug"),
            output: PathBuf::from("output.epub"),
            identifier: "id123456".to_string(),
            title: "Generated ePub".to_string(),
            language: "en".to_string(),
            quality: 85,
            dpi: 150,
            converter: "pandoc".to_string(),
            transcoder: "pdftoppm".to_string(),
        }
    }
}

impl BuildConfig {
    /// Create a new builder for `BuildConfig`.
    pub fn builder() -> BuildConfigBuilder {
        BuildConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read and parse a JSON config file.
    ///
    /// Parsing alone does not validate the materials list; validation
    /// happens in [`crate::assemble`] before any file I/O so an empty list
    /// aborts the run with [`Tex2EpubError::NoMaterials`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Tex2EpubError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Tex2EpubError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| Tex2EpubError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate the parts of the configuration that must hold before any
    /// processing starts.
    pub fn validate(&self) -> Result<(), Tex2EpubError> {
        if self.materials.is_empty() {
            return Err(Tex2EpubError::NoMaterials);
        }
        if self.quality == 0 || self.quality > 100 {
            return Err(Tex2EpubError::InvalidConfig(format!(
                "quality must be 1–100, got {}",
                self.quality
            )));
        }
        if self.dpi < 72 || self.dpi > 400 {
            return Err(Tex2EpubError::InvalidConfig(format!(
                "dpi must be 72–400, got {}",
                self.dpi
            )));
        }
        Ok(())
    }
}

/// Builder for [`BuildConfig`].
#[derive(Debug)]
pub struct BuildConfigBuilder {
    config: BuildConfig,
}

impl BuildConfigBuilder {
    pub fn cover(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cover = Some(path.into());
        self
    }

    /// Append one material to the ordered list.
    pub fn material(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.materials.push(path.into());
        self
    }

    /// Replace the whole materials list.
    pub fn materials(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.materials = paths;
        self
    }

    pub fn template(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.template = Some(path.into());
        self
    }

    pub fn extract_media(mut self, v: bool) -> Self {
        self.config.extract_media = v;
        self
    }

    pub fn debug(mut self, v: bool) -> Self {
        self.config.debug = v;
        self
    }

    pub fn debug_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.debug_dir = path.into();
        self
    }

    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output = path.into();
        self
    }

    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.config.identifier = id.into();
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    pub fn language(mut self, lang: impl Into<String>) -> Self {
        self.config.language = lang.into();
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q.clamp(1, 100);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn converter(mut self, program: impl Into<String>) -> Self {
        self.config.converter = program.into();
        self
    }

    pub fn transcoder(mut self, program: impl Into<String>) -> Self {
        self.config.transcoder = program.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BuildConfig, Tex2EpubError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_camel_case_and_defaults() {
        let json = r#"{
            "cover": "cover.jpg",
            "materials": ["a.tex", "b.tex"],
            "extractMedia": true
        }"#;
        let config: BuildConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cover.as_deref(), Some(Path::new("cover.jpg")));
        assert_eq!(config.materials.len(), 2);
        assert!(config.extract_media);
        assert!(!config.debug);
        assert_eq!(config.output, PathBuf::from("output.epub"));
        assert_eq!(config.identifier, "id123456");
        assert_eq!(config.title, "Generated ePub");
        assert_eq!(config.language, "en");
        assert_eq!(config.quality, 85);
        assert_eq!(config.dpi, 150);
        assert_eq!(config.converter, "pandoc");
    }

    #[test]
    fn empty_materials_rejected() {
        let err = BuildConfig::builder().build().unwrap_err();
        assert!(matches!(err, Tex2EpubError::NoMaterials));
    }

    #[test]
    fn builder_clamps_quality_and_dpi() {
        let config = BuildConfig::builder()
            .material("a.tex")
            .quality(0)
            .dpi(10_000)
            .build()
            .unwrap();
        assert_eq!(config.quality, 1);
        assert_eq!(config.dpi, 400);
    }

    #[test]
    fn validate_rejects_out_of_range_dpi_from_file() {
        let mut config = BuildConfig::default();
        config.materials.push(PathBuf::from("a.tex"));
        config.dpi = 9;
        assert!(matches!(
            config.validate(),
            Err(Tex2EpubError::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_config_file_is_config_read_error() {
        let err = BuildConfig::from_file("/definitely/not/a/real/config.json").unwrap_err();
        assert!(matches!(err, Tex2EpubError::ConfigRead { .. }));
    }
}

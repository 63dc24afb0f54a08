//! Image transcoding: normalize every resolved source to a single JPEG.
//!
//! Two paths, chosen by [`SourceFormat`]:
//!
//! * **Paginated** (PDF, EPS, PS) — rendered by the external transcoder
//!   (`pdftoppm` by default), first page only, at the configured DPI.
//! * **Raster** (PNG, GIF, JPEG, …) — decoded and re-encoded in-process
//!   with the `image` crate at the configured quality.
//!
//! Re-encoding is lossy by design and alpha channels are flattened away —
//! the target is an opaque raster format. The output lands next to the
//! source with the extension replaced by `jpg`; the placement step
//! relocates it afterwards.
//!
//! Every failure (missing tool, unreadable source, non-zero exit) is a
//! [`MediaError`], reported and never raised past the rewriter: the caller
//! treats it as "leave the placeholder unresolved".

use crate::config::BuildConfig;
use crate::error::MediaError;
use crate::pipeline::resolve::{ResolvedImage, SourceFormat};
use crate::process::run_tool;
use image::codecs::jpeg::JpegEncoder;
use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing::debug;

/// Knobs the transcoder needs, detached from the full config so tests can
/// construct them directly.
#[derive(Debug, Clone)]
pub struct TranscodeOptions {
    /// JPEG re-encode quality (1–100).
    pub quality: u8,
    /// Render resolution for paginated sources.
    pub dpi: u32,
    /// External transcoder program.
    pub program: String,
}

impl TranscodeOptions {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            quality: config.quality,
            dpi: config.dpi,
            program: config.transcoder.clone(),
        }
    }
}

/// Transcode one resolved image to a JPEG next to its source.
///
/// Returns the path of the produced file.
pub fn transcode(image: &ResolvedImage, opts: &TranscodeOptions) -> Result<PathBuf, MediaError> {
    let output = image.source_path.with_extension("jpg");
    match image.format {
        SourceFormat::Paginated => render_first_page(image, &output, opts)?,
        SourceFormat::Raster => reencode_raster(image, &output, opts)?,
    }
    debug!(
        "Transcoded {} -> {}",
        image.source_path.display(),
        output.display()
    );
    Ok(output)
}

/// Render page one of a paginated source via the external transcoder.
///
/// `pdftoppm -jpeg -r <dpi> -f 1 -l 1 -singlefile <src> <stem>` writes
/// exactly `<stem>.jpg`, which is the deterministic output path.
fn render_first_page(
    image: &ResolvedImage,
    output: &std::path::Path,
    opts: &TranscodeOptions,
) -> Result<(), MediaError> {
    let stem = image.source_path.with_extension("");
    let args: Vec<OsString> = vec![
        "-jpeg".into(),
        "-r".into(),
        opts.dpi.to_string().into(),
        "-f".into(),
        "1".into(),
        "-l".into(),
        "1".into(),
        "-singlefile".into(),
        image.source_path.clone().into(),
        stem.into(),
    ];

    run_tool(&opts.program, &args).map_err(|failure| MediaError::TranscodeFailed {
        path: image.source_path.clone(),
        detail: failure.to_string(),
    })?;

    if !output.is_file() {
        return Err(MediaError::TranscodeFailed {
            path: image.source_path.clone(),
            detail: format!("transcoder produced no output at '{}'", output.display()),
        });
    }
    Ok(())
}

/// Decode a raster source and re-encode it as JPEG at the configured
/// quality, flattening any alpha channel.
fn reencode_raster(
    image: &ResolvedImage,
    output: &std::path::Path,
    opts: &TranscodeOptions,
) -> Result<(), MediaError> {
    let decoded = image::open(&image.source_path).map_err(|e| MediaError::TranscodeFailed {
        path: image.source_path.clone(),
        detail: e.to_string(),
    })?;
    // Decode completes before the output file is created, so re-encoding a
    // source that is already a .jpg writes over it safely.
    let rgb = decoded.to_rgb8();

    let file = File::create(output).map_err(|e| MediaError::TranscodeFailed {
        path: image.source_path.clone(),
        detail: e.to_string(),
    })?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, opts.quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| MediaError::TranscodeFailed {
            path: image.source_path.clone(),
            detail: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::path::Path;

    fn opts() -> TranscodeOptions {
        TranscodeOptions {
            quality: 85,
            dpi: 150,
            program: "pdftoppm".to_string(),
        }
    }

    fn resolved(path: &Path) -> ResolvedImage {
        ResolvedImage {
            source_path: path.to_path_buf(),
            format: SourceFormat::classify(path),
        }
    }

    #[test]
    fn raster_png_becomes_jpeg_without_alpha() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("fig.png");
        let img = RgbaImage::from_pixel(8, 8, Rgba([0, 128, 255, 64]));
        img.save(&src).unwrap();

        let out = transcode(&resolved(&src), &opts()).unwrap();
        assert_eq!(out, tmp.path().join("fig.jpg"));

        let reloaded = image::open(&out).unwrap();
        assert_eq!(reloaded.color().channel_count(), 3, "alpha must be gone");
        assert_eq!(reloaded.width(), 8);
    }

    #[test]
    fn quality_affects_file_size() {
        let tmp = tempfile::tempdir().unwrap();
        // Noise compresses badly, so the quality knob shows up in the size.
        let mut img = image::RgbImage::new(64, 64);
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = image::Rgb([
                (x * 37 % 251) as u8,
                (y * 91 % 251) as u8,
                ((x + y) * 53 % 251) as u8,
            ]);
        }
        let hi_src = tmp.path().join("hi.png");
        let lo_src = tmp.path().join("lo.png");
        img.save(&hi_src).unwrap();
        img.save(&lo_src).unwrap();

        let hi = transcode(
            &resolved(&hi_src),
            &TranscodeOptions {
                quality: 95,
                ..opts()
            },
        )
        .unwrap();
        let lo = transcode(
            &resolved(&lo_src),
            &TranscodeOptions {
                quality: 10,
                ..opts()
            },
        )
        .unwrap();

        let hi_len = std::fs::metadata(hi).unwrap().len();
        let lo_len = std::fs::metadata(lo).unwrap().len();
        assert!(hi_len > lo_len, "expected {hi_len} > {lo_len}");
    }

    #[test]
    fn unreadable_source_is_transcode_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("broken.png");
        std::fs::write(&src, b"not a png").unwrap();

        let err = transcode(&resolved(&src), &opts()).unwrap_err();
        assert!(matches!(err, MediaError::TranscodeFailed { .. }));
    }

    #[test]
    fn missing_external_tool_is_transcode_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("diagram.pdf");
        std::fs::write(&src, b"%PDF-1.4").unwrap();

        let err = transcode(
            &resolved(&src),
            &TranscodeOptions {
                program: "tex2epub-no-such-tool".to_string(),
                ..opts()
            },
        )
        .unwrap_err();
        match err {
            MediaError::TranscodeFailed { detail, .. } => {
                assert!(detail.contains("not found"), "got: {detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! CLI binary for tex2epub.
//!
//! A thin shim over the library crate that loads the JSON configuration,
//! applies flag overrides, and renders progress while the book assembles.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tex2epub::{
    assemble_to_file_with_observer, open_debug_log, BuildConfig, BuildObserver, Fanout,
    NoopObserver,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

/// Shorten a message to at most `max_chars` characters. Skip reasons embed
/// paths and tool stderr, so the cut must land on a char boundary.
fn ellipsize(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}

// ── CLI progress display using indicatif ─────────────────────────────────────

/// Terminal progress display: one bar across the materials list plus a log
/// line per document and per unresolved image.
struct CliProgress {
    bar: ProgressBar,
    skipped: AtomicUsize,
    unresolved: AtomicUsize,
}

impl CliProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>2}/{len} documents  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Assembling");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            skipped: AtomicUsize::new(0),
            unresolved: AtomicUsize::new(0),
        }
    }

    fn name_of(input: &Path) -> String {
        input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string())
    }
}

impl BuildObserver for CliProgress {
    fn on_convert_start(&self, input: &Path) {
        self.bar.set_message(Self::name_of(input));
    }

    fn on_document_skipped(&self, input: &Path, reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        let msg = ellipsize(reason, 79);
        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            Self::name_of(input),
            red(&msg)
        ));
        self.bar.inc(1);
    }

    fn on_image_unresolved(&self, name: &str, reason: &str) {
        self.unresolved.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "    {} image {}  {}",
            yellow("⚠"),
            name,
            dim(reason)
        ));
    }

    fn on_chapter_added(&self, _index: usize, filename: &str) {
        self.bar
            .println(format!("  {} {}", green("✓"), dim(filename)));
        self.bar.inc(1);
    }

    fn on_complete(&self, chapters: usize, assets: usize) {
        self.bar.finish_and_clear();
        let skipped = self.skipped.load(Ordering::SeqCst);
        let unresolved = self.unresolved.load(Ordering::SeqCst);

        if skipped == 0 && unresolved == 0 {
            eprintln!(
                "{} {} chapter(s), {} image(s) packaged",
                green("✔"),
                bold(&chapters.to_string()),
                assets
            );
        } else {
            eprintln!(
                "{} {} chapter(s), {} image(s) packaged  ({} document(s) skipped, {} image(s) unresolved)",
                if chapters == 0 { red("✘") } else { yellow("⚠") },
                bold(&chapters.to_string()),
                assets,
                skipped,
                unresolved,
            );
        }
    }
}

const AFTER_HELP: &str = r#"CONFIG FILE:
  {
    "cover": "cover.jpg",
    "materials": ["ch1.tex", "ch2.tex"],
    "template": "book.html",
    "extractMedia": true,
    "debug": false,
    "output": "book.epub",
    "title": "My Book",
    "language": "en"
  }

  Only "materials" is required. Materials are chapters, in order.

EXAMPLES:
  # Assemble from a config file
  tex2epub book.json

  # Override the output path and bump image quality
  tex2epub book.json -o draft.epub --quality 95

  # Keep converted HTML and an event log for inspection
  tex2epub book.json --debug

EXTERNAL TOOLS:
  pandoc      markup conversion (required)
  pdftoppm    PDF/EPS figure rasterisation (required only for such figures)

ENVIRONMENT VARIABLES:
  TEX2EPUB_OUTPUT   Override the output path
  TEX2EPUB_QUALITY  Override JPEG quality
  TEX2EPUB_DPI      Override figure render DPI
"#;

/// Assemble an EPUB e-book from LaTeX sources.
#[derive(Parser, Debug)]
#[command(
    name = "tex2epub",
    version,
    about = "Assemble an EPUB e-book from LaTeX sources via pandoc",
    long_about = "Assemble an EPUB e-book from LaTeX source documents. Each material becomes \
one chapter; figures referenced from the sources (including PDF and EPS) are transcoded to \
JPEG and packaged alongside the text.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// JSON configuration file describing the book.
    config: PathBuf,

    /// Write the EPUB to this path instead of the configured one.
    #[arg(short, long, env = "TEX2EPUB_OUTPUT")]
    output: Option<PathBuf>,

    /// JPEG re-encode quality (1–100).
    #[arg(long, env = "TEX2EPUB_QUALITY",
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Figure rendering DPI (72–400).
    #[arg(long, env = "TEX2EPUB_DPI",
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: Option<u32>,

    /// Keep converted HTML and write an event log to the debug directory.
    #[arg(short, long, env = "TEX2EPUB_DEBUG")]
    debug: bool,

    /// Print run statistics as JSON to stdout.
    #[arg(long, env = "TEX2EPUB_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "TEX2EPUB_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TEX2EPUB_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TEX2EPUB_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Configuration ────────────────────────────────────────────────────
    let mut config = BuildConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config '{}'", cli.config.display()))?;
    if let Some(output) = cli.output {
        config.output = output;
    }
    if let Some(quality) = cli.quality {
        config.quality = quality;
    }
    if let Some(dpi) = cli.dpi {
        config.dpi = dpi;
    }
    if cli.debug {
        config.debug = true;
    }

    // ── Assembly ─────────────────────────────────────────────────────────
    config
        .validate()
        .context("Invalid configuration")?;
    let progress = if show_progress {
        Some(CliProgress::new(config.materials.len()))
    } else {
        None
    };
    let progress_ref: &dyn BuildObserver = match progress {
        Some(ref p) => p,
        None => &NoopObserver,
    };

    let stats = if config.debug {
        let log = open_debug_log(&config)?;
        let fan = Fanout(progress_ref, &log);
        let stats = assemble_to_file_with_observer(&config, &fan)?;
        if !cli.quiet {
            eprintln!(
                "{} debug artifacts in '{}'",
                dim("→"),
                config.debug_dir.display()
            );
        }
        stats
    } else {
        assemble_to_file_with_observer(&config, progress_ref)?
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Failed to serialize stats")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{} wrote {} {}",
            green("✔"),
            bold(&config.output.display().to_string()),
            dim(&format!("({} ms)", stats.duration_ms))
        );
    }
    Ok(())
}

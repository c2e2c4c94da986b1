//! CLI binary for epub-ingest.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `LoaderConfig` and prints chapters as plain text.

use anyhow::{Context, Result};
use clap::Parser;
use epub_ingest::{
    inspect_with_config, load, Document, LoadProgressCallback, LoaderConfig, PackageMetadata,
    ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Terminal progress callback: a spinner while the archive is unpacked,
/// then a bar over the spine once its length is known.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Unpacking EPUB…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} spine entries  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Loading");
    }
}

impl LoadProgressCallback for CliProgressCallback {
    fn on_load_start(&self, spine_len: usize) {
        self.activate_bar(spine_len);
    }

    fn on_chapter_loaded(&self, index: usize, title: &str, text_len: usize) {
        self.bar.set_message(title.to_string());
        self.bar.println(format!(
            "  {} {:>3}  {:<40}  {}",
            green("✓"),
            index + 1,
            title,
            dim(&format!("{text_len:>7} chars")),
        ));
        self.bar.inc(1);
    }

    fn on_chapter_skipped(&self, idref: &str, reason: &str) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("  {} {}  {}", dim("·"), idref, dim(reason)));
        self.bar.inc(1);
    }

    fn on_load_complete(&self, spine_len: usize, chapter_count: usize) {
        self.bar.finish_and_clear();
        let skipped = self.skipped.load(Ordering::SeqCst);
        eprintln!(
            "{} {} chapters from {} spine entries{}",
            if chapter_count == 0 { yellow("⚠") } else { green("✔") },
            bold(&chapter_count.to_string()),
            spine_len,
            if skipped > 0 {
                dim(&format!("  ({skipped} skipped)"))
            } else {
                String::new()
            },
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Whole book as plain text (stdout)
  epub2text book.epub

  # Write to a file
  epub2text book.epub -o book.txt

  # One chapter (1-based)
  epub2text --chapter 3 book.epub

  # Chapter list
  epub2text --list book.epub

  # Package metadata only
  epub2text --metadata book.epub

  # Full document as JSON
  epub2text --json book.epub > book.json

ENVIRONMENT VARIABLES:
  RUST_LOG   Override the log filter (e.g. RUST_LOG=epub_ingest=debug)
"#;

/// Extract plain-text chapters from EPUB files.
#[derive(Parser, Debug)]
#[command(
    name = "epub2text",
    version,
    about = "Extract plain-text chapters and metadata from EPUB files",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the .epub file.
    input: PathBuf,

    /// Write text to this file instead of stdout.
    #[arg(short, long, env = "EPUB2TEXT_OUTPUT")]
    output: Option<PathBuf>,

    /// Print only this chapter (1-based).
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    chapter: Option<u32>,

    /// Print the chapter list instead of the text.
    #[arg(long)]
    list: bool,

    /// Print package metadata only; no chapter is loaded.
    #[arg(long)]
    metadata: bool,

    /// Output structured JSON instead of text.
    #[arg(long, env = "EPUB2TEXT_JSON")]
    json: bool,

    /// Do not read chapter titles from the table of contents.
    #[arg(long)]
    no_toc: bool,

    /// Parent directory for the scratch extraction directory.
    #[arg(long, env = "EPUB2TEXT_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Disable progress bar.
    #[arg(long, env = "EPUB2TEXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EPUB2TEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.metadata;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn LoadProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Metadata-only mode ───────────────────────────────────────────────
    if cli.metadata {
        let meta = inspect_with_config(&cli.input, &config)
            .await
            .context("Failed to inspect EPUB")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            print_metadata(&cli.input, &meta);
        }
        return Ok(());
    }

    // ── Load ─────────────────────────────────────────────────────────────
    let start = Instant::now();
    let loaded = load(&cli.input, &config).await.context("Load failed")?;
    let document = loaded.document;

    if !cli.quiet {
        for warning in &document.warnings {
            eprintln!("{} {}", yellow("⚠"), warning);
        }
    }

    // ── Render output ────────────────────────────────────────────────────
    let text = if cli.list {
        render_list(&document)
    } else if let Some(n) = cli.chapter {
        let chapter = document
            .chapters
            .get(n as usize - 1)
            .with_context(|| {
                format!(
                    "Chapter {} out of range (book has {} chapters)",
                    n,
                    document.chapters.len()
                )
            })?;
        if cli.json {
            serde_json::to_string_pretty(chapter).context("Failed to serialise chapter")?
        } else {
            format!("{}\n", chapter.content)
        }
    } else if cli.json {
        serde_json::to_string_pretty(&document).context("Failed to serialise document")?
    } else {
        render_text(&document)
    };

    match cli.output {
        Some(ref path) => {
            write_atomic(path, &text).await?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} chapters  {}ms  →  {}",
                    green("✔"),
                    document.chapters.len(),
                    start.elapsed().as_millis(),
                    bold(&path.display().to_string()),
                );
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .context("Failed to write to stdout")?;
            if !text.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }

    // `loaded.archive` drops here, removing the scratch directory.
    Ok(())
}

/// Map CLI args to `LoaderConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<LoaderConfig> {
    let mut builder = LoaderConfig::builder().resolve_toc_titles(!cli.no_toc);
    if let Some(ref dir) = cli.scratch_dir {
        builder = builder.scratch_root(dir);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }
    builder.build().context("Invalid configuration")
}

fn print_metadata(path: &Path, meta: &PackageMetadata) {
    println!("File:        {}", path.display());
    println!("Title:       {}", meta.title);
    if let Some(ref c) = meta.creator {
        println!("Creator:     {}", c);
    }
    println!("Language:    {}", meta.language);
    println!("Identifier:  {}", meta.identifier);
    if let Some(ref p) = meta.publisher {
        println!("Publisher:   {}", p);
    }
    if let Some(ref d) = meta.date {
        println!("Date:        {}", d);
    }
    if let Some(ref r) = meta.rights {
        println!("Rights:      {}", r);
    }
}

fn render_list(document: &Document) -> String {
    let mut out = format!("{}\n", document.metadata.title);
    for chapter in document.chapters.iter() {
        out.push_str(&format!(
            "{:>4}  {:<40}  {}\n",
            chapter.index + 1,
            chapter.title,
            chapter.id
        ));
    }
    out
}

fn render_text(document: &Document) -> String {
    document
        .chapters
        .iter()
        .map(|c| format!("## {}\n\n{}\n", c.title, c.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write to a temp file next to `path`, then rename over it.
async fn write_atomic(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp_path, text)
        .await
        .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

//! CLI binary for ocrmd.
//!
//! A thin shim over the library crate: each subcommand maps its flags onto
//! one library call and prints the result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ocrmd::{
    convert, export, outline, to_plain_text, ExportFormat, OcrConfig, RenderConfig, API_KEY_VAR,
};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR a scan, markdown on stdout
  ocrmd ocr scan.pdf

  # OCR straight to a PDF export
  ocrmd ocr scan.pdf -o scan-ocr.pdf

  # Full result as JSON (markdown, outline, per-page text, stats)
  ocrmd ocr https://example.com/report.pdf --json > report.json

  # Work on markdown you already have
  ocrmd outline ocr.md
  ocrmd text ocr.md > ocr.txt
  ocrmd render ocr.md -o ocr.pdf

  # Web front-end
  ocrmd serve --bind 0.0.0.0:5000

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY        OCR API key (required for `ocr` and the /ocr endpoint)
  MISTRAL_OCR_ENDPOINT   OCR API base URL (default https://api.mistral.ai)
  MISTRAL_OCR_MODEL      OCR model (default mistral-ocr-latest)
  OCRMD_BIND             Listen address for `serve`
  RUST_LOG               Overrides the log filter
"#;

/// OCR PDFs to Markdown, inspect outlines, export to text or PDF.
#[derive(Parser, Debug)]
#[command(
    name = "ocrmd",
    version,
    about = "OCR PDF documents to Markdown and export them as Markdown, text or PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "OCRMD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "OCRMD_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// OCR a local PDF or URL.
    Ocr {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Write the export to this file instead of stdout.
        #[arg(short, long, env = "OCRMD_OUTPUT")]
        output: Option<PathBuf>,

        /// Export format: md, txt or pdf. Defaults to the output extension, else md.
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Print the full result as JSON instead of an export.
        #[arg(long, conflicts_with = "format")]
        json: bool,

        /// OCR API key.
        #[arg(long, env = "MISTRAL_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// OCR API base URL.
        #[arg(long, env = "MISTRAL_OCR_ENDPOINT")]
        endpoint: Option<String>,

        /// OCR model ID.
        #[arg(long, env = "MISTRAL_OCR_MODEL")]
        model: Option<String>,

        /// OCR request timeout in seconds.
        #[arg(long, env = "OCRMD_API_TIMEOUT", default_value_t = 300)]
        api_timeout: u64,

        /// HTTP download timeout in seconds.
        #[arg(long, env = "OCRMD_DOWNLOAD_TIMEOUT", default_value_t = 120)]
        download_timeout: u64,
    },

    /// Render a markdown file (or `-` for stdin) to PDF.
    Render {
        markdown: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Write uncompressed content streams.
        #[arg(long)]
        no_compress: bool,
    },

    /// Print the heading outline of a markdown file.
    Outline {
        markdown: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Print the plain-text rendition of a markdown file.
    Text { markdown: PathBuf },

    /// Serve the web front-end.
    Serve {
        /// Listen address.
        #[arg(long, env = "OCRMD_BIND", default_value = "127.0.0.1:5000")]
        bind: std::net::SocketAddr,

        /// Maximum upload size in MiB.
        #[arg(long, env = "OCRMD_MAX_UPLOAD_MB", default_value_t = 50)]
        max_upload_mb: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Ocr {
            input,
            output,
            format,
            json,
            api_key,
            endpoint,
            model,
            api_timeout,
            download_timeout,
        } => {
            let mut builder = OcrConfig::builder()
                .timeout_secs(api_timeout)
                .download_timeout_secs(download_timeout);
            if let Some(key) = api_key {
                builder = builder.api_key(key);
            }
            if let Some(endpoint) = endpoint {
                builder = builder.endpoint(endpoint);
            }
            if let Some(model) = model {
                builder = builder.model(model);
            }
            let config = builder.build().context("Invalid configuration")?;

            let progress = (!cli.quiet).then(|| spinner(&input));
            let result = convert(&input, &config).await;
            if let Some(bar) = &progress {
                bar.finish_and_clear();
            }
            let out = result.with_context(|| {
                format!("OCR failed (is {API_KEY_VAR} set and the file a PDF?)")
            })?;

            if json {
                let s = serde_json::to_string_pretty(&out).context("Failed to serialise output")?;
                println!("{s}");
            } else {
                let format = format
                    .or_else(|| output.as_deref().and_then(ExportFormat::from_path))
                    .unwrap_or(ExportFormat::Markdown);
                let bytes = export(&out.markdown, format, &RenderConfig::default())
                    .context("Export failed")?;
                emit(output.as_deref(), &bytes).await?;
            }

            if !cli.quiet {
                eprintln!(
                    "{} {} pages  {} headings  {}",
                    green("✔"),
                    bold(&out.stats.total_pages.to_string()),
                    out.stats.heading_count,
                    dim(&format!("{}ms", out.stats.total_duration_ms)),
                );
            }
        }

        Command::Render {
            markdown,
            output,
            no_compress,
        } => {
            let text = read_markdown(&markdown)?;
            let config = RenderConfig::builder()
                .compress(!no_compress)
                .build()
                .context("Invalid configuration")?;
            let bytes = export(&text, ExportFormat::Pdf, &config).context("Rendering failed")?;
            emit(Some(&output), &bytes).await?;
            if !cli.quiet {
                eprintln!(
                    "{} {}  {}",
                    green("✔"),
                    bold(&output.display().to_string()),
                    dim(&format!("{} bytes", bytes.len()))
                );
            }
        }

        Command::Outline { markdown, json } => {
            let text = read_markdown(&markdown)?;
            let summary = outline::summarize(&text);
            if json {
                let s = serde_json::to_string_pretty(&summary).context("Failed to serialise outline")?;
                println!("{s}");
            } else {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                for entry in &summary.entries {
                    let pad = " ".repeat(outline::Outline::indent(entry, 2) as usize);
                    writeln!(handle, "{pad}{}", entry.text).context("Failed to write to stdout")?;
                }
                if !cli.quiet {
                    eprintln!(
                        "{}",
                        dim(&format!(
                            "{} pages • {} headings",
                            summary.page_count,
                            summary.heading_count()
                        ))
                    );
                }
            }
        }

        Command::Text { markdown } => {
            let text = read_markdown(&markdown)?;
            emit(None, to_plain_text(&text).as_bytes()).await?;
        }

        Command::Serve {
            bind,
            max_upload_mb,
        } => {
            let config = ocrmd::ServerConfig {
                bind,
                max_upload_bytes: max_upload_mb * 1024 * 1024,
                ..Default::default()
            };
            if !cli.quiet {
                eprintln!("{} listening on {}", green("◆"), bold(&format!("http://{bind}")));
            }
            ocrmd::server::serve(config).await.context("Server failed")?;
        }
    }

    Ok(())
}

fn spinner(input: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("OCR");
    bar.set_message(input.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Read a markdown file, or stdin for `-`.
fn read_markdown(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut s = String::new();
        io::stdin()
            .read_to_string(&mut s)
            .context("Failed to read stdin")?;
        return Ok(s);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Write to a file (atomically) or to stdout with a trailing newline.
async fn emit(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => ocrmd::write_output(path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(bytes)
                .context("Failed to write to stdout")?;
            if !bytes.ends_with(b"\n") {
                handle.write_all(b"\n").ok();
            }
            Ok(())
        }
    }
}

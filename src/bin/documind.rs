//! CLI binary for documind.
//!
//! A thin shim over the library: maps flags to `AnalysisConfig`, drives a
//! `Session`, and prints results. Every failure inside the interactive
//! `chat` loop is reported and the loop carries on.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use documind::{
    extract_text, render, resolve_input, AnalysisConfig, AnalysisMode, AnalysisProgressCallback,
    ProgressCallback, Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Shows a spinner while a model request is in flight.
///
/// A fresh bar is created per request; the previous one is always finished
/// before the next starts because requests never overlap.
struct SpinnerCallback {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(None),
        })
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl AnalysisProgressCallback for SpinnerCallback {
    fn on_request_start(&self, mode: AnalysisMode) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!("{}…", mode.activity()));
        bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    fn on_request_retry(&self, _mode: AnalysisMode, attempt: u32, error: String) {
        if let Ok(slot) = self.bar.lock() {
            if let Some(bar) = slot.as_ref() {
                let msg = if error.chars().count() > 80 {
                    format!("{}\u{2026}", error.chars().take(79).collect::<String>())
                } else {
                    error
                };
                bar.println(format!("  {} retry {attempt}: {}", yellow("↻"), dim(&msg)));
            }
        }
    }

    fn on_request_complete(&self, _mode: AnalysisMode, _response_chars: usize) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
    }

    fn on_request_error(&self, _mode: AnalysisMode, _error: String) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Summarise a paper and save <name>_summary.txt next to it
  documind summary paper.pdf -o .

  # Ask a single question
  documind ask paper.pdf "Which dataset was used for evaluation?"

  # Mind map as a terminal outline, or as an interactive HTML page
  documind mindmap paper.pdf
  documind mindmap paper.pdf --html paper_mindmap.html

  # Interactive session (type :help inside)
  documind chat https://arxiv.org/pdf/1706.03762

  # Page and character counts only (no API key needed)
  documind inspect paper.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  DOCUMIND_PROVIDER       Override provider (gemini, openai, anthropic, ollama, …)
  DOCUMIND_MODEL          Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, e.g. documind=debug

  Variables may also be placed in a .env file in the working directory.
"#;

/// Summarise, question and mind-map PDF documents with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "documind",
    version,
    about = "Summarise, question and mind-map PDF documents with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    llm: ModelArgs,

    /// Disable the spinner.
    #[arg(long, global = true, env = "DOCUMIND_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCUMIND_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "DOCUMIND_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, global = true, env = "DOCUMIND_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM provider: gemini, openai, anthropic, mistral, ollama, …
    #[arg(long, global = true, env = "DOCUMIND_PROVIDER", default_value = "gemini")]
    provider: String,

    /// LLM model ID (default depends on the provider).
    #[arg(long, global = true, env = "DOCUMIND_MODEL")]
    model: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "DOCUMIND_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max LLM output tokens per request.
    #[arg(long, global = true, env = "DOCUMIND_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Retries after a transient LLM failure.
    #[arg(long, global = true, env = "DOCUMIND_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Per-request LLM timeout in seconds.
    #[arg(long, global = true, env = "DOCUMIND_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summarise the document (main theme plus 5–8 key points).
    Summary {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Also write `<filename>_summary.txt` into this directory.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Ask one question about the document.
    Ask {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// The question; several words need no quoting.
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },

    /// Build a concept mind map of the document.
    Mindmap {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,

        /// Write an interactive HTML page to this file.
        #[arg(long)]
        html: Option<PathBuf>,

        /// Print the tree as JSON instead of an outline.
        #[arg(long)]
        json: bool,
    },

    /// Print file name, page count and character count (no API key needed).
    Inspect {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,
    },

    /// Interactive session: ask questions, summarise, map, export.
    Chat {
        /// Local PDF file path or HTTP/HTTPS URL.
        input: String,
    },
}

impl Command {
    fn input(&self) -> &str {
        match self {
            Command::Summary { input, .. }
            | Command::Ask { input, .. }
            | Command::Mindmap { input, .. }
            | Command::Inspect { input }
            | Command::Chat { input } => input,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs would tear through the spinner, so they are
    // suppressed while it is shown.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    // ── Inspect: extraction only ─────────────────────────────────────────
    if let Command::Inspect { input } = &cli.command {
        let upload = resolve_input(input, cli.download_timeout)
            .await
            .context("Failed to read input")?;
        let filename = upload.filename.clone();
        let size = upload.bytes.len();
        let extracted = extract_text(upload.bytes)
            .await
            .context("Failed to extract text")?;

        println!("File:         {filename}");
        println!("Size:         {size} bytes");
        println!("Pages:        {}", extracted.page_count);
        println!("Characters:   {}", extracted.text.chars().count());
        return Ok(());
    }

    // ── Session setup ────────────────────────────────────────────────────
    // The provider (and its API key) is resolved before the document is
    // touched so a missing key halts immediately.
    let progress: Option<ProgressCallback> = if show_progress {
        Some(SpinnerCallback::new() as Arc<dyn AnalysisProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress)?;
    let mut session = Session::new(config).context("Startup failed")?;

    load(&mut session, cli.command.input(), cli.download_timeout, cli.quiet).await?;
    if !cli.quiet {
        eprintln!("{}", dim(&format!("model: {}", session.generator_name())));
    }

    match cli.command {
        Command::Summary { output_dir, .. } => {
            let summary = session.summarize().await.context("Summary failed")?;
            println!("{summary}");
            if let Some(dir) = output_dir {
                let path = session
                    .export_summary(&dir)
                    .await
                    .context("Export failed")?;
                if !cli.quiet {
                    eprintln!("{} summary written to {}", green("✔"), bold(&path.display().to_string()));
                }
            }
        }
        Command::Ask { question, .. } => {
            let question = question.join(" ");
            let turn = session.ask(&question).await.context("Question failed")?;
            println!("{}", turn.answer);
        }
        Command::Mindmap { html, json, .. } => {
            let tree = session
                .generate_mindmap()
                .await
                .context("Mind map failed")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(tree).context("Failed to serialise mind map")?
                );
            } else {
                print!("{}", render::outline(tree));
            }
            if let Some(path) = html {
                write_html(tree, &path).await?;
                if !cli.quiet {
                    eprintln!("{} mind map written to {}", green("✔"), bold(&path.display().to_string()));
                }
            }
        }
        Command::Chat { .. } => chat(&mut session, cli.download_timeout).await?,
        Command::Inspect { .. } => {}
    }

    Ok(())
}

/// Map CLI args to `AnalysisConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnalysisConfig> {
    let m = &cli.llm;
    let mut builder = AnalysisConfig::builder()
        .provider_name(m.provider.clone())
        .temperature(m.temperature)
        .max_tokens(m.max_tokens)
        .max_retries(m.max_retries)
        .api_timeout_secs(m.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = m.model {
        builder = builder.model(model.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

async fn load(session: &mut Session, input: &str, download_timeout: u64, quiet: bool) -> Result<()> {
    let upload = resolve_input(input, download_timeout)
        .await
        .context("Failed to read input")?;
    let doc = session
        .load_document(upload)
        .await
        .context("Failed to extract text")?;
    if !quiet {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(doc.filename()),
            dim(&format!("{} pages · {} chars", doc.page_count(), doc.char_count())),
        );
    }
    Ok(())
}

async fn write_html(tree: &documind::MindmapNode, path: &Path) -> Result<()> {
    let page = render::html_page(tree).context("Failed to render mind map")?;
    tokio::fs::write(path, page)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

const CHAT_HELP: &str = "\
  <question>        ask about the document
  :summary          summarise the document
  :mindmap [file]   build a mind map (optionally write HTML to file)
  :history          show the conversation so far
  :clear            clear the conversation
  :export [dir]     write <filename>_summary.txt (default: .)
  :load <input>     switch to another PDF (clears everything)
  :info             document statistics
  :help             this help
  :quit             leave";

/// Interactive loop. Errors are reported and the loop continues.
async fn chat(session: &mut Session, download_timeout: u64) -> Result<()> {
    eprintln!("{}", dim("Type a question, or :help for commands."));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", cyan("›"));
        io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, arg) = match line.split_once(char::is_whitespace) {
            Some((c, a)) => (c, a.trim()),
            None => (line, ""),
        };

        let outcome: Result<bool> = match cmd {
            ":quit" | ":q" | ":exit" => Ok(false),
            ":help" => {
                println!("{CHAT_HELP}");
                Ok(true)
            }
            ":summary" => session
                .summarize()
                .await
                .map(|s| println!("{s}"))
                .map(|_| true)
                .map_err(Into::into),
            ":mindmap" => match session.generate_mindmap().await {
                Ok(tree) => {
                    print!("{}", render::outline(tree));
                    if arg.is_empty() {
                        Ok(true)
                    } else {
                        write_html(tree, Path::new(arg)).await.map(|_| {
                            eprintln!("{} mind map written to {}", green("✔"), bold(arg));
                            true
                        })
                    }
                }
                Err(e) => Err(e.into()),
            },
            ":history" => {
                if session.conversation().is_empty() {
                    println!("{}", dim("(no questions yet)"));
                }
                for (i, turn) in session.conversation().iter().enumerate() {
                    println!("{} {}", bold(&format!("Q{}:", i + 1)), turn.question);
                    println!("{} {}\n", bold(&format!("A{}:", i + 1)), turn.answer);
                }
                Ok(true)
            }
            ":clear" => {
                session.clear_conversation();
                println!("{}", dim("conversation cleared"));
                Ok(true)
            }
            ":export" => {
                let dir = if arg.is_empty() { "." } else { arg };
                session
                    .export_summary(Path::new(dir))
                    .await
                    .map(|path| {
                        eprintln!("{} summary written to {}", green("✔"), bold(&path.display().to_string()));
                        true
                    })
                    .map_err(Into::into)
            }
            ":load" if arg.is_empty() => Err(anyhow::anyhow!(":load needs a file path or URL")),
            ":load" => load(session, arg, download_timeout, false).await.map(|_| true),
            ":info" => {
                if let Some(doc) = session.document() {
                    println!(
                        "{}  {} pages · {} chars · {} questions",
                        bold(doc.filename()),
                        doc.page_count(),
                        doc.char_count(),
                        session.conversation().len()
                    );
                }
                Ok(true)
            }
            c if c.starts_with(':') => Err(anyhow::anyhow!("unknown command {c} (try :help)")),
            _ => session
                .ask(line)
                .await
                .map(|turn| {
                    println!("{}\n", turn.answer);
                    true
                })
                .map_err(Into::into),
        };

        match outcome {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("{} {:#}", red("✗"), e),
        }
    }

    Ok(())
}

//! LumiReads CLI - book search and narrated summaries
//!
//! The application logic is contained in lib.rs, and this file is responsible
//! for parsing arguments and handling top-level errors.

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use dialoguer::Select;
use lumireads::{ui, BookSummaryRef, Config, Language, ReaderClient};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Shown by `--play` when no player is configured
const NO_PLAYER_HINT: &str =
    "set [audio] player in lumireads.toml to play narration, or use --save to keep summary.mp3";

#[derive(Parser)]
#[command(name = "lumireads")]
#[command(author, version, about = "Search books and listen to their summaries", long_about = None)]
struct Cli {
    /// Path to a lumireads.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct SummaryOpts {
    /// Language of the summary (defaults to the configured language)
    #[arg(short, long, value_enum)]
    language: Option<Language>,
    /// Save summary.txt and summary.mp3 to the export directory
    #[arg(long)]
    save: bool,
    /// Play the narration with the configured audio player
    #[arg(long)]
    play: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the book catalog
    Search {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,
        /// Pick a result interactively and summarise it
        #[arg(long)]
        pick: bool,
        #[command(flatten)]
        opts: SummaryOpts,
    },
    /// Summarise a catalog book by key (e.g. /works/OL893415W)
    Book {
        key: String,
        #[command(flatten)]
        opts: SummaryOpts,
    },
    /// Summarise a local .pdf or .txt document
    File {
        path: PathBuf,
        #[command(flatten)]
        opts: SummaryOpts,
    },
    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "lumireads", &mut std::io::stdout());
        return Ok(());
    }

    init_tracing(cli.command.is_none())?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::Search { query, pick, opts }) => {
            let mut client = ReaderClient::new(&config)?;
            let query = query.join(" ");
            let books = client.search(&query).await.to_vec();

            if books.is_empty() {
                println!("No books found for: {}", query);
                return Ok(());
            }

            print_books(&books, &config.catalog.covers_url);

            if pick {
                let items: Vec<String> = books
                    .iter()
                    .map(|b| format!("{} by {}", b.display_title(), b.author))
                    .collect();
                let choice = Select::new()
                    .with_prompt("Summarise which book?")
                    .items(&items)
                    .default(0)
                    .interact_opt()?;

                if let Some(idx) = choice {
                    apply_language(&mut client, &opts);
                    let book = &books[idx];
                    println!("\nSummarising {}...\n", book.display_title().bold());
                    client.summarize_book(&book.key).await;
                    finish(&mut client, &opts, &config)?;
                }
            }
        }
        Some(Commands::Book { key, opts }) => {
            let mut client = ReaderClient::new(&config)?;
            apply_language(&mut client, &opts);
            println!("Summarising {}...\n", key);
            client.summarize_book(&key).await;
            finish(&mut client, &opts, &config)?;
        }
        Some(Commands::File { path, opts }) => {
            let mut client = ReaderClient::new(&config)?;
            apply_language(&mut client, &opts);
            println!("Summarising {}...\n", path.display());
            client.select_upload(path);
            client.summarize_upload().await;
            finish(&mut client, &opts, &config)?;
        }
        Some(Commands::Completions { .. }) => {}
        None => {
            // Default: Launch the TUI
            ui::run(config).await?;
        }
    }

    Ok(())
}

/// Install the tracing subscriber. The TUI logs to a file so the screen stays clean.
fn init_tracing(tui: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    if tui {
        let log_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("lumireads");
        std::fs::create_dir_all(&log_dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_dir.join("lumireads.log"))?;

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    Ok(())
}

fn apply_language(client: &mut ReaderClient, opts: &SummaryOpts) {
    if let Some(language) = opts.language {
        client.set_language(language);
    }
}

fn print_books(books: &[BookSummaryRef], covers_url: &str) {
    for (i, book) in books.iter().enumerate() {
        println!(
            "{:>2}. {} {}",
            i + 1,
            book.display_title().bold(),
            format!("by {}", book.author).cyan()
        );
        println!("    {}", book.key.dimmed());
        if let Some(cover) = book.cover_url(covers_url) {
            println!("    {}", cover.dimmed());
        }
    }
}

/// Print the result of a summarization and run the requested follow-ups
fn finish(client: &mut ReaderClient, opts: &SummaryOpts, config: &Config) -> anyhow::Result<()> {
    let state = client.state();
    println!("📖 Summary ({}):", state.language);
    println!("{}\n", state.summary().unwrap_or_default());

    match state.audio() {
        Some(audio) => println!("🔊 Narration: {} bytes ({})", audio.len(), audio.mime()),
        None => println!("{}", "No narration available.".dimmed()),
    }

    if opts.save {
        save(client, &config.export.dir)?;
    }

    if opts.play {
        play(client, config)?;
    }

    Ok(())
}

fn save(client: &ReaderClient, dir: &Path) -> anyhow::Result<()> {
    if let Some(path) = client.download_summary(dir)? {
        println!("{} {}", "Saved".green(), path.display());
    }
    if let Some(path) = client.download_audio(dir)? {
        println!("{} {}", "Saved".green(), path.display());
    }
    Ok(())
}

fn play(client: &mut ReaderClient, config: &Config) -> anyhow::Result<()> {
    let Some(audio) = client.state_mut().audio_mut() else {
        return Ok(());
    };

    match config.audio.player.as_deref() {
        Some(player) => {
            let mut child = audio.play(player)?;
            // The temp file goes away with the handle, so wait for playback to end
            child.wait()?;
        }
        None => println!("{} {}", "Note:".yellow(), NO_PLAYER_HINT),
    }
    Ok(())
}

use std::sync::Arc;
use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use colored::*;
use tokio::sync::mpsc;

mod api;
mod app;
mod config;
mod conversation;
mod dispatcher;
mod handler;
mod input;
mod logging;
mod tui;
mod ui;
mod upload;

#[cfg(test)]
mod testing;

use api::{RagBackend, RagClient};
use app::App;
use config::Config;
use dispatcher::APOLOGY;
use upload::{Notice, UploadCoordinator, UploadForm};

#[derive(Parser)]
#[command(name = "rag-chat")]
#[command(about = "Chat with an uploaded PDF through a RAG backend")]
struct Cli {
    /// Backend base URL (default http://localhost:8000)
    #[arg(long, env = "RAG_CHAT_BASE_URL", global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// Your question
        question: String,
    },
    /// Upload a PDF for the backend to index
    Upload {
        /// Path to the PDF
        file: String,
        /// Chunk size (non-numeric values fall back to 500)
        #[arg(long)]
        chunk_size: Option<String>,
        /// Chunk overlap (non-numeric values fall back to 20)
        #[arg(long)]
        chunk_overlap: Option<String>,
    },
    /// Show saved settings, optionally updating the backend URL
    Config {
        /// Save this base URL to the config file
        #[arg(long)]
        set_base_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("{}: {}", "Ignoring unreadable config".yellow(), e);
        Config::default()
    });
    let base_url = config.resolve_base_url(cli.base_url.as_deref());

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_tui(&config, &base_url).await?,
        Commands::Ask { question } => {
            logging::init_stderr();
            let client = RagClient::new(&base_url);
            println!("🤖 Asking {}...\n", client.base_url().bold().magenta());
            ask(&client, &question).await?
        }
        Commands::Upload { file, chunk_size, chunk_overlap } => {
            logging::init_stderr();
            let form = upload_form(&config, file, chunk_size, chunk_overlap);
            upload_file(Arc::new(RagClient::new(&base_url)), form).await?
        }
        Commands::Config { set_base_url } => show_config(config, set_base_url)?,
    }

    Ok(())
}

async fn run_tui(config: &Config, base_url: &str) -> Result<()> {
    let log_path = logging::init_file()?;
    log::info!("Starting chat against {} (log at {})", base_url, log_path.display());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let backend: Arc<dyn RagBackend> = Arc::new(RagClient::new(base_url));
    let mut app = App::new(backend, events.sender(), config, base_url);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut tui::Tui, app: &mut App, events: &mut tui::EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

/// Failures print the apology and still return an error for the exit status
async fn ask(backend: &dyn RagBackend, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        bail!("Question is empty");
    }

    match backend.chat(question).await {
        Ok(response) => {
            println!("{}", "Response:".bold().green());
            println!("{}", response);
            Ok(())
        }
        Err(e) => {
            log::error!("Chat request failed: {}", e);
            println!("{}", APOLOGY.red());
            bail!("chat request failed")
        }
    }
}

fn upload_form(
    config: &Config,
    file: String,
    chunk_size: Option<String>,
    chunk_overlap: Option<String>,
) -> UploadForm {
    let mut form = UploadForm::new(config.chunk_size(), config.chunk_overlap());
    form.select_file(file);
    if let Some(size) = chunk_size {
        form.chunk_size.set(size);
    }
    if let Some(overlap) = chunk_overlap {
        form.chunk_overlap.set(overlap);
    }
    form
}

async fn upload_file(backend: Arc<dyn RagBackend>, form: UploadForm) -> Result<()> {
    let settings = form.config();
    println!(
        "📄 Uploading {} (chunk size {}, overlap {})",
        form.file_path.value().cyan(),
        settings.chunk_size.to_string().bold(),
        settings.chunk_overlap.to_string().bold()
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut uploader = UploadCoordinator::new(backend, tx, form);

    if uploader.submit() {
        while let Some(event) = rx.recv().await {
            if let tui::AppEvent::UploadFinished(result) = event {
                uploader.complete(result);
                break;
            }
        }
    }

    match uploader.notice() {
        Some(Notice::Success(text)) => {
            println!("{}", text.green());
            Ok(())
        }
        Some(Notice::Failure(text)) => {
            println!("{}", text.red());
            bail!("upload did not complete")
        }
        None => bail!("upload finished without a result"),
    }
}

fn show_config(mut config: Config, set_base_url: Option<String>) -> Result<()> {
    if let Some(url) = set_base_url {
        config.base_url = Some(url);
        let path = config.save()?;
        println!("{} {}", "Saved".green(), path.display());
    }

    println!("\n{}", "⚙️  rag-chat settings".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    println!("  base_url:       {}", config.resolve_base_url(None));
    println!("  chunk_size:     {}", config.chunk_size());
    println!("  chunk_overlap:  {}", config.chunk_overlap());
    println!("  config file:    {}", Config::get_config_path()?.display().to_string().dimmed());
    println!("  log file:       {}", logging::log_path()?.display().to_string().dimmed());

    Ok(())
}

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use moneymate::args_handler::{Args, Mode};
use moneymate::{Catalog, PromptBuilder, Session, LLM};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_catalog(args: &Args) -> Result<Catalog> {
    match &args.catalog {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("unable to read catalog {}", path.display())),
        None => Ok(Catalog::default()),
    }
}

fn load_model(args: &Args) -> Result<LLM> {
    let load_config = args.load_config()?;
    println!("{}", "=".repeat(60));
    println!("🚀 Loading model...");
    println!("   Path: {}", load_config.model_path.display());
    println!("   This may take a minute...");
    println!("{}", "=".repeat(60));
    let llm = LLM::load(&load_config)?;
    Ok(llm)
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    let catalog = match load_catalog(&args) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("❌ {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let llm = match load_model(&args) {
        Ok(llm) => llm,
        Err(e) => {
            log::error!("model load failed: {e:#}");
            eprintln!("❌ Failed to load model: {e:#}");
            eprintln!("   Make sure the path is correct and the file is a valid GGUF.");
            return ExitCode::FAILURE;
        }
    };

    let mut session = Session::new(llm, PromptBuilder::new(catalog), args.generation_config());

    match args.mode {
        Mode::Single => {
            let message = args.prompt.as_deref().unwrap_or_default();
            match session.respond(message) {
                Ok(reply) => {
                    println!("{}", reply.headline);
                    if let Some(detail) = reply.detail {
                        println!("   {detail}");
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("❌ Error generating: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Mode::Chat => {
            let interrupted = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&interrupted);
            if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
                log::warn!("unable to install the interrupt handler: {e}");
            }

            println!("\n✅ Model loaded successfully!");
            println!("{}", "=".repeat(60));
            println!("💬 MoneyMate AI Chat");
            println!("   Type your message to chat (or 'quit' to exit)");
            println!("{}", "=".repeat(60));
            let _ = io::stdout().flush();

            match session.run(io::stdin().lock(), io::stdout(), &interrupted) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("❌ Console error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

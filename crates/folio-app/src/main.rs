//! Folio application binary - composition root.
//!
//! 1. Resolve CLI flags and load configuration from TOML
//! 2. Load and validate the knowledge catalogue (fatal on error)
//! 3. Build the conversation engine, guestbook and language-model client
//! 4. Serve the HTTP API, or run an interactive terminal with `--repl`

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use folio_api::auth::load_or_generate_token;
use folio_api::state::AppState;
use folio_chat::{
    load_catalogue, BuiltinCatalogue, Catalogue, CatalogueError, ChatOrchestrator,
    ConversationEngine, GeminiClient, InMemoryGuestbook, RandomSelector, TomlCatalogueFile,
};
use folio_core::FolioConfig;

use crate::cli::{folio_home, CliArgs};

fn load_knowledge(path: Option<PathBuf>) -> Result<Catalogue, CatalogueError> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading catalogue file");
            load_catalogue(&TomlCatalogueFile::new(path))
        }
        None => load_catalogue(&BuiltinCatalogue),
    }
}

/// Interactive terminal over stdin/stdout, one session for the whole run.
async fn run_repl(chat: ChatOrchestrator) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut session_id = chat.start_session()?;
    for line in chat.opening_lines(session_id)? {
        stdout.write_all(format!("{line}\n").as_bytes()).await?;
    }

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let output = match chat.handle_message(&line, Some(session_id)).await {
            Ok((reply, sid)) => {
                session_id = sid;
                match reply.follow_up_prompt {
                    Some(prompt) => format!("{}\n{}\n", reply.text, prompt),
                    None => format!("{}\n", reply.text),
                }
            }
            Err(e) => format!("Error: {e}\n"),
        };
        stdout.write_all(output.as_bytes()).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = FolioConfig::load_or_default(&config_file);
    config.general.log_level = args.resolve_log_level(&config.general.log_level);
    config.server.port = args.resolve_port(config.server.port);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Folio v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");
    config.validate()?;

    // Catalogue.
    let catalogue_path = args.resolve_catalogue(config.chat.catalogue_path.as_deref());
    let catalogue = match load_knowledge(catalogue_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Knowledge catalogue rejected");
            return Err(e.into());
        }
    };

    // Engine and collaborators.
    let engine = ConversationEngine::new(Arc::new(catalogue), Arc::new(RandomSelector));
    let guestbook = Arc::new(InMemoryGuestbook::new(&config.guestbook));
    let mut chat = ChatOrchestrator::new(engine, guestbook, &config);

    if config.llm.enabled {
        match GeminiClient::from_config(&config.llm) {
            Ok(client) => {
                tracing::info!(model = %config.llm.model, "Language model fallback ready");
                chat = chat.with_language_model(Arc::new(client));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Language model unavailable; unmatched input gets the fallback message");
            }
        }
    }

    if args.repl {
        return run_repl(chat).await;
    }

    // === API server ===

    let token = load_or_generate_token(&folio_home().join("admin_token"));
    let state = AppState::new(config, chat, token);
    folio_api::start_server(state).await?;

    Ok(())
}

use std::io::Write;
use std::sync::Arc;

use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use scenechat::adapters::{JsonFileStore, SseProviderClient};
use scenechat::config::Config;
use scenechat::models::{library_by_id, Conversation, LIBRARIES};
use scenechat::orchestrator::{TurnOrchestrator, TurnUpdate};
use scenechat::traits::ConversationStore;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let store = Arc::new(JsonFileStore::new(&config.data_dir).await?);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("list") => list_conversations(store.as_ref()).await,
        Some("search") => {
            let query = args.get(1).map(String::as_str).unwrap_or("");
            search_conversations(store.as_ref(), query).await
        }
        Some("libraries") => {
            for lib in LIBRARIES {
                println!("{:<20} {}", lib.id, lib.display_name);
            }
            Ok(())
        }
        _ => chat(config, store).await,
    }
}

async fn list_conversations(store: &dyn ConversationStore) -> Result<()> {
    for conv in store.list().await? {
        println!(
            "{}  {}  ({} messages)",
            conv.updated_at.format("%Y-%m-%d %H:%M"),
            conv.title,
            conv.messages.len()
        );
    }
    Ok(())
}

async fn search_conversations(store: &dyn ConversationStore, query: &str) -> Result<()> {
    for conv in store.search(query).await? {
        println!("{}  {}", conv.updated_at.format("%Y-%m-%d %H:%M"), conv.title);
    }
    Ok(())
}

async fn chat(config: Config, store: Arc<JsonFileStore>) -> Result<()> {
    let library = library_by_id(&config.library_id).ok_or_else(|| {
        color_eyre::eyre::eyre!("unknown scene library: {}", config.library_id)
    })?;

    let provider = Arc::new(SseProviderClient::new(config.base_url.clone()));
    let mut orchestrator = TurnOrchestrator::new(provider, store, config.model.clone());
    if let Some(temperature) = config.temperature {
        orchestrator = orchestrator.with_temperature(temperature);
    }
    if let Some(top_p) = config.top_p {
        orchestrator = orchestrator.with_top_p(top_p);
    }
    let (orchestrator, mut updates) = orchestrator.with_update_channel();

    // Print deltas as they stream in.
    tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            match update {
                TurnUpdate::Delta { text, .. } => {
                    print!("{}", text);
                    let _ = std::io::stdout().flush();
                }
                TurnUpdate::Failed { message, .. } => {
                    eprintln!("\n{}", message);
                }
                TurnUpdate::Completed { .. } | TurnUpdate::Cancelled { .. } => {
                    println!();
                }
            }
        }
    });

    let mut conversation = Conversation::new().with_library(library.id);
    println!(
        "scenechat: {} scenes via {} (Ctrl-D to exit)",
        library.display_name, config.model
    );

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match orchestrator
            .submit_user_message(&mut conversation, &line, None)
            .await
        {
            Ok(outcome) => {
                if let Some(code) = outcome.extracted_code {
                    println!("--- extracted scene code ---");
                    println!("{}", code);
                    println!("----------------------------");
                }
            }
            Err(err) => eprintln!("{}", err.user_message()),
        }
    }

    Ok(())
}

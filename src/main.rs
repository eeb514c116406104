//! fieldsync - Debounced bilingual field translation
//!
//! Command-line front end: one-off translations against the endpoint and an
//! interactive session that binds the two name fields and types into them
//! from stdin.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use fieldsync::binder::{BinderState, FieldTranslationBinder};
use fieldsync::cli::{Args, Commands};
use fieldsync::config::Config;
use fieldsync::error::FieldSyncError;
use fieldsync::language::Language;
use fieldsync::page::{Field, InputField, Page};
use fieldsync::token::{HiddenInputToken, StaticToken, TokenProvider};
use fieldsync::translate::{HttpTranslator, Translator};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    // Load configuration
    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Translate { text, target_lang, csrf_token } => {
            let target_language = Language::from_code(&target_lang)?;
            let token: Arc<dyn TokenProvider> = match csrf_token {
                Some(token) => Arc::new(StaticToken::new(token)),
                None => Arc::new(|| None::<String>),
            };
            let translator = HttpTranslator::new(&config.translate, token)?;

            info!("Translating to {} via {}", target_language.name(), translator.url());
            match translator.translate(&text, target_language).await? {
                Some(translation) => println!("{}", translation),
                None => warn!("Endpoint returned no translated text"),
            }
        }
        Commands::Watch { csrf_token, delay_ms } => {
            if let Some(delay_ms) = delay_ms {
                config.debounce.delay_ms = delay_ms;
            }
            watch(config, csrf_token).await?;
        }
        Commands::InitConfig { output } => {
            Config::default().save_to_file(&output)?;
            println!("Wrote default configuration to {}", output.display());
        }
    }

    Ok(())
}

/// Interactive session: stdin lines stand in for typing into the fields
async fn watch(config: Config, csrf_token: Option<String>) -> Result<()> {
    let binding = &config.binding;
    let mut page = Page::new()
        .with_field(InputField::new(binding.first.id.clone()))
        .with_field(InputField::new(binding.second.id.clone()));
    if let Some(token) = csrf_token {
        page = page.with_hidden_input(config.translate.csrf_field.clone(), token);
    } else {
        warn!("No CSRF token given, translation requests will be refused locally");
    }
    let page = Arc::new(page);

    let token = HiddenInputToken::new(Arc::clone(&page), config.translate.csrf_field.clone());
    let translator = HttpTranslator::new(&config.translate, Arc::new(token))?;
    let mut binder = FieldTranslationBinder::new(&config, Arc::new(translator));
    if binder.bind_page(&page) != BinderState::Active {
        return Err(FieldSyncError::Config("Name fields could not be bound".to_string()).into());
    }

    println!(
        "Type '<field-id> <text>' ({} or {}), ':show' to print fields, Ctrl-D to finish",
        binding.first.id, binding.second.id
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end();
        if line.trim() == ":show" {
            print_fields(&page, &config);
            continue;
        }

        let (id, text) = line.split_once(' ').unwrap_or((line, ""));
        match page.element_by_id(id) {
            Some(field) => field.type_text(text),
            None => warn!("Unknown field '{}'", id),
        }
    }

    binder.settle(Duration::from_millis(50)).await;
    print_fields(&page, &config);
    Ok(())
}

fn print_fields(page: &Page, config: &Config) {
    for spec in [&config.binding.first, &config.binding.second] {
        let value = page
            .element_by_id(&spec.id)
            .map(|field| field.value())
            .unwrap_or_default();
        println!("{:<15} {:<8} {}", spec.id, spec.language.name(), value);
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".fieldsync").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "fieldsync.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("fieldsync.log").display());

    Ok(())
}

mod api;
mod gateway;
mod reply;

use clap::{Parser, Subcommand, ValueEnum};
use lantern_channels::telegram::TelegramConnector;
use lantern_core::{config, settings};
use lantern_memory::Store;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(
    name = "lantern",
    version,
    about = "Lantern — Telegram auto-reply bot with scheduled broadcasts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control panel API, the dispatcher, and (on request) the bot.
    Serve,
    /// Run only the bot with the stored token, no control panel.
    Run,
    /// Print settings and schedules.
    Status,
    /// Change stored settings.
    Setup {
        #[arg(long)]
        token: Option<String>,
        /// sweet, blunt or sassy.
        #[arg(long)]
        persona: Option<String>,
        #[arg(long)]
        bot_name: Option<String>,
        #[arg(long, value_enum)]
        auto_reply: Option<Toggle>,
    },
    /// Send a one-shot message.
    Send {
        /// Numeric chat id or @channel handle.
        chat_id: String,
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _guard = init_logging(&cfg);

    match cli.command {
        Commands::Serve => serve(cfg).await?,
        Commands::Run => run(cfg).await?,
        Commands::Status => status(cfg, &cli.config).await?,
        Commands::Setup {
            token,
            persona,
            bot_name,
            auto_reply,
        } => {
            let store = Store::new(&cfg.memory).await?;
            if let Some(token) = settings::token_from(token.as_deref()) {
                store.set_setting(settings::BOT_TOKEN, &token).await?;
                println!("bot_token saved");
            }
            if let Some(p) = persona {
                let persona = reply::Persona::from_setting(Some(&p));
                store.set_setting(settings::PERSONA, persona.as_str()).await?;
                println!("persona: {}", persona.as_str());
            }
            if let Some(name) = bot_name {
                let name = settings::bot_name_from(Some(&name));
                store.set_setting(settings::BOT_NAME, &name).await?;
                println!("bot_name: {name}");
            }
            if let Some(toggle) = auto_reply {
                let value = match toggle {
                    Toggle::On => "1",
                    Toggle::Off => "0",
                };
                store.set_setting(settings::AUTO_REPLY_ENABLED, value).await?;
                println!("auto_reply: {}", value == "1");
            }
        }
        Commands::Send { chat_id, text } => {
            let store = Store::new(&cfg.memory).await?;
            let session = build_session(&cfg, &store);
            session.reload_token(&store).await?;
            session.send(&chat_id, &text.join(" ")).await?;
            println!("sent to {chat_id}");
        }
    }

    Ok(())
}

/// Stderr plus a daily-rolling file under `{data_dir}/logs`.
///
/// The returned guard flushes the file writer on drop.
fn init_logging(cfg: &config::Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.app.log_level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = std::path::PathBuf::from(config::shellexpand(&cfg.app.data_dir)).join("logs");
    let (file_layer, guard) = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(&log_dir, "lantern.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(e) => {
            eprintln!("cannot create log dir {}: {e}", log_dir.display());
            (None, None)
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .ok();

    guard
}

fn build_session(cfg: &config::Config, store: &Store) -> Arc<gateway::BotSession> {
    let connector = Arc::new(TelegramConnector::new(cfg.telegram.clone()));
    Arc::new(gateway::BotSession::new(
        connector,
        store.clone(),
        &cfg.memory,
    ))
}

/// Control panel, dispatcher and session until Ctrl-C.
async fn serve(cfg: config::Config) -> anyhow::Result<()> {
    let store = Store::new(&cfg.memory).await?;
    let session = build_session(&cfg, &store);
    session.reload_token(&store).await?;

    let dispatcher = Arc::new(gateway::Dispatcher::new(
        store.clone(),
        Arc::clone(&session),
        &cfg.scheduler,
    ));
    dispatcher.rebuild().await?;

    let shutdown = CancellationToken::new();
    let state = api::ApiState::new(
        store.clone(),
        Arc::clone(&session),
        Arc::clone(&dispatcher),
        &cfg.api,
        cfg.memory.message_log_limit,
    );
    let api_cfg = cfg.api.clone();
    let api_shutdown = shutdown.clone();
    let server = tokio::spawn(async move { api::serve(&api_cfg, state, api_shutdown).await });

    info!("{} ready (db: {})", cfg.app.name, store.db_path());
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    shutdown.cancel();
    session.shutdown().await;
    dispatcher.shutdown().await;

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("API server error: {e}"),
        Err(e) => error!("API server task failed: {e}"),
    }
    store.close().await;
    Ok(())
}

/// Headless bot runner.
async fn run(cfg: config::Config) -> anyhow::Result<()> {
    let store = Store::new(&cfg.memory).await?;
    let stored = store.get_setting(settings::BOT_TOKEN).await?;
    let Some(token) = settings::token_from(stored.as_deref()) else {
        anyhow::bail!(
            "no bot_token stored; set it via the control panel or `lantern setup --token <TOKEN>`"
        );
    };

    let session = build_session(&cfg, &store);
    session.configure(&token);
    session.start()?;
    info!("bot running, Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    session.shutdown().await;
    Ok(())
}

async fn status(cfg: config::Config, config_path: &str) -> anyhow::Result<()> {
    let store = Store::new(&cfg.memory).await?;

    let token = store.get_setting(settings::BOT_TOKEN).await?;
    let persona = store.get_setting(settings::PERSONA).await?;
    let bot_name = store.get_setting(settings::BOT_NAME).await?;
    let auto_reply = store.get_setting(settings::AUTO_REPLY_ENABLED).await?;

    println!("Lantern — Status\n");
    println!("Config:     {config_path}");
    println!("Database:   {}", store.db_path());
    println!(
        "Token:      {}",
        if settings::token_from(token.as_deref()).is_some() {
            "set"
        } else {
            "missing"
        }
    );
    println!(
        "Persona:    {}",
        reply::Persona::from_setting(persona.as_deref()).as_str()
    );
    println!("Bot name:   {}", settings::bot_name_from(bot_name.as_deref()));
    println!(
        "Auto-reply: {}",
        if settings::auto_reply_from(auto_reply.as_deref()) {
            "on"
        } else {
            "off"
        }
    );

    let schedules = store.list_schedules().await?;
    println!("\nSchedules ({}):", schedules.len());
    for s in schedules {
        let mark = if !s.enabled {
            "off"
        } else if gateway::parse_cron(&s.cron).is_some() {
            "on"
        } else {
            "invalid"
        };
        println!(
            "  [{}] {:<7} {:<16} {} -> {}: {}",
            s.id, mark, s.cron, s.name, s.chat_id, s.text
        );
    }
    Ok(())
}

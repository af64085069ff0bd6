use std::sync::Arc;

use tracing::{error, info, warn};

use newsdigest::bot::{start_poller, BotHandler, UpdatePoller};
use newsdigest::news::{NewsCollector, RssFetcher};
use newsdigest::scheduler::{start_scheduler, DeliveryScheduler};
use newsdigest::transport::TelegramClient;
use newsdigest::web::{AppState, WebServer};
use newsdigest::{summarizer, Config, Database, DigestService};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = newsdigest::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        newsdigest::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> newsdigest::Result<()> {
    info!("newsdigest starting");

    let db = Arc::new(Database::open(&config.database.path).await?);
    info!("Database ready at {}", config.database.path);

    let fetcher = Arc::new(RssFetcher::new(&config.news)?);
    let collector = Arc::new(NewsCollector::new(fetcher, &config.news));
    let (digest_summarizer, agent) = summarizer::from_config(&config.llm, &config.digest);

    let mut tasks = Vec::new();

    if config.telegram.is_configured() {
        let telegram = Arc::new(TelegramClient::new(&config.telegram)?);
        let digests = Arc::new(DigestService::new(
            db.clone(),
            collector.clone(),
            digest_summarizer,
            telegram.clone(),
            &config,
        ));

        let handler = Arc::new(BotHandler::new(
            db.clone(),
            digests.clone(),
            agent.clone(),
            telegram.clone(),
            &config,
        ));
        tasks.push(start_poller(UpdatePoller::new(telegram, handler)));

        if config.scheduler.enabled {
            let scheduler =
                DeliveryScheduler::with_interval(db.clone(), digests, config.scheduler.tick_interval_secs);
            tasks.push(start_scheduler(scheduler));
        } else {
            info!("Scheduled delivery disabled");
        }
    } else {
        warn!("telegram.token is not set; the chat bot and scheduled delivery are disabled");
    }

    if config.web.enabled {
        let state = AppState::new(collector, agent).with_per_feed_limit(config.news.per_feed_limit);
        let server = WebServer::new(&config.web, state)?;
        tasks.push(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Web server stopped: {}", e);
            }
        }));
    }

    if tasks.is_empty() {
        warn!("Nothing to run: configure telegram.token or enable [web]");
        return Ok(());
    }

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
        _ = first_exit(tasks) => warn!("A service task exited"),
    }
    Ok(())
}

/// Resolve when the first task finishes.
async fn first_exit(tasks: Vec<tokio::task::JoinHandle<()>>) {
    let mut set = tokio::task::JoinSet::new();
    for task in tasks {
        set.spawn(async move {
            let _ = task.await;
        });
    }
    set.join_next().await;
}

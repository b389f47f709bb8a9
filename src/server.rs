use {
    crate::{
        announcer::telegram::TelegramAnnouncer,
        auction::{
            repository::Repository,
            service::{
                self,
                workers::run_reconciliation_loop,
                Service,
            },
        },
        config::{
            Config,
            RunOptions,
        },
    },
    anyhow::anyhow,
    sqlx::postgres::PgPoolOptions,
    std::{
        sync::{
            atomic::{
                AtomicBool,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
};

pub async fn start_server(run_options: RunOptions) -> anyhow::Result<()> {
    tokio::spawn(async move {
        tracing::info!("Registered shutdown signal handler...");
        tokio::signal::ctrl_c().await.unwrap();
        tracing::info!("Shut down signal received, waiting for tasks...");
        SHOULD_EXIT.store(true, Ordering::Release);
    });

    let config = Config::load(&run_options.config.config).map_err(|err| {
        anyhow!(
            "Failed to load config from file({path}): {:?}",
            err,
            path = run_options.config.config
        )
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&run_options.database_url)
        .await
        .map_err(|err| anyhow!("Failed to connect to database: {:?}", err))?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let announcer = TelegramAnnouncer::new(
        &run_options.telegram_bot_token,
        config.channel_id,
        config.request_timeout,
        config.retry,
    )?;

    let service = Service::new(
        service::Config {
            bid_timeout:        config.bid_timeout,
            refresh_interval:   config.refresh_interval,
            integrity_interval: config.integrity_interval,
            store_retry:        config.retry,
        },
        Repository::new(pool),
        Arc::new(announcer),
    );

    // Timers must be back before anything can accept bids or close
    // auctions, so deadlines persisted by a previous run keep counting.
    service.restore_timers().await?;

    let reconciliation_loop = tokio::spawn(run_reconciliation_loop(service.clone()));
    while !SHOULD_EXIT.load(Ordering::Acquire) {
        tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
    }

    service.stop_timers().await;
    service.drain().await;
    reconciliation_loop.await?;
    Ok(())
}

// A static exit flag to indicate to running threads that we're shutting down. This is used to
// gracefully shutdown the application.
//
// NOTE: A more idiomatic approach would be to use a tokio::sync::broadcast channel, and to send a
// shutdown signal to all running tasks. However, this is a bit more complicated to implement and
// we don't rely on global state for anything else.
pub(crate) static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);
pub const EXIT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

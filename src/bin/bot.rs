use anyhow::Result;
use dotenvy::dotenv;
use log::info;
use serenity::async_trait;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tempus::core::{Config, SystemClock};
use tempus::database::SqliteTimerStore;
use tempus::features::timers::{DiscordTransport, DueTimerScheduler};

struct Handler {
    store: Arc<SqliteTimerStore>,
    poll_interval: std::time::Duration,
    scheduler_started: AtomicBool,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Logged in as {}", ready.user.tag());

        // Ready fires again on gateway reconnects; only the first one may
        // start the scheduler
        if self.scheduler_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let transport = Arc::new(DiscordTransport::new(ctx.http.clone()));
        let scheduler = DueTimerScheduler::new(
            self.store.clone(),
            transport,
            Arc::new(SystemClock),
            self.poll_interval,
        );
        scheduler.start();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let store = Arc::new(SqliteTimerStore::open(&config.database_url)?);
    info!("timer store opened at {}", config.database_url);

    let handler = Handler {
        store,
        poll_interval: config.poll_interval,
        scheduler_started: AtomicBool::new(false),
    };

    let mut client = Client::builder(&config.discord_token, GatewayIntents::GUILDS)
        .event_handler(handler)
        .await?;

    client.start().await?;
    Ok(())
}

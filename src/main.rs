mod appsettings;

use std::{sync::Arc, time::Duration};

use anyhow::Context;

use ticklr_models::clock::{Clock, SystemClock};
use ticklr_scheduler::{
    AccessGate, DeliveryLoop, DeliveryStats, ReminderService, RetryPolicy, StoredReminderSweep,
};
use ticklr_storage::sqlite::{self, reminder_storage::SqliteReminderStorage};
use ticklr_telegram::{
    AdminUser, TelegramDeliveryChannel, TelegramInteractionInterface, teloxide::Bot,
};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    pretty_env_logger::init();
    if let Ok(path) = dotenv {
        log::info!("Loaded environment from {}", path.display());
    }

    let settings = appsettings::load().context("Could not load settings")?;
    anyhow::ensure!(
        !settings.telegram.token.is_empty(),
        "telegram.token is not configured"
    );
    let offset = settings
        .scheduler
        .utc_offset()
        .context("scheduler.utc_offset_minutes is out of range")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(offset));
    log::info!("Reminder times use UTC{}", clock.offset());

    let pool = sqlite::connect(&settings.database.url).await?;
    sqlite::migrate(&pool)
        .await
        .context("Could not apply database migrations")?;
    let storage = Arc::new(SqliteReminderStorage::new(pool, settings.database.policy));
    log::info!("Reminder policy: {:?}", storage.policy());

    let bot = Bot::new(&settings.telegram.token);
    let stats = Arc::new(DeliveryStats::new(clock.now()));
    let retry = RetryPolicy::new(
        settings.scheduler.retry_attempts,
        settings.scheduler.retry_delay(),
    );

    let sweep = StoredReminderSweep::new(
        storage.clone(),
        Arc::new(TelegramDeliveryChannel::new(bot.clone())),
        clock.clone(),
        stats.clone(),
    )
    .with_retry(retry)
    .with_retention_days(settings.scheduler.retention_days);

    let delivery_loop = DeliveryLoop::new(
        Arc::new(sweep),
        settings.scheduler.sweep_interval(),
        stats.clone(),
    )
    .spawn();

    let gate = AccessGate::new(settings.access.allowed_users.iter().copied());
    let requests = Arc::new(ReminderService::new(storage, clock, gate));

    TelegramInteractionInterface::start(
        bot,
        requests,
        stats,
        AdminUser(settings.access.admin_user_id),
    )
    .await;

    log::info!("Telegram dispatcher stopped, shutting down");
    if !delivery_loop.shutdown(SHUTDOWN_TIMEOUT).await {
        log::warn!("Delivery loop was aborted during shutdown");
    }

    Ok(())
}

//! Periodic batch jobs and the scheduler that drives them.
//!
//! Each job has a `run_*` entry point that performs exactly one pass and can
//! be called directly from tests; [`spawn_scheduler`] only adds timing.

use crate::error::Result;
use crate::service::SolmateService;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use rand::Rng;
use solmate_core::chain::ActivityProvider;
use solmate_core::config::JobsConfig;
use solmate_core::hygiene::roll_waste;
use solmate_io::StoreError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WasteReport {
    pub checked: usize,
    pub marked: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityReport {
    pub checked: usize,
    pub rewarded: usize,
    pub xp_granted: u64,
    pub failed: usize,
}

/// One waste roll over every creature that is currently clean.
pub fn run_waste_roll<R: Rng + ?Sized>(
    service: &SolmateService,
    probability: f64,
    rng: &mut R,
) -> Result<WasteReport> {
    let store = service.store();
    let mut report = WasteReport::default();

    for pubkey in store.clean_pubkeys()? {
        report.checked += 1;
        if !roll_waste(probability, rng) {
            continue;
        }
        match store.mark_waste(&pubkey) {
            Ok(true) => {
                report.marked += 1;
                tracing::debug!(pubkey = %pubkey, "Solmate made a mess");
            }
            Ok(false) => {}
            Err(e) => {
                report.failed += 1;
                tracing::warn!(pubkey = %pubkey, error = %e, "Failed to mark waste");
            }
        }
    }

    tracing::info!(
        checked = report.checked,
        marked = report.marked,
        failed = report.failed,
        "Waste roll complete"
    );
    Ok(report)
}

/// The UTC calendar day that ended most recently before `now`, as a
/// half-open `[start, end)` window.
#[must_use]
pub fn previous_utc_day(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let end = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN));
    (end - Duration::days(1), end)
}

/// Checkpoint key of the activity XP job.
pub const ACTIVITY_JOB: &str = "activity_xp";

/// Window still owed to wallets at `now`: from the last checkpoint (or the
/// start of the previous UTC day when there is none) up to the most recent
/// UTC midnight. `None` once that midnight is already covered.
#[must_use]
pub fn activity_window(
    now: DateTime<Utc>,
    checkpoint: Option<DateTime<Utc>>,
) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let (day_start, end) = previous_utc_day(now);
    let start = checkpoint.unwrap_or(day_start);
    (start < end).then_some((start, end))
}

/// Grants XP for each creature owner's on-chain transactions in the window
/// not yet paid out, then advances the checkpoint. Passes that find the
/// window already covered do nothing. Failures for one wallet do not stop
/// the pass.
pub async fn run_activity_xp(
    service: Arc<SolmateService>,
    provider: &dyn ActivityProvider,
    xp_per_tx: u64,
) -> Result<ActivityReport> {
    let (checkpoint, pubkeys) = {
        let service = Arc::clone(&service);
        tokio::task::spawn_blocking(move || {
            let store = service.store();
            Ok::<_, StoreError>((store.job_checkpoint(ACTIVITY_JOB)?, store.pubkeys()?))
        })
        .await??
    };
    let Some((start, end)) = activity_window(service.now(), checkpoint) else {
        tracing::debug!("Activity XP already paid through the last UTC midnight");
        return Ok(ActivityReport::default());
    };

    let mut report = ActivityReport::default();
    for pubkey in pubkeys {
        report.checked += 1;
        let count = match provider.transaction_count(&pubkey, start, end).await {
            Ok(count) => count,
            Err(e) => {
                report.failed += 1;
                tracing::warn!(pubkey = %pubkey, error = %e, "Failed to fetch wallet activity");
                continue;
            }
        };
        let amount = u64::from(count).saturating_mul(xp_per_tx);
        if amount == 0 {
            continue;
        }

        let svc = Arc::clone(&service);
        let key = pubkey.clone();
        match tokio::task::spawn_blocking(move || svc.grant_xp(&key, amount)).await? {
            Ok(Some(_)) => {
                report.rewarded += 1;
                report.xp_granted += amount;
                tracing::debug!(pubkey = %pubkey, transactions = count, xp = amount, "Activity XP granted");
            }
            Ok(None) => {}
            Err(e) => {
                report.failed += 1;
                tracing::warn!(pubkey = %pubkey, error = %e, "Failed to grant activity XP");
            }
        }
    }

    {
        let service = Arc::clone(&service);
        tokio::task::spawn_blocking(move || service.store().set_job_checkpoint(ACTIVITY_JOB, end))
            .await??;
    }

    tracing::info!(
        window_start = %start,
        window_end = %end,
        checked = report.checked,
        rewarded = report.rewarded,
        xp = report.xp_granted,
        failed = report.failed,
        "Activity XP pass complete"
    );
    Ok(report)
}

/// Time from `now` until the next UTC midnight.
#[must_use]
pub fn until_next_utc_midnight(now: DateTime<Utc>) -> std::time::Duration {
    let (_, today) = previous_utc_day(now);
    (today + Duration::days(1) - now)
        .to_std()
        .unwrap_or_default()
}

/// Starts the background jobs. The activity job only runs when a provider
/// is given; its first pass is aligned to the next UTC midnight and the
/// checkpoint keeps any interval from paying a window twice.
pub fn spawn_scheduler(
    service: Arc<SolmateService>,
    config: JobsConfig,
    provider: Option<Arc<dyn ActivityProvider>>,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::new();

    let waste_service = Arc::clone(&service);
    let probability = config.waste_probability;
    let period = std::time::Duration::from_secs(config.waste_interval_secs);
    handles.push(tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let svc = Arc::clone(&waste_service);
            let pass = tokio::task::spawn_blocking(move || {
                run_waste_roll(&svc, probability, &mut rand::thread_rng())
            })
            .await;
            match pass {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "Waste roll failed"),
                Err(e) => tracing::error!(error = %e, "Waste roll task panicked"),
            }
        }
    }));

    match provider {
        Some(provider) => {
            let xp_per_tx = config.xp_per_onchain_tx;
            let period = std::time::Duration::from_secs(config.xp_interval_secs);
            let delay = until_next_utc_midnight(service.now());
            handles.push(tokio::spawn(async move {
                let mut interval = time::interval_at(time::Instant::now() + delay, period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    if let Err(e) =
                        run_activity_xp(Arc::clone(&service), provider.as_ref(), xp_per_tx).await
                    {
                        tracing::error!(error = %e, "Activity XP pass failed");
                    }
                }
            }));
        }
        None => tracing::info!("No RPC endpoint configured, activity XP job disabled"),
    }

    handles
}

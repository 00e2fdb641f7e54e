mod common;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::FixtureBuilder;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use solmate_core::chain::ActivityProvider;
use solmate_io::CreatureStore;
use solmate_lib::jobs::{run_activity_xp, run_waste_roll};
use std::collections::HashMap;
use std::sync::Mutex;

/// Wallet activity keyed by pubkey; `None` simulates an RPC failure.
struct ScriptedActivity {
    counts: HashMap<String, Option<u32>>,
    windows: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl ScriptedActivity {
    fn new(entries: &[(&str, Option<u32>)]) -> Self {
        Self {
            counts: entries
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            windows: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ActivityProvider for ScriptedActivity {
    async fn transaction_count(
        &self,
        pubkey: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<u32> {
        self.windows.lock().unwrap().push((start, end));
        match self.counts.get(pubkey) {
            Some(Some(n)) => Ok(*n),
            Some(None) => Err(anyhow::anyhow!("RPC node returned error: 503")),
            None => Ok(0),
        }
    }
}

#[test]
fn test_certain_waste_marks_every_clean_creature() {
    let fx = FixtureBuilder::new()
        .with_creature("a", "Alex")
        .with_creature("b", "Blake")
        .with_creature_where("c", "Casey", |c| c.has_waste = true)
        .build();

    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let report = run_waste_roll(&fx.service, 1.0, &mut rng).unwrap();
    assert_eq!(report.checked, 2);
    assert_eq!(report.marked, 2);
    assert!(fx.store.clean_pubkeys().unwrap().is_empty());
}

#[test]
fn test_zero_probability_never_marks() {
    let fx = FixtureBuilder::new().with_creature("a", "Alex").build();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for _ in 0..10 {
        run_waste_roll(&fx.service, 0.0, &mut rng).unwrap();
    }
    assert!(!fx.creature("a").has_waste);
}

#[test]
fn test_waste_roll_does_not_touch_updated_at() {
    let fx = FixtureBuilder::new().with_creature("a", "Alex").build();
    let before = fx.creature("a").updated_at;
    fx.clock.advance(Duration::hours(1));
    run_waste_roll(&fx.service, 1.0, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
    let after = fx.creature("a");
    assert!(after.has_waste);
    assert_eq!(after.updated_at, before);
}

#[test]
fn test_seeded_rolls_are_reproducible() {
    let build = || {
        let mut builder = FixtureBuilder::new();
        for i in 0..50 {
            builder = builder.with_creature(&format!("pk{i}"), "Kai");
        }
        builder.build()
    };
    let (fx1, fx2) = (build(), build());
    let r1 = run_waste_roll(&fx1.service, 0.2, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();
    let r2 = run_waste_roll(&fx2.service, 0.2, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();
    assert_eq!(r1, r2);
    assert!(r1.marked > 0 && r1.marked < 50);
}

#[tokio::test]
async fn test_activity_xp_for_previous_day() {
    let now = Utc.with_ymd_and_hms(2025, 6, 2, 0, 1, 0).unwrap();
    let fx = FixtureBuilder::new()
        .at(now)
        .with_creature("busy", "Busy")
        .with_creature("idle", "Idle")
        .with_creature("broken", "Broken")
        .build();
    let provider = ScriptedActivity::new(&[("busy", Some(30)), ("broken", None)]);

    let report = run_activity_xp(fx.service.clone(), &provider, 5).await.unwrap();
    assert_eq!(report.checked, 3);
    assert_eq!(report.rewarded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.xp_granted, 150);

    let busy = fx.creature("busy");
    assert_eq!(busy.xp, 150);
    assert_eq!(busy.level, 2);
    assert_eq!(fx.creature("idle").xp, 0);

    let windows = provider.windows.lock().unwrap();
    let expected = (
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
    );
    assert!(windows.iter().all(|w| *w == expected));
}

#[tokio::test]
async fn test_repeated_passes_pay_each_day_once() {
    let now = Utc.with_ymd_and_hms(2025, 6, 2, 1, 0, 0).unwrap();
    let fx = FixtureBuilder::new()
        .at(now)
        .with_creature("busy", "Busy")
        .build();
    let provider = ScriptedActivity::new(&[("busy", Some(2))]);

    for _ in 0..3 {
        run_activity_xp(fx.service.clone(), &provider, 5).await.unwrap();
        fx.clock.advance(Duration::hours(1));
    }
    assert_eq!(fx.creature("busy").xp, 10);
    assert_eq!(provider.windows.lock().unwrap().len(), 1);

    // The next UTC day is owed once midnight passes.
    fx.clock.set(Utc.with_ymd_and_hms(2025, 6, 3, 0, 30, 0).unwrap());
    let report = run_activity_xp(fx.service.clone(), &provider, 5).await.unwrap();
    assert_eq!(report.xp_granted, 10);
    assert_eq!(fx.creature("busy").xp, 20);
}

#[tokio::test]
async fn test_late_pass_covers_every_missed_day() {
    let fx = FixtureBuilder::new()
        .at(Utc.with_ymd_and_hms(2025, 6, 2, 0, 5, 0).unwrap())
        .with_creature("busy", "Busy")
        .build();
    let provider = ScriptedActivity::new(&[("busy", Some(1))]);
    run_activity_xp(fx.service.clone(), &provider, 5).await.unwrap();

    fx.clock.set(Utc.with_ymd_and_hms(2025, 6, 5, 0, 5, 0).unwrap());
    run_activity_xp(fx.service.clone(), &provider, 5).await.unwrap();

    let windows = provider.windows.lock().unwrap();
    assert_eq!(
        windows.last().copied(),
        Some((
            Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 5, 0, 0, 0).unwrap(),
        ))
    );
}

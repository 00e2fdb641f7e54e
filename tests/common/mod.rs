#[macro_use]
pub mod macros;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use solmate_core::chain::{PaymentVerifier, TrustingVerifier};
use solmate_core::{Clock, FixedClock};
use solmate_data::{AssetKind, Creature, ManifestEntry, UnlockRequirement};
use solmate_io::{AssetCatalog, CreatureStore, SqliteStore};
use solmate_lib::{router, AppState, SolmateService};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

type CreatureMod = Box<dyn FnOnce(&mut Creature)>;

#[allow(dead_code)]
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

#[allow(dead_code)]
pub struct Fixture {
    pub service: Arc<SolmateService>,
    pub store: Arc<SqliteStore>,
    pub clock: Arc<FixedClock>,
    pub verifier: Arc<dyn PaymentVerifier>,
    pub assets: TempDir,
}

#[allow(dead_code)]
impl Fixture {
    pub fn router(&self) -> Router {
        router(Arc::new(AppState {
            service: Arc::clone(&self.service),
            verifier: Arc::clone(&self.verifier),
        }))
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn creature(&self, pubkey: &str) -> Creature {
        self.store
            .get_creature(pubkey)
            .unwrap()
            .unwrap_or_else(|| panic!("no creature {pubkey}"))
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

#[allow(dead_code)]
pub struct FixtureBuilder {
    now: DateTime<Utc>,
    creatures: Vec<(Creature, Option<CreatureMod>)>,
    manifests: Vec<(AssetKind, Vec<ManifestEntry>)>,
    unlocks: Vec<(String, String, String)>,
    verifier: Arc<dyn PaymentVerifier>,
}

#[allow(dead_code)]
impl FixtureBuilder {
    pub fn new() -> Self {
        Self {
            now: epoch(),
            creatures: Vec::new(),
            manifests: Vec::new(),
            unlocks: Vec::new(),
            verifier: Arc::new(TrustingVerifier),
        }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// A creature registered at the fixture's current time.
    pub fn with_creature(mut self, pubkey: &str, name: &str) -> Self {
        let creature = Creature::new(pubkey, name, "dragon", self.now);
        self.creatures.push((creature, None));
        self
    }

    pub fn with_creature_where<F>(mut self, pubkey: &str, name: &str, modifier: F) -> Self
    where
        F: FnOnce(&mut Creature) + 'static,
    {
        let creature = Creature::new(pubkey, name, "dragon", self.now);
        self.creatures.push((creature, Some(Box::new(modifier))));
        self
    }

    pub fn with_manifest(mut self, kind: AssetKind, entries: Vec<ManifestEntry>) -> Self {
        self.manifests.push((kind, entries));
        self
    }

    pub fn with_purchase(mut self, pubkey: &str, asset_id: &str, signature: &str) -> Self {
        self.unlocks
            .push((pubkey.to_string(), asset_id.to_string(), signature.to_string()));
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn PaymentVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn build(self) -> Fixture {
        let assets = tempfile::tempdir().unwrap();
        for (kind, entries) in &self.manifests {
            let dir = assets.path().join(kind.dir_name());
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(
                dir.join("manifest.json"),
                serde_json::to_string_pretty(entries).unwrap(),
            )
            .unwrap();
        }

        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        for (mut creature, modifier) in self.creatures {
            if let Some(modifier) = modifier {
                modifier(&mut creature);
            }
            store.insert_creature(&creature).unwrap();
        }
        for (pubkey, asset_id, signature) in self.unlocks {
            store
                .record_purchase(&solmate_io::PurchaseRecord {
                    signature,
                    pubkey,
                    asset_id,
                    at: self.now,
                })
                .unwrap();
        }

        let clock = Arc::new(FixedClock::new(self.now));
        let service = Arc::new(SolmateService::new(
            store.clone(),
            clock.clone(),
            AssetCatalog::new(assets.path()),
        ));
        Fixture {
            service,
            store,
            clock,
            verifier: self.verifier,
            assets,
        }
    }
}

#[allow(dead_code)]
pub fn entry(name: &str, filename: &str, unlock: UnlockRequirement) -> ManifestEntry {
    ManifestEntry {
        name: name.to_string(),
        filename: filename.to_string(),
        unlock,
    }
}

/// Decorations: a free rock, a level-5 tree and a paid lamp.
#[allow(dead_code)]
pub fn decoration_manifest() -> Vec<ManifestEntry> {
    vec![
        entry("rock", "top_left_rock.png", UnlockRequirement::Free),
        entry("tree", "middle_center_tree.png", UnlockRequirement::Level { level: 5 }),
        entry("lamp", "bottom_right_lamp.png", UnlockRequirement::Paid { amount: 0.1 }),
    ]
}

/// Backgrounds: a free meadow and a paid gold sky.
#[allow(dead_code)]
pub fn background_manifest() -> Vec<ManifestEntry> {
    vec![
        entry("meadow", "meadow.png", UnlockRequirement::Free),
        entry("gold", "gold.png", UnlockRequirement::Paid { amount: 0.5 }),
    ]
}

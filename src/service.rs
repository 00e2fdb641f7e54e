//! Request-level operations on creatures.
//!
//! Every mutation is a single read-compute-write through
//! [`CreatureStore::update_creature`], with the engine functions from
//! `solmate_core` doing the compute step against one `now` from the clock.

use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solmate_core::chain::PaymentClaim;
use solmate_core::decay::DerivedStats;
use solmate_core::leveling::{self, LevelProgress, XpGrant};
use solmate_core::{boost, hygiene, Clock, Entitlements};
use solmate_data::{
    AssetKind, Creature, DecorationPlacement, LeaderboardEntry, LeaderboardMetric,
    UnlockRequirement,
};
use solmate_io::{decoration_slot, AssetCatalog, CreatureStore, PurchaseRecord, GRID_SIZE};
use std::sync::Arc;

pub const LEADERBOARD_SIZE: usize = 20;
pub const MAX_NAME_LEN: usize = 20;
pub const MAX_ANIMAL_LEN: usize = 50;

/// Creature as returned by the API: stored fields plus derived stats,
/// decorations and level progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolmateView {
    pub pubkey: String,
    pub name: String,
    pub animal: String,
    pub level: u32,
    pub xp: u64,
    pub high_score: u64,
    pub health: u8,
    pub happiness: u8,
    pub is_alive: bool,
    pub has_waste: bool,
    pub selected_background: Option<String>,
    pub decorations: Vec<DecorationPlacement>,
    #[serde(flatten)]
    pub progress: LevelProgress,
    pub last_fed_at: DateTime<Utc>,
    pub last_pet_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub times_cleaned: u64,
    pub times_petted: u64,
    pub times_fed: u64,
}

impl SolmateView {
    #[must_use]
    pub fn build(creature: Creature, decorations: Vec<DecorationPlacement>, now: DateTime<Utc>) -> Self {
        let stats = DerivedStats::of(&creature, now);
        let (health, happiness) = stats.rounded();
        Self {
            progress: LevelProgress::of(creature.level, creature.xp),
            is_alive: stats.is_alive(),
            health,
            happiness,
            decorations,
            pubkey: creature.pubkey,
            name: creature.name,
            animal: creature.animal,
            level: creature.level,
            xp: creature.xp,
            high_score: creature.high_score,
            has_waste: creature.has_waste,
            selected_background: creature.selected_background,
            last_fed_at: creature.last_fed_at,
            last_pet_at: creature.last_pet_at,
            created_at: creature.created_at,
            updated_at: creature.updated_at,
            times_cleaned: creature.times_cleaned,
            times_petted: creature.times_petted,
            times_fed: creature.times_fed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub solmate: SolmateView,
    pub xp_gained: u64,
    pub new_high_score: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardView {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub user_rank: Option<LeaderboardEntry>,
}

/// A manifest entry annotated for one requester.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub name: String,
    pub asset_id: String,
    pub url: String,
    pub unlock: UnlockRequirement,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col: Option<u8>,
}

/// One cell of a submitted decoration grid.
#[derive(Debug, Clone, Deserialize)]
pub struct DecorationItem {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    #[serde(default)]
    pub transaction_signature: String,
    #[serde(default)]
    pub asset_id: String,
    #[serde(default)]
    pub user_pubkey: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOutcome {
    pub message: String,
    pub asset_id: String,
    pub newly_unlocked: bool,
}

fn require<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value)
}

fn creature_not_found() -> AppError {
    AppError::not_found("Solmate not found")
}

pub struct SolmateService {
    store: Arc<dyn CreatureStore>,
    clock: Arc<dyn Clock>,
    assets: AssetCatalog,
}

impl SolmateService {
    pub fn new(store: Arc<dyn CreatureStore>, clock: Arc<dyn Clock>, assets: AssetCatalog) -> Self {
        Self {
            store,
            clock,
            assets,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn CreatureStore> {
        &self.store
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn view(&self, creature: Creature, now: DateTime<Utc>) -> Result<SolmateView> {
        let decorations = self.store.decorations(&creature.pubkey)?;
        Ok(SolmateView::build(creature, decorations, now))
    }

    /// Runs `action` against the stored creature inside one store
    /// transaction. `action` returns whether anything changed.
    fn mutate<F>(&self, pubkey: &str, mut action: F) -> Result<(Creature, DateTime<Utc>)>
    where
        F: FnMut(&mut Creature, DateTime<Utc>) -> bool,
    {
        let pubkey = require(pubkey, "pubkey")?;
        let now = self.clock.now();
        let creature = self
            .store
            .update_creature(pubkey, &mut |c| action(c, now))?
            .ok_or_else(creature_not_found)?;
        Ok((creature, now))
    }

    fn entitlements(&self, creature: &Creature) -> Result<Entitlements> {
        let purchased = self
            .store
            .unlocked_assets(&creature.pubkey)?
            .into_iter()
            .map(|a| a.asset_id);
        Ok(Entitlements::new(creature.level, purchased))
    }

    pub fn get(&self, pubkey: &str) -> Result<Option<SolmateView>> {
        let pubkey = require(pubkey, "pubkey")?;
        let now = self.clock.now();
        match self.store.get_creature(pubkey)? {
            Some(creature) => Ok(Some(self.view(creature, now)?)),
            None => Ok(None),
        }
    }

    pub fn create(&self, pubkey: &str, name: &str, animal: &str) -> Result<SolmateView> {
        let pubkey = require(pubkey, "pubkey")?;
        let name = require(name, "name")?;
        let animal = require(animal, "animal")?;
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::validation(format!(
                "name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        if animal.chars().count() > MAX_ANIMAL_LEN {
            return Err(AppError::validation(format!(
                "animal must be at most {MAX_ANIMAL_LEN} characters"
            )));
        }

        let now = self.clock.now();
        let creature = Creature::new(pubkey, name, animal, now);
        self.store.insert_creature(&creature).map_err(|e| {
            if e.is_conflict() {
                AppError::conflict("Solmate already exists for this pubkey")
            } else {
                e.into()
            }
        })?;
        tracing::info!(pubkey = %pubkey, name = %name, animal = %animal, "Solmate created");
        Ok(SolmateView::build(creature, Vec::new(), now))
    }

    pub fn feed(&self, pubkey: &str) -> Result<SolmateView> {
        let (creature, now) = self.mutate(pubkey, |c, now| {
            boost::feed(c, now);
            true
        })?;
        self.view(creature, now)
    }

    pub fn pet(&self, pubkey: &str) -> Result<SolmateView> {
        let (creature, now) = self.mutate(pubkey, |c, now| {
            boost::pet(c, now);
            true
        })?;
        self.view(creature, now)
    }

    /// Clears waste. A creature without waste is returned unchanged.
    pub fn clean(&self, pubkey: &str) -> Result<SolmateView> {
        let (creature, now) = self.mutate(pubkey, |c, now| hygiene::clean(c, now).is_some())?;
        self.view(creature, now)
    }

    /// Records a finished run: XP for the score and a possible new high score.
    pub fn run(&self, pubkey: &str, score: i64) -> Result<RunOutcome> {
        if score < 0 {
            return Err(AppError::validation("score must be a non-negative integer"));
        }
        let score = score as u64;
        let xp = leveling::run_score_xp(score);
        let mut new_high_score = false;

        let (creature, now) = self.mutate(pubkey, |c, now| {
            new_high_score = score > c.high_score;
            if !new_high_score && xp == 0 {
                return false;
            }
            if new_high_score {
                c.high_score = score;
            }
            leveling::grant_xp(c, xp);
            c.updated_at = now;
            true
        })?;

        Ok(RunOutcome {
            solmate: self.view(creature, now)?,
            xp_gained: xp,
            new_high_score,
        })
    }

    /// Adds XP outside of a player action. Returns `None` if the creature no
    /// longer exists.
    pub fn grant_xp(&self, pubkey: &str, amount: u64) -> Result<Option<XpGrant>> {
        let now = self.clock.now();
        let mut grant = None;
        let found = self.store.update_creature(pubkey, &mut |c| {
            if amount == 0 {
                return false;
            }
            grant = Some(leveling::grant_xp(c, amount));
            c.updated_at = now;
            true
        })?;
        Ok(found.and(grant))
    }

    /// Validates and stores a full decoration grid. Nothing is written unless
    /// every placed item is known, consistent with the manifest and unlocked.
    pub fn save_decorations(
        &self,
        pubkey: &str,
        grid: &[Vec<Option<DecorationItem>>],
    ) -> Result<SolmateView> {
        let pubkey = require(pubkey, "pubkey")?;
        if grid.len() > usize::from(GRID_SIZE) || grid.iter().any(|r| r.len() > usize::from(GRID_SIZE)) {
            return Err(AppError::validation(format!(
                "decorations must fit a {GRID_SIZE}x{GRID_SIZE} grid"
            )));
        }

        let creature = self
            .store
            .get_creature(pubkey)?
            .ok_or_else(creature_not_found)?;
        let entitlements = self.entitlements(&creature)?;
        let manifest = self.assets.entries(AssetKind::Decoration)?;

        let mut placements = Vec::new();
        for (row, cells) in grid.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                let Some(item) = cell else { continue };
                let entry = manifest
                    .iter()
                    .find(|e| e.name == item.name)
                    .ok_or_else(|| AppError::validation(format!("Unknown decoration: {}", item.name)))?;
                if entry.url(AssetKind::Decoration) != item.url {
                    return Err(AppError::validation(format!(
                        "Decoration URL does not match manifest: {}",
                        item.name
                    )));
                }
                if !entitlements.allows(AssetKind::Decoration, entry) {
                    return Err(AppError::forbidden(format!(
                        "Decoration is locked: {}",
                        item.name
                    )));
                }
                placements.push(DecorationPlacement {
                    row: row as u8,
                    col: col as u8,
                    name: item.name.clone(),
                    url: item.url.clone(),
                });
            }
        }

        self.store.replace_decorations(pubkey, &placements)?;
        tracing::debug!(pubkey = %pubkey, count = placements.len(), "Decorations saved");
        let now = self.clock.now();
        Ok(SolmateView::build(creature, placements, now))
    }

    pub fn select_background(&self, pubkey: &str, url: &str) -> Result<SolmateView> {
        let pubkey = require(pubkey, "pubkey")?;
        let url = require(url, "backgroundUrl")?;

        let creature = self
            .store
            .get_creature(pubkey)?
            .ok_or_else(creature_not_found)?;
        let entry = self
            .assets
            .find_by_url(AssetKind::Background, url)?
            .ok_or_else(|| AppError::validation(format!("Unknown background: {url}")))?;
        if !self.entitlements(&creature)?.allows(AssetKind::Background, &entry) {
            return Err(AppError::forbidden(format!(
                "Background is locked: {}",
                entry.name
            )));
        }

        let (creature, now) = self.mutate(pubkey, |c, now| {
            c.selected_background = Some(url.to_string());
            c.updated_at = now;
            true
        })?;
        self.view(creature, now)
    }

    /// Top entries plus the requester's own rank when it falls outside them.
    pub fn leaderboard(&self, metric: LeaderboardMetric, pubkey: Option<&str>) -> Result<LeaderboardView> {
        let now = self.clock.now();
        let leaderboard = self.store.leaderboard(metric, LEADERBOARD_SIZE, now)?;
        let user_rank = match pubkey.map(str::trim).filter(|p| !p.is_empty()) {
            Some(pk) if !leaderboard.iter().any(|e| e.pubkey == pk) => {
                self.store.leaderboard_rank(metric, pk, now)?
            }
            _ => None,
        };
        Ok(LeaderboardView {
            leaderboard,
            user_rank,
        })
    }

    /// Manifest entries for `kind`, each marked with whether the requester
    /// may use it. Unknown or absent requesters only see free items unlocked.
    pub fn catalog(&self, kind: AssetKind, pubkey: Option<&str>) -> Result<Vec<CatalogItem>> {
        let creature = match pubkey.map(str::trim).filter(|p| !p.is_empty()) {
            Some(pk) => self.store.get_creature(pk)?,
            None => None,
        };
        let entitlements = match &creature {
            Some(c) => self.entitlements(c)?,
            None => Entitlements::anonymous(),
        };

        Ok(self
            .assets
            .entries(kind)?
            .into_iter()
            .map(|entry| {
                let slot = match kind {
                    AssetKind::Decoration => decoration_slot(&entry.filename),
                    AssetKind::Background => None,
                };
                CatalogItem {
                    unlocked: entitlements.allows(kind, &entry),
                    asset_id: kind.asset_id(&entry.name),
                    url: entry.url(kind),
                    row: slot.map(|(r, _)| r),
                    col: slot.map(|(_, c)| c),
                    name: entry.name,
                    unlock: entry.unlock,
                }
            })
            .collect())
    }

    /// Checks a purchase request against the store and manifests and builds
    /// the claim to verify on-chain.
    pub fn prepare_purchase(&self, request: &PurchaseRequest) -> Result<PaymentClaim> {
        let signature = require(&request.transaction_signature, "transactionSignature")?;
        let asset_id = require(&request.asset_id, "assetId")?;
        let payer = require(&request.user_pubkey, "userPubkey")?;

        let (kind, name) = AssetKind::parse_asset_id(asset_id)
            .ok_or_else(|| AppError::validation(format!("Invalid asset id: {asset_id}")))?;
        if self.store.is_transaction_processed(signature)? {
            return Err(AppError::conflict("Transaction signature already processed"));
        }
        let price = self
            .assets
            .find_by_name(kind, name)?
            .and_then(|e| e.unlock.price())
            .ok_or_else(|| AppError::not_found("Asset not found or is not for sale"))?;
        if self.store.get_creature(payer)?.is_none() {
            return Err(creature_not_found());
        }

        Ok(PaymentClaim {
            signature: signature.to_string(),
            payer: payer.to_string(),
            asset_id: asset_id.to_string(),
            price,
        })
    }

    /// Consumes the claim's signature and unlocks its asset atomically.
    pub fn complete_purchase(&self, claim: &PaymentClaim) -> Result<PurchaseOutcome> {
        let record = PurchaseRecord {
            signature: claim.signature.clone(),
            pubkey: claim.payer.clone(),
            asset_id: claim.asset_id.clone(),
            at: self.clock.now(),
        };
        let newly_unlocked = self.store.record_purchase(&record).map_err(|e| {
            if e.is_conflict() {
                AppError::conflict("Transaction signature already processed")
            } else {
                e.into()
            }
        })?;
        tracing::info!(
            pubkey = %claim.payer,
            asset_id = %claim.asset_id,
            signature = %claim.signature,
            price = claim.price,
            newly_unlocked,
            "Purchase recorded"
        );
        Ok(PurchaseOutcome {
            message: "Purchase verified and asset unlocked successfully.".to_string(),
            asset_id: claim.asset_id.clone(),
            newly_unlocked,
        })
    }
}

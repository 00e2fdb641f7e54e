use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use rusqlite::{named_params, params, Connection, OptionalExtension, Row};
use solmate_core::decay::alive_cutoff;
use solmate_data::{Creature, DecorationPlacement, LeaderboardEntry, LeaderboardMetric, UnlockedAsset};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// A paid unlock to record together with its consumed transaction.
#[derive(Debug, Clone)]
pub struct PurchaseRecord {
    pub signature: String,
    pub pubkey: String,
    pub asset_id: String,
    pub at: DateTime<Utc>,
}

/// Persistence contract for creatures and their cosmetics.
///
/// Every method is a single unit of work: implementations must never expose a
/// half-applied mutation to other callers.
pub trait CreatureStore: Send + Sync {
    fn get_creature(&self, pubkey: &str) -> Result<Option<Creature>>;

    /// Inserts a new creature. Fails with `StoreError::Conflict` if the owner
    /// already has one.
    fn insert_creature(&self, creature: &Creature) -> Result<()>;

    /// Read-modify-write of one creature inside a single transaction.
    ///
    /// `apply` returns `true` to persist its changes or `false` to leave the
    /// row untouched. Returns the row as it stands afterwards, or `None` if
    /// no creature exists for `pubkey`.
    fn update_creature(
        &self,
        pubkey: &str,
        apply: &mut dyn FnMut(&mut Creature) -> bool,
    ) -> Result<Option<Creature>>;

    fn pubkeys(&self) -> Result<Vec<String>>;

    /// End of the last window a periodic job fully processed.
    fn job_checkpoint(&self, job: &str) -> Result<Option<DateTime<Utc>>>;

    fn set_job_checkpoint(&self, job: &str, through: DateTime<Utc>) -> Result<()>;

    /// Owners whose creature currently has no waste.
    fn clean_pubkeys(&self) -> Result<Vec<String>>;

    /// Sets the waste flag if it is not already set. Returns whether the
    /// flag changed.
    fn mark_waste(&self, pubkey: &str) -> Result<bool>;

    fn decorations(&self, pubkey: &str) -> Result<Vec<DecorationPlacement>>;

    /// Replaces the whole decoration grid atomically.
    fn replace_decorations(&self, pubkey: &str, placements: &[DecorationPlacement]) -> Result<()>;

    fn unlocked_assets(&self, pubkey: &str) -> Result<Vec<UnlockedAsset>>;

    fn is_transaction_processed(&self, signature: &str) -> Result<bool>;

    /// Consumes `signature` and unlocks the asset in one transaction.
    ///
    /// Fails with `StoreError::Conflict` if the signature was already
    /// consumed. Returns `false` if the asset was already unlocked.
    fn record_purchase(&self, purchase: &PurchaseRecord) -> Result<bool>;

    /// Top `limit` eligible creatures by dense rank.
    fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>>;

    /// Exact dense rank of one creature among all eligible rows, `None` if it
    /// is missing or not eligible.
    fn leaderboard_rank(
        &self,
        metric: LeaderboardMetric,
        pubkey: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<LeaderboardEntry>>;
}

const CREATURE_COLUMNS: &str = "pubkey, name, animal, level, xp, high_score, last_fed_at, last_pet_at, \
     has_waste, selected_background, created_at, updated_at, times_cleaned, times_petted, times_fed";

fn creature_from_row(row: &Row<'_>) -> rusqlite::Result<Creature> {
    Ok(Creature {
        pubkey: row.get(0)?,
        name: row.get(1)?,
        animal: row.get(2)?,
        level: row.get(3)?,
        xp: row.get(4)?,
        high_score: row.get(5)?,
        last_fed_at: row.get(6)?,
        last_pet_at: row.get(7)?,
        has_waste: row.get(8)?,
        selected_background: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        times_cleaned: row.get(12)?,
        times_petted: row.get(13)?,
        times_fed: row.get(14)?,
    })
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<LeaderboardEntry> {
    let rank: i64 = row.get(0)?;
    Ok(LeaderboardEntry {
        rank: rank as u32,
        pubkey: row.get(1)?,
        name: row.get(2)?,
        animal: row.get(3)?,
        level: row.get(4)?,
        high_score: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn select_creature(conn: &Connection, pubkey: &str) -> Result<Option<Creature>> {
    let sql = format!("SELECT {CREATURE_COLUMNS} FROM creatures WHERE pubkey = ?1");
    Ok(conn
        .query_row(&sql, params![pubkey], creature_from_row)
        .optional()?)
}

/// Ranked view of eligible creatures. The survival view binds `:cutoff`.
fn ranked_cte(metric: LeaderboardMetric) -> &'static str {
    match metric {
        LeaderboardMetric::HighScore => {
            "WITH ranked AS (
                SELECT DENSE_RANK() OVER (ORDER BY high_score DESC) AS rank,
                       pubkey, name, animal, level, high_score, created_at, updated_at AS tie
                FROM creatures
                WHERE high_score > 0
            )"
        }
        LeaderboardMetric::Survival => {
            "WITH ranked AS (
                SELECT DENSE_RANK() OVER (ORDER BY created_at ASC) AS rank,
                       pubkey, name, animal, level, high_score, created_at, created_at AS tie
                FROM creatures
                WHERE last_fed_at > :cutoff
            )"
        }
    }
}

/// SQLite-backed store holding one connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) the database at `path` and migrates it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::from(e).with_context("opening database"))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CreatureStore for SqliteStore {
    fn get_creature(&self, pubkey: &str) -> Result<Option<Creature>> {
        select_creature(&self.conn(), pubkey)
    }

    fn insert_creature(&self, c: &Creature) -> Result<()> {
        let sql = format!(
            "INSERT INTO creatures ({CREATURE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        );
        self.conn()
            .execute(
                &sql,
                params![
                    c.pubkey,
                    c.name,
                    c.animal,
                    c.level,
                    c.xp,
                    c.high_score,
                    c.last_fed_at,
                    c.last_pet_at,
                    c.has_waste,
                    c.selected_background,
                    c.created_at,
                    c.updated_at,
                    c.times_cleaned,
                    c.times_petted,
                    c.times_fed
                ],
            )
            .map_err(|e| StoreError::from(e).with_context(format!("inserting creature {}", c.pubkey)))?;
        Ok(())
    }

    fn update_creature(
        &self,
        pubkey: &str,
        apply: &mut dyn FnMut(&mut Creature) -> bool,
    ) -> Result<Option<Creature>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let Some(mut creature) = select_creature(&tx, pubkey)? else {
            return Ok(None);
        };
        if !apply(&mut creature) {
            return Ok(Some(creature));
        }

        tx.execute(
            "UPDATE creatures SET
                name = ?2, level = ?3, xp = ?4, high_score = ?5,
                last_fed_at = ?6, last_pet_at = ?7, has_waste = ?8,
                selected_background = ?9, updated_at = ?10,
                times_cleaned = ?11, times_petted = ?12, times_fed = ?13
             WHERE pubkey = ?1",
            params![
                creature.pubkey,
                creature.name,
                creature.level,
                creature.xp,
                creature.high_score,
                creature.last_fed_at,
                creature.last_pet_at,
                creature.has_waste,
                creature.selected_background,
                creature.updated_at,
                creature.times_cleaned,
                creature.times_petted,
                creature.times_fed
            ],
        )?;
        tx.commit()?;
        Ok(Some(creature))
    }

    fn pubkeys(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT pubkey FROM creatures ORDER BY created_at")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    fn job_checkpoint(&self, job: &str) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .conn()
            .query_row(
                "SELECT completed_through FROM job_checkpoints WHERE job = ?1",
                params![job],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn set_job_checkpoint(&self, job: &str, through: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "INSERT INTO job_checkpoints (job, completed_through) VALUES (?1, ?2)
             ON CONFLICT (job) DO UPDATE SET completed_through = excluded.completed_through",
            params![job, through],
        )?;
        Ok(())
    }

    fn clean_pubkeys(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT pubkey FROM creatures WHERE has_waste = 0 ORDER BY created_at")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    fn mark_waste(&self, pubkey: &str) -> Result<bool> {
        let changed = self.conn().execute(
            "UPDATE creatures SET has_waste = 1 WHERE pubkey = ?1 AND has_waste = 0",
            params![pubkey],
        )?;
        Ok(changed == 1)
    }

    fn decorations(&self, pubkey: &str) -> Result<Vec<DecorationPlacement>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT grid_row, grid_col, decoration_name, decoration_url
             FROM selected_decorations WHERE pubkey = ?1
             ORDER BY grid_row, grid_col",
        )?;
        let rows = stmt.query_map(params![pubkey], |row| {
            Ok(DecorationPlacement {
                row: row.get(0)?,
                col: row.get(1)?,
                name: row.get(2)?,
                url: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn replace_decorations(&self, pubkey: &str, placements: &[DecorationPlacement]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM selected_decorations WHERE pubkey = ?1",
            params![pubkey],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO selected_decorations (pubkey, grid_row, grid_col, decoration_name, decoration_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for p in placements {
                stmt.execute(params![pubkey, p.row, p.col, p.name, p.url])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn unlocked_assets(&self, pubkey: &str) -> Result<Vec<UnlockedAsset>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT asset_id, purchase_signature, unlocked_at
             FROM unlocked_assets WHERE pubkey = ?1 ORDER BY unlocked_at",
        )?;
        let rows = stmt.query_map(params![pubkey], |row| {
            Ok(UnlockedAsset {
                asset_id: row.get(0)?,
                purchase_signature: row.get(1)?,
                unlocked_at: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn is_transaction_processed(&self, signature: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn()
            .query_row(
                "SELECT 1 FROM processed_transactions WHERE signature = ?1",
                params![signature],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn record_purchase(&self, purchase: &PurchaseRecord) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO processed_transactions (signature, pubkey, asset_id, processed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                purchase.signature,
                purchase.pubkey,
                purchase.asset_id,
                purchase.at
            ],
        )
        .map_err(|e| StoreError::from(e).with_context("consuming transaction signature"))?;
        let inserted = tx.execute(
            "INSERT INTO unlocked_assets (pubkey, asset_id, purchase_signature, unlocked_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(pubkey, asset_id) DO NOTHING",
            params![
                purchase.pubkey,
                purchase.asset_id,
                purchase.signature,
                purchase.at
            ],
        )?;
        tx.commit()?;
        Ok(inserted == 1)
    }

    fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Result<Vec<LeaderboardEntry>> {
        let sql = format!(
            "{} SELECT rank, pubkey, name, animal, level, high_score, created_at
             FROM ranked ORDER BY rank ASC, tie ASC, pubkey ASC LIMIT :limit",
            ranked_cte(metric)
        );
        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let limit = limit as i64;
        let rows = match metric {
            LeaderboardMetric::HighScore => {
                stmt.query_map(named_params! { ":limit": limit }, entry_from_row)?
            }
            LeaderboardMetric::Survival => stmt.query_map(
                named_params! { ":cutoff": alive_cutoff(now), ":limit": limit },
                entry_from_row,
            )?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn leaderboard_rank(
        &self,
        metric: LeaderboardMetric,
        pubkey: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<LeaderboardEntry>> {
        let sql = format!(
            "{} SELECT rank, pubkey, name, animal, level, high_score, created_at
             FROM ranked WHERE pubkey = :pubkey",
            ranked_cte(metric)
        );
        let conn = self.conn();
        let entry = match metric {
            LeaderboardMetric::HighScore => {
                conn.query_row(&sql, named_params! { ":pubkey": pubkey }, entry_from_row)
            }
            LeaderboardMetric::Survival => conn.query_row(
                &sql,
                named_params! { ":cutoff": alive_cutoff(now), ":pubkey": pubkey },
                entry_from_row,
            ),
        };
        Ok(entry.optional()?)
    }
}

fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS creatures (
            pubkey TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            animal TEXT NOT NULL,
            level INTEGER NOT NULL DEFAULT 1,
            xp INTEGER NOT NULL DEFAULT 0,
            high_score INTEGER NOT NULL DEFAULT 0,
            last_fed_at TEXT NOT NULL,
            last_pet_at TEXT NOT NULL,
            has_waste BOOLEAN NOT NULL DEFAULT 0,
            selected_background TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            times_cleaned INTEGER NOT NULL DEFAULT 0,
            times_petted INTEGER NOT NULL DEFAULT 0,
            times_fed INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS selected_decorations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            pubkey TEXT NOT NULL,
            grid_row INTEGER NOT NULL,
            grid_col INTEGER NOT NULL,
            decoration_name TEXT NOT NULL,
            decoration_url TEXT NOT NULL,
            FOREIGN KEY (pubkey) REFERENCES creatures (pubkey) ON DELETE CASCADE,
            UNIQUE (pubkey, grid_row, grid_col)
        );

        CREATE TABLE IF NOT EXISTS unlocked_assets (
            pubkey TEXT NOT NULL,
            asset_id TEXT NOT NULL,
            purchase_signature TEXT,
            unlocked_at TEXT NOT NULL,
            PRIMARY KEY (pubkey, asset_id),
            FOREIGN KEY (pubkey) REFERENCES creatures (pubkey) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS processed_transactions (
            signature TEXT PRIMARY KEY,
            pubkey TEXT NOT NULL,
            asset_id TEXT NOT NULL,
            processed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS job_checkpoints (
            job TEXT PRIMARY KEY,
            completed_through TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_creatures_high_score ON creatures(high_score DESC);
        CREATE INDEX IF NOT EXISTS idx_creatures_created_at ON creatures(created_at);
        CREATE INDEX IF NOT EXISTS idx_creatures_waste ON creatures(has_waste);",
    )?;
    Ok(())
}

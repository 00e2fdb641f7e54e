use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::Rng;
use solmate_core::boost::timestamp_for_value;
use solmate_core::decay::{Stat, MAX_STAT};
use solmate_core::leveling::{level_for_xp, min_xp_for_level};
use solmate_core::{Clock, SystemClock};
use solmate_data::Creature;
use solmate_io::{CreatureStore, SqliteStore};

const SEED_NAMES: [&str; 30] = [
    "Alex", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Jamie", "Cameron", "Drew", "Skyler",
    "Quinn", "Peyton", "Avery", "Dakota", "Rowan", "Hayden", "Frankie", "Sidney", "Charlie",
    "Emerson", "Finley", "River", "Phoenix", "Reese", "Kai", "Logan", "Elliot", "Blake", "Harper",
    "Sawyer",
];

#[derive(Parser, Debug)]
#[command(author, version, about = "Maintenance commands for the Solmate database", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "./solmate.db")]
    db: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Set a creature's level, moving its XP to the start of that level
    SetLevel {
        #[arg(long)]
        pubkey: String,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        level: u32,
    },
    /// Set current health (0-100)
    SetHealth {
        #[arg(long)]
        pubkey: String,
        #[arg(long)]
        value: f64,
    },
    /// Set current happiness (0-100)
    SetHappiness {
        #[arg(long)]
        pubkey: String,
        #[arg(long)]
        value: f64,
    },
    /// Restore health and happiness to full
    ResetStats {
        #[arg(long)]
        pubkey: String,
    },
    /// Insert random creatures with high scores
    SeedLeaderboard {
        #[arg(long, default_value_t = 30)]
        count: usize,
    },
}

fn check_stat(value: f64) -> anyhow::Result<f64> {
    anyhow::ensure!(
        (0.0..=MAX_STAT).contains(&value),
        "Stat value must be in [0, 100], got {}",
        value
    );
    Ok(value)
}

fn update(store: &dyn CreatureStore, pubkey: &str, mut apply: impl FnMut(&mut Creature)) -> anyhow::Result<()> {
    let found = store.update_creature(pubkey, &mut |c| {
        apply(c);
        true
    })?;
    match found {
        Some(c) => {
            println!(
                "Updated {} ({}): level {}, xp {}",
                c.name, c.pubkey, c.level, c.xp
            );
            Ok(())
        }
        None => anyhow::bail!("No solmate found with pubkey: {}", pubkey),
    }
}

fn random_creature<R: Rng>(index: usize, rng: &mut R, now: chrono::DateTime<chrono::Utc>) -> Creature {
    let bytes: [u8; 32] = rng.gen();
    let suffix = index / SEED_NAMES.len();
    let mut name = SEED_NAMES[index % SEED_NAMES.len()].to_string();
    if suffix > 0 {
        name = format!("{} {}", name, suffix + 1);
    }

    let mut creature = Creature::new(hex::encode(bytes), name, "dragon", now);
    let level = rng.gen_range(1..=50);
    creature.xp = min_xp_for_level(level);
    creature.level = level_for_xp(creature.xp);
    creature.high_score = rng.gen_range(100..10_100);
    creature
}

fn run(args: Args, clock: &dyn Clock) -> anyhow::Result<()> {
    let store = SqliteStore::open(&args.db).with_context(|| format!("opening {}", args.db))?;
    let now = clock.now();

    match args.command {
        Command::SetLevel { pubkey, level } => update(&store, &pubkey, |c| {
            c.xp = min_xp_for_level(level);
            c.level = level;
            c.updated_at = now;
        }),
        Command::SetHealth { pubkey, value } => {
            let value = check_stat(value)?;
            update(&store, &pubkey, |c| {
                c.last_fed_at = timestamp_for_value(Stat::Health, value, now);
                c.updated_at = now;
            })
        }
        Command::SetHappiness { pubkey, value } => {
            let value = check_stat(value)?;
            update(&store, &pubkey, |c| {
                c.last_pet_at = timestamp_for_value(Stat::Happiness, value, now);
                c.updated_at = now;
            })
        }
        Command::ResetStats { pubkey } => update(&store, &pubkey, |c| {
            c.last_fed_at = now;
            c.last_pet_at = now;
            c.updated_at = now;
        }),
        Command::SeedLeaderboard { count } => {
            let mut rng = rand::thread_rng();
            for i in 0..count {
                let creature = random_creature(i, &mut rng, now);
                store.insert_creature(&creature)?;
                println!(
                    "Inserted {} with high score {}",
                    creature.name, creature.high_score
                );
            }
            println!("Seeded the leaderboard with {} players.", count);
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    run(Args::parse(), &SystemClock)
}

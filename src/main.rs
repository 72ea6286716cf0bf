use dinner_debt::{
    Result, Tracker,
    config::{self, database},
};
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load settings (defaults when the file is absent)
    let settings = config::load_default_settings()
        .inspect_err(|e| error!("Critical error loading settings: {}", e))?;

    // 4. Connect and make sure the tables exist
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Load the ledger and seed configured people
    let mut tracker = Tracker::open(db)
        .await?
        .with_default_tip_percent(settings.events.default_tip_percent);
    let seeded = tracker.seed_people(&settings.people.seed).await?;
    if seeded > 0 {
        info!("Seeded {} people from settings.", seeded);
    }

    // 6. Check the stored balances against the event history
    let drift = tracker.audit()?;
    for entry in &drift {
        warn!(
            person = entry.person_id,
            stored = entry.stored,
            replayed = entry.replayed,
            "Balance disagrees with event history"
        );
    }
    if drift.is_empty() {
        info!("All balances match the event history.");
    }

    // 7. Report balances
    let report = tracker.report(settings.people.sort);
    for line in &report.lines {
        info!("{:<24} {:>12}", line.name, line.formatted);
    }
    if !report.is_balanced() {
        warn!(net = report.net, "Balances do not cancel out");
    }

    Ok(())
}

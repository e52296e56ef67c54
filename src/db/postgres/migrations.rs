//! Schema setup for the canonical tables.
//!
//! Each migration runs once, inside its own transaction, and is recorded in
//! `schema_migrations`. Statements are written so that databases created by
//! earlier tooling (tables present, unique keys or columns missing) converge
//! to the same shape: missing columns are added, rows without a key and
//! duplicate keys are removed, then the unique indexes are built.

use sqlx::{Pool, Postgres};
use tracing::{debug, info};

struct Migration {
    name: &'static str,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "001_market_price_daily",
        statements: &[r#"
            CREATE TABLE IF NOT EXISTS market_price_daily (
                trade_date DATE NOT NULL,
                symbol TEXT NOT NULL,
                open_price DOUBLE PRECISION,
                high_price DOUBLE PRECISION,
                low_price DOUBLE PRECISION,
                close_price DOUBLE PRECISION,
                volume BIGINT
            )
        "#],
    },
    Migration {
        name: "002_market_price_daily_unique",
        statements: &[
            r#"
            DELETE FROM market_price_daily a USING market_price_daily b
            WHERE a.ctid < b.ctid AND a.symbol = b.symbol AND a.trade_date = b.trade_date
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS unique_symbol_date
                ON market_price_daily (symbol, trade_date)
            "#,
        ],
    },
    Migration {
        name: "003_macro_time_series",
        statements: &[r#"
            CREATE TABLE IF NOT EXISTS macro_time_series (
                date_time DATE NOT NULL,
                indicator_symbol TEXT NOT NULL,
                value DOUBLE PRECISION,
                country TEXT
            )
        "#],
    },
    Migration {
        name: "004_macro_time_series_unique",
        statements: &[
            r#"
            DELETE FROM macro_time_series a USING macro_time_series b
            WHERE a.ctid < b.ctid
              AND a.indicator_symbol = b.indicator_symbol
              AND a.date_time = b.date_time
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS unique_indicator_date
                ON macro_time_series (indicator_symbol, date_time)
            "#,
        ],
    },
    Migration {
        name: "005_indicator_metadata",
        statements: &[r#"
            CREATE TABLE IF NOT EXISTS indicator_metadata (
                indicator_symbol TEXT PRIMARY KEY,
                title TEXT,
                country TEXT,
                unit TEXT,
                source TEXT,
                category TEXT,
                frequency TEXT
            )
        "#],
    },
    Migration {
        name: "006_indicator_metadata_unique",
        statements: &[
            "ALTER TABLE indicator_metadata ADD COLUMN IF NOT EXISTS indicator_symbol TEXT",
            "ALTER TABLE indicator_metadata ADD COLUMN IF NOT EXISTS title TEXT",
            "ALTER TABLE indicator_metadata ADD COLUMN IF NOT EXISTS country TEXT",
            "ALTER TABLE indicator_metadata ADD COLUMN IF NOT EXISTS unit TEXT",
            "ALTER TABLE indicator_metadata ADD COLUMN IF NOT EXISTS source TEXT",
            "ALTER TABLE indicator_metadata ADD COLUMN IF NOT EXISTS category TEXT",
            "ALTER TABLE indicator_metadata ADD COLUMN IF NOT EXISTS frequency TEXT",
            "DELETE FROM indicator_metadata WHERE indicator_symbol IS NULL",
            r#"
            DELETE FROM indicator_metadata a USING indicator_metadata b
            WHERE a.ctid < b.ctid AND a.indicator_symbol = b.indicator_symbol
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS unique_indicator_metadata_symbol
                ON indicator_metadata (indicator_symbol)
            "#,
        ],
    },
];

/// Applies every pending migration. Returns how many ran.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<usize, sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await?;

    let mut applied = 0;
    for migration in MIGRATIONS {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE name = $1)")
                .bind(migration.name)
                .fetch_one(pool)
                .await?;

        if exists {
            debug!(migration = migration.name, "Migration already applied");
            continue;
        }

        info!(migration = migration.name, "Running migration");
        let mut tx = pool.begin().await?;
        for statement in migration.statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO schema_migrations (name) VALUES ($1)")
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        applied += 1;
    }

    info!(applied, "Database migrations completed");
    Ok(applied)
}

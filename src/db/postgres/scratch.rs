//! Throwaway schemas on a real server for repository tests.
//!
//! Tests built on this return early when `TEST_DATABASE_URL` is unset.

use chrono::Utc;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::connection::PostgresConnection;
use super::migrations::run_migrations;

static NEXT_SCHEMA: AtomicUsize = AtomicUsize::new(0);

pub(crate) struct ScratchDatabase {
    pub connection: Arc<PostgresConnection>,
    schema: String,
    admin: Pool<Postgres>,
}

impl ScratchDatabase {
    /// A fresh schema with no tables, first on the search path.
    pub async fn empty() -> Option<Self> {
        let Some(url) = std::env::var("TEST_DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
        else {
            eprintln!("TEST_DATABASE_URL not set, skipping database test");
            return None;
        };

        let schema = format!(
            "econ_test_{}_{}_{}",
            std::process::id(),
            Utc::now().timestamp_micros(),
            NEXT_SCHEMA.fetch_add(1, Ordering::SeqCst)
        );

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("connect to TEST_DATABASE_URL");
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(&admin)
            .await
            .expect("create scratch schema");

        let options = PgConnectOptions::from_str(&url)
            .expect("parse TEST_DATABASE_URL")
            .options([("search_path", schema.as_str())]);
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("connect to scratch schema");

        Some(Self {
            connection: Arc::new(PostgresConnection::from_pool(pool)),
            schema,
            admin,
        })
    }

    /// A fresh schema with every migration applied.
    pub async fn migrated() -> Option<Self> {
        let db = Self::empty().await?;
        run_migrations(db.pool()).await.expect("run migrations");
        Some(db)
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        self.connection.get_pool()
    }

    /// Runs one or more statements verbatim.
    pub async fn execute(&self, sql: &str) {
        sqlx::raw_sql(sql)
            .execute(self.pool())
            .await
            .unwrap_or_else(|e| panic!("{}: {}", sql, e));
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.pool())
            .await
            .expect("count rows")
    }

    pub async fn drop_schema(self) {
        self.connection.get_pool().close().await;
        let _ = sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await;
        self.admin.close().await;
    }
}

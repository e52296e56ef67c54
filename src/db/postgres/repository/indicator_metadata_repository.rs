use crate::db::postgres::connection::PostgresConnection;
use crate::db::postgres::models::indicator_metadata::IndicatorMetadata;
use async_trait::async_trait;
use sqlx::Error as SqlxError;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait TraitIndicatorMetadataRepository {
    /// Inserts or refreshes descriptions. Fields missing from the incoming
    /// record keep their stored value.
    async fn upsert_many(&self, records: &[IndicatorMetadata]) -> Result<u64, SqlxError>;

    /// Up to `limit` records ordered by symbol, strictly after `after`.
    async fn fetch_page(
        &self,
        after: Option<String>,
        limit: i64,
    ) -> Result<Vec<IndicatorMetadata>, SqlxError>;
}

pub struct StructIndicatorMetadataRepository {
    connection: Arc<PostgresConnection>,
}

impl StructIndicatorMetadataRepository {
    pub fn new(connection: Arc<PostgresConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl TraitIndicatorMetadataRepository for StructIndicatorMetadataRepository {
    async fn upsert_many(&self, records: &[IndicatorMetadata]) -> Result<u64, SqlxError> {
        if records.is_empty() {
            return Ok(0);
        }

        let pool = self.connection.get_pool();
        let mut tx = pool.begin().await?;
        let mut affected = 0;

        for record in records {
            let result = sqlx::query(
                "INSERT INTO indicator_metadata
                    (indicator_symbol, title, country, unit, source, category, frequency)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (indicator_symbol) DO UPDATE SET
                    title = COALESCE(EXCLUDED.title, indicator_metadata.title),
                    country = COALESCE(EXCLUDED.country, indicator_metadata.country),
                    unit = COALESCE(EXCLUDED.unit, indicator_metadata.unit),
                    source = COALESCE(EXCLUDED.source, indicator_metadata.source),
                    category = COALESCE(EXCLUDED.category, indicator_metadata.category),
                    frequency = COALESCE(EXCLUDED.frequency, indicator_metadata.frequency)",
            )
            .bind(&record.indicator_symbol)
            .bind(&record.title)
            .bind(&record.country)
            .bind(&record.unit)
            .bind(&record.source)
            .bind(&record.category)
            .bind(&record.frequency)
            .execute(&mut *tx)
            .await?;
            affected += result.rows_affected();
        }

        tx.commit().await?;
        info!(records = records.len(), affected, "Upserted indicator metadata");

        Ok(affected)
    }

    async fn fetch_page(
        &self,
        after: Option<String>,
        limit: i64,
    ) -> Result<Vec<IndicatorMetadata>, SqlxError> {
        sqlx::query_as::<_, IndicatorMetadata>(
            "SELECT indicator_symbol::text AS indicator_symbol,
                    title::text AS title,
                    country::text AS country,
                    unit::text AS unit,
                    source::text AS source,
                    category::text AS category,
                    frequency::text AS frequency
             FROM indicator_metadata
             WHERE indicator_symbol IS NOT NULL
               AND ($1::text IS NULL OR indicator_symbol::text > $1::text)
             ORDER BY indicator_symbol::text
             LIMIT $2",
        )
        .bind(after)
        .bind(limit)
        .fetch_all(self.connection.get_pool())
        .await
    }
}

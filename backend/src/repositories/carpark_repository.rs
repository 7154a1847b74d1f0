//! Database repository for carpark records.

use crate::database::models::{Carpark, CreateCarpark};
use crate::utils::pagination::PageRequest;
use crate::utils::sort::{CARPARK_SORT_MAPPING, SortClause};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

const CARPARK_COLUMNS: &str = "id, carpark_id, carpark_name, lot_type, area, agency_type, \
    address, x_coord, y_coord, created_at";

pub struct CarparkRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CarparkRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_carpark(&self, carpark: CreateCarpark) -> Result<Carpark> {
        let sql = format!(
            "INSERT INTO carparks (id, carpark_id, carpark_name, lot_type, area, agency_type, \
             address, x_coord, y_coord, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {CARPARK_COLUMNS}"
        );

        let carpark = sqlx::query_as::<_, Carpark>(&sql)
            .bind(carpark.id)
            .bind(carpark.carpark_id)
            .bind(carpark.carpark_name)
            .bind(carpark.lot_type)
            .bind(carpark.area)
            .bind(carpark.agency_type)
            .bind(carpark.address)
            .bind(carpark.x_coord)
            .bind(carpark.y_coord)
            .bind(Utc::now())
            .fetch_one(self.pool)
            .await?;

        Ok(carpark)
    }

    pub async fn get_carpark_by_id(&self, id: &str) -> Result<Option<Carpark>> {
        let sql = format!("SELECT {CARPARK_COLUMNS} FROM carparks WHERE id = ?");

        let carpark = sqlx::query_as::<_, Carpark>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(carpark)
    }

    /// Checks the external carpark code, which is unique.
    pub async fn carpark_code_exists(&self, carpark_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carparks WHERE carpark_id = ?")
            .bind(carpark_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Retrieves one page of carparks in the requested order.
    pub async fn get_carparks(
        &self,
        page: &PageRequest,
        sort: &[SortClause],
    ) -> Result<Vec<Carpark>> {
        let sql = format!(
            "SELECT {CARPARK_COLUMNS} FROM carparks ORDER BY {} LIMIT ? OFFSET ?",
            CARPARK_SORT_MAPPING.order_by_sql(sort)
        );

        let carparks = sqlx::query_as::<_, Carpark>(&sql)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok(carparks)
    }

    pub async fn get_carparks_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carparks")
            .fetch_one(self.pool)
            .await?;

        Ok(count as u64)
    }
}

//! Carpark business logic service.

use crate::database::models::{Carpark, CreateCarpark};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::carpark_repository::CarparkRepository;
use crate::utils::pagination::{PageRequest, PagedList};
use crate::utils::sort::CARPARK_SORT_MAPPING;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Validated input for a new carpark.
#[derive(Debug, Clone)]
pub struct NewCarpark {
    pub carpark_id: String,
    pub carpark_name: String,
    pub lot_type: String,
    pub area: String,
    pub agency_type: String,
    pub address: String,
    pub x_coord: String,
    pub y_coord: String,
}

pub struct CarparkService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CarparkService<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_carpark(&self, new_carpark: NewCarpark) -> ServiceResult<Carpark> {
        let repo = CarparkRepository::new(self.pool);
        if repo.carpark_code_exists(&new_carpark.carpark_id).await? {
            return Err(ServiceError::already_exists(
                "Carpark",
                &new_carpark.carpark_id,
            ));
        }

        let carpark = repo
            .create_carpark(CreateCarpark {
                id: Uuid::now_v7().to_string(),
                carpark_id: new_carpark.carpark_id,
                carpark_name: new_carpark.carpark_name,
                lot_type: new_carpark.lot_type,
                area: new_carpark.area,
                agency_type: new_carpark.agency_type,
                address: new_carpark.address,
                x_coord: new_carpark.x_coord,
                y_coord: new_carpark.y_coord,
            })
            .await?;

        tracing::info!("Created carpark {} ({})", carpark.id, carpark.carpark_id);
        Ok(carpark)
    }

    pub async fn get_carpark_required(&self, id: &str) -> ServiceResult<Carpark> {
        let repo = CarparkRepository::new(self.pool);
        repo.get_carpark_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Carpark", id))
    }

    pub async fn list_carparks(&self, request: &PageRequest) -> ServiceResult<PagedList<Carpark>> {
        let sort = CARPARK_SORT_MAPPING.resolve(request.order_by.as_deref())?;

        let repo = CarparkRepository::new(self.pool);
        let total = repo.get_carparks_count().await?;
        let carparks = repo.get_carparks(request, &sort).await?;

        Ok(PagedList::new(carparks, total, request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn carpark(code: &str, name: &str) -> NewCarpark {
        NewCarpark {
            carpark_id: code.into(),
            carpark_name: name.into(),
            lot_type: "C".into(),
            area: "Central".into(),
            agency_type: "HDB".into(),
            address: "1 Example Road".into(),
            x_coord: "30314.7936".into(),
            y_coord: "31490.4942".into(),
        }
    }

    #[tokio::test]
    async fn test_list_carparks_by_name() {
        let pool = test_pool().await;
        let service = CarparkService::new(&pool);
        for (code, name) in [("C3", "Gamma"), ("C1", "Alpha"), ("C2", "beta")] {
            service.create_carpark(carpark(code, name)).await.unwrap();
        }

        let request = PageRequest::new(Some(1), Some(2), None, 20);
        let page = service.list_carparks(&request).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|c| c.carpark_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta"]);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_next());
    }

    #[tokio::test]
    async fn test_duplicate_code_and_unknown_sort() {
        let pool = test_pool().await;
        let service = CarparkService::new(&pool);
        service.create_carpark(carpark("C1", "Alpha")).await.unwrap();

        assert!(matches!(
            service.create_carpark(carpark("C1", "Again")).await,
            Err(ServiceError::AlreadyExists { .. })
        ));

        let request = PageRequest::new(None, None, Some("Capacity".into()), 20);
        assert!(matches!(
            service.list_carparks(&request).await,
            Err(ServiceError::InvalidOperation { .. })
        ));
    }
}

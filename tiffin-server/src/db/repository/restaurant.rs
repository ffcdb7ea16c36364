//! Restaurant Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Restaurant, RestaurantCreate};
use crate::utils::time;
use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

const TABLE: &str = "restaurant";

#[derive(Clone)]
pub struct RestaurantRepository {
    base: BaseRepository,
}

impl RestaurantRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// List all restaurants
    pub async fn find_all(&self) -> RepoResult<Vec<Restaurant>> {
        let restaurants: Vec<Restaurant> = self
            .base
            .db()
            .query("SELECT * FROM restaurant ORDER BY name")
            .await?
            .take(0)?;
        Ok(restaurants)
    }

    /// Find restaurant by id ("restaurant:xyz")
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Restaurant>> {
        let record_id: RecordId = id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("Invalid restaurant ID format: {}", id)))?;
        let restaurant: Option<Restaurant> = self.base.db().select(record_id).await?;
        Ok(restaurant)
    }

    /// Find restaurant by display name
    pub async fn find_by_name(&self, name: &str) -> RepoResult<Option<Restaurant>> {
        let name_owned = name.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM restaurant WHERE name = $name LIMIT 1")
            .bind(("name", name_owned))
            .await?;
        let restaurants: Vec<Restaurant> = result.take(0)?;
        Ok(restaurants.into_iter().next())
    }

    /// Find the restaurant owned by a seller
    pub async fn find_by_owner(&self, owner_id: &str) -> RepoResult<Option<Restaurant>> {
        let owner: RecordId = owner_id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("Invalid user ID format: {}", owner_id)))?;
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM restaurant WHERE owner = $owner LIMIT 1")
            .bind(("owner", owner.to_string()))
            .await?;
        let restaurants: Vec<Restaurant> = result.take(0)?;
        Ok(restaurants.into_iter().next())
    }

    /// Resolve an order's restaurant reference (record id or legacy name)
    pub async fn resolve_reference(&self, reference: &str) -> RepoResult<Option<Restaurant>> {
        if reference.starts_with("restaurant:")
            && let Ok(Some(found)) = self.find_by_id(reference).await
        {
            return Ok(Some(found));
        }
        self.find_by_name(reference).await
    }

    /// Register a new restaurant profile (one per seller)
    pub async fn create(&self, owner_id: &str, data: RestaurantCreate) -> RepoResult<Restaurant> {
        let owner: RecordId = owner_id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid owner ID: {}", owner_id)))?;

        if self.find_by_owner(owner_id).await?.is_some() {
            return Err(RepoError::Duplicate(
                "Seller already has a restaurant profile".to_string(),
            ));
        }
        if self.find_by_name(&data.name).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Restaurant '{}' already exists",
                data.name
            )));
        }

        let restaurant = Restaurant {
            id: None,
            name: data.name,
            owner,
            address: data.address,
            cuisine: data.cuisine,
            image_ref: data.image_ref,
            is_open: true,
            total_orders: None,
            revenue: None,
            created_at: time::now_rfc3339(),
        };

        let created: Option<Restaurant> = self.base.db().create(TABLE).content(restaurant).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create restaurant".to_string()))
    }

    /// Overwrite cached aggregates
    ///
    /// 对账策略是 always-overwrite（见 orders::reconcile）；这里不做
    /// 单调合并，传什么写什么。
    pub async fn update_aggregates(
        &self,
        id: &RecordId,
        total_orders: i64,
        revenue: f64,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query("UPDATE $id SET total_orders = $total_orders, revenue = $revenue")
            .bind(("id", id.clone()))
            .bind(("total_orders", total_orders))
            .bind(("revenue", revenue))
            .await?;
        Ok(())
    }
}

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::Restaurant;
use crate::db::repository::RestaurantRepository;
use crate::utils::{AppError, AppResponse, AppResult, ok};

/// GET /api/restaurants
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Vec<Restaurant>>>> {
    let repo = RestaurantRepository::new(state.get_db());
    let restaurants = repo.find_all().await?;
    Ok(ok(restaurants))
}

/// GET /api/restaurants/{id}
///
/// 接受完整 id (`restaurant:xyz`) 或纯 key (`xyz`)。
pub async fn get_one(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Restaurant>>> {
    let full_id = if id.contains(':') {
        id
    } else {
        format!("restaurant:{}", id)
    };
    let repo = RestaurantRepository::new(state.get_db());
    let restaurant = repo
        .find_by_id(&full_id)
        .await?
        .ok_or_else(|| AppError::not_found("Restaurant not found"))?;
    Ok(ok(restaurant))
}

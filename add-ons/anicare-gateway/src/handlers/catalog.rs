use crate::error::ApiError;
use crate::AppState;
use anicare_core::{Product, TrainingProgram};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProductQuery {
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TrainingQuery {
    age: Option<String>,
}

/// GET /api/products?category= – `all` or no category lists everything.
pub(crate) async fn products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .store
        .products(query.category.as_deref())
        .map_err(ApiError::store("Failed to read products"))?;
    Ok(Json(products))
}

/// GET /api/products/recommended
pub(crate) async fn recommended_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .store
        .recommended_products()
        .map_err(ApiError::store("Failed to read products"))?;
    Ok(Json(products))
}

/// GET /api/training-programs?age=
pub(crate) async fn training_programs(
    State(state): State<AppState>,
    Query(query): Query<TrainingQuery>,
) -> Result<Json<Vec<TrainingProgram>>, ApiError> {
    let programs = state
        .store
        .training_programs(query.age.as_deref())
        .map_err(ApiError::store("Failed to read training programs"))?;
    Ok(Json(programs))
}

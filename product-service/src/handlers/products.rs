use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use service_core::error::AppError;

use crate::models::{
    DeleteOutcome, InsertOutcome, NewProduct, Product, ProductFields, ProductId, UpdateOutcome,
};
use crate::services::record_product_write;
use crate::startup::AppState;

/// Size of the "latest listings" strip on the landing page.
pub const LATEST_PRODUCTS_LIMIT: i64 = 6;

#[tracing::instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = state
        .store
        .list(None)
        .await
        .map_err(|e| e.context("Error fetching products"))?;

    Ok(Json(products))
}

#[tracing::instrument(skip(state))]
pub async fn latest_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state
        .store
        .list(Some(LATEST_PRODUCTS_LIMIT))
        .await
        .map_err(|e| e.context("Error fetching latest products"))?;

    Ok(Json(products))
}

/// Responds with `null` when no product has the id.
#[tracing::instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Option<Product>>, AppError> {
    let fetch = async {
        let id = ProductId::parse(&id)?;
        state.store.find_by_id(id).await
    };
    let product = fetch
        .await
        .map_err(|e| e.context("Error fetching product details"))?;

    Ok(Json(product))
}

#[tracing::instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = state
        .store
        .search_by_name(&name)
        .await
        .map_err(|e| e.context("Error searching products"))?;

    Ok(Json(products))
}

#[tracing::instrument(skip(state, fields))]
pub async fn create_product(
    State(state): State<AppState>,
    WithRejection(Json(fields), _): WithRejection<Json<ProductFields>, AppError>,
) -> Result<Json<InsertOutcome>, AppError> {
    let outcome = state
        .store
        .insert(NewProduct::stamped_now(fields))
        .await
        .map_err(|e| e.context("Error adding product"))?;

    record_product_write("insert", 1);
    tracing::info!(product_id = %outcome.inserted_id, "Product created");

    Ok(Json(outcome))
}

#[tracing::instrument(skip(state, fields))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(fields), _): WithRejection<Json<ProductFields>, AppError>,
) -> Result<Json<UpdateOutcome>, AppError> {
    let update = async {
        let id = ProductId::parse(&id)?;
        if fields.is_empty() {
            return Err(AppError::InvalidRequest(
                "update body must contain at least one field".to_string(),
            ));
        }
        state.store.update(id, fields).await
    };
    let outcome = update
        .await
        .map_err(|e| e.context("Error updating product"))?;

    record_product_write("update", outcome.modified_count);
    tracing::info!(
        product_id = %id,
        matched = outcome.matched_count,
        modified = outcome.modified_count,
        "Product updated"
    );

    Ok(Json(outcome))
}

#[tracing::instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteOutcome>, AppError> {
    let delete = async {
        let id = ProductId::parse(&id)?;
        state.store.delete(id).await
    };
    let outcome = delete
        .await
        .map_err(|e| e.context("Error deleting product"))?;

    record_product_write("delete", outcome.deleted_count);
    tracing::info!(product_id = %id, deleted = outcome.deleted_count, "Product deleted");

    Ok(Json(outcome))
}

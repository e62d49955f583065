//! Items CRUD routes under `/api/v1`.
//!
//! - POST /api/v1/items
//! - GET /api/v1/items?page=&page_size=
//! - GET /api/v1/items/{item_id}
//! - PUT /api/v1/items/{item_id}
//! - DELETE /api/v1/items/{item_id}
//!
//! Extractor rejections are folded into [`ApiError`] so that every malformed
//! request is a 422 with a `detail` list.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::items::model::{Item, ItemUpdate, NewItem};
use crate::items::pagination::{Page, PageRequest, DEFAULT_PAGE_SIZE};
use crate::server::error::ApiError;
use crate::server::AppState;

/// Query string for the list endpoint.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl ListParams {
    pub fn into_request(self) -> Result<PageRequest, ApiError> {
        Ok(PageRequest::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        )?)
    }
}

pub async fn create_item(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewItem>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Json(new_item) = payload?;
    new_item.validate()?;

    let item = state.items.create(new_item).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn list_items(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Page<Item>>, ApiError> {
    let Query(params) = params?;
    let request = params.into_request()?;

    let page = state.items.list(request).await?;
    Ok(Json(page))
}

pub async fn get_item(
    State(state): State<Arc<AppState>>,
    item_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Item>, ApiError> {
    let Path(item_id) = item_id?;
    let item = state.items.get(&item_id).await?;
    Ok(Json(item))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    item_id: Result<Path<String>, PathRejection>,
    payload: Result<Json<ItemUpdate>, JsonRejection>,
) -> Result<Json<Item>, ApiError> {
    let Path(item_id) = item_id?;
    let Json(update) = payload?;
    update.validate()?;

    let item = state.items.update(&item_id, update).await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    item_id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(item_id) = item_id?;
    state.items.delete(&item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

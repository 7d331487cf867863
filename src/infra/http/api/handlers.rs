use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use time::OffsetDateTime;

use tipbot_api_types::{
    HistoryListResponse, TipCreateRequest, TipListResponse, TodayTipResponse,
};

use crate::application::catalog::CatalogError;
use crate::application::error::ErrorReport;
use crate::application::repos::{RepoError, TipQueryFilter};
use crate::application::rotation::{RotationError, Selection};
use crate::domain::rotation::compose_post_text;

use super::error::{ApiError, codes};
use super::models::*;
use super::state::ApiState;

#[derive(Debug, Deserialize)]
pub struct TipListQuery {
    pub category_id: Option<i64>,
    pub posted: Option<bool>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

pub async fn health(State(state): State<ApiState>) -> Response {
    match state.health.ping().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

pub async fn list_categories(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let categories = state
        .catalog
        .list_categories()
        .await
        .map_err(catalog_to_api)?;

    Ok(Json(
        categories.into_iter().map(category_view).collect::<Vec<_>>(),
    ))
}

pub async fn list_tips(
    State(state): State<ApiState>,
    Query(query): Query<TipListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TipQueryFilter {
        category_id: query.category_id,
        posted: query.posted,
        limit: query.limit,
    };
    let tips = state.catalog.list_tips(filter).await.map_err(catalog_to_api)?;

    Ok(Json(TipListResponse {
        items: tips.into_iter().map(tip_view).collect(),
    }))
}

pub async fn get_tip(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    match state.catalog.find_tip(id).await.map_err(catalog_to_api)? {
        Some(tip) => Ok(Json(tip_view(tip))),
        None => Err(ApiError::not_found("tip not found")),
    }
}

pub async fn create_tip(
    State(state): State<ApiState>,
    payload: Result<Json<TipCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        ApiError::bad_request("Malformed tip payload", Some(rejection.body_text()))
    })?;
    let tip = state
        .catalog
        .create_tip(tip_draft(payload))
        .await
        .map_err(catalog_to_api)?;

    Ok((StatusCode::CREATED, Json(tip_view(tip))))
}

pub async fn delete_tip(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if state.catalog.delete_tip(id).await.map_err(catalog_to_api)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("tip not found"))
    }
}

pub async fn list_history(
    State(state): State<ApiState>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let history = state
        .catalog
        .list_history(query.limit)
        .await
        .map_err(catalog_to_api)?;

    Ok(Json(HistoryListResponse {
        items: history.into_iter().map(history_view).collect(),
    }))
}

pub async fn today_tip(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let selection = state
        .rotation
        .select(OffsetDateTime::now_utc())
        .await
        .map_err(repo_to_api)?;

    match selection {
        Selection::Picked { category_id, tip } => {
            let content = compose_post_text(&tip);
            Ok(Json(TodayTipResponse {
                category_id,
                tip: tip_view(tip),
                content,
            }))
        }
        Selection::NothingToPost { reason, .. } => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            codes::NOTHING_TO_POST,
            "No tips available for today",
            Some(reason.as_str().to_string()),
        )),
    }
}

pub async fn run_rotation(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .rotation
        .run_daily_cycle()
        .await
        .map_err(rotation_to_api)?;

    Ok(Json(rotation_response(outcome)))
}

fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

fn catalog_to_api(err: CatalogError) -> ApiError {
    match err {
        CatalogError::Invalid(domain) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid tip",
            Some(domain.to_string()),
        ),
        CatalogError::UnknownCategory(id) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::UNKNOWN_CATEGORY,
            "Unknown category",
            Some(format!("category {id} does not exist")),
        ),
        CatalogError::TipInUse(id) => ApiError::new(
            StatusCode::CONFLICT,
            codes::TIP_IN_USE,
            "Tip has post history",
            Some(format!("tip {id} has already been attempted")),
        ),
        CatalogError::Repo(repo) => repo_to_api(repo),
    }
}

fn rotation_to_api(err: RotationError) -> ApiError {
    match err {
        RotationError::Persistence { stage, source } => {
            let status = match source {
                RepoError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            ApiError::new(
                status,
                codes::ROTATION,
                "Rotation cycle failed",
                Some(format!("{stage}: {source}")),
            )
        }
    }
}

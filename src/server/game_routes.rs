//! Game endpoints: playing a variant, listing variants, reporting songs.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::state::{GuardedCatalogStore, GuardedPlayService, ServerState};
use crate::catalog_store::ReportCategory;
use crate::play::PlayError;
use crate::variants::{SubsetExport, VariantSubset};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: &'static str,
    message: String,
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    build_id: Option<String>,
}

fn error_response(status: StatusCode, code: &'static str, message: String) -> Response {
    let body = ErrorBody {
        code,
        message,
        retryable: false,
        build_id: None,
    };
    (status, Json(body)).into_response()
}

fn play_error_response(err: PlayError, build_id: &str) -> Response {
    let status = match &err {
        PlayError::InvalidKeyFormat(_) => StatusCode::BAD_REQUEST,
        PlayError::UnknownVariant(_) => StatusCode::NOT_FOUND,
        PlayError::NoContent(_) => return StatusCode::NO_CONTENT.into_response(),
        PlayError::CatalogUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let body = ErrorBody {
        code: err.code(),
        message: err.to_string(),
        retryable: err.is_retryable(),
        build_id: matches!(err, PlayError::UnknownVariant(_)).then(|| build_id.to_string()),
    };
    (status, Json(body)).into_response()
}

async fn play(State(play_service): State<GuardedPlayService>, Path(key): Path<String>) -> Response {
    match play_service.play(&key).await {
        Ok(clip) => Json(clip).into_response(),
        Err(err) => {
            if err.is_retryable() {
                error!("Play {} failed: {}", key, err);
            }
            let snapshot = play_service.snapshot();
            play_error_response(err, snapshot.table.build_id())
        }
    }
}

#[derive(Deserialize, Debug)]
struct VariantsQuery {
    subset: Option<String>,
}

async fn list_variants(
    State(play_service): State<GuardedPlayService>,
    Query(query): Query<VariantsQuery>,
) -> Response {
    let subset = match query.subset.as_deref().map(str::parse::<VariantSubset>) {
        None => VariantSubset::All,
        Some(Ok(subset)) => subset,
        Some(Err(reason)) => {
            return error_response(StatusCode::BAD_REQUEST, "INVALID_SUBSET", reason);
        }
    };
    let snapshot = play_service.snapshot();
    Json(SubsetExport::new(&snapshot.table, subset)).into_response()
}

const MAX_REPORT_MESSAGE_LENGTH: usize = 2000;

#[derive(Deserialize, Debug)]
struct ReportBody {
    category: ReportCategory,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    success: bool,
    report_id: String,
    song_id: String,
    category: ReportCategory,
}

async fn report_song(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(song_id): Path<String>,
    Json(body): Json<ReportBody>,
) -> Response {
    let message = body.message.unwrap_or_default();
    if message.chars().count() > MAX_REPORT_MESSAGE_LENGTH {
        return error_response(
            StatusCode::BAD_REQUEST,
            "MESSAGE_TOO_LONG",
            format!("message exceeds {} characters", MAX_REPORT_MESSAGE_LENGTH),
        );
    }

    match catalog_store.create_report(&song_id, body.category, &message) {
        Ok(Some(report)) => {
            info!("Song {} reported as {}", song_id, report.category.to_db_str());
            Json(ReportResponse {
                success: true,
                report_id: report.id,
                song_id: report.song_id,
                category: report.category,
            })
            .into_response()
        }
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "UNKNOWN_SONG",
            format!("unknown song {}", song_id),
        ),
        Err(err) => {
            error!("Failed to store report for {}: {:#}", song_id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn make_game_routes(state: ServerState) -> Router {
    Router::new()
        .route("/play/{key}", get(play))
        .route("/variants", get(list_variants))
        .route("/songs/{id}/report", post(report_song))
        .with_state(state)
}

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::pipeline::{self, MergeSummary};
use crate::state::AppState;
use crate::types::activity::FileFormat;

pub const TCX_CONTENT_TYPE: &str = "application/vnd.garmin.tcx+xml";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/merge", post(merge))
        .route("/api/merge/:merge_id", get(download))
}

#[derive(Serialize)]
struct MergeResponse {
    merge_id: String,
    #[serde(flatten)]
    summary: MergeSummary,
}

struct Upload {
    bytes: Vec<u8>,
    format: FileFormat,
    filename: String,
}

async fn merge(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MergeResponse>, AppError> {
    let mut structural: Option<Upload> = None;
    let mut heart_rate: Option<Upload> = None;
    let mut options = state.config.merge;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "structural" | "heart_rate" => {
                let filename = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| AppError::BadRequest(format!("No filename provided for {}", name)))?;
                let format = FileFormat::from_filename(&filename)
                    .ok_or_else(|| AppError::BadRequest(format!("Unsupported file format: {}", filename)))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file bytes: {}", e)))?
                    .to_vec();
                let upload = Upload {
                    bytes,
                    format,
                    filename,
                };
                if name == "structural" {
                    structural = Some(upload);
                } else {
                    heart_rate = Some(upload);
                }
            }
            "distance_only" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read distance_only: {}", e)))?;
                options.distance_only = matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes");
            }
            _ => {}
        }
    }

    let structural = structural.ok_or_else(|| AppError::BadRequest("No structural file provided".to_string()))?;
    let heart_rate = heart_rate.ok_or_else(|| AppError::BadRequest("No heart_rate file provided".to_string()))?;

    tracing::info!(
        "Merging {} ({}) with heart rate from {} ({})",
        structural.filename,
        structural.format.as_str(),
        heart_rate.filename,
        heart_rate.format.as_str()
    );

    let (document, summary) = pipeline::splice_bytes(
        &structural.bytes,
        structural.format,
        &heart_rate.bytes,
        heart_rate.format,
        &options,
    )?;

    let merge_id = Uuid::new_v4().to_string();
    state.insert(merge_id.clone(), document, summary.clone());

    tracing::info!(
        "Stored merge {} ({} laps, {:.0} m)",
        merge_id,
        summary.laps.len(),
        summary.total_distance_meters
    );

    Ok(Json(MergeResponse { merge_id, summary }))
}

async fn download(
    State(state): State<AppState>,
    Path(merge_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let cached = state
        .get(&merge_id)
        .ok_or_else(|| AppError::NotFound(merge_id.clone()))?;

    Ok((
        [
            (header::CONTENT_TYPE, TCX_CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"converted.tcx\""),
        ],
        cached.document,
    ))
}

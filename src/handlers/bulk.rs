use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;

use crate::{
    auth::CurrentUser,
    errors::ServiceError,
    services::bulk::{ExportKind, TEMPLATE_FILENAME},
    AppState,
};

/// Multipart field the import expects the CSV file under.
const UPLOAD_FIELD: &str = "arquivo_csv";

async fn download_template(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Response, ServiceError> {
    let bytes = state.bulk.template_csv()?;
    Ok(csv_attachment(TEMPLATE_FILENAME, bytes))
}

async fn import_csv(
    State(state): State<AppState>,
    _user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Response, ServiceError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::InvalidInput(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if field.file_name().map_or(true, str::is_empty) {
            return Err(ServiceError::ValidationError(
                "select a file to import".to_string(),
            ));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ServiceError::InvalidInput(format!("failed to read upload: {}", e)))?;
        let summary = state.bulk.import_csv(&data).await?;
        return Ok(Json(summary).into_response());
    }

    Err(ServiceError::ValidationError(format!(
        "multipart field '{}' is required",
        UPLOAD_FIELD
    )))
}

async fn export_csv(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(kind): Path<String>,
) -> Result<Response, ServiceError> {
    let kind = ExportKind::parse(&kind)
        .ok_or_else(|| ServiceError::NotFound(format!("unknown export kind: {}", kind)))?;
    let bytes = state.bulk.export_csv(kind).await?;
    Ok(csv_attachment(kind.filename(), bytes))
}

async fn clear_sales(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Response, ServiceError> {
    let deleted = state.bulk.clear_sales().await?;
    Ok(Json(json!({ "deleted": deleted })).into_response())
}

fn csv_attachment(filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response()
}

pub fn bulk_routes() -> Router<AppState> {
    Router::new()
        .route("/template.csv", get(download_template))
        .route("/import", post(import_csv))
        .route("/export/:kind", get(export_csv))
        .route("/sales", delete(clear_sales))
}

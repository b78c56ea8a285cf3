use axum::{extract::State, response::IntoResponse, routing::get, Router};

use crate::{
    auth::CurrentUser, errors::ServiceError, handlers::common::success_response, AppState,
};

/// Aggregated figures plus the two chart series.
async fn overview(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.reports.overview().await?))
}

pub fn report_routes() -> Router<AppState> {
    Router::new().route("/", get(overview))
}

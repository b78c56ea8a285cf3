use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    auth::CurrentUser,
    errors::ServiceError,
    handlers::common::{created_response, success_response},
    services::sales::CreateSaleInput,
    AppState,
};

async fn list_sales(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.sales.list_sales().await?))
}

async fn create_sale(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<CreateSaleInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(state.sales.create_sale(input).await?))
}

pub fn sale_routes() -> Router<AppState> {
    Router::new().route("/", get(list_sales).post(create_sale))
}

use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    auth::CurrentUser,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response},
    services::customers::CustomerInput,
    AppState,
};

async fn list_customers(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.customers.list().await?))
}

async fn get_customer(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.customers.get(id).await?))
}

async fn create_customer(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<CustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(state.customers.create(input).await?))
}

async fn update_customer(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<CustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.customers.update(id, input).await?))
}

async fn delete_customer(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.customers.delete(id).await?;
    Ok(no_content_response())
}

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/:id",
            get(get_customer)
                .put(update_customer)
                .delete(delete_customer),
        )
}

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
    services::products::ProductInput,
    AppState,
};

async fn list_products(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.products.list().await?))
}

async fn get_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.products.get(id).await?))
}

async fn create_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(created_response(state.products.create(input).await?))
}

async fn update_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<ProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    Ok(success_response(state.products.update(id, input).await?))
}

async fn delete_product(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ServiceError> {
    state.products.delete(id).await?;
    Ok(no_content_response())
}

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

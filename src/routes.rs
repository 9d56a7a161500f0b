// ABOUTME: HTTP routes mapping REST verbs onto the entity store and relationship resolver
// ABOUTME: Handlers are generic over resource markers and instantiated once per table

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::header,
    middleware,
    response::IntoResponse,
    routing::get,
};
use serde_json::{Map, Value};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::debug;

use crate::AppState;
use crate::auth::{self, Principal};
use crate::entities::user;
use crate::error::{AppError, Result};
use crate::middleware::api_headers;
use crate::relations::Link;
use crate::resources::{
    ConnectionLogins, ConnectionTypes, DatabaseTypes, Databases, FunctionPermissions,
    FunctionTypes, Groups, Logins, ServerPermissions, ServerTypes, Servers, UserGroups, Users,
};
use crate::storage::{Creatable, Mutable, Resource};
use crate::types::{AllowResponse, DeleteResponse, PrincipalResponse};

const COLLECTION_METHODS: &[&str] = &["GET", "POST", "OPTIONS"];
const ITEM_METHODS: &[&str] = &["GET", "PUT", "DELETE", "OPTIONS"];
const FIXED_ITEM_METHODS: &[&str] = &["GET", "DELETE", "OPTIONS"];

/// Build the complete router with all routes.
pub fn build_router(state: AppState, timeout: Option<Duration>) -> Router {
    let api = Router::new()
        .route("/me", get(me))
        .merge(type_routes::<DatabaseTypes>("/database_types"))
        .merge(type_routes::<ConnectionTypes>("/connection_types"))
        .merge(type_routes::<ServerTypes>("/server_types"))
        .merge(type_routes::<FunctionTypes>("/function_types"))
        .merge(entity_routes::<Groups>("/groups"))
        .merge(entity_routes::<Users>("/users"))
        .merge(entity_routes::<Servers>("/servers"))
        .merge(entity_routes::<Databases>("/databases"))
        .merge(entity_routes::<Logins>("/logins"))
        .merge(link_routes::<UserGroups>("/user_groups"))
        .merge(link_routes::<FunctionPermissions>("/function_permissions"))
        .merge(link_routes::<ServerPermissions>("/server_permissions"))
        .merge(link_routes::<ConnectionLogins>("/connection_logins"))
        .with_state(state);

    let app = Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(middleware::from_fn(api_headers))
        .layer(TraceLayer::new_for_http());

    match timeout {
        Some(duration) => app.layer(TimeoutLayer::new(duration)),
        None => app,
    }
}

fn type_routes<R: Creatable>(path: &str) -> Router<AppState> {
    Router::new()
        .route(
            path,
            get(list_rows::<R>)
                .post(create_row::<R>)
                .options(collection_options),
        )
        .route(
            &format!("{}/:id", path),
            get(get_row::<R>)
                .delete(delete_row::<R>)
                .options(fixed_item_options),
        )
}

fn entity_routes<R: Mutable>(path: &str) -> Router<AppState> {
    Router::new()
        .route(
            path,
            get(list_rows::<R>)
                .post(create_row::<R>)
                .options(collection_options),
        )
        .route(
            &format!("{}/:id", path),
            get(get_row::<R>)
                .put(update_row::<R>)
                .delete(delete_row::<R>)
                .options(item_options),
        )
}

fn link_routes<L: Link>(path: &str) -> Router<AppState> {
    Router::new()
        .route(
            path,
            get(list_links::<L>)
                .post(create_link::<L>)
                .options(collection_options),
        )
        .route(
            &format!("{}/:id", path),
            get(get_link::<L>)
                .delete(delete_row::<L>)
                .options(fixed_item_options),
        )
}

fn body(payload: std::result::Result<Json<Value>, JsonRejection>) -> Result<Value> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn require_read<R: Resource>(state: &AppState, user: &user::Model) -> Result<()> {
    match R::READ {
        Some(function) => auth::require(&state.storage.db, user, function).await,
        None => Ok(()),
    }
}

fn listing<R: Resource>(rows: Vec<Value>) -> Json<Value> {
    let mut object = Map::new();
    object.insert(R::SCHEMA.table.name().to_string(), Value::Array(rows));
    Json(Value::Object(object))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn me(State(state): State<AppState>, Principal(user): Principal) -> Result<Json<PrincipalResponse>> {
    let groups = auth::groups_of(&state.storage.db, user.id).await?;
    let functions = auth::functions_of(&state.storage.db, user.id).await?;

    Ok(Json(PrincipalResponse {
        id: user.id,
        name: user.name,
        groups,
        functions,
    }))
}

async fn list_rows<R: Resource>(
    State(state): State<AppState>,
    Principal(user): Principal,
) -> Result<Json<Value>> {
    debug!(principal = %user.name, operation = "list", table = R::SCHEMA.table.name());
    require_read::<R>(&state, &user).await?;

    let rows = state
        .storage
        .list_all::<R>()
        .await?
        .iter()
        .map(|model| R::to_json(model, &state.storage.codec))
        .collect::<Result<Vec<_>>>()?;
    Ok(listing::<R>(rows))
}

async fn get_row<R: Resource>(
    State(state): State<AppState>,
    Principal(user): Principal,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    debug!(principal = %user.name, operation = "get", table = R::SCHEMA.table.name(), id);
    require_read::<R>(&state, &user).await?;

    let model = state.storage.get_by_id::<R>(id).await?;
    Ok(Json(R::to_json(&model, &state.storage.codec)?))
}

async fn create_row<R: Creatable>(
    State(state): State<AppState>,
    Principal(user): Principal,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    auth::require(&state.storage.db, &user, R::GUARD.create).await?;
    debug!(principal = %user.name, operation = "create", table = R::SCHEMA.table.name());

    let model = state.storage.create::<R>(body(payload)?).await?;
    Ok(Json(R::to_json(&model, &state.storage.codec)?))
}

async fn update_row<R: Mutable>(
    State(state): State<AppState>,
    Principal(user): Principal,
    Path(id): Path<i32>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    auth::require(&state.storage.db, &user, R::GUARD.modify).await?;
    debug!(principal = %user.name, operation = "update", table = R::SCHEMA.table.name(), id);

    let model = state.storage.update::<R>(id, body(payload)?).await?;
    Ok(Json(R::to_json(&model, &state.storage.codec)?))
}

async fn delete_row<R: Resource>(
    State(state): State<AppState>,
    Principal(user): Principal,
    Path(id): Path<i32>,
) -> Result<Json<DeleteResponse>> {
    auth::require(&state.storage.db, &user, R::GUARD.delete).await?;
    debug!(principal = %user.name, operation = "delete", table = R::SCHEMA.table.name(), id);

    state.storage.delete::<R>(id).await?;
    Ok(Json(DeleteResponse {
        success: format!("{} deleted", id),
    }))
}

async fn list_links<L: Link>(
    State(state): State<AppState>,
    Principal(user): Principal,
) -> Result<Json<Value>> {
    debug!(principal = %user.name, operation = "list", table = L::SCHEMA.table.name());
    require_read::<L>(&state, &user).await?;

    let links = state.storage.list_all::<L>().await?;
    let mut rows = Vec::with_capacity(links.len());
    for link in &links {
        rows.push(state.storage.expand_lenient::<L>(link).await?);
    }
    Ok(listing::<L>(rows))
}

async fn get_link<L: Link>(
    State(state): State<AppState>,
    Principal(user): Principal,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    debug!(principal = %user.name, operation = "get", table = L::SCHEMA.table.name(), id);
    require_read::<L>(&state, &user).await?;

    let link = state.storage.get_by_id::<L>(id).await?;
    Ok(Json(state.storage.expand::<L>(&link).await?))
}

async fn create_link<L: Link>(
    State(state): State<AppState>,
    Principal(user): Principal,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    auth::require(&state.storage.db, &user, L::GUARD.create).await?;
    debug!(principal = %user.name, operation = "create_link", table = L::SCHEMA.table.name());

    let link = state.storage.create_link::<L>(body(payload)?).await?;
    Ok(Json(state.storage.expand::<L>(&link).await?))
}

fn allow(methods: &[&str]) -> impl IntoResponse {
    (
        [(header::ALLOW, methods.join(", "))],
        Json(AllowResponse {
            allow: methods.iter().map(|m| m.to_string()).collect(),
        }),
    )
}

async fn collection_options() -> impl IntoResponse {
    allow(COLLECTION_METHODS)
}

async fn item_options() -> impl IntoResponse {
    allow(ITEM_METHODS)
}

async fn fixed_item_options() -> impl IntoResponse {
    allow(FIXED_ITEM_METHODS)
}

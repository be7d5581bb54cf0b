//! Owner-scoped deployment endpoints. Every handler requires a [`Session`].

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, patch},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::session::Session;
use super::state::{GuardedDeploymentManager, ServerState};
use crate::deployment::{Deployment, DeploymentWithMcp, EnvVars, DEPLOYMENT_NOT_FOUND};
use crate::error::{MarketplaceError, MarketplaceResult};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateDeploymentBody {
    mcp_id: i64,
    #[serde(default)]
    env_vars: Option<EnvVars>,
}

#[derive(Deserialize, Debug)]
struct UpdateStatusBody {
    status: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct UpdateEnvVarsBody {
    env_vars: EnvVars,
}

/// Non-numeric ids cannot name a deployment.
fn parse_id(raw: &str) -> MarketplaceResult<i64> {
    raw.parse()
        .map_err(|_| MarketplaceError::not_found(DEPLOYMENT_NOT_FOUND))
}

fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

async fn list_deployments(
    session: Session,
    State(manager): State<GuardedDeploymentManager>,
) -> MarketplaceResult<Json<Vec<DeploymentWithMcp>>> {
    manager.list_for_owner(&session.user_id).map(Json)
}

async fn get_deployment(
    session: Session,
    State(manager): State<GuardedDeploymentManager>,
    Path(id): Path<String>,
) -> MarketplaceResult<Json<Deployment>> {
    manager.get(parse_id(&id)?, &session.user_id).map(Json)
}

async fn create_deployment(
    session: Session,
    State(manager): State<GuardedDeploymentManager>,
    body: Result<Json<CreateDeploymentBody>, JsonRejection>,
) -> MarketplaceResult<Json<Deployment>> {
    let Json(body) = body.map_err(|err| {
        debug!("Rejected deployment body: {}", err);
        MarketplaceError::invalid("Invalid request data")
    })?;
    manager
        .create(
            &session.user_id,
            body.mcp_id,
            body.env_vars.unwrap_or_default(),
        )
        .map(Json)
}

async fn update_status(
    session: Session,
    State(manager): State<GuardedDeploymentManager>,
    Path(id): Path<String>,
    body: Result<Json<UpdateStatusBody>, JsonRejection>,
) -> MarketplaceResult<Json<Value>> {
    let id = parse_id(&id)?;
    let Json(body) = body.map_err(|_| MarketplaceError::invalid("Invalid status"))?;
    manager.set_status(id, &session.user_id, &body.status)?;
    Ok(message("Status updated successfully"))
}

async fn update_env_vars(
    session: Session,
    State(manager): State<GuardedDeploymentManager>,
    Path(id): Path<String>,
    body: Result<Json<UpdateEnvVarsBody>, JsonRejection>,
) -> MarketplaceResult<Json<Value>> {
    let id = parse_id(&id)?;
    let Json(body) =
        body.map_err(|_| MarketplaceError::invalid("Invalid environment variables"))?;
    manager.set_config(id, &session.user_id, &body.env_vars)?;
    Ok(message("Environment variables updated successfully"))
}

async fn delete_deployment(
    session: Session,
    State(manager): State<GuardedDeploymentManager>,
    Path(id): Path<String>,
) -> MarketplaceResult<Json<Value>> {
    manager.delete(parse_id(&id)?, &session.user_id)?;
    Ok(message("Deployment deleted successfully"))
}

pub fn make_deployment_routes(state: ServerState) -> Router {
    Router::new()
        .route("/", get(list_deployments).post(create_deployment))
        .route("/{id}", get(get_deployment).delete(delete_deployment))
        .route("/{id}/status", patch(update_status))
        .route("/{id}/env-vars", patch(update_env_vars))
        .with_state(state)
}

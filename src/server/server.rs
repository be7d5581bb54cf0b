use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use tracing::{debug, error, info};

use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::services::ServeDir;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::catalog_routes::make_catalog_routes;
use super::deployment_routes::make_deployment_routes;
use super::metrics::{metrics_handler, record_login_attempt};
use super::session::{Session, COOKIE_SESSION_TOKEN_KEY};
use super::{log_requests, state::*, ServerConfig};
use crate::error::{MarketplaceError, MarketplaceResult};
use crate::user::auth::AuthTokenValue;
use crate::user::{User, UserManager};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerStats {
    pub uptime: String,
    pub version: String,
    pub deployments: BTreeMap<String, usize>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize)]
struct LoginBody {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let deployments = match state.deployment_manager.count_by_status() {
        Ok(counts) => counts
            .into_iter()
            .map(|(status, count)| (status.to_string(), count))
            .collect(),
        Err(err) => {
            error!("Failed to count deployments: {:#}", err);
            BTreeMap::new()
        }
    };
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: state.version.clone(),
        deployments,
    })
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> MarketplaceResult<Response> {
    let Json(body) = body.map_err(|_| MarketplaceError::invalid("Invalid request data"))?;
    debug!("login() called for {}", body.email);

    let start = Instant::now();
    let locked_manager = user_manager.lock().unwrap();
    let user_id = match locked_manager.verify_password(&body.email, &body.password) {
        Ok(Some(user_id)) => user_id,
        Ok(None) => {
            record_login_attempt(false, start.elapsed());
            return Err(MarketplaceError::Unauthorized);
        }
        Err(err) => {
            record_login_attempt(false, start.elapsed());
            return Err(err.context("Failed to log in").into());
        }
    };

    let auth_token = locked_manager
        .generate_auth_token(&user_id)
        .context("Failed to log in")?;
    record_login_attempt(true, start.elapsed());
    info!("User {} logged in", user_id);

    let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, auth_token.value.0.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(LoginSuccessResponse {
            token: auth_token.value.0,
        }),
    )
        .into_response())
}

async fn logout(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
) -> MarketplaceResult<Response> {
    user_manager
        .lock()
        .unwrap()
        .delete_auth_token(&session.user_id, &AuthTokenValue(session.token))
        .context("Failed to log out")?;

    let cookie = Cookie::build((COOKIE_SESSION_TOKEN_KEY, ""))
        .path("/")
        .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1))
        .same_site(SameSite::Lax)
        .build();

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({ "message": "Logged out successfully" })),
    )
        .into_response())
}

async fn get_current_user(
    State(user_manager): State<GuardedUserManager>,
    session: Session,
) -> MarketplaceResult<Json<User>> {
    user_manager
        .lock()
        .unwrap()
        .get_user(&session.user_id)
        .context("Failed to fetch user")?
        .map(Json)
        .ok_or_else(|| MarketplaceError::not_found("User not found"))
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        catalog_store: GuardedCatalogStore,
        deployment_manager: GuardedDeploymentManager,
        user_manager: UserManager,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            catalog_store,
            deployment_manager,
            user_manager: Arc::new(Mutex::new(user_manager)),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

pub fn make_app(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    deployment_manager: GuardedDeploymentManager,
    user_manager: UserManager,
) -> Router {
    let state = ServerState::new(
        config.clone(),
        catalog_store,
        deployment_manager,
        user_manager,
    );

    let auth_routes: Router = Router::new()
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/user", get(get_current_user))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new().route("/", get(home)).with_state(state.clone()),
    };

    home_router
        .nest("/api", make_catalog_routes(state.clone()))
        .nest("/api/auth", auth_routes)
        .nest("/api/deployments", make_deployment_routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
    }
    info!("Shutting down...");
}

pub async fn run_server(
    config: ServerConfig,
    catalog_store: GuardedCatalogStore,
    deployment_manager: GuardedDeploymentManager,
    user_manager: UserManager,
) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, catalog_store, deployment_manager, user_manager);

    let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server failed: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);
    Ok(axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?)
}

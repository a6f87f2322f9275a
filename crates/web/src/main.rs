use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use control::{ChannelBroadcaster, DomainEvent, TimerConfig};
use storage::{Database, MemoryStore, RecordStore};
use tokio::sync::broadcast::{self, error::RecvError};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod state;

use config::Config;
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::attempts::handlers::declare_attempt,
        features::attempts::handlers::get_attempt,
        features::attempts::handlers::list_athlete_attempts,
        features::attempts::handlers::record_decision,
        features::attempts::handlers::record_quick_decision,
        features::attempts::handlers::override_decision,
        features::attempts::handlers::change_attempt_weight,
        features::weight_changes::handlers::request_change,
        features::weight_changes::handlers::list_changes,
        features::weight_changes::handlers::get_effective_weight,
        features::lifting_order::handlers::get_lifting_order,
        features::lifting_order::handlers::get_lifting_positions,
        features::standings::handlers::get_standings,
        features::timer::handlers::get_timer,
        features::timer::handlers::start_timer,
        features::timer::handlers::pause_timer,
        features::timer::handlers::reset_timer,
        features::timer::handlers::apply_preset,
        features::timer::handlers::dispose_timer,
    ),
    components(
        schemas(
            storage::dto::attempt::DeclareAttemptRequest,
            storage::dto::attempt::RefereeDecisionRequest,
            storage::dto::attempt::QuickDecisionRequest,
            storage::dto::attempt::JuryOverrideRequest,
            storage::dto::attempt::ChangeAttemptWeightRequest,
            storage::dto::weight_change::CreateWeightChangeRequest,
            storage::dto::weight_change::EffectiveWeightResponse,
            storage::dto::timer::StartTimerRequest,
            storage::dto::timer::ResetTimerRequest,
            storage::dto::timer::ApplyPresetRequest,
            storage::models::Attempt,
            storage::models::AttemptResult,
            storage::models::Decision,
            storage::models::RefereeCall,
            storage::models::RefereePosition,
            storage::models::LiftType,
            storage::models::Medal,
            storage::models::TimerMode,
            storage::models::TimerPreset,
            storage::models::WeightChangeRequest,
            control::LiftingOrderEntry,
            control::LiftingPositions,
            control::StandingsEntry,
            control::TimerHint,
            control::TimerSnapshot,
            control::timer::ClockRule,
            features::attempts::services::DeclarationResponse,
        )
    ),
    tags(
        (name = "attempts", description = "Attempt declaration, referee and jury decisions"),
        (name = "weight-changes", description = "Raises of declared weights"),
        (name = "lifting-order", description = "Who lifts next"),
        (name = "standings", description = "Session results"),
        (name = "timer", description = "Session attempt clock"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

fn app(state: AppState, api_keys: ApiKeys) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", features::api_routes(api_keys))
        .layer(cors)
        .with_state(state)
}

/// Logs every domain event. Ticks go to debug to keep the log readable.
fn spawn_event_logger(mut events: broadcast::Receiver<DomainEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let payload = serde_json::to_string(&event).unwrap_or_default();
                    if matches!(event, DomainEvent::TimerTick(_)) {
                        tracing::debug!(session_id = %event.session_id(), "{}", payload);
                    } else {
                        tracing::info!(
                            event_type = event.event_type(),
                            session_id = %event.session_id(),
                            "{}",
                            payload
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn RecordStore>> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set, records are kept in memory");
        return Ok(Arc::new(MemoryStore::new()));
    };

    tracing::info!(
        "Connecting to database at: {}",
        database_url.split('@').next_back().unwrap_or("unknown")
    );
    let db = Database::new(database_url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    Ok(Arc::new(db))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting competition control API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let store = open_store(&config).await?;

    let events = Arc::new(ChannelBroadcaster::default());
    spawn_event_logger(events.subscribe());

    let timer_config = TimerConfig::default().with_tick_period(config.timer_tick);
    let state = AppState::new(store, events, timer_config);

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, every mutating route will answer 401");
    }

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    axum::serve(listener, app(state, api_keys))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use control::InMemoryBroadcaster;
    use storage::models::Session;
    use tower::ServiceExt;

    async fn test_app() -> (Router, Session) {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new("Women 55 A");
        store.insert_session(&session).await.unwrap();
        let state = AppState::new(store, Arc::new(InMemoryBroadcaster::new()), TimerConfig::default());
        (app(state, ApiKeys::from_comma_separated("secret")), session)
    }

    fn start_request(session: &Session, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(format!("/api/sessions/{}/timer/start", session.session_id))
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(r#"{"duration": 60}"#)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutating_route_requires_api_key() {
        let (app, session) = test_app().await;

        let response = app
            .clone()
            .oneshot(start_request(&session, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(start_request(&session, Some("wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(start_request(&session, Some("secret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let snapshot: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(snapshot["running"], true);
        assert_eq!(snapshot["max_secs"], 60);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_routes_are_public() {
        let (app, session) = test_app().await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/sessions/{}/timer", session.session_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!(
                        "/api/sessions/{}/lifting-order?lift_type=snatch",
                        session.session_id
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_attempt_is_404() {
        let (app, _session) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/attempts/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_openapi_lists_control_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/attempts"));
        assert!(doc.paths.paths.contains_key("/api/sessions/{session_id}/timer/preset"));
    }
}

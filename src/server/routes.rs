use crate::editor::check_and_sanitize_input;
use crate::models::{AgentFlowSpec, ChatSession, FlowConfig, GalleryItem, Message, ModelConfig, Skill};
use crate::server::files::ensure_user_dir;
use crate::server::model_test::test_model;
use crate::server::protocol::*;
use crate::server::server::AppState;
use crate::store::{Entity, Filters};

use axum::{
    extract::{Json, Query, State},
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

/// Build all routes for the API.
pub fn build_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.server.cors_origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    let api = Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Skills
        .route("/skills", get(list_handler::<Skill>).post(create_handler::<Skill>))
        .route("/skills/delete", delete(delete_handler::<Skill>))
        // Models
        .route("/models", get(list_handler::<ModelConfig>).post(create_handler::<ModelConfig>))
        .route("/models/test", post(model_test_handler))
        .route("/models/delete", delete(delete_handler::<ModelConfig>))
        // Agents
        .route("/agents", get(list_handler::<AgentFlowSpec>).post(create_agent_handler))
        .route("/agents/delete", delete(delete_handler::<AgentFlowSpec>))
        // Workflows
        .route("/workflows", get(list_handler::<FlowConfig>).post(create_workflow_handler))
        .route("/workflows/delete", delete(delete_handler::<FlowConfig>))
        // Sessions
        .route(
            "/sessions",
            get(list_handler::<ChatSession>).post(create_handler::<ChatSession>),
        )
        .route("/sessions/delete", delete(delete_handler::<ChatSession>))
        // Messages
        .route("/messages", get(list_messages_handler).post(create_message_handler))
        // Gallery
        .route(
            "/gallery",
            get(list_handler::<GalleryItem>).post(create_handler::<GalleryItem>),
        )
        .route("/gallery/delete", delete(delete_handler::<GalleryItem>))
        // Generated files, one folder per user
        .nest_service("/files", ServeDir::new(&state.files_root));

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn allowed_origins(origins: &[String]) -> AllowOrigin {
    let values: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(_) if o.trim() == "*" => {
                warn!("Ignoring wildcard CORS origin; credentials require explicit origins");
                None
            }
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    AllowOrigin::list(values)
}

// ============================================================================
// Health
// ============================================================================

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime,
    })
}

async fn version_handler(State(state): State<AppState>) -> Json<Status> {
    Json(Status::success(
        "Version retrieved successfully",
        json!({ "version": state.version }),
    ))
}

// ============================================================================
// Shared CRUD
// ============================================================================

const MISSING_USER: &str = "user_id is required";

/// Filters for rows owned by `user_id`, or `None` when no owner was given.
fn owner_filters(user_id: Option<&str>) -> Option<Filters> {
    user_id
        .filter(|u| !u.trim().is_empty())
        .map(Filters::user)
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    user_id: String,
}

/// Target of a delete. The id parameter is named after the entity
/// (`skill_id`, `model_id`, ...).
#[derive(Debug, Default, Deserialize)]
struct DeleteQuery {
    #[serde(
        alias = "skill_id",
        alias = "model_id",
        alias = "agent_id",
        alias = "workflow_id",
        alias = "session_id",
        alias = "gallery_id"
    )]
    id: Option<i64>,
    #[serde(default)]
    user_id: String,
}

fn list_entities<E: Entity>(state: &AppState, filters: &Filters) -> Status {
    match state.db.get::<E>(filters) {
        Ok(rows) => Status::with_data(format!("{} retrieved successfully", E::KIND), &rows),
        Err(e) => Status::failure(format!(
            "Error occurred while retrieving {}: {}",
            E::KIND,
            e
        )),
    }
}

fn create_failure<E: Entity>(reason: impl std::fmt::Display) -> Status {
    Status::failure(format!("Error occurred while creating {}: {}", E::KIND, reason))
}

/// Upsert `entity` and answer with the refreshed rows matching `refresh`.
///
/// Rows may only be overwritten by their owner.
fn upsert_entity<E: Entity>(state: &AppState, entity: &E, refresh: &Filters) -> Status {
    if let Some(id) = entity.id() {
        match state.db.get_by_id::<E>(id) {
            Ok(Some(existing)) if existing.user_id() != entity.user_id() => {
                warn!("Refusing to overwrite {} {} owned by another user", E::KIND, id);
                return create_failure::<E>(format!("{} {} belongs to another user", E::KIND, id));
            }
            Ok(_) => {}
            Err(e) => return create_failure::<E>(e),
        }
    }

    let outcome = match state.db.upsert(entity) {
        Ok((_, outcome)) => outcome,
        Err(e) => return create_failure::<E>(e),
    };

    match state.db.get::<E>(refresh) {
        Ok(rows) => Status::with_data(format!("Success - {} {}", E::KIND, outcome), &rows),
        Err(e) => create_failure::<E>(e),
    }
}

/// Upsert `entity` on behalf of its owner and list the owner's rows.
fn create_owned<E: Entity>(state: &AppState, entity: &E) -> Status {
    match owner_filters(entity.user_id()) {
        Some(refresh) => upsert_entity(state, entity, &refresh),
        None => create_failure::<E>(MISSING_USER),
    }
}

fn decode_body<E: Entity>(body: serde_json::Value) -> Result<E, Status> {
    serde_json::from_value(body).map_err(|e| {
        debug!("Rejected {} payload: {}", E::KIND, e);
        create_failure::<E>(e)
    })
}

async fn list_handler<E: Entity>(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Status> {
    Json(match owner_filters(Some(&query.user_id)) {
        Some(filters) => list_entities::<E>(&state, &filters),
        None => Status::failure(format!(
            "Error occurred while retrieving {}: {}",
            E::KIND,
            MISSING_USER
        )),
    })
}

async fn create_handler<E: Entity>(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Json<Status> {
    let entity: E = match decode_body(body) {
        Ok(entity) => entity,
        Err(status) => return Json(status),
    };
    Json(create_owned(&state, &entity))
}

async fn delete_handler<E: Entity>(
    State(state): State<AppState>,
    Query(query): Query<DeleteQuery>,
) -> Json<Status> {
    let deleting_failure = |reason: &dyn std::fmt::Display| {
        Json(Status::failure(format!(
            "Error occurred while deleting {}: {}",
            E::KIND,
            reason
        )))
    };

    let Some(owner) = owner_filters(Some(&query.user_id)) else {
        return deleting_failure(&MISSING_USER);
    };
    let Some(id) = query.id else {
        return deleting_failure(&"missing id");
    };

    let outcome = match state.db.delete::<E>(&owner.clone().with_id(id)) {
        Ok(outcome) => outcome,
        Err(e) => return deleting_failure(&e),
    };
    info!("Delete {} {}: {}", E::KIND, id, outcome);

    match state.db.get::<E>(&owner) {
        Ok(rows) => Json(Status::with_data(
            format!("Success - {} {}", E::KIND, outcome),
            &rows,
        )),
        Err(e) => deleting_failure(&e),
    }
}

// ============================================================================
// Agents & workflows
// ============================================================================

async fn create_agent_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Json<Status> {
    let agent: AgentFlowSpec = match decode_body(body) {
        Ok(agent) => agent,
        Err(status) => return Json(status),
    };

    let check = check_and_sanitize_input(agent.name());
    if !check.status {
        warn!(
            "Agent name '{}' is not a valid identifier (suggested '{}')",
            agent.name(),
            check.sanitized
        );
    }

    Json(create_owned(&state, &agent))
}

async fn create_workflow_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Json<Status> {
    let workflow: FlowConfig = match decode_body(body) {
        Ok(workflow) => workflow,
        Err(status) => return Json(status),
    };

    if !workflow.receiver_matches_type() {
        warn!(
            "Workflow '{}' declares type {} but its receiver is {}",
            workflow.name,
            workflow.kind,
            if workflow.receiver.is_group_chat() {
                "a group chat"
            } else {
                "a single agent"
            }
        );
    }

    Json(create_owned(&state, &workflow))
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct MessageQuery {
    #[serde(default)]
    user_id: String,
    session_id: Option<i64>,
}

impl MessageQuery {
    fn filters(&self) -> Option<Filters> {
        let filters = owner_filters(Some(&self.user_id))?;
        Some(match self.session_id {
            Some(session_id) => filters.with_session(session_id),
            None => filters,
        })
    }
}

async fn list_messages_handler(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Json<Status> {
    Json(match query.filters() {
        Some(filters) => list_entities::<Message>(&state, &filters),
        None => Status::failure(format!(
            "Error occurred while retrieving Message: {}",
            MISSING_USER
        )),
    })
}

async fn create_message_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Json<Status> {
    let message: Message = match decode_body(body) {
        Ok(message) => message,
        Err(status) => return Json(status),
    };

    let Some(mut refresh) = owner_filters(Some(&message.user_id)) else {
        return Json(create_failure::<Message>(MISSING_USER));
    };
    if let Some(session_id) = message.session_id {
        refresh = refresh.with_session(session_id);
    }

    match ensure_user_dir(&state.files_root, &message.user_id) {
        Ok(dir) => debug!("User folder ready at {}", dir.display()),
        Err(e) => return Json(create_failure::<Message>(e)),
    }

    Json(upsert_entity(&state, &message, &refresh))
}

// ============================================================================
// Model test
// ============================================================================

async fn model_test_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Json<Status> {
    let model: ModelConfig = match serde_json::from_value(body) {
        Ok(model) => model,
        Err(e) => {
            return Json(Status::failure(format!(
                "Error occurred while testing model: {}",
                e
            )))
        }
    };

    Json(match test_model(&state.http, &model).await {
        Ok(reply) => Status::success("Model tested successfully", json!(reply)),
        Err(e) => {
            warn!("Model test for '{}' failed: {}", model.model, e);
            Status::failure(format!("Error occurred while testing model: {}", e))
        }
    })
}

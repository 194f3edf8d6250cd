use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use feedless_core::store::LogWriter;
use feedless_core::{EntryFilter, Queries};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::commands::{self, CliCommand, PublishRequest, VanishRequest};
use super::protocol::ApiResponse;

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub queries: Queries,
    pub writer: Arc<dyn LogWriter>,
}

type Reply = (StatusCode, Json<ApiResponse>);

#[derive(Debug, Deserialize)]
struct FriendshipParams {
    source: Option<String>,
    dest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/profiles/:id", get(profile))
        .route("/v1/profiles/:id/posts", get(posts))
        .route("/v1/profiles/:id/vanishing", get(vanishing))
        .route("/v1/profiles/:id/friends", get(friends))
        .route("/v1/friendship", get(friendship))
        .route("/v1/search", get(search))
        .route("/v1/entries", get(entries))
        .route("/v1/publish", post(publish))
        .route("/v1/vanish", post(vanish))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the JSON API server
pub async fn run_server(bind_addr: &str, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("API server listening on http://{}/v1", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn status_for(code: &str) -> StatusCode {
    match code {
        "bad_request" | "invalid_record" => StatusCode::BAD_REQUEST,
        "profile_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
        "graph_lookup_failure" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reply(response: ApiResponse) -> Reply {
    let status = response.error_code().map_or(StatusCode::OK, status_for);
    (status, Json(response))
}

async fn run(state: &AppState, command: CliCommand) -> Reply {
    reply(command.execute(&state.queries).await)
}

async fn profile(Path(id): Path<String>, State(state): State<AppState>) -> Reply {
    run(&state, CliCommand::Profile { id }).await
}

async fn posts(Path(id): Path<String>, State(state): State<AppState>) -> Reply {
    run(&state, CliCommand::Posts { id }).await
}

async fn vanishing(Path(id): Path<String>, State(state): State<AppState>) -> Reply {
    run(&state, CliCommand::Vanishing { id }).await
}

async fn friends(Path(id): Path<String>, State(state): State<AppState>) -> Reply {
    run(&state, CliCommand::Friends { id }).await
}

async fn friendship(Query(params): Query<FriendshipParams>, State(state): State<AppState>) -> Reply {
    match (params.source, params.dest) {
        (Some(source), Some(dest)) => run(&state, CliCommand::Status { source, dest }).await,
        _ => reply(ApiResponse::bad_request("source and dest are required")),
    }
}

async fn search(Query(params): Query<SearchParams>, State(state): State<AppState>) -> Reply {
    match params.q {
        Some(query) => run(&state, CliCommand::Search { query }).await,
        None => reply(ApiResponse::bad_request("q is required")),
    }
}

async fn entries(Query(filter): Query<EntryFilter>, State(state): State<AppState>) -> Reply {
    run(&state, CliCommand::Entries { filter }).await
}

async fn publish(
    State(state): State<AppState>,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> Reply {
    match payload {
        Ok(Json(request)) => reply(commands::publish(state.writer.as_ref(), request).await),
        Err(rejection) => reply(ApiResponse::bad_request(&rejection.body_text())),
    }
}

async fn vanish(
    State(state): State<AppState>,
    payload: Result<Json<VanishRequest>, JsonRejection>,
) -> Reply {
    match payload {
        Ok(Json(request)) => reply(commands::vanish(state.writer.as_ref(), request).await),
        Err(rejection) => reply(ApiResponse::bad_request(&rejection.body_text())),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use feedless_core::models::LogRecord;
    use feedless_core::store::MemoryLog;
    use feedless_core::CoreConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn record(key: &str, author: &str, ts: i64, content: Value) -> LogRecord {
        serde_json::from_value(json!({
            "key": key,
            "value": { "author": author, "sequence": 1, "timestamp": ts, "content": content }
        }))
        .unwrap()
    }

    fn app(records: Vec<LogRecord>) -> Router {
        let log = Arc::new(MemoryLog::with_records(records));
        router(AppState {
            queries: Queries::from_backend(log.clone(), &CoreConfig::new("unused")),
            writer: log,
        })
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_profile_route() {
        let app = app(vec![record(
            "%1",
            "@alice",
            1,
            json!({ "type": "about", "about": "@alice", "name": "Alice" }),
        )]);
        let (status, body) = call(app, get("/v1/profiles/@alice")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "schemaVersion": 1, "data": { "id": "@alice", "name": "Alice" } })
        );
    }

    #[tokio::test]
    async fn test_friendship_route() {
        let app = app(vec![
            record("%1", "@b", 1, json!({ "type": "contact", "contact": "@a", "following": true })),
            record("%2", "@a", 2, json!({ "type": "contact", "contact": "@b", "following": false })),
        ]);
        let (status, body) = call(app, get("/v1/friendship?source=@a&dest=@b")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "request_rejected");
    }

    #[tokio::test]
    async fn test_missing_params_are_bad_requests() {
        let (status, body) = call(app(vec![]), get("/v1/friendship?source=@a")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "bad_request");

        let (status, _) = call(app(vec![]), get("/v1/search")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_entries_route_filters() {
        let app = app(vec![
            record("%1", "@a", 1, json!({ "type": "post", "text": "one" })),
            record("%2", "@a", 2, json!({ "type": "contact", "contact": "@b", "following": true })),
            record("%3", "@b", 3, json!({ "type": "post", "text": "three" })),
        ]);
        let (status, body) = call(app, get("/v1/entries?author=@a&type=post")).await;

        assert_eq!(status, StatusCode::OK);
        let keys: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["key"].as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["%1"]);
    }

    #[tokio::test]
    async fn test_publish_then_read_wall() {
        let log = Arc::new(MemoryLog::new());
        let app = router(AppState {
            queries: Queries::from_backend(log.clone(), &CoreConfig::new("unused")),
            writer: log,
        });

        let (status, body) = call(
            app.clone(),
            post_json("/v1/publish", json!({ "author": "@me", "text": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = call(app, get("/v1/profiles/@me/posts")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["value"]["content"]["text"], "hello");
        assert_eq!(body["data"][0]["authorProfile"]["id"], "@me");
    }

    #[tokio::test]
    async fn test_malformed_publish_body() {
        let (status, body) = call(app(vec![]), post_json("/v1/publish", json!({ "text": 1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["schemaVersion"], 1);
        assert_eq!(body["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_vanish_route_takes_key_list() {
        let app = app(vec![
            record("%1", "@me", 1, json!({ "type": "post", "text": "one" })),
            record("%2", "@me", 2, json!({ "type": "post", "text": "two" })),
        ]);

        let (status, body) = call(
            app.clone(),
            post_json("/v1/vanish", json!({ "author": "@me", "keys": ["%1", "%2"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["value"]["content"]["dest"], "%1");
        assert_eq!(body["data"][1]["value"]["content"]["dest"], "%2");

        let (_, body) = call(app, get("/v1/profiles/@me/posts")).await;
        assert_eq!(body["data"], json!([]));
    }
}

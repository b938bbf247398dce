//! Axum router configuration with middleware.
//!
//! All API routes are under `/api/v1/`; `/health` stays unauthenticated.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Personas
        .route(
            "/users/{user}/personas",
            get(handlers::persona::list_personas)
                .post(handlers::persona::create_persona)
                .delete(handlers::persona::delete_all_personas),
        )
        .route(
            "/users/{user}/personas/defaults",
            post(handlers::persona::load_defaults),
        )
        .route(
            "/users/{user}/personas/{name}",
            delete(handlers::persona::delete_persona),
        )
        .route(
            "/users/{user}/personas/{name}/toggle",
            post(handlers::persona::toggle_persona),
        )
        // Conversations
        .route(
            "/users/{user}/simulations",
            post(handlers::conversation::run_simulation),
        )
        .route("/users/{user}/ask", post(handlers::conversation::ask))
        // Settings
        .route(
            "/users/{user}/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_parameters),
        )
        .route(
            "/users/{user}/settings/model",
            put(handlers::settings::set_model),
        )
        .route(
            "/users/{user}/settings/system-prompt",
            put(handlers::settings::set_system_prompt),
        )
        // Channels and events
        .route(
            "/channels/{channel}/cleanup",
            post(handlers::channel::cleanup),
        )
        .route("/events/message", post(handlers::events::message_created));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Secrets;
    use agora_types::config::AppConfig;
    use secrecy::SecretString;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    async fn spawn(dir: &TempDir, api_key: Option<&str>) -> String {
        let config = AppConfig {
            // Nothing listens here; model discovery falls back.
            ollama_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..AppConfig::default()
        };
        let secrets = Secrets {
            api_key: api_key.map(|k| SecretString::from(k.to_string())),
            ..Secrets::default()
        };
        let state = AppState::build(dir.path().to_path_buf(), config, secrets).unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_health() {
        let dir = TempDir::new().unwrap();
        let base = spawn(&dir, None).await;
        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_persona_lifecycle() {
        let dir = TempDir::new().unwrap();
        let base = spawn(&dir, None).await;
        let client = reqwest::Client::new();
        let personas = format!("{base}/api/v1/users/42/personas");

        let body: Value = client.get(&personas).send().await.unwrap().json().await.unwrap();
        assert_eq!(body["data"].as_array().unwrap().len(), 6);

        let resp = client
            .post(&personas)
            .json(&json!({"name": "chef", "personality": "Talks about food."}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let resp = client
            .post(&personas)
            .json(&json!({"name": "chef", "personality": "Again."}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["errors"][0]["code"], "PERSONA_EXISTS");
        assert_eq!(body["errors"][0]["title"], "Agent Already Exists");

        let body: Value = client
            .post(format!("{personas}/chef/toggle"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["data"]["active"], false);

        let resp = client.delete(format!("{personas}/missing")).send().await.unwrap();
        assert_eq!(resp.status(), 404);

        let body: Value = client.delete(&personas).send().await.unwrap().json().await.unwrap();
        assert_eq!(body["data"]["deleted"], 7);
    }

    #[tokio::test]
    async fn test_settings_update() {
        let dir = TempDir::new().unwrap();
        let base = spawn(&dir, None).await;
        let client = reqwest::Client::new();

        let body: Value = client
            .put(format!("{base}/api/v1/users/7/settings"))
            .json(&json!({"temperature": 1.5}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["data"]["temperature"], 1.5);
        assert_eq!(body["data"]["top_k"], 40);
    }

    #[tokio::test]
    async fn test_api_key_required_when_configured() {
        let dir = TempDir::new().unwrap();
        let base = spawn(&dir, Some("s3cret")).await;
        let client = reqwest::Client::new();
        let url = format!("{base}/api/v1/users/1/personas");

        assert_eq!(client.get(&url).send().await.unwrap().status(), 401);
        let resp = client.get(&url).bearer_auth("s3cret").send().await.unwrap();
        assert_eq!(resp.status(), 200);
        // Health stays open.
        assert_eq!(client.get(format!("{base}/health")).send().await.unwrap().status(), 200);
    }

    #[tokio::test]
    async fn test_invalid_channel_is_rejected() {
        let dir = TempDir::new().unwrap();
        let base = spawn(&dir, None).await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/v1/channels/general/cleanup"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }
}

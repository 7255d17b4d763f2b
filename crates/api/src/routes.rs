use crate::handlers;
use crate::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Generic lookup tables
        .route("/api/meta", get(handlers::lookup::list_tables))
        .route(
            "/api/meta/:key",
            get(handlers::lookup::list_rows).post(handlers::lookup::create_row),
        )
        .route(
            "/api/meta/:key/:id",
            get(handlers::lookup::get_row).put(handlers::lookup::update_row),
        )
        // Roles and grants
        .route(
            "/api/roles",
            get(handlers::roles::list_roles).post(handlers::roles::create_role),
        )
        .route("/api/roles/:id", put(handlers::roles::update_role))
        .route(
            "/api/roles/:id/permissions",
            get(handlers::roles::list_role_permissions).post(handlers::roles::grant_role_permissions),
        )
        .route(
            "/api/roles/:id/permissions/:permission_id",
            delete(handlers::roles::revoke_role_permission),
        )
        .route("/api/roles/:id/sidebars", get(handlers::roles::list_role_sidebars))
        // Permission catalog and navigation
        .route("/api/permissions", get(handlers::permissions::list_permissions))
        .route("/api/permission-groups", get(handlers::permissions::list_groups))
        .route(
            "/api/permission-groups/:action/permissions",
            get(handlers::permissions::list_group_permissions),
        )
        .route("/api/sidebars", get(handlers::permissions::list_sidebars))
        // Users
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/:id/roles",
            get(handlers::users::list_user_roles).post(handlers::users::assign_user_roles),
        )
        .route("/api/users/:id/roles/:role_id", delete(handlers::users::revoke_user_role))
        .route("/api/users/:id/permissions", get(handlers::users::list_user_permissions))
        .route(
            "/api/users/:id/permissions/check",
            get(handlers::users::check_user_permission),
        )
        .route("/api/users/:id/sidebars", get(handlers::users::list_user_sidebars))
        .route("/api/users/:id/status", put(handlers::users::update_user_status))
        // Community content
        .route(
            "/api/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        .route("/api/posts/:id", get(handlers::posts::get_post))
        .route("/api/posts/:id/media", post(handlers::posts::add_post_media))
        .route("/api/posts/:id/status", put(handlers::posts::update_post_status))
        .route(
            "/api/jobs",
            get(handlers::jobs::list_jobs).post(handlers::jobs::create_job),
        )
        .route("/api/jobs/:id", get(handlers::jobs::get_job))
        .route("/api/jobs/:id/status", put(handlers::jobs::update_job_status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use civic_database::{Database, DatabaseConfig};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    // Requests below are rejected before any query runs, so the pool never connects.
    fn app() -> Router {
        let db = Database::new_lazy(DatabaseConfig {
            min_connections: 0,
            ..Default::default()
        })
        .unwrap();
        create_router(Arc::new(AppState::new(db, civic_models::SYSTEM_ACTOR_ID)))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_unreachable_database() {
        let db = Database::new_lazy(DatabaseConfig {
            url: "postgresql://civic@127.0.0.1:1/civic_admin".to_string(),
            min_connections: 0,
            connect_timeout: std::time::Duration::from_millis(200),
            ..Default::default()
        })
        .unwrap();
        let app = create_router(Arc::new(AppState::new(db, civic_models::SYSTEM_ACTOR_ID)));

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["database"], "down");
    }

    #[tokio::test]
    async fn test_lists_registered_tables() {
        let (status, body) = send(get("/api/meta")).await;
        assert_eq!(status, StatusCode::OK);

        let tables = body.as_array().unwrap();
        assert_eq!(tables.len(), 18);
        assert!(tables.iter().any(|t| t["key"] == "boothNumber"));
    }

    #[tokio::test]
    async fn test_unknown_lookup_key_is_not_found() {
        let (status, body) = send(get("/api/meta/planetOfOrigin")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = send(get("/api/meta/planetOfOrigin/3")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unsearchable_field_is_rejected() {
        let (status, body) = send(get("/api/meta/religion?field=created_by&search=1")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert!(body["message"].as_str().unwrap().contains("created_by"));

        for uri in [
            "/api/meta/religion?field=created_by&search=",
            "/api/meta/religion?field=created_by&search=%20%20",
            "/api/meta/religion?field=created_by",
        ] {
            let (status, _) = send(get(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_non_numeric_search_on_numeric_field() {
        let (status, _) = send(get("/api/meta/wardNumber?field=num&search=twelve")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_status_filter() {
        let (status, _) = send(get("/api/meta/district?status=archived")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(get("/api/posts?status=archived")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_lookup_payload_validation() {
        let (status, _) = send(json_request("POST", "/api/meta/religion", serde_json::json!({"colour": "red"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(json_request("POST", "/api/meta/boothNumber", serde_json::json!({"name": "Hall"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(json_request("PUT", "/api/meta/caste/4", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_group_action_must_be_wildcard() {
        let (status, _) = send(get("/api/permission-groups/posts/permissions")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_request_validation() {
        let (status, _) = send(json_request("POST", "/api/users/1/roles", serde_json::json!({"role_ids": []}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(json_request("PUT", "/api/posts/1/status", serde_json::json!({"status": 5}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(json_request(
            "POST",
            "/api/jobs",
            serde_json::json!({
                "user_id": 1,
                "submitted_for": "others",
                "applicant_name": "Ravi",
                "applicant_contact_number": "12-34"
            }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

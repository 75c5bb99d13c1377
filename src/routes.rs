use crate::{
    notification::{
        notification_dto::{NotificationListResponse, RecentNotificationResponse},
        notification_handlers, notification_routes, NotificationView,
    },
    state::AppState,
    task::{
        task_dto::{CreateTaskRequest, TaskListResponse, UpdateTaskRequest},
        task_handlers,
        task_models::TaskStatus,
        task_routes, Task,
    },
};
use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        task_handlers::get_my_tasks,
        task_handlers::create_task,
        task_handlers::update_task,
        task_handlers::delete_task,
        task_handlers::get_my_notifications,
        notification_handlers::health,
        notification_handlers::get_notifications,
        notification_handlers::get_recent_notification,
        notification_handlers::get_user_notifications,
    ),
    components(
        schemas(
            CreateTaskRequest,
            UpdateTaskRequest,
            TaskListResponse,
            Task,
            TaskStatus,
            NotificationView,
            NotificationListResponse,
            RecentNotificationResponse,
        )
    ),
    tags(
        (name = "tasks", description = "Task management endpoints"),
        (name = "notifications", description = "Notification read endpoints")
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
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            )
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest("/tasks", task_routes(state.clone()))
        .nest("/notifications", notification_routes());

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(notification_handlers::health))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::create_access_token,
        broker::MemoryBroker,
        notification::{
            notification_service::tests::event, Backoff, EventSubscriber, NotificationRepository,
            NotificationService,
        },
        state::{Config, NotificationBackend},
        notification::notification_service::tests::UnreachableStore,
        store::{KeyValueStore, MemoryStore},
        task::{
            task_event::TaskEventType, task_service::tests::InMemoryTaskRepository,
            EventPublisher, TaskService,
        },
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::{sync::Arc, time::Duration};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    const SECRET: &str = "router-test-secret";
    const CHANNEL: &str = "task_events";

    struct Harness {
        app: Router,
        broker: Arc<MemoryBroker>,
        notifications: NotificationService,
    }

    fn harness() -> Harness {
        harness_with_store(Arc::new(MemoryStore::new()))
    }

    fn harness_with_store(store: Arc<dyn KeyValueStore>) -> Harness {
        let broker = Arc::new(MemoryBroker::new());
        let notifications = NotificationService::new(NotificationRepository::new(store));
        let task_service = TaskService::new(
            Arc::new(InMemoryTaskRepository::default()),
            EventPublisher::new(broker.clone(), CHANNEL),
        );
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: String::new(),
            jwt_secret: SECRET.into(),
            notification_backend: NotificationBackend::Memory,
            redis_url: String::new(),
            task_events_channel: CHANNEL.into(),
            subscriber_backoff_min: Duration::from_millis(10),
            subscriber_backoff_max: Duration::from_millis(50),
        };
        let state = AppState {
            config: Arc::new(config),
            task_service,
            notification_service: notifications.clone(),
        };

        Harness {
            app: create_router(state),
            broker,
            notifications,
        }
    }

    fn bearer(user_id: i32) -> String {
        format!("Bearer {}", create_access_token(user_id, SECRET, 1).unwrap())
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let h = harness();
        let (status, body) = send(&h.app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn recent_on_empty_store_is_null_with_message() {
        let h = harness();
        let (status, body) = send(&h.app, get("/api/v1/notifications/recent")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["recent_notification"].is_null());
        assert_eq!(body["message"], "no recent notifications found");
    }

    #[tokio::test]
    async fn recent_honours_actor_header_and_query() {
        let h = harness();
        h.notifications
            .process_task_event(&event(TaskEventType::TaskCreated, 2, 10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        h.notifications
            .process_task_event(&event(TaskEventType::TaskUpdated, 3, 11))
            .await
            .unwrap();

        let (_, global) = send(&h.app, get("/api/v1/notifications/recent")).await;
        assert_eq!(global["recent_notification"]["action"], "task_updated");

        let req = Request::builder()
            .uri("/api/v1/notifications/recent")
            .header("x-userId", "10")
            .body(Body::empty())
            .unwrap();
        let (_, by_header) = send(&h.app, req).await;
        assert_eq!(by_header["recent_notification"]["action"], "task_created");

        let (_, by_query) = send(&h.app, get("/api/v1/notifications/recent?actor_id=10")).await;
        assert_eq!(by_query["recent_notification"]["assigned_to"], 2);

        let (_, unknown) = send(&h.app, get("/api/v1/notifications/recent?actor_id=77")).await;
        assert!(unknown["recent_notification"].is_null());
    }

    #[tokio::test]
    async fn user_route_picks_actor_recipient_or_all() {
        let h = harness();
        for (to, by) in [(2, 10), (2, 11), (3, 10)] {
            h.notifications
                .process_task_event(&event(TaskEventType::TaskCreated, to, by))
                .await
                .unwrap();
        }

        let (status, by_recipient) = send(&h.app, get("/api/v1/notifications/user/2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_recipient["count"], 2);

        let req = Request::builder()
            .uri("/api/v1/notifications/user/2")
            .header("x-userId", "10")
            .body(Body::empty())
            .unwrap();
        let (_, by_actor) = send(&h.app, req).await;
        assert_eq!(by_actor["count"], 2);
        let recipients: Vec<i64> = by_actor["notifications"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["assigned_to"].as_i64().unwrap())
            .collect();
        assert!(recipients.contains(&3));

        let (_, everything) = send(&h.app, get("/api/v1/notifications/user/abc")).await;
        assert_eq!(everything["count"], 3);
    }

    #[tokio::test]
    async fn malformed_limit_falls_back_to_default() {
        let h = harness();
        for _ in 0..3 {
            h.notifications
                .process_task_event(&event(TaskEventType::TaskCreated, 2, 10))
                .await
                .unwrap();
        }

        let (status, body) = send(&h.app, get("/api/v1/notifications?limit=abc")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 3);

        let (_, capped) = send(&h.app, get("/api/v1/notifications?limit=1")).await;
        assert_eq!(capped["count"], 1);

        let (_, out_of_range) = send(&h.app, get("/api/v1/notifications?limit=0")).await;
        assert_eq!(out_of_range["count"], 3);
    }

    #[tokio::test]
    async fn store_outage_returns_generic_error() {
        let h = harness_with_store(Arc::new(UnreachableStore));

        for uri in [
            "/api/v1/notifications",
            "/api/v1/notifications/recent",
            "/api/v1/notifications/user/2",
        ] {
            let response = h.app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", uri);

            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let text = String::from_utf8(bytes.to_vec()).unwrap();
            assert!(!text.to_lowercase().contains("redis"), "{}: {}", uri, text);
            assert!(!text.contains("refused"), "{}: {}", uri, text);

            let body: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(body, json!({ "error": "failed to retrieve notifications" }));
        }

        let req = Request::builder()
            .uri("/api/v1/tasks/notifications")
            .header(header::AUTHORIZATION, bearer(2))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "failed to retrieve notifications");
    }

    #[tokio::test]
    async fn task_routes_require_a_token() {
        let h = harness();
        let (status, body) = send(&h.app, get("/api/v1/tasks")).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let req = Request::builder()
            .uri("/api/v1/tasks")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_task_payload_is_rejected() {
        let h = harness();
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/tasks")
            .header(header::AUTHORIZATION, bearer(1))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": "", "assigned_to": 2 }).to_string()))
            .unwrap();
        let (status, _) = send(&h.app, req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn created_task_reaches_the_assignee() {
        let h = harness();
        let shutdown = CancellationToken::new();
        let subscriber = EventSubscriber::new(
            h.broker.clone(),
            h.notifications.clone(),
            CHANNEL,
            Backoff::new(Duration::from_millis(10), Duration::from_millis(50)),
        );
        let handle = tokio::spawn(subscriber.run(shutdown.clone()));
        while h.broker.subscriber_count(CHANNEL) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/tasks")
            .header(header::AUTHORIZATION, bearer(1))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "name": "Ship release", "assigned_to": 2 }).to_string(),
            ))
            .unwrap();
        let (status, task) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["assigned_by"], 1);

        let mut inbox = Value::Null;
        for _ in 0..100 {
            let req = Request::builder()
                .uri("/api/v1/tasks/notifications")
                .header(header::AUTHORIZATION, bearer(2))
                .body(Body::empty())
                .unwrap();
            let (_, body) = send(&h.app, req).await;
            if body["count"] == 1 {
                inbox = body;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(inbox["count"], 1);
        let notification = &inbox["notifications"][0];
        assert_eq!(notification["action"], "task_created");
        assert_eq!(notification["message"], "Task 'Ship release' assigned to user 2");

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn only_involved_users_may_delete() {
        let h = harness();
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/tasks")
            .header(header::AUTHORIZATION, bearer(1))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": "Audit", "assigned_to": 2 }).to_string()))
            .unwrap();
        let (_, task) = send(&h.app, req).await;
        let uri = format!("/api/v1/tasks/{}", task["id"]);

        let outsider = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header(header::AUTHORIZATION, bearer(9))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&h.app, outsider).await.0, StatusCode::FORBIDDEN);

        let assignee = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header(header::AUTHORIZATION, bearer(2))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&h.app, assignee).await.0, StatusCode::NO_CONTENT);

        let again = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .header(header::AUTHORIZATION, bearer(2))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&h.app, again).await.0, StatusCode::NOT_FOUND);
    }
}

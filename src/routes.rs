use crate::{
    notification::{
        notification_dto::{ScheduleNotificationRequest, SendNotificationRequest},
        notification_handlers as handlers,
        notification_models::{Notification, NotificationStatus},
    },
    state::AppState,
    subscription::subscription_dto::{SubscribeRequest, SubscribeResponse, SubscriptionKeysRequest},
};
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::subscribe,
        handlers::send_notification,
        handlers::schedule_notification,
        handlers::get_notifications,
        handlers::get_notification,
        handlers::delete_notification,
    ),
    components(
        schemas(
            SubscribeRequest,
            SubscriptionKeysRequest,
            SubscribeResponse,
            SendNotificationRequest,
            ScheduleNotificationRequest,
            Notification,
            NotificationStatus,
        )
    ),
    tags(
        (name = "notifications", description = "Push subscription and notification endpoints")
    )
)]
struct ApiDoc;

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let notification_routes = Router::new()
        .route("/", get(handlers::get_notifications))
        .route("/subscribe", post(handlers::subscribe))
        .route("/send", post(handlers::send_notification))
        .route("/schedule", post(handlers::schedule_notification))
        .route(
            "/:id",
            get(handlers::get_notification).delete(handlers::delete_notification),
        );

    let api_routes = Router::new().nest("/notifications", notification_routes);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

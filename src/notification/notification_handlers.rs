use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use super::{
    notification_dto::{ListNotificationsQuery, ScheduleNotificationRequest, SendNotificationRequest},
    notification_models::Notification,
};
use crate::{
    error::{AppError, Result},
    state::AppState,
    subscription::subscription_dto::{SubscribeRequest, SubscribeResponse},
};

/// Register a browser push subscription
#[utoipa::path(
    post,
    path = "/api/notifications/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 201, description = "Subscription created", body = SubscribeResponse),
        (status = 400, description = "Missing endpoint or keys")
    ),
    tag = "notifications"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let subscription = state
        .notification_service
        .subscribe(payload.user_id, &payload.endpoint, payload.keys.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubscribeResponse {
            id: subscription.id,
            user_id: subscription.user_id,
            endpoint: subscription.endpoint,
        }),
    ))
}

/// Send a push notification immediately
#[utoipa::path(
    post,
    path = "/api/notifications/send",
    request_body = SendNotificationRequest,
    responses(
        (status = 201, description = "Notification dispatched; status holds the delivery outcome", body = Notification),
        (status = 400, description = "Invalid request")
    ),
    tag = "notifications"
)]
pub async fn send_notification(
    State(state): State<AppState>,
    Json(payload): Json<SendNotificationRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let notification = state
        .notification_service
        .send_now(payload.user_id, &payload.title, &payload.description)
        .await?;

    Ok((StatusCode::CREATED, Json(notification)))
}

/// Schedule a push notification for later delivery
#[utoipa::path(
    post,
    path = "/api/notifications/schedule",
    request_body = ScheduleNotificationRequest,
    responses(
        (status = 201, description = "Notification scheduled", body = Notification),
        (status = 400, description = "Invalid request")
    ),
    tag = "notifications"
)]
pub async fn schedule_notification(
    State(state): State<AppState>,
    Json(payload): Json<ScheduleNotificationRequest>,
) -> Result<impl IntoResponse> {
    payload.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let notification = state
        .notification_service
        .schedule(
            payload.user_id,
            &payload.title,
            &payload.description,
            payload.scheduled_at,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(notification)))
}

/// List notifications, optionally filtered by user and status
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(ListNotificationsQuery),
    responses(
        (status = 200, description = "List of notifications", body = Vec<Notification>)
    ),
    tag = "notifications"
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> Result<Json<Vec<Notification>>> {
    let notifications = state.notification_service.list(query.into()).await?;

    Ok(Json(notifications))
}

/// Get a notification by id
#[utoipa::path(
    get,
    path = "/api/notifications/{id}",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification", body = Notification),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications"
)]
pub async fn get_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>> {
    let notification = state.notification_service.get(notification_id).await?;

    Ok(Json(notification))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications"
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode> {
    state.notification_service.delete(notification_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

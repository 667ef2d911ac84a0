use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use validator::Validate;

use crate::domain::aggregates::{NewTicketRequest, TicketAck, TicketRow, TicketStatusUpdate};

use super::auth::AuthUser;
use super::{parse_id, ApiError, ApiJson, AppState};

pub(super) async fn list_tickets(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TicketRow>>, ApiError> {
    Ok(Json(state.store.list_tickets(user_id).await?))
}

pub(super) async fn create_ticket(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewTicketRequest>,
) -> Result<(StatusCode, Json<TicketAck>), ApiError> {
    body.validate().map_err(|e| ApiError::bad_request(e.to_string()))?;
    let ticket = state.store.insert_ticket(&body.into_ticket(user_id)).await?;
    tracing::info!(ticket_id = ticket.id, issue_type = %ticket.issue_type, "ticket opened");
    Ok((
        StatusCode::CREATED,
        Json(TicketAck { status: StatusCode::CREATED.as_u16(), message: "Ticket created successfully" }),
    ))
}

/// Changes the status of one of the caller's tickets.
pub(super) async fn update_ticket(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    ApiJson(update): ApiJson<TicketStatusUpdate>,
) -> Result<Json<TicketAck>, ApiError> {
    let id = parse_id(&raw_id, "Invalid Ticket ID")?;
    let resolved_at = update.status.resolved_at(Utc::now());
    if !state.store.update_ticket_status(id, user_id, update.status, resolved_at).await? {
        return Err(ApiError::not_found("Ticket not found"));
    }
    tracing::info!(ticket_id = id, status = update.status.as_str(), "ticket updated");
    Ok(Json(TicketAck { status: StatusCode::OK.as_u16(), message: "Ticket updated successfully" }))
}

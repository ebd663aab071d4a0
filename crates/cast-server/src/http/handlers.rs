//! Request handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use cast_core::{ForwardingMode, MacAddress, Pairing, Room, RoomId};

use super::error::ApiError;
use super::forwarded::{client_ip, request_origin};
use super::pages;
use crate::qr;
use crate::state::AppState;

type AppStateRef = State<Arc<AppState>>;

#[derive(Debug, Deserialize)]
pub struct PairQuery {
    sig: Option<String>,
}

/// `{"client_mac": ..., "device_mac": ...}` as submitted, before validation
#[derive(Debug, Deserialize)]
pub struct PairingBody {
    client_mac: String,
    device_mac: String,
}

impl PairingBody {
    fn into_pairing(self) -> Result<Pairing, ApiError> {
        let client = MacAddress::parse(&self.client_mac)
            .map_err(|e| ApiError::BadRequest(format!("client_mac: {}", e)))?;
        let device = MacAddress::parse(&self.device_mac)
            .map_err(|e| ApiError::BadRequest(format!("device_mac: {}", e)))?;
        Ok(Pairing::new(client, device))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeBody {
    pub mode: String,
}

#[derive(Debug, Serialize)]
pub struct RoomView {
    pub id: RoomId,
    pub name: String,
    pub device_mac: Option<MacAddress>,
    /// Signed pairing link, present once the room has a device
    pub pairing_url: Option<String>,
}

fn parse_room_id(raw: &str) -> Option<RoomId> {
    raw.trim().parse().ok()
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

pub async fn health() -> &'static str {
    "OK"
}

/// `GET /pair-room/{id}?sig=...`: run one pairing attempt for the visitor
pub async fn pair_room(
    State(state): AppStateRef,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(raw_id): Path<String>,
    Query(query): Query<PairQuery>,
    headers: HeaderMap,
) -> Response {
    let Some(room_id) = parse_room_id(&raw_id) else {
        return pages::bad_room_id(&raw_id);
    };

    let signed = query
        .sig
        .as_deref()
        .is_some_and(|sig| state.links.signer().verify(room_id, sig));
    if !signed {
        tracing::debug!("Rejected pairing link for room {} with bad signature", room_id);
        return pages::bad_signature();
    }

    let ip = client_ip(&headers, peer, state.trust_forwarded_headers);
    match state.flow.pair(room_id, ip).await {
        Ok(success) => pages::success(&success),
        Err(failure) => {
            if failure.is_not_found() {
                tracing::debug!("Pairing for {} failed: {}", ip, failure);
            } else {
                tracing::warn!("Pairing for {} in room {} failed: {}", ip, room_id, failure);
            }
            pages::failure(&failure)
        }
    }
}

/// `GET /qr-code/{id}`: PNG QR code of the room's pairing link
pub async fn qr_code(
    State(state): AppStateRef,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let room_id = parse_room_id(&raw_id)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid room id: {}", raw_id)))?;

    let room = state
        .catalog
        .get(room_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Room {} not found", room_id)))?;
    if room.device_mac.is_none() {
        return Err(ApiError::NotFound(format!(
            "Room {} has no casting device configured",
            room_id
        )));
    }

    let origin = request_origin(&headers, state.trust_forwarded_headers);
    let url = state
        .links
        .url_for(room_id, origin.as_ref())
        .ok_or_else(|| ApiError::BadRequest("Cannot determine the server origin".into()))?;

    match qr::render_png(url.as_str()) {
        Ok(png) => Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            png,
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Failed to render QR code for room {}: {}", room_id, e);
            Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

/// `GET /api/pairings`
pub async fn list_pairings(State(state): AppStateRef) -> Json<Vec<Pairing>> {
    Json(state.pairings.list().await)
}

/// `POST /api/pairings`
pub async fn add_pairing(
    State(state): AppStateRef,
    payload: Result<Json<PairingBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let pairing = body(payload)?.into_pairing()?;
    state.pairings.add(&pairing).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/pairings`
pub async fn remove_pairing(
    State(state): AppStateRef,
    payload: Result<Json<PairingBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let pairing = body(payload)?.into_pairing()?;
    state.pairings.remove(&pairing).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/mode`
pub async fn get_mode(State(state): AppStateRef) -> Json<ModeBody> {
    Json(ModeBody {
        mode: state.modes.get_mode().await.to_string(),
    })
}

/// `POST /api/mode`
pub async fn set_mode(
    State(state): AppStateRef,
    payload: Result<Json<ModeBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let ModeBody { mode } = body(payload)?;
    let mode: ForwardingMode = mode
        .parse()
        .map_err(|e: cast_core::ModeParseError| ApiError::BadRequest(e.to_string()))?;
    if !mode.is_writable() {
        return Err(ApiError::BadRequest(format!("{} cannot be set", mode)));
    }

    state.modes.set_mode(mode).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/rooms`
pub async fn list_rooms(State(state): AppStateRef, headers: HeaderMap) -> Json<Vec<RoomView>> {
    let origin = request_origin(&headers, state.trust_forwarded_headers);

    let rooms = state
        .catalog
        .list()
        .await
        .into_iter()
        .map(|Room { id, name, device_mac }| {
            let pairing_url = device_mac
                .as_ref()
                .and_then(|_| state.links.url_for(id, origin.as_ref()))
                .map(String::from);
            RoomView {
                id,
                name,
                device_mac,
                pairing_url,
            }
        })
        .collect();

    Json(rooms)
}

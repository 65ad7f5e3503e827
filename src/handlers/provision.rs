//! Room provisioning endpoint
//!
//! `POST /{room}` with a JSON `{"password": ...}` body answers 200 when the
//! room now exists with that password (newly created or already correct)
//! and 401 when the room exists under a different password.

use std::sync::Arc;

use log::info;
use serde::Deserialize;
use warp::http::StatusCode;

use crate::auth;
use crate::core::room::RoomRegistry;

#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    pub password: String,
}

pub async fn provision_room(
    room: String,
    request: ProvisionRequest,
    registry: Arc<RoomRegistry>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let digest = auth::digest(&request.password);

    if !registry.exists(&room).await {
        match registry.create_room(&room, digest.clone()).await {
            Ok(()) => {
                info!("room created: {}", room);
                return Ok(StatusCode::OK);
            }
            // Lost a create race; the room exists now, verify below
            Err(_) => {}
        }
    }

    if registry.verify_password(&room, &digest).await {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::UNAUTHORIZED)
    }
}

//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::avatars::{delete_avatar, get_avatar, list_avatars, upload_avatar};
use crate::handlers::callbacks::motion_callback;
use crate::handlers::health::{health, ready};
use crate::handlers::montages::{create_montage, delete_montage, get_montage, list_montages};
use crate::handlers::motions::{create_motion, delete_motion, get_motion, list_motions};
use crate::handlers::tracks::{delete_track, get_track, list_tracks, upload_track};
use crate::handlers::videos::{create_videos, delete_video, get_video, list_videos};
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Videos
        .route("/videos", post(create_videos).get(list_videos))
        .route("/videos/:video_id", get(get_video).delete(delete_video))
        // Tracks
        .route("/tracks/upload", post(upload_track))
        .route("/tracks", get(list_tracks))
        .route("/tracks/:track_id", get(get_track).delete(delete_track))
        // Avatars
        .route("/avatars", post(upload_avatar).get(list_avatars))
        .route("/avatars/:avatar_id", get(get_avatar).delete(delete_avatar))
        // Motions
        .route("/motions", post(create_motion).get(list_motions))
        .route("/motions/:motion_id", get(get_motion).delete(delete_motion))
        // Montages
        .route("/montages", post(create_montage).get(list_montages))
        .route(
            "/montages/:montage_id",
            get(get_montage).delete(delete_montage),
        )
        // Inbound callbacks
        .route("/callbacks/motion", post(motion_callback));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(DefaultBodyLimit::max(state.config.max_avatar_bytes))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

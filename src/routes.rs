use super::{controllers, models};
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, Router},
};

#[rustfmt::skip]
pub fn get_routes() -> Router<models::AppState> {
    Router::new()
        .route("/", get(controllers::root))
        .route("/ping", get(controllers::pong))
        .route("/tab/:tab", post(controllers::select_tab))
        .route("/session/save", post(controllers::save_session))
        .route("/session/load", post(controllers::load_session))
        .route("/notices/:id", delete(controllers::dismiss_notice))
        .route("/notes", post(controllers::add_note))
        .route("/notes/:id/delete", post(controllers::delete_note))
        .route("/npcs", post(controllers::add_npc))
        .route("/npcs/:id/save", post(controllers::save_npc))
        .route("/npcs/:id/edit", post(controllers::edit_npc))
        .route("/npcs/:id/toggle-status", post(controllers::toggle_npc_status))
        .route("/npcs/:id/delete", post(controllers::delete_npc))
        // Map images go into the snapshot whole, however large they are.
        .route("/map/image", post(controllers::upload_map).layer(DefaultBodyLimit::disable()))
        .route("/map/image/delete", post(controllers::delete_image))
        .route("/map/box", post(controllers::image_box))
        .route("/map/placement", post(controllers::toggle_placement))
        .route("/map/deselect", post(controllers::deselect_marker))
        .route("/map/markers", post(controllers::place_marker))
        .route("/map/markers/clear", post(controllers::clear_markers))
        .route("/map/markers/:id/select", post(controllers::select_marker))
        .route("/map/markers/:id/delete", post(controllers::delete_marker))
}

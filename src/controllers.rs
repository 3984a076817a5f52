use super::{
    components::{self, Component},
    config::NOTICE_DISPLAY_SECS,
    errors::ServerError,
    extractors::HxRequest,
    map::{ImageBox, NewMarker},
    models::AppState,
    notes::NoteDraft,
    npcs::NpcForm,
    session::DmSession,
    tabs::Tab,
    views,
};
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Form,
};
use serde::Deserialize;

const TITLE: &str = "DM Tools";

/// Render `body` and append whatever notices the operation raised, so they
/// are swapped into `#notices` out-of-band.
fn respond(session: &mut DmSession, body: &dyn Component) -> String {
    let notices = session.take_notices();
    let toasts = components::NoticeStack {
        notices: &notices,
        display_secs: NOTICE_DISPLAY_SECS,
        oob: true,
    }
    .render();
    [body.render(), toasts].join("")
}

fn app_or_page(session: &mut DmSession, HxRequest(is_htmx): HxRequest) -> String {
    let app = views::app(session);
    if is_htmx {
        respond(session, &app)
    } else {
        let notices = session.take_notices();
        let page = components::Page {
            title: TITLE,
            children: Box::new(app),
            notices: Box::new(components::NoticeStack {
                notices: &notices,
                display_secs: NOTICE_DISPLAY_SECS,
                oob: false,
            }),
        }
        .render();
        page
    }
}

/// Destructive routes only act when the browser says the user agreed.
#[derive(Deserialize)]
pub struct Confirmation {
    #[serde(default)]
    confirmed: bool,
}

pub async fn root(
    State(AppState { session }): State<AppState>,
    hx: HxRequest,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    app_or_page(&mut session, hx)
}

pub async fn pong() -> impl IntoResponse {
    "pong"
}

pub async fn select_tab(
    State(AppState { session }): State<AppState>,
    hx: HxRequest,
    Path(tab): Path<Tab>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.select_tab(tab);
    app_or_page(&mut session, hx)
}

pub async fn save_session(
    State(AppState { session }): State<AppState>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.save();
    let notices = session.take_notices();
    components::NoticeStack {
        notices: &notices,
        display_secs: NOTICE_DISPLAY_SECS,
        oob: true,
    }
    .render()
}

pub async fn load_session(
    State(AppState { session }): State<AppState>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.load();
    let app = views::app(&session);
    respond(&mut session, &app)
}

pub async fn dismiss_notice(Path(_id): Path<u64>) -> impl IntoResponse {
    ""
}

fn notes_panel(session: &mut DmSession) -> String {
    let cards: Vec<_> =
        session.state.notes.iter().map(views::note_card).collect();
    respond(session, &components::NotesPanel { cards: &cards })
}

#[derive(Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    session_date: String,
    #[serde(default)]
    content: String,
}

pub async fn add_note(
    State(AppState { session }): State<AppState>,
    Form(NoteForm {
        title,
        session_date,
        content,
    }): Form<NoteForm>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.add_note(NoteDraft {
        title,
        session_date,
        content,
    });
    notes_panel(&mut session)
}

pub async fn delete_note(
    State(AppState { session }): State<AppState>,
    Path(id): Path<i64>,
    Form(Confirmation { confirmed }): Form<Confirmation>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.delete_note(id, confirmed);
    notes_panel(&mut session)
}

fn npc_panel(session: &mut DmSession) -> String {
    let cards: Vec<_> = session.state.npcs.iter().map(views::npc_card).collect();
    respond(session, &components::NpcPanel { cards: &cards })
}

pub async fn add_npc(
    State(AppState { session }): State<AppState>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.add_npc();
    npc_panel(&mut session)
}

pub async fn save_npc(
    State(AppState { session }): State<AppState>,
    Path(id): Path<i64>,
    Form(form): Form<NpcForm>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.save_npc(id, form);
    npc_panel(&mut session)
}

pub async fn edit_npc(
    State(AppState { session }): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.edit_npc(id);
    npc_panel(&mut session)
}

pub async fn toggle_npc_status(
    State(AppState { session }): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.toggle_npc_status(id);
    npc_panel(&mut session)
}

pub async fn delete_npc(
    State(AppState { session }): State<AppState>,
    Path(id): Path<i64>,
    Form(Confirmation { confirmed }): Form<Confirmation>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.delete_npc(id, confirmed);
    npc_panel(&mut session)
}

fn map_panel(session: &mut DmSession) -> String {
    let panel = views::map_panel(session);
    respond(session, &panel)
}

pub async fn upload_map(
    State(AppState { session }): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("map") {
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field.bytes().await?;
            upload = Some((content_type, bytes.to_vec()));
        }
    }

    let mut session = session.lock().await;
    match &upload {
        Some((content_type, bytes)) => {
            session.upload_map(content_type.as_deref(), bytes)
        }
        None => session.upload_map(None, &[]),
    }
    Ok(map_panel(&mut session))
}

/// The browser reports where the image ended up after loading or a resize.
pub async fn image_box(
    State(AppState { session }): State<AppState>,
    Form(image): Form<ImageBox>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.image_loaded(image);
    let panel = views::map_panel(&session);
    let layer = components::MarkerLayer {
        markers: &panel.markers,
    };
    respond(&mut session, &layer)
}

pub async fn toggle_placement(
    State(AppState { session }): State<AppState>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.toggle_placement();
    map_panel(&mut session)
}

#[derive(Deserialize)]
pub struct PlaceMarkerForm {
    name: String,
    #[serde(default)]
    description: String,
    click_x: f64,
    click_y: f64,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
}

pub async fn place_marker(
    State(AppState { session }): State<AppState>,
    Form(form): Form<PlaceMarkerForm>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.place_marker(NewMarker {
        name: &form.name,
        description: &form.description,
        click_x: form.click_x,
        click_y: form.click_y,
        image: ImageBox {
            left: form.left,
            top: form.top,
            width: form.width,
            height: form.height,
        },
    });
    map_panel(&mut session)
}

pub async fn select_marker(
    State(AppState { session }): State<AppState>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.select_marker(id);
    map_panel(&mut session)
}

pub async fn deselect_marker(
    State(AppState { session }): State<AppState>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.deselect_marker();
    map_panel(&mut session)
}

pub async fn delete_marker(
    State(AppState { session }): State<AppState>,
    Path(id): Path<i64>,
    Form(Confirmation { confirmed }): Form<Confirmation>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.delete_marker(id, confirmed);
    map_panel(&mut session)
}

pub async fn clear_markers(
    State(AppState { session }): State<AppState>,
    Form(Confirmation { confirmed }): Form<Confirmation>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.clear_markers(confirmed);
    map_panel(&mut session)
}

pub async fn delete_image(
    State(AppState { session }): State<AppState>,
    Form(Confirmation { confirmed }): Form<Confirmation>,
) -> impl IntoResponse {
    let mut session = session.lock().await;
    session.delete_image(confirmed);
    map_panel(&mut session)
}

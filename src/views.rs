//! Render-ready records, rebuilt from the session on every request. Nothing
//! here looks at what was on screen before.

use super::{
    map::{self, MarkerView, PlacementMode},
    models::{Note, Npc, NpcStatus},
    notes::parse_session_date,
    session::DmSession,
    tabs::Tab,
};

#[derive(Clone, Debug, PartialEq)]
pub struct TabView {
    pub tab: Tab,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NoteCard {
    pub id: i64,
    pub title: String,
    pub session_date: Option<String>,
    /// Markdown source; the render layer converts and sanitizes it.
    pub content: String,
    pub timestamp: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NpcCard {
    Editing {
        id: i64,
        name: String,
        race: String,
        class: String,
        description: String,
        status: NpcStatus,
    },
    Display {
        id: i64,
        name: String,
        race: String,
        class: String,
        description: String,
        status: NpcStatus,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapPanel {
    pub image_url: Option<String>,
    pub placing: bool,
    pub location_count: usize,
    pub markers: Vec<MarkerView>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppView {
    pub tabs: Vec<TabView>,
    pub active: Tab,
    pub map: MapPanel,
    pub npcs: Vec<NpcCard>,
    pub notes: Vec<NoteCard>,
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.trim().is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

pub fn tab_bar(active: Tab) -> Vec<TabView> {
    Tab::ALL
        .into_iter()
        .map(|tab| TabView {
            tab,
            active: tab == active,
        })
        .collect()
}

pub fn note_card(note: &Note) -> NoteCard {
    // A hand-edited save might hold a date we can't parse; show it as is.
    let session_date = note.session_date.as_deref().map(|raw| {
        match parse_session_date(raw) {
            Ok(Some(date)) => date.format("%B %-d, %Y").to_string(),
            _ => raw.to_string(),
        }
    });
    NoteCard {
        id: note.id,
        title: note.title.clone(),
        session_date,
        content: note.content.clone(),
        timestamp: note.timestamp.clone(),
    }
}

pub fn npc_card(npc: &Npc) -> NpcCard {
    if npc.is_editing {
        NpcCard::Editing {
            id: npc.id,
            name: npc.name.clone(),
            race: npc.race.clone(),
            class: npc.class.clone(),
            description: npc.description.clone(),
            status: npc.status,
        }
    } else {
        NpcCard::Display {
            id: npc.id,
            name: or_placeholder(&npc.name, "Unnamed NPC"),
            race: or_placeholder(&npc.race, "Unknown"),
            class: or_placeholder(&npc.class, "Unknown"),
            description: or_placeholder(&npc.description, "No description"),
            status: npc.status,
        }
    }
}

pub fn map_panel(session: &DmSession) -> MapPanel {
    let data = &session.state.map_data;
    MapPanel {
        image_url: data.image_url.clone(),
        placing: session.map_ui.mode == PlacementMode::Placing,
        location_count: data.locations.len(),
        markers: map::render(data, &session.map_ui),
    }
}

pub fn app(session: &DmSession) -> AppView {
    let state = &session.state;
    AppView {
        tabs: tab_bar(state.current_tab),
        active: state.current_tab,
        map: map_panel(session),
        npcs: state.npcs.iter().map(npc_card).collect(),
        notes: state.notes.iter().map(note_card).collect(),
    }
}

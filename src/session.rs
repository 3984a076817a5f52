use super::{
    config::STORAGE_KEY,
    errors::{Outcome, ToolError},
    map::{self, ImageBox, MapUi, NewMarker, PlacementMode},
    models::Snapshot,
    notes::{self, NoteDraft},
    notify::{Notice, NoticeKind, Notifier},
    npcs::{self, NpcForm},
    store::{self, LoadOutcome, Storage},
    tabs::{self, Tab},
};
use chrono::{Local, Utc};

/// The game session being run: everything on screen plus where it gets
/// saved. Handlers lock this, call one operation, and render from it.
///
/// Operations never fail outward. Validation problems become info notices,
/// persistence problems become error notices, and a declined confirmation
/// leaves everything as it was without a word.
pub struct DmSession {
    pub state: Snapshot,
    pub map_ui: MapUi,
    notices: Notifier,
    storage: Box<dyn Storage>,
}

impl DmSession {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        DmSession {
            state: Snapshot::default(),
            map_ui: MapUi::default(),
            notices: Notifier::default(),
            storage,
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(Utc::now())
    }

    fn notify(&mut self, kind: NoticeKind, message: impl Into<String>) {
        self.notices.push(kind, message, Utc::now());
    }

    /// Report a failed operation; hand back the value of a successful one.
    fn report<T>(&mut self, result: Result<T, ToolError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) if e.is_persistence() => {
                log::error!("{e:?}");
                self.notify(NoticeKind::Error, e.to_string());
                None
            }
            Err(e) => {
                log::debug!("rejected: {e}");
                self.notify(NoticeKind::Info, e.to_string());
                None
            }
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        tabs::select(&mut self.state, tab);
    }

    pub fn save(&mut self) {
        let result =
            store::save(self.storage.as_mut(), STORAGE_KEY, &self.state);
        if self.report(result).is_some() {
            log::info!("session saved");
            self.notify(NoticeKind::Success, "Session saved successfully!");
        }
    }

    pub fn load(&mut self) {
        let result =
            store::load(self.storage.as_ref(), STORAGE_KEY, &mut self.state);
        match self.report(result) {
            Some(LoadOutcome::Loaded) => {
                self.after_load();
                self.notify(NoticeKind::Success, "Session loaded successfully!");
            }
            Some(LoadOutcome::NothingSaved) => {
                self.notify(NoticeKind::Info, "No saved session found")
            }
            None => {}
        }
    }

    /// Like [`DmSession::load`], but a first run with nothing saved is not
    /// worth mentioning.
    pub fn load_on_startup(&mut self) {
        let result =
            store::load(self.storage.as_ref(), STORAGE_KEY, &mut self.state);
        if let Some(LoadOutcome::Loaded) = self.report(result) {
            log::info!(
                "restored session: {} notes, {} NPCs, {} locations",
                self.state.notes.len(),
                self.state.npcs.len(),
                self.state.map_data.locations.len()
            );
            self.after_load();
        }
    }

    /// Whatever was selected or being placed belonged to the old state, and
    /// the image has to be measured again before markers are drawn.
    fn after_load(&mut self) {
        self.map_ui = MapUi::default();
    }

    pub fn add_note(&mut self, draft: NoteDraft) {
        let result = notes::add_note(&mut self.state.notes, draft, Local::now())
            .map(|n| n.title.clone());
        if let Some(title) = self.report(result) {
            self.notify(NoticeKind::Success, format!("Note \"{title}\" created!"));
        }
    }

    pub fn delete_note(&mut self, id: i64, confirmed: bool) {
        let result = notes::delete_note(&mut self.state.notes, id, confirmed);
        if let Some((Outcome::Applied, _)) = self.report(result) {
            self.notify(NoticeKind::Success, "Note deleted!");
        }
    }

    pub fn add_npc(&mut self) {
        npcs::add_npc(&mut self.state.npcs, Utc::now().timestamp_millis());
        self.notify(
            NoticeKind::Info,
            "New NPC card created. Fill in the details!",
        );
    }

    pub fn save_npc(&mut self, id: i64, form: NpcForm) {
        let result = npcs::save_npc(&mut self.state.npcs, id, form).map(|_| ());
        if self.report(result).is_some() {
            self.notify(NoticeKind::Success, "NPC saved!");
        }
    }

    pub fn edit_npc(&mut self, id: i64) {
        let result = npcs::edit_npc(&mut self.state.npcs, id);
        self.report(result);
    }

    pub fn toggle_npc_status(&mut self, id: i64) {
        let result = npcs::toggle_status(&mut self.state.npcs, id);
        if let Some(status) = self.report(result) {
            self.notify(
                NoticeKind::Info,
                format!("NPC marked as {}!", status.as_str()),
            );
        }
    }

    pub fn delete_npc(&mut self, id: i64, confirmed: bool) {
        let result = npcs::delete_npc(&mut self.state.npcs, id, confirmed);
        if let Some((Outcome::Applied, _)) = self.report(result) {
            self.notify(NoticeKind::Success, "NPC deleted!");
        }
    }

    /// An uploaded file, already read into memory.
    pub fn upload_map(&mut self, content_type: Option<&str>, bytes: &[u8]) {
        let result = map::image_data_url(content_type, bytes);
        if let Some(url) = self.report(result) {
            log::info!("map image replaced ({} bytes)", bytes.len());
            map::set_image(&mut self.state.map_data, &mut self.map_ui, url);
            self.notify(NoticeKind::Success, "Map uploaded successfully!");
        }
    }

    pub fn image_loaded(&mut self, image: ImageBox) {
        map::image_loaded(&mut self.map_ui, image);
    }

    pub fn toggle_placement(&mut self) {
        let result = map::toggle_placement(&self.state.map_data, &mut self.map_ui);
        if let Some(PlacementMode::Placing) = self.report(result) {
            self.notify(
                NoticeKind::Info,
                "Click on the map to place a location",
            );
        }
    }

    pub fn place_marker(&mut self, marker: NewMarker<'_>) {
        let name = marker.name.trim().to_string();
        let result = map::add_marker(
            &mut self.state.map_data,
            &mut self.map_ui,
            marker,
            Utc::now().timestamp_millis(),
        );
        if self.report(result).is_some() {
            self.notify(
                NoticeKind::Success,
                format!("Location \"{name}\" added!"),
            );
        }
    }

    pub fn select_marker(&mut self, id: i64) {
        let result = map::select_marker(&self.state.map_data, &mut self.map_ui, id);
        self.report(result);
    }

    pub fn deselect_marker(&mut self) {
        map::deselect_marker(&mut self.map_ui);
    }

    pub fn delete_marker(&mut self, id: i64, confirmed: bool) {
        let result = map::delete_marker(
            &mut self.state.map_data,
            &mut self.map_ui,
            id,
            confirmed,
        );
        if let Some((Outcome::Applied, removed)) = self.report(result) {
            self.notify(
                NoticeKind::Success,
                format!("Location \"{}\" deleted", removed.name),
            );
        }
    }

    pub fn clear_markers(&mut self, confirmed: bool) {
        let result = map::clear_markers(
            &mut self.state.map_data,
            &mut self.map_ui,
            confirmed,
        );
        if let Some(Outcome::Applied) = self.report(result) {
            self.notify(NoticeKind::Success, "All locations cleared");
        }
    }

    pub fn delete_image(&mut self, confirmed: bool) {
        let result = map::delete_image(
            &mut self.state.map_data,
            &mut self.map_ui,
            confirmed,
        );
        if let Some(Outcome::Applied) = self.report(result) {
            self.notify(NoticeKind::Success, "Map cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStorage;

    const IMAGE: ImageBox = ImageBox {
        left: 0.0,
        top: 0.0,
        width: 1000.0,
        height: 500.0,
    };

    fn session() -> DmSession {
        DmSession::new(Box::<MemoryStorage>::default())
    }

    fn session_with_map() -> DmSession {
        let mut s = session();
        s.upload_map(Some("image/jpeg"), b"not really a jpeg");
        s.image_loaded(IMAGE);
        s.take_notices();
        s
    }

    fn kinds(s: &mut DmSession) -> Vec<NoticeKind> {
        s.take_notices().into_iter().map(|n| n.kind).collect()
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let mut s = session_with_map();
        s.add_note(NoteDraft {
            title: "Ambush".into(),
            content: "at the bridge".into(),
            ..Default::default()
        });
        s.add_npc();
        let npc_id = s.state.npcs[0].id;
        s.save_npc(
            npc_id,
            NpcForm {
                name: "Gorn".into(),
                ..Default::default()
            },
        );
        s.toggle_placement();
        s.place_marker(NewMarker {
            name: "Keep",
            description: "",
            click_x: 500.0,
            click_y: 125.0,
            image: IMAGE,
        });
        let before = s.state.clone();
        s.save();
        s.load();

        assert_eq!(s.state, before);
        assert_eq!(s.state.notes[0].title, "Ambush");
        assert_eq!(s.state.npcs[0].name, "Gorn");
        let keep = &s.state.map_data.locations[0];
        assert_eq!((keep.x_pct, keep.y_pct), (Some(0.5), Some(0.25)));
        let notices = kinds(&mut s);
        assert_eq!(notices.last(), Some(&NoticeKind::Success));
        assert!(!notices.contains(&NoticeKind::Error));
    }

    #[test]
    fn test_load_with_nothing_saved_is_info() {
        let mut s = session();
        s.load();
        assert_eq!(kinds(&mut s), vec![NoticeKind::Info]);
        s.load_on_startup();
        assert!(kinds(&mut s).is_empty());
    }

    #[test]
    fn test_corrupt_save_is_an_error_and_keeps_state() {
        let mut storage = MemoryStorage::default();
        storage.set_item(STORAGE_KEY, "{not json").unwrap();
        let mut s = DmSession::new(Box::new(storage));
        s.add_npc();
        s.take_notices();
        let before = s.state.clone();

        s.load();
        assert_eq!(s.state, before);
        assert_eq!(kinds(&mut s), vec![NoticeKind::Error]);
    }

    #[test]
    fn test_failed_save_reports_error() {
        let mut s = DmSession::new(Box::new(MemoryStorage::with_quota(10)));
        s.save();
        assert_eq!(kinds(&mut s), vec![NoticeKind::Error]);
    }

    #[test]
    fn test_invalid_upload_changes_nothing() {
        let mut s = session();
        s.upload_map(Some("text/plain"), b"hello");
        assert_eq!(s.state.map_data.image_url, None);
        assert_eq!(kinds(&mut s), vec![NoticeKind::Info]);
    }

    #[test]
    fn test_new_npc_then_save() {
        let mut s = session();
        s.add_npc();
        let npc = &s.state.npcs[0];
        assert!(npc.is_editing);
        assert!(npc.name.is_empty());
        let id = npc.id;

        s.save_npc(
            id,
            NpcForm {
                name: "Tessaly".into(),
                ..Default::default()
            },
        );
        assert_eq!(s.state.npcs[0].name, "Tessaly");
        assert!(!s.state.npcs[0].is_editing);
    }

    #[test]
    fn test_declined_delete_is_silent() {
        let mut s = session();
        s.add_note(NoteDraft::default());
        s.take_notices();
        let id = s.state.notes[0].id;

        s.delete_note(id, false);
        assert_eq!(s.state.notes.len(), 1);
        assert!(kinds(&mut s).is_empty());

        s.delete_note(id, true);
        assert!(s.state.notes.is_empty());
        assert_eq!(kinds(&mut s), vec![NoticeKind::Success]);
    }

    #[test]
    fn test_click_outside_keeps_placing() {
        let mut s = session_with_map();
        s.toggle_placement();
        s.take_notices();
        s.place_marker(NewMarker {
            name: "Sea",
            description: "",
            click_x: 1200.0,
            click_y: 20.0,
            image: IMAGE,
        });
        assert!(s.state.map_data.locations.is_empty());
        assert_eq!(s.map_ui.mode, PlacementMode::Placing);
        assert_eq!(kinds(&mut s), vec![NoticeKind::Info]);
    }

    #[test]
    fn test_delete_image_clears_markers() {
        let mut s = session_with_map();
        s.toggle_placement();
        s.place_marker(NewMarker {
            name: "Keep",
            description: "",
            click_x: 10.0,
            click_y: 10.0,
            image: IMAGE,
        });
        s.delete_image(true);
        assert!(s.state.map_data.locations.is_empty());
        assert_eq!(s.state.map_data.image_url, None);
    }

    #[test]
    fn test_load_resets_transient_map_state() {
        let mut s = session_with_map();
        s.save();
        s.toggle_placement();
        s.load();
        assert_eq!(s.map_ui, MapUi::default());
    }
}

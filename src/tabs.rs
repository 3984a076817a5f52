use super::models::Snapshot;
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    WorldMap,
    NpcCards,
    Notes,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::WorldMap, Tab::NpcCards, Tab::Notes];

    /// Also the DOM id of the tab's panel.
    pub fn slug(self) -> &'static str {
        match self {
            Tab::WorldMap => "world-map",
            Tab::NpcCards => "npc-cards",
            Tab::Notes => "notes",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::WorldMap => "World Map",
            Tab::NpcCards => "NPC Cards",
            Tab::Notes => "Notes",
        }
    }
}

/// Exactly one tab is active; selecting one deactivates the rest.
pub fn select(snapshot: &mut Snapshot, tab: Tab) {
    snapshot.current_tab = tab;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_exclusive() {
        let mut snapshot = Snapshot::default();
        assert_eq!(snapshot.current_tab, Tab::WorldMap);
        select(&mut snapshot, Tab::Notes);
        assert_eq!(snapshot.current_tab, Tab::Notes);
        let active = Tab::ALL
            .iter()
            .filter(|t| **t == snapshot.current_tab)
            .count();
        assert_eq!(active, 1);
    }

    #[test]
    fn test_slug_matches_serialized_name() {
        for tab in Tab::ALL {
            let json = serde_json::to_string(&tab).expect("json");
            assert_eq!(json, format!("\"{}\"", tab.slug()));
        }
    }
}

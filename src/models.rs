use super::{session::DmSession, tabs::Tab};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<DmSession>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_date: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NpcStatus {
    #[default]
    Alive,
    Dead,
}

impl NpcStatus {
    pub fn toggled(self) -> Self {
        match self {
            NpcStatus::Alive => NpcStatus::Dead,
            NpcStatus::Dead => NpcStatus::Alive,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NpcStatus::Alive => "alive",
            NpcStatus::Dead => "dead",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Npc {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub race: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: NpcStatus,
    /// Only meaningful while the page is open, but it rides along in the
    /// snapshot like everything else.
    #[serde(default)]
    pub is_editing: bool,
}

/// A map marker as stored. New markers carry `x_pct`/`y_pct`; markers saved
/// by older builds carry absolute `x`/`y` pixels, sometimes with the image
/// size they were captured against. See [`Location::position`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_height: Option<f64>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

/// Which coordinate scheme a stored marker uses.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkerPosition {
    Normalized { x_pct: f64, y_pct: f64 },
    Absolute { x: f64, y: f64, base: Option<ImageSize> },
}

impl Location {
    /// Normalized coordinates win when both are present. `None` means the
    /// record is malformed and must be skipped at render time.
    pub fn position(&self) -> Option<MarkerPosition> {
        if let (Some(x_pct), Some(y_pct)) = (self.x_pct, self.y_pct) {
            return Some(MarkerPosition::Normalized { x_pct, y_pct });
        }
        let (x, y) = (self.x?, self.y?);
        let base = match (self.base_width, self.base_height) {
            (Some(width), Some(height)) => Some(ImageSize { width, height }),
            _ => None,
        };
        Some(MarkerPosition::Absolute { x, y, base })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapData {
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_height: Option<f64>,
}

impl MapData {
    pub fn base_size(&self) -> Option<ImageSize> {
        match (self.base_width, self.base_height) {
            (Some(width), Some(height)) => Some(ImageSize { width, height }),
            _ => None,
        }
    }
}

/// The whole persisted unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub current_tab: Tab,
    pub notes: Vec<Note>,
    pub npcs: Vec<Npc>,
    pub map_data: MapData,
}

/// Ids are creation timestamps in milliseconds. Two creations inside the
/// same millisecond would collide, so bump past the largest id taken. A
/// loaded save may already hold `i64::MAX`; then take the nearest free id at
/// or below the clock instead.
pub fn fresh_id(now_millis: i64, taken: impl Iterator<Item = i64>) -> i64 {
    let taken: Vec<i64> = taken.collect();
    match taken.iter().max() {
        Some(&max) if max >= now_millis => {
            max.checked_add(1).unwrap_or_else(|| {
                (i64::MIN..=now_millis)
                    .rev()
                    .find(|id| !taken.contains(id))
                    .unwrap_or(now_millis)
            })
        }
        _ => now_millis,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_id_uses_clock() {
        assert_eq!(fresh_id(1_000, [10, 20].into_iter()), 1_000);
        assert_eq!(fresh_id(1_000, std::iter::empty()), 1_000);
    }

    #[test]
    fn test_fresh_id_survives_max_id() {
        let id = fresh_id(1_000, [i64::MAX, 1_000].into_iter());
        assert_eq!(id, 999);
        assert_eq!(fresh_id(1_000, [i64::MAX].into_iter()), 1_000);
    }

    #[test]
    fn test_fresh_id_bumps_on_collision() {
        assert_eq!(fresh_id(1_000, [1_000].into_iter()), 1_001);
        assert_eq!(fresh_id(1_000, [999, 1_004].into_iter()), 1_005);
    }

    #[test]
    fn test_legacy_marker_deserializes_as_absolute() {
        let loc: Location = serde_json::from_str(
            r#"{"id":1,"name":"Old Fort","x":120,"y":80,"description":""}"#,
        )
        .expect("valid json");
        assert_eq!(
            loc.position(),
            Some(MarkerPosition::Absolute {
                x: 120.0,
                y: 80.0,
                base: None
            })
        );
    }

    #[test]
    fn test_marker_without_coordinates_is_malformed() {
        let loc: Location =
            serde_json::from_str(r#"{"id":1,"name":"Nowhere","xPct":0.4}"#)
                .expect("valid json");
        assert_eq!(loc.position(), None);
    }

    #[test]
    fn test_snapshot_field_names() {
        let json = serde_json::to_value(Snapshot::default()).expect("json");
        assert_eq!(json["currentTab"], "world-map");
        assert!(json["mapData"]["imageUrl"].is_null());
        assert!(json["mapData"]["locations"].as_array().is_some());
    }

    #[test]
    fn test_npc_status_toggles() {
        assert_eq!(NpcStatus::Alive.toggled(), NpcStatus::Dead);
        assert_eq!(NpcStatus::Dead.toggled(), NpcStatus::Alive);
    }
}

//! The world map: one background image plus markers that stay glued to it no
//! matter how large the browser renders the image.
//!
//! Markers are stored in normalized coordinates (fractions of the rendered
//! image size), so placing one only needs the image's bounding box at click
//! time, and drawing them only needs the box at render time. Markers saved
//! by older builds hold absolute pixels instead and are scaled against the
//! image size they were captured at.
//!
//! The browser reads the image box only after the image has loaded, so
//! [`MapUi::image_box`] is `None` between [`set_image`] and the first
//! [`image_loaded`] call. Nothing here assumes a box before that.

use super::{
    config::MARKER_PALETTE,
    errors::{Outcome, ToolError},
    models::{fresh_id, ImageSize, Location, MapData, MarkerPosition},
};
use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use serde::Deserialize;

/// Where the image is drawn, in the same client coordinates as the clicks.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct ImageBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ImageBox {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left
            && x <= self.left + self.width
            && y >= self.top
            && y <= self.top + self.height
    }

    pub fn size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }

    fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// Convert a click into fractions of the image box. `None` if the click
/// missed the image.
pub fn normalize_click(x: f64, y: f64, image: &ImageBox) -> Option<(f64, f64)> {
    if image.is_degenerate() || !image.contains(x, y) {
        return None;
    }
    Some((
        (x - image.left) / image.width,
        (y - image.top) / image.height,
    ))
}

/// Position of a marker relative to the image's top-left corner when the
/// image is drawn at `rendered`. Absolute markers without a recorded base
/// fall back to `fallback_base` (the map's last known size), and failing
/// that to `rendered` itself.
pub fn screen_position(
    location: &Location,
    fallback_base: Option<ImageSize>,
    rendered: ImageSize,
) -> Option<ScreenPoint> {
    match location.position()? {
        MarkerPosition::Normalized { x_pct, y_pct } => Some(ScreenPoint {
            x: x_pct * rendered.width,
            y: y_pct * rendered.height,
        }),
        MarkerPosition::Absolute { x, y, base } => {
            let base = base.or(fallback_base).unwrap_or(rendered);
            if base.width <= 0.0 || base.height <= 0.0 {
                return None;
            }
            Some(ScreenPoint {
                x: x / base.width * rendered.width,
                y: y / base.height * rendered.height,
            })
        }
    }
}

/// Colors follow list position, not identity: deleting a marker shifts the
/// colors of every marker after it.
pub fn marker_color(index: usize) -> &'static str {
    MARKER_PALETTE[index % MARKER_PALETTE.len()]
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PlacementMode {
    #[default]
    Idle,
    Placing,
}

/// Map state that only matters while the page is open. Never persisted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapUi {
    pub mode: PlacementMode,
    pub selected: Option<i64>,
    pub image_box: Option<ImageBox>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkerView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub left: f64,
    pub top: f64,
    pub color: &'static str,
    pub selected: bool,
}

/// Validate an upload and turn it into a data URL for the snapshot.
pub fn image_data_url(
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, ToolError> {
    let image_mime =
        Regex::new(r"^image/[A-Za-z0-9.+-]+$").expect("mime regex is valid");
    let mime = content_type
        .map(str::trim)
        .filter(|m| image_mime.is_match(m))
        .ok_or(ToolError::NotAnImage)?;
    let encoded = general_purpose::STANDARD.encode(bytes);

    Ok(format!("data:{mime};base64,{encoded}"))
}

/// Swap the background image. Markers stay; their on-screen positions wait
/// for the new image's box.
pub fn set_image(data: &mut MapData, ui: &mut MapUi, url: String) {
    data.image_url = Some(url);
    ui.image_box = None;
}

/// The browser finished loading (or resized) the image.
pub fn image_loaded(ui: &mut MapUi, image: ImageBox) {
    ui.image_box = Some(image);
}

pub fn toggle_placement(
    data: &MapData,
    ui: &mut MapUi,
) -> Result<PlacementMode, ToolError> {
    ui.mode = match ui.mode {
        PlacementMode::Placing => PlacementMode::Idle,
        PlacementMode::Idle if data.image_url.is_none() => {
            return Err(ToolError::NoImage)
        }
        PlacementMode::Idle => PlacementMode::Placing,
    };
    Ok(ui.mode)
}

pub struct NewMarker<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub click_x: f64,
    pub click_y: f64,
    pub image: ImageBox,
}

/// Place a marker where the user clicked. Any rejection leaves both the
/// markers and the placement mode as they were.
pub fn add_marker(
    data: &mut MapData,
    ui: &mut MapUi,
    marker: NewMarker<'_>,
    now_millis: i64,
) -> Result<i64, ToolError> {
    if data.image_url.is_none() {
        return Err(ToolError::NoImage);
    }
    if ui.mode != PlacementMode::Placing {
        return Err(ToolError::NotPlacing);
    }
    let (x_pct, y_pct) =
        normalize_click(marker.click_x, marker.click_y, &marker.image)
            .ok_or(ToolError::OutsideImage)?;
    let name = marker.name.trim();
    if name.is_empty() {
        return Err(ToolError::MissingName);
    }

    let id = fresh_id(now_millis, data.locations.iter().map(|l| l.id));
    data.locations.push(Location {
        id,
        name: name.to_string(),
        description: marker.description.trim().to_string(),
        x_pct: Some(x_pct),
        y_pct: Some(y_pct),
        ..Default::default()
    });
    // Older absolute markers scale against this.
    data.base_width = Some(marker.image.width);
    data.base_height = Some(marker.image.height);
    ui.image_box = Some(marker.image);
    ui.mode = PlacementMode::Idle;

    Ok(id)
}

/// Screen-ready markers for the image at `rendered`. Malformed markers are
/// skipped, not repaired.
pub fn render_at(
    data: &MapData,
    selected: Option<i64>,
    rendered: ImageSize,
) -> Vec<MarkerView> {
    let fallback = data.base_size();
    data.locations
        .iter()
        .enumerate()
        .filter_map(|(index, loc)| {
            let point = screen_position(loc, fallback, rendered)?;
            Some(MarkerView {
                id: loc.id,
                name: loc.name.clone(),
                description: loc.description.clone(),
                left: point.x,
                top: point.y,
                color: marker_color(index),
                selected: selected == Some(loc.id),
            })
        })
        .collect()
}

/// Markers for the image as it is currently drawn. Empty until there is an
/// image and the browser has told us its box.
pub fn render(data: &MapData, ui: &MapUi) -> Vec<MarkerView> {
    match (&data.image_url, ui.image_box) {
        (Some(_), Some(image)) => render_at(data, ui.selected, image.size()),
        _ => vec![],
    }
}

/// Toggle selection: picking the selected marker again deselects it.
pub fn select_marker(
    data: &MapData,
    ui: &mut MapUi,
    id: i64,
) -> Result<Option<i64>, ToolError> {
    if !data.locations.iter().any(|l| l.id == id) {
        return Err(ToolError::NotFound {
            kind: "location",
            id,
        });
    }
    ui.selected = if ui.selected == Some(id) { None } else { Some(id) };
    Ok(ui.selected)
}

pub fn deselect_marker(ui: &mut MapUi) {
    ui.selected = None;
}

pub fn delete_marker(
    data: &mut MapData,
    ui: &mut MapUi,
    id: i64,
    confirmed: bool,
) -> Result<(Outcome, Location), ToolError> {
    let index = data
        .locations
        .iter()
        .position(|l| l.id == id)
        .ok_or(ToolError::NotFound {
            kind: "location",
            id,
        })?;
    if Outcome::gate(confirmed) == Outcome::Cancelled {
        return Ok((Outcome::Cancelled, data.locations[index].clone()));
    }
    let removed = data.locations.remove(index);
    if ui.selected == Some(id) {
        ui.selected = None;
    }
    Ok((Outcome::Applied, removed))
}

/// Drop every marker but keep the image.
pub fn clear_markers(
    data: &mut MapData,
    ui: &mut MapUi,
    confirmed: bool,
) -> Result<Outcome, ToolError> {
    if data.locations.is_empty() {
        return Err(ToolError::NoMarkers);
    }
    let outcome = Outcome::gate(confirmed);
    if outcome == Outcome::Applied {
        data.locations.clear();
        ui.selected = None;
    }
    Ok(outcome)
}

/// Remove the image and everything pinned to it in one step.
pub fn delete_image(
    data: &mut MapData,
    ui: &mut MapUi,
    confirmed: bool,
) -> Result<Outcome, ToolError> {
    if data.image_url.is_none() {
        return Err(ToolError::NoImage);
    }
    let outcome = Outcome::gate(confirmed);
    if outcome == Outcome::Applied {
        *data = MapData::default();
        *ui = MapUi::default();
    }
    Ok(outcome)
}

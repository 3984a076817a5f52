use super::{
    map::MarkerView,
    models::NpcStatus,
    notify::{Notice, NoticeKind},
    tabs::Tab,
    views::{AppView, MapPanel, NoteCard, NpcCard, TabView},
};
use ammonia::{clean, clean_text};
use std::fmt::Write;

pub trait Component {
    /// Render the component to a HTML string. By convention, the
    /// implementation should sanitize all string properties at render-time
    fn render(&self) -> String;
}

pub struct Page<'a> {
    pub title: &'a str,
    pub children: Box<dyn Component + 'a>,
    /// Rendered inside `#notices`, since a full page has nothing to swap
    /// out-of-band into.
    pub notices: Box<dyn Component + 'a>,
}

impl Component for Page<'_> {
    fn render(&self) -> String {
        format!(
            r##"
            <html>
                <head>
                    <meta name="viewport" content="width=device-width, initial-scale=1.0"></meta>
                    <title>{title}</title>
                    <script src="https://cdn.tailwindcss.com"></script>
                    <script src="https://unpkg.com/htmx.org@1.9.6"></script>
                    <script>
                        htmx.config.defaultSwapStyle = "outerHTML"
                    </script>
                </head>
                <body class="bg-slate-100 dark:bg-slate-900 dark:text-white">
                    <header class="flex items-center justify-between p-4 bg-indigo-700 text-white shadow">
                        <h1 class="text-2xl font-bold">{title}</h1>
                        <div class="flex gap-2">
                            <button
                                class="px-3 py-1 rounded bg-green-500 hover:bg-green-600"
                                hx-post="/session/save"
                                hx-swap="none"
                            >Save Session</button>
                            <button
                                class="px-3 py-1 rounded bg-blue-500 hover:bg-blue-600"
                                hx-post="/session/load"
                                hx-target="#app"
                            >Load Session</button>
                        </div>
                    </header>
                    <div id="notices" class="fixed top-5 right-5 z-50 flex flex-col gap-2">{notices_html}</div>
                    {body_html}
                </body>
            </html>
            "##,
            title = clean_text(self.title),
            body_html = self.children.render(),
            notices_html = self.notices.render(),
        )
    }
}

impl Component for AppView {
    fn render(&self) -> String {
        let tabs = TabBar { tabs: &self.tabs }.render();
        let panel = |tab: Tab, body: String| {
            let hidden = if tab == self.active { "" } else { "hidden" };
            let id = tab.slug();
            format!(r#"<div id="{id}" class="tab-content {hidden}">{body}</div>"#)
        };
        let map = panel(Tab::WorldMap, self.map.render());
        let npcs = panel(Tab::NpcCards, NpcPanel { cards: &self.npcs }.render());
        let notes = panel(Tab::Notes, NotesPanel { cards: &self.notes }.render());
        format!(
            r#"
            <main id="app" class="p-4 max-w-6xl mx-auto">
                {tabs}
                {map}
                {npcs}
                {notes}
            </main>
            "#
        )
    }
}

struct TabBar<'a> {
    tabs: &'a [TabView],
}
impl Component for TabBar<'_> {
    fn render(&self) -> String {
        let buttons = self.tabs.iter().fold(String::new(), |mut acc, t| {
            let style = if t.active {
                "bg-indigo-600 text-white"
            } else {
                "bg-white text-indigo-700 hover:bg-indigo-100"
            };
            let _ = write!(
                acc,
                r##"
                <button
                    class="tab-button px-4 py-2 rounded-t {style}"
                    hx-post="/tab/{slug}"
                    hx-target="#app"
                >{label}</button>
                "##,
                slug = t.tab.slug(),
                label = t.tab.label(),
            );
            acc
        });
        format!(r#"<nav class="flex gap-1 border-b border-indigo-600 mb-4">{buttons}</nav>"#)
    }
}

/// Measures the rendered image once it has loaded (and again on resize) so
/// the server can place the markers. Clicks on the map place a marker while
/// placement mode is on and drop the selection otherwise.
const MAP_SCRIPT: &str = r##"
<script>
    (() => {
        const img = document.querySelector("#map-image");
        const stage = document.querySelector("#map-stage");
        if (!img || !stage) return;
        const box = () => {
            const r = img.getBoundingClientRect();
            return { left: r.left, top: r.top, width: r.width, height: r.height };
        };
        const report = () =>
            htmx.ajax("POST", "/map/box", { target: "#marker-layer", values: box() });
        if (img.complete && img.naturalWidth) {
            report();
        } else {
            img.addEventListener("load", report);
        }
        // Assigned, not added, so re-rendered panels replace the old handler.
        window.onresize = report;
        stage.addEventListener("click", (e) => {
            if (e.target.closest("[data-marker]")) return;
            if (stage.dataset.placing !== "true") {
                if (stage.querySelector("[data-selected]")) {
                    htmx.ajax("POST", "/map/deselect", { target: "#map-panel" });
                }
                return;
            }
            const name = prompt("Enter location name:");
            if (!name) return;
            const description = prompt("Enter location description:") || "";
            htmx.ajax("POST", "/map/markers", {
                target: "#map-panel",
                values: { ...box(), name, description, click_x: e.clientX, click_y: e.clientY },
            });
        });
    })();
</script>
"##;

impl Component for MapPanel {
    fn render(&self) -> String {
        let upload = r##"
            <form
                hx-post="/map/image"
                hx-encoding="multipart/form-data"
                hx-trigger="change"
                hx-target="#map-panel"
            >
                <label class="px-3 py-1 rounded bg-indigo-600 text-white cursor-pointer">
                    Upload Map
                    <input class="hidden" type="file" name="map" accept="image/*" />
                </label>
            </form>
        "##;
        let Some(image_url) = &self.image_url else {
            return format!(
                r#"
                <section id="map-panel" class="flex flex-col gap-4">
                    <div class="flex gap-2">{upload}</div>
                    <div id="map-placeholder" class="p-12 text-center text-slate-400 border-2 border-dashed rounded">
                        Upload a map image to get started
                    </div>
                </section>
                "#
            );
        };
        let (placement_label, placement_style) = if self.placing {
            ("Cancel Placement", "bg-yellow-400 text-black")
        } else {
            ("Add Location", "bg-indigo-600 text-white")
        };
        // With nothing to clear there is nothing to confirm; the server
        // answers with a notice.
        let clear_confirm = match self.location_count {
            0 => String::new(),
            n => format!(r#"hx-confirm="Remove all {n} locations from the map?""#),
        };
        let placing = self.placing;
        let cursor = if placing { "cursor-crosshair" } else { "" };
        let markers = MarkerLayer {
            markers: &self.markers,
        }
        .render();
        format!(
            r##"
            <section id="map-panel" class="flex flex-col gap-4">
                <div class="flex gap-2 items-center">
                    {upload}
                    <button
                        class="px-3 py-1 rounded {placement_style}"
                        hx-post="/map/placement"
                        hx-target="#map-panel"
                    >{placement_label}</button>
                    <button
                        class="px-3 py-1 rounded bg-slate-300 text-black"
                        hx-post="/map/markers/clear"
                        hx-vals='{{"confirmed": "true"}}'
                        {clear_confirm}
                        hx-target="#map-panel"
                    >Clear Locations</button>
                    <button
                        class="px-3 py-1 rounded bg-red-500 text-white"
                        hx-post="/map/image/delete"
                        hx-vals='{{"confirmed": "true"}}'
                        hx-confirm="Are you sure you want to clear the current map? All locations will be removed."
                        hx-target="#map-panel"
                    >Delete Map</button>
                </div>
                <div id="map-stage" class="relative {cursor}" data-placing="{placing}">
                    <img id="map-image" class="block max-w-full" src="{image_url}" alt="World map" />
                    {markers}
                </div>
                {MAP_SCRIPT}
            </section>
            "##,
            image_url = clean_text(image_url),
        )
    }
}

pub struct MarkerLayer<'a> {
    pub markers: &'a [MarkerView],
}
impl Component for MarkerLayer<'_> {
    fn render(&self) -> String {
        let markers = self.markers.iter().fold(String::new(), |mut acc, m| {
            acc.push_str(&Marker { marker: m }.render());
            acc
        });
        format!(
            r#"<div id="marker-layer" class="absolute inset-0 pointer-events-none">{markers}</div>"#
        )
    }
}

struct Marker<'a> {
    marker: &'a MarkerView,
}
impl Component for Marker<'_> {
    fn render(&self) -> String {
        let m = self.marker;
        let id = m.id;
        let name = clean_text(&m.name);
        let description = clean_text(&m.description);
        let ring = if m.selected {
            "ring-4 ring-white scale-125"
        } else {
            ""
        };
        let selected_attr = if m.selected { "data-selected" } else { "" };
        let delete = if m.selected {
            format!(
                r##"
                <button
                    class="pointer-events-auto absolute left-4 -top-2 whitespace-nowrap px-2 rounded bg-red-500 text-white text-xs"
                    hx-post="/map/markers/{id}/delete"
                    hx-vals='{{"confirmed": "true"}}'
                    hx-confirm="Delete location &quot;{name}&quot;?"
                    hx-target="#map-panel"
                >Delete {name}</button>
                "##
            )
        } else {
            "".to_string()
        };
        format!(
            r##"
            <div class="absolute" data-marker="{id}" {selected_attr} style="left: {left:.2}px; top: {top:.2}px;">
                <button
                    title="{name}: {description}"
                    class="pointer-events-auto -translate-x-1/2 -translate-y-1/2 block w-4 h-4 rounded-full border-2 border-black {ring}"
                    style="background-color: {color};"
                    hx-post="/map/markers/{id}/select"
                    hx-target="#map-panel"
                ></button>
                <span class="absolute left-3 -top-6 text-xs font-bold bg-white/80 text-black px-1 rounded">{name}</span>
                {delete}
            </div>
            "##,
            left = m.left,
            top = m.top,
            color = m.color,
        )
    }
}

pub struct NotesPanel<'a> {
    pub cards: &'a [NoteCard],
}
impl Component for NotesPanel<'_> {
    fn render(&self) -> String {
        let list = if self.cards.is_empty() {
            r#"<p class="text-slate-400">No notes yet. Write one above to get started.</p>"#
                .to_string()
        } else {
            self.cards
                .iter()
                .map(|c| c.render())
                .collect::<Vec<String>>()
                .join("")
        };
        format!(
            r##"
            <section id="notes-panel" class="flex flex-col gap-4">
                <form
                    class="flex flex-col gap-2 p-4 bg-white dark:bg-slate-800 rounded shadow"
                    hx-post="/notes"
                    hx-target="#notes-panel"
                >
                    <div class="flex gap-2">
                        <input class="grow rounded text-black" type="text" name="title" placeholder="Note title" />
                        <input class="rounded text-black" type="date" name="session_date" />
                    </div>
                    <textarea class="rounded h-32 text-black" name="content" placeholder="What happened?"></textarea>
                    <button class="self-end px-3 py-1 rounded bg-indigo-600 text-white">Save Note</button>
                </form>
                {list}
            </section>
            "##
        )
    }
}

impl Component for NoteCard {
    fn render(&self) -> String {
        let id = self.id;
        let title = clean_text(&self.title);
        let session_date = match &self.session_date {
            Some(d) => format!(
                r#"<span class="text-sm text-indigo-500">Session: {}</span>"#,
                clean_text(d)
            ),
            None => "".to_string(),
        };
        let content = clean(&markdown::to_html(&self.content));
        let timestamp = clean_text(&self.timestamp);
        format!(
            r##"
            <article class="p-4 bg-white dark:bg-slate-800 rounded shadow">
                <div class="flex items-baseline justify-between">
                    <h3 class="text-lg font-bold">{title}</h3>
                    {session_date}
                </div>
                <div class="prose dark:prose-invert">{content}</div>
                <div class="flex items-center justify-between mt-2">
                    <small class="text-slate-500">{timestamp}</small>
                    <button
                        class="px-2 rounded bg-red-100 text-red-700"
                        hx-post="/notes/{id}/delete"
                        hx-vals='{{"confirmed": "true"}}'
                        hx-confirm="Are you sure you want to delete &quot;{title}&quot;?"
                        hx-target="#notes-panel"
                    >Delete</button>
                </div>
            </article>
            "##
        )
    }
}

pub struct NpcPanel<'a> {
    pub cards: &'a [NpcCard],
}
impl Component for NpcPanel<'_> {
    fn render(&self) -> String {
        let cards = if self.cards.is_empty() {
            r#"<p class="text-slate-400">No NPCs yet. Click "Add New NPC" to create one.</p>"#
                .to_string()
        } else {
            self.cards.iter().fold(String::new(), |mut acc, c| {
                acc.push_str(&c.render());
                acc
            })
        };
        format!(
            r##"
            <section id="npc-panel" class="flex flex-col gap-4">
                <button
                    class="self-start px-3 py-1 rounded bg-indigo-600 text-white"
                    hx-post="/npcs"
                    hx-target="#npc-panel"
                >Add New NPC</button>
                <div class="grid grid-cols-1 md:grid-cols-3 gap-4">{cards}</div>
            </section>
            "##
        )
    }
}

fn status_option(value: NpcStatus, current: NpcStatus, label: &str) -> String {
    let selected = if value == current { "selected" } else { "" };
    format!(r#"<option value="{}" {selected}>{label}</option>"#, value.as_str())
}

fn delete_npc_button(id: i64, name: &str) -> String {
    format!(
        r##"
        <button
            type="button"
            class="px-2 rounded bg-red-100 text-red-700"
            hx-post="/npcs/{id}/delete"
            hx-vals='{{"confirmed": "true"}}'
            hx-confirm="Are you sure you want to delete &quot;{name}&quot;?"
            hx-target="#npc-panel"
        >Delete</button>
        "##
    )
}

impl Component for NpcCard {
    fn render(&self) -> String {
        match self {
            NpcCard::Editing {
                id,
                name,
                race,
                class,
                description,
                status,
            } => {
                let name = clean_text(name);
                let race = clean_text(race);
                let class = clean_text(class);
                let description = clean_text(description);
                let alive = status_option(NpcStatus::Alive, *status, "Alive");
                let dead = status_option(NpcStatus::Dead, *status, "Dead");
                let delete = delete_npc_button(*id, &name);
                format!(
                    r##"
                    <form
                        class="npc-card flex flex-col gap-2 p-4 bg-white dark:bg-slate-800 rounded shadow"
                        hx-post="/npcs/{id}/save"
                        hx-target="#npc-panel"
                    >
                        <input class="rounded text-black" type="text" name="name" placeholder="Enter NPC name" value="{name}" />
                        <input class="rounded text-black" type="text" name="race" placeholder="Enter race" value="{race}" />
                        <input class="rounded text-black" type="text" name="class" placeholder="Enter class" value="{class}" />
                        <textarea class="rounded text-black" name="description" placeholder="Enter description">{description}</textarea>
                        <label class="flex gap-2 items-center">
                            <strong>Status:</strong>
                            <select class="rounded text-black" name="status">{alive}{dead}</select>
                        </label>
                        <div class="flex gap-2">
                            <button class="px-2 rounded bg-indigo-600 text-white">Save</button>
                            {delete}
                        </div>
                    </form>
                    "##
                )
            }
            NpcCard::Display {
                id,
                name,
                race,
                class,
                description,
                status,
            } => {
                let name = clean_text(name);
                let race = clean_text(race);
                let class = clean_text(class);
                let description = clean_text(description);
                let (badge, card_style) = match status {
                    NpcStatus::Alive => ("✓ Alive", "bg-white dark:bg-slate-800"),
                    NpcStatus::Dead => ("✗ Dead", "bg-slate-300 dark:bg-slate-700 opacity-75"),
                };
                let status_class = status.as_str();
                let delete = delete_npc_button(*id, &name);
                format!(
                    r##"
                    <div class="npc-card flex flex-col gap-1 p-4 rounded shadow {card_style}">
                        <div class="npc-status-badge {status_class} self-end text-sm">{badge}</div>
                        <h3 class="text-lg font-bold">{name}</h3>
                        <p><strong>Race:</strong> {race}</p>
                        <p><strong>Class:</strong> {class}</p>
                        <p><strong>Description:</strong> {description}</p>
                        <div class="flex gap-2 mt-2">
                            <button
                                class="px-2 rounded bg-slate-200 text-black"
                                hx-post="/npcs/{id}/toggle-status"
                                hx-target="#npc-panel"
                            >Toggle Status</button>
                            <button
                                class="px-2 rounded bg-slate-200 text-black"
                                hx-post="/npcs/{id}/edit"
                                hx-target="#npc-panel"
                            >Edit</button>
                            {delete}
                        </div>
                    </div>
                    "##
                )
            }
        }
    }
}

/// Appended out-of-band to `#notices`. Each toast asks to be removed once
/// its display time is up.
pub struct NoticeStack<'a> {
    pub notices: &'a [Notice],
    pub display_secs: i64,
    /// Wrap the toasts for an out-of-band swap into `#notices`.
    pub oob: bool,
}
impl Component for NoticeStack<'_> {
    fn render(&self) -> String {
        if self.notices.is_empty() {
            return "".to_string();
        }
        let display_secs = self.display_secs;
        let toasts = self.notices.iter().fold(String::new(), |mut acc, n| {
            let color = match n.kind {
                NoticeKind::Success => "bg-green-500",
                NoticeKind::Error => "bg-red-500",
                NoticeKind::Info => "bg-blue-500",
            };
            let _ = write!(
                acc,
                r#"
                <div
                    id="notice-{id}"
                    class="notice notice-{kind} px-5 py-3 rounded shadow text-white font-bold {color}"
                    hx-delete="/notices/{id}"
                    hx-trigger="load delay:{display_secs}s"
                >{message}</div>
                "#,
                id = n.id,
                kind = n.kind.as_str(),
                message = clean_text(&n.message),
            );
            acc
        });
        if self.oob {
            format!(r#"<div id="notices" hx-swap-oob="beforeend">{toasts}</div>"#)
        } else {
            toasts
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views;
    use chrono::Utc;

    fn display_npc(name: &str, status: NpcStatus) -> NpcCard {
        NpcCard::Display {
            id: 7,
            name: name.into(),
            race: "Unknown".into(),
            class: "Unknown".into(),
            description: "No description".into(),
            status,
        }
    }

    #[test]
    fn test_npc_display_card_escapes() {
        let html = display_npc("<b>Gorn</b>", NpcStatus::Alive).render();
        assert!(html.contains("&lt;b&gt;Gorn"));
        assert!(!html.contains("<b>Gorn"));
        assert!(html.contains("✓ Alive"));
        assert!(html.contains("/npcs/7/toggle-status"));
    }

    #[test]
    fn test_dead_npc_badge() {
        let html = display_npc("Gorn", NpcStatus::Dead).render();
        assert!(html.contains("✗ Dead"));
        assert!(html.contains("npc-status-badge dead"));
    }

    #[test]
    fn test_editing_card_selects_status() {
        let html = NpcCard::Editing {
            id: 3,
            name: "Tes\"saly".into(),
            race: String::new(),
            class: String::new(),
            description: String::new(),
            status: NpcStatus::Dead,
        }
        .render();
        assert!(html.contains(r#"<option value="dead" selected>"#));
        assert!(!html.contains(r#"value="Tes"saly""#));
        assert!(html.contains("Tes&quot;saly"));
        assert!(html.contains("/npcs/3/save"));
    }

    #[test]
    fn test_note_content_is_markdown_and_sanitized() {
        let html = NoteCard {
            id: 1,
            title: "Ambush".into(),
            session_date: Some("March 8, 2024".into()),
            content: "**at the bridge**<script>alert(1)</script>".into(),
            timestamp: "3/9/2024, 7:30:00 PM".into(),
        }
        .render();
        assert!(html.contains("<strong>at the bridge</strong>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(&format!(
            "Session: {}",
            clean_text("March 8, 2024")
        )));
    }

    #[test]
    fn test_markers_positioned_and_selected() {
        let markers = vec![
            MarkerView {
                id: 1,
                name: "Keep".into(),
                description: String::new(),
                left: 400.0,
                top: 100.0,
                color: "#e53e3e",
                selected: true,
            },
            MarkerView {
                id: 2,
                name: "Mill".into(),
                description: String::new(),
                left: 12.5,
                top: 3.0,
                color: "#3182ce",
                selected: false,
            },
        ];
        let html = MarkerLayer { markers: &markers }.render();
        assert!(html.contains("left: 400.00px; top: 100.00px;"));
        assert!(html.contains("left: 12.50px; top: 3.00px;"));
        assert!(html.contains("/map/markers/1/delete"));
        assert!(!html.contains("/map/markers/2/delete"));
        assert!(html.starts_with(r#"<div id="marker-layer""#));
    }

    #[test]
    fn test_map_panel_without_image() {
        let html = MapPanel {
            image_url: None,
            placing: false,
            location_count: 0,
            markers: vec![],
        }
        .render();
        assert!(html.contains("map-placeholder"));
        assert!(!html.contains("map-image"));
    }

    #[test]
    fn test_map_panel_placing() {
        let html = MapPanel {
            image_url: Some("data:image/png;base64,AAAA".into()),
            placing: true,
            location_count: 0,
            markers: vec![],
        }
        .render();
        assert!(html.contains(r#"data-placing="true""#));
        assert!(html.contains("Cancel Placement"));
        assert!(html.contains(&clean_text("data:image/png;base64,AAAA")));
    }

    #[test]
    fn test_clear_asks_only_when_there_is_something_to_clear() {
        let panel = |location_count| MapPanel {
            image_url: Some("data:image/png;base64,AAAA".into()),
            placing: false,
            location_count,
            markers: vec![],
        };
        let empty = panel(0).render();
        assert!(empty.contains("/map/markers/clear"));
        assert!(!empty.contains("Remove all"));
        assert!(panel(3)
            .render()
            .contains(r#"hx-confirm="Remove all 3 locations from the map?""#));
    }

    #[test]
    fn test_only_active_tab_visible() {
        let view = AppView {
            tabs: views::tab_bar(Tab::Notes),
            active: Tab::Notes,
            map: MapPanel {
                image_url: None,
                placing: false,
                location_count: 0,
                markers: vec![],
            },
            npcs: vec![],
            notes: vec![],
        };
        let html = view.render();
        assert!(html.contains(r#"<div id="notes" class="tab-content ">"#));
        assert!(html.contains(r#"<div id="world-map" class="tab-content hidden">"#));
        assert!(html.contains(r#"<div id="npc-cards" class="tab-content hidden">"#));
    }

    #[test]
    fn test_notice_stack() {
        let notices = vec![Notice {
            id: 4,
            kind: NoticeKind::Error,
            message: "Error saving session".into(),
            raised_at: Utc::now(),
        }];
        let html = NoticeStack {
            notices: &notices,
            display_secs: 3,
            oob: true,
        }
        .render();
        assert!(html.contains(r#"hx-swap-oob="beforeend""#));
        assert!(html.contains(r#"hx-delete="/notices/4""#));
        assert!(html.contains("load delay:3s"));
        assert!(html.contains("bg-red-500"));

        let inline = NoticeStack {
            notices: &notices,
            display_secs: 3,
            oob: false,
        }
        .render();
        assert!(!inline.contains("hx-swap-oob"));
        assert!(inline.contains(r#"id="notice-4""#));

        let empty = NoticeStack {
            notices: &[],
            display_secs: 3,
            oob: true,
        };
        assert_eq!(empty.render(), "");
    }

    #[test]
    fn test_page_puts_notices_inside_the_document() {
        let notices = vec![Notice {
            id: 9,
            kind: NoticeKind::Success,
            message: "Session loaded successfully!".into(),
            raised_at: Utc::now(),
        }];
        let html = Page {
            title: "DM Tools",
            children: Box::new(MarkerLayer { markers: &[] }),
            notices: Box::new(NoticeStack {
                notices: &notices,
                display_secs: 3,
                oob: false,
            }),
        }
        .render();
        let stack = html.find(r#"<div id="notices""#).unwrap();
        let toast = html.find(r#"id="notice-9""#).unwrap();
        let end = html.find("</html>").unwrap();
        assert!(stack < toast && toast < end);
        assert!(!html.contains("hx-swap-oob"));
    }
}

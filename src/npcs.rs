use super::{
    errors::{Outcome, ToolError},
    models::{fresh_id, Npc, NpcStatus},
};
use serde::Deserialize;

/// The edit card's fields, as submitted.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NpcForm {
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
}

fn find_mut(npcs: &mut [Npc], id: i64) -> Result<&mut Npc, ToolError> {
    npcs.iter_mut()
        .find(|n| n.id == id)
        .ok_or(ToolError::NotFound { kind: "NPC", id })
}

/// Appends a blank card, already open for editing.
pub fn add_npc(npcs: &mut Vec<Npc>, now_millis: i64) -> i64 {
    let id = fresh_id(now_millis, npcs.iter().map(|n| n.id));
    npcs.push(Npc {
        id,
        name: String::new(),
        race: String::new(),
        class: String::new(),
        description: String::new(),
        status: NpcStatus::Alive,
        is_editing: true,
    });
    id
}

pub fn save_npc(
    npcs: &mut [Npc],
    id: i64,
    form: NpcForm,
) -> Result<&Npc, ToolError> {
    let npc = find_mut(npcs, id)?;
    npc.name = form.name;
    npc.race = form.race;
    npc.class = form.class;
    npc.description = form.description;
    npc.status = form.status;
    npc.is_editing = false;
    Ok(npc)
}

pub fn edit_npc(npcs: &mut [Npc], id: i64) -> Result<(), ToolError> {
    find_mut(npcs, id)?.is_editing = true;
    Ok(())
}

/// Flips alive/dead without touching edit mode.
pub fn toggle_status(npcs: &mut [Npc], id: i64) -> Result<NpcStatus, ToolError> {
    let npc = find_mut(npcs, id)?;
    npc.status = npc.status.toggled();
    Ok(npc.status)
}

pub fn delete_npc(
    npcs: &mut Vec<Npc>,
    id: i64,
    confirmed: bool,
) -> Result<(Outcome, Npc), ToolError> {
    let index = npcs
        .iter()
        .position(|n| n.id == id)
        .ok_or(ToolError::NotFound { kind: "NPC", id })?;
    if Outcome::gate(confirmed) == Outcome::Cancelled {
        return Ok((Outcome::Cancelled, npcs[index].clone()));
    }

    Ok((Outcome::Applied, npcs.remove(index)))
}

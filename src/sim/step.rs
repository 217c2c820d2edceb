/// The step function: advances the world by one key press.
///
/// Processing order:
///   1. Player movement (one cell, clamped to the grid)
///   2. Item pickup, then refill if no items remain
///   3. Enemy contact (first matching enemy only)
///   4. Viewport re-center
///
/// Every key press runs the whole sequence, even when it carried no movement.

use log::{debug, info, warn};

use crate::domain::position::MoveDir;
use super::event::GameEvent;
use super::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, movement: Option<MoveDir>) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    world.key_presses += 1;
    world.message.clear();

    resolve_player_movement(world, movement, &mut events);
    resolve_item_pickup(world, &mut events);
    resolve_enemy_contact(world, &mut events);

    world.viewport.center_on(world.player.pos, world.width, world.height);

    events
}

// ══════════════════════════════════════════════════════════════
// Movement
// ══════════════════════════════════════════════════════════════

fn resolve_player_movement(world: &mut WorldState, movement: Option<MoveDir>, events: &mut Vec<GameEvent>) {
    let dir = match movement { Some(d) => d, None => return };
    let from = world.player.pos;
    if let Some(to) = from.step(dir, world.width, world.height) {
        world.player.pos = to;
        events.push(GameEvent::PlayerMoved { from, to });
    }
}

// ══════════════════════════════════════════════════════════════
// Items
// ══════════════════════════════════════════════════════════════

fn resolve_item_pickup(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let p = world.player.pos;
    let before = world.items.len();
    world.items.retain(|item| item.pos() != p);
    let picked = before - world.items.len();

    if picked > 0 {
        world.gold += picked as u32;
        debug!("picked {picked} gold at ({}, {}), total {}", p.row, p.col, world.gold);
        events.push(GameEvent::GoldPicked { pos: p, total: world.gold });
        world.set_message("+1 gold");
    }

    if world.items.is_empty() {
        let wanted = world.spawn.refill_items;
        let count = world.spawn_items(wanted);
        if count > 0 {
            info!("all gold collected, spawned {count} more");
            events.push(GameEvent::ItemsRespawned { count });
            world.set_message("All gold collected! More gold appeared.");
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

/// Only the first enemy on the player's cell reacts; any others sharing
/// that cell are left for a later press.
fn resolve_enemy_contact(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let p = world.player.pos;
    let idx = match world.enemies.iter().position(|e| e.pos == p) {
        Some(i) => i,
        None => return,
    };

    let gold_lost = world.gold > 0;
    world.gold = world.gold.saturating_sub(1);

    let to = world.random_free_cell();
    let enemy = &mut world.enemies[idx];
    let id = enemy.id;
    match to {
        Some(dest) => enemy.relocate(dest),
        None => warn!("no free cell to move enemy {id}, leaving it in place"),
    }

    debug!("enemy {id} bumped at ({}, {}), gold {}", p.row, p.col, world.gold);
    events.push(GameEvent::EnemyBumped { id, from: p, to, gold_lost });
    world.set_message(if gold_lost { "An enemy hit you! -1 gold" } else { "An enemy hit you!" });
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

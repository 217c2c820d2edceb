/// WorldState: the complete state of a running game.
///
/// ## Occupancy
///
/// The player, items and enemies each hold a `Position`. There is no tile
/// layer: `is_occupied()` scans the entity lists, which stay small
/// (tens of entities on hundreds of cells).
///
/// Spawning uses rejection sampling via `random_free_cell()`, so a freshly
/// spawned item or enemy never shares a cell with anything. Overlap after
/// spawn is allowed and is exactly what `sim::step` detects as a collision.
///
/// ## Viewport
///
/// `viewport` is re-centered on the player after every step.

use std::collections::HashSet;

use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{GameConfig, SpawnConfig};
use crate::domain::entity::{CollectableItem, Enemy, Player};
use crate::domain::position::Position;
use super::viewport::Viewport;

pub struct WorldState {
    pub width: usize,
    pub height: usize,

    // ── Entities ──
    pub player: Player,
    pub items: Vec<CollectableItem>,
    pub enemies: Vec<Enemy>,

    // ── Game tracking ──
    pub gold: u32,
    pub spawn: SpawnConfig,
    pub key_presses: u64,

    // ── UI ──
    pub viewport: Viewport,
    pub message: String,

    rng: StdRng,
}

impl WorldState {
    /// Build a fresh game: player at the center, initial items then enemies.
    pub fn new(config: &GameConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }

    /// Same as `new` but with a fixed seed regardless of config.
    #[cfg(test)]
    pub fn with_seed(config: &GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &GameConfig, rng: StdRng) -> Self {
        let width = config.grid.width;
        let height = config.grid.height;
        let start = Position::new(height / 2, width / 2);

        let mut world = WorldState {
            width,
            height,
            player: Player::new(start),
            items: Vec::with_capacity(config.spawn.initial_items),
            enemies: Vec::with_capacity(config.spawn.initial_enemies),
            gold: 0,
            spawn: config.spawn,
            key_presses: 0,
            viewport: Viewport::new(config.viewport.width, config.viewport.height),
            message: String::new(),
            rng,
        };

        world.spawn_items(config.spawn.initial_items);
        world.spawn_enemies(config.spawn.initial_enemies);
        world.viewport.center_on(start, width, height);
        world
    }

    /// Is anything (player, item, enemy) standing on `pos`?
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.player.pos == pos
            || self.items.iter().any(|i| i.pos() == pos)
            || self.enemies.iter().any(|e| e.pos == pos)
    }

    /// Number of distinct cells currently taken by some entity.
    fn occupied_count(&self) -> usize {
        let mut cells: HashSet<Position> = HashSet::with_capacity(1 + self.items.len() + self.enemies.len());
        cells.insert(self.player.pos);
        cells.extend(self.items.iter().map(|i| i.pos()));
        cells.extend(self.enemies.iter().map(|e| e.pos));
        cells.len()
    }

    /// Draw random cells until one is unoccupied.
    /// Returns None only when every cell is taken, where sampling would never end.
    pub fn random_free_cell(&mut self) -> Option<Position> {
        if self.occupied_count() >= self.width.saturating_mul(self.height) {
            return None;
        }
        loop {
            let row = self.rng.random_range(0..self.height);
            let col = self.rng.random_range(0..self.width);
            let pos = Position::new(row, col);
            if !self.is_occupied(pos) {
                return Some(pos);
            }
        }
    }

    /// Spawn up to `n` items on free cells. Returns how many were placed.
    pub fn spawn_items(&mut self, n: usize) -> usize {
        for placed in 0..n {
            match self.random_free_cell() {
                Some(pos) => self.items.push(CollectableItem::new(pos)),
                None => {
                    warn!("grid full: placed {placed} of {n} items");
                    return placed;
                }
            }
        }
        n
    }

    /// Spawn up to `n` enemies on free cells. Returns how many were placed.
    pub fn spawn_enemies(&mut self, n: usize) -> usize {
        for placed in 0..n {
            match self.random_free_cell() {
                Some(pos) => {
                    let id = self.enemies.len();
                    self.enemies.push(Enemy::new(id, pos));
                }
                None => {
                    warn!("grid full: placed {placed} of {n} enemies");
                    return placed;
                }
            }
        }
        n
    }

    pub fn set_message(&mut self, msg: &str) {
        self.message = msg.to_string();
    }
}

/// Entities: Player, CollectableItem, Enemy.
/// All three are just positions; behavior lives in `sim::step`.

use super::position::Position;

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Position,
}

impl Player {
    pub fn new(pos: Position) -> Self {
        Player { pos }
    }
}

/// Gold pickup. Never moves once spawned; removed when collected.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CollectableItem {
    pos: Position,
}

impl CollectableItem {
    pub fn new(pos: Position) -> Self {
        CollectableItem { pos }
    }

    pub fn pos(&self) -> Position {
        self.pos
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: usize,
    pub pos: Position,
}

impl Enemy {
    pub fn new(id: usize, pos: Position) -> Self {
        Enemy { id, pos }
    }

    pub fn relocate(&mut self, pos: Position) {
        self.pos = pos;
    }
}

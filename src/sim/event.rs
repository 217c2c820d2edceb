/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and logging.

use crate::domain::position::Position;

#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(dead_code)]
pub enum GameEvent {
    PlayerMoved { from: Position, to: Position },
    GoldPicked { pos: Position, total: u32 },
    ItemsRespawned { count: usize },
    /// `to` is None only when the grid had no free cell to move the enemy to.
    EnemyBumped { id: usize, from: Position, to: Option<Position>, gold_lost: bool },
}

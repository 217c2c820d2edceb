/// Grid coordinates and single-step movement.
///
/// Positions are (row, col) with row growing downward. Every position held
/// by the world lies inside `[0, height) x [0, width)`; `step` is the only
/// way a position changes by input, and it refuses to leave the grid.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

/// Movement direction, one cell per key press.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// The neighbouring cell in `dir`, or None when that would leave a
    /// `width` x `height` grid.
    pub fn step(self, dir: MoveDir, width: usize, height: usize) -> Option<Position> {
        match dir {
            MoveDir::Up if self.row > 0 => Some(Position::new(self.row - 1, self.col)),
            MoveDir::Down if self.row + 1 < height => Some(Position::new(self.row + 1, self.col)),
            MoveDir::Left if self.col > 0 => Some(Position::new(self.row, self.col - 1)),
            MoveDir::Right if self.col + 1 < width => Some(Position::new(self.row, self.col + 1)),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn in_bounds(self, width: usize, height: usize) -> bool {
        self.row < height && self.col < width
    }
}

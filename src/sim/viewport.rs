/// Viewport: the visible window into the grid.
///
/// `(row, col)` is the grid coordinate of the top-left visible cell.
/// `(width, height)` never change after construction and never exceed the
/// grid, so after `center_on` the window always lies fully inside the grid.

use crate::domain::position::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub row: usize,
    pub col: usize,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Viewport { row: 0, col: 0, width, height }
    }

    /// Snap the window to center on `target`, clamped to a
    /// `grid_w` x `grid_h` grid.
    pub fn center_on(&mut self, target: Position, grid_w: usize, grid_h: usize) {
        self.col = clamp_start(target.col, self.width, grid_w);
        self.row = clamp_start(target.row, self.height, grid_h);
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row >= self.row
            && pos.row < self.row + self.height
            && pos.col >= self.col
            && pos.col < self.col + self.width
    }

    /// Convert a grid position to viewport-relative (row, col).
    /// Returns None if outside the visible area.
    pub fn to_view(&self, pos: Position) -> Option<(usize, usize)> {
        if self.contains(pos) {
            Some((pos.row - self.row, pos.col - self.col))
        } else {
            None
        }
    }

    /// Grid positions covered by the window, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (self.row..self.row + self.height)
            .flat_map(move |r| (self.col..self.col + self.width).map(move |c| Position::new(r, c)))
    }
}

fn clamp_start(target: usize, view: usize, grid: usize) -> usize {
    target.saturating_sub(view / 2).min(grid.saturating_sub(view))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_at(row: usize, col: usize) -> Viewport {
        let mut v = Viewport::new(14, 12);
        v.center_on(Position::new(row, col), 30, 30);
        v
    }

    #[test]
    fn centers_on_player_in_the_middle() {
        let v = view_at(15, 15);
        assert_eq!((v.row, v.col), (9, 8));
        assert!(v.contains(Position::new(15, 15)));
    }

    #[test]
    fn clamps_at_top_left() {
        let v = view_at(0, 0);
        assert_eq!((v.row, v.col), (0, 0));
    }

    #[test]
    fn clamps_at_bottom_right() {
        let v = view_at(29, 29);
        assert_eq!((v.row, v.col), (18, 16));
        assert_eq!(v.row + v.height, 30);
        assert_eq!(v.col + v.width, 30);
    }

    #[test]
    fn window_always_inside_grid_and_fixed_size() {
        for row in 0..30 {
            for col in 0..30 {
                let v = view_at(row, col);
                assert_eq!((v.width, v.height), (14, 12));
                assert!(v.row + v.height <= 30, "row overflow at ({row},{col})");
                assert!(v.col + v.width <= 30, "col overflow at ({row},{col})");
                assert!(v.contains(Position::new(row, col)));
            }
        }
    }

    #[test]
    fn to_view_is_relative_to_window() {
        let v = view_at(15, 15);
        assert_eq!(v.to_view(Position::new(9, 8)), Some((0, 0)));
        assert_eq!(v.to_view(Position::new(20, 21)), Some((11, 13)));
        assert_eq!(v.to_view(Position::new(21, 15)), None);
        assert_eq!(v.to_view(Position::new(15, 7)), None);
    }

    #[test]
    fn cells_cover_the_window_in_order() {
        let v = view_at(15, 15);
        let cells: Vec<Position> = v.cells().collect();
        assert_eq!(cells.len(), 14 * 12);
        assert_eq!(cells[0], Position::new(9, 8));
        assert_eq!(cells[1], Position::new(9, 9));
        assert_eq!(cells[14], Position::new(10, 8));
        assert_eq!(cells.last(), Some(&Position::new(20, 21)));
        assert!(cells.iter().all(|&p| v.to_view(p).is_some()));
    }
}

//! Uniform grid used as a collision broad phase

use std::collections::HashMap;

use glam::Vec2;

/// Items are bucketed into every cell their bounding box touches, so two
/// overlapping circles always share at least one cell.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size >= 1.0 {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of non-empty cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn cell_of(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    /// Cell range covered by a circle's bounding box, or `None` for
    /// non-finite input
    fn cell_range(&self, pos: Vec2, radius: f32) -> Option<((i32, i32), (i32, i32))> {
        if !pos.is_finite() || !radius.is_finite() {
            return None;
        }
        let r = Vec2::splat(radius.max(0.0));
        Some((self.cell_of(pos - r), self.cell_of(pos + r)))
    }

    pub fn insert(&mut self, index: usize, pos: Vec2, radius: f32) {
        let Some(((x0, y0), (x1, y1))) = self.cell_range(pos, radius) else {
            return;
        };
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
    }

    /// Indices of every item whose cells overlap the circle's bounding box,
    /// ascending and without duplicates. `out` is cleared first.
    pub fn query(&self, pos: Vec2, radius: f32, out: &mut Vec<usize>) {
        out.clear();
        let Some(((x0, y0), (x1, y1))) = self.cell_range(pos, radius) else {
            return;
        };
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                if let Some(items) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(items);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_finds_neighbors_only() {
        let mut grid = SpatialGrid::new(64.0);
        grid.insert(0, Vec2::new(10.0, 10.0), 5.0);
        grid.insert(1, Vec2::new(500.0, 500.0), 5.0);
        let mut out = Vec::new();
        grid.query(Vec2::new(20.0, 20.0), 5.0, &mut out);
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn test_item_spanning_cells_is_reported_once() {
        let mut grid = SpatialGrid::new(10.0);
        grid.insert(3, Vec2::new(10.0, 10.0), 15.0);
        assert!(grid.occupied_cells() > 1);
        let mut out = Vec::new();
        grid.query(Vec2::new(12.0, 12.0), 20.0, &mut out);
        assert_eq!(out, vec![3]);
    }

    #[test]
    fn test_negative_coordinates() {
        let mut grid = SpatialGrid::new(32.0);
        grid.insert(0, Vec2::new(-40.0, -40.0), 4.0);
        let mut out = Vec::new();
        grid.query(Vec2::new(-36.0, -38.0), 2.0, &mut out);
        assert_eq!(out, vec![0]);
    }

    #[test]
    fn test_non_finite_input_is_ignored() {
        let mut grid = SpatialGrid::new(32.0);
        grid.insert(0, Vec2::new(f32::NAN, 0.0), 4.0);
        grid.insert(1, Vec2::ZERO, f32::INFINITY);
        assert_eq!(grid.occupied_cells(), 0);

        let mut out = vec![9];
        grid.query(Vec2::new(f32::INFINITY, 0.0), 1.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_invalid_cell_size_is_clamped() {
        assert_eq!(SpatialGrid::new(0.0).cell_size(), 1.0);
        assert_eq!(SpatialGrid::new(f32::NAN).cell_size(), 1.0);
    }
}

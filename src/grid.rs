use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::SimError;

/// Focus movement on a 1-D lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dir1 {
    Back,
    Forward,
}

/// Focus movement on a 2-D lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dir2 {
    Up,
    Down,
    Left,
    Right,
}

pub(crate) fn wrap(i: i64, n: usize) -> usize {
    i.rem_euclid(n as i64) as usize
}

/// An ordered lattice of cell values with a movable focus. The topology is
/// periodic: moving the focus past either end wraps to the opposite end, so
/// every cell has exactly two neighbors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor1D<T> {
    cells: Vec<T>,
    focus: usize,
}

impl<T> Cursor1D<T> {
    /// Builds a lattice of `len` cells from an initial-condition function.
    /// The focus starts at coordinate 0.
    pub fn new(len: usize, init: impl FnMut(usize) -> T) -> Self {
        assert!(len > 0, "a lattice needs at least one cell");
        Cursor1D {
            cells: (0..len).map(init).collect(),
            focus: 0,
        }
    }

    pub fn from_cells(cells: Vec<T>) -> Self {
        assert!(!cells.is_empty(), "a lattice needs at least one cell");
        Cursor1D { cells, focus: 0 }
    }

    pub(crate) fn from_parts(cells: Vec<T>, focus: usize) -> Self {
        Cursor1D { cells, focus }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused(&self) -> &T {
        &self.cells[self.focus]
    }

    pub fn value_at(&self, coord: usize) -> Result<&T, SimError> {
        self.cells.get(coord).ok_or_else(|| SimError::OutOfBounds {
            coord: vec![coord],
            extent: vec![self.cells.len()],
        })
    }

    pub fn move_focus(mut self, dir: Dir1) -> Self {
        let delta = match dir {
            Dir1::Back => -1,
            Dir1::Forward => 1,
        };
        self.focus = wrap(self.focus as i64 + delta, self.cells.len());
        self
    }

    pub fn with_value_at(mut self, coord: usize, value: T) -> Result<Self, SimError> {
        if coord >= self.cells.len() {
            return Err(SimError::OutOfBounds {
                coord: vec![coord],
                extent: vec![self.cells.len()],
            });
        }
        self.cells[coord] = value;
        Ok(self)
    }

    pub fn cells(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    pub fn into_cells(self) -> Vec<T> {
        self.cells
    }

    /// A read-only view of the lattice focused at the cursor's focus.
    pub fn view(&self) -> View1<'_, T> {
        View1 {
            cells: &self.cells,
            focus: self.focus,
        }
    }
}

impl<T: Sync> Cursor1D<T> {
    /// Applies `f` independently to every cell. Cells are evaluated in
    /// parallel; the output order is the input order.
    pub fn map_values<S: Send>(&self, f: impl Fn(&T) -> S + Sync) -> Cursor1D<S> {
        let cells = self.cells.par_iter().map(|cell| f(cell)).collect();
        Cursor1D {
            cells,
            focus: self.focus,
        }
    }

    /// Pairs two same-length lattices cell by cell.
    pub fn zip_with<U: Sync, S: Send>(
        &self,
        other: &Cursor1D<U>,
        f: impl Fn(&T, &U) -> S + Sync,
    ) -> Result<Cursor1D<S>, SimError> {
        if self.len() != other.len() {
            return Err(SimError::ShapeMismatch {
                left: vec![self.len()],
                right: vec![other.len()],
            });
        }
        let cells = (0..self.len())
            .into_par_iter()
            .map(|i| f(&self.cells[i], &other.cells[i]))
            .collect();
        Ok(Cursor1D {
            cells,
            focus: self.focus,
        })
    }

    /// Evaluates `f` on the whole lattice re-focused at every coordinate and
    /// collects the results into a new lattice. All views read the pre-update
    /// cells, so no evaluation observes a partially updated neighbor and the
    /// result is independent of evaluation order.
    pub fn context_map<S: Send>(&self, f: impl Fn(View1<'_, T>) -> S + Sync) -> Cursor1D<S> {
        let cells = (0..self.len())
            .into_par_iter()
            .map(|i| {
                f(View1 {
                    cells: &self.cells,
                    focus: i,
                })
            })
            .collect();
        Cursor1D {
            cells,
            focus: self.focus,
        }
    }

    /// As `context_map`, for per-cell functions that can fail.
    pub fn try_context_map<S: Send>(
        &self,
        f: impl Fn(View1<'_, T>) -> Result<S, SimError> + Sync,
    ) -> Result<Cursor1D<S>, SimError> {
        let cells = (0..self.len())
            .into_par_iter()
            .map(|i| {
                f(View1 {
                    cells: &self.cells,
                    focus: i,
                })
            })
            .collect::<Result<Vec<S>, SimError>>()?;
        Ok(Cursor1D {
            cells,
            focus: self.focus,
        })
    }
}

/// A borrowed, copyable view into a 1-D lattice. Shifting the focus is free;
/// the underlying cells are never copied or mutated.
#[derive(Debug)]
pub struct View1<'a, T> {
    cells: &'a [T],
    focus: usize,
}

// Views are copyable regardless of the cell type: they only hold a borrow.
impl<T> Clone for View1<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for View1<'_, T> {}

impl<'a, T> View1<'a, T> {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn focused(&self) -> &'a T {
        &self.cells[self.focus]
    }

    pub fn shifted(mut self, dir: Dir1) -> Self {
        let delta = match dir {
            Dir1::Back => -1,
            Dir1::Forward => 1,
        };
        self.focus = wrap(self.focus as i64 + delta, self.cells.len());
        self
    }

    /// The neighbor one step away, with periodic wrap.
    pub fn peek(&self, dir: Dir1) -> &'a T {
        self.shifted(dir).focused()
    }

    pub fn value_at(&self, coord: usize) -> Result<&'a T, SimError> {
        self.cells.get(coord).ok_or_else(|| SimError::OutOfBounds {
            coord: vec![coord],
            extent: vec![self.cells.len()],
        })
    }
}

/// A row/column-indexed lattice of cell values with a movable focus, stored
/// row-major. The topology is toroidal: focus movement past any edge wraps to
/// the opposite edge, so every cell has exactly four neighbors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor2D<T> {
    cells: Vec<T>,
    rows: usize,
    cols: usize,
    focus: [usize; 2],
}

impl<T> Cursor2D<T> {
    /// Builds a `rows` x `cols` lattice from an initial-condition function of
    /// `[row, col]` coordinates. The focus starts at `[0, 0]`.
    pub fn new(rows: usize, cols: usize, mut init: impl FnMut([usize; 2]) -> T) -> Self {
        assert!(rows > 0 && cols > 0, "a lattice needs at least one cell");
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(init([r, c]));
            }
        }
        Cursor2D {
            cells,
            rows,
            cols,
            focus: [0, 0],
        }
    }

    /// Builds a lattice from a row-major flat vector.
    pub fn from_cells(rows: usize, cols: usize, cells: Vec<T>) -> Self {
        assert!(rows > 0 && cols > 0, "a lattice needs at least one cell");
        assert_eq!(cells.len(), rows * cols, "cell count must match the shape");
        Cursor2D {
            cells,
            rows,
            cols,
            focus: [0, 0],
        }
    }

    pub(crate) fn from_parts(cells: Vec<T>, rows: usize, cols: usize, focus: [usize; 2]) -> Self {
        Cursor2D {
            cells,
            rows,
            cols,
            focus,
        }
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn focus(&self) -> [usize; 2] {
        self.focus
    }

    fn index(&self, coord: [usize; 2]) -> usize {
        coord[0] * self.cols + coord[1]
    }

    pub fn focused(&self) -> &T {
        &self.cells[self.index(self.focus)]
    }

    pub fn value_at(&self, coord: [usize; 2]) -> Result<&T, SimError> {
        if coord[0] >= self.rows || coord[1] >= self.cols {
            return Err(SimError::OutOfBounds {
                coord: coord.to_vec(),
                extent: vec![self.rows, self.cols],
            });
        }
        Ok(&self.cells[self.index(coord)])
    }

    pub fn move_focus(mut self, dir: Dir2) -> Self {
        let (dr, dc) = match dir {
            Dir2::Up => (-1, 0),
            Dir2::Down => (1, 0),
            Dir2::Left => (0, -1),
            Dir2::Right => (0, 1),
        };
        self.focus = [
            wrap(self.focus[0] as i64 + dr, self.rows),
            wrap(self.focus[1] as i64 + dc, self.cols),
        ];
        self
    }

    pub fn with_value_at(mut self, coord: [usize; 2], value: T) -> Result<Self, SimError> {
        if coord[0] >= self.rows || coord[1] >= self.cols {
            return Err(SimError::OutOfBounds {
                coord: coord.to_vec(),
                extent: vec![self.rows, self.cols],
            });
        }
        let i = self.index(coord);
        self.cells[i] = value;
        Ok(self)
    }

    pub fn cells(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    pub fn into_cells(self) -> Vec<T> {
        self.cells
    }

    pub fn view(&self) -> View2<'_, T> {
        View2 {
            cells: &self.cells,
            rows: self.rows,
            cols: self.cols,
            focus: self.focus,
        }
    }
}

impl<T: Sync> Cursor2D<T> {
    pub fn map_values<S: Send>(&self, f: impl Fn(&T) -> S + Sync) -> Cursor2D<S> {
        let cells = self.cells.par_iter().map(|cell| f(cell)).collect();
        Cursor2D {
            cells,
            rows: self.rows,
            cols: self.cols,
            focus: self.focus,
        }
    }

    pub fn zip_with<U: Sync, S: Send>(
        &self,
        other: &Cursor2D<U>,
        f: impl Fn(&T, &U) -> S + Sync,
    ) -> Result<Cursor2D<S>, SimError> {
        if self.shape() != other.shape() {
            return Err(SimError::ShapeMismatch {
                left: self.shape().to_vec(),
                right: other.shape().to_vec(),
            });
        }
        let cells = (0..self.cells.len())
            .into_par_iter()
            .map(|i| f(&self.cells[i], &other.cells[i]))
            .collect();
        Ok(Cursor2D {
            cells,
            rows: self.rows,
            cols: self.cols,
            focus: self.focus,
        })
    }

    pub fn context_map<S: Send>(&self, f: impl Fn(View2<'_, T>) -> S + Sync) -> Cursor2D<S> {
        let cells = (0..self.cells.len())
            .into_par_iter()
            .map(|i| {
                f(View2 {
                    cells: &self.cells,
                    rows: self.rows,
                    cols: self.cols,
                    focus: [i / self.cols, i % self.cols],
                })
            })
            .collect();
        Cursor2D {
            cells,
            rows: self.rows,
            cols: self.cols,
            focus: self.focus,
        }
    }

    pub fn try_context_map<S: Send>(
        &self,
        f: impl Fn(View2<'_, T>) -> Result<S, SimError> + Sync,
    ) -> Result<Cursor2D<S>, SimError> {
        let cells = (0..self.cells.len())
            .into_par_iter()
            .map(|i| {
                f(View2 {
                    cells: &self.cells,
                    rows: self.rows,
                    cols: self.cols,
                    focus: [i / self.cols, i % self.cols],
                })
            })
            .collect::<Result<Vec<S>, SimError>>()?;
        Ok(Cursor2D {
            cells,
            rows: self.rows,
            cols: self.cols,
            focus: self.focus,
        })
    }
}

/// A borrowed, copyable view into a 2-D lattice.
#[derive(Debug)]
pub struct View2<'a, T> {
    cells: &'a [T],
    rows: usize,
    cols: usize,
    focus: [usize; 2],
}

impl<T> Clone for View2<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for View2<'_, T> {}

impl<'a, T> View2<'a, T> {
    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    pub fn focus(&self) -> [usize; 2] {
        self.focus
    }

    pub fn focused(&self) -> &'a T {
        &self.cells[self.focus[0] * self.cols + self.focus[1]]
    }

    pub fn shifted(mut self, dir: Dir2) -> Self {
        let (dr, dc) = match dir {
            Dir2::Up => (-1, 0),
            Dir2::Down => (1, 0),
            Dir2::Left => (0, -1),
            Dir2::Right => (0, 1),
        };
        self.focus = [
            wrap(self.focus[0] as i64 + dr, self.rows),
            wrap(self.focus[1] as i64 + dc, self.cols),
        ];
        self
    }

    pub fn peek(&self, dir: Dir2) -> &'a T {
        self.shifted(dir).focused()
    }

    pub fn value_at(&self, coord: [usize; 2]) -> Result<&'a T, SimError> {
        if coord[0] >= self.rows || coord[1] >= self.cols {
            return Err(SimError::OutOfBounds {
                coord: coord.to_vec(),
                extent: vec![self.rows, self.cols],
            });
        }
        Ok(&self.cells[coord[0] * self.cols + coord[1]])
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn identity_map_preserves_cells() {
        let grid = Cursor1D::new(5, |i| i as i32 * 3);
        let mapped = grid.map_values(|&x| x);
        assert_eq!(grid, mapped);

        let grid = Cursor2D::new(3, 4, |[r, c]| r * 10 + c);
        let mapped = grid.map_values(|&x| x);
        assert_eq!(grid, mapped);
    }

    #[test]
    fn focus_wraps_around_1d() {
        let grid = Cursor1D::new(4, |i| i);
        let mut moved = grid.clone();
        for _ in 0..4 {
            moved = moved.move_focus(Dir1::Forward);
        }
        assert_eq!(moved.focus(), grid.focus());

        let back = grid.clone().move_focus(Dir1::Back);
        assert_eq!(back.focus(), 3);
        assert_eq!(*back.focused(), 3);
    }

    #[test]
    fn focus_wraps_around_2d() {
        let grid = Cursor2D::new(4, 5, |[r, c]| (r, c));
        let mut moved = grid.clone();
        for _ in 0..4 {
            moved = moved.move_focus(Dir2::Up);
        }
        assert_eq!(moved.focus(), grid.focus());

        // One full rotation returns to the starting coordinate on any torus.
        let rotated = grid
            .clone()
            .move_focus(Dir2::Up)
            .move_focus(Dir2::Right)
            .move_focus(Dir2::Down)
            .move_focus(Dir2::Left);
        assert_eq!(rotated.focus(), grid.focus());

        let left = grid.clone().move_focus(Dir2::Left);
        assert_eq!(left.focus(), [0, 4]);
    }

    #[test]
    fn value_at_rejects_out_of_bounds() {
        let grid = Cursor1D::new(3, |i| i);
        assert_eq!(*grid.value_at(2).unwrap(), 2);
        assert_eq!(
            grid.value_at(3).unwrap_err(),
            SimError::OutOfBounds {
                coord: vec![3],
                extent: vec![3]
            }
        );

        let grid = Cursor2D::new(2, 3, |[r, c]| r + c);
        assert!(grid.value_at([1, 2]).is_ok());
        assert!(grid.value_at([2, 0]).is_err());
        assert!(grid.value_at([0, 3]).is_err());
    }

    #[test]
    fn with_value_at_replaces_one_cell() {
        let grid = Cursor1D::new(4, |_| 0);
        let updated = grid.with_value_at(2, 9).unwrap();
        let expected: Vec<i32> = vec![0, 0, 9, 0];
        assert_eq!(updated.cells().copied().collect::<Vec<_>>(), expected);
        assert!(updated.with_value_at(4, 1).is_err());
    }

    #[test]
    fn zip_with_checks_shapes() {
        let a = Cursor1D::new(3, |i| i as i32);
        let b = Cursor1D::new(3, |i| i as i32 * 2);
        let summed = a.zip_with(&b, |x, y| x + y).unwrap();
        assert_eq!(summed.cells().copied().collect::<Vec<_>>(), vec![0, 3, 6]);

        let c = Cursor1D::new(4, |i| i as i32);
        assert!(a.zip_with(&c, |x, y| x + y).is_err());

        let d = Cursor2D::new(2, 2, |_| 1);
        let e = Cursor2D::new(2, 3, |_| 1);
        assert!(d.zip_with(&e, |x, y| x + y).is_err());
    }

    #[test]
    fn context_map_sees_periodic_neighbors_1d() {
        let grid = Cursor1D::from_cells(vec![1, 2, 4, 8]);
        let sums = grid.context_map(|v| v.peek(Dir1::Back) + v.focused() + v.peek(Dir1::Forward));
        assert_eq!(sums.cells().copied().collect::<Vec<_>>(), vec![11, 7, 14, 13]);
    }

    #[test]
    fn context_map_sees_periodic_neighbors_2d() {
        let grid = Cursor2D::from_cells(2, 3, vec![1, 2, 3, 4, 5, 6]);
        let sums = grid.context_map(|v| {
            v.peek(Dir2::Up) + v.peek(Dir2::Down) + v.peek(Dir2::Left) + v.peek(Dir2::Right)
        });
        // Rows wrap onto each other, so up and down are the same cell here.
        assert_eq!(
            sums.cells().copied().collect::<Vec<_>>(),
            vec![4 + 4 + 3 + 2, 5 + 5 + 1 + 3, 6 + 6 + 2 + 1, 1 + 1 + 6 + 5, 2 + 2 + 4 + 6, 3 + 3 + 5 + 4]
        );
    }

    #[test]
    fn context_map_reads_the_pre_update_grid() {
        // A shift-right rule: every cell takes its back neighbor's value. If
        // any evaluation saw a partially updated grid the result would differ
        // by evaluation order.
        let grid = Cursor1D::from_cells(vec![1, 2, 3, 4]);
        let shifted = grid.context_map(|v| *v.peek(Dir1::Back));
        assert_eq!(shifted.cells().copied().collect::<Vec<_>>(), vec![4, 1, 2, 3]);
    }

    #[test]
    fn try_context_map_propagates_errors() {
        let grid = Cursor1D::from_cells(vec![1, 2, 3]);
        let ok = grid.try_context_map(|v| Ok(*v.focused() * 2)).unwrap();
        assert_eq!(ok.cells().copied().collect::<Vec<_>>(), vec![2, 4, 6]);

        let err = grid.try_context_map(|v| {
            if *v.focused() == 2 {
                Err(SimError::NegativeHazard {
                    reaction: 0,
                    value: -1.0,
                })
            } else {
                Ok(*v.focused())
            }
        });
        assert!(err.is_err());
    }
}

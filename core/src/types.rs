use ndarray::Array2;

/// Single coordinate axis used for board rows, columns and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Board position as `(row, column)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Whether `coords` lies inside a board of the given `size`.
pub const fn in_bounds(coords: Coord2, size: Coord2) -> bool {
    coords.0 < size.0 && coords.1 < size.1
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter {
        let dim = self.dim();
        let size = (dim.0.try_into().unwrap(), dim.1.try_into().unwrap());
        NeighborIter::new(index, size)
    }
}

pub trait NeighborCellIterExt<T>: NeighborIterExt {
    fn iter_neighbor_cells_with_index(&self, index: Coord2) -> impl Iterator<Item = (Coord2, T)>;

    fn iter_neighbor_cells(&self, index: Coord2) -> impl Iterator<Item = T> {
        self.iter_neighbor_cells_with_index(index)
            .map(|(_, cell)| cell)
    }
}

impl<T: Copy> NeighborCellIterExt<T> for Array2<T> {
    fn iter_neighbor_cells_with_index(&self, index: Coord2) -> impl Iterator<Item = (Coord2, T)> {
        self.iter_neighbors(index)
            .map(|index| (index, self[index.to_nd_index()]))
    }
}

/// The 8-connected neighborhood of a cell, clipped to the board and excluding the
/// center. Walks the surrounding 3x3 window in row-major order.
#[derive(Clone, Debug)]
pub struct NeighborIter {
    center: Coord2,
    /// Last row and column of the window, inclusive.
    end: Coord2,
    first_col: Coord,
    next: Option<Coord2>,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        let (x, y) = center;
        let (rows, cols) = bounds;
        if !in_bounds(center, bounds) {
            return Self {
                center,
                end: center,
                first_col: y,
                next: None,
            };
        }

        let first_col = y.saturating_sub(1);
        Self {
            center,
            end: (x.saturating_add(1).min(rows - 1), y.saturating_add(1).min(cols - 1)),
            first_col,
            next: Some((x.saturating_sub(1), first_col)),
        }
    }

    fn advance(&mut self, (x, y): Coord2) {
        self.next = if y < self.end.1 {
            Some((x, y + 1))
        } else if x < self.end.0 {
            Some((x + 1, self.first_col))
        } else {
            None
        };
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let current = self.next?;
            self.advance(current);

            if current != self.center {
                return Some(current);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_edge_and_center_neighbor_counts() {
        assert_eq!(NeighborIter::new((0, 0), (5, 5)).count(), 3);
        assert_eq!(NeighborIter::new((0, 2), (5, 5)).count(), 5);
        assert_eq!(NeighborIter::new((2, 2), (5, 5)).count(), 8);
        assert_eq!(NeighborIter::new((4, 4), (5, 5)).count(), 3);
    }

    #[test]
    fn single_row_board_only_has_horizontal_neighbors() {
        let neighbors: Vec<_> = NeighborIter::new((0, 1), (1, 3)).collect();

        assert_eq!(neighbors, vec![(0, 0), (0, 2)]);
    }

    #[test]
    fn neighbors_come_out_row_major() {
        let neighbors: Vec<_> = NeighborIter::new((1, 1), (3, 3)).collect();

        assert_eq!(
            neighbors,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1), (2, 2)]
        );
    }

    #[test]
    fn out_of_bounds_center_has_no_neighbors() {
        assert_eq!(NeighborIter::new((3, 0), (3, 3)).count(), 0);
    }

    #[test]
    fn neighbors_never_include_center() {
        assert!(NeighborIter::new((1, 1), (3, 3)).all(|pos| pos != (1, 1)));
    }

    #[test]
    fn neighbor_cells_read_through_array() {
        let mut grid = Array2::from_elem((2, 2), 0u8);
        grid[[1, 1]] = 7;

        let cells: Vec<_> = grid.iter_neighbor_cells((0, 0)).collect();

        assert_eq!(cells, vec![0, 0, 7]);
    }
}

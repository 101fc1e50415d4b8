/// Single coordinate axis used for board width and positions.
pub type Coord = u8;

/// Count type used for cell and tile counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(row, col)`.
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

/// Taxicab distance between two positions.
pub const fn manhattan(a: Coord2, b: Coord2) -> CellCount {
    (a.0.abs_diff(b.0) as CellCount) + (a.1.abs_diff(b.1) as CellCount)
}

/// Row-major position of the `index`-th cell on a square board of `width`.
pub const fn row_major(index: CellCount, width: Coord) -> Coord2 {
    let width = width as CellCount;
    ((index / width) as Coord, (index % width) as Coord)
}

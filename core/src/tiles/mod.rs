use alloc::vec::Vec;
use ndarray::Array2;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

pub use click::*;
pub use drag::*;

mod click;
mod drag;

/// A puzzle piece.
///
/// `id`, `row` and `col` never change: they name the piece and the slot it
/// belongs in. `real_row` and `real_col` follow the slot it currently sits in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub id: CellCount,
    pub row: Coord,
    pub col: Coord,
    pub real_row: Coord,
    pub real_col: Coord,
}

impl Tile {
    fn new(id: CellCount, width: Coord, position: Coord2) -> Self {
        let (row, col) = row_major(id, width);
        Self {
            id,
            row,
            col,
            real_row: position.0,
            real_col: position.1,
        }
    }

    pub const fn home(&self) -> Coord2 {
        (self.row, self.col)
    }

    pub const fn position(&self) -> Coord2 {
        (self.real_row, self.real_col)
    }

    pub const fn is_home(&self) -> bool {
        self.row == self.real_row && self.col == self.real_col
    }

    /// Orthogonal neighbours only: diagonal and same-slot pairs are not adjacent.
    pub const fn is_adjacent_to(&self, other: &Tile) -> bool {
        manhattan(self.position(), other.position()) == 1
    }
}

/// Square board of tiles indexed by display slot.
///
/// The tile stored at slot `(r, c)` always has `real_row == r` and
/// `real_col == c`; moving a tile means moving it to another slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTileBoard")]
pub struct TileBoard {
    tiles: Array2<Tile>,
}

/// Unchecked shape of a serialized board.
#[derive(Deserialize)]
struct RawTileBoard {
    tiles: Array2<Tile>,
}

impl TryFrom<RawTileBoard> for TileBoard {
    type Error = Error;

    fn try_from(RawTileBoard { tiles }: RawTileBoard) -> Result<Self> {
        let (rows, cols) = tiles.dim();
        let width = Coord::try_from(rows).map_err(|_| Error::InvalidBoardShape)?;
        if rows != cols || !(Self::MIN_WIDTH..=Self::MAX_WIDTH).contains(&width) {
            return Err(Error::InvalidBoardShape);
        }
        check_permutation(width, tiles.iter().map(|tile| tile.id))?;
        for ((r, c), tile) in tiles.indexed_iter() {
            let slot = (r as Coord, c as Coord);
            if tile.position() != slot || tile.home() != row_major(tile.id, width) {
                return Err(Error::MisplacedTile(tile.id));
            }
        }
        Ok(Self { tiles })
    }
}

/// Every id in `0..width * width` exactly once.
fn check_permutation(
    width: Coord,
    ids: impl ExactSizeIterator<Item = CellCount>,
) -> Result<()> {
    let total = mult(width, width);
    if ids.len() != usize::from(total) {
        return Err(Error::InvalidBoardShape);
    }

    let mut seen: Vec<bool> = alloc::vec![false; usize::from(total)];
    for id in ids {
        match seen.get_mut(usize::from(id)) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(Error::InvalidTileIds(total)),
        }
    }
    Ok(())
}

impl TileBoard {
    pub const MIN_WIDTH: Coord = 2;
    pub const MAX_WIDTH: Coord = 8;
    pub const DEFAULT_WIDTH: Coord = 3;

    /// Solved board, `width` is clamped to the supported range.
    pub fn new(width: Coord) -> Self {
        let width = width.clamp(Self::MIN_WIDTH, Self::MAX_WIDTH);
        let side = usize::from(width);
        let tiles = Array2::from_shape_fn((side, side), |(r, c)| {
            let position = (r as Coord, c as Coord);
            let id = (r * side + c) as CellCount;
            Tile::new(id, width, position)
        });
        Self { tiles }
    }

    /// Board with tile `ids[i]` placed in the `i`-th slot, row-major.
    pub fn from_ids(width: Coord, ids: &[CellCount]) -> Result<Self> {
        if !(Self::MIN_WIDTH..=Self::MAX_WIDTH).contains(&width) {
            return Err(Error::InvalidBoardShape);
        }
        check_permutation(width, ids.iter().copied())?;

        let side = usize::from(width);
        let tiles = Array2::from_shape_fn((side, side), |(r, c)| {
            Tile::new(ids[r * side + c], width, (r as Coord, c as Coord))
        });
        Ok(Self { tiles })
    }

    pub fn width(&self) -> Coord {
        self.tiles.nrows() as Coord
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tiles in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub fn ids(&self) -> Vec<CellCount> {
        self.tiles.iter().map(|tile| tile.id).collect()
    }

    pub fn tile_at(&self, position: Coord2) -> Option<Tile> {
        self.tiles.get(position.to_nd_index()).copied()
    }

    /// Current state of the tile with this identity.
    pub fn find(&self, id: CellCount) -> Option<Tile> {
        self.tiles.iter().find(|tile| tile.id == id).copied()
    }

    /// Solved when every slot holds the tile whose id equals the slot index.
    pub fn is_solved(&self) -> bool {
        self.tiles
            .iter()
            .enumerate()
            .all(|(index, tile)| usize::from(tile.id) == index)
    }

    /// Exchange the tiles sitting at two display positions.
    pub fn swap(&mut self, a: Coord2, b: Coord2) -> Result<()> {
        let (rows, cols) = self.tiles.dim();
        let inside = |(r, c): Coord2| usize::from(r) < rows && usize::from(c) < cols;
        if !inside(a) || !inside(b) {
            return Err(Error::InvalidCoords);
        }
        self.swap_unchecked(a, b);
        Ok(())
    }

    /// Fisher-Yates over the slots. Identity and display position travel
    /// together, so the result is always a permutation of the home slots.
    pub fn shuffle(&mut self, rng: &mut SmallRng) {
        use rand::prelude::*;

        let width = self.width();
        let slots = self.len();
        for i in (1..slots).rev() {
            let j = rng.random_range(0..=i);
            if i != j {
                self.swap_unchecked(
                    row_major(i as CellCount, width),
                    row_major(j as CellCount, width),
                );
            }
        }
        log::debug!("shuffled tiles: {:?}", self.ids());
    }

    fn swap_unchecked(&mut self, a: Coord2, b: Coord2) {
        let (ia, ib) = (a.to_nd_index(), b.to_nd_index());
        self.tiles.swap(ia, ib);
        let tile = &mut self.tiles[ia];
        (tile.real_row, tile.real_col) = a;
        let tile = &mut self.tiles[ib];
        (tile.real_row, tile.real_col) = b;
    }
}

impl Default for TileBoard {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH)
    }
}

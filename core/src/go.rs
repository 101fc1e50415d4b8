use core::convert::Infallible;
use ndarray::Array2;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stone {
    White,
    Black,
}

/// One intersection. The board is owned by whoever renders it; this is only
/// the shape handed to the renderer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoCell {
    pub id: CellCount,
    pub row: Coord,
    pub col: Coord,
    pub owner: Option<Stone>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoBoard {
    cells: Array2<GoCell>,
}

impl GoBoard {
    pub const MIN_WIDTH: Coord = 1;
    pub const MAX_WIDTH: Coord = 19;
    pub const DEFAULT_WIDTH: Coord = 17;

    pub fn empty(width: Coord) -> Self {
        Self::from_fn(width, |_| None)
    }

    /// Board filled with stones, each white with probability `white_ratio`.
    pub fn random(config: GoConfig) -> Self {
        use rand::prelude::*;

        let mut rng = SmallRng::seed_from_u64(config.seed);
        let white_ratio = config.white_ratio.clamp(0.0, 1.0);
        Self::from_fn(config.width, |_| {
            Some(if rng.random_bool(white_ratio) {
                Stone::White
            } else {
                Stone::Black
            })
        })
    }

    fn from_fn(width: Coord, mut owner: impl FnMut(Coord2) -> Option<Stone>) -> Self {
        let width = width.clamp(Self::MIN_WIDTH, Self::MAX_WIDTH);
        let side = usize::from(width);
        let cells = Array2::from_shape_fn((side, side), |(r, c)| {
            let (row, col) = (r as Coord, c as Coord);
            GoCell {
                id: (r * side + c) as CellCount,
                row,
                col,
                owner: owner((row, col)),
            }
        });
        Self { cells }
    }

    pub fn width(&self) -> Coord {
        self.cells.nrows() as Coord
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &GoCell> {
        self.cells.iter()
    }

    pub fn cell_at(&self, position: Coord2) -> Option<GoCell> {
        self.cells.get(position.to_nd_index()).copied()
    }

    pub fn place(&mut self, position: Coord2, stone: Option<Stone>) -> Result<()> {
        let cell = self
            .cells
            .get_mut(position.to_nd_index())
            .ok_or(Error::InvalidCoords)?;
        cell.owner = stone;
        Ok(())
    }

    pub fn count(&self, stone: Stone) -> usize {
        self.cells
            .iter()
            .filter(|cell| cell.owner == Some(stone))
            .count()
    }

    /// Hoshi lines: 4th line and centre on large boards, 3rd line on small ones.
    pub fn star_lines(&self) -> &'static [Coord] {
        match self.width() {
            19 => &[3, 9, 15],
            17 => &[3, 8, 13],
            15 => &[3, 7, 11],
            13 => &[3, 6, 9],
            11 => &[2, 5, 8],
            9 => &[2, 4, 6],
            _ => &[],
        }
    }

    pub fn is_star_point(&self, (row, col): Coord2) -> bool {
        let lines = self.star_lines();
        lines.contains(&row) && lines.contains(&col)
    }
}

impl Default for GoBoard {
    fn default() -> Self {
        Self::empty(Self::DEFAULT_WIDTH)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GobangState {
    Idle,
    Selecting,
    Selected,
    /// Declared for the page layout; nothing leads here yet.
    Done,
}

impl StateNode for GobangState {
    fn path(&self) -> StatePath {
        match self {
            Self::Idle => StatePath::new(&["idle"]),
            Self::Selecting => StatePath::new(&["playing", "selecting"]),
            Self::Selected => StatePath::new(&["playing", "selected"]),
            Self::Done => StatePath::new(&["done"]),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GobangContext {
    pub board: GoBoard,
    pub current_player: Option<Stone>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GobangEvent {
    Start,
    Reset,
}

/// Session wrapper around a go board display.
#[derive(Clone, Debug)]
pub struct GobangMachine {
    initial: GobangContext,
}

impl GobangMachine {
    pub fn new(config: GoConfig) -> Self {
        Self {
            initial: GobangContext {
                board: GoBoard::random(config),
                current_player: None,
            },
        }
    }

    pub fn initial_context(&self) -> &GobangContext {
        &self.initial
    }
}

impl Default for GobangMachine {
    fn default() -> Self {
        Self::new(GoConfig::default())
    }
}

impl Machine for GobangMachine {
    type State = GobangState;
    type Context = GobangContext;
    type Event = GobangEvent;
    type Effect = Infallible;

    const ID: &'static str = "gobang";

    fn initial(&mut self) -> Step<Self> {
        Step::new(GobangState::Idle, self.initial.clone())
    }

    fn transition(
        &mut self,
        state: &GobangState,
        context: &GobangContext,
        event: GobangEvent,
    ) -> Option<Step<Self>> {
        match (state, event) {
            (_, GobangEvent::Reset) => Some(Step::new(GobangState::Idle, self.initial.clone())),
            (GobangState::Idle, GobangEvent::Start) => {
                Some(Step::new(GobangState::Selecting, context.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_has_row_major_ids() {
        let board = GoBoard::empty(9);

        assert_eq!(board.width(), 9);
        assert!(board.iter().enumerate().all(|(i, cell)| usize::from(cell.id) == i));
        assert_eq!(board.cell_at((2, 5)).map(|cell| cell.id), Some(23));
        assert_eq!(board.cell_at((9, 0)), None);
    }

    #[test]
    fn random_board_is_reproducible_and_full() {
        let config = GoConfig::default();
        let board = GoBoard::random(config);

        assert_eq!(board, GoBoard::random(config));
        assert_eq!(
            board.count(Stone::White) + board.count(Stone::Black),
            17 * 17
        );
        assert!(board.count(Stone::White) > board.count(Stone::Black));
    }

    #[test]
    fn place_checks_bounds() {
        let mut board = GoBoard::empty(9);

        board.place((4, 4), Some(Stone::Black)).unwrap();

        assert_eq!(board.cell_at((4, 4)).unwrap().owner, Some(Stone::Black));
        assert_eq!(board.place((9, 9), Some(Stone::White)), Err(Error::InvalidCoords));
    }

    #[test]
    fn star_points_on_full_board() {
        let board = GoBoard::empty(19);

        assert!(board.is_star_point((3, 3)));
        assert!(board.is_star_point((9, 15)));
        assert!(!board.is_star_point((3, 4)));
        assert!(!GoBoard::empty(5).is_star_point((2, 2)));
    }

    #[test]
    fn session_starts_and_resets() {
        let mut service = Service::new(GobangMachine::default());
        let initial = service.context().clone();

        service.send(GobangEvent::Start);
        assert!(service.matches("playing.selecting"));

        service.send(GobangEvent::Start);
        assert!(service.matches("playing"));

        service.send(GobangEvent::Reset);
        assert!(service.matches("idle"));
        assert_eq!(*service.context(), initial);
    }
}

use core::{convert::Infallible, fmt};
use serde::{Deserialize, Serialize};

use crate::{Machine, StateNode, StatePath, Step, TicTacToeConfig};

pub const CELL_COUNT: usize = 9;

/// Every row, column and diagonal of the 3x3 board.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    #[default]
    X,
    O,
}

impl Player {
    pub const fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::O => "O",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type Board = [Option<Player>; CELL_COUNT];

/// First completed line on `board`, if any.
pub fn winning_line(board: &Board) -> Option<(Player, [usize; 3])> {
    LINES.iter().find_map(|&line| {
        let [a, b, c] = line;
        match board[a] {
            Some(player) if board[b] == Some(player) && board[c] == Some(player) => {
                Some((player, line))
            }
            _ => None,
        }
    })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToeContext {
    pub board: Board,
    pub moves: u8,
    /// Player whose turn it is.
    pub player: Player,
    pub winner: Option<Player>,
}

impl TicTacToeContext {
    pub const fn new(first: Player) -> Self {
        Self {
            board: [None; CELL_COUNT],
            moves: 0,
            player: first,
            winner: None,
        }
    }

    pub fn cell(&self, index: usize) -> Option<Player> {
        self.board.get(index).copied().flatten()
    }

    pub fn is_valid_move(&self, index: usize) -> bool {
        matches!(self.board.get(index), Some(None))
    }

    fn with_move(&self, index: usize) -> Self {
        let mut next = *self;
        next.board[index] = Some(self.player);
        next.moves += 1;
        next.player = self.player.other();
        next
    }
}

impl Default for TicTacToeContext {
    fn default() -> Self {
        Self::new(Player::default())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOver {
    Winner,
    Draw,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicTacToeState {
    Playing,
    GameOver(GameOver),
}

impl TicTacToeState {
    pub const fn is_game_over(self) -> bool {
        matches!(self, Self::GameOver(_))
    }
}

impl StateNode for TicTacToeState {
    fn path(&self) -> StatePath {
        match self {
            Self::Playing => StatePath::new(&["playing"]),
            Self::GameOver(GameOver::Winner) => StatePath::new(&["gameOver", "winner"]),
            Self::GameOver(GameOver::Draw) => StatePath::new(&["gameOver", "draw"]),
        }
    }

    fn tags(&self) -> &'static [&'static str] {
        match self {
            Self::Playing => &[],
            Self::GameOver(GameOver::Winner) => &["winner"],
            Self::GameOver(GameOver::Draw) => &["draw"],
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicTacToeEvent {
    /// Mark the cell at this index for the current player.
    Play(usize),
    Reset,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TicTacToeMachine {
    initial: TicTacToeContext,
}

impl TicTacToeMachine {
    pub fn new(config: TicTacToeConfig) -> Self {
        Self {
            initial: TicTacToeContext::new(config.first_player),
        }
    }

    pub fn initial_context(&self) -> &TicTacToeContext {
        &self.initial
    }

    /// Entering `playing` immediately checks for a finished game.
    fn enter_playing(context: TicTacToeContext) -> Step<Self> {
        if winning_line(&context.board).is_some() {
            // the turn has already passed on, so the winner is the other player
            let context = TicTacToeContext {
                winner: Some(context.player.other()),
                ..context
            };
            Step::new(TicTacToeState::GameOver(GameOver::Winner), context)
        } else if usize::from(context.moves) == CELL_COUNT {
            Step::new(TicTacToeState::GameOver(GameOver::Draw), context)
        } else {
            Step::new(TicTacToeState::Playing, context)
        }
    }
}

impl Default for TicTacToeMachine {
    fn default() -> Self {
        Self::new(TicTacToeConfig::default())
    }
}

impl Machine for TicTacToeMachine {
    type State = TicTacToeState;
    type Context = TicTacToeContext;
    type Event = TicTacToeEvent;
    type Effect = Infallible;

    const ID: &'static str = "tic-tac-toe";

    fn initial(&mut self) -> Step<Self> {
        Self::enter_playing(self.initial)
    }

    fn transition(
        &mut self,
        state: &TicTacToeState,
        context: &TicTacToeContext,
        event: TicTacToeEvent,
    ) -> Option<Step<Self>> {
        use TicTacToeEvent::*;
        use TicTacToeState::*;

        match (state, event) {
            (Playing, Play(index)) if context.is_valid_move(index) => {
                log::debug!("{} plays cell {}", context.player, index);
                Some(Self::enter_playing(context.with_move(index)))
            }
            (GameOver(_), Reset) => Some(Self::enter_playing(self.initial)),
            _ => None,
        }
    }
}

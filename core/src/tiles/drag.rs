use core::convert::Infallible;
use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};

use crate::*;

/// Press-hover-release variant of the tile puzzle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragState {
    Idle,
    Selecting,
    /// A tile is pressed and the pointer may be over a target.
    Selected,
    Done,
}

impl StateNode for DragState {
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
pub struct DragContext {
    pub tiles: TileBoard,
    pub selected: Option<Tile>,
    /// Only ever an orthogonal neighbour of `selected`.
    pub hovered: Option<Tile>,
}

impl DragContext {
    pub fn new(width: Coord) -> Self {
        Self {
            tiles: TileBoard::new(width),
            selected: None,
            hovered: None,
        }
    }

    /// Whether the render layer should outline this tile.
    pub fn is_highlighted(&self, id: CellCount) -> bool {
        [self.selected, self.hovered]
            .iter()
            .flatten()
            .any(|tile| tile.id == id)
    }

    fn cleared(mut self) -> Self {
        self.selected = None;
        self.hovered = None;
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragEvent {
    /// Shuffle and begin.
    Start,
    /// Pointer pressed on a tile.
    TileSelect(Tile),
    /// Pointer entered a tile, or left one when `None`.
    TileHover(Option<Tile>),
    /// Pointer released anywhere.
    TileMove,
    Reset,
}

#[derive(Clone, Debug)]
pub struct DragMachine {
    initial: DragContext,
    rng: SmallRng,
}

impl DragMachine {
    pub fn new(config: TileConfig) -> Self {
        Self {
            initial: DragContext::new(config.width),
            rng: SmallRng::seed_from_u64(config.seed),
        }
    }

    pub fn initial_context(&self) -> &DragContext {
        &self.initial
    }

    /// Every settled transition into `playing` checks for completion first.
    fn enter_playing(context: DragContext, child: DragState) -> Step<Self> {
        if context.tiles.is_solved() {
            Step::new(DragState::Done, context.cleared())
        } else {
            Step::new(child, context)
        }
    }

    fn hover_target(context: &DragContext, tile: Option<Tile>) -> Option<Tile> {
        let selected = context.selected?;
        let tile = context.tiles.find(tile?.id)?;
        selected.is_adjacent_to(&tile).then_some(tile)
    }

    fn release(context: &DragContext) -> DragContext {
        let mut next = context.clone();
        match (context.selected, context.hovered) {
            (Some(selected), Some(hovered)) => {
                if let Err(err) = next.tiles.swap(selected.position(), hovered.position()) {
                    log::error!("could not move tile {}: {}", selected.id, err);
                }
                log::debug!("moved tile {} onto {}", selected.id, hovered.id);
            }
            _ => log::trace!("release without target, cancel"),
        }
        next.cleared()
    }
}

impl Default for DragMachine {
    fn default() -> Self {
        Self::new(TileConfig::default())
    }
}

impl Machine for DragMachine {
    type State = DragState;
    type Context = DragContext;
    type Event = DragEvent;
    type Effect = Infallible;

    const ID: &'static str = "tiles-drag";

    fn initial(&mut self) -> Step<Self> {
        Step::new(DragState::Idle, self.initial.clone())
    }

    fn transition(
        &mut self,
        state: &DragState,
        context: &DragContext,
        event: DragEvent,
    ) -> Option<Step<Self>> {
        use DragEvent::*;
        use DragState::*;

        match (state, event) {
            (_, Reset) => Some(Step::new(Idle, self.initial.clone())),
            (Idle, Start) => {
                let mut context = context.clone();
                context.tiles.shuffle(&mut self.rng);
                Some(Self::enter_playing(context, Selecting))
            }
            (Selecting, TileSelect(tile)) => {
                let tile = context.tiles.find(tile.id)?;
                let context = DragContext {
                    selected: Some(tile),
                    hovered: None,
                    ..context.clone()
                };
                Some(Step::new(Selected, context))
            }
            (Selected, TileHover(tile)) => {
                let context = DragContext {
                    hovered: Self::hover_target(context, tile),
                    ..context.clone()
                };
                Some(Step::new(Selected, context))
            }
            (Selected, TileMove) => Some(Self::enter_playing(Self::release(context), Selecting)),
            _ => None,
        }
    }
}

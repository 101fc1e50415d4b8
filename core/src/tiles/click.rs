use core::convert::Infallible;
use rand::{SeedableRng, rngs::SmallRng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Click-to-select variant: pick a tile, then pick an orthogonal neighbour to
/// swap with it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickState {
    Idle,
    Selecting,
    /// Transient: entering it swaps the selected pair and resolves straight to
    /// `Selecting` or `Done`, so it is never the settled state.
    Selected,
    Done,
}

impl StateNode for ClickState {
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
pub struct ClickContext {
    pub tiles: TileBoard,
    pub selected: SmallVec<[Tile; 2]>,
}

impl ClickContext {
    pub fn new(width: Coord) -> Self {
        Self {
            tiles: TileBoard::new(width),
            selected: SmallVec::new(),
        }
    }

    pub fn is_selected(&self, id: CellCount) -> bool {
        self.selected.iter().any(|tile| tile.id == id)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickEvent {
    /// Shuffle and begin.
    Start,
    TileSelect(Tile),
    Reset,
}

#[derive(Clone, Debug)]
pub struct ClickMachine {
    initial: ClickContext,
    rng: SmallRng,
}

impl ClickMachine {
    pub fn new(config: TileConfig) -> Self {
        Self {
            initial: ClickContext::new(config.width),
            rng: SmallRng::seed_from_u64(config.seed),
        }
    }

    pub fn initial_context(&self) -> &ClickContext {
        &self.initial
    }

    /// Second pick must be a current orthogonal neighbour of the first.
    fn is_valid_pair(context: &ClickContext, tile: &Tile) -> bool {
        match context.selected.as_slice() {
            [first] => first.is_adjacent_to(tile),
            _ => false,
        }
    }

    /// Entry of `selected`: swap the pair, clear the selection and resolve.
    fn enter_selected(mut context: ClickContext) -> Step<Self> {
        log::trace!("{}: passing through {}", Self::ID, ClickState::Selected.path());
        if let [first, second] = context.selected.as_slice() {
            let (a, b) = (first.position(), second.position());
            if let Err(err) = context.tiles.swap(a, b) {
                log::error!("could not swap {:?} and {:?}: {}", a, b, err);
            }
        }
        context.selected.clear();

        if context.tiles.is_solved() {
            Step::new(ClickState::Done, context)
        } else {
            Step::new(ClickState::Selecting, context)
        }
    }
}

impl Default for ClickMachine {
    fn default() -> Self {
        Self::new(TileConfig::default())
    }
}

impl Machine for ClickMachine {
    type State = ClickState;
    type Context = ClickContext;
    type Event = ClickEvent;
    type Effect = Infallible;

    const ID: &'static str = "tiles-click";

    fn initial(&mut self) -> Step<Self> {
        Step::new(ClickState::Idle, self.initial.clone())
    }

    fn transition(
        &mut self,
        state: &ClickState,
        context: &ClickContext,
        event: ClickEvent,
    ) -> Option<Step<Self>> {
        use ClickEvent::*;
        use ClickState::*;

        match (state, event) {
            (_, Reset) => Some(Step::new(Idle, self.initial.clone())),
            (Idle, Start) => {
                let mut context = context.clone();
                context.tiles.shuffle(&mut self.rng);
                Some(Step::new(Selecting, context))
            }
            (Selecting, TileSelect(tile)) => {
                // resolve against the board so stale positions cannot slip through
                let tile = context.tiles.find(tile.id)?;
                if context.selected.is_empty() {
                    let mut context = context.clone();
                    context.selected.push(tile);
                    Some(Step::new(Selecting, context))
                } else if Self::is_valid_pair(context, &tile) {
                    let mut context = context.clone();
                    context.selected.push(tile);
                    Some(Self::enter_selected(context))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(ids: &[CellCount]) -> Service<ClickMachine> {
        let context = ClickContext {
            tiles: TileBoard::from_ids(3, ids).unwrap(),
            selected: SmallVec::new(),
        };
        Service::resume(ClickMachine::default(), ClickState::Selecting, context)
    }

    fn select(service: &mut Service<ClickMachine>, position: Coord2) {
        let tile = service.context().tiles.tile_at(position).unwrap();
        service.send(ClickEvent::TileSelect(tile));
    }

    #[test]
    fn start_shuffles_into_selecting() {
        let mut service = Service::new(ClickMachine::default());
        assert!(service.matches("idle"));

        service.send(ClickEvent::Start);

        assert!(service.matches("playing.selecting"));
        let mut ids = service.context().tiles.ids();
        ids.sort_unstable();
        assert_eq!(ids, [0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn select_is_ignored_while_idle() {
        let mut service = Service::new(ClickMachine::default());

        select(&mut service, (0, 0));

        assert!(service.matches("idle"));
        assert!(service.context().selected.is_empty());
    }

    #[test]
    fn first_pick_is_recorded() {
        let mut service = playing(&[1, 0, 2, 3, 4, 5, 6, 7, 8]);

        select(&mut service, (1, 1));

        assert!(service.matches("playing.selecting"));
        assert!(service.context().is_selected(4));
    }

    #[test]
    fn non_adjacent_pick_keeps_first_selection() {
        let mut service = playing(&[1, 0, 2, 3, 4, 5, 6, 7, 8]);
        select(&mut service, (0, 0));

        select(&mut service, (1, 1));
        select(&mut service, (2, 0));
        select(&mut service, (0, 0));

        assert_eq!(service.context().selected.len(), 1);
        assert!(service.context().is_selected(1));
        assert_eq!(service.context().tiles.ids(), [1, 0, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn adjacent_pick_swaps_and_clears() {
        let mut service = playing(&[3, 1, 2, 0, 4, 5, 6, 7, 8]);
        select(&mut service, (0, 0));

        select(&mut service, (0, 1));

        assert!(service.matches("playing.selecting"));
        assert!(service.context().selected.is_empty());
        assert_eq!(service.context().tiles.ids(), [1, 3, 2, 0, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn solving_swap_reaches_done() {
        let mut service = playing(&[1, 0, 2, 3, 4, 5, 6, 7, 8]);

        select(&mut service, (0, 1));
        select(&mut service, (0, 0));

        assert!(service.matches("done"));
        assert!(service.context().tiles.is_solved());
        assert!(service.context().selected.is_empty());

        select(&mut service, (0, 0));
        assert!(service.context().selected.is_empty());
    }

    #[test]
    fn reset_restores_unshuffled_board() {
        let mut service = playing(&[1, 0, 2, 3, 4, 5, 6, 7, 8]);
        select(&mut service, (0, 0));

        service.send(ClickEvent::Reset);

        assert!(service.matches("idle"));
        assert_eq!(*service.context(), ClickContext::new(3));
    }
}

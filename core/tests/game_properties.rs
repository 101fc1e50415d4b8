//! Properties of the board game machines driven only through their events.

use pretty_assertions::assert_eq;
use statecraft_core::*;

fn row_major_positions(board: &TileBoard) -> bool {
    board
        .iter()
        .enumerate()
        .all(|(i, tile)| tile.position() == row_major(i as CellCount, board.width()))
}

#[test]
fn shuffle_is_a_permutation_for_every_seed_and_width() {
    for width in TileBoard::MIN_WIDTH..=TileBoard::MAX_WIDTH {
        for seed in 0..20 {
            let mut service = Service::new(ClickMachine::new(TileConfig::new(width, seed)));
            service.send(ClickEvent::Start);

            let tiles = &service.context().tiles;
            let mut ids = tiles.ids();
            ids.sort_unstable();
            let expected: Vec<CellCount> = (0..tiles.len() as CellCount).collect();
            assert_eq!(ids, expected, "width {width} seed {seed}");
            assert!(row_major_positions(tiles), "width {width} seed {seed}");
        }
    }
}

/// Cheap deterministic move source so the sequence covers occupied cells too.
fn pseudo_moves(seed: u32) -> impl Iterator<Item = usize> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    core::iter::from_fn(move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        Some(state as usize % 11)
    })
}

#[test]
fn tic_tac_toe_moves_count_accepted_plays() {
    for seed in 0..50 {
        let mut service = Service::new(TicTacToeMachine::default());
        let mut accepted = 0u8;

        for index in pseudo_moves(seed).take(30) {
            if service.state().is_game_over() {
                break;
            }
            let before = *service.context();
            service.send(TicTacToeEvent::Play(index));
            let after = *service.context();

            if after != before {
                accepted += 1;
                assert_eq!(before.cell(index), None);
                assert_eq!(after.cell(index), Some(before.player));
            }
            for cell in 0..CELL_COUNT {
                if let Some(mark) = before.cell(cell) {
                    assert_eq!(after.cell(cell), Some(mark), "mark overwritten");
                }
            }
            assert_eq!(after.moves, accepted);
        }
    }
}

#[test]
fn top_row_wins_for_x() {
    let mut service = Service::new(TicTacToeMachine::default());

    for index in [0, 3, 1, 4, 2] {
        service.send(TicTacToeEvent::Play(index));
    }

    assert!(service.matches("gameOver.winner"));
    assert!(service.has_tag("winner"));
    assert_eq!(service.context().winner, Some(Player::X));
}

#[test]
fn full_board_without_line_is_a_draw() {
    let mut service = Service::new(TicTacToeMachine::default());

    // X O X / X O O / O X X
    for index in [0, 1, 2, 4, 3, 5, 7, 6, 8] {
        service.send(TicTacToeEvent::Play(index));
    }

    assert!(service.matches("gameOver.draw"));
    assert_eq!(service.context().winner, None);
    assert_eq!(service.context().moves, 9);
}

#[test]
fn click_pairs_swap_only_when_adjacent() {
    let board = TileBoard::from_ids(3, &[4, 1, 2, 3, 0, 5, 6, 7, 8]).unwrap();
    let context = ClickContext {
        tiles: board.clone(),
        ..ClickContext::new(3)
    };
    let mut service = Service::resume(ClickMachine::default(), ClickState::Selecting, context);
    let tile = |service: &Service<ClickMachine>, position| {
        service.context().tiles.tile_at(position).unwrap()
    };

    let first = tile(&service, (0, 0));
    let diagonal = tile(&service, (1, 1));
    service.send(ClickEvent::TileSelect(first));
    service.send(ClickEvent::TileSelect(diagonal));
    assert!(service.matches("playing.selecting"));
    assert_eq!(service.context().tiles, board);

    let neighbour = tile(&service, (0, 1));
    service.send(ClickEvent::TileSelect(neighbour));
    assert!(service.context().selected.is_empty());
    assert_eq!(service.context().tiles.ids(), [1, 4, 2, 3, 0, 5, 6, 7, 8]);
}

#[test]
fn click_puzzle_reaches_done_after_solving_swaps() {
    let context = ClickContext {
        tiles: TileBoard::from_ids(3, &[1, 4, 2, 3, 0, 5, 6, 7, 8]).unwrap(),
        ..ClickContext::new(3)
    };
    let mut service = Service::resume(ClickMachine::default(), ClickState::Selecting, context);

    for (a, b) in [((0, 1), (1, 1)), ((0, 0), (0, 1))] {
        for position in [a, b] {
            let tile = service.context().tiles.tile_at(position).unwrap();
            service.send(ClickEvent::TileSelect(tile));
        }
    }

    assert!(service.matches("done"));
    assert!(service.context().tiles.is_solved());
}

#[test]
fn drag_release_without_hover_cancels() {
    let mut service = Service::new(DragMachine::new(TileConfig::new(3, 5)));
    service.send(DragEvent::Start);
    assert!(service.matches("playing.selecting"));
    let before = service.context().tiles.clone();

    let tile = before.tile_at((1, 1)).unwrap();
    service.send(DragEvent::TileSelect(tile));
    service.send(DragEvent::TileMove);

    assert!(service.matches("playing.selecting"));
    assert_eq!(service.context().tiles, before);
    assert_eq!(service.context().selected, None);
    assert_eq!(service.context().hovered, None);
}

#[test]
fn reset_restores_construction_time_context() {
    let mut tictactoe = Service::new(TicTacToeMachine::default());
    let initial = *tictactoe.context();
    for index in [0, 3, 1, 4, 2] {
        tictactoe.send(TicTacToeEvent::Play(index));
    }
    for _ in 0..2 {
        tictactoe.send(TicTacToeEvent::Reset);
        assert!(tictactoe.matches("playing"));
        assert_eq!(*tictactoe.context(), initial);
    }

    let mut click = Service::new(ClickMachine::default());
    let initial = click.context().clone();
    click.send(ClickEvent::Start);
    for _ in 0..2 {
        click.send(ClickEvent::Reset);
        assert!(click.matches("idle"));
        assert_eq!(*click.context(), initial);
    }

    let mut drag = Service::new(DragMachine::default());
    let initial = drag.context().clone();
    drag.send(DragEvent::Start);
    for _ in 0..2 {
        drag.send(DragEvent::Reset);
        assert!(drag.matches("idle"));
        assert_eq!(*drag.context(), initial);
    }
}

#[test]
fn snapshot_serializes_path_tags_and_context() {
    let mut service = Service::new(TicTacToeMachine::default());
    for index in [0, 3, 1, 4, 2] {
        service.send(TicTacToeEvent::Play(index));
    }

    let json = service.snapshot().to_json().unwrap();

    assert_eq!(json["state"], serde_json::json!(["gameOver", "winner"]));
    assert_eq!(json["tags"], serde_json::json!(["winner"]));
    assert_eq!(json["context"]["moves"], serde_json::json!(5));
}

#[test]
fn restored_context_must_hold_a_square_board() {
    let mut json = serde_json::to_value(ClickContext::new(3)).unwrap();
    let board = &mut json["tiles"]["tiles"];
    board["dim"] = serde_json::json!([3, 2]);
    board["data"].as_array_mut().unwrap().truncate(6);

    assert!(serde_json::from_value::<ClickContext>(json).is_err());
}

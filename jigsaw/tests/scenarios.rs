use std::collections::HashSet;

use engine::surface::SurfaceSize;
use image::{Rgba, RgbaImage};
use jigsaw::{
    Board, ClampPolicy, GridSize, MaskSet, Placement, PuzzleConfig, PuzzleError, PuzzleInput,
    PuzzleSession, SessionEvent,
};

// 50 px cells, 10 px tabs, margin 1: the board is three images wide, the solved area starts at
// (150, 150) for a 150x150 source and the snap tolerance is 10 px.
fn source(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 3) as u8, (y * 5) as u8, ((x + y) % 256) as u8, 255])
    })
}

fn config(policy: ClampPolicy) -> PuzzleConfig {
    PuzzleConfig {
        margin: 1,
        clamp_policy: policy,
        ..PuzzleConfig::default()
    }
}

fn board_with(cols: u32, rows: u32, placement: Placement, policy: ClampPolicy) -> Board {
    let masks = MaskSet::procedural(50, 10).expect("masks");
    let grid = GridSize::new(cols, rows).expect("grid");
    Board::with_placement(
        &source(cols * 50, rows * 50),
        &masks,
        grid,
        &config(policy),
        placement,
    )
    .expect("board")
}

fn presolved() -> Board {
    board_with(3, 3, Placement::PreSolved, ClampPolicy::CancelAxis)
}

#[test]
fn slicing_yields_one_piece_per_cell() {
    for (cols, rows) in [(3, 3), (5, 3), (3, 7)] {
        let b = board_with(cols, rows, Placement::Scattered { seed: 1 }, ClampPolicy::CancelAxis);
        assert_eq!(b.len(), (cols * rows) as usize);
        let cells: HashSet<_> = b.pieces().iter().map(|p| (p.row(), p.col())).collect();
        assert_eq!(cells.len(), b.len());
        for row in 0..rows {
            for col in 0..cols {
                let piece = b.piece_at(row, col).expect("cell");
                assert_eq!((piece.row(), piece.col()), (row, col));
            }
        }
        assert!(b.piece_at(rows, 0).is_none());
    }
}

#[test]
fn even_grid_is_rejected() {
    assert!(matches!(
        GridSize::new(4, 3),
        Err(PuzzleError::InvalidGrid { cols: 4, rows: 3 })
    ));
    assert!(GridSize::new(0, 3).is_err());
}

#[test]
fn source_smaller_than_grid_is_rejected() {
    let masks = MaskSet::procedural(50, 10).expect("masks");
    let grid = GridSize::new(5, 5).expect("grid");
    let result = Board::with_placement(
        &source(3, 3),
        &masks,
        grid,
        &config(ClampPolicy::CancelAxis),
        Placement::PreSolved,
    );
    assert!(matches!(result, Err(PuzzleError::SourceTooSmall { .. })));
}

#[test]
fn presolved_board_becomes_one_locked_group() {
    let mut b = presolved();
    assert_eq!(b.group_count(), 9);
    for id in 0..b.len() {
        b.connection_check(id);
    }
    assert_eq!(b.group_count(), 1);
    assert_eq!(b.group_members(4).len(), 9);
    assert!(b.is_complete());
    assert!((0..9).all(|id| b.is_locked(id)));
}

#[test]
fn snap_requires_delta_strictly_below_tolerance() {
    let mut b = presolved();
    assert_eq!(b.connect_tolerance(), 10.0);

    // Ten pixels right of where every neighbor wants the centre piece.
    b.place_group(4, 210.0, 200.0);
    assert_eq!(b.connection_check(4).merges, 0);
    b.place_group(4, 200.0, 190.0);
    assert_eq!(b.connection_check(4).merges, 0);
    assert_eq!(b.group_count(), 9);

    b.place_group(4, 209.0, 191.0);
    assert_eq!(b.connection_check(4).merges, 4);
    assert_eq!(b.piece(4).position(), (200.0, 200.0));
    assert_eq!(b.group_members(4).len(), 5);
}

#[test]
fn corner_anchor_locks_the_current_cluster() {
    let mut b = presolved();
    b.place_group(1, 300.0, 20.0);
    b.place_group(3, 20.0, 300.0);
    b.place_group(0, 156.0, 147.0);

    let outcome = b.connection_check(0);
    assert!(outcome.anchored);
    assert_eq!(b.piece(0).position(), (150.0, 150.0));
    assert!(b.is_locked(0));
    assert!(!b.is_locked(1));
}

#[test]
fn edge_piece_on_its_cell_does_not_anchor() {
    let mut b = presolved();
    b.place_group(0, 20.0, 20.0);
    b.place_group(2, 380.0, 20.0);
    b.place_group(4, 300.0, 300.0);

    let outcome = b.connection_check(1);
    assert!(!outcome.anchored);
    assert!(!b.is_locked(1));
}

#[test]
fn free_cluster_joining_locked_cluster_is_locked() {
    let mut b = presolved();
    b.place_group(1, 300.0, 20.0);
    b.place_group(3, 20.0, 300.0);
    b.place_group(2, 380.0, 20.0);
    b.place_group(4, 300.0, 300.0);
    assert!(b.connection_check(0).anchored);

    b.place_group(1, 203.0, 148.0);
    let outcome = b.release(1);
    assert_eq!(outcome.merges, 1);
    assert_eq!(outcome.group_size, 2);
    assert!(b.same_group(0, 1));
    assert!(b.group_members(0).iter().all(|&m| b.is_locked(m)));
    assert_eq!(b.piece(0).position(), (150.0, 150.0));
}

#[test]
fn cancel_axis_keeps_the_group_where_it_was_on_that_axis() {
    let mut b = board_with(3, 3, Placement::PreSolved, ClampPolicy::CancelAxis);
    b.place_group(8, 385.0, 200.0);
    b.move_group(8, 60.0, 15.0);
    assert_eq!(b.piece(8).position(), (385.0, 215.0));
    assert!(b.extent().contains_rect(&b.piece(8).sprite_bounds()));

    b.move_group(8, -1000.0, -1000.0);
    assert_eq!(b.piece(8).position(), (385.0, 215.0));
}

#[test]
fn clamp_moves_the_group_to_the_nearest_legal_spot() {
    let mut b = board_with(3, 3, Placement::PreSolved, ClampPolicy::Clamp);
    b.place_group(8, 385.0, 200.0);
    b.move_group(8, 60.0, 15.0);
    assert_eq!(b.piece(8).position(), (400.0, 215.0));

    b.move_group(8, -1000.0, -1000.0);
    assert_eq!(b.piece(8).position(), (0.0, 0.0));
}

#[test]
fn scattered_layout_leaves_the_solved_area_empty() {
    for seed in [0, 7, 42, 1234] {
        let b = board_with(5, 3, Placement::Scattered { seed }, ClampPolicy::CancelAxis);
        let solved = b.solved_rect();
        for piece in b.pieces() {
            let bounds = piece.sprite_bounds();
            assert!(!bounds.overlaps(&solved), "seed {seed}: {bounds:?}");
            assert!(b.extent().contains_rect(&bounds), "seed {seed}: {bounds:?}");
        }
    }
}

#[test]
fn session_solves_a_displaced_centre_piece() {
    let b = presolved();
    let cfg = config(ClampPolicy::CancelAxis);
    let mut session = PuzzleSession::new(b, SurfaceSize::new(450, 450), &cfg);
    session.board_mut().place_group(4, 30.0, 30.0);
    for id in [0, 1, 2, 3, 5, 6, 7, 8] {
        session.board_mut().connection_check(id);
    }
    assert_eq!(session.board().group_count(), 2);

    assert_eq!(
        session.handle_input(PuzzleInput::Press { x: 40.0, y: 40.0 }),
        vec![SessionEvent::PickedUp(4)]
    );
    session.handle_input(PuzzleInput::Drag { dx: 85.0, dy: 80.0 });
    session.handle_input(PuzzleInput::Drag { dx: 88.0, dy: 94.0 });
    let events = session.handle_input(PuzzleInput::Release);

    assert!(events.contains(&SessionEvent::Completed));
    assert!(session.is_complete());
    assert_eq!(session.board().piece(4).position(), (200.0, 200.0));
    assert!(session.board().flattened_count() > 0);
}

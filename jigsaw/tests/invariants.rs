use std::collections::HashSet;

use engine::surface::SurfaceSize;
use image::{Rgba, RgbaImage};
use jigsaw::{
    Board, GridSize, MaskSet, Placement, PuzzleConfig, PuzzleInput, PuzzleSession, SessionEvent,
};
use proptest::prelude::*;

const EPS: f32 = 1e-3;

fn session(placement: Placement) -> PuzzleSession {
    let source = RgbaImage::from_fn(150, 150, |x, y| Rgba([x as u8, y as u8, 128, 255]));
    let masks = MaskSet::procedural(50, 10).expect("masks");
    let grid = GridSize::new(3, 3).expect("grid");
    let config = PuzzleConfig {
        margin: 1,
        ..PuzzleConfig::default()
    };
    let board = Board::with_placement(&source, &masks, grid, &config, placement).expect("board");
    PuzzleSession::new(board, SurfaceSize::new(450, 450), &config)
}

fn gesture() -> impl Strategy<Value = PuzzleInput> {
    prop_oneof![
        (0.0f32..450.0, 0.0f32..450.0).prop_map(|(x, y)| PuzzleInput::Press { x, y }),
        (-120.0f32..120.0, -120.0f32..120.0).prop_map(|(dx, dy)| PuzzleInput::Drag { dx, dy }),
        (-3i32..=3, -3i32..=3).prop_map(|(dx, dy)| PuzzleInput::Drag {
            dx: dx as f32,
            dy: dy as f32,
        }),
        Just(PuzzleInput::Release),
    ]
}

fn placement() -> impl Strategy<Value = Placement> {
    prop_oneof![
        Just(Placement::PreSolved),
        any::<u64>().prop_map(|seed| Placement::Scattered { seed }),
    ]
}

fn check_groups(board: &Board) -> Result<(), TestCaseError> {
    let mut covered = 0;
    let mut roots = HashSet::new();
    for a in 0..board.len() {
        let members = board.group_members(a);
        prop_assert!(members.contains(&a));
        for &m in members {
            prop_assert_eq!(board.group_of(m), board.group_of(a));
            prop_assert!(board.group_members(m).contains(&a));
            prop_assert_eq!(board.is_locked(m), board.is_locked(a));
        }
        if roots.insert(board.group_of(a)) {
            covered += members.len();
        }
    }
    prop_assert_eq!(covered, board.len());
    prop_assert_eq!(roots.len(), board.group_count());
    prop_assert_eq!(board.is_complete(), board.group_count() == 1);
    Ok(())
}

fn check_layout(board: &Board) -> Result<(), TestCaseError> {
    let extent = board.extent();
    for piece in board.pieces() {
        let b = piece.sprite_bounds();
        prop_assert!(b.x >= extent.x - EPS && b.y >= extent.y - EPS, "{b:?}");
        prop_assert!(
            b.right() <= extent.right() + EPS && b.bottom() <= extent.bottom() + EPS,
            "{b:?}"
        );
    }

    let order: HashSet<_> = board.draw_order().iter().copied().collect();
    prop_assert_eq!(order.len(), board.len());
    prop_assert_eq!(board.draw_order().len(), board.len());
    prop_assert!(order.iter().all(|&id| id < board.len()));
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn gestures_preserve_board_invariants(
        placement in placement(),
        gestures in prop::collection::vec(gesture(), 1..60),
    ) {
        let mut s = session(placement);
        let mut locked = vec![false; s.board().len()];
        let mut flattened = vec![false; s.board().len()];
        let mut completions = 0;

        for input in gestures {
            let events = s.handle_input(input);
            for event in &events {
                match *event {
                    SessionEvent::PickedUp(id) => prop_assert!(!s.board().is_locked(id)),
                    SessionEvent::Completed => completions += 1,
                    _ => {}
                }
            }

            let board = s.board();
            check_groups(board)?;
            check_layout(board)?;
            for (id, piece) in board.pieces().iter().enumerate() {
                prop_assert!(!locked[id] || board.is_locked(id), "piece {id} unlocked");
                prop_assert!(!flattened[id] || piece.is_flattened(), "piece {id} unflattened");
                locked[id] = board.is_locked(id);
                flattened[id] = piece.is_flattened();
            }
        }
        prop_assert!(completions <= 1);
    }

    #[test]
    fn snap_happens_only_below_tolerance(dx in -15.0f32..15.0, dy in -15.0f32..15.0) {
        let mut s = session(Placement::PreSolved);
        let board = s.board_mut();
        let tol = board.connect_tolerance();
        // Lone edge piece at the top with only piece 0 near its solved spot.
        board.place_group(2, 380.0, 20.0);
        board.place_group(4, 300.0, 300.0);
        board.place_group(1, 200.0 + dx, 150.0 + dy);
        let (x, y) = board.piece(1).position();
        let (dx, dy) = (x - 200.0, y - 150.0);

        let merged = board.connection_check(1).merges > 0;
        prop_assert_eq!(merged, dx.abs() < tol && dy.abs() < tol);
        if merged {
            prop_assert_eq!(board.piece(1).position(), (200.0, 150.0));
        }
    }
}

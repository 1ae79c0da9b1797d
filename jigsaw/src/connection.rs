//! Snapping, merging and anchoring after a drag ends.

use crate::board::Board;
use crate::geometry::PieceId;
use crate::group::GroupId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectOutcome {
    /// Unions performed with neighboring clusters.
    pub merges: usize,
    /// The cluster was newly locked onto its solved corner.
    pub anchored: bool,
}

impl ConnectOutcome {
    fn absorb(&mut self, other: ConnectOutcome) {
        self.merges += other.merges;
        self.anchored |= other.anchored;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub merges: usize,
    pub anchored: bool,
    /// Cluster of the released piece after all merges.
    pub group: GroupId,
    pub group_size: usize,
    pub completed: bool,
}

impl Board {
    /// Tests `id` against its grid neighbors (up, left, down, right) and then, for corner cells,
    /// against its solved corner. Checks do not short-circuit, so one call can chain several
    /// clusters together.
    pub fn connection_check(&mut self, id: PieceId) -> ConnectOutcome {
        let (row, col) = self.grid.position(id);
        let (cw, ch) = (self.cell_width, self.cell_height);
        let mut outcome = ConnectOutcome::default();

        // Neighbor cell and the offset from its position to where `id` belongs.
        let candidates = [
            (row.checked_sub(1).map(|r| (r, col)), 0.0, ch),
            (col.checked_sub(1).map(|c| (row, c)), cw, 0.0),
            ((row + 1 < self.grid.rows()).then_some((row + 1, col)), 0.0, -ch),
            ((col + 1 < self.grid.cols()).then_some((row, col + 1)), -cw, 0.0),
        ];
        for (cell, off_x, off_y) in candidates {
            let Some((r, c)) = cell else {
                continue;
            };
            let other = self.grid.id(r, c);
            if self.groups.same_group(id, other) {
                continue;
            }
            let (nx, ny) = self.pieces[other].position();
            if self.try_snap(id, other, nx + off_x, ny + off_y) {
                outcome.merges += 1;
            }
        }

        if self.grid.is_corner(row, col) {
            outcome.anchored = self.try_anchor(id);
        }
        outcome
    }

    /// Runs `connection_check` for every member the held cluster had when it was let go.
    pub fn release(&mut self, held: PieceId) -> ReleaseOutcome {
        let members = self.groups.members(held).to_vec();
        let mut total = ConnectOutcome::default();
        for m in members {
            total.absorb(self.connection_check(m));
        }

        let outcome = ReleaseOutcome {
            merges: total.merges,
            anchored: total.anchored,
            group: self.groups.find(held),
            group_size: self.groups.size(held),
            completed: self.groups.is_complete(),
        };
        if outcome.completed && (total.merges > 0 || total.anchored) {
            tracing::info!(pieces = self.pieces.len(), "puzzle complete");
        }
        outcome
    }

    fn try_snap(&mut self, id: PieceId, other: PieceId, tx: f32, ty: f32) -> bool {
        let (x, y) = self.pieces[id].position();
        let dx = tx - x;
        let dy = ty - y;
        let tol = self.connect_tolerance;
        if dx.abs() >= tol || dy.abs() >= tol {
            return false;
        }

        // A locked cluster stays where it is. Otherwise the checked side moves, or the
        // neighbor's side when the checked one would leave the board.
        let id_free = !self.groups.is_locked(id);
        let other_free = !self.groups.is_locked(other);
        if id_free || other_free {
            let mover = [(id_free, id, dx, dy), (other_free, other, -dx, -dy)]
                .into_iter()
                .find(|&(free, mover, mx, my)| free && self.group_fits(mover, mx, my));
            let Some((_, mover, mx, my)) = mover else {
                tracing::debug!(id, other, "snap would leave the board, skipped");
                return false;
            };
            self.translate_group(mover, mx, my);
        }
        let root = self.groups.union(id, other);
        tracing::debug!(
            id,
            other,
            group = root,
            size = self.groups.size(root),
            locked = self.groups.is_locked(root),
            "clusters merged"
        );

        if self.render_optimization {
            let members = self.groups.members(root).to_vec();
            for m in members {
                self.landlock_check(m);
            }
        }
        true
    }

    fn try_anchor(&mut self, id: PieceId) -> bool {
        if self.groups.is_locked(id) {
            return false;
        }
        let (tx, ty) = self.solved_position(id);
        let (x, y) = self.pieces[id].position();
        let dx = tx - x;
        let dy = ty - y;
        let tol = self.connect_tolerance;
        if dx.abs() >= tol || dy.abs() >= tol {
            return false;
        }

        self.translate_group(id, dx, dy);
        self.groups.lock(id);
        tracing::info!(
            id,
            size = self.groups.size(id),
            "cluster anchored at its corner"
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use crate::board::Board;
    use crate::config::{Placement, PuzzleConfig};
    use crate::geometry::GridSize;
    use crate::masks::MaskSet;

    fn board(placement: Placement) -> Board {
        let source = RgbaImage::from_fn(150, 150, |x, y| Rgba([x as u8, y as u8, 0, 255]));
        let masks = MaskSet::procedural(50, 10).expect("masks");
        let grid = GridSize::new(3, 3).expect("grid");
        let config = PuzzleConfig {
            margin: 1,
            ..PuzzleConfig::default()
        };
        Board::with_placement(&source, &masks, grid, &config, placement).expect("board")
    }

    #[test]
    fn snap_moves_the_dragged_cluster_onto_its_neighbor() {
        let mut b = board(Placement::PreSolved);
        // Piece 4 (centre) knocked 6 px right and 3 px up.
        b.place_group(4, 206.0, 197.0);
        let outcome = b.connection_check(4);
        assert_eq!(outcome.merges, 4);
        assert!(!outcome.anchored);
        assert_eq!(b.piece(4).position(), (200.0, 200.0));
        assert_eq!(b.group_members(4).len(), 5);
    }

    #[test]
    fn delta_equal_to_tolerance_does_not_snap() {
        let mut b = board(Placement::PreSolved);
        b.place_group(1, 250.0, 0.0);
        // Exactly one tolerance (10 px) left of where piece 1 wants piece 0.
        b.place_group(0, 190.0, 0.0);
        assert_eq!(b.connection_check(0).merges, 0);
        assert!(!b.same_group(0, 1));

        b.place_group(0, 190.5, 0.0);
        assert_eq!(b.connection_check(0).merges, 1);
        assert!(b.same_group(0, 1));
        assert_eq!(b.piece(0).position(), (200.0, 0.0));
    }

    #[test]
    fn corner_piece_anchors_near_its_solved_corner() {
        let mut b = board(Placement::PreSolved);
        b.place_group(1, 300.0, 0.0);
        b.place_group(3, 0.0, 300.0);
        b.place_group(0, 154.0, 147.0);

        let outcome = b.connection_check(0);
        assert!(outcome.anchored);
        assert_eq!(outcome.merges, 0);
        assert_eq!(b.piece(0).position(), (150.0, 150.0));
        assert!(b.is_locked(0));
    }

    #[test]
    fn corner_anchor_locks_whole_cluster() {
        let mut b = board(Placement::PreSolved);
        b.place_group(2, 390.0, 0.0);
        b.place_group(3, 0.0, 300.0);
        b.place_group(4, 300.0, 300.0);
        b.place_group(1, 60.0, 20.0);
        b.place_group(0, 10.0, 20.0);
        assert_eq!(b.connection_check(0).merges, 1);
        assert!(!b.is_locked(0));

        b.place_group(0, 153.0, 152.0);
        let outcome = b.release(0);
        assert!(outcome.anchored);
        assert_eq!(outcome.group_size, 2);
        assert!(b.is_locked(1));
        assert_eq!(b.piece(1).position(), (200.0, 150.0));
    }

    #[test]
    fn only_corner_cells_anchor() {
        let mut b = board(Placement::PreSolved);
        b.place_group(0, 10.0, 10.0);
        b.place_group(2, 390.0, 10.0);
        b.place_group(4, 300.0, 300.0);
        // Piece 1 is exactly on its solved cell but is an edge piece.
        let outcome = b.connection_check(1);
        assert_eq!(outcome.merges, 0);
        assert!(!outcome.anchored);
        assert!(!b.is_locked(1));
    }

    #[test]
    fn merging_with_locked_cluster_locks_everything() {
        let mut b = board(Placement::PreSolved);
        b.place_group(1, 300.0, 0.0);
        b.place_group(3, 0.0, 300.0);
        assert!(b.connection_check(0).anchored);
        assert!(b.is_locked(0));
        assert!(!b.is_locked(1));

        b.place_group(1, 203.0, 148.0);
        let outcome = b.release(1);
        assert!(outcome.merges >= 1);
        assert!(b.same_group(0, 1));
        assert!(b.is_locked(1));
    }

    #[test]
    fn locked_cluster_pulls_free_neighbor_without_moving() {
        let mut b = board(Placement::PreSolved);
        b.place_group(1, 300.0, 0.0);
        b.place_group(3, 0.0, 300.0);
        assert!(b.connection_check(0).anchored);

        b.place_group(1, 203.0, 148.0);
        assert_eq!(b.connection_check(0).merges, 1);
        assert_eq!(b.piece(0).position(), (150.0, 150.0));
        assert_eq!(b.piece(1).position(), (200.0, 150.0));
        assert!(b.is_locked(1));
    }

    #[test]
    fn snap_at_board_edge_moves_the_neighbor_instead() {
        let mut b = board(Placement::PreSolved);
        // Piece 7's sprite already touches the bottom edge, so it cannot drop the 5 px onto
        // piece 4; piece 4 comes up instead.
        b.place_group(4, 300.0, 355.0);
        b.place_group(7, 300.0, 400.0);
        assert_eq!(b.piece(7).sprite_bounds().bottom(), 450.0);

        assert_eq!(b.connection_check(7).merges, 1);
        assert!(b.same_group(4, 7));
        assert_eq!(b.piece(7).position(), (300.0, 400.0));
        assert_eq!(b.piece(4).position(), (300.0, 350.0));
    }

    #[test]
    fn presolved_three_by_three_completes_in_one_pass() {
        let mut b = board(Placement::PreSolved);
        for id in 0..9 {
            b.connection_check(id);
        }
        assert_eq!(b.group_members(0).len(), 9);
        assert_eq!(b.group_count(), 1);
        assert!(b.is_complete());
        assert!((0..9).all(|id| b.is_locked(id)));
    }
}

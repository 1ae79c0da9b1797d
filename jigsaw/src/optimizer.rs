//! Flattening of enclosed pieces.
//!
//! A piece whose every grid neighbor is in its own cluster can never show a tab edge again, so
//! it is drawn with its plain crop instead of the stencilled sprite. Positions, hit-testing and
//! cluster state are untouched.

use crate::board::Board;
use crate::geometry::PieceId;

impl Board {
    /// Grid neighbors of `id`, computed on first use.
    pub fn neighbors(&self, id: PieceId) -> &[PieceId] {
        let piece = &self.pieces[id];
        let grid = self.grid;
        piece
            .neighbors
            .get_or_init(|| grid.neighbors(piece.row(), piece.col()))
    }

    /// Flattens `id` if it is enclosed by its own cluster. Returns whether it is flattened.
    pub fn landlock_check(&mut self, id: PieceId) -> bool {
        if self.pieces[id].flattened {
            return true;
        }
        let enclosed = self
            .neighbors(id)
            .iter()
            .all(|&n| self.groups.same_group(id, n));
        if enclosed {
            self.pieces[id].flattened = true;
            tracing::trace!(id, "piece flattened");
        }
        enclosed
    }

    pub fn flattened_count(&self) -> usize {
        self.pieces.iter().filter(|p| p.is_flattened()).count()
    }
}

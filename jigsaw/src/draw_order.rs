use crate::geometry::PieceId;

/// Back-to-front paint order, kept as generation stamps.
///
/// Touching a piece gives it the next stamp; the ordered list is only built when a frame asks
/// for it. Pieces touched together keep their previous relative order, so a dragged cluster
/// stays internally stacked the way it was.
#[derive(Debug, Clone)]
pub struct DrawOrder {
    stamps: Vec<u64>,
    next: u64,
}

impl DrawOrder {
    pub fn new(len: usize) -> Self {
        Self {
            stamps: (0..len as u64).collect(),
            next: len as u64,
        }
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn touch(&mut self, id: PieceId) {
        self.stamps[id] = self.next;
        self.next += 1;
    }

    /// Brings `ids` to the front together.
    pub fn touch_all(&mut self, ids: &[PieceId]) {
        let mut ids = ids.to_vec();
        ids.sort_by_key(|&id| self.stamps[id]);
        ids.dedup();
        for id in ids {
            self.touch(id);
        }
    }

    /// Larger is nearer the front.
    pub fn stamp(&self, id: PieceId) -> u64 {
        self.stamps[id]
    }

    /// Every piece, back to front.
    pub fn sorted(&self) -> Vec<PieceId> {
        let mut order: Vec<PieceId> = (0..self.stamps.len()).collect();
        order.sort_unstable_by_key(|&id| self.stamps[id]);
        order
    }
}

//! Piece clusters as a union-find forest.
//!
//! The root of a tree is the cluster's handle. Member lists and the lock flag live on the root
//! only, so a union is visible to every member the moment the parent link is written.

use crate::geometry::PieceId;

/// Root piece of a cluster. Only stable until the next union.
pub type GroupId = PieceId;

#[derive(Debug, Clone)]
pub struct Groups {
    parent: Vec<PieceId>,
    members: Vec<Vec<PieceId>>,
    locked: Vec<bool>,
}

impl Groups {
    /// Every piece starts alone and unlocked.
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            members: (0..len).map(|id| vec![id]).collect(),
            locked: vec![false; len],
        }
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    pub fn find(&self, id: PieceId) -> GroupId {
        let mut cur = id;
        while self.parent[cur] != cur {
            cur = self.parent[cur];
        }
        cur
    }

    pub fn same_group(&self, a: PieceId, b: PieceId) -> bool {
        self.find(a) == self.find(b)
    }

    pub fn members(&self, id: PieceId) -> &[PieceId] {
        &self.members[self.find(id)]
    }

    pub fn size(&self, id: PieceId) -> usize {
        self.members(id).len()
    }

    pub fn is_locked(&self, id: PieceId) -> bool {
        self.locked[self.find(id)]
    }

    pub fn lock(&mut self, id: PieceId) {
        let root = self.find(id);
        self.locked[root] = true;
    }

    /// Merges the clusters of `a` and `b`, hanging the smaller tree under the larger. The merged
    /// cluster is locked if either side was.
    pub fn union(&mut self, a: PieceId, b: PieceId) -> GroupId {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return ra;
        }
        let (root, child) = if self.members[ra].len() >= self.members[rb].len() {
            (ra, rb)
        } else {
            (rb, ra)
        };

        self.parent[child] = root;
        let moved = std::mem::take(&mut self.members[child]);
        self.members[root].extend(moved);
        self.locked[root] = self.locked[root] || self.locked[child];
        self.locked[child] = false;
        root
    }

    /// Current cluster roots.
    pub fn roots(&self) -> impl Iterator<Item = GroupId> + '_ {
        (0..self.parent.len()).filter(|&id| self.parent[id] == id)
    }

    /// True once a single cluster holds every piece.
    pub fn is_complete(&self) -> bool {
        !self.is_empty() && self.size(0) == self.len()
    }
}

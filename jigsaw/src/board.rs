use std::cell::OnceCell;

use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ClampPolicy, Placement, PuzzleConfig};
use crate::draw_order::DrawOrder;
use crate::error::{PuzzleError, Result};
use crate::geometry::{GridSize, PieceId, PieceKind};
use crate::group::{GroupId, Groups};
use crate::masks::MaskSet;
use crate::slicer::{PieceSprites, Slicer};

/// Axis-aligned rectangle in board space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoardRect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Interiors overlap; touching edges do not count.
    pub fn overlaps(&self, other: &BoardRect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn intersect(&self, other: &BoardRect) -> Option<BoardRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(BoardRect::new(x0, y0, x1 - x0, y1 - y0))
    }

    pub fn contains_rect(&self, other: &BoardRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

#[derive(Debug, Clone)]
pub struct Piece {
    row: u32,
    col: u32,
    kind: PieceKind,
    tab_extent_x: f32,
    tab_extent_y: f32,
    sprites: PieceSprites,
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) flattened: bool,
    pub(crate) neighbors: OnceCell<Vec<PieceId>>,
}

impl Piece {
    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    pub fn tab_extent(&self) -> (f32, f32) {
        (self.tab_extent_x, self.tab_extent_y)
    }

    /// Top-left of the base cell.
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    pub fn is_flattened(&self) -> bool {
        self.flattened
    }

    pub fn sprites(&self) -> &PieceSprites {
        &self.sprites
    }

    /// What is painted right now: the plain crop once flattened, the stencilled one before.
    pub fn sprite(&self) -> &RgbaImage {
        if self.flattened {
            &self.sprites.plain
        } else {
            &self.sprites.masked
        }
    }

    pub fn sprite_origin(&self) -> (f32, f32) {
        let (dx, dy) = self.kind.anchor_offset(self.tab_extent_x, self.tab_extent_y);
        (self.x + dx, self.y + dy)
    }

    pub fn sprite_bounds(&self) -> BoardRect {
        let (sx, sy) = self.sprite_origin();
        let (w, h) = self.sprites.size();
        BoardRect::new(sx, sy, w as f32, h as f32)
    }
}

#[derive(Debug, Clone)]
pub struct Board {
    pub(crate) grid: GridSize,
    image_width: u32,
    image_height: u32,
    pub(crate) cell_width: f32,
    pub(crate) cell_height: f32,
    pub(crate) origin_x: f32,
    pub(crate) origin_y: f32,
    width: f32,
    height: f32,
    pub(crate) connect_tolerance: f32,
    clamp_policy: ClampPolicy,
    pub(crate) render_optimization: bool,
    pub(crate) pieces: Vec<Piece>,
    pub(crate) groups: Groups,
    pub(crate) draw_order: DrawOrder,
}

impl Board {
    /// Slices `source` and lays the pieces out with the placement resolved from `config`.
    pub fn build(
        source: &RgbaImage,
        masks: &MaskSet,
        grid: GridSize,
        config: &PuzzleConfig,
    ) -> Result<Self> {
        Self::with_placement(source, masks, grid, config, config.resolve_placement())
    }

    pub fn with_placement(
        source: &RgbaImage,
        masks: &MaskSet,
        grid: GridSize,
        config: &PuzzleConfig,
        placement: Placement,
    ) -> Result<Self> {
        if config.margin == 0 {
            return Err(PuzzleError::InvalidConfig(
                "margin must be at least 1 so pieces have room around the solved area".into(),
            ));
        }

        let slicer = Slicer::new(source, masks, grid)?;
        let metrics = slicer.metrics();
        let (image_width, image_height) = source.dimensions();
        let span = (2 * config.margin + 1) as f32;

        let pieces = slicer
            .slice_all()
            .into_iter()
            .map(|sliced| Piece {
                row: sliced.row,
                col: sliced.col,
                kind: sliced.kind,
                tab_extent_x: metrics.tab_extent_x,
                tab_extent_y: metrics.tab_extent_y,
                sprites: sliced.sprites,
                x: 0.0,
                y: 0.0,
                flattened: false,
                neighbors: OnceCell::new(),
            })
            .collect::<Vec<_>>();

        let len = pieces.len();
        let mut board = Self {
            grid,
            image_width,
            image_height,
            cell_width: metrics.cell_width,
            cell_height: metrics.cell_height,
            origin_x: image_width as f32 * config.margin as f32,
            origin_y: image_height as f32 * config.margin as f32,
            width: image_width as f32 * span,
            height: image_height as f32 * span,
            connect_tolerance: metrics.cell_width.min(metrics.cell_height)
                / config.tolerance_divisor,
            clamp_policy: config.clamp_policy,
            render_optimization: config.render_optimization,
            pieces,
            groups: Groups::new(len),
            draw_order: DrawOrder::new(len),
        };

        match placement {
            Placement::PreSolved => board.place_solved(),
            Placement::Scattered { seed } => board.scatter(seed),
        }

        tracing::info!(
            cols = grid.cols(),
            rows = grid.rows(),
            image_width,
            image_height,
            board_width = board.width,
            board_height = board.height,
            ?placement,
            "board built"
        );
        Ok(board)
    }

    fn place_solved(&mut self) {
        for id in 0..self.pieces.len() {
            let (x, y) = self.solved_position(id);
            let piece = &mut self.pieces[id];
            piece.x = x;
            piece.y = y;
        }
    }

    /// Puts every piece outside the solved rectangle: a coin picks a horizontal or vertical
    /// displacement, a second coin the side, and the free coordinate is uniform.
    fn scatter(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let solved = self.solved_rect();
        let extent = self.extent();

        for id in 0..self.pieces.len() {
            let bounds = self.pieces[id].sprite_bounds();
            let horizontal_first = rng.random_bool(0.5);

            let x_bands = bands(solved.x, solved.w, extent.w, bounds.w);
            let y_bands = bands(solved.y, solved.h, extent.h, bounds.h);

            let (sx, sy) = match (horizontal_first, x_bands.is_empty(), y_bands.is_empty()) {
                (true, false, _) | (false, false, true) => {
                    let sx = pick_band(&mut rng, &x_bands);
                    let sy = free_coordinate(&mut rng, solved.h, extent.h, bounds.h);
                    (sx, sy)
                }
                (false, _, false) | (true, true, false) => {
                    let sy = pick_band(&mut rng, &y_bands);
                    let sx = free_coordinate(&mut rng, solved.w, extent.w, bounds.w);
                    (sx, sy)
                }
                (_, true, true) => {
                    tracing::warn!(id, "no room outside the solved area, piece overlaps it");
                    (0.0, 0.0)
                }
            };

            let piece = &mut self.pieces[id];
            let (ax, ay) = piece.kind.anchor_offset(piece.tab_extent_x, piece.tab_extent_y);
            piece.x = sx - ax;
            piece.y = sy - ay;
        }
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    pub fn cell_size(&self) -> (f32, f32) {
        (self.cell_width, self.cell_height)
    }

    pub fn origin(&self) -> (f32, f32) {
        (self.origin_x, self.origin_y)
    }

    /// Pixel extent of the whole board.
    pub fn extent(&self) -> BoardRect {
        BoardRect::new(0.0, 0.0, self.width, self.height)
    }

    /// Where the assembled image ends up.
    pub fn solved_rect(&self) -> BoardRect {
        BoardRect::new(
            self.origin_x,
            self.origin_y,
            self.image_width as f32,
            self.image_height as f32,
        )
    }

    pub fn solved_position(&self, id: PieceId) -> (f32, f32) {
        let (row, col) = self.grid.position(id);
        (
            self.origin_x + col as f32 * self.cell_width,
            self.origin_y + row as f32 * self.cell_height,
        )
    }

    pub fn connect_tolerance(&self) -> f32 {
        self.connect_tolerance
    }

    pub fn clamp_policy(&self) -> ClampPolicy {
        self.clamp_policy
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id]
    }

    pub fn piece_at(&self, row: u32, col: u32) -> Option<&Piece> {
        if row >= self.grid.rows() || col >= self.grid.cols() {
            return None;
        }
        self.pieces.get(self.grid.id(row, col))
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Back to front.
    pub fn draw_order(&self) -> Vec<PieceId> {
        self.draw_order.sorted()
    }

    pub fn group_of(&self, id: PieceId) -> GroupId {
        self.groups.find(id)
    }

    pub fn group_members(&self, id: PieceId) -> &[PieceId] {
        self.groups.members(id)
    }

    pub fn same_group(&self, a: PieceId, b: PieceId) -> bool {
        self.groups.same_group(a, b)
    }

    pub fn is_locked(&self, id: PieceId) -> bool {
        self.groups.is_locked(id)
    }

    pub fn group_count(&self) -> usize {
        self.groups.roots().count()
    }

    pub fn is_complete(&self) -> bool {
        self.groups.is_complete()
    }

    /// Topmost unlocked piece whose base cell strictly contains the point. The hit piece is
    /// brought to the front.
    pub fn hit_test(&mut self, bx: f32, by: f32) -> Option<PieceId> {
        let hit = (0..self.pieces.len())
            .filter(|&id| {
                let p = &self.pieces[id];
                !self.groups.is_locked(id)
                    && p.x < bx
                    && bx < p.x + self.cell_width
                    && p.y < by
                    && by < p.y + self.cell_height
            })
            .max_by_key(|&id| self.draw_order.stamp(id))?;
        self.draw_order.touch(hit);
        Some(hit)
    }

    /// Drags the whole cluster of `id` by `(dx, dy)`, keeping it on the board per the clamp
    /// policy, and brings it to the front.
    pub fn move_group(&mut self, id: PieceId, dx: f32, dy: f32) {
        let members = self.groups.members(id).to_vec();
        match self.clamp_policy {
            ClampPolicy::CancelAxis => {
                let extent = self.extent();
                let mut dx = dx;
                let mut dy = dy;
                for &m in &members {
                    let b = self.pieces[m].sprite_bounds();
                    if b.x + dx < extent.x || b.right() + dx > extent.right() {
                        dx = 0.0;
                    }
                    if b.y + dy < extent.y || b.bottom() + dy > extent.bottom() {
                        dy = 0.0;
                    }
                    if dx == 0.0 && dy == 0.0 {
                        break;
                    }
                }
                for &m in &members {
                    let p = &mut self.pieces[m];
                    p.x += dx;
                    p.y += dy;
                }
            }
            ClampPolicy::Clamp => {
                let max_x = (self.width - self.cell_width).max(0.0);
                let max_y = (self.height - self.cell_height).max(0.0);
                for &m in &members {
                    let p = &mut self.pieces[m];
                    p.x = (p.x + dx).clamp(0.0, max_x);
                    p.y = (p.y + dy).clamp(0.0, max_y);
                }
            }
        }
        self.draw_order.touch_all(&members);
    }

    /// Moves the cluster of `id` so that `id` sits at `(x, y)`, without bounds checks. Meant for
    /// scripted layouts.
    pub fn place_group(&mut self, id: PieceId, x: f32, y: f32) {
        let dx = x - self.pieces[id].x;
        let dy = y - self.pieces[id].y;
        self.translate_group(id, dx, dy);
    }

    pub(crate) fn translate_group(&mut self, id: PieceId, dx: f32, dy: f32) {
        let members = self.groups.members(id).to_vec();
        for &m in &members {
            let p = &mut self.pieces[m];
            p.x += dx;
            p.y += dy;
        }
    }

    /// Whether translating the cluster of `id` keeps it on the board under the clamp policy.
    pub(crate) fn group_fits(&self, id: PieceId, dx: f32, dy: f32) -> bool {
        let extent = self.extent();
        self.groups.members(id).iter().all(|&m| {
            let p = &self.pieces[m];
            match self.clamp_policy {
                ClampPolicy::CancelAxis => {
                    let b = p.sprite_bounds();
                    extent.contains_rect(&BoardRect::new(b.x + dx, b.y + dy, b.w, b.h))
                }
                ClampPolicy::Clamp => {
                    let x = p.x + dx;
                    let y = p.y + dy;
                    x >= 0.0
                        && y >= 0.0
                        && x <= self.width - self.cell_width
                        && y <= self.height - self.cell_height
                }
            }
        })
    }
}

/// Ranges for the leading edge of a sprite of `size` that keep it entirely before or entirely
/// after `[start, start + span)` while staying inside `[0, total]`. Away from the board edge by
/// half a span where there is room.
fn bands(start: f32, span: f32, total: f32, size: f32) -> Vec<(f32, f32)> {
    let mut out = Vec::with_capacity(2);

    let before_hi = (start - size).floor();
    let before_lo = (span / 2.0).min(before_hi).max(0.0).ceil();
    if before_hi >= before_lo {
        out.push((before_lo, before_hi));
    }

    let after_lo = (start + span).ceil();
    let after_hi = (total - span / 2.0).min(total - size).max(after_lo).floor();
    if after_hi >= after_lo && after_lo + size <= total {
        out.push((after_lo, after_hi));
    }
    out
}

fn pick_band(rng: &mut StdRng, bands: &[(f32, f32)]) -> f32 {
    let (lo, hi) = if bands.len() > 1 && rng.random_bool(0.5) {
        bands[1]
    } else {
        bands[0]
    };
    rng.random_range(lo as i64..=hi as i64) as f32
}

/// Uniform leading edge for the axis that is not displaced.
fn free_coordinate(rng: &mut StdRng, span: f32, total: f32, size: f32) -> f32 {
    let mut lo = (span / 2.0).ceil();
    let mut hi = (total - span / 2.0 - size).floor();
    if hi < lo {
        lo = 0.0;
        hi = (total - size).floor().max(0.0);
    }
    rng.random_range(lo as i64..=hi as i64) as f32
}

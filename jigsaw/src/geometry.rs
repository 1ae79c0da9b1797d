//! Piece classification.
//!
//! Every cell of an odd-by-odd grid maps to one of fourteen kinds. The kind decides which stencil
//! cuts the piece, how that stencil is oriented, which sides of the cell the crop grows by the
//! tab overhang, and where the sprite is anchored relative to the cell's top-left.

use crate::error::{PuzzleError, Result};

/// Row-major index into a board's pieces: `row * cols + col`.
pub type PieceId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSize {
    cols: u32,
    rows: u32,
}

impl GridSize {
    /// Both dimensions must be positive and odd so that border parity lines up at all four
    /// corners.
    pub fn new(cols: u32, rows: u32) -> Result<Self> {
        if cols == 0 || rows == 0 || cols % 2 == 0 || rows % 2 == 0 {
            return Err(PuzzleError::InvalidGrid { cols, rows });
        }
        Ok(Self { cols, rows })
    }

    pub fn cols(self) -> u32 {
        self.cols
    }

    pub fn rows(self) -> u32 {
        self.rows
    }

    pub fn len(self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    pub fn id(self, row: u32, col: u32) -> PieceId {
        row as usize * self.cols as usize + col as usize
    }

    pub fn position(self, id: PieceId) -> (u32, u32) {
        let cols = self.cols as usize;
        ((id / cols) as u32, (id % cols) as u32)
    }

    /// Grid-adjacent cells in up, left, down, right order.
    pub fn neighbors(self, row: u32, col: u32) -> Vec<PieceId> {
        let mut out = Vec::with_capacity(4);
        if row > 0 {
            out.push(self.id(row - 1, col));
        }
        if col > 0 {
            out.push(self.id(row, col - 1));
        }
        if row + 1 < self.rows {
            out.push(self.id(row + 1, col));
        }
        if col + 1 < self.cols {
            out.push(self.id(row, col + 1));
        }
        out
    }

    pub fn is_corner(self, row: u32, col: u32) -> bool {
        (row == 0 || row == self.rows - 1) && (col == 0 || col == self.cols - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    TopLeftCorner,
    TopRightCorner,
    BottomLeftCorner,
    BottomRightCorner,
    BottomEvenEdge,
    TopEvenEdge,
    BottomOddEdge,
    TopOddEdge,
    RightOddEdge,
    LeftOddEdge,
    RightEvenEdge,
    LeftEvenEdge,
    Middle,
    MiddleRotated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskShape {
    Corner,
    OddEdge,
    EvenEdge,
    Middle,
}

impl MaskShape {
    pub const ALL: [MaskShape; 4] = [
        MaskShape::Corner,
        MaskShape::OddEdge,
        MaskShape::EvenEdge,
        MaskShape::Middle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MaskShape::Corner => "corner",
            MaskShape::OddEdge => "odd_edge",
            MaskShape::EvenEdge => "even_edge",
            MaskShape::Middle => "middle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Identity,
    FlipHorizontal,
    FlipVertical,
    FlipBoth,
    RotateClockwise,
    RotateCounterClockwise,
}

/// Sides of the base cell that the crop is grown on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Extension {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Extension {
    const fn new(left: bool, right: bool, up: bool, down: bool) -> Self {
        Self {
            left,
            right,
            up,
            down,
        }
    }
}

impl PieceKind {
    /// Kind of the cell at `(row, col)`. Vertical borders use the opposite parity from horizontal
    /// ones, and interior cells alternate in a checkerboard.
    pub fn classify(row: u32, col: u32, grid: GridSize) -> Self {
        let last_row = grid.rows - 1;
        let last_col = grid.cols - 1;
        let top = row == 0;
        let bottom = row == last_row;
        let left = col == 0;
        let right = col == last_col;

        match (top, bottom, left, right) {
            (true, _, true, _) => PieceKind::TopLeftCorner,
            (true, _, _, true) => PieceKind::TopRightCorner,
            (_, true, true, _) => PieceKind::BottomLeftCorner,
            (_, true, _, true) => PieceKind::BottomRightCorner,
            (true, _, _, _) if col % 2 == 0 => PieceKind::TopEvenEdge,
            (true, _, _, _) => PieceKind::TopOddEdge,
            (_, true, _, _) if col % 2 == 0 => PieceKind::BottomEvenEdge,
            (_, true, _, _) => PieceKind::BottomOddEdge,
            (_, _, _, true) if row % 2 == 0 => PieceKind::RightOddEdge,
            (_, _, _, true) => PieceKind::RightEvenEdge,
            (_, _, true, _) if row % 2 == 0 => PieceKind::LeftOddEdge,
            (_, _, true, _) => PieceKind::LeftEvenEdge,
            _ if row % 2 == col % 2 => PieceKind::Middle,
            _ => PieceKind::MiddleRotated,
        }
    }

    pub fn mask_shape(self) -> MaskShape {
        use PieceKind::*;
        match self {
            TopLeftCorner | TopRightCorner | BottomLeftCorner | BottomRightCorner => {
                MaskShape::Corner
            }
            TopEvenEdge | BottomEvenEdge | RightEvenEdge | LeftEvenEdge => MaskShape::EvenEdge,
            TopOddEdge | BottomOddEdge | RightOddEdge | LeftOddEdge => MaskShape::OddEdge,
            Middle | MiddleRotated => MaskShape::Middle,
        }
    }

    pub fn orientation(self) -> Orientation {
        use PieceKind::*;
        match self {
            TopLeftCorner | TopEvenEdge | TopOddEdge | Middle => Orientation::Identity,
            TopRightCorner => Orientation::FlipHorizontal,
            BottomLeftCorner | BottomEvenEdge | BottomOddEdge => Orientation::FlipVertical,
            BottomRightCorner => Orientation::FlipBoth,
            RightOddEdge | RightEvenEdge => Orientation::RotateClockwise,
            LeftOddEdge | LeftEvenEdge | MiddleRotated => Orientation::RotateCounterClockwise,
        }
    }

    pub fn extension(self) -> Extension {
        use PieceKind::*;
        match self {
            TopLeftCorner | BottomLeftCorner | LeftOddEdge => {
                Extension::new(false, true, false, false)
            }
            TopRightCorner | BottomRightCorner | RightOddEdge => {
                Extension::new(true, false, false, false)
            }
            TopEvenEdge | BottomEvenEdge | Middle => Extension::new(true, true, false, false),
            TopOddEdge => Extension::new(false, false, false, true),
            BottomOddEdge => Extension::new(false, false, true, false),
            RightEvenEdge | LeftEvenEdge | MiddleRotated => {
                Extension::new(false, false, true, true)
            }
        }
    }

    /// Offset from the base cell's top-left to the sprite's top-left. Non-zero only on the axes
    /// where the crop grows left or up.
    pub fn anchor_offset(self, tab_extent_x: f32, tab_extent_y: f32) -> (f32, f32) {
        let ext = self.extension();
        let dx = if ext.left { -tab_extent_x } else { 0.0 };
        let dy = if ext.up { -tab_extent_y } else { 0.0 };
        (dx, dy)
    }
}

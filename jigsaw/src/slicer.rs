use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};

use crate::error::{PuzzleError, Result};
use crate::geometry::{GridSize, PieceKind};
use crate::masks::MaskSet;

/// Largest side becomes `max_dim`, the other follows proportionally (truncated, at least 1).
/// Images already within bounds keep their size.
pub fn downscaled_size(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    if max_dim == 0 || width.max(height) <= max_dim {
        return (width, height);
    }
    let scaled = |side: u32, long: u32| ((side as u64 * max_dim as u64) / long as u64).max(1) as u32;
    if width > height {
        (max_dim, scaled(height, width))
    } else {
        (scaled(width, height), max_dim)
    }
}

pub fn prepare_source(image: DynamicImage, max_dim: Option<u32>) -> RgbaImage {
    let rgba = image.into_rgba8();
    let Some(max_dim) = max_dim else {
        return rgba;
    };
    let (w, h) = downscaled_size(rgba.width(), rgba.height(), max_dim);
    if (w, h) == rgba.dimensions() {
        return rgba;
    }
    tracing::debug!(
        from_w = rgba.width(),
        from_h = rgba.height(),
        to_w = w,
        to_h = h,
        "downscaling source"
    );
    imageops::resize(&rgba, w, h, FilterType::Lanczos3)
}

/// Both renditions of a piece. They share an anchor, so swapping one for the other never moves
/// the piece on screen.
#[derive(Debug, Clone)]
pub struct PieceSprites {
    pub masked: Arc<RgbaImage>,
    pub plain: Arc<RgbaImage>,
}

impl PieceSprites {
    pub fn size(&self) -> (u32, u32) {
        self.masked.dimensions()
    }
}

/// Cell size and tab reach in source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellMetrics {
    pub cell_width: f32,
    pub cell_height: f32,
    pub tab_extent_x: f32,
    pub tab_extent_y: f32,
}

/// Pixel box of a crop, after rounding and clamping to the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct SlicedPiece {
    pub row: u32,
    pub col: u32,
    pub kind: PieceKind,
    pub crop: CropBox,
    pub sprites: PieceSprites,
}

pub struct Slicer<'a> {
    source: &'a RgbaImage,
    masks: &'a MaskSet,
    grid: GridSize,
    metrics: CellMetrics,
}

impl<'a> Slicer<'a> {
    pub fn new(source: &'a RgbaImage, masks: &'a MaskSet, grid: GridSize) -> Result<Self> {
        let (width, height) = source.dimensions();
        if width < grid.cols() || height < grid.rows() {
            return Err(PuzzleError::SourceTooSmall {
                width,
                height,
                cols: grid.cols(),
                rows: grid.rows(),
            });
        }

        let cell_width = width as f32 / grid.cols() as f32;
        let cell_height = height as f32 / grid.rows() as f32;
        let (base_w, base_h) = masks.base_size();
        let overhang = masks.overhang() as f32;
        let metrics = CellMetrics {
            cell_width,
            cell_height,
            tab_extent_x: overhang * cell_width / base_w as f32,
            tab_extent_y: overhang * cell_height / base_h as f32,
        };

        Ok(Self {
            source,
            masks,
            grid,
            metrics,
        })
    }

    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    pub fn crop_box(&self, row: u32, col: u32, kind: PieceKind) -> CropBox {
        let m = self.metrics;
        let ext = kind.extension();
        let mut x0 = col as f32 * m.cell_width;
        let mut x1 = (col + 1) as f32 * m.cell_width;
        let mut y0 = row as f32 * m.cell_height;
        let mut y1 = (row + 1) as f32 * m.cell_height;
        if ext.left {
            x0 -= m.tab_extent_x;
        }
        if ext.right {
            x1 += m.tab_extent_x;
        }
        if ext.up {
            y0 -= m.tab_extent_y;
        }
        if ext.down {
            y1 += m.tab_extent_y;
        }

        let (w, h) = self.source.dimensions();
        let clamp = |v: f32, max: u32| (v.round().max(0.0) as u32).min(max);
        let (x0, x1) = (clamp(x0, w), clamp(x1, w));
        let (y0, y1) = (clamp(y0, h), clamp(y1, h));
        let x0 = x0.min(w - 1);
        let y0 = y0.min(h - 1);
        CropBox {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0).max(1),
            height: y1.saturating_sub(y0).max(1),
        }
    }

    pub fn slice_cell(&self, row: u32, col: u32) -> SlicedPiece {
        let kind = PieceKind::classify(row, col, self.grid);
        let crop = self.crop_box(row, col, kind);
        let plain =
            imageops::crop_imm(self.source, crop.x, crop.y, crop.width, crop.height).to_image();
        let stencil = self.masks.oriented(
            kind.mask_shape(),
            kind.orientation(),
            plain.width(),
            plain.height(),
        );

        let mut masked = plain.clone();
        for (px, m) in masked.pixels_mut().zip(stencil.pixels()) {
            px[3] = ((px[3] as u32 * m[0] as u32 + 127) / 255) as u8;
        }
        let mut plain = plain;
        for px in plain.pixels_mut() {
            px[3] = 255;
        }

        SlicedPiece {
            row,
            col,
            kind,
            crop,
            sprites: PieceSprites {
                masked: Arc::new(masked),
                plain: Arc::new(plain),
            },
        }
    }

    /// Every cell in row-major order, so the result is indexed by `PieceId`.
    pub fn slice_all(&self) -> Vec<SlicedPiece> {
        let mut out = Vec::with_capacity(self.grid.len());
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                out.push(self.slice_cell(row, col));
            }
        }
        out
    }
}

//! Tab stencils.
//!
//! A stencil is a single-channel image whose value becomes the alpha of the pieces cut with it.
//! The base stencil only contributes its size: the corner stencil is wider than it by exactly
//! one tab, and that difference is the overhang every piece's tabs reach past its cell.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};

use crate::error::{PuzzleError, Result};
use crate::geometry::{MaskShape, Orientation};

const BASE_FILE: &str = "mask.png";

#[derive(Debug, Clone)]
pub struct MaskSet {
    base_width: u32,
    base_height: u32,
    corner: GrayImage,
    odd_edge: GrayImage,
    even_edge: GrayImage,
    middle: GrayImage,
}

impl MaskSet {
    pub fn new(
        base_size: (u32, u32),
        corner: GrayImage,
        odd_edge: GrayImage,
        even_edge: GrayImage,
        middle: GrayImage,
    ) -> Result<Self> {
        let (base_width, base_height) = base_size;
        if base_width == 0 || base_height == 0 {
            return Err(PuzzleError::invalid_mask("base", "stencil is empty"));
        }
        for (shape, stencil) in MaskShape::ALL
            .into_iter()
            .zip([&corner, &odd_edge, &even_edge, &middle])
        {
            if stencil.width() == 0 || stencil.height() == 0 {
                return Err(PuzzleError::invalid_mask(shape.name(), "stencil is empty"));
            }
        }
        if corner.width() < base_width {
            return Err(PuzzleError::invalid_mask(
                "corner",
                format!(
                    "{} px wide, narrower than the {} px base stencil",
                    corner.width(),
                    base_width
                ),
            ));
        }

        Ok(Self {
            base_width,
            base_height,
            corner,
            odd_edge,
            even_edge,
            middle,
        })
    }

    /// Loads `mask.png`, `corner.png`, `odd_edge.png`, `even_edge.png` and `middle.png` from
    /// `dir`. A `<name>_blur.png` next to a stencil is preferred for compositing; the crisp file
    /// still decides the overhang.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let base = image::open(dir.join(BASE_FILE))?;
        let corner_size = image::image_dimensions(dir.join("corner.png"))?;

        let load = |shape: MaskShape| -> Result<GrayImage> {
            let blurred = dir.join(format!("{}_blur.png", shape.name()));
            let path = if blurred.is_file() {
                blurred
            } else {
                dir.join(format!("{}.png", shape.name()))
            };
            tracing::debug!(path = %path.display(), "loading stencil");
            Ok(stencil_from(image::open(&path)?))
        };
        let corner = load(MaskShape::Corner)?;
        let odd_edge = load(MaskShape::OddEdge)?;
        let even_edge = load(MaskShape::EvenEdge)?;
        let middle = load(MaskShape::Middle)?;

        // A blurred corner may be padded differently; keep the crisp width for the overhang.
        let corner = if corner.width() == corner_size.0 {
            corner
        } else {
            imageops::resize(&corner, corner_size.0, corner_size.1, FilterType::Triangle)
        };

        Self::new(
            (base.width(), base.height()),
            corner,
            odd_edge,
            even_edge,
            middle,
        )
    }

    /// Round tabs and blanks drawn from scratch: a tab is a disc of radius `3/4 * overhang`
    /// centred a quarter overhang past the seam, a blank is the same disc mirrored inside the
    /// body. Complementary sides of neighboring kinds therefore interlock exactly.
    pub fn procedural(base: u32, overhang: u32) -> Result<Self> {
        if base == 0 {
            return Err(PuzzleError::invalid_mask("base", "stencil is empty"));
        }
        if overhang.saturating_mul(2) >= base {
            return Err(PuzzleError::invalid_mask(
                "corner",
                format!("overhang {overhang} must be less than half the {base} px base"),
            ));
        }

        use Side::{Blank, Flat, Tab};
        let corner = render_stencil(base, overhang, Sides::new(Flat, Tab, Blank, Flat));
        let even_edge = render_stencil(base, overhang, Sides::new(Flat, Tab, Blank, Tab));
        let odd_edge = render_stencil(base, overhang, Sides::new(Flat, Blank, Tab, Blank));
        let middle = render_stencil(base, overhang, Sides::new(Blank, Tab, Blank, Tab));

        Self::new((base, base), corner, odd_edge, even_edge, middle)
    }

    pub fn base_size(&self) -> (u32, u32) {
        (self.base_width, self.base_height)
    }

    /// Tab overhang in stencil pixels.
    pub fn overhang(&self) -> u32 {
        self.corner.width() - self.base_width
    }

    pub fn stencil(&self, shape: MaskShape) -> &GrayImage {
        match shape {
            MaskShape::Corner => &self.corner,
            MaskShape::OddEdge => &self.odd_edge,
            MaskShape::EvenEdge => &self.even_edge,
            MaskShape::Middle => &self.middle,
        }
    }

    /// The stencil for `shape`, oriented and stretched to `width` x `height`.
    pub fn oriented(
        &self,
        shape: MaskShape,
        orientation: Orientation,
        width: u32,
        height: u32,
    ) -> GrayImage {
        let stencil = self.stencil(shape);
        let turned = match orientation {
            Orientation::Identity => stencil.clone(),
            Orientation::FlipHorizontal => imageops::flip_horizontal(stencil),
            Orientation::FlipVertical => imageops::flip_vertical(stencil),
            Orientation::FlipBoth => imageops::rotate180(stencil),
            Orientation::RotateClockwise => imageops::rotate90(stencil),
            Orientation::RotateCounterClockwise => imageops::rotate270(stencil),
        };
        if turned.dimensions() == (width, height) {
            return turned;
        }
        imageops::resize(&turned, width, height, FilterType::Triangle)
    }
}

fn stencil_from(image: DynamicImage) -> GrayImage {
    if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            Luma([rgba.get_pixel(x, y)[3]])
        })
    } else {
        image.to_luma8()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Flat,
    Tab,
    Blank,
}

#[derive(Debug, Clone, Copy)]
struct Sides {
    top: Side,
    right: Side,
    bottom: Side,
    left: Side,
}

impl Sides {
    fn new(top: Side, right: Side, bottom: Side, left: Side) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

fn render_stencil(base: u32, ext: u32, sides: Sides) -> GrayImage {
    let tabs = |a: Side, b: Side| (a == Side::Tab) as u32 + (b == Side::Tab) as u32;
    let width = base + ext * tabs(sides.left, sides.right);
    let height = base + ext * tabs(sides.top, sides.bottom);

    let x0 = (if sides.left == Side::Tab { ext } else { 0 }) as f32;
    let y0 = (if sides.top == Side::Tab { ext } else { 0 }) as f32;
    let x1 = x0 + base as f32;
    let y1 = y0 + base as f32;
    let mid_x = (x0 + x1) / 2.0;
    let mid_y = (y0 + y1) / 2.0;

    let ext = ext as f32;
    let radius = ext * 0.75;
    let shift = ext * 0.25;

    // (side, centre) with the centre pushed outward for tabs and inward for blanks.
    let disc = |side: Side, seam: (f32, f32), outward: (f32, f32)| {
        let sign = if side == Side::Tab { 1.0 } else { -1.0 };
        (
            side,
            seam.0 + outward.0 * shift * sign,
            seam.1 + outward.1 * shift * sign,
        )
    };
    let discs: Vec<(Side, f32, f32)> = [
        disc(sides.top, (mid_x, y0), (0.0, -1.0)),
        disc(sides.right, (x1, mid_y), (1.0, 0.0)),
        disc(sides.bottom, (mid_x, y1), (0.0, 1.0)),
        disc(sides.left, (x0, mid_y), (-1.0, 0.0)),
    ]
    .into_iter()
    .filter(|(side, _, _)| *side != Side::Flat)
    .collect();

    GrayImage::from_fn(width, height, |x, y| {
        let px = x as f32 + 0.5;
        let py = y as f32 + 0.5;
        let mut inside = px >= x0 && px < x1 && py >= y0 && py < y1;
        for &(side, cx, cy) in &discs {
            let d2 = (px - cx).powi(2) + (py - cy).powi(2);
            if d2 <= radius * radius {
                inside = side == Side::Tab;
            }
        }
        Luma([if inside { 255 } else { 0 }])
    })
}

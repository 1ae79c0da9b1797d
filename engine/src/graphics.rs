use crate::rect::{Rect, ScreenRect};
use crate::surface::SurfaceSize;

pub type Color = [u8; 4];

/// Borrowed straight-alpha RGBA8 pixels, tightly packed, row-major.
#[derive(Debug, Clone, Copy)]
pub struct SpriteView<'a> {
    pub width: u32,
    pub height: u32,
    pub rgba: &'a [u8],
}

impl<'a> SpriteView<'a> {
    pub fn new(width: u32, height: u32, rgba: &'a [u8]) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    fn is_valid(&self) -> bool {
        let expected = (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4);
        expected != 0 && self.rgba.len() >= expected
    }
}

/// Unified 2D rendering interface.
///
/// Game code only talks to this trait; it must not care where the frame ends up (a `pixels`
/// buffer in a window, or an offscreen `FrameBuffer`).
pub trait Renderer2d {
    fn begin_frame(&mut self, size: SurfaceSize);
    fn size(&self) -> SurfaceSize;

    /// Opaque fill.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Scales `sprite` to `dest` (nearest neighbour) and blends it source-over, drawing only the
    /// part of `dest` that falls inside `clip`.
    fn blit_sprite(&mut self, sprite: SpriteView<'_>, dest: ScreenRect, clip: Rect);

    fn clear(&mut self, color: Color) {
        let s = self.size();
        self.fill_rect(Rect::from_size(s.width, s.height), color);
    }
}

/// CPU renderer that draws into an RGBA frame buffer.
pub struct CpuRenderer<'a> {
    frame: &'a mut [u8],
    size: SurfaceSize,
}

impl<'a> CpuRenderer<'a> {
    pub fn new(frame: &'a mut [u8], size: SurfaceSize) -> Self {
        Self { frame, size }
    }

    fn frame_ok(&self) -> bool {
        let expected = self.size.rgba_len();
        expected != 0 && self.frame.len() >= expected
    }

    fn surface_rect(&self) -> Rect {
        Rect::from_size(self.size.width, self.size.height)
    }
}

impl Renderer2d for CpuRenderer<'_> {
    fn begin_frame(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if !self.frame_ok() {
            return;
        }
        let Some(rect) = rect.intersect(self.surface_rect()) else {
            return;
        };

        let stride = self.size.width as usize * 4;
        let row_bytes = rect.w as usize * 4;
        let mut row_start = rect.y as usize * stride + rect.x as usize * 4;
        for _ in rect.y..rect.bottom() {
            let row = &mut self.frame[row_start..row_start + row_bytes];
            for px in row.chunks_exact_mut(4) {
                px.copy_from_slice(&color);
            }
            row_start += stride;
        }
    }

    fn blit_sprite(&mut self, sprite: SpriteView<'_>, dest: ScreenRect, clip: Rect) {
        if !self.frame_ok() || !sprite.is_valid() || dest.w == 0 || dest.h == 0 {
            return;
        }
        let Some(bounds) = clip.intersect(self.surface_rect()) else {
            return;
        };
        let Some(visible) = dest.clip_to(bounds) else {
            return;
        };

        let stride = self.size.width as usize * 4;
        let src_stride = sprite.width as usize * 4;
        let src_w = sprite.width as i64;
        let src_h = sprite.height as i64;
        let dest_w = dest.w as i64;
        let dest_h = dest.h as i64;

        for py in visible.y..visible.bottom() {
            let local_y = py as i64 - dest.y as i64;
            let sy = ((local_y * src_h) / dest_h).clamp(0, src_h - 1) as usize;
            let src_row = &sprite.rgba[sy * src_stride..sy * src_stride + src_stride];
            let dst_row_start = py as usize * stride;

            for px in visible.x..visible.right() {
                let local_x = px as i64 - dest.x as i64;
                let sx = ((local_x * src_w) / dest_w).clamp(0, src_w - 1) as usize;
                let src = &src_row[sx * 4..sx * 4 + 4];
                let a = src[3] as u32;
                if a == 0 {
                    continue;
                }

                let idx = dst_row_start + px as usize * 4;
                let dst = &mut self.frame[idx..idx + 4];
                if a == 255 {
                    dst[0] = src[0];
                    dst[1] = src[1];
                    dst[2] = src[2];
                    dst[3] = 255;
                    continue;
                }

                let inv = 255 - a;
                dst[0] = ((dst[0] as u32 * inv + src[0] as u32 * a + 127) / 255) as u8;
                dst[1] = ((dst[1] as u32 * inv + src[1] as u32 * a + 127) / 255) as u8;
                dst[2] = ((dst[2] as u32 * inv + src[2] as u32 * a + 127) / 255) as u8;
                dst[3] = 255;
            }
        }
    }
}

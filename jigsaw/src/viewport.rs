//! Camera over the board and frame composition.
//!
//! `pan` is the board point shown at the window's top-left and `scale` is screen pixels per board
//! pixel, so `board = pan + screen / scale`.

use engine::graphics::{Color, Renderer2d, SpriteView};
use engine::rect::{Rect, ScreenRect};
use engine::surface::SurfaceSize;

use crate::board::{Board, BoardRect};
use crate::config::PuzzleConfig;
use crate::geometry::PieceId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f32,
    pub pan_y: f32,
    pub scale: f32,
}

/// One sprite blit, in paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteDraw {
    pub piece: PieceId,
    pub dest: ScreenRect,
    pub flattened: bool,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    camera: Camera,
    window: SurfaceSize,
    zoom_step: f32,
    min_scale: f32,
    max_scale: f32,
    background: Color,
    backdrop: Color,
}

impl Viewport {
    /// Fits the whole board into `window` and centres it.
    pub fn new(board: &Board, window: SurfaceSize, config: &PuzzleConfig) -> Self {
        let extent = board.extent();
        let win_w = window.width.max(1) as f32;
        let win_h = window.height.max(1) as f32;
        let fit = (win_w / extent.w).min(win_h / extent.h);
        let mut viewport = Self {
            camera: Camera {
                pan_x: 0.0,
                pan_y: 0.0,
                scale: fit.clamp(config.min_scale, config.max_scale),
            },
            window,
            zoom_step: config.zoom_step,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            background: config.background,
            backdrop: config.backdrop,
        };
        viewport.reset(board);
        viewport
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn scale(&self) -> f32 {
        self.camera.scale
    }

    pub fn window(&self) -> SurfaceSize {
        self.window
    }

    pub fn screen_to_board(&self, sx: f32, sy: f32) -> (f32, f32) {
        let c = self.camera;
        (c.pan_x + sx / c.scale, c.pan_y + sy / c.scale)
    }

    pub fn board_to_screen(&self, bx: f32, by: f32) -> (f32, f32) {
        let c = self.camera;
        ((bx - c.pan_x) * c.scale, (by - c.pan_y) * c.scale)
    }

    /// Multiplies the scale by `zoom_step^steps` (positive zooms in), keeping the board point at
    /// the window centre fixed.
    pub fn zoom(&mut self, steps: f32) {
        let half_w = self.window.width as f32 / 2.0;
        let half_h = self.window.height as f32 / 2.0;
        let (cx, cy) = self.screen_to_board(half_w, half_h);

        let scale = (self.camera.scale * self.zoom_step.powf(steps))
            .clamp(self.min_scale, self.max_scale);
        self.camera.scale = scale;
        self.camera.pan_x = cx - half_w / scale;
        self.camera.pan_y = cy - half_h / scale;
    }

    /// Pans by a screen-pixel delta; the board follows the pointer.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.camera.pan_x -= dx / self.camera.scale;
        self.camera.pan_y -= dy / self.camera.scale;
    }

    /// Centres the board in the window at the current scale.
    pub fn reset(&mut self, board: &Board) {
        let extent = board.extent();
        let scale = self.camera.scale;
        self.camera.pan_x = extent.w / 2.0 - self.window.width as f32 / scale / 2.0;
        self.camera.pan_y = extent.h / 2.0 - self.window.height as f32 / scale / 2.0;
        tracing::debug!(
            pan_x = self.camera.pan_x,
            pan_y = self.camera.pan_y,
            scale,
            "view reset"
        );
    }

    pub fn resize(&mut self, window: SurfaceSize) {
        if !window.is_empty() {
            self.window = window;
        }
    }

    /// Board area under the window, clipped to the board.
    pub fn visible_region(&self, board: &Board) -> Option<BoardRect> {
        let c = self.camera;
        let view = BoardRect::new(
            c.pan_x,
            c.pan_y,
            self.window.width as f32 / c.scale,
            self.window.height as f32 / c.scale,
        );
        view.intersect(&board.extent())
    }

    /// Both edges are mapped and floored separately so adjacent rects share their seam.
    pub fn to_screen_rect(&self, r: &BoardRect) -> ScreenRect {
        let (x0, y0) = self.board_to_screen(r.x, r.y);
        let (x1, y1) = self.board_to_screen(r.right(), r.bottom());
        let x0 = x0.floor() as i64;
        let y0 = y0.floor() as i64;
        let x1 = x1.floor() as i64;
        let y1 = y1.floor() as i64;
        ScreenRect::new(
            x0.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            y0.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            (x1 - x0).clamp(0, u32::MAX as i64) as u32,
            (y1 - y0).clamp(0, u32::MAX as i64) as u32,
        )
    }

    /// Pieces whose sprite overlaps the visible region, back to front.
    pub fn draw_list(&self, board: &Board) -> Vec<SpriteDraw> {
        let Some(visible) = self.visible_region(board) else {
            return Vec::new();
        };
        board
            .draw_order()
            .into_iter()
            .filter_map(|id| {
                let piece = board.piece(id);
                let bounds = piece.sprite_bounds();
                if !bounds.overlaps(&visible) {
                    return None;
                }
                let dest = self.to_screen_rect(&bounds);
                if dest.w == 0 || dest.h == 0 {
                    return None;
                }
                Some(SpriteDraw {
                    piece: id,
                    dest,
                    flattened: piece.is_flattened(),
                })
            })
            .collect()
    }

    pub fn compose(&self, board: &Board, gfx: &mut dyn Renderer2d) {
        let surface = gfx.size();
        let surface_rect = Rect::from_size(surface.width, surface.height);
        gfx.clear(self.background);

        let Some(visible) = self.visible_region(board) else {
            return;
        };
        let Some(clip) = self.to_screen_rect(&visible).clip_to(surface_rect) else {
            return;
        };

        if let Some(backdrop) = board.solved_rect().intersect(&visible) {
            if let Some(rect) = self.to_screen_rect(&backdrop).clip_to(clip) {
                gfx.fill_rect(rect, self.backdrop);
            }
        }

        for draw in self.draw_list(board) {
            let sprite = board.piece(draw.piece).sprite();
            gfx.blit_sprite(
                SpriteView::new(sprite.width(), sprite.height(), sprite.as_raw()),
                draw.dest,
                clip,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::surface::FrameBuffer;
    use image::{Rgba, RgbaImage};

    use crate::config::Placement;
    use crate::geometry::GridSize;
    use crate::masks::MaskSet;

    fn board() -> Board {
        let source = RgbaImage::from_fn(150, 150, |_, _| Rgba([200, 100, 50, 255]));
        let masks = MaskSet::procedural(50, 10).expect("masks");
        let grid = GridSize::new(3, 3).expect("grid");
        let config = PuzzleConfig {
            margin: 1,
            ..PuzzleConfig::default()
        };
        Board::with_placement(&source, &masks, grid, &config, Placement::PreSolved)
            .expect("board")
    }

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-3 && (a.1 - b.1).abs() < 1e-3
    }

    #[test]
    fn initial_view_fits_and_centres_the_board() {
        let b = board();
        let view = Viewport::new(&b, SurfaceSize::new(900, 450), &PuzzleConfig::default());
        // 450x450 board in a 900x450 window: scale 1, board centred horizontally.
        assert_eq!(view.scale(), 1.0);
        assert_eq!(view.camera().pan_x, -225.0);
        assert_eq!(view.camera().pan_y, 0.0);
        assert!(close(view.screen_to_board(225.0, 0.0), (0.0, 0.0)));
    }

    #[test]
    fn board_and_screen_mappings_are_inverse() {
        let b = board();
        let mut view = Viewport::new(&b, SurfaceSize::new(640, 480), &PuzzleConfig::default());
        view.zoom(3.0);
        view.pan_by(17.0, -9.0);
        for p in [(0.0, 0.0), (123.5, 77.25), (449.0, 10.0)] {
            let (sx, sy) = view.board_to_screen(p.0, p.1);
            assert!(close(view.screen_to_board(sx, sy), p));
        }
    }

    #[test]
    fn zoom_keeps_window_centre_fixed() {
        let b = board();
        let mut view = Viewport::new(&b, SurfaceSize::new(640, 480), &PuzzleConfig::default());
        let before = view.screen_to_board(320.0, 240.0);
        let scale = view.scale();
        view.zoom(1.0);
        assert!((view.scale() - scale * 10.0 / 9.0).abs() < 1e-5);
        assert!(close(view.screen_to_board(320.0, 240.0), before));
        view.zoom(-2.0);
        assert!(close(view.screen_to_board(320.0, 240.0), before));
    }

    #[test]
    fn zoom_is_clamped() {
        let b = board();
        let mut view = Viewport::new(&b, SurfaceSize::new(640, 480), &PuzzleConfig::default());
        view.zoom(500.0);
        assert_eq!(view.scale(), 16.0);
        view.zoom(-5000.0);
        assert_eq!(view.scale(), 0.02);
    }

    #[test]
    fn reset_recentres_at_current_scale() {
        let b = board();
        let mut view = Viewport::new(&b, SurfaceSize::new(450, 450), &PuzzleConfig::default());
        view.zoom(2.0);
        view.pan_by(100.0, 40.0);
        let scale = view.scale();
        view.reset(&b);
        assert_eq!(view.scale(), scale);
        assert!(close(view.screen_to_board(225.0, 225.0), (225.0, 225.0)));
    }

    #[test]
    fn pan_follows_the_pointer() {
        let b = board();
        let mut view = Viewport::new(&b, SurfaceSize::new(450, 450), &PuzzleConfig::default());
        let before = view.screen_to_board(100.0, 100.0);
        view.pan_by(10.0, 5.0);
        assert!(close(view.screen_to_board(110.0, 105.0), before));
    }

    #[test]
    fn draw_list_skips_pieces_outside_the_view() {
        let b = board();
        let mut view = Viewport::new(&b, SurfaceSize::new(450, 450), &PuzzleConfig::default());
        assert_eq!(view.draw_list(&b).len(), 9);

        // Zoom to 4.5x and look at the top-left 2x2 cells of the solved area.
        view.zoom(4.5f32.ln() / (10.0f32 / 9.0).ln());
        let cam = view.camera();
        view.pan_by((cam.pan_x - 150.0) * cam.scale, (cam.pan_y - 150.0) * cam.scale);
        let visible = view.visible_region(&b).expect("visible");
        assert!(close((visible.x, visible.y), (150.0, 150.0)));
        let ids: Vec<PieceId> = view.draw_list(&b).iter().map(|d| d.piece).collect();
        assert!(ids.contains(&0));
        assert!(!ids.contains(&8));
    }

    #[test]
    fn fully_off_board_view_draws_nothing() {
        let b = board();
        let mut view = Viewport::new(&b, SurfaceSize::new(100, 100), &PuzzleConfig::default());
        view.pan_by(100_000.0, 0.0);
        assert!(view.visible_region(&b).is_none());
        assert!(view.draw_list(&b).is_empty());
    }

    #[test]
    fn compose_paints_background_backdrop_and_pieces() {
        let b = board();
        let config = PuzzleConfig::default();
        let view = Viewport::new(&b, SurfaceSize::new(450, 450), &config);
        let mut fb = FrameBuffer::new(SurfaceSize::new(450, 450));
        view.compose(&b, &mut fb.renderer());

        assert_eq!(fb.pixel(10, 10), Some(config.background));
        // Centre of the middle piece: source colour.
        assert_eq!(fb.pixel(225, 225), Some([200, 100, 50, 255]));
    }

    #[test]
    fn empty_solved_area_shows_backdrop() {
        let mut b = board();
        b.place_group(4, 20.0, 20.0);
        let config = PuzzleConfig::default();
        let view = Viewport::new(&b, SurfaceSize::new(450, 450), &config);
        let mut fb = FrameBuffer::new(SurfaceSize::new(450, 450));
        view.compose(&b, &mut fb.renderer());
        assert_eq!(fb.pixel(225, 225), Some(config.backdrop));
        assert_eq!(fb.pixel(45, 45), Some([200, 100, 50, 255]));
    }
}

use engine::GameLogic;
use engine::graphics::{CpuRenderer, Renderer2d};
use engine::surface::SurfaceSize;

use crate::board::Board;
use crate::config::PuzzleConfig;
use crate::geometry::PieceId;
use crate::group::GroupId;
use crate::viewport::Viewport;

/// Pointer and camera gestures, already separated from window events by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PuzzleInput {
    /// Primary button down at a screen position.
    Press { x: f32, y: f32 },
    /// Pointer motion in screen pixels.
    Drag { dx: f32, dy: f32 },
    Release,
    PanStart,
    PanEnd,
    /// Positive zooms in.
    Zoom { steps: f32 },
    ResetView,
    Resize { width: u32, height: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    PickedUp(PieceId),
    Merged { group: GroupId, size: usize },
    Anchored { group: GroupId },
    /// Reported once, by the release that joins the last two clusters or anchors the only one.
    Completed,
}

/// A board, the camera over it, and what the pointer is doing.
#[derive(Debug, Clone)]
pub struct PuzzleSession {
    board: Board,
    viewport: Viewport,
    held: Option<PieceId>,
    panning: bool,
    completion_reported: bool,
}

impl PuzzleSession {
    pub fn new(board: Board, window: SurfaceSize, config: &PuzzleConfig) -> Self {
        let viewport = Viewport::new(&board, window, config);
        Self {
            board,
            viewport,
            held: None,
            panning: false,
            completion_reported: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn held(&self) -> Option<PieceId> {
        self.held
    }

    pub fn is_panning(&self) -> bool {
        self.panning
    }

    pub fn is_complete(&self) -> bool {
        self.board.is_complete()
    }

    pub fn handle_input(&mut self, input: PuzzleInput) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        match input {
            PuzzleInput::Press { x, y } => {
                let (bx, by) = self.viewport.screen_to_board(x, y);
                self.held = self.board.hit_test(bx, by);
                if let Some(id) = self.held {
                    tracing::debug!(id, bx, by, "piece picked up");
                    events.push(SessionEvent::PickedUp(id));
                }
            }
            PuzzleInput::Drag { dx, dy } => {
                if self.panning {
                    self.viewport.pan_by(dx, dy);
                }
                if let Some(id) = self.held {
                    let scale = self.viewport.scale();
                    self.board.move_group(id, dx / scale, dy / scale);
                }
            }
            PuzzleInput::Release => {
                if let Some(id) = self.held.take() {
                    let outcome = self.board.release(id);
                    if outcome.merges > 0 {
                        events.push(SessionEvent::Merged {
                            group: outcome.group,
                            size: outcome.group_size,
                        });
                    }
                    if outcome.anchored {
                        events.push(SessionEvent::Anchored {
                            group: outcome.group,
                        });
                    }
                    // A single-piece board is one cluster from the start; it completes when
                    // that piece anchors.
                    let settled = outcome.merges > 0 || outcome.anchored;
                    if outcome.completed && settled && !self.completion_reported {
                        self.completion_reported = true;
                        events.push(SessionEvent::Completed);
                    }
                }
            }
            PuzzleInput::PanStart => self.panning = true,
            PuzzleInput::PanEnd => self.panning = false,
            PuzzleInput::Zoom { steps } => self.viewport.zoom(steps),
            PuzzleInput::ResetView => self.viewport.reset(&self.board),
            PuzzleInput::Resize { width, height } => {
                self.viewport.resize(SurfaceSize::new(width, height));
            }
        }
        events
    }

    pub fn render(&self, gfx: &mut dyn Renderer2d) {
        self.viewport.compose(&self.board, gfx);
    }

    /// Composes into a caller-owned RGBA buffer of `width` x `height`.
    pub fn render_into(&self, frame: &mut [u8], width: u32, height: u32) {
        let mut gfx = CpuRenderer::new(frame, SurfaceSize::new(width, height));
        self.render(&mut gfx);
    }
}

/// Replays `PuzzleInput`s from a fixed starting session.
#[derive(Debug, Clone)]
pub struct PuzzleLogic {
    initial: PuzzleSession,
}

impl PuzzleLogic {
    pub fn new(initial: PuzzleSession) -> Self {
        Self { initial }
    }
}

impl GameLogic for PuzzleLogic {
    type State = PuzzleSession;
    type Input = PuzzleInput;

    fn initial_state(&self) -> Self::State {
        self.initial.clone()
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let mut next = state.clone();
        next.handle_input(input);
        next
    }
}

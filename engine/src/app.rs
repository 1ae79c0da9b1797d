use std::error::Error;
use std::time::{Duration, Instant};

use pixels::{PixelsBuilder, SurfaceTexture};
use winit::dpi::PhysicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton, MouseScrollDelta, VirtualKeyCode,
    WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use crate::graphics::Renderer2d;
use crate::pixels_renderer::PixelsRenderer2d;
use crate::surface::SurfaceSize;

/// Pixel-delta wheel events are normalised to "lines" with this many pixels per line.
const PIXELS_PER_WHEEL_LINE: f64 = 40.0;

pub struct AppConfig {
    pub title: String,
    pub desired_size: PhysicalSize<u32>,
    pub clamp_to_monitor: bool,
    pub vsync: Option<bool>,
}

pub struct AppContext {
    pub window: Window,
    pub renderer: PixelsRenderer2d,
    pub surface_size: SurfaceSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Window input in arrival order. Press/move/release ordering matters to drag handling, so the
/// loop queues events instead of folding them into flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    ButtonPressed {
        button: PointerButton,
        x: f64,
        y: f64,
    },
    ButtonReleased {
        button: PointerButton,
        x: f64,
        y: f64,
    },
    CursorMoved {
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
    },
    Wheel {
        lines: f32,
    },
    KeyPressed(VirtualKeyCode),
    Resized(SurfaceSize),
}

#[derive(Debug, Clone, Default)]
pub struct InputFrame {
    pub cursor: Option<(f64, f64)>,
    pub events: Vec<InputEvent>,
}

impl InputFrame {
    fn push_cursor(&mut self, x: f64, y: f64) {
        let (dx, dy) = match self.cursor {
            Some((px, py)) => (x - px, y - py),
            None => (0.0, 0.0),
        };
        self.cursor = Some((x, y));
        self.events.push(InputEvent::CursorMoved { x, y, dx, dy });
    }

    fn push_button(&mut self, button: PointerButton, state: ElementState) {
        let (x, y) = self.cursor.unwrap_or((0.0, 0.0));
        self.events.push(match state {
            ElementState::Pressed => InputEvent::ButtonPressed { button, x, y },
            ElementState::Released => InputEvent::ButtonReleased { button, x, y },
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Exit,
}

pub trait GameApp {
    type State;

    fn init_state(&mut self, ctx: &mut AppContext) -> Self::State;

    fn update_state(
        &mut self,
        state: &mut Self::State,
        input: &InputFrame,
        dt: Duration,
        ctx: &mut AppContext,
    ) -> FrameControl;

    fn render(&mut self, state: &Self::State, renderer: &mut dyn Renderer2d);
}

fn map_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Other(_) => None,
    }
}

pub fn run_game<G: GameApp + 'static>(config: AppConfig, mut game: G) -> Result<(), Box<dyn Error>> {
    let event_loop = EventLoop::new();
    let monitor_size = if config.clamp_to_monitor {
        event_loop.primary_monitor().map(|m| m.size())
    } else {
        None
    };
    let initial_size = if let Some(monitor) = monitor_size {
        PhysicalSize::new(
            config.desired_size.width.min(monitor.width),
            config.desired_size.height.min(monitor.height),
        )
    } else {
        config.desired_size
    };
    let window = WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(initial_size)
        .build(&event_loop)?;

    let window_size = window.inner_size();
    let surface_size = SurfaceSize::new(window_size.width.max(1), window_size.height.max(1));

    let surface_texture = SurfaceTexture::new(surface_size.width, surface_size.height, &window);
    let mut pixels_builder =
        PixelsBuilder::new(surface_size.width, surface_size.height, surface_texture);
    if let Some(vsync) = config.vsync {
        pixels_builder = pixels_builder.enable_vsync(vsync);
    }
    let pixels = pixels_builder.build()?;
    let renderer = PixelsRenderer2d::new(pixels, surface_size)?;

    let mut ctx = AppContext {
        window,
        renderer,
        surface_size,
    };
    let mut state = game.init_state(&mut ctx);
    let mut input = InputFrame::default();
    let mut last_frame = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        match &event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    let new_size = SurfaceSize::new(size.width, size.height);
                    if let Err(err) = ctx.renderer.resize(new_size) {
                        tracing::warn!(%err, "resize failed");
                    }
                    if !new_size.is_empty() {
                        ctx.surface_size = new_size;
                        input.events.push(InputEvent::Resized(new_size));
                    }
                    ctx.window.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.push_cursor(position.x, position.y);
                }
                WindowEvent::MouseInput {
                    state: mouse_state,
                    button,
                    ..
                } => {
                    if let Some(button) = map_button(*button) {
                        input.push_button(button, *mouse_state);
                    }
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    let lines = match delta {
                        MouseScrollDelta::LineDelta(_, y) => *y,
                        MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_WHEEL_LINE) as f32,
                    };
                    if lines != 0.0 {
                        input.events.push(InputEvent::Wheel { lines });
                    }
                }
                WindowEvent::KeyboardInput {
                    input:
                        KeyboardInput {
                            state: ElementState::Pressed,
                            virtual_keycode: Some(key),
                            ..
                        },
                    ..
                } => {
                    input.events.push(InputEvent::KeyPressed(*key));
                }
                _ => {}
            },
            Event::RedrawRequested(_) => {
                let now = Instant::now();
                let dt = now.saturating_duration_since(last_frame);
                last_frame = now;

                let control = game.update_state(&mut state, &input, dt, &mut ctx);
                input.events.clear();
                if control == FrameControl::Exit {
                    *control_flow = ControlFlow::Exit;
                    return;
                }

                ctx.renderer.draw_frame(|gfx| {
                    game.render(&state, gfx);
                });
                if let Err(err) = ctx.renderer.present() {
                    tracing::warn!(%err, "present failed");
                }
            }
            Event::MainEventsCleared => {
                ctx.window.request_redraw();
            }
            _ => {}
        }
    });
}

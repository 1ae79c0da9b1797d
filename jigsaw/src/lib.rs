//! Jigsaw puzzle assembly.
//!
//! A source image is cut into interlocking pieces on an odd-by-odd grid. Pieces are dragged
//! around a board several times the size of the image; dropping one near a grid neighbor snaps
//! and merges the two clusters, and dropping a corner piece near its solved corner locks its
//! cluster in place. The puzzle is complete once a single cluster holds every piece.

pub mod board;
pub mod config;
pub mod connection;
pub mod draw_order;
pub mod error;
pub mod geometry;
pub mod group;
pub mod masks;
pub mod optimizer;
pub mod session;
pub mod slicer;
pub mod viewport;

pub use board::{Board, BoardRect, Piece};
pub use config::{ClampPolicy, ConfigStore, Placement, PlacementMode, PuzzleConfig};
pub use error::{PuzzleError, Result};
pub use geometry::{GridSize, PieceId, PieceKind};
pub use masks::MaskSet;
pub use session::{PuzzleInput, PuzzleLogic, PuzzleSession, SessionEvent};
pub use viewport::{Camera, SpriteDraw, Viewport};

#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod event;
pub mod geometry;
pub mod history;
pub mod input;
pub mod panels;
pub mod persistence;
pub mod pressure;
pub mod renderer;
pub mod stroke;
pub mod tools;
pub mod util;
pub mod viewport;

pub use app::InkApp;
pub use config::{BrushSettings, CanvasConfig, EngineSettings};
pub use document::{DrawingContent, PageId};
pub use engine::{InkCanvas, Repaint};
pub use event::{CanvasEvent, CanvasObserver};
pub use input::{InputEvent, InputHandler, PointerSample, Shortcut};
pub use persistence::{FileBackend, MemoryBackend, PersistenceBridge, SaveBackend, SaveStatus};
pub use renderer::{RasterSurface, Renderer, Surface};
pub use stroke::{Stroke, StrokePoint, StrokeTool};
pub use tools::Tool;
pub use viewport::Viewport;

//! Bitmap rendering of pages, off the document thread.
//!
//! The engine never decodes files itself: a [`Renderer`] turns a
//! [`RenderRequest`] into a [`Bitmap`], the [`RenderPool`] runs renderers on
//! blocking threads with a per-request timeout, and results are written back
//! through [`Workspace::apply_render`](crate::editing::Workspace::apply_render),
//! which drops anything that no longer matches the page.

pub mod cache;
pub mod pool;

pub use cache::{CacheEntry, CacheState, RenderCache};
pub use pool::{RenderPool, ViewerRenderSlot};

use std::sync::Arc;
use std::time::Duration;

use crate::models::{PageId, RenderKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPurpose {
    Thumbnail,
    /// Full-resolution render for the viewer, tagged with the slot generation
    Viewer { generation: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub page_id: PageId,
    pub key: RenderKey,
    pub scale: f32,
    pub purpose: RenderPurpose,
}

/// RGBA pixels, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("Render failed: {0}")]
    Failed(String),
    #[error("Render timed out after {0:?}")]
    TimedOut(Duration),
    #[error("Render cancelled")]
    Cancelled,
    #[error("Render workers have shut down")]
    WorkerGone,
}

/// Produces pixels for a page. Called on a blocking thread.
pub trait Renderer: Send + Sync + 'static {
    fn render(&self, request: &RenderRequest) -> Result<Bitmap, RenderError>;
}

#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub request: RenderRequest,
    pub result: Result<Bitmap, RenderError>,
}

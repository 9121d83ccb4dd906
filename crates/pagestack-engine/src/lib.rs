pub mod drag;
pub mod editing;
pub mod geometry;
pub mod io;
pub mod models;
pub mod render;
pub mod viewer;

// Re-export key types for easier usage
pub use drag::{DragSession, DropAction, DropTarget, DropZones, ItemZone, LayoutMode};
pub use editing::{Cmd, Direction, Document, EditError, Modifiers, Patch, Selection, Workspace};
pub use geometry::{Point, Rect, Size};
pub use io::{ExportJob, ExportMetadata, Exporter, FsProbe, ImportedSource, IoError, SourceProbe};
pub use models::{ColorTag, EntityId, Item, ItemId, Page, PageId, RenderKey, Rotation, SourceKind};
pub use render::{Bitmap, RenderError, RenderPool, RenderRequest, Renderer};
pub use viewer::{Viewer, ViewerSession, ViewerTool};

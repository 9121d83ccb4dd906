pub mod ids;
pub mod item;
pub mod page;

pub use ids::{EntityId, ItemId, PageId};
pub use item::Item;
pub use page::{ColorTag, Page, RenderKey, Rotation, SourceKind};

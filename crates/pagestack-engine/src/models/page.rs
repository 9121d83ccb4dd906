use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::models::{ItemId, PageId};

/// Quarter-turn rotation applied to a page on top of its source orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Normalise any angle to the nearest lower quarter turn
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            3 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    /// Add 90 degrees, wrapping at 360
    pub fn clockwise(self) -> Self {
        match self {
            Rotation::Deg0 => Rotation::Deg90,
            Rotation::Deg90 => Rotation::Deg180,
            Rotation::Deg180 => Rotation::Deg270,
            Rotation::Deg270 => Rotation::Deg0,
        }
    }

    /// True when width and height swap on screen
    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// What kind of source a page or item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Multi-page document (PDF)
    File,
    /// Single raster image
    Image,
}

/// Display color tag, assigned per imported source and inherited by its pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorTag {
    Red,
    Blue,
    Green,
    Purple,
    Orange,
}

impl ColorTag {
    pub const CYCLE: [ColorTag; 5] = [
        ColorTag::Red,
        ColorTag::Blue,
        ColorTag::Green,
        ColorTag::Purple,
        ColorTag::Orange,
    ];

    pub fn for_index(index: usize) -> Self {
        Self::CYCLE[index % Self::CYCLE.len()]
    }
}

/// Everything a bitmap of a page depends on.
///
/// Two pages with equal keys render to the same pixels, so a cached bitmap is
/// valid for as long as the page's key is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderKey {
    pub path: PathBuf,
    pub source_index: usize,
    pub rotation: Rotation,
}

/// A single page or image in the document.
///
/// `source_item` and `source_index` record where the page was originally
/// extracted from. They never change after creation (except when a whole item
/// is duplicated) and do not imply the page still lives in that item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub name: String,
    pub kind: SourceKind,
    pub rotation: Rotation,
    pub source_item: ItemId,
    pub source_index: usize,
    pub path: PathBuf,
    pub color: ColorTag,
}

impl Page {
    pub fn new(
        name: impl Into<String>,
        kind: SourceKind,
        path: impl Into<PathBuf>,
        source_item: ItemId,
        source_index: usize,
        color: ColorTag,
    ) -> Self {
        Self {
            id: PageId::new(),
            name: name.into(),
            kind,
            rotation: Rotation::Deg0,
            source_item,
            source_index,
            path: path.into(),
            color,
        }
    }

    pub fn render_key(&self) -> RenderKey {
        RenderKey {
            path: self.path.clone(),
            source_index: self.source_index,
            rotation: self.rotation,
        }
    }

    /// Copy of this page under a fresh id, provenance untouched
    pub fn duplicate(&self) -> Self {
        Self {
            id: PageId::new(),
            ..self.clone()
        }
    }
}

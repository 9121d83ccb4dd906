use std::collections::HashSet;
use std::path::PathBuf;

use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::drag::{DragSession, DropTarget, DropZones, InternalDrag};
use crate::editing::{
    Cmd, Direction, Document, EditError, History, Modifiers, Patch, Selection,
};
use crate::geometry::{Point, Size};
use crate::io::{
    ExportEntry, ExportJob, ExportMetadata, ExportOutcome, Exporter, IoError, SourceProbe,
    display_name, probe_sources,
};
use crate::models::{EntityId, ItemId, PageId};
use crate::render::{
    Bitmap, CacheState, RenderCache, RenderOutcome, RenderPurpose, RenderRequest, ViewerRenderSlot,
};
use crate::viewer::{Viewer, ViewerSession};

/// Everything one editing session owns.
///
/// All undoable changes go through [`apply`](Self::apply), which records the
/// prior document in history and keeps selection, viewer and render cache in
/// step with the new tree.
#[derive(Debug)]
pub struct Workspace {
    document: Document,
    history: History<Document>,
    selection: Selection,
    drag: DragSession,
    viewer: Viewer,
    viewer_render: ViewerRenderSlot,
    viewer_frame: Option<Bitmap>,
    cache: RenderCache,
    version: u64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            document: Document::new(),
            history: History::new(Document::new()),
            selection: Selection::new(),
            drag: DragSession::Idle,
            viewer: Viewer::Closed,
            viewer_render: ViewerRenderSlot::default(),
            viewer_frame: None,
            cache: RenderCache::new(),
            version: 0,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Open viewer session for zoom and pointer handling
    pub fn viewer_mut(&mut self) -> Option<&mut ViewerSession> {
        self.viewer.session_mut()
    }

    /// Latest full-resolution bitmap for the viewer page
    pub fn viewer_frame(&self) -> Option<&Bitmap> {
        self.viewer_frame.as_ref()
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn visible_order(&self, top_level_only: bool) -> Vec<EntityId> {
        self.document.visible_order(top_level_only)
    }

    // ---- commands -------------------------------------------------------

    /// Apply a command, recording the prior document in history.
    ///
    /// A command that leaves the document unchanged records nothing, whether
    /// it succeeded or failed. A failing command that got partway still
    /// records the prior document so the partial change can be undone. The
    /// tree itself is always left sanitized.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        let before = self.document.clone();
        match self.document.apply(cmd) {
            Ok(effects) => {
                if self.document == before {
                    return Ok(Patch::unchanged(self.version));
                }
                self.history.push(before);
                self.version += 1;
                self.sync_after_change(&effects.invalidated);
                Ok(Patch {
                    changed: true,
                    version: self.version,
                    invalidated: effects.invalidated,
                    created: effects.created,
                })
            }
            Err(e) => {
                warn!("Command failed: {e}");
                if self.document != before {
                    self.history.push(before);
                    self.version += 1;
                    self.sync_after_change(&[]);
                }
                Err(e)
            }
        }
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(self.document.clone()) else {
            return false;
        };
        self.restore(previous);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(self.document.clone()) else {
            return false;
        };
        self.restore(next);
        true
    }

    fn restore(&mut self, document: Document) {
        self.document = document;
        self.selection.clear();
        self.version += 1;
        self.sync_after_change(&[]);
    }

    /// Keep everything outside the document consistent with it
    fn sync_after_change(&mut self, invalidated: &[PageId]) {
        let document = &self.document;
        self.cache.invalidate(invalidated);
        let pruned = self.cache.prune(|page| document.page(page).is_some());
        if pruned > 0 {
            debug!("Pruned {pruned} cached renders");
        }

        self.selection.retain(|entity| match entity {
            EntityId::Item(id) => document.item(id).is_some(),
            EntityId::Page(id) => document.page(id).is_some(),
        });

        let Some(page_id) = self.viewer.page_id() else {
            return;
        };
        match self.document.page(page_id).map(|page| page.rotation) {
            None => self.close_viewer(),
            Some(rotation) => {
                if let Some(session) = self.viewer.session_mut()
                    && session.rotation != rotation
                {
                    session.rotation = rotation;
                    session.fit_page();
                    self.viewer_frame = None;
                }
            }
        }
    }

    /// Empty the document and forget all history
    pub fn reset(&mut self) {
        self.close_viewer();
        self.document = Document::new();
        self.history.reset(Document::new());
        self.selection.clear();
        self.drag = DragSession::Idle;
        self.cache.clear();
        self.version += 1;
    }

    // ---- selection ------------------------------------------------------

    pub fn click(&mut self, id: EntityId, modifiers: Modifiers) {
        let visible = self.document.visible_order(false);
        self.selection.click(id, modifiers, &visible);
    }

    pub fn select_only(&mut self, id: EntityId) {
        self.selection.select_only(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Keyboard navigation through the visible order
    pub fn navigate(&mut self, delta: isize, extend: bool, top_level_only: bool) -> Option<EntityId> {
        let visible = self.document.visible_order(top_level_only);
        let cursor_index = self.selection.cursor().and_then(|cursor| {
            visible.iter().position(|id| *id == cursor).or_else(|| {
                let top = self.document.top_level_entity(cursor)?;
                visible.iter().position(|id| *id == top)
            })
        });
        self.selection.step(&visible, delta, extend, cursor_index)
    }

    /// Selected entities in document order
    pub fn selected_targets(&self) -> Vec<EntityId> {
        self.document
            .in_document_order(self.selection.ids().iter().copied())
    }

    fn apply_to_selection(&mut self, cmd: fn(Vec<EntityId>) -> Cmd) -> Result<Patch, EditError> {
        let targets = self.selected_targets();
        if targets.is_empty() {
            return Ok(Patch::unchanged(self.version));
        }
        self.apply(cmd(targets))
    }

    pub fn duplicate_selected(&mut self) -> Result<Patch, EditError> {
        self.apply_to_selection(Cmd::Duplicate)
    }

    pub fn rotate_selected(&mut self) -> Result<Patch, EditError> {
        self.apply_to_selection(Cmd::Rotate)
    }

    pub fn revert_selected(&mut self) -> Result<Patch, EditError> {
        self.apply_to_selection(Cmd::Revert)
    }

    pub fn delete_selected(&mut self) -> Result<Patch, EditError> {
        let patch = self.apply_to_selection(Cmd::Delete)?;
        self.selection.clear();
        Ok(patch)
    }

    /// Move the anchor entity one step
    pub fn move_selected(&mut self, direction: Direction) -> Result<Patch, EditError> {
        let Some(entity) = self.selection.anchor() else {
            return Ok(Patch::unchanged(self.version));
        };
        self.apply(Cmd::Shift { entity, direction })
    }

    // ---- expansion (not recorded in history) ----------------------------

    pub fn set_expanded(&mut self, id: ItemId, expanded: bool) -> bool {
        match self.document.item_mut(id) {
            Some(item) if item.is_group && item.expanded != expanded => {
                item.expanded = expanded;
                true
            }
            _ => false,
        }
    }

    /// Toggle the group an entity belongs to (a group itself, or a page's group)
    pub fn toggle_expanded(&mut self, entity: EntityId) -> bool {
        let group = match entity {
            EntityId::Item(id) => self.document.item(id),
            EntityId::Page(page) => self.document.owner_item(page),
        }
        .filter(|item| item.is_group)
        .map(|item| (item.id, item.expanded));

        match group {
            Some((id, expanded)) => self.set_expanded(id, !expanded),
            None => false,
        }
    }

    pub fn expand_all(&mut self) -> usize {
        self.set_all_expanded(true)
    }

    pub fn collapse_all(&mut self) -> usize {
        self.set_all_expanded(false)
    }

    fn set_all_expanded(&mut self, expanded: bool) -> usize {
        let ids: Vec<ItemId> = self.document.items().map(|item| item.id).collect();
        ids.into_iter()
            .filter(|id| self.set_expanded(*id, expanded))
            .count()
    }

    /// Collapse every expanded group that does not contain `entity`
    pub fn collapse_others(&mut self, entity: EntityId) -> usize {
        let keep = match entity {
            EntityId::Item(id) => Some(id),
            EntityId::Page(page) => self.document.owner_item(page).map(|item| item.id),
        };
        let ids: Vec<ItemId> = self
            .document
            .items()
            .filter(|item| Some(item.id) != keep)
            .map(|item| item.id)
            .collect();
        ids.into_iter()
            .filter(|id| self.set_expanded(*id, false))
            .count()
    }

    // ---- import ---------------------------------------------------------

    /// Paths whose file names are not already in the document, first
    /// occurrence only
    pub fn new_sources(&self, paths: &[PathBuf]) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        paths
            .iter()
            .filter(|path| {
                let name = display_name(path);
                !self.document.has_item_named(&name) && seen.insert(name)
            })
            .cloned()
            .collect()
    }

    /// Probe and append sources as one undoable step
    pub fn import(&mut self, paths: &[PathBuf], probe: &dyn SourceProbe) -> Result<Patch, EditError> {
        let fresh = self.new_sources(paths);
        if fresh.is_empty() {
            return Ok(Patch::unchanged(self.version));
        }
        let sources = probe_sources(&fresh, probe);
        self.apply(Cmd::Import(sources))
    }

    // ---- drag and drop --------------------------------------------------

    /// Start dragging `origin`. An unselected origin replaces the selection;
    /// the dragged set is frozen from the selection.
    pub fn begin_drag(&mut self, origin: EntityId) -> Result<(), EditError> {
        if !self.document.contains(origin) {
            return Err(EditError::UnknownEntity(origin));
        }
        if !self.selection.contains(origin) {
            self.selection.select_only(origin);
        }
        let dragged = self.selected_targets();
        debug!("Dragging {} entities", dragged.len());
        self.drag = DragSession::Internal(InternalDrag {
            origin,
            dragged,
            target: None,
        });
        Ok(())
    }

    /// Re-resolve the drop target for the pointer position
    pub fn drag_over(&mut self, zones: &DropZones, pointer: Point) -> Option<DropTarget> {
        let DragSession::Internal(drag) = &mut self.drag else {
            return None;
        };
        drag.target = zones.resolve(pointer, &drag.dragged);
        drag.target
    }

    /// Commit the internal drag onto its current target
    pub fn drop_drag(&mut self) -> Result<Patch, EditError> {
        let DragSession::Internal(drag) = std::mem::take(&mut self.drag) else {
            return Err(EditError::NoActiveDrag);
        };
        let target = drag.target.ok_or(EditError::NoDropTarget)?;
        let patch = self.apply(Cmd::Move {
            dragged: drag.dragged,
            target,
        })?;
        self.selection.clear();
        Ok(patch)
    }

    pub fn cancel_drag(&mut self) {
        self.drag = DragSession::Idle;
    }

    /// Files from outside started hovering; any internal drag is abandoned
    pub fn begin_external_drag(&mut self) {
        self.drag = DragSession::External;
    }

    /// Import the dropped files not already present by name
    pub fn drop_external(
        &mut self,
        paths: &[PathBuf],
        probe: &dyn SourceProbe,
    ) -> Result<Patch, EditError> {
        if !matches!(std::mem::take(&mut self.drag), DragSession::External) {
            return Err(EditError::NoActiveDrag);
        }
        self.import(paths, probe)
    }

    // ---- viewer ---------------------------------------------------------

    pub fn open_viewer(&mut self, page_id: PageId, viewport: Size) -> Result<(), EditError> {
        let entity = EntityId::Page(page_id);
        if !self.document.contains(entity) {
            return Err(EditError::UnknownEntity(entity));
        }
        let rotation = self
            .document
            .page(page_id)
            .map(|page| page.rotation)
            .ok_or(EditError::UnknownEntity(entity))?;

        self.viewer_render.cancel();
        self.viewer_frame = None;
        self.viewer = Viewer::Open(ViewerSession::new(page_id, rotation, viewport));
        Ok(())
    }

    /// Close the viewer, cancelling its in-flight render
    pub fn close_viewer(&mut self) {
        self.viewer_render.cancel();
        self.viewer_frame = None;
        self.viewer = Viewer::Closed;
    }

    /// Rotate the viewed page through the normal rotate command
    pub fn viewer_rotate(&mut self) -> Result<Patch, EditError> {
        let page = self.viewer.page_id().ok_or(EditError::ViewerClosed)?;
        self.apply(Cmd::Rotate(vec![EntityId::Page(page)]))
    }

    pub fn viewer_next_page(&mut self) -> Result<bool, EditError> {
        self.viewer_step(1)
    }

    pub fn viewer_prev_page(&mut self) -> Result<bool, EditError> {
        self.viewer_step(-1)
    }

    /// Step through the flattened page order, stopping at either end
    fn viewer_step(&mut self, delta: isize) -> Result<bool, EditError> {
        let current = self.viewer.page_id().ok_or(EditError::ViewerClosed)?;
        let pages: Vec<(PageId, _)> = self
            .document
            .flattened_pages()
            .map(|page| (page.id, page.rotation))
            .collect();
        let Some(index) = pages.iter().position(|(id, _)| *id == current) else {
            return Ok(false);
        };
        let Some(&(next, rotation)) = index
            .checked_add_signed(delta)
            .and_then(|next| pages.get(next))
        else {
            return Ok(false);
        };

        self.viewer_render.cancel();
        self.viewer_frame = None;
        if let Some(session) = self.viewer.session_mut() {
            session.show_page(next, rotation);
        }
        Ok(true)
    }

    /// Start a full-resolution render of the viewed page at the current scale,
    /// cancelling any render already in flight
    pub fn begin_viewer_render(&mut self) -> Option<(RenderRequest, CancellationToken)> {
        let session = self.viewer.session()?;
        let page = self.document.page(session.page_id)?;
        let (page_id, key, scale) = (page.id, page.render_key(), session.scale);

        let (generation, token) = self.viewer_render.begin();
        Some((
            RenderRequest {
                page_id,
                key,
                scale,
                purpose: RenderPurpose::Viewer { generation },
            },
            token,
        ))
    }

    // ---- thumbnails -----------------------------------------------------

    /// Requests for every page without a current cache entry. Requested pages
    /// are marked pending so they are not requested twice.
    pub fn request_thumbnails(&mut self, scale: f32) -> Vec<RenderRequest> {
        let mut requests = Vec::new();
        for page in self.document.flattened_pages() {
            let key = page.render_key();
            if self.cache.lookup(page.id, &key).is_some() {
                continue;
            }
            requests.push(RenderRequest {
                page_id: page.id,
                key,
                scale,
                purpose: RenderPurpose::Thumbnail,
            });
        }
        for request in &requests {
            self.cache
                .insert(request.page_id, request.key.clone(), CacheState::Pending);
        }
        requests
    }

    /// Write a render result back. Returns whether it was kept.
    ///
    /// Results for pages that are gone, or whose render key has moved on
    /// since the request, are discarded. So are viewer renders from a
    /// superseded generation.
    pub fn apply_render(&mut self, outcome: RenderOutcome) -> bool {
        let RenderOutcome { request, result } = outcome;
        let page_id = request.page_id;

        let current_key = self
            .document
            .page(page_id)
            .map(|page| page.render_key());
        if current_key.as_ref() != Some(&request.key) {
            warn!("Discarding stale render of {page_id}");
            return false;
        }

        match request.purpose {
            RenderPurpose::Thumbnail => {
                let state = match result {
                    Ok(bitmap) => CacheState::Ready(bitmap),
                    Err(e) => {
                        warn!("Render of {page_id} failed: {e}");
                        CacheState::Placeholder
                    }
                };
                self.cache.insert(page_id, request.key, state);
                true
            }
            RenderPurpose::Viewer { generation } => {
                if !self.viewer_render.is_current(generation)
                    || self.viewer.page_id() != Some(page_id)
                {
                    debug!("Discarding superseded viewer render of {page_id}");
                    return false;
                }
                self.viewer_render.finish(generation);
                match result {
                    Ok(bitmap) => self.viewer_frame = Some(bitmap),
                    Err(e) => {
                        warn!("Viewer render of {page_id} failed: {e}");
                        self.viewer_frame = None;
                    }
                }
                true
            }
        }
    }

    // ---- export ---------------------------------------------------------

    /// Flatten the document into an export job
    pub fn export_job(
        &self,
        metadata: ExportMetadata,
        output: impl Into<PathBuf>,
        resize_to_fit: bool,
    ) -> Result<ExportJob, IoError> {
        let entries: Vec<ExportEntry> = self
            .document
            .flattened_pages()
            .map(|page| ExportEntry::new(page.path.clone(), page.source_index, page.rotation, page.kind))
            .collect();
        if entries.is_empty() {
            return Err(IoError::EmptyDocument);
        }
        Ok(ExportJob {
            output: output.into(),
            resize_to_fit,
            metadata,
            entries,
        })
    }

    pub fn export(
        &self,
        exporter: &dyn Exporter,
        metadata: ExportMetadata,
        output: impl Into<PathBuf>,
        resize_to_fit: bool,
    ) -> Result<ExportOutcome, IoError> {
        let job = self.export_job(metadata, output, resize_to_fit)?;
        let outcome = exporter.export(&job)?;
        if !outcome.failed_files.is_empty() {
            warn!("Export skipped {} unreadable files", outcome.failed_files.len());
        }
        Ok(outcome)
    }
}

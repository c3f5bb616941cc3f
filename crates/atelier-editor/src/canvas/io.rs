use super::{AddOptions, Canvas, PendingImport, PendingLoad};
use crate::events::{EditorEvent, TransactionKind};
use crate::modes::Mode;
use atelier_core::error::EditorResult;
use atelier_core::geometry::Geometry;
use atelier_core::graph::PortGraph;
use atelier_core::id::ObjectId;
use atelier_core::model::{NodeShape, ObjectKind, SceneObject};
use atelier_core::serialize::{export_objects, parse_document};
use atelier_core::workarea::{Reflow, layout_of, place};
use atelier_core::workflow::WorkflowDocument;
use kurbo::{Affine, Size};

impl Canvas {
    // ─── Documents ───────────────────────────────────────────────────────

    /// The document as a JSON array in paint order, workarea first.
    pub fn export_json(&self) -> EditorResult<String> {
        let value = export_objects(
            self.registry.render_list(),
            &self.config.properties_to_include,
        )?;
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Replace the scene with a document.
    ///
    /// Objects keep their position relative to the workarea: when the
    /// workarea lands somewhere else in this viewport, everything follows.
    /// A workarea background defers the object load until the host has
    /// decoded the image; a newer import supersedes a pending one.
    pub fn import_json(&mut self, json: &str) -> EditorResult<()> {
        let mut objects = parse_document(json)?;
        self.generation += 1;
        self.pending_import = None;
        self.reset_scene();

        if !objects.first().is_some_and(|o| o.is_workarea()) {
            let current = self.workarea_geometry().unwrap_or_default();
            self.finish_import(objects, current);
            return Ok(());
        }
        let stored = objects.remove(0);
        let stored_geometry = stored.geometry.clone();
        match self.adopt_workarea(stored) {
            Some(src) => {
                let generation = self.generation;
                let ticket = self.issue_ticket(PendingLoad::Workarea { generation });
                self.pending_import = Some(PendingImport {
                    generation,
                    objects,
                    stored: stored_geometry,
                });
                log::debug!("import waiting on workarea background {ticket:?}");
                self.surface.decode_image(ticket, &src);
            }
            None => {
                self.workarea_natural = Size::new(stored_geometry.width, stored_geometry.height);
                self.place_workarea();
                self.finish_import(objects, stored_geometry);
            }
        }
        Ok(())
    }

    /// Remove every object without history or events for the objects.
    pub fn clear(&mut self) {
        self.reset_scene();
        self.record("clear");
        self.render();
    }

    pub(crate) fn reset_scene(&mut self) {
        self.cancel_drag();
        if !matches!(self.mode, Mode::Selection) {
            self.enter_mode(Mode::Selection, None);
        }
        self.clear_selection();
        self.hovered = None;
        self.hovered_port = None;
        for obj in self.registry.clear_objects() {
            if obj.is_dom_mirrored() {
                self.surface.remove_element(obj.id);
            }
        }
        self.ports = PortGraph::new();
        self.animator.clear();
        self.loads
            .retain(|_, load| matches!(load, PendingLoad::Workarea { .. }));
    }

    /// Take the stored workarea's settings. Returns its background source.
    fn adopt_workarea(&mut self, stored: SceneObject) -> Option<String> {
        let workarea = self.registry.workarea_mut()?;
        if let (ObjectKind::Workarea(props), ObjectKind::Workarea(incoming)) =
            (&mut workarea.kind, stored.kind)
        {
            *props = incoming;
        }
        workarea.name = stored.name;
        workarea.appearance = stored.appearance;
        workarea.geometry = stored.geometry;
        match &workarea.kind {
            ObjectKind::Workarea(props) => props.src.clone(),
            _ => None,
        }
    }

    pub(crate) fn place_workarea(&mut self) {
        let (natural, viewport) = (self.workarea_natural, self.viewport_size);
        if let Some(workarea) = self.registry.workarea_mut() {
            place(workarea, natural, viewport);
        }
    }

    /// The host decoded (or failed to decode) a workarea background.
    pub(crate) fn complete_workarea_load(
        &mut self,
        generation: u64,
        result: Result<Size, String>,
    ) -> bool {
        if generation != self.generation {
            log::debug!("workarea background for superseded import {generation} ignored");
            return false;
        }
        match result {
            Ok(size) => self.workarea_natural = size,
            Err(msg) => log::error!("failed to decode workarea background: {msg}"),
        }
        let before = self.workarea_geometry();
        self.place_workarea();
        match self.pending_import.take() {
            Some(import) if import.generation == generation => {
                self.finish_import(import.objects, import.stored);
            }
            _ => {
                if let Some(before) = before {
                    self.reflow_from(&before);
                }
                self.record("workarea");
            }
        }
        self.render();
        true
    }

    fn finish_import(&mut self, objects: Vec<SceneObject>, stored: Geometry) {
        let reflow = self
            .registry
            .workarea()
            .map(|w| Reflow::between(layout_of(w), &stored, &w.geometry));
        let count = self.load_objects(objects, reflow);
        log::info!("imported {count} object(s)");
        self.events.push(EditorEvent::Imported { count });
        self.record("import");
        self.render();
    }

    /// Add document objects: everything else first so links find their
    /// ports, then links at their stored paint position.
    fn load_objects(&mut self, objects: Vec<SceneObject>, reflow: Option<Reflow>) -> usize {
        self.loading = true;
        self.events.set_loading(true);
        let (links, others): (Vec<_>, Vec<_>) = objects
            .into_iter()
            .enumerate()
            .partition(|(_, obj)| obj.as_link().is_some());
        let loaded = AddOptions {
            loaded: true,
            ..AddOptions::default()
        };
        let mut count = 0;
        for (_, mut obj) in others {
            if let Some(reflow) = reflow {
                reflow.apply(&mut obj.geometry);
            }
            if self.add_object(obj, loaded).is_some() {
                count += 1;
            }
        }
        for (position, obj) in links {
            // Slot zero belongs to the workarea.
            let options = AddOptions {
                index: Some(position + 1),
                ..loaded
            };
            if self.add_object(obj, options).is_some() {
                count += 1;
            }
        }
        self.loading = false;
        self.events.set_loading(false);
        count
    }

    fn workarea_geometry(&self) -> Option<Geometry> {
        self.registry.workarea().map(|w| w.geometry.clone())
    }

    // ─── Workarea resize ─────────────────────────────────────────────────

    /// The host canvas changed size. The workarea is placed again and
    /// every object follows it.
    pub fn resize(&mut self, width: f64, height: f64) {
        let size = Size::new(width, height);
        if size == self.viewport_size {
            return;
        }
        self.viewport_size = size;
        let Some(before) = self.workarea_geometry() else {
            return;
        };
        self.place_workarea();
        self.reflow_from(&before);
        self.render();
    }

    /// Move every object along with the workarea's change from `before`.
    fn reflow_from(&mut self, before: &Geometry) {
        let Some(workarea) = self.registry.workarea() else {
            return;
        };
        let reflow = Reflow::between(layout_of(workarea), before, &workarea.geometry);
        if reflow.is_identity() {
            return;
        }
        let ids: Vec<ObjectId> = self
            .registry
            .render_list()
            .iter()
            .filter(|o| !o.is_workarea() && o.as_link().is_none())
            .map(|o| o.id)
            .collect();
        for id in &ids {
            if let Some(obj) = self.registry.get_mut(*id) {
                reflow.apply(&mut obj.geometry);
            }
        }
        for id in ids {
            self.set_coords(id);
        }
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let Some((snapshot, description)) = self.history.undo() else {
            return false;
        };
        self.replay(&snapshot);
        self.events.push(EditorEvent::Transaction {
            kind: TransactionKind::Undo,
            description,
        });
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some((snapshot, description)) = self.history.redo() else {
            return false;
        };
        self.replay(&snapshot);
        self.events.push(EditorEvent::Transaction {
            kind: TransactionKind::Redo,
            description,
        });
        true
    }

    /// Rebuild the scene from a history snapshot, as stored.
    fn replay(&mut self, snapshot: &str) {
        let mut objects = match parse_document(snapshot) {
            Ok(objects) => objects,
            Err(e) => {
                log::error!("corrupt history snapshot: {e}");
                return;
            }
        };
        self.reset_scene();
        if objects.first().is_some_and(|o| o.is_workarea()) {
            let stored = objects.remove(0);
            if let Some(workarea) = self.registry.workarea_mut() {
                workarea.kind = stored.kind;
                workarea.appearance = stored.appearance;
                workarea.geometry = stored.geometry;
            }
        }
        self.load_objects(objects, None);
        self.render();
    }

    // ─── Workflows ───────────────────────────────────────────────────────

    /// Export nodes (in dependency order) and links as a workflow
    /// document. Fails on the first node with a configuration error.
    pub fn export_workflow(&self) -> EditorResult<String> {
        let nodes: Vec<ObjectId> = self
            .registry
            .render_list()
            .iter()
            .filter(|o| o.as_node().is_some())
            .map(|o| o.id)
            .collect();
        let order = self.ports.topological_order(&nodes);
        let document =
            WorkflowDocument::from_objects(self.registry.render_list(), &order, self.viewport.coeffs())
                .inspect_err(|e| log::warn!("workflow export blocked: {e}"))?;
        document.to_json()
    }

    /// Replace the scene with a workflow. `catalog` supplies the port
    /// layout of each node class the host knows. Returns the number of
    /// objects loaded.
    pub fn import_workflow(
        &mut self,
        json: &str,
        catalog: impl Fn(&str) -> Option<NodeShape>,
    ) -> EditorResult<usize> {
        let document = WorkflowDocument::from_json(json)?;
        let transform = Affine::new(document.viewport_transform);
        let (nodes, links) = document.into_objects(catalog);
        self.generation += 1;
        self.pending_import = None;
        self.reset_scene();
        self.viewport.set_transform(transform);

        // Links first in paint order, nodes above them.
        let mut objects = links;
        objects.extend(nodes);
        let count = self.load_objects(objects, None);
        self.mirror_all();
        let ratio = self.zoom();
        self.events.push(EditorEvent::Zoomed { ratio });
        self.events.push(EditorEvent::Imported { count });
        self.record("import workflow");
        self.render();
        Ok(count)
    }
}

//! The viewer context: one current artifact, its load lifecycle, picking and
//! view reset.
//!
//! At most one artifact is live. Selecting another disposes the current one
//! before a load is issued, and each load carries a generation number so a
//! slow load that finishes after a newer selection is ignored.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use glam::Vec3;
use hecs::Entity;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::camera::Camera;
use crate::catalog::{ArtifactDescriptor, Catalog, HotspotDescriptor};
use crate::config::ViewerConfig;
use crate::controls::OrbitControls;
use crate::geometry::RawGeometry;
use crate::hotspot::{HotspotAnchor, HotspotMarker};
use crate::loader::{AssetLoader, LoadError, LoadEvent, LoadEventKind, LoadRequest, LoadSender};
use crate::normalize::{AppliedTransform, Normalizer};
use crate::picking::{self, PointerEvent, Viewport};
use crate::scene::{GroupHandle, Renderer, SceneGraph};
use crate::ui::{LoadingStatus, ViewerUi};

const DEFAULT_INFO_TITLE: &str = "Details";
const DEFAULT_INFO_CONTENT: &str = "No information available.";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ViewerError {
    #[error("unknown artifact '{0}'")]
    UnknownArtifact(String),
}

/// Camera placement restored by [`Viewer::reset_view`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraResetState {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraResetState {
    /// Frames a model of the given displayed size from slightly above,
    /// looking at the world origin.
    pub fn for_effective_size(effective_size: f32) -> Self {
        Self {
            position: Vec3::new(0.0, effective_size * 0.5, effective_size * 2.5),
            target: Vec3::ZERO,
        }
    }
}

/// Everything owned by the artifact currently on display.
#[derive(Debug)]
pub struct ActiveArtifact {
    pub descriptor: Arc<ArtifactDescriptor>,
    /// Owns the asset node and every marker.
    pub group: GroupHandle,
    pub asset: Entity,
    /// One per hotspot, in hotspot order.
    pub markers: Vec<Entity>,
    pub applied: AppliedTransform,
    pub effective_size: f32,
    pub camera_reset: CameraResetState,
}

#[derive(Debug, Default)]
pub enum ArtifactState {
    #[default]
    Empty,
    Loaded(ActiveArtifact),
}

impl ArtifactState {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ArtifactState::Loaded(_))
    }
}

/// The one load whose events are still accepted.
#[derive(Debug)]
struct PendingLoad {
    generation: u64,
    descriptor: Arc<ArtifactDescriptor>,
    progress: f32,
}

/// Interactive artifact viewer.
///
/// Drive it by calling [`tick`](Self::tick) once per frame and forwarding
/// user input to [`select_artifact`](Self::select_artifact),
/// [`pointer_down`](Self::pointer_down) and [`reset_view`](Self::reset_view).
pub struct Viewer<L: AssetLoader, U: ViewerUi> {
    catalog: Catalog,
    loader: L,
    ui: U,
    scene: SceneGraph,
    camera: Camera,
    controls: OrbitControls,
    viewport: Viewport,
    normalizer: Normalizer,
    anchor: HotspotAnchor,
    state: ArtifactState,
    selected: Option<String>,
    pending: Option<PendingLoad>,
    generation: u64,
    events_tx: Sender<LoadEvent>,
    events_rx: Receiver<LoadEvent>,
}

impl<L: AssetLoader, U: ViewerUi> Viewer<L, U> {
    pub fn new(config: &ViewerConfig, catalog: Catalog, loader: L, mut ui: U) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        let mut camera = config.build_camera();
        let mut controls = config.build_controls();
        controls.update(&mut camera);

        ui.show_cards(&catalog.cards());

        Self {
            catalog,
            loader,
            ui,
            scene: SceneGraph::new(),
            camera,
            controls,
            viewport: config.viewport(),
            normalizer: config.normalizer(),
            anchor: HotspotAnchor::new(config.marker_style()),
            state: ArtifactState::Empty,
            selected: None,
            pending: None,
            generation: 0,
            events_tx,
            events_rx,
        }
    }

    /// Select the first catalog entry.
    ///
    /// Returns `false` when the catalog is empty.
    pub fn start(&mut self) -> Result<bool, ViewerError> {
        let Some(first) = self.catalog.first().map(|d| d.id.clone()) else {
            warn!("no artifacts defined");
            self.ui.set_loading(LoadingStatus::NoArtifacts);
            return Ok(false);
        };
        self.select_artifact(&first)
    }

    /// Dispose the current artifact and start loading `id`.
    ///
    /// Returns `false` without doing anything when `id` is already selected,
    /// loading or loaded.
    pub fn select_artifact(&mut self, id: &str) -> Result<bool, ViewerError> {
        let descriptor = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| ViewerError::UnknownArtifact(id.to_string()))?;

        if self.selected.as_deref() == Some(id) {
            debug!(artifact = %id, "artifact already selected");
            return Ok(false);
        }

        info!(artifact = %descriptor.id, name = %descriptor.name, "selecting artifact");
        self.ui.hide_info();
        self.clear_active();

        self.generation += 1;
        let generation = self.generation;
        self.selected = Some(descriptor.id.clone());
        self.ui.set_active_card(Some(&descriptor.id));
        self.ui.set_loading(LoadingStatus::Loading);
        self.pending = Some(PendingLoad {
            generation,
            descriptor: descriptor.clone(),
            progress: 0.0,
        });

        let request = LoadRequest {
            generation,
            path: descriptor.asset_path.clone().into(),
        };
        self.loader
            .load(request, LoadSender::new(generation, self.events_tx.clone()));
        Ok(true)
    }

    /// Process every load event posted since the last call.
    ///
    /// Returns the number of events that belonged to the current load.
    pub fn poll_loads(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.handle_event(event) {
                handled += 1;
            }
        }
        handled
    }

    fn handle_event(&mut self, event: LoadEvent) -> bool {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|p| p.generation == event.generation);
        if !current {
            debug!(
                generation = event.generation,
                current = self.generation,
                "discarding superseded load event"
            );
            return false;
        }

        match event.kind {
            LoadEventKind::Progress { loaded, total } => {
                if let Some(pending) = self.pending.as_mut() {
                    let fraction = if total > 0 {
                        (loaded as f64 / total as f64).clamp(0.0, 1.0) as f32
                    } else {
                        0.0
                    };
                    pending.progress = pending.progress.max(fraction);
                    self.ui.set_loading(LoadingStatus::Progress(pending.progress));
                }
            }
            LoadEventKind::Loaded(geometry) => {
                if let Some(pending) = self.pending.take() {
                    match self.install(&pending.descriptor, geometry) {
                        Ok(active) => {
                            self.state = ArtifactState::Loaded(active);
                            self.ui.set_loading(LoadingStatus::Hidden);
                        }
                        Err(e) => self.fail(&pending.descriptor, e),
                    }
                }
            }
            LoadEventKind::Failed(e) => {
                if let Some(pending) = self.pending.take() {
                    self.fail(&pending.descriptor, e);
                }
            }
        }
        true
    }

    fn install(
        &mut self,
        descriptor: &Arc<ArtifactDescriptor>,
        geometry: RawGeometry,
    ) -> Result<ActiveArtifact, LoadError> {
        let (normalization, model) = self
            .normalizer
            .spawn(&mut self.scene, geometry, descriptor)
            .map_err(|e| LoadError::Install(e.to_string()))?;

        let markers = match self.anchor.anchor(&mut self.scene, &model.group, &descriptor.hotspots) {
            Ok(markers) => markers,
            Err(e) => {
                self.scene.dispose(model.group);
                return Err(LoadError::Install(e.to_string()));
            }
        };

        self.scene.attach(&model.group);

        let camera_reset = CameraResetState::for_effective_size(normalization.effective_size);
        self.apply_camera_reset(camera_reset);

        info!(
            artifact = %descriptor.id,
            markers = markers.len(),
            effective_size = normalization.effective_size,
            "artifact loaded"
        );

        Ok(ActiveArtifact {
            descriptor: descriptor.clone(),
            group: model.group,
            asset: model.asset,
            markers,
            applied: normalization.applied,
            effective_size: normalization.effective_size,
            camera_reset,
        })
    }

    fn fail(&mut self, descriptor: &ArtifactDescriptor, cause: LoadError) {
        error!(artifact = %descriptor.id, path = %descriptor.asset_path, error = %cause, "failed to load model");
        self.ui.alert(&format!(
            "Error loading {}. Please check the file path ('{}') and ensure the file is valid.",
            descriptor.name, descriptor.asset_path
        ));
        self.ui.set_loading(LoadingStatus::Failed);
        self.clear_active();
        self.selected = None;
        self.ui.set_active_card(None);
    }

    /// Dispose the current artifact, if any.
    fn clear_active(&mut self) {
        if let ArtifactState::Loaded(active) = std::mem::take(&mut self.state) {
            let artifact = active.descriptor.id.clone();
            let removed = self.scene.dispose(active.group);
            info!(artifact = %artifact, nodes = removed, "disposed artifact");
        }
    }

    fn apply_camera_reset(&mut self, reset: CameraResetState) {
        self.camera.position = reset.position;
        self.controls.target = reset.target;
        self.controls.stop();
        self.controls.update(&mut self.camera);
    }

    fn hit_index(&self, event: PointerEvent) -> Option<usize> {
        let active = self.active()?;
        let hit = picking::hit_test(event, &self.viewport, &self.camera, &self.scene, &active.markers)?;
        let index = self.scene.world().get::<&HotspotMarker>(hit.entity).ok()?.index;
        Some(index)
    }

    /// The hotspot under a pointer position, if any.
    pub fn hit_test(&self, event: PointerEvent) -> Option<&HotspotDescriptor> {
        let index = self.hit_index(event)?;
        self.active()?.descriptor.hotspots.get(index)
    }

    /// Hit-test a pointer press and open the info panel for the hotspot hit.
    pub fn pointer_down(&mut self, event: PointerEvent) -> Option<&HotspotDescriptor> {
        let index = self.hit_index(event)?;
        let ArtifactState::Loaded(active) = &self.state else {
            return None;
        };
        let hotspot = active.descriptor.hotspots.get(index)?;

        let title = if hotspot.title.is_empty() {
            DEFAULT_INFO_TITLE
        } else {
            &hotspot.title
        };
        let content = if hotspot.content.is_empty() {
            DEFAULT_INFO_CONTENT
        } else {
            &hotspot.content
        };
        self.ui.show_info(title, content);
        Some(hotspot)
    }

    pub fn close_info(&mut self) {
        self.ui.hide_info();
    }

    /// Restore the camera and orbit target captured when the current
    /// artifact was loaded.
    ///
    /// Returns `false` when nothing is loaded.
    pub fn reset_view(&mut self) -> bool {
        let ArtifactState::Loaded(active) = &self.state else {
            warn!("cannot reset view, no artifact loaded");
            return false;
        };
        let reset = active.camera_reset;
        self.apply_camera_reset(reset);
        debug!(position = ?reset.position, "view reset");
        true
    }

    /// Adopt a new canvas size. Empty or non-finite sizes (a minimized
    /// window) keep the previous viewport.
    pub fn resize(&mut self, width: f32, height: f32) {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            warn!(width, height, "ignoring resize to an empty viewport");
            return;
        }
        self.viewport = Viewport::new(width, height);
        self.camera.aspect = self.viewport.aspect();
    }

    /// One frame: drain load events, advance the controls, draw.
    pub fn tick<R: Renderer>(&mut self, renderer: &mut R) {
        self.poll_loads();
        self.controls.update(&mut self.camera);
        renderer.render(&self.scene, &self.camera);
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Progress of the current load, if one is running.
    pub fn load_progress(&self) -> Option<f32> {
        self.pending.as_ref().map(|p| p.progress)
    }

    pub fn state(&self) -> &ArtifactState {
        &self.state
    }

    pub fn active(&self) -> Option<&ActiveArtifact> {
        match &self.state {
            ArtifactState::Loaded(active) => Some(active),
            ArtifactState::Empty => None,
        }
    }

    /// Id of the artifact being loaded or displayed.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::scene::DrawList;
    use crate::ui::ConsoleUi;
    use approx::assert_relative_eq;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            ArtifactDescriptor::new("vase", "Vase", "vase.stl")
                .hotspot(Vec3::new(0.0, 0.5, 0.0), "Rim", "Glazed rim"),
            ArtifactDescriptor::new("bygning", "Bygning", "bygning.stl")
                .manual_scale(8.0)
                .center_offset(Vec3::new(0.0, -7.0, 3.0)),
            ArtifactDescriptor::new("lost", "Lost", "missing.stl"),
        ])
        .unwrap()
    }

    fn viewer() -> Viewer<MemoryLoader, ConsoleUi> {
        let loader = MemoryLoader::new()
            .with("vase.stl", RawGeometry::cuboid(Vec3::new(1.0, 2.0, 1.0), Vec3::ZERO))
            .with("bygning.stl", RawGeometry::cuboid(Vec3::splat(4.0), Vec3::splat(10.0)));
        Viewer::new(&ViewerConfig::default(), catalog(), loader, ConsoleUi::new())
    }

    #[test]
    fn new_viewer_lists_cards_and_is_empty() {
        let viewer = viewer();
        assert_eq!(viewer.ui().cards.len(), 3);
        assert!(!viewer.state().is_loaded());
        assert_eq!(viewer.generation(), 0);
    }

    #[test]
    fn start_selects_first_artifact() {
        let mut viewer = viewer();
        assert_eq!(viewer.start(), Ok(true));
        assert_eq!(viewer.selected(), Some("vase"));
        assert_eq!(viewer.ui().loading_text().as_deref(), Some("Loading Model..."));

        viewer.poll_loads();
        let active = viewer.active().unwrap();
        assert_eq!(active.descriptor.id, "vase");
        assert_eq!(active.markers.len(), 1);
        assert_eq!(viewer.ui().loading_text(), None);
        assert_eq!(viewer.ui().active_card.as_deref(), Some("vase"));
    }

    #[test]
    fn unknown_artifact_is_rejected() {
        let mut viewer = viewer();
        assert_eq!(
            viewer.select_artifact("nope"),
            Err(ViewerError::UnknownArtifact("nope".into()))
        );
        assert_eq!(viewer.generation(), 0);
    }

    #[test]
    fn load_sets_camera_from_effective_size() {
        let mut viewer = viewer();
        viewer.select_artifact("bygning").unwrap();
        viewer.poll_loads();

        let active = viewer.active().unwrap();
        assert_eq!(active.applied.auto_scale, 0.5);
        assert_eq!(active.effective_size, 16.0);
        assert_eq!(viewer.camera().position, Vec3::new(0.0, 8.0, 40.0));
        assert_eq!(viewer.controls().target, Vec3::ZERO);
    }

    #[test]
    fn switching_disposes_previous_artifact() {
        let mut viewer = viewer();
        viewer.select_artifact("vase").unwrap();
        viewer.poll_loads();
        let old_group = viewer.active().unwrap().group.entity();

        viewer.select_artifact("bygning").unwrap();
        assert!(!viewer.scene().contains(old_group));
        assert!(!viewer.state().is_loaded());

        viewer.poll_loads();
        assert_eq!(viewer.scene().attached_roots().len(), 1);
        // group + asset, no hotspots
        assert_eq!(viewer.scene().node_count(), 2);
    }

    #[test]
    fn failed_load_clears_selection() {
        let mut viewer = viewer();
        viewer.select_artifact("vase").unwrap();
        viewer.poll_loads();

        viewer.select_artifact("lost").unwrap();
        viewer.poll_loads();

        assert!(!viewer.state().is_loaded());
        assert_eq!(viewer.selected(), None);
        assert_eq!(viewer.ui().active_card, None);
        assert_eq!(viewer.ui().loading_text().as_deref(), Some("Error loading model!"));
        assert!(viewer.ui().alerts[0].contains("missing.stl"));
        assert_eq!(viewer.scene().node_count(), 0);

        // A failed artifact can be retried.
        assert_eq!(viewer.select_artifact("lost"), Ok(true));
    }

    #[test]
    fn reset_without_artifact_is_a_no_op() {
        let mut viewer = viewer();
        let before = *viewer.camera();
        assert!(!viewer.reset_view());
        assert_eq!(*viewer.camera(), before);
    }

    #[test]
    fn selecting_hides_info_panel() {
        let mut viewer = viewer();
        viewer.ui_mut().show_info("Rim", "Glazed rim");
        viewer.select_artifact("bygning").unwrap();
        assert!(viewer.ui().info.is_none());
    }

    #[test]
    fn resize_updates_aspect() {
        let mut viewer = viewer();
        viewer.resize(1000.0, 500.0);
        assert_relative_eq!(viewer.camera().aspect, 2.0);
        assert_eq!(viewer.viewport().width, 1000.0);
    }

    #[test]
    fn empty_resize_keeps_viewport_and_clicks_still_hit() {
        let mut viewer = viewer();
        viewer.select_artifact("vase").unwrap();
        viewer.poll_loads();
        viewer.resize(1000.0, 500.0);

        viewer.resize(0.0, 0.0);
        viewer.resize(f32::NAN, 400.0);
        assert_eq!(*viewer.viewport(), Viewport::new(1000.0, 500.0));
        assert_relative_eq!(viewer.camera().aspect, 2.0);

        let marker = viewer.active().unwrap().markers[0];
        let world = viewer.scene().world_position(marker).unwrap();
        let screen = viewer.camera().world_to_screen(world, viewer.viewport()).unwrap();
        assert!(screen.is_finite());

        let hit = viewer.pointer_down(PointerEvent::new(screen.x, screen.y));
        assert_eq!(hit.map(|h| h.title.as_str()), Some("Rim"));
    }

    #[test]
    fn tick_renders_empty_scene() {
        let mut viewer = viewer();
        let mut renderer = DrawList::new();
        viewer.tick(&mut renderer);
        assert!(renderer.commands.is_empty());
        assert_eq!(renderer.frames, 1);
    }
}

//! Yard Scene
//!
//! Per-frame driver. One `tick` advances, in order:
//! 1. refresh results and pending collision index
//! 2. the active camera mode
//! 3. the first-person build preview (there is no pointer while walking)
//! 4. the selection marker pulse and pending-status pulses
//!
//! `render` then issues one draw through the installed [`SceneRenderer`].
//! All scene state is mutated on the calling thread; only the record fetch
//! and layer build run on the [`RefreshWorker`].

use std::io;

use serde::{Deserialize, Serialize};

use super::context::SceneContext;
use super::deferred::{Deferred, Poll};
use super::refresh::{RefreshEvent, RefreshWorker};
use super::source::RecordSource;
use crate::build::{BuildBridge, BuildCallback, BuildEvent};
use crate::camera::{CameraModeController, Viewport};
use crate::config::ViewerConfig;
use crate::input::{Aim, Command, InputAction, InputRouter, KeyEvent, PointerEvent, RegionProbe, RouteContext};
use crate::physics::{DEFAULT_CELL_SIZE, FlatGround, GroundProbe, SpatialIndex};
use crate::render::{FrameView, InstanceRef, LayerBuilder, RenderError, SceneRenderer, YardLayer};
use crate::selection::{SelectionCallback, SelectionEngine};
use crate::world::{ContainerRecord, RecordRef};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Cell edge of the per-layer collision index (meters)
    pub index_cell_size: f32,
    /// Ticks to wait for a layer's collision index before building it inline
    pub index_poll_limit: u32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            index_cell_size: DEFAULT_CELL_SIZE,
            index_poll_limit: 30,
        }
    }
}

struct PendingIndex {
    generation: u64,
    index: Deferred<SpatialIndex<InstanceRef>>,
    polls: u32,
}

pub struct YardScene {
    ctx: SceneContext,
    config: SceneConfig,
    router: InputRouter,
    worker: Option<RefreshWorker>,
    pending_index: Option<PendingIndex>,
    /// Last generation handed out to a refresh request
    requested: u64,
    time: f32,
    last_dt: f32,
    torn_down: bool,
}

impl YardScene {
    pub fn new(config: &ViewerConfig, viewport: Viewport) -> Self {
        let camera = CameraModeController::new(config.camera.clone(), config.layout.bounds(), viewport);
        let selection = SelectionEngine::new(config.selection);
        let build = BuildBridge::new(config.build, config.layout.clone());
        Self {
            ctx: SceneContext::new(config.layout.clone(), camera, selection, build),
            config: config.scene,
            router: InputRouter::new(config.input.clone()),
            worker: None,
            pending_index: None,
            requested: 0,
            time: 0.0,
            last_dt: 0.0,
            torn_down: false,
        }
    }

    /// Start the background refresh worker over `source`.
    pub fn attach_source(&mut self, source: Box<dyn RecordSource>) -> io::Result<()> {
        let builder = LayerBuilder::new(self.ctx.layout.clone());
        self.worker = Some(RefreshWorker::spawn(source, builder, self.config.index_cell_size)?);
        Ok(())
    }

    pub fn set_regions(&mut self, regions: Box<dyn RegionProbe>) {
        self.router.set_regions(regions);
    }

    pub fn set_selection_callback(&mut self, callback: SelectionCallback) {
        self.ctx.selection.set_callback(callback);
    }

    pub fn set_build_callback(&mut self, callback: BuildCallback) {
        self.ctx.build.set_callback(callback);
    }

    /// The render surface exists; camera mode changes are accepted from now on.
    pub fn mark_surface_ready(&mut self) {
        self.ctx.camera.mark_surface_ready();
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn context(&self) -> &SceneContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SceneContext {
        &mut self.ctx
    }

    pub fn layer(&self) -> &YardLayer {
        &self.ctx.layer
    }

    pub fn camera(&self) -> &CameraModeController {
        &self.ctx.camera
    }

    pub fn selection(&self) -> &SelectionEngine {
        &self.ctx.selection
    }

    pub fn build(&self) -> &BuildBridge {
        &self.ctx.build
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    pub fn generation(&self) -> u64 {
        self.ctx.layer.generation()
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn has_pending_index(&self) -> bool {
        self.pending_index.is_some()
    }

    fn route_context(&self) -> RouteContext {
        RouteContext {
            build_active: self.ctx.build.is_active(),
            first_person: self.ctx.camera.is_first_person(),
        }
    }

    // ========================================================================
    // REFRESH
    // ========================================================================

    fn next_generation(&mut self) -> u64 {
        self.requested = self.requested.max(self.ctx.layer.generation()) + 1;
        self.requested
    }

    /// Ask the worker for a full rebuild. Call after any data mutation.
    /// Returns the generation the new layer will carry.
    pub fn request_refresh(&mut self) -> Option<u64> {
        if self.torn_down || self.worker.is_none() {
            log::debug!("Refresh requested without a record source");
            return None;
        }
        let generation = self.next_generation();
        let sent = self.worker.as_ref().is_some_and(|w| w.request(generation));
        if !sent {
            log::warn!("Refresh worker is gone; dropping refresh {}", generation);
            return None;
        }
        Some(generation)
    }

    /// Apply the newest finished refresh, if any. Returns true on a swap.
    pub fn poll_refresh(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        let Some(worker) = self.worker.as_ref() else {
            return false;
        };

        let mut newest: Option<(u64, YardLayer, Deferred<SpatialIndex<InstanceRef>>)> = None;
        while let Some(event) = worker.try_recv() {
            match event {
                RefreshEvent::Layer {
                    generation,
                    layer,
                    index,
                } => {
                    if newest.as_ref().is_none_or(|(g, _, _)| generation > *g) {
                        newest = Some((generation, layer, index));
                    }
                }
                RefreshEvent::Failed { generation, error } => {
                    log::warn!("Refresh {} failed, keeping layer {}: {}", generation, self.generation(), error);
                }
            }
        }

        let Some((generation, layer, index)) = newest else {
            return false;
        };
        if generation <= self.generation() {
            log::debug!("Discarding stale layer {}", generation);
            return false;
        }
        self.apply_layer(layer, index);
        true
    }

    /// Build and swap a layer on the calling thread.
    pub fn refresh_now(&mut self, records: Vec<ContainerRecord>) -> u64 {
        let generation = self.next_generation();
        let records: Vec<RecordRef> = records.into_iter().map(RecordRef::new).collect();
        let layer = LayerBuilder::new(self.ctx.layout.clone()).build(&records, generation);
        let index = Deferred::ready(layer.build_collision_index(self.config.index_cell_size));
        self.apply_layer(layer, index);
        generation
    }

    fn apply_layer(&mut self, layer: YardLayer, index: Deferred<SpatialIndex<InstanceRef>>) {
        let generation = layer.generation();
        self.ctx.swap_layer(layer);
        self.pending_index = Some(PendingIndex {
            generation,
            index,
            polls: 0,
        });
        self.poll_index();
    }

    /// Attach the collision index once it arrives. After a bounded number of
    /// polls, or if its producer went away, build it here instead.
    fn poll_index(&mut self) {
        let Some(pending) = self.pending_index.as_mut() else {
            return;
        };
        let index = match pending.index.poll() {
            Poll::Ready(index) => index,
            Poll::Pending => {
                pending.polls += 1;
                if pending.polls < self.config.index_poll_limit {
                    return;
                }
                log::warn!(
                    "Collision index for layer {} not ready after {} ticks; building inline",
                    pending.generation,
                    pending.polls
                );
                self.ctx.layer.build_collision_index(self.config.index_cell_size)
            }
            Poll::Abandoned => self.ctx.layer.build_collision_index(self.config.index_cell_size),
        };
        let generation = pending.generation;
        self.pending_index = None;
        if !self.ctx.registry.attach_index(generation, index) {
            log::debug!("Collision index for layer {} arrived late", generation);
        }
    }

    // ========================================================================
    // INPUT
    // ========================================================================

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        let commands = self.router.route_pointer(event, self.route_context());
        self.apply_commands(commands);
    }

    pub fn handle_key(&mut self, event: KeyEvent) {
        let commands = self.router.route_key(event, self.route_context());
        self.apply_commands(commands);
    }

    /// Window lost focus.
    pub fn focus_lost(&mut self) {
        let commands = self.router.release_all();
        self.apply_commands(commands);
    }

    fn apply_commands(&mut self, commands: Vec<Command>) {
        for command in commands {
            log::debug!("{:?}", command);
            self.apply(command);
        }
    }

    fn apply(&mut self, command: Command) {
        let ctx = &mut self.ctx;
        match command {
            Command::Select(Aim::Pointer(at)) => {
                ctx.selection
                    .select_at(&ctx.camera, &ctx.registry, &mut ctx.layer, at.x, at.y);
            }
            Command::Select(Aim::Crosshair) => {
                ctx.selection
                    .select_crosshair(&ctx.camera, &ctx.registry, &mut ctx.layer);
            }
            Command::BuildPreview(at) => {
                ctx.build
                    .update_preview_pointer(&ctx.camera, at.x, at.y, &ctx.layer, &ctx.registry);
            }
            Command::BuildCommit(aim) => {
                match aim {
                    Aim::Pointer(at) => ctx.build.update_preview_pointer(
                        &ctx.camera,
                        at.x,
                        at.y,
                        &ctx.layer,
                        &ctx.registry,
                    ),
                    Aim::Crosshair => {
                        ctx.build
                            .update_preview_crosshair(&ctx.camera, &ctx.layer, &ctx.registry)
                    }
                }
                if let Some(BuildEvent::ObjectRemoved { object }) =
                    ctx.build.commit(&ctx.layer, &mut ctx.registry)
                {
                    ctx.selection.object_removed(object.id);
                }
            }
            Command::OrbitDrag { drag, pressed } => {
                ctx.camera.drag(drag, pressed);
            }
            Command::OrbitMove(at) => {
                ctx.camera.pointer_moved(at.x, at.y, self.last_dt);
            }
            Command::Look { dx, dy } => {
                ctx.camera.look(dx, dy);
            }
            Command::Zoom(delta) => {
                ctx.camera.zoom(delta);
            }
            Command::Action(action) => self.apply_action(action),
        }
    }

    fn set_build_active(&mut self, active: bool) {
        self.ctx.build.set_active(active);
        self.ctx.camera.set_build_active(active);
    }

    fn apply_action(&mut self, action: InputAction) {
        let ctx = &mut self.ctx;
        match action {
            // Resolved by the router before it gets here
            InputAction::Interact => {}
            InputAction::ToggleBuild => {
                let active = !ctx.build.is_active();
                self.set_build_active(active);
            }
            InputAction::ToggleFirstPerson => {
                ctx.camera.toggle_first_person();
            }
            InputAction::ToggleAutoOrbit => {
                ctx.camera.toggle_auto_orbit();
            }
            InputAction::RotatePreview => ctx.build.rotate_step(),
            InputAction::CycleObject => {
                let kind = ctx.build.cycle_kind();
                log::info!("Build object: {}", kind);
            }
            InputAction::TogglePlacement => {
                let mode = ctx.build.toggle_mode();
                log::info!("Build mode: {:?}", mode);
            }
            InputAction::Escape => {
                if ctx.build.is_active() {
                    self.set_build_active(false);
                } else {
                    ctx.selection.clear(&mut ctx.layer);
                }
            }
            InputAction::Refresh => {
                self.request_refresh();
            }
        }
    }

    /// Programmatic build toggle for host UI buttons.
    pub fn set_build_mode(&mut self, active: bool) {
        self.set_build_active(active);
    }

    /// Select a record by id and point the orbit camera at it.
    pub fn focus_record(&mut self, id: &str) -> Option<RecordRef> {
        let ctx = &mut self.ctx;
        let record = ctx.selection.select_record(id, &mut ctx.layer)?;
        if let Some(aabb) = ctx
            .layer
            .find_record(id)
            .and_then(|instance| ctx.layer.instance_aabb(instance))
        {
            ctx.camera.focus(aabb.center());
        }
        Some(record)
    }

    // ========================================================================
    // FRAME
    // ========================================================================

    pub fn tick(&mut self, dt: f32) {
        if self.torn_down {
            return;
        }
        self.time += dt;
        self.last_dt = dt;

        self.poll_refresh();
        self.poll_index();

        let ctx = &mut self.ctx;
        let ground: &dyn GroundProbe = match ctx.registry.collision_index() {
            Some(index) => index,
            None => &FlatGround,
        };
        ctx.camera.update(dt, self.router.movement(), ground);

        if ctx.build.is_active() && ctx.camera.is_first_person() {
            ctx.build
                .update_preview_crosshair(&ctx.camera, &ctx.layer, &ctx.registry);
        }

        ctx.selection.update(dt);
        ctx.layer.animate(self.time);
    }

    pub fn render(&mut self, renderer: &mut dyn SceneRenderer) -> Result<(), RenderError> {
        if self.torn_down {
            return Ok(());
        }
        let ctx = &mut self.ctx;
        let direct = ctx.build.direct_instances(
            ctx.selection.highlighted_object(),
            ctx.selection.config().highlight_color,
        );
        renderer.draw(FrameView {
            view_proj: ctx.camera.view_projection(),
            eye: ctx.camera.eye(),
            time: self.time,
            layer: &mut ctx.layer,
            direct: &direct,
            marker: ctx.selection.marker(),
            crosshair: ctx.camera.is_first_person(),
        })
    }

    /// Projection and surface size only.
    pub fn resize(&mut self, width: u32, height: u32, renderer: &mut dyn SceneRenderer) {
        if width == 0 || height == 0 {
            return;
        }
        self.ctx.camera.resize(width, height);
        renderer.resize(width, height);
    }

    /// Stop input, stop the worker (in-flight results are discarded), and
    /// release every render resource. Safe to call more than once.
    pub fn teardown(&mut self, renderer: &mut dyn SceneRenderer) {
        if self.torn_down {
            renderer.release();
            return;
        }
        self.torn_down = true;
        self.router.detach();
        self.pending_index = None;
        // Drop joins the worker thread
        self.worker = None;
        self.ctx.selection.clear_callback();
        self.ctx.build.clear_callback();
        renderer.release();
        self.ctx.camera.mark_surface_lost();
        log::info!("Scene torn down at layer {}", self.generation());
    }
}

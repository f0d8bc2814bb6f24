//! Scene-owned state.
//!
//! The layout and the current layer (which owns the record set through its
//! members) are replaced together on refresh. Camera, selection and build
//! state each live behind their controller.

use crate::build::BuildBridge;
use crate::camera::CameraModeController;
use crate::render::YardLayer;
use crate::selection::{PickRegistry, SelectionEngine};
use crate::world::YardLayoutConfig;

pub struct SceneContext {
    pub layout: YardLayoutConfig,
    pub camera: CameraModeController,
    pub selection: SelectionEngine,
    pub build: BuildBridge,
    pub registry: PickRegistry,
    pub layer: YardLayer,
}

impl SceneContext {
    pub fn new(
        layout: YardLayoutConfig,
        camera: CameraModeController,
        selection: SelectionEngine,
        build: BuildBridge,
    ) -> Self {
        let layer = YardLayer::empty(0);
        let mut registry = PickRegistry::new();
        registry.register_layer(&layer);
        Self {
            layout,
            camera,
            selection,
            build,
            registry,
            layer,
        }
    }

    /// Swap in a freshly built layer and re-register everything that
    /// referenced the old batches. The old layer is dropped here.
    pub fn swap_layer(&mut self, layer: YardLayer) {
        let previous = std::mem::replace(&mut self.layer, layer);
        self.registry.register_layer(&self.layer);
        let dropped = self.build.on_layer_swap(&mut self.registry);
        self.selection.on_layer_swap(&mut self.layer);

        log::info!(
            "Layer {} -> {}: {} containers in {} groups ({} skipped, {} collisions, {} local objects dropped)",
            previous.generation(),
            self.layer.generation(),
            self.layer.instance_count(),
            self.layer.groups().len(),
            self.layer.skipped().len(),
            self.layer.collisions().len(),
            dropped.len(),
        );
    }
}

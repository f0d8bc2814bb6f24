//! Build Bridge
//!
//! Place/remove preview and commit for the build tool.
//!
//! The preview follows whatever ray the scene feeds it: the pointer ray on
//! move events in orbit mode, or the crosshair ray once per frame in first
//! person (there is no pointer while walking). Commits act only on a valid
//! preview and report a [`BuildEvent`] to the host so the data store can
//! persist the change and request a refresh.

use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::objects::{BuildEvent, BuildObjectKind, ObjectId, PlacementMode, ROTATION_STEP, YardObject, object_parts};
use crate::camera::{CameraModeController, Ray};
use crate::physics::Aabb;
use crate::render::{ContainerInstance, FLAG_HIGHLIGHT, FLAG_PREVIEW, InstanceRef, YardLayer};
use crate::selection::{DirectRef, PickRegistry, PickTarget};
use crate::world::{
    ContainerRecord, ContainerStatus, SlotAddress, YardLayoutConfig, map_slot, nearest_slot,
};

/// Carrier label of locally created containers.
pub const LOCAL_CARRIER: &str = "LOCAL";

pub type BuildCallback = Box<dyn FnMut(&BuildEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Ground snap grid for auxiliary objects (meters)
    pub grid_size: f32,
    /// Placement reach along the crosshair in first person
    pub max_reach: f32,
    /// Placement reach along a pointer ray
    pub max_pointer_distance: f32,
    pub valid_color: u32,
    pub invalid_color: u32,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            grid_size: 1.0,
            max_reach: 30.0,
            max_pointer_distance: 2000.0,
            valid_color: 0x40D060A0,
            invalid_color: 0xE04040A0,
        }
    }
}

/// What a commit would act on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreviewTarget {
    /// Place a container here
    Slot(SlotAddress),
    /// Place an auxiliary object on the ground
    Ground,
    /// Remove a directly placed object
    Direct(ObjectId),
    /// Request removal of a batched container
    Batched(InstanceRef),
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preview {
    /// Floor center
    pub position: Vec3,
    pub yaw: f32,
    pub valid: bool,
    pub target: PreviewTarget,
}

pub struct BuildBridge {
    config: BuildConfig,
    layout: YardLayoutConfig,
    active: bool,
    mode: PlacementMode,
    kind: BuildObjectKind,
    rotation: f32,
    preview: Option<Preview>,
    objects: Vec<YardObject>,
    next_id: u32,
    callback: Option<BuildCallback>,
}

impl BuildBridge {
    pub fn new(config: BuildConfig, layout: YardLayoutConfig) -> Self {
        Self {
            config,
            layout,
            active: false,
            mode: PlacementMode::Place,
            kind: BuildObjectKind::CYCLE[0],
            rotation: 0.0,
            preview: None,
            objects: Vec::new(),
            next_id: 1,
            callback: None,
        }
    }

    pub fn set_callback(&mut self, callback: BuildCallback) {
        self.callback = Some(callback);
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns true when the flag changed. Leaving build mode drops the preview.
    pub fn set_active(&mut self, active: bool) -> bool {
        if self.active == active {
            return false;
        }
        self.active = active;
        if !active {
            self.preview = None;
        }
        log::info!("Build mode {}", if active { "on" } else { "off" });
        true
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlacementMode) {
        if self.mode != mode {
            self.mode = mode;
            self.preview = None;
        }
    }

    pub fn toggle_mode(&mut self) -> PlacementMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    pub fn kind(&self) -> BuildObjectKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: BuildObjectKind) {
        self.kind = kind;
        self.preview = None;
    }

    pub fn cycle_kind(&mut self) -> BuildObjectKind {
        self.set_kind(self.kind.next());
        self.kind
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Turn the preview by one step. Containers keep the yaw of their bank.
    pub fn rotate_step(&mut self) {
        self.rotation = (self.rotation + ROTATION_STEP).rem_euclid(TAU);
        if let Some(preview) = self.preview.as_mut()
            && preview.target == PreviewTarget::Ground
        {
            preview.yaw = self.rotation;
        }
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn objects(&self) -> &[YardObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&YardObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Orbit mode: follow the pointer.
    pub fn update_preview_pointer(
        &mut self,
        camera: &CameraModeController,
        x: f32,
        y: f32,
        layer: &YardLayer,
        registry: &PickRegistry,
    ) {
        let ray = camera.pointer_ray(x, y);
        self.update_preview(&ray, self.config.max_pointer_distance, layer, registry);
    }

    /// First person: follow the crosshair. Called every frame.
    pub fn update_preview_crosshair(
        &mut self,
        camera: &CameraModeController,
        layer: &YardLayer,
        registry: &PickRegistry,
    ) {
        let ray = camera.crosshair_ray();
        self.update_preview(&ray, self.config.max_reach, layer, registry);
    }

    pub fn update_preview(&mut self, ray: &Ray, max_distance: f32, layer: &YardLayer, registry: &PickRegistry) {
        if !self.active {
            self.preview = None;
            return;
        }
        self.preview = match self.mode {
            PlacementMode::Place => self.place_preview(ray, max_distance, layer),
            PlacementMode::Remove => self.remove_preview(ray, max_distance, layer, registry),
        };
    }

    fn ground_point(ray: &Ray, max_distance: f32) -> Option<Vec3> {
        ray.intersect_plane_y(0.0)
            .filter(|p| p.distance(ray.origin) <= max_distance)
    }

    fn place_preview(&self, ray: &Ray, max_distance: f32, layer: &YardLayer) -> Option<Preview> {
        let ground = Self::ground_point(ray, max_distance)?;

        if self.kind.snaps_to_slot() {
            let Some((column, _)) = nearest_slot(ground, &self.layout) else {
                return Some(Preview {
                    position: ground,
                    yaw: self.rotation,
                    valid: false,
                    target: PreviewTarget::Nothing,
                });
            };
            return Some(match self.lowest_free_tier(column, layer) {
                Some((slot, position, yaw)) => Preview {
                    position,
                    yaw,
                    valid: true,
                    target: PreviewTarget::Slot(slot),
                },
                None => {
                    let position = map_slot(&column, &self.layout)
                        .map(|t| t.position)
                        .unwrap_or(ground);
                    Preview {
                        position,
                        yaw: column.lane.group().orientation().yaw(),
                        valid: false,
                        target: PreviewTarget::Nothing,
                    }
                }
            });
        }

        let grid = self.config.grid_size.max(0.01);
        let snapped = Vec3::new((ground.x / grid).round() * grid, 0.0, (ground.z / grid).round() * grid);
        let footprint = object_parts(self.kind, snapped, self.rotation, &self.layout)
            .iter()
            .map(|p| Aabb::from_yawed(p.center, p.size, self.rotation))
            .reduce(|a, b| a.union(&b));
        let valid = footprint.is_some_and(|f| !self.blocked(&f, layer));

        Some(Preview {
            position: snapped,
            yaw: self.rotation,
            valid,
            target: PreviewTarget::Ground,
        })
    }

    fn remove_preview(
        &self,
        ray: &Ray,
        max_distance: f32,
        layer: &YardLayer,
        registry: &PickRegistry,
    ) -> Option<Preview> {
        match registry.hit_test(layer, ray, max_distance) {
            Some(hit) => {
                let target = match hit.target {
                    PickTarget::Direct(direct) => PreviewTarget::Direct(direct.object),
                    PickTarget::Instance(instance) => PreviewTarget::Batched(instance),
                };
                let c = hit.aabb.center();
                Some(Preview {
                    position: Vec3::new(c.x, hit.aabb.min.y, c.z),
                    yaw: 0.0,
                    valid: true,
                    target,
                })
            }
            None => Self::ground_point(ray, max_distance).map(|position| Preview {
                position,
                yaw: 0.0,
                valid: false,
                target: PreviewTarget::Nothing,
            }),
        }
    }

    fn slot_taken(&self, slot: SlotAddress, layer: &YardLayer) -> bool {
        layer.occupant(&slot).is_some() || self.objects.iter().any(|o| o.slot == Some(slot))
    }

    /// Lowest tier of `column` nobody stands on, if the stack is not full.
    fn lowest_free_tier(&self, column: SlotAddress, layer: &YardLayer) -> Option<(SlotAddress, Vec3, f32)> {
        let mut slot = column;
        loop {
            let transform = map_slot(&slot, &self.layout).ok()?;
            if !self.slot_taken(slot, layer) {
                return Some((slot, transform.position, transform.yaw));
            }
            slot = slot.above()?;
        }
    }

    fn blocked(&self, footprint: &Aabb, layer: &YardLayer) -> bool {
        let hits_layer = layer.groups().iter().any(|group| {
            (0..group.len() as u32).any(|i| group.aabb(i).is_some_and(|b| b.intersects(footprint)))
        });
        hits_layer
            || self
                .objects
                .iter()
                .flat_map(|o| o.part_boxes(&self.layout))
                .any(|b| b.intersects(footprint))
    }

    fn allocate_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Primary action. No-op without an active, valid preview.
    pub fn commit(&mut self, layer: &YardLayer, registry: &mut PickRegistry) -> Option<BuildEvent> {
        if !self.active {
            return None;
        }
        let preview = self.preview.filter(|p| p.valid)?;

        let event = match preview.target {
            PreviewTarget::Slot(slot) => {
                let BuildObjectKind::Container(size) = self.kind else {
                    return None;
                };
                let id = self.allocate_id();
                let record = ContainerRecord::new(
                    format!("LOCAL-{:04}", id.0),
                    slot.to_string(),
                    size,
                    LOCAL_CARRIER,
                    ContainerStatus::Pending,
                )
                .with_source("build")
                .into_ref();
                let object = YardObject {
                    id,
                    kind: self.kind,
                    position: preview.position,
                    yaw: preview.yaw,
                    record: Some(record.clone()),
                    slot: Some(slot),
                };
                self.add_object(object, registry);
                BuildEvent::ContainerPlaced { record, slot }
            }
            PreviewTarget::Ground => {
                let id = self.allocate_id();
                let object = YardObject {
                    id,
                    kind: self.kind,
                    position: preview.position,
                    yaw: preview.yaw,
                    record: None,
                    slot: None,
                };
                self.add_object(object.clone(), registry);
                BuildEvent::ObjectPlaced { object }
            }
            PreviewTarget::Direct(id) => {
                let pos = self.objects.iter().position(|o| o.id == id)?;
                let object = self.objects.remove(pos);
                registry.remove_direct(id);
                BuildEvent::ObjectRemoved { object }
            }
            PreviewTarget::Batched(instance) => {
                let record = layer.member(instance.batch, instance.index)?.clone();
                BuildEvent::RemovalRequested { record }
            }
            PreviewTarget::Nothing => return None,
        };

        // Whatever was under the preview has changed
        self.preview = None;
        log::info!("Build commit: {:?}", event_summary(&event));
        if let Some(callback) = self.callback.as_mut() {
            callback(&event);
        }
        Some(event)
    }

    fn add_object(&mut self, object: YardObject, registry: &mut PickRegistry) {
        registry.register_direct(
            DirectRef {
                object: object.id,
                record: object.record.clone(),
            },
            &object.part_boxes(&self.layout),
        );
        self.objects.push(object);
    }

    /// A new record set arrived: locally created containers are now either
    /// in it or were rejected, so their local stand-ins go.
    pub fn on_layer_swap(&mut self, registry: &mut PickRegistry) -> Vec<ObjectId> {
        let mut dropped = Vec::new();
        self.objects.retain(|o| {
            if o.record.is_some() {
                dropped.push(o.id);
                false
            } else {
                true
            }
        });
        for id in &dropped {
            registry.remove_direct(*id);
        }
        self.preview = None;
        dropped
    }

    /// Direct objects plus the preview ghost, ready to draw.
    pub fn direct_instances(&self, highlighted: Option<ObjectId>, highlight_color: u32) -> Vec<ContainerInstance> {
        let mut out = Vec::new();
        for object in &self.objects {
            let lit = highlighted == Some(object.id);
            for mut instance in object.instances(&self.layout) {
                if lit {
                    instance.tint_color = highlight_color;
                    instance.set_flag(FLAG_HIGHLIGHT, true);
                }
                out.push(instance);
            }
        }

        if let Some(preview) = self.preview.filter(|_| self.active && self.mode == PlacementMode::Place) {
            let color = if preview.valid {
                self.config.valid_color
            } else {
                self.config.invalid_color
            };
            for part in object_parts(self.kind, preview.position, preview.yaw, &self.layout) {
                out.push(
                    ContainerInstance::new(part.center.to_array(), preview.yaw, part.size.to_array(), color)
                        .with_flags(FLAG_PREVIEW),
                );
            }
        }
        out
    }
}

fn event_summary(event: &BuildEvent) -> String {
    match event {
        BuildEvent::ContainerPlaced { record, slot } => format!("placed {} at {}", record.id, slot),
        BuildEvent::ObjectPlaced { object } => format!("placed {} {}", object.kind, object.id),
        BuildEvent::ObjectRemoved { object } => format!("removed {} {}", object.kind, object.id),
        BuildEvent::RemovalRequested { record } => format!("removal requested for {}", record.id),
    }
}

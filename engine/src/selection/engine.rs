//! Selection Engine
//!
//! Hit-tests a ray against the pick registry and keeps exactly one highlight.
//! A batched container is highlighted by recoloring its single instance; the
//! original color is kept so that exact instance can be restored before any
//! other highlight is applied. Directly placed objects are highlighted by the
//! scene when it builds the direct instance list.
//!
//! A miss always clears the highlight and notifies the callback with `None`.

use serde::{Deserialize, Serialize};

use super::marker::{MarkerConfig, SelectionMarker};
use super::pick::{DirectRef, PickRegistry, PickTarget};
use crate::build::ObjectId;
use crate::camera::{CameraModeController, Ray};
use crate::render::{FLAG_HIGHLIGHT, HIGHLIGHT_COLOR, InstanceRef, MarkerView, YardLayer};
use crate::world::RecordRef;

/// Callback fired whenever the selection changes or a pick misses.
pub type SelectionCallback = Box<dyn FnMut(Option<RecordRef>)>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Crosshair reach in first person (meters)
    pub max_interact_distance: f32,
    /// Pointer pick reach in orbit mode (meters)
    pub max_pick_distance: f32,
    /// Packed RGBA color of a highlighted container
    pub highlight_color: u32,
    pub marker: MarkerConfig,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_interact_distance: 12.0,
            max_pick_distance: 2000.0,
            highlight_color: HIGHLIGHT_COLOR,
            marker: MarkerConfig::default(),
        }
    }
}

/// What is currently highlighted and how to undo it.
#[derive(Debug, Clone, PartialEq)]
pub enum Highlight {
    Instance {
        instance: InstanceRef,
        original_color: u32,
    },
    Direct {
        object: ObjectId,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Selection {
    record: Option<RecordRef>,
    highlight: Highlight,
}

pub struct SelectionEngine {
    config: SelectionConfig,
    current: Option<Selection>,
    marker: SelectionMarker,
    callback: Option<SelectionCallback>,
}

impl SelectionEngine {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            marker: SelectionMarker::new(config.marker),
            config,
            current: None,
            callback: None,
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    pub fn set_callback(&mut self, callback: SelectionCallback) {
        self.callback = Some(callback);
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    pub fn selected(&self) -> Option<&RecordRef> {
        self.current.as_ref().and_then(|s| s.record.as_ref())
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.current.as_ref().map(|s| &s.highlight)
    }

    /// Directly placed object currently highlighted, if any.
    pub fn highlighted_object(&self) -> Option<ObjectId> {
        match self.highlight()? {
            Highlight::Direct { object } => Some(*object),
            Highlight::Instance { .. } => None,
        }
    }

    pub fn marker(&self) -> Option<MarkerView> {
        self.marker.view()
    }

    /// Advance the marker pulse.
    pub fn update(&mut self, dt: f32) {
        self.marker.update(dt);
    }

    fn notify(&mut self, record: Option<RecordRef>) {
        if let Some(callback) = self.callback.as_mut() {
            callback(record);
        }
    }

    /// Orbit mode: pick through the pointer.
    pub fn select_at(
        &mut self,
        camera: &CameraModeController,
        registry: &PickRegistry,
        layer: &mut YardLayer,
        x: f32,
        y: f32,
    ) -> Option<RecordRef> {
        let ray = camera.pointer_ray(x, y);
        self.select_ray(&ray, self.config.max_pick_distance, registry, layer)
    }

    /// First person: pick along the view direction, limited to arm's reach.
    pub fn select_crosshair(
        &mut self,
        camera: &CameraModeController,
        registry: &PickRegistry,
        layer: &mut YardLayer,
    ) -> Option<RecordRef> {
        let ray = camera.crosshair_ray();
        self.select_ray(&ray, self.config.max_interact_distance, registry, layer)
    }

    pub fn select_ray(
        &mut self,
        ray: &Ray,
        max_distance: f32,
        registry: &PickRegistry,
        layer: &mut YardLayer,
    ) -> Option<RecordRef> {
        let Some(hit) = registry.hit_test(layer, ray, max_distance) else {
            self.clear(layer);
            return None;
        };

        match hit.target {
            PickTarget::Instance(instance) => {
                let record = layer.member(instance.batch, instance.index).cloned();
                match record {
                    Some(record) => {
                        self.highlight_instance(instance, record.clone(), layer);
                        Some(record)
                    }
                    None => {
                        self.clear(layer);
                        None
                    }
                }
            }
            PickTarget::Direct(DirectRef { object, record }) => {
                self.restore(layer);
                self.marker.show(&hit.aabb);
                self.current = Some(Selection {
                    record: record.clone(),
                    highlight: Highlight::Direct { object },
                });
                log::debug!("Selected object {}", object);
                self.notify(record.clone());
                record
            }
        }
    }

    /// Select the record with `id` in `layer` without a ray (search box,
    /// external "focus on" requests).
    pub fn select_record(&mut self, id: &str, layer: &mut YardLayer) -> Option<RecordRef> {
        let Some(instance) = layer.find_record(id) else {
            self.clear(layer);
            return None;
        };
        let record = layer.member(instance.batch, instance.index).cloned()?;
        self.highlight_instance(instance, record.clone(), layer);
        Some(record)
    }

    fn highlight_instance(&mut self, instance: InstanceRef, record: RecordRef, layer: &mut YardLayer) {
        if let Some(Highlight::Instance { instance: current, .. }) = self.highlight()
            && *current == instance
        {
            return;
        }

        // Previous highlight is fully restored before the new one is applied
        self.restore(layer);

        let Some(group) = layer.group_mut(instance.batch) else {
            return;
        };
        let Some(original_color) = group.set_color(instance.index, self.config.highlight_color) else {
            return;
        };
        group.set_flag(instance.index, FLAG_HIGHLIGHT, true);
        if let Some(aabb) = group.aabb(instance.index) {
            self.marker.show(&aabb);
        }

        log::debug!("Selected {} ({:?})", record.id, instance);
        self.current = Some(Selection {
            record: Some(record.clone()),
            highlight: Highlight::Instance {
                instance,
                original_color,
            },
        });
        self.notify(Some(record));
    }

    /// Undo the current highlight without notifying. A highlight on a batch
    /// of an older layer has nothing left to restore.
    fn restore(&mut self, layer: &mut YardLayer) {
        let Some(selection) = self.current.take() else {
            return;
        };
        if let Highlight::Instance {
            instance,
            original_color,
        } = selection.highlight
            && let Some(group) = layer.group_mut(instance.batch)
        {
            group.set_color(instance.index, original_color);
            group.set_flag(instance.index, FLAG_HIGHLIGHT, false);
        }
        self.marker.hide();
    }

    /// Drop any highlight and tell the callback nothing is selected.
    pub fn clear(&mut self, layer: &mut YardLayer) {
        self.restore(layer);
        self.notify(None);
    }

    /// A directly placed object went away.
    pub fn object_removed(&mut self, object: ObjectId) {
        if self.highlighted_object() == Some(object) {
            self.current = None;
            self.marker.hide();
            self.notify(None);
        }
    }

    /// Carry the selection over to a freshly built layer. The old layer has
    /// been discarded, so nothing is restored on it.
    pub fn on_layer_swap(&mut self, layer: &mut YardLayer) {
        let Some(selection) = self.current.take() else {
            return;
        };
        self.marker.hide();

        if let Highlight::Direct { object } = selection.highlight
            && selection.record.is_none()
        {
            // Auxiliary objects are not part of the record set
            self.current = Some(Selection {
                record: None,
                highlight: Highlight::Direct { object },
            });
            return;
        }

        let id = selection.record.as_ref().map(|r| r.id.clone());
        match id.and_then(|id| layer.find_record(&id)) {
            Some(instance) => {
                if let Some(record) = layer.member(instance.batch, instance.index).cloned() {
                    self.highlight_instance(instance, record, layer);
                }
            }
            None => {
                log::info!("Selected container left the yard on refresh");
                self.notify(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::LayerBuilder;
    use crate::world::{ContainerRecord, ContainerStatus, SizeClass, YardLayoutConfig, map_raw_slot};
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup() -> (YardLayer, PickRegistry) {
        let records = vec![
            ContainerRecord::new("x", "A1A", SizeClass::Forty, "MSC", ContainerStatus::Normal).into_ref(),
            ContainerRecord::new("y", "A2A", SizeClass::Forty, "MSC", ContainerStatus::Normal).into_ref(),
        ];
        let layer = LayerBuilder::default().build(&records, 1);
        let mut registry = PickRegistry::new();
        registry.register_layer(&layer);
        (layer, registry)
    }

    fn down_at(slot: &str) -> Ray {
        let (_, t) = map_raw_slot(slot, &YardLayoutConfig::default()).unwrap();
        Ray::new(t.position + Vec3::Y * 40.0, Vec3::NEG_Y)
    }

    fn recorder(engine: &mut SelectionEngine) -> Rc<RefCell<Vec<Option<String>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        engine.set_callback(Box::new(move |r| sink.borrow_mut().push(r.map(|r| r.id.clone()))));
        log
    }

    #[test]
    fn test_switching_restores_previous_instance() {
        let (mut layer, registry) = setup();
        let mut engine = SelectionEngine::new(SelectionConfig::default());
        let x = layer.find_record("x").unwrap();
        let base_x = layer.group(x.batch).unwrap().color(x.index).unwrap();

        engine.select_ray(&down_at("A1A"), 100.0, &registry, &mut layer);
        assert_eq!(
            layer.group(x.batch).unwrap().color(x.index),
            Some(HIGHLIGHT_COLOR)
        );

        engine.select_ray(&down_at("A2A"), 100.0, &registry, &mut layer);
        let group = layer.group(x.batch).unwrap();
        assert_eq!(group.color(x.index), Some(base_x));
        assert!(!group.instance(x.index).unwrap().has_flag(FLAG_HIGHLIGHT));
        assert_eq!(engine.selected().unwrap().id, "y");
    }

    #[test]
    fn test_miss_clears_and_notifies_none() {
        let (mut layer, registry) = setup();
        let mut engine = SelectionEngine::new(SelectionConfig::default());
        let log = recorder(&mut engine);

        engine.select_ray(&down_at("A1A"), 100.0, &registry, &mut layer);
        let miss = Ray::new(Vec3::new(-500.0, 10.0, -500.0), Vec3::NEG_Y);
        engine.select_ray(&miss, 100.0, &registry, &mut layer);

        assert_eq!(*log.borrow(), vec![Some("x".to_string()), None]);
        assert!(engine.selected().is_none());
        assert!(engine.marker().is_none());
        let x = layer.find_record("x").unwrap();
        assert_ne!(layer.group(x.batch).unwrap().color(x.index), Some(HIGHLIGHT_COLOR));
    }

    #[test]
    fn test_reselecting_same_target_keeps_original() {
        let (mut layer, registry) = setup();
        let mut engine = SelectionEngine::new(SelectionConfig::default());
        let x = layer.find_record("x").unwrap();
        let base_x = layer.group(x.batch).unwrap().color(x.index).unwrap();

        engine.select_ray(&down_at("A1A"), 100.0, &registry, &mut layer);
        engine.select_ray(&down_at("A1A"), 100.0, &registry, &mut layer);
        match engine.highlight() {
            Some(Highlight::Instance { original_color, .. }) => assert_eq!(*original_color, base_x),
            other => panic!("unexpected highlight {:?}", other),
        }
    }

    #[test]
    fn test_interact_distance_bounds_crosshair_path() {
        let (mut layer, registry) = setup();
        let mut engine = SelectionEngine::new(SelectionConfig::default());
        // Container roof is ~37 m below the ray origin
        assert!(engine.select_ray(&down_at("A1A"), 12.0, &registry, &mut layer).is_none());
    }

    #[test]
    fn test_selection_survives_refresh_when_record_remains() {
        let (mut layer, registry) = setup();
        let mut engine = SelectionEngine::new(SelectionConfig::default());
        engine.select_ray(&down_at("A2A"), 100.0, &registry, &mut layer);

        let records = vec![
            ContainerRecord::new("y", "A2A", SizeClass::Forty, "MSC", ContainerStatus::Flagged).into_ref(),
        ];
        let mut next = LayerBuilder::default().build(&records, 2);
        engine.on_layer_swap(&mut next);
        let y = next.find_record("y").unwrap();
        assert_eq!(next.group(y.batch).unwrap().color(y.index), Some(HIGHLIGHT_COLOR));
        assert_eq!(engine.selected().unwrap().status, ContainerStatus::Flagged);
    }

    #[test]
    fn test_selection_cleared_when_record_gone() {
        let (mut layer, registry) = setup();
        let mut engine = SelectionEngine::new(SelectionConfig::default());
        let log = recorder(&mut engine);
        engine.select_ray(&down_at("A2A"), 100.0, &registry, &mut layer);

        let mut next = LayerBuilder::default().build(&[], 2);
        engine.on_layer_swap(&mut next);
        assert!(engine.selected().is_none());
        assert_eq!(log.borrow().last(), Some(&None));
    }
}

//! Selection Tests - Highlight Exclusivity, Misses and Layer Swaps

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use yard_engine::camera::Ray;
use yard_engine::render::{FLAG_HIGHLIGHT, LayerBuilder, YardLayer};
use yard_engine::selection::{Highlight, PickRegistry, SelectionConfig, SelectionEngine};
use yard_engine::world::{
    ContainerRecord, ContainerStatus, RecordRef, SizeClass, YardLayoutConfig, map_raw_slot,
};

type Log = Rc<RefCell<Vec<Option<String>>>>;

fn records() -> Vec<RecordRef> {
    vec![
        ContainerRecord::new("X", "A1A", SizeClass::Forty, "MSC", ContainerStatus::Normal).into_ref(),
        ContainerRecord::new("Y", "A2A", SizeClass::Forty, "MSC", ContainerStatus::Normal).into_ref(),
        ContainerRecord::new("Z", "D1A", SizeClass::Twenty, "ONE", ContainerStatus::Flagged).into_ref(),
    ]
}

fn setup(generation: u64) -> (YardLayer, PickRegistry) {
    let layer = LayerBuilder::default().build(&records(), generation);
    let mut registry = PickRegistry::new();
    registry.register_layer(&layer);
    (layer, registry)
}

fn engine_with_log() -> (SelectionEngine, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    let mut engine = SelectionEngine::new(SelectionConfig::default());
    engine.set_callback(Box::new(move |record| {
        sink.borrow_mut().push(record.map(|r| r.id.clone()))
    }));
    (engine, log)
}

fn ray_down_onto(slot: &str) -> Ray {
    let (_, t) = map_raw_slot(slot, &YardLayoutConfig::default()).unwrap();
    Ray::new(t.position + Vec3::new(0.0, 50.0, 0.0), Vec3::NEG_Y)
}

fn color_of(layer: &YardLayer, id: &str) -> u32 {
    let i = layer.find_record(id).unwrap();
    layer.group(i.batch).unwrap().color(i.index).unwrap()
}

#[test]
fn test_highlight_exclusivity_restores_exact_color() {
    let (mut layer, registry) = setup(1);
    let (mut engine, _) = engine_with_log();
    let x_before = color_of(&layer, "X");
    let y_before = color_of(&layer, "Y");

    engine.select_ray(&ray_down_onto("A1A"), 1000.0, &registry, &mut layer);
    let Some(Highlight::Instance { original_color, .. }) = engine.highlight().cloned() else {
        panic!("expected an instance highlight");
    };
    assert_eq!(original_color, x_before);
    assert_ne!(color_of(&layer, "X"), x_before);

    engine.select_ray(&ray_down_onto("A2A"), 1000.0, &registry, &mut layer);
    assert_eq!(color_of(&layer, "X"), x_before);
    let x = layer.find_record("X").unwrap();
    assert!(!layer.group(x.batch).unwrap().instance(x.index).unwrap().has_flag(FLAG_HIGHLIGHT));

    let Some(Highlight::Instance { original_color, .. }) = engine.highlight().cloned() else {
        panic!("expected an instance highlight");
    };
    assert_eq!(original_color, y_before);
    assert_eq!(engine.selected().unwrap().id, "Y");
}

#[test]
fn test_only_selected_instance_recolored() {
    let (mut layer, registry) = setup(1);
    let (mut engine, _) = engine_with_log();
    let before: Vec<u32> = layer.groups().iter().flat_map(|g| g.instances().iter().map(|i| i.tint_color)).collect();

    engine.select_ray(&ray_down_onto("A1A"), 1000.0, &registry, &mut layer);
    let after: Vec<u32> = layer.groups().iter().flat_map(|g| g.instances().iter().map(|i| i.tint_color)).collect();
    let changed = before.iter().zip(&after).filter(|(a, b)| a != b).count();
    assert_eq!(changed, 1);
}

#[test]
fn test_miss_after_hit_clears_and_notifies_empty() {
    let (mut layer, registry) = setup(1);
    let (mut engine, log) = engine_with_log();
    let x_before = color_of(&layer, "X");

    engine.select_ray(&ray_down_onto("A1A"), 1000.0, &registry, &mut layer);
    let miss = Ray::new(Vec3::new(-500.0, 50.0, -500.0), Vec3::NEG_Y);
    assert!(engine.select_ray(&miss, 1000.0, &registry, &mut layer).is_none());

    assert_eq!(*log.borrow(), vec![Some("X".to_string()), None]);
    assert!(engine.selected().is_none());
    assert!(engine.highlight().is_none());
    assert!(engine.marker().is_none());
    assert_eq!(color_of(&layer, "X"), x_before);
}

#[test]
fn test_interact_distance_bounds_crosshair_pick() {
    let (mut layer, registry) = setup(1);
    let (mut engine, _) = engine_with_log();
    let config = SelectionConfig::default();
    let ray = ray_down_onto("A1A");
    // Container roof is ~47 m below the ray origin
    assert!(engine.select_ray(&ray, config.max_interact_distance, &registry, &mut layer).is_none());
    assert!(engine.select_ray(&ray, 100.0, &registry, &mut layer).is_some());
}

#[test]
fn test_marker_shown_above_selected_container() {
    let (mut layer, registry) = setup(1);
    let (mut engine, _) = engine_with_log();
    engine.select_ray(&ray_down_onto("D1A"), 1000.0, &registry, &mut layer);
    let marker = engine.marker().unwrap();
    let (_, t) = map_raw_slot("D1A", &YardLayoutConfig::default()).unwrap();
    assert!((marker.center.x - t.position.x).abs() < 1e-3);
    assert!((marker.center.z - t.position.z).abs() < 1e-3);
    assert!(marker.light_position.y > marker.center.y);
}

#[test]
fn test_selection_survives_refresh_when_record_remains() {
    let (mut layer, mut registry) = setup(1);
    let (mut engine, log) = engine_with_log();
    engine.select_ray(&ray_down_onto("A2A"), 1000.0, &registry, &mut layer);

    let (mut next, _) = setup(2);
    registry.register_layer(&next);
    engine.on_layer_swap(&mut next);

    assert_eq!(engine.selected().unwrap().id, "Y");
    let y = next.find_record("Y").unwrap();
    assert!(next.group(y.batch).unwrap().instance(y.index).unwrap().has_flag(FLAG_HIGHLIGHT));
    assert_eq!(log.borrow().last().cloned().flatten(), Some("Y".to_string()));
}

#[test]
fn test_selection_cleared_when_record_leaves() {
    let (mut layer, registry) = setup(1);
    let (mut engine, log) = engine_with_log();
    engine.select_ray(&ray_down_onto("A1A"), 1000.0, &registry, &mut layer);

    let remaining: Vec<RecordRef> = records().into_iter().filter(|r| r.id != "X").collect();
    let mut next = LayerBuilder::default().build(&remaining, 2);
    engine.on_layer_swap(&mut next);

    assert!(engine.selected().is_none());
    assert_eq!(log.borrow().last().cloned(), Some(None));
}

#[test]
fn test_stale_registry_does_not_hit_new_layer() {
    let (_, registry) = setup(1);
    let (mut next, _) = setup(2);
    let (mut engine, _) = engine_with_log();
    assert!(engine.select_ray(&ray_down_onto("A1A"), 1000.0, &registry, &mut next).is_none());
}

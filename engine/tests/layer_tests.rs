//! Layer Tests - Grouping, Skipping, Collisions and Rebuild Idempotence

use std::collections::BTreeMap;

use yard_engine::render::{ALARM_COLOR, FLAG_PENDING, GroupKey, LayerBuilder, YardLayer};
use yard_engine::world::{ContainerRecord, ContainerStatus, RecordRef, SizeClass};

fn rec(id: &str, slot: &str, size: SizeClass, carrier: &str, status: ContainerStatus) -> RecordRef {
    ContainerRecord::new(id, slot, size, carrier, status).into_ref()
}

fn normal(id: &str, slot: &str) -> RecordRef {
    rec(id, slot, SizeClass::Forty, "X", ContainerStatus::Normal)
}

/// group key -> (record id -> instance position bits)
fn mapping(layer: &YardLayer) -> BTreeMap<GroupKey, BTreeMap<String, [u32; 4]>> {
    layer
        .groups()
        .iter()
        .map(|group| {
            let members = group
                .members()
                .iter()
                .zip(group.instances())
                .map(|(record, instance)| {
                    let p = instance.position;
                    (
                        record.id.clone(),
                        [p[0].to_bits(), p[1].to_bits(), p[2].to_bits(), instance.yaw.to_bits()],
                    )
                })
                .collect();
            (group.key().clone(), members)
        })
        .collect()
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn test_scenario_rear_index_eight_is_skipped() {
    let records = vec![normal("r1", "A1A"), normal("r2", "A1B"), normal("r3", "D8A")];
    let layer = LayerBuilder::default().build(&records, 1);

    assert_eq!(layer.instance_count(), 2);
    assert_eq!(layer.skipped().len(), 1);
    assert_eq!(layer.skipped()[0].id, "r3");
    // Same size, brand, orientation and status
    assert_eq!(layer.groups().len(), 1);
    assert_eq!(layer.groups()[0].len(), 2);
}

#[test]
fn test_scenario_different_status_splits_groups() {
    let records = vec![
        normal("r1", "A1A"),
        rec("r2", "A1B", SizeClass::Forty, "X", ContainerStatus::Flagged),
        normal("r3", "D8A"),
    ];
    let layer = LayerBuilder::default().build(&records, 1);
    assert_eq!(layer.groups().len(), 2);
    assert!(layer.groups().iter().all(|g| g.len() == 1));
}

// ============================================================================
// Completeness
// ============================================================================

#[test]
fn test_batch_completeness() {
    let sizes = [SizeClass::Twenty, SizeClass::Forty];
    let brands = ["MSC", "MAERSK", "CMA"];
    let mut records = Vec::new();
    let mut n = 0;
    // Front bank only: one orientation
    for (i, size) in sizes.iter().enumerate() {
        for (j, brand) in brands.iter().enumerate() {
            for k in 0..3 {
                let lane = ['A', 'B', 'C'][j];
                let slot = format!("{}{}{}", lane, i * 3 + k + 1, 'A');
                records.push(rec(&format!("c{}", n), &slot, *size, brand, ContainerStatus::Normal));
                n += 1;
            }
        }
    }
    // Malformed
    records.push(normal("bad1", "Z1A"));
    records.push(normal("bad2", "E9A"));
    records.push(normal("bad3", ""));

    let layer = LayerBuilder::default().build(&records, 1);
    let distinct = sizes.len() * brands.len();
    assert_eq!(layer.groups().len(), distinct);
    assert_eq!(layer.instance_count(), records.len() - 3);
    assert_eq!(layer.skipped().len(), 3);
    assert_eq!(layer.draw_call_count(), distinct);
}

#[test]
fn test_back_references_match_instances() {
    let records = vec![normal("a", "A1A"), normal("b", "A2A"), normal("c", "A3A")];
    let layer = LayerBuilder::default().build(&records, 4);
    for id in ["a", "b", "c"] {
        let instance = layer.find_record(id).unwrap();
        assert_eq!(instance.batch.generation, 4);
        assert_eq!(layer.member(instance.batch, instance.index).unwrap().id, id);
    }
}

// ============================================================================
// Appearance
// ============================================================================

#[test]
fn test_flagged_uses_alarm_color() {
    let records = vec![rec("f", "B1A", SizeClass::Twenty, "MSC", ContainerStatus::Flagged)];
    let layer = LayerBuilder::default().build(&records, 1);
    assert_eq!(layer.groups()[0].instances()[0].tint_color, ALARM_COLOR);
}

#[test]
fn test_pending_members_pulse_out_of_lockstep() {
    let records = vec![
        rec("p1", "C1A", SizeClass::Forty, "MSC", ContainerStatus::Pending),
        rec("p2", "C2A", SizeClass::Forty, "MSC", ContainerStatus::Pending),
        rec("p3", "C3A", SizeClass::Forty, "MSC", ContainerStatus::Pending),
    ];
    let mut layer = LayerBuilder::default().build(&records, 1);
    let group = &layer.groups()[0];
    assert!(group.is_pulsing());
    assert!(group.instances().iter().all(|i| i.has_flag(FLAG_PENDING)));

    layer.animate(0.37);
    let scales: Vec<f32> = layer.groups()[0].instances().iter().map(|i| i.scale).collect();
    assert!(scales.iter().any(|s| (s - 1.0).abs() > 1e-4));
    assert!(
        scales.windows(2).any(|w| (w[0] - w[1]).abs() > 1e-5),
        "members pulse in lockstep: {:?}",
        scales
    );
}

// ============================================================================
// Collisions
// ============================================================================

#[test]
fn test_slot_collision_last_processed_wins() {
    let records = vec![normal("first", "A1A"), normal("second", "a1a")];
    let layer = LayerBuilder::default().build(&records, 1);

    assert_eq!(layer.instance_count(), 1);
    assert!(layer.find_record("first").is_none());
    assert!(layer.find_record("second").is_some());
    assert_eq!(layer.collisions().len(), 1);
    assert_eq!(layer.collisions()[0].kept, "second");
    assert_eq!(layer.collisions()[0].dropped, "first");
}

// ============================================================================
// Rebuild
// ============================================================================

#[test]
fn test_rebuild_is_idempotent() {
    let records = vec![
        normal("a", "A1A"),
        rec("b", "D3B", SizeClass::FortyFive, "ONE", ContainerStatus::Flagged),
        rec("c", "F7A", SizeClass::Twenty, "CMA", ContainerStatus::Pending),
        normal("d", "B10C"),
        normal("bad", "Q9"),
    ];
    let builder = LayerBuilder::default();
    let first = builder.build(&records, 1);
    let second = builder.build(&records, 2);
    assert_eq!(mapping(&first), mapping(&second));
}

#[test]
fn test_rebuild_invalidates_old_batch_refs() {
    let records = vec![normal("a", "A1A")];
    let builder = LayerBuilder::default();
    let old = builder.build(&records, 1);
    let new = builder.build(&records, 2);
    let stale = old.find_record("a").unwrap();
    assert!(new.group(stale.batch).is_none());
    assert!(new.member(stale.batch, stale.index).is_none());
}

#[test]
fn test_collision_index_covers_every_instance() {
    let records = vec![normal("a", "A1A"), normal("b", "A1B"), normal("c", "E2A")];
    let layer = LayerBuilder::default().build(&records, 1);
    let index = layer.build_collision_index(6.0);
    assert_eq!(index.len(), layer.instance_count());
}

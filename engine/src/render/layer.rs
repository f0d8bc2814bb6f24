//! Layer Builder
//!
//! Turns a full container record set into render groups: one instanced batch
//! per (size class, brand, orientation, status). Draw calls scale with the
//! number of distinct groups, not the number of containers.
//!
//! A layer is never patched. Every refresh builds a new [`YardLayer`] with a
//! new generation number; [`BatchRef`]s from an older generation no longer
//! resolve, which is how stale pick targets are detected.
//!
//! Records whose slot address fails to parse or map are skipped and logged.
//! When two records resolve to the same slot, the one processed last is kept
//! and the pair is reported through [`YardLayer::collisions`].

use std::collections::{BTreeMap, HashMap};

use glam::Vec3;

use super::instancing::{ContainerInstance, FLAG_PENDING};
use super::palette::status_color;
use super::pulse::{PulseConfig, member_phase};
use crate::physics::{Aabb, SpatialIndex};
use crate::world::{
    ContainerStatus, InvalidSlotError, Orientation, RecordRef, SizeClass, SlotAddress,
    WorldTransform, YardLayoutConfig, map_raw_slot,
};

/// Identity of a render group. Ordering is deterministic so rebuilding the
/// same record set yields groups in the same order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub size: SizeClass,
    /// Normalized carrier label (trimmed, uppercase)
    pub brand: String,
    pub orientation: Orientation,
    pub status: ContainerStatus,
}

/// Handle to one group of one layer generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchRef {
    pub generation: u64,
    pub group: u32,
}

/// One instance of one batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceRef {
    pub batch: BatchRef,
    pub index: u32,
}

/// A record excluded because its slot address was rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedRecord {
    pub id: String,
    pub slot: String,
    pub error: InvalidSlotError,
}

/// Two records resolved to the same slot; `kept` was processed last.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotCollision {
    pub address: SlotAddress,
    pub kept: String,
    pub dropped: String,
}

/// One draw-call unit: instance data plus the batch-local back-references.
#[derive(Clone, Debug)]
pub struct RenderGroup {
    key: GroupKey,
    instances: Vec<ContainerInstance>,
    members: Vec<RecordRef>,
    addresses: Vec<SlotAddress>,
    base_colors: Vec<u32>,
    phases: Vec<f32>,
    dirty: bool,
}

impl RenderGroup {
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[ContainerInstance] {
        &self.instances
    }

    /// Back-reference array: batch-local index -> source record.
    pub fn members(&self) -> &[RecordRef] {
        &self.members
    }

    pub fn member(&self, index: u32) -> Option<&RecordRef> {
        self.members.get(index as usize)
    }

    pub fn address(&self, index: u32) -> Option<SlotAddress> {
        self.addresses.get(index as usize).copied()
    }

    pub fn instance(&self, index: u32) -> Option<&ContainerInstance> {
        self.instances.get(index as usize)
    }

    /// Color assigned at build time, before any highlight.
    pub fn base_color(&self, index: u32) -> Option<u32> {
        self.base_colors.get(index as usize).copied()
    }

    pub fn color(&self, index: u32) -> Option<u32> {
        self.instance(index).map(|i| i.tint_color)
    }

    /// Replace one instance's color; returns the previous value.
    pub fn set_color(&mut self, index: u32, color: u32) -> Option<u32> {
        let instance = self.instances.get_mut(index as usize)?;
        let previous = instance.tint_color;
        instance.tint_color = color;
        self.dirty = true;
        Some(previous)
    }

    pub fn set_flag(&mut self, index: u32, flag: u32, on: bool) -> bool {
        let Some(instance) = self.instances.get_mut(index as usize) else {
            return false;
        };
        instance.set_flag(flag, on);
        self.dirty = true;
        true
    }

    /// World AABB of an instance at rest scale.
    pub fn aabb(&self, index: u32) -> Option<Aabb> {
        let instance = self.instance(index)?;
        Some(Aabb::from_yawed(
            Vec3::from(instance.position),
            Vec3::from(instance.size),
            instance.yaw,
        ))
    }

    pub fn is_pulsing(&self) -> bool {
        self.key.status == ContainerStatus::Pending
    }

    /// True once after any instance changed; the renderer re-uploads then.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

/// The complete render/pick state for one record set.
#[derive(Clone, Debug, Default)]
pub struct YardLayer {
    generation: u64,
    groups: Vec<RenderGroup>,
    by_id: HashMap<String, InstanceRef>,
    by_slot: HashMap<SlotAddress, InstanceRef>,
    skipped: Vec<SkippedRecord>,
    collisions: Vec<SlotCollision>,
    pulse: PulseConfig,
}

impl YardLayer {
    /// A layer with no groups, used before the first refresh lands.
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            ..Default::default()
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn groups(&self) -> &[RenderGroup] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [RenderGroup] {
        &mut self.groups
    }

    /// Number of draw calls this layer needs.
    pub fn draw_call_count(&self) -> usize {
        self.groups.len()
    }

    pub fn instance_count(&self) -> usize {
        self.groups.iter().map(RenderGroup::len).sum()
    }

    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    pub fn collisions(&self) -> &[SlotCollision] {
        &self.collisions
    }

    pub fn batch_ref(&self, group: usize) -> BatchRef {
        BatchRef {
            generation: self.generation,
            group: group as u32,
        }
    }

    /// Resolve a batch handle. Handles from another generation are stale.
    pub fn group(&self, batch: BatchRef) -> Option<&RenderGroup> {
        if batch.generation != self.generation {
            return None;
        }
        self.groups.get(batch.group as usize)
    }

    pub fn group_mut(&mut self, batch: BatchRef) -> Option<&mut RenderGroup> {
        if batch.generation != self.generation {
            return None;
        }
        self.groups.get_mut(batch.group as usize)
    }

    pub fn find_record(&self, id: &str) -> Option<InstanceRef> {
        self.by_id.get(id).copied()
    }

    pub fn member(&self, batch: BatchRef, index: u32) -> Option<&RecordRef> {
        self.group(batch)?.member(index)
    }

    /// Instance currently standing on `address`.
    pub fn occupant(&self, address: &SlotAddress) -> Option<InstanceRef> {
        self.by_slot.get(address).copied()
    }

    pub fn instance_aabb(&self, instance: InstanceRef) -> Option<Aabb> {
        self.group(instance.batch)?.aabb(instance.index)
    }

    /// Advance the pending-status pulse to `time` seconds.
    pub fn animate(&mut self, time: f32) {
        let pulse = self.pulse;
        for group in self.groups.iter_mut().filter(|g| g.is_pulsing()) {
            for (instance, phase) in group.instances.iter_mut().zip(&group.phases) {
                instance.scale = pulse.scale_at(time, *phase);
            }
            group.dirty = true;
        }
    }

    /// World box of every instance. Cheap to copy out before the layer is
    /// handed off, so the index can be built after.
    pub fn collision_entries(&self) -> Vec<(Aabb, InstanceRef)> {
        let mut entries = Vec::with_capacity(self.instance_count());
        for (g, group) in self.groups.iter().enumerate() {
            let batch = self.batch_ref(g);
            for i in 0..group.len() as u32 {
                if let Some(aabb) = group.aabb(i) {
                    entries.push((aabb, InstanceRef { batch, index: i }));
                }
            }
        }
        entries
    }

    /// Collision index over every instance, keyed by [`InstanceRef`].
    pub fn build_collision_index(&self, cell_size: f32) -> SpatialIndex<InstanceRef> {
        index_from_entries(self.collision_entries(), cell_size)
    }
}

pub fn index_from_entries(entries: Vec<(Aabb, InstanceRef)>, cell_size: f32) -> SpatialIndex<InstanceRef> {
    let mut index = SpatialIndex::new(cell_size);
    for (aabb, key) in entries {
        index.insert(aabb, key);
    }
    index
}

struct Placed {
    record: RecordRef,
    address: SlotAddress,
    transform: WorldTransform,
}

/// Builds [`YardLayer`]s from record sets.
#[derive(Clone, Debug, Default)]
pub struct LayerBuilder {
    pub layout: YardLayoutConfig,
    pub pulse: PulseConfig,
}

impl LayerBuilder {
    pub fn new(layout: YardLayoutConfig) -> Self {
        Self {
            layout,
            pulse: PulseConfig::default(),
        }
    }

    /// Build a complete layer. Never fails; bad records are skipped.
    pub fn build(&self, records: &[RecordRef], generation: u64) -> YardLayer {
        let mut skipped = Vec::new();
        let mut collisions = Vec::new();
        let mut placed: Vec<Option<Placed>> = Vec::with_capacity(records.len());
        let mut slot_owner: HashMap<SlotAddress, usize> = HashMap::new();

        for record in records {
            let (address, transform) = match map_raw_slot(&record.slot, &self.layout) {
                Ok(mapped) => mapped,
                Err(error) => {
                    log::warn!(
                        "Skipping container {}: bad slot '{}': {}",
                        record.id,
                        record.slot,
                        error
                    );
                    skipped.push(SkippedRecord {
                        id: record.id.clone(),
                        slot: record.slot.clone(),
                        error,
                    });
                    continue;
                }
            };

            if let Some(previous) = slot_owner.insert(address, placed.len()) {
                if let Some(dropped) = placed[previous].take() {
                    log::warn!(
                        "Slot {} collision: {} replaces {}",
                        address,
                        record.id,
                        dropped.record.id
                    );
                    collisions.push(SlotCollision {
                        address,
                        kept: record.id.clone(),
                        dropped: dropped.record.id.clone(),
                    });
                }
            }

            placed.push(Some(Placed {
                record: record.clone(),
                address,
                transform,
            }));
        }

        let mut grouped: BTreeMap<GroupKey, Vec<Placed>> = BTreeMap::new();
        for p in placed.into_iter().flatten() {
            let key = GroupKey {
                size: p.record.size,
                brand: p.record.carrier.trim().to_ascii_uppercase(),
                orientation: p.address.lane.group().orientation(),
                status: p.record.status,
            };
            grouped.entry(key).or_default().push(p);
        }

        let mut layer = YardLayer {
            generation,
            pulse: self.pulse,
            skipped,
            collisions,
            ..Default::default()
        };

        for (g, (key, members)) in grouped.into_iter().enumerate() {
            let group = self.build_group(key, members);
            let batch = layer.batch_ref(g);
            for (i, (record, address)) in group.members.iter().zip(&group.addresses).enumerate() {
                let instance = InstanceRef {
                    batch,
                    index: i as u32,
                };
                layer.by_id.insert(record.id.clone(), instance);
                layer.by_slot.insert(*address, instance);
            }
            layer.groups.push(group);
        }

        log::debug!(
            "Layer {}: {} instances in {} groups ({} skipped, {} collisions)",
            generation,
            layer.instance_count(),
            layer.groups.len(),
            layer.skipped.len(),
            layer.collisions.len()
        );
        layer
    }

    fn build_group(&self, key: GroupKey, members: Vec<Placed>) -> RenderGroup {
        let dims = self.layout.dimensions.get(key.size);
        let flags = if key.status == ContainerStatus::Pending {
            FLAG_PENDING
        } else {
            0
        };

        let mut group = RenderGroup {
            instances: Vec::with_capacity(members.len()),
            members: Vec::with_capacity(members.len()),
            addresses: Vec::with_capacity(members.len()),
            base_colors: Vec::with_capacity(members.len()),
            phases: Vec::with_capacity(members.len()),
            key,
            dirty: true,
        };

        for p in members {
            let color = status_color(&p.record.carrier, p.record.status);
            // Slot transform is the tier floor; the box center sits half a box higher
            let center = p.transform.position + Vec3::Y * dims.height * 0.5;
            group.instances.push(
                ContainerInstance::new(
                    center.to_array(),
                    p.transform.yaw,
                    dims.to_vec3().to_array(),
                    color,
                )
                .with_flags(flags),
            );
            group.phases.push(member_phase(&p.record.id));
            group.base_colors.push(color);
            group.addresses.push(p.address);
            group.members.push(p.record);
        }
        group
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{ContainerRecord, Lane};

    fn rec(id: &str, slot: &str, size: SizeClass, carrier: &str, status: ContainerStatus) -> RecordRef {
        ContainerRecord::new(id, slot, size, carrier, status).into_ref()
    }

    #[test]
    fn test_groups_by_key() {
        let records = vec![
            rec("a", "A1A", SizeClass::Forty, "MSC", ContainerStatus::Normal),
            rec("b", "A2A", SizeClass::Forty, "msc", ContainerStatus::Normal),
            rec("c", "D1A", SizeClass::Forty, "MSC", ContainerStatus::Normal),
            rec("d", "A3A", SizeClass::Forty, "MSC", ContainerStatus::Flagged),
        ];
        let layer = LayerBuilder::default().build(&records, 1);
        // Same key for a+b; c differs by orientation; d by status
        assert_eq!(layer.draw_call_count(), 3);
        assert_eq!(layer.instance_count(), 4);
    }

    #[test]
    fn test_box_center_lifted_by_half_height() {
        let builder = LayerBuilder::default();
        let records = vec![rec("a", "B2C", SizeClass::FortyHighCube, "ONE", ContainerStatus::Normal)];
        let layer = builder.build(&records, 1);
        let at = layer.find_record("a").unwrap();
        let instance = layer.group(at.batch).unwrap().instance(at.index).unwrap();
        let expected = 2.0 * builder.layout.tier_height + 2.90 * 0.5;
        assert!((instance.position[1] - expected).abs() < 1e-4);
    }

    #[test]
    fn test_collision_last_wins() {
        let records = vec![
            rec("first", "A1A", SizeClass::Twenty, "MSC", ContainerStatus::Normal),
            rec("second", "a1", SizeClass::Twenty, "MSC", ContainerStatus::Normal),
        ];
        let layer = LayerBuilder::default().build(&records, 1);
        assert_eq!(layer.instance_count(), 1);
        assert!(layer.find_record("first").is_none());
        assert!(layer.find_record("second").is_some());
        assert_eq!(layer.collisions().len(), 1);
        assert_eq!(layer.collisions()[0].dropped, "first");
        let occupant = layer.occupant(&SlotAddress::ground(Lane::A, 1)).unwrap();
        assert_eq!(layer.member(occupant.batch, occupant.index).unwrap().id, "second");
    }

    #[test]
    fn test_stale_batch_ref_does_not_resolve() {
        let records = vec![rec("a", "A1A", SizeClass::Twenty, "MSC", ContainerStatus::Normal)];
        let builder = LayerBuilder::default();
        let old = builder.build(&records, 1);
        let new = builder.build(&records, 2);
        let stale = old.find_record("a").unwrap();
        assert!(new.group(stale.batch).is_none());
        assert!(new.member(stale.batch, stale.index).is_none());
    }

    #[test]
    fn test_pending_pulse_changes_scale() {
        let records = vec![
            rec("p1", "A1A", SizeClass::Twenty, "MSC", ContainerStatus::Pending),
            rec("p2", "A2A", SizeClass::Twenty, "MSC", ContainerStatus::Pending),
            rec("n", "A3A", SizeClass::Twenty, "MSC", ContainerStatus::Normal),
        ];
        let mut layer = LayerBuilder::default().build(&records, 1);
        layer.animate(0.37);
        let p1 = layer.find_record("p1").unwrap();
        let p2 = layer.find_record("p2").unwrap();
        let n = layer.find_record("n").unwrap();
        let scale = |r: InstanceRef| layer.group(r.batch).unwrap().instance(r.index).unwrap().scale;
        assert_ne!(scale(p1), scale(p2));
        assert_eq!(scale(n), 1.0);
    }

    #[test]
    fn test_set_color_returns_previous() {
        let records = vec![rec("a", "A1A", SizeClass::Twenty, "MSC", ContainerStatus::Normal)];
        let mut layer = LayerBuilder::default().build(&records, 1);
        let at = layer.find_record("a").unwrap();
        let group = layer.group_mut(at.batch).unwrap();
        let base = group.base_color(at.index).unwrap();
        assert_eq!(group.set_color(at.index, 0x00FF00FF), Some(base));
        assert_eq!(group.color(at.index), Some(0x00FF00FF));
    }

    #[test]
    fn test_collision_index_covers_every_instance() {
        let records = vec![
            rec("a", "A1A", SizeClass::Forty, "MSC", ContainerStatus::Normal),
            rec("b", "E3B", SizeClass::Twenty, "ONE", ContainerStatus::Normal),
        ];
        let layer = LayerBuilder::default().build(&records, 1);
        let index = layer.build_collision_index(6.0);
        assert_eq!(index.len(), 2);
    }
}

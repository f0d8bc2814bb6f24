//! Pick Registry
//!
//! Explicit pick tree for hit-testing. Every pickable thing is registered as a
//! node carrying a typed [`PickOwner`], or as a child part node whose owner is
//! found by walking its parent chain:
//!
//! - one batch node per render group of the current layer, owner
//!   [`PickOwner::Batch`]; a hit on it also carries the instance index
//! - one root node per directly placed object, owner [`PickOwner::Direct`],
//!   with one child node per box of the object
//!
//! Batch instances are hit-tested through the layer's [`SpatialIndex`] once
//! it has been attached, and by brute force over the layer's groups until
//! then, so a freshly swapped layer is pickable immediately.

use glam::Vec3;

use crate::build::ObjectId;
use crate::camera::Ray;
use crate::physics::{Aabb, SpatialIndex};
use crate::render::{BatchRef, InstanceRef, YardLayer};
use crate::world::RecordRef;

/// Parent hops allowed when resolving a hit to its owner.
const MAX_OWNER_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// Back-reference of a directly placed object.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectRef {
    pub object: ObjectId,
    /// Record the object stands for, if any (locally placed containers)
    pub record: Option<RecordRef>,
}

/// Typed owner attached to a node when it is created.
#[derive(Debug, Clone, PartialEq)]
pub enum PickOwner {
    Batch(BatchRef),
    Direct(DirectRef),
}

/// A hit resolved to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum PickTarget {
    Instance(InstanceRef),
    Direct(DirectRef),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub target: PickTarget,
    pub distance: f32,
    pub point: Vec3,
    /// Box that was hit
    pub aabb: Aabb,
}

#[derive(Debug, Clone)]
struct PickNode {
    parent: Option<NodeId>,
    owner: Option<PickOwner>,
    aabb: Option<Aabb>,
    live: bool,
}

#[derive(Default)]
pub struct PickRegistry {
    nodes: Vec<PickNode>,
    batch_nodes: Vec<NodeId>,
    direct_roots: Vec<(ObjectId, NodeId, Vec<NodeId>)>,
    generation: Option<u64>,
    index: Option<SpatialIndex<InstanceRef>>,
}

impl PickRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the layer the batch nodes were registered against.
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn collision_index(&self) -> Option<&SpatialIndex<InstanceRef>> {
        self.index.as_ref()
    }

    pub fn direct_count(&self) -> usize {
        self.direct_roots.len()
    }

    /// Stored nodes, dead ones included until the next compaction.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn push(&mut self, node: PickNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Replace the batch nodes with those of `layer`. Drops the old index;
    /// brute force covers the new layer until [`attach_index`](Self::attach_index).
    pub fn register_layer(&mut self, layer: &YardLayer) {
        for id in std::mem::take(&mut self.batch_nodes) {
            self.nodes[id.0 as usize].live = false;
        }
        self.index = None;
        self.generation = Some(layer.generation());

        for g in 0..layer.groups().len() {
            let id = self.push(PickNode {
                parent: None,
                owner: Some(PickOwner::Batch(layer.batch_ref(g))),
                aabb: None,
                live: true,
            });
            self.batch_nodes.push(id);
        }
        self.compact();
    }

    /// Attach the collision index built for layer `generation`. An index for
    /// any other generation is stale and rejected.
    pub fn attach_index(&mut self, generation: u64, index: SpatialIndex<InstanceRef>) -> bool {
        if self.generation != Some(generation) {
            log::debug!(
                "Dropping collision index for layer {} (registered {:?})",
                generation,
                self.generation
            );
            return false;
        }
        self.index = Some(index);
        true
    }

    /// Register a directly placed object with one child node per box.
    pub fn register_direct(&mut self, owner: DirectRef, parts: &[Aabb]) -> NodeId {
        self.remove_direct(owner.object);
        let object = owner.object;
        let root = self.push(PickNode {
            parent: None,
            owner: Some(PickOwner::Direct(owner)),
            aabb: None,
            live: true,
        });
        let children = parts
            .iter()
            .map(|aabb| {
                self.push(PickNode {
                    parent: Some(root),
                    owner: None,
                    aabb: Some(*aabb),
                    live: true,
                })
            })
            .collect();
        self.direct_roots.push((object, root, children));
        root
    }

    pub fn remove_direct(&mut self, object: ObjectId) -> bool {
        let Some(pos) = self.direct_roots.iter().position(|(o, _, _)| *o == object) else {
            return false;
        };
        let (_, root, children) = self.direct_roots.remove(pos);
        self.nodes[root.0 as usize].live = false;
        for child in children {
            self.nodes[child.0 as usize].live = false;
        }
        self.compact();
        true
    }

    /// Walk up from `node` to the nearest owner. `instance` is the batch-local
    /// index reported by an instanced hit.
    pub fn resolve(&self, node: NodeId, instance: Option<u32>) -> Option<PickTarget> {
        let mut current = Some(node);
        for _ in 0..MAX_OWNER_DEPTH {
            let n = self.nodes.get(current?.0 as usize)?;
            if !n.live {
                return None;
            }
            match &n.owner {
                Some(PickOwner::Batch(batch)) => {
                    return instance.map(|index| {
                        PickTarget::Instance(InstanceRef {
                            batch: *batch,
                            index,
                        })
                    });
                }
                Some(PickOwner::Direct(direct)) => return Some(PickTarget::Direct(direct.clone())),
                None => current = n.parent,
            }
        }
        None
    }

    /// Nearest hit along `ray` within `max_distance`, over the layer's
    /// batches and every direct object.
    pub fn hit_test(&self, layer: &YardLayer, ray: &Ray, max_distance: f32) -> Option<PickHit> {
        let batch = self.hit_batches(layer, ray, max_distance);
        let direct = self.hit_direct(ray, max_distance);

        match (batch, direct) {
            (Some(b), Some(d)) => Some(if d.distance < b.distance { d } else { b }),
            (b, d) => b.or(d),
        }
    }

    fn hit_batches(&self, layer: &YardLayer, ray: &Ray, max_distance: f32) -> Option<PickHit> {
        // Batch nodes registered against another layer are stale
        if self.generation != Some(layer.generation()) {
            return None;
        }

        let (instance, aabb, distance) = match &self.index {
            Some(index) => {
                let hit = index.raycast(ray.origin, ray.direction, max_distance)?;
                (*hit.key, hit.aabb, hit.distance)
            }
            None => brute_force(layer, ray, max_distance)?,
        };

        let node = *self.batch_nodes.get(instance.batch.group as usize)?;
        let target = self.resolve(node, Some(instance.index))?;
        Some(PickHit {
            target,
            distance,
            point: ray.at(distance),
            aabb,
        })
    }

    fn hit_direct(&self, ray: &Ray, max_distance: f32) -> Option<PickHit> {
        let mut best: Option<(NodeId, Aabb, f32)> = None;
        for (_, _, children) in &self.direct_roots {
            for child in children {
                let Some(aabb) = self.nodes[child.0 as usize].aabb else {
                    continue;
                };
                let Some(t) = aabb.ray_intersect(ray.origin, ray.direction) else {
                    continue;
                };
                if t <= max_distance && best.as_ref().is_none_or(|(_, _, bt)| t < *bt) {
                    best = Some((*child, aabb, t));
                }
            }
        }

        let (node, aabb, distance) = best?;
        let target = self.resolve(node, None)?;
        Some(PickHit {
            target,
            distance,
            point: ray.at(distance),
            aabb,
        })
    }

    /// Drop dead nodes once they outnumber the live ones. Node ids are
    /// renumbered, so ids returned by earlier registrations go stale after
    /// any `register_layer` or `remove_direct`.
    fn compact(&mut self) {
        let live = self.nodes.iter().filter(|n| n.live).count();
        if self.nodes.len() < 64 || live * 2 > self.nodes.len() {
            return;
        }

        let mut remap = vec![None; self.nodes.len()];
        let mut nodes = Vec::with_capacity(live);
        for (i, node) in self.nodes.iter().enumerate() {
            if node.live {
                remap[i] = Some(NodeId(nodes.len() as u32));
                nodes.push(node.clone());
            }
        }
        let map = |id: NodeId| remap[id.0 as usize];
        for node in &mut nodes {
            node.parent = node.parent.and_then(map);
        }
        self.batch_nodes = self.batch_nodes.iter().filter_map(|id| map(*id)).collect();
        for (_, root, children) in &mut self.direct_roots {
            if let Some(r) = map(*root) {
                *root = r;
            }
            *children = children.iter().filter_map(|id| map(*id)).collect();
        }
        self.nodes = nodes;
    }
}

fn brute_force(layer: &YardLayer, ray: &Ray, max_distance: f32) -> Option<(InstanceRef, Aabb, f32)> {
    let mut best: Option<(InstanceRef, Aabb, f32)> = None;
    for (g, group) in layer.groups().iter().enumerate() {
        let batch = layer.batch_ref(g);
        for i in 0..group.len() as u32 {
            let Some(aabb) = group.aabb(i) else {
                continue;
            };
            let Some(t) = aabb.ray_intersect(ray.origin, ray.direction) else {
                continue;
            };
            if t <= max_distance && best.as_ref().is_none_or(|(_, _, bt)| t < *bt) {
                best = Some((InstanceRef { batch, index: i }, aabb, t));
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::LayerBuilder;
    use crate::world::{ContainerRecord, ContainerStatus, SizeClass, YardLayoutConfig, map_raw_slot};

    fn layer(generation: u64) -> YardLayer {
        let records = vec![
            ContainerRecord::new("a", "A1A", SizeClass::Forty, "MSC", ContainerStatus::Normal).into_ref(),
            ContainerRecord::new("b", "A2A", SizeClass::Forty, "ONE", ContainerStatus::Normal).into_ref(),
        ];
        LayerBuilder::default().build(&records, generation)
    }

    fn down_at(slot: &str) -> Ray {
        let (_, t) = map_raw_slot(slot, &YardLayoutConfig::default()).unwrap();
        Ray::new(t.position + Vec3::Y * 50.0, Vec3::NEG_Y)
    }

    fn instance_id(registry: &PickRegistry, layer: &YardLayer, ray: &Ray) -> Option<String> {
        match registry.hit_test(layer, ray, 500.0)?.target {
            PickTarget::Instance(i) => layer.member(i.batch, i.index).map(|r| r.id.clone()),
            PickTarget::Direct(_) => None,
        }
    }

    #[test]
    fn test_brute_force_and_index_agree() {
        let layer = layer(1);
        let mut registry = PickRegistry::new();
        registry.register_layer(&layer);
        assert!(!registry.has_index());
        let ray = down_at("A2A");
        assert_eq!(instance_id(&registry, &layer, &ray).as_deref(), Some("b"));

        assert!(registry.attach_index(1, layer.build_collision_index(6.0)));
        assert_eq!(instance_id(&registry, &layer, &ray).as_deref(), Some("b"));
    }

    #[test]
    fn test_stale_index_rejected() {
        let old = layer(1);
        let new = layer(2);
        let mut registry = PickRegistry::new();
        registry.register_layer(&new);
        assert!(!registry.attach_index(1, old.build_collision_index(6.0)));
        assert!(!registry.has_index());
    }

    #[test]
    fn test_unregistered_layer_is_not_pickable() {
        let old = layer(1);
        let new = layer(2);
        let mut registry = PickRegistry::new();
        registry.register_layer(&old);
        assert!(registry.hit_test(&new, &down_at("A1A"), 500.0).is_none());
    }

    #[test]
    fn test_direct_part_resolves_to_root_owner() {
        let layer = layer(1);
        let mut registry = PickRegistry::new();
        registry.register_layer(&layer);
        let part = Aabb::from_center_size(Vec3::new(-20.0, 1.0, -20.0), Vec3::splat(2.0));
        registry.register_direct(
            DirectRef {
                object: ObjectId(7),
                record: None,
            },
            &[part],
        );
        let ray = Ray::new(Vec3::new(-20.0, 30.0, -20.0), Vec3::NEG_Y);
        let hit = registry.hit_test(&layer, &ray, 500.0).unwrap();
        assert_eq!(
            hit.target,
            PickTarget::Direct(DirectRef {
                object: ObjectId(7),
                record: None
            })
        );
        assert!((hit.point.y - 2.0).abs() < 1e-4);

        assert!(registry.remove_direct(ObjectId(7)));
        assert!(registry.hit_test(&layer, &ray, 500.0).is_none());
    }

    #[test]
    fn test_nearest_wins_between_direct_and_batch() {
        let layer = layer(1);
        let mut registry = PickRegistry::new();
        registry.register_layer(&layer);
        let (_, t) = map_raw_slot("A1A", &YardLayoutConfig::default()).unwrap();
        // A box floating above container "a"
        let above = Aabb::from_center_size(t.position + Vec3::Y * 10.0, Vec3::splat(1.0));
        registry.register_direct(
            DirectRef {
                object: ObjectId(1),
                record: None,
            },
            &[above],
        );
        let hit = registry.hit_test(&layer, &down_at("A1A"), 500.0).unwrap();
        assert!(matches!(hit.target, PickTarget::Direct(_)));
    }

    #[test]
    fn test_max_distance_limits_hits() {
        let layer = layer(1);
        let mut registry = PickRegistry::new();
        registry.register_layer(&layer);
        assert!(registry.hit_test(&layer, &down_at("A1A"), 10.0).is_none());
    }

    #[test]
    fn test_repeated_registration_compacts() {
        let mut registry = PickRegistry::new();
        for generation in 1..200 {
            registry.register_layer(&layer(generation));
        }
        assert!(registry.nodes.len() < 200);
        let last = layer(199);
        assert!(registry.hit_test(&last, &down_at("A1A"), 500.0).is_some());
    }

    #[test]
    fn test_place_remove_churn_stays_bounded() {
        let layer = layer(1);
        let mut registry = PickRegistry::new();
        registry.register_layer(&layer);
        let part = Aabb::from_center_size(Vec3::new(-20.0, 1.0, -20.0), Vec3::splat(2.0));
        let kept = Aabb::from_center_size(Vec3::new(-40.0, 1.0, -40.0), Vec3::splat(2.0));
        registry.register_direct(
            DirectRef {
                object: ObjectId(0),
                record: None,
            },
            &[kept],
        );

        for n in 1..500 {
            registry.register_direct(
                DirectRef {
                    object: ObjectId(n),
                    record: None,
                },
                &[part, part],
            );
            assert!(registry.remove_direct(ObjectId(n)));
        }

        assert!(registry.node_count() < 80);
        assert_eq!(registry.direct_count(), 1);
        let ray = Ray::new(Vec3::new(-40.0, 30.0, -40.0), Vec3::NEG_Y);
        assert!(matches!(
            registry.hit_test(&layer, &ray, 500.0).map(|h| h.target),
            Some(PickTarget::Direct(DirectRef { object: ObjectId(0), .. }))
        ));
        assert_eq!(instance_id(&registry, &layer, &down_at("A1A")).as_deref(), Some("a"));
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::foundation::ids::{LayerId, PropertyId};
use crate::perform::fingerprint::{LayerFingerprint, fingerprint_layer};
use crate::scene::model::{Layer, PropertyNode, Scene};
use crate::scene::names;

/// Renderer action a property change calls for.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Performable {
    /// Redraw the layer's content.
    DrawLayer,
    /// Move the layer without touching rotation or scale.
    UpdatePosition,
    /// Recompute the layer's full transform.
    UpdateTransform,
    /// Rebuild the set of array-modifier instances.
    UpdateArrayModifierCount,
    /// Recompute the array-modifier instance transforms.
    UpdateArrayModifierTransform,
}

/// Classification of one property, compound or group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PropertyEntry {
    /// Action a change to this property calls for.
    pub performable: Performable,
    /// Leaf driven by a timeline.
    pub is_animated: bool,
}

/// Registry entry of one layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct LayerRegistry {
    /// The classified layer.
    pub layer_id: LayerId,
    /// Structure the entry was built from.
    pub fingerprint: LayerFingerprint,
    /// Every property node of the layer.
    pub properties: BTreeMap<PropertyId, PropertyEntry>,
}

/// Where a property node sits in the layer tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Region {
    Layer,
    Transform,
    Position,
    Modifiers,
    ArrayModifier,
    ArrayModifierTransform,
}

impl Region {
    /// Region of a child named `name` of a node in `self`, and the child's own performable.
    fn child(self, name: &str) -> (Region, Performable) {
        use Performable::*;
        match (self, name) {
            (Region::Layer, names::TRANSFORM) => (Region::Transform, UpdateTransform),
            (Region::Layer, names::MODIFIERS) => (Region::Modifiers, DrawLayer),
            (Region::Layer, _) => (Region::Layer, DrawLayer),
            (Region::Transform, names::POSITION) => (Region::Position, UpdatePosition),
            (Region::Transform, names::POSITION_X | names::POSITION_Y) => {
                (Region::Position, UpdatePosition)
            }
            (Region::Transform, _) => (Region::Transform, UpdateTransform),
            (Region::Position, _) => (Region::Position, UpdatePosition),
            (Region::Modifiers, names::ARRAY_MODIFIER) => {
                (Region::ArrayModifier, UpdateArrayModifierTransform)
            }
            (Region::Modifiers, _) => (Region::Modifiers, DrawLayer),
            (Region::ArrayModifier, names::COUNT) => {
                (Region::ArrayModifier, UpdateArrayModifierCount)
            }
            (
                Region::ArrayModifier,
                names::TRANSFORM
                | names::ORIGIN
                | names::ORIGIN_X
                | names::ORIGIN_Y
                | names::TRANSFORM_BEHAVIOR
                | names::ORIGIN_BEHAVIOR
                | names::ROTATION_CORRECTION,
            ) => (Region::ArrayModifierTransform, UpdateArrayModifierTransform),
            (Region::ArrayModifier, _) => (Region::ArrayModifier, DrawLayer),
            (Region::ArrayModifierTransform, _) => {
                (Region::ArrayModifierTransform, UpdateArrayModifierTransform)
            }
        }
    }
}

/// Classify every property node of `layer` from its position in the tree.
///
/// Only names and nesting are consulted; values never change the result.
pub fn build_layer_registry(scene: &Scene, layer: &Layer) -> LayerRegistry {
    let mut properties = BTreeMap::new();
    let mut stack: Vec<(&PropertyId, Region)> =
        layer.properties.iter().map(|id| (id, Region::Layer)).collect();
    while let Some((id, parent)) = stack.pop() {
        let Some(node) = scene.properties.get(id) else {
            continue;
        };
        let (region, performable) = parent.child(node.name());
        let is_animated = matches!(node, PropertyNode::Property(p) if p.is_animated());
        properties.insert(id.clone(), PropertyEntry {
            performable,
            is_animated,
        });
        stack.extend(node.children().iter().map(|c| (c, region)));
    }
    LayerRegistry {
        layer_id: layer.id.clone(),
        fingerprint: fingerprint_layer(scene, layer),
        properties,
    }
}

/// Per-layer classification of every property in a scene.
///
/// Entries are shared; [`PerformableRegistry::sync_layer`] replaces an entry
/// instead of editing it, so clones taken earlier stay valid.
#[derive(Clone, Debug, Default)]
pub struct PerformableRegistry {
    layers: BTreeMap<LayerId, Arc<LayerRegistry>>,
    owners: BTreeMap<PropertyId, LayerId>,
}

impl PerformableRegistry {
    /// Classify every layer of `scene`.
    #[tracing::instrument(skip_all, fields(layers = scene.layers.len()))]
    pub fn build(scene: &Scene) -> Self {
        let mut out = Self::default();
        for layer in scene.layers.values() {
            out.insert(build_layer_registry(scene, layer));
        }
        out
    }

    /// Rebuild the entry of `layer_id` when its structure changed.
    ///
    /// Returns `true` when the entry was replaced or removed. A layer missing
    /// from `scene` is dropped from the registry.
    pub fn sync_layer(&mut self, scene: &Scene, layer_id: &LayerId) -> bool {
        let Some(layer) = scene.layers.get(layer_id) else {
            let removed = self.remove(layer_id);
            if removed {
                tracing::debug!(layer = %layer_id, "registry entry dropped");
            }
            return removed;
        };
        let fingerprint = fingerprint_layer(scene, layer);
        if self
            .layers
            .get(layer_id)
            .is_some_and(|entry| entry.fingerprint == fingerprint)
        {
            return false;
        }
        self.remove(layer_id);
        self.insert(build_layer_registry(scene, layer));
        tracing::debug!(layer = %layer_id, "registry entry rebuilt");
        true
    }

    /// Entry of one layer.
    pub fn layer(&self, id: &LayerId) -> Option<&LayerRegistry> {
        self.layers.get(id).map(Arc::as_ref)
    }

    /// Owning layer and classification of a property node.
    pub fn entry(&self, id: &PropertyId) -> Option<(&LayerId, &PropertyEntry)> {
        let layer = self.owners.get(id)?;
        let entry = self.layers.get(layer)?.properties.get(id)?;
        Some((layer, entry))
    }

    /// Classified layers in id order.
    pub fn layers(&self) -> impl Iterator<Item = &LayerRegistry> {
        self.layers.values().map(Arc::as_ref)
    }

    fn insert(&mut self, entry: LayerRegistry) {
        for id in entry.properties.keys() {
            self.owners.insert(id.clone(), entry.layer_id.clone());
        }
        self.layers.insert(entry.layer_id.clone(), Arc::new(entry));
    }

    fn remove(&mut self, layer_id: &LayerId) -> bool {
        let Some(old) = self.layers.remove(layer_id) else {
            return false;
        };
        for id in old.properties.keys() {
            if self.owners.get(id) == Some(layer_id) {
                self.owners.remove(id);
            }
        }
        true
    }
}

use std::collections::BTreeMap;

use crate::foundation::error::PropelResult;
use crate::foundation::ids::{CompositionId, LayerId};
use crate::scene::model::Scene;

/// Effective frame of every layer and composition reachable from a root.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TimeMap {
    pub(crate) layers: BTreeMap<LayerId, f64>,
    pub(crate) compositions: BTreeMap<CompositionId, f64>,
}

/// Local frame of a sub-composition placed by a layer starting at `layer_index`.
pub(crate) fn local_frame(parent_frame: f64, layer_index: i64) -> f64 {
    parent_frame - layer_index as f64
}

/// Walk composition nesting from `root` at `frame`.
///
/// A nested composition's frame is its parent's frame minus the start index of
/// the composition layer that places it. When a composition is placed more
/// than once, the first placement in layer order wins. Without `recursive`
/// only the root's own layers are mapped.
pub(crate) fn effective_frames(
    scene: &Scene,
    root: &CompositionId,
    frame: f64,
    recursive: bool,
) -> PropelResult<TimeMap> {
    let mut map = TimeMap::default();
    let mut stack: Vec<(CompositionId, f64)> = vec![(root.clone(), frame)];

    while let Some((comp_id, comp_frame)) = stack.pop() {
        if map.compositions.contains_key(&comp_id) {
            continue;
        }
        let comp = scene.composition(&comp_id)?;
        map.compositions.insert(comp_id.clone(), comp_frame);

        let mut nested = Vec::new();
        for layer_id in &comp.layers {
            let layer = scene.layer(layer_id)?;
            map.layers.entry(layer_id.clone()).or_insert(comp_frame);
            if recursive && let Some(child) = scene.nested_composition(layer) {
                nested.push((child.clone(), local_frame(comp_frame, layer.index)));
            }
        }
        // Reverse so the first placement is popped first.
        stack.extend(nested.into_iter().rev());
    }
    Ok(map)
}

use crate::array_modifier::types::{
    ArrayModifierParams, ComposedInstance, ComputedFields, IndexTransform,
};
use crate::foundation::core::{Affine, Vec2, lerp_vec2, rotate_vec2};
use crate::value::types::{OriginBehavior, TransformBehavior};

/// Compose per-index steps into one instance per index.
///
/// `steps[i]` is the modifier transform resolved for index `i`; `steps[0]` is
/// ignored because instance 0 is always the identity. Instance `i` applies
/// `steps[i]` on the right of the accumulated matrix. Under
/// [`TransformBehavior::AbsoluteForComputed`] only the constant fields
/// accumulate; the computed ones are applied on top of the accumulated state
/// for their own index and then dropped.
pub fn compose_index_transforms(
    steps: &[IndexTransform],
    computed: ComputedFields,
    params: &ArrayModifierParams,
) -> Vec<ComposedInstance> {
    let count = params.count.min(steps.len());
    let mut out: Vec<ComposedInstance> = Vec::with_capacity(count);
    if count == 0 {
        return out;
    }
    let mut acc = ComposedInstance {
        fields: IndexTransform::IDENTITY,
        matrix: Affine::IDENTITY,
    };
    out.push(acc);

    for step in &steps[1..count] {
        let step = corrected(*step, params.origin_behavior, params.origin, params.correction);
        let (constant, varying) = match params.policy {
            TransformBehavior::Recursive => (step, IndexTransform::IDENTITY),
            TransformBehavior::AbsoluteForComputed => split_computed(step, computed),
        };
        acc = acc.then(constant);
        out.push(acc.then(varying));
    }
    out
}

/// Split a step into its constant part and its computed part.
fn split_computed(
    step: IndexTransform,
    computed: ComputedFields,
) -> (IndexTransform, IndexTransform) {
    let id = IndexTransform::IDENTITY;
    let mut constant = step;
    let mut varying = id;
    if computed.translate_x {
        constant.translate.x = id.translate.x;
        varying.translate.x = step.translate.x;
    }
    if computed.translate_y {
        constant.translate.y = id.translate.y;
        varying.translate.y = step.translate.y;
    }
    if computed.rotation {
        constant.rotation = id.rotation;
        varying.rotation = step.rotation;
    }
    if computed.scale_x {
        constant.scale.x = id.scale.x;
        varying.scale.x = step.scale.x;
    }
    if computed.scale_y {
        constant.scale.y = id.scale.y;
        varying.scale.y = step.scale.y;
    }
    (constant, varying)
}

/// Blend a step's translation toward itself rotated by the step's rotation.
///
/// The rotation centre is the pivot itself for relative modifiers, standing in
/// for the shape centre, and the composition origin (`-origin` in pivot space)
/// for absolute ones.
pub fn corrected(
    step: IndexTransform,
    origin_behavior: OriginBehavior,
    origin: Vec2,
    correction: f64,
) -> IndexTransform {
    if correction == 0.0 || step.rotation == 0.0 {
        return step;
    }
    let centre = match origin_behavior {
        OriginBehavior::Relative => Vec2::ZERO,
        OriginBehavior::Absolute => -origin,
    };
    let rotated = centre + rotate_vec2(step.translate - centre, step.rotation);
    IndexTransform {
        translate: lerp_vec2(step.translate, rotated, correction.clamp(0.0, 1.0)),
        ..step
    }
}

/// Place pivot-space instance matrices around the layer's base transform.
///
/// Relative modifiers apply instances inside the layer's own space
/// (`base * T(origin) * L * T(-origin)`); absolute ones apply them in
/// composition space (`T(origin) * L * T(-origin) * base`).
pub fn place_instances(
    base: &[Affine],
    instances: &[ComposedInstance],
    params: &ArrayModifierParams,
) -> Vec<Affine> {
    let to_pivot = Affine::translate(params.origin);
    let from_pivot = Affine::translate(-params.origin);
    base.iter()
        .flat_map(|a| {
            instances.iter().map(move |inst| {
                let local = to_pivot * inst.matrix * from_pivot;
                match params.origin_behavior {
                    OriginBehavior::Relative => *a * local,
                    OriginBehavior::Absolute => local * *a,
                }
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/array_modifier/compose.rs"]
mod tests;

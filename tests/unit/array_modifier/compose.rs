use super::*;

fn params(count: usize, policy: TransformBehavior) -> ArrayModifierParams {
    ArrayModifierParams {
        count,
        policy,
        origin_behavior: OriginBehavior::Relative,
        origin: Vec2::ZERO,
        correction: 0.0,
    }
}

fn step(tx: f64, ty: f64, rotation: f64) -> IndexTransform {
    IndexTransform {
        translate: Vec2::new(tx, ty),
        rotation,
        ..IndexTransform::IDENTITY
    }
}

fn close(a: Vec2, b: Vec2) -> bool {
    (a - b).hypot() < 1e-9
}

fn affine_close(a: Affine, b: Affine) -> bool {
    a.as_coeffs()
        .iter()
        .zip(b.as_coeffs())
        .all(|(x, y)| (x - y).abs() < 1e-9)
}

#[test]
fn single_instance_is_the_base_for_every_policy() {
    let base = Affine::translate((40.0, 12.0)) * Affine::rotate(0.3);
    for policy in [TransformBehavior::Recursive, TransformBehavior::AbsoluteForComputed] {
        for origin_behavior in [OriginBehavior::Relative, OriginBehavior::Absolute] {
            let p = ArrayModifierParams {
                origin_behavior,
                origin: Vec2::new(7.0, -3.0),
                ..params(1, policy)
            };
            let steps = [step(5.0, 5.0, 45.0)];
            let inst = compose_index_transforms(&steps, ComputedFields::default(), &p);
            assert_eq!(inst.len(), 1);
            let placed = place_instances(&[base], &inst, &p);
            assert_eq!(placed.len(), 1);
            assert!(affine_close(placed[0], base), "{policy:?} {origin_behavior:?}");
        }
    }
}

#[test]
fn recursive_rotation_accumulates() {
    let steps = vec![step(0.0, 0.0, 10.0); 3];
    let inst = compose_index_transforms(
        &steps,
        ComputedFields::default(),
        &params(3, TransformBehavior::Recursive),
    );
    let rotations: Vec<f64> = inst.iter().map(|i| i.fields.rotation).collect();
    assert_eq!(rotations, vec![0.0, 10.0, 20.0]);
    assert!(affine_close(inst[2].matrix, Affine::rotate(20f64.to_radians())));
}

#[test]
fn recursive_translation_follows_accumulated_rotation() {
    let steps = vec![step(10.0, 0.0, 90.0); 3];
    let inst = compose_index_transforms(
        &steps,
        ComputedFields::default(),
        &params(3, TransformBehavior::Recursive),
    );
    assert!(close(inst[1].fields.translate, Vec2::new(10.0, 0.0)));
    assert!(close(inst[2].fields.translate, Vec2::new(10.0, 10.0)));
    assert!(close(inst[2].matrix.translation(), Vec2::new(10.0, 10.0)));
}

#[test]
fn computed_fields_are_absolute_per_index() {
    let steps = vec![step(5.0, 0.0, 0.0), step(5.0, 0.0, 15.0), step(5.0, 0.0, 30.0)];
    let computed = ComputedFields {
        rotation: true,
        ..ComputedFields::default()
    };
    let inst = compose_index_transforms(
        &steps,
        computed,
        &params(3, TransformBehavior::AbsoluteForComputed),
    );
    let rotations: Vec<f64> = inst.iter().map(|i| i.fields.rotation).collect();
    assert_eq!(rotations, vec![0.0, 15.0, 30.0]);
    assert!(close(inst[2].fields.translate, Vec2::new(10.0, 0.0)));
    assert!(affine_close(inst[2].matrix, inst[2].fields.to_affine()));

    let recursive =
        compose_index_transforms(&steps, computed, &params(3, TransformBehavior::Recursive));
    assert_eq!(recursive[2].fields.rotation, 45.0);
}

#[test]
fn count_is_bounded_by_available_steps() {
    let steps = vec![step(1.0, 0.0, 0.0); 2];
    let inst = compose_index_transforms(
        &steps,
        ComputedFields::default(),
        &params(5, TransformBehavior::Recursive),
    );
    assert_eq!(inst.len(), 2);
    let none = compose_index_transforms(
        &steps,
        ComputedFields::default(),
        &params(0, TransformBehavior::Recursive),
    );
    assert!(none.is_empty());
}

#[test]
fn correction_blends_toward_rotated_translation() {
    let s = step(10.0, 0.0, 90.0);
    let full = corrected(s, OriginBehavior::Relative, Vec2::ZERO, 1.0);
    assert!(close(full.translate, Vec2::new(0.0, 10.0)));
    let half = corrected(s, OriginBehavior::Relative, Vec2::ZERO, 0.5);
    assert!(close(half.translate, Vec2::new(5.0, 5.0)));
    let absolute = corrected(s, OriginBehavior::Absolute, Vec2::new(10.0, 0.0), 1.0);
    assert!(close(absolute.translate, Vec2::new(-10.0, 20.0)));
    assert_eq!(corrected(s, OriginBehavior::Relative, Vec2::ZERO, 0.0), s);
}

#[test]
fn origin_behavior_chooses_the_space() {
    let base = Affine::translate((100.0, 0.0));
    let inst = [
        ComposedInstance {
            fields: IndexTransform::IDENTITY,
            matrix: Affine::IDENTITY,
        },
        ComposedInstance {
            fields: step(0.0, 0.0, 90.0),
            matrix: Affine::rotate(90f64.to_radians()),
        },
    ];
    let p = params(2, TransformBehavior::Recursive);
    let relative = place_instances(&[base], &inst, &p);
    assert!(close((relative[1] * kurbo::Point::new(1.0, 0.0)).to_vec2(), Vec2::new(100.0, 1.0)));

    let p = ArrayModifierParams {
        origin_behavior: OriginBehavior::Absolute,
        ..p
    };
    let absolute = place_instances(&[base], &inst, &p);
    assert!(close((absolute[1] * kurbo::Point::new(1.0, 0.0)).to_vec2(), Vec2::new(0.0, 101.0)));
}

#[test]
fn stacked_modifiers_multiply_instances() {
    let p = params(2, TransformBehavior::Recursive);
    let inst = compose_index_transforms(&[step(1.0, 0.0, 0.0); 2], ComputedFields::default(), &p);
    let first = place_instances(&[Affine::IDENTITY], &inst, &p);
    let second = place_instances(&first, &inst, &p);
    assert_eq!(second.len(), 4);
    assert!(close(second[3].translation(), Vec2::new(2.0, 0.0)));
}

#[test]
fn policies_agree_without_computed_fields() {
    let s = IndexTransform {
        translate: Vec2::new(10.0, 0.0),
        rotation: 30.0,
        scale: Vec2::new(2.0, 1.0),
    };
    let steps = vec![s; 3];
    let rec = compose_index_transforms(
        &steps,
        ComputedFields::default(),
        &params(3, TransformBehavior::Recursive),
    );
    let abs = compose_index_transforms(
        &steps,
        ComputedFields::default(),
        &params(3, TransformBehavior::AbsoluteForComputed),
    );
    let expected = s.to_affine() * s.to_affine();
    for (r, a) in rec.iter().zip(&abs) {
        assert!(affine_close(r.matrix, a.matrix));
        assert_eq!(r.fields, a.fields);
    }
    assert!(affine_close(rec[2].matrix, expected));
    assert!(close(rec[2].fields.translate, expected.translation()));
    assert_eq!(rec[2].fields.rotation, 60.0);
    assert_eq!(rec[2].fields.scale, Vec2::new(4.0, 1.0));
}

#[test]
fn computed_scale_does_not_compound() {
    let s = IndexTransform {
        translate: Vec2::new(4.0, 0.0),
        rotation: 0.0,
        scale: Vec2::new(3.0, 1.0),
    };
    let computed = ComputedFields {
        scale_x: true,
        ..ComputedFields::default()
    };
    let inst = compose_index_transforms(
        &[s; 3],
        computed,
        &params(3, TransformBehavior::AbsoluteForComputed),
    );
    assert_eq!(inst[2].fields.scale, Vec2::new(3.0, 1.0));
    assert!(close(inst[2].fields.translate, Vec2::new(8.0, 0.0)));
    let expected = Affine::translate((8.0, 0.0)) * Affine::scale_non_uniform(3.0, 1.0);
    assert!(affine_close(inst[2].matrix, expected));
}

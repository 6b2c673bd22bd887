use super::*;

#[test]
fn rotate_quarter_turn() {
    let v = rotate_vec2(Vec2::new(1.0, 0.0), 90.0);
    assert!(v.x.abs() < 1e-12);
    assert!((v.y - 1.0).abs() < 1e-12);
}

#[test]
fn rgba_clamps_each_channel_range() {
    let c = Rgba::new(300.0, -4.0, 12.0, 1.5).clamped();
    assert_eq!(c.to_array(), [255.0, 0.0, 12.0, 1.0]);
}

#[test]
fn lerp_endpoints() {
    assert_eq!(lerp(2.0, 6.0, 0.0), 2.0);
    assert_eq!(lerp(2.0, 6.0, 1.0), 6.0);
    assert_eq!(lerp_vec2(Vec2::ZERO, Vec2::new(2.0, 4.0), 0.5), Vec2::new(1.0, 2.0));
}

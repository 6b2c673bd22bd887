use crate::{
    animation::bezier::{CubicSegment, CurvePoint},
    foundation::core::lerp,
    foundation::error::{PropelError, PropelResult},
    foundation::ids::{KeyframeId, TimelineId},
};

/// Bezier handle of a keyframe.
///
/// `tx` is the handle's position along the segment as a fraction of the distance between the
/// segment's two keyframes, measured from the segment's first keyframe. `value` is an offset from
/// the owning keyframe's value.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ControlPoint {
    /// Position along the segment in `(0, 1)`.
    pub tx: f64,
    /// Value offset relative to the owning keyframe.
    pub value: f64,
}

impl ControlPoint {
    /// Build a control point.
    pub fn new(tx: f64, value: f64) -> Self {
        Self { tx, value }
    }

    /// Mirror this handle to the other side of its keyframe.
    pub fn reflected(self) -> Self {
        Self {
            tx: 1.0 - self.tx,
            value: -self.value,
        }
    }
}

/// One keyframe of a [`Timeline`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Keyframe id.
    pub id: KeyframeId,
    /// Frame index this keyframe sits on.
    pub index: i64,
    /// Value at `index`.
    pub value: f64,
    /// Handle toward the previous keyframe.
    #[serde(default)]
    pub control_point_left: Option<ControlPoint>,
    /// Handle toward the next keyframe.
    #[serde(default)]
    pub control_point_right: Option<ControlPoint>,
    /// Derive a missing handle by mirroring the present one.
    #[serde(default)]
    pub reflect_control_points: bool,
}

impl Keyframe {
    /// Keyframe without handles.
    pub fn new(id: impl Into<KeyframeId>, index: i64, value: f64) -> Self {
        Self {
            id: id.into(),
            index,
            value,
            control_point_left: None,
            control_point_right: None,
            reflect_control_points: false,
        }
    }

    /// Left handle, mirrored from the right one when reflection applies.
    pub fn effective_left(&self) -> Option<ControlPoint> {
        match (self.control_point_left, self.control_point_right) {
            (Some(left), _) => Some(left),
            (None, Some(right)) if self.reflect_control_points => Some(right.reflected()),
            _ => None,
        }
    }

    /// Right handle, mirrored from the left one when reflection applies.
    pub fn effective_right(&self) -> Option<ControlPoint> {
        match (self.control_point_right, self.control_point_left) {
            (Some(right), _) => Some(right),
            (None, Some(left)) if self.reflect_control_points => Some(left.reflected()),
            _ => None,
        }
    }
}

/// Ordered keyframes driving one property.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Timeline {
    /// Timeline id.
    pub id: TimelineId,
    /// Keyframes, strictly increasing by `index`.
    pub keyframes: Vec<Keyframe>,
}

impl Timeline {
    /// Build a timeline from already ordered keyframes.
    pub fn new(id: impl Into<TimelineId>, keyframes: Vec<Keyframe>) -> Self {
        Self {
            id: id.into(),
            keyframes,
        }
    }

    /// Validate that the timeline has keyframes and that indices strictly increase.
    pub fn validate(&self) -> PropelResult<()> {
        if self.keyframes.is_empty() {
            return Err(PropelError::animation(format!(
                "timeline '{}' has no keyframes",
                self.id
            )));
        }
        if !self.keyframes.windows(2).all(|w| w[0].index < w[1].index) {
            return Err(PropelError::animation(format!(
                "timeline '{}' keyframes must be strictly increasing by index",
                self.id
            )));
        }
        for k in &self.keyframes {
            for cp in [k.control_point_left, k.control_point_right]
                .into_iter()
                .flatten()
            {
                if !(cp.tx > 0.0 && cp.tx < 1.0) || !cp.value.is_finite() {
                    return Err(PropelError::animation(format!(
                        "keyframe '{}' has a control point outside tx in (0, 1)",
                        k.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Value of the timeline at `frame`.
    ///
    /// Values clamp to the first/last keyframe outside the keyframe range, and a NaN frame
    /// reads the first keyframe. An empty timeline (rejected by [`Timeline::validate`])
    /// evaluates to `0`.
    pub fn value_at(&self, frame: f64) -> f64 {
        let keys = &self.keyframes;
        let Some(first) = keys.first() else {
            return 0.0;
        };
        if keys.len() == 1 || frame.is_nan() || frame <= first.index as f64 {
            return first.value;
        }
        let last = &keys[keys.len() - 1];
        if frame >= last.index as f64 {
            return last.value;
        }

        let idx = keys.partition_point(|k| (k.index as f64) <= frame);
        let k0 = &keys[idx - 1];
        let k1 = &keys[idx];
        if frame == k0.index as f64 {
            return k0.value;
        }

        match segment_curve(k0, k1) {
            Some(curve) => curve.value_at(frame),
            None => {
                let t = (frame - k0.index as f64) / (k1.index - k0.index) as f64;
                lerp(k0.value, k1.value, t)
            }
        }
    }

    /// Split the segment containing `frame`, returning `(k0', k_mid, k1')`.
    ///
    /// Returns `None` when `frame` is not strictly inside a segment.
    pub fn split_segment(
        &self,
        frame: i64,
        mid_id: impl Into<KeyframeId>,
    ) -> Option<(Keyframe, Keyframe, Keyframe)> {
        let idx = self.keyframes.partition_point(|k| k.index <= frame);
        if idx == 0 || idx >= self.keyframes.len() {
            return None;
        }
        split_keyframes(&self.keyframes[idx - 1], &self.keyframes[idx], frame, mid_id)
    }

    /// Timeline with a value-preserving keyframe inserted at `frame`.
    pub fn split_at(&self, frame: i64, mid_id: impl Into<KeyframeId>) -> Option<Self> {
        let (k0, mid, k1) = self.split_segment(frame, mid_id)?;
        let idx = self.keyframes.partition_point(|k| k.index <= frame);

        let mut keyframes = Vec::with_capacity(self.keyframes.len() + 1);
        keyframes.extend_from_slice(&self.keyframes[..idx - 1]);
        keyframes.push(k0);
        keyframes.push(mid);
        keyframes.push(k1);
        keyframes.extend_from_slice(&self.keyframes[idx + 1..]);
        Some(Self {
            id: self.id.clone(),
            keyframes,
        })
    }
}

/// Bezier curve for the segment `k0 -> k1`, or `None` when the segment is linear.
fn segment_curve(k0: &Keyframe, k1: &Keyframe) -> Option<CubicSegment> {
    let right = k0.effective_right();
    let left = k1.effective_left();
    if right.is_none() && left.is_none() {
        return None;
    }

    let x0 = k0.index as f64;
    let x1 = k1.index as f64;
    let span = x1 - x0;
    let p0 = CurvePoint::new(x0, k0.value);
    let p3 = CurvePoint::new(x1, k1.value);
    let p1 = right.map_or(p0, |cp| CurvePoint::new(x0 + cp.tx * span, k0.value + cp.value));
    let p2 = left.map_or(p3, |cp| CurvePoint::new(x0 + cp.tx * span, k1.value + cp.value));

    Some(CubicSegment { p0, p1, p2, p3 })
}

/// Split the segment `k0 -> k1` at `frame` so that the curve is unchanged.
///
/// Handles on the outer sides of `k0` and `k1` are materialized so reflection cannot alter the
/// neighbouring segments after the inner handles change.
pub fn split_keyframes(
    k0: &Keyframe,
    k1: &Keyframe,
    frame: i64,
    mid_id: impl Into<KeyframeId>,
) -> Option<(Keyframe, Keyframe, Keyframe)> {
    if !(k0.index < frame && frame < k1.index) {
        return None;
    }

    let mut left = k0.clone();
    left.control_point_left = k0.effective_left();
    let mut right = k1.clone();
    right.control_point_right = k1.effective_right();

    let Some(curve) = segment_curve(k0, k1) else {
        let t = (frame - k0.index) as f64 / (k1.index - k0.index) as f64;
        let mid = Keyframe::new(mid_id, frame, lerp(k0.value, k1.value, t));
        return Some((left, mid, right));
    };

    let x = frame as f64;
    let halves = curve.split(curve.solve_t(x));
    let (a, b) = (halves.left, halves.right);
    let mid_value = a.p3.y;
    let left_span = x - a.p0.x;
    let right_span = b.p3.x - x;

    let relative = |p: CurvePoint, origin_x: f64, span: f64, base: f64| {
        ControlPoint::new((p.x - origin_x) / span, p.y - base)
    };

    if k0.effective_right().is_some() {
        left.control_point_right = Some(relative(a.p1, a.p0.x, left_span, k0.value));
    }
    if k1.effective_left().is_some() {
        right.control_point_left = Some(relative(b.p2, x, right_span, k1.value));
    }

    let mid = Keyframe {
        id: mid_id.into(),
        index: frame,
        value: mid_value,
        control_point_left: Some(relative(a.p2, a.p0.x, left_span, mid_value)),
        control_point_right: Some(relative(b.p1, x, right_span, mid_value)),
        reflect_control_points: false,
    };

    Some((left, mid, right))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframe.rs"]
mod tests;

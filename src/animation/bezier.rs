use crate::foundation::core::INDEX_EPSILON;

/// A point in `(frame index, value)` space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CurvePoint {
    pub(crate) x: f64,
    pub(crate) y: f64,
}

impl CurvePoint {
    pub(crate) fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// One cubic Bezier segment between two keyframes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CubicSegment {
    pub(crate) p0: CurvePoint,
    pub(crate) p1: CurvePoint,
    pub(crate) p2: CurvePoint,
    pub(crate) p3: CurvePoint,
}

/// Result of splitting a segment with De Casteljau's algorithm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SplitSegment {
    pub(crate) left: CubicSegment,
    pub(crate) right: CubicSegment,
}

impl CubicSegment {
    fn coord(a: f64, b: f64, c: f64, d: f64, t: f64) -> f64 {
        let omt = 1.0 - t;
        omt * omt * omt * a + 3.0 * omt * omt * t * b + 3.0 * omt * t * t * c + t * t * t * d
    }

    fn coord_derivative(a: f64, b: f64, c: f64, d: f64, t: f64) -> f64 {
        let omt = 1.0 - t;
        3.0 * omt * omt * (b - a) + 6.0 * omt * t * (c - b) + 3.0 * t * t * (d - c)
    }

    pub(crate) fn x_at(&self, t: f64) -> f64 {
        Self::coord(self.p0.x, self.p1.x, self.p2.x, self.p3.x, t)
    }

    pub(crate) fn y_at(&self, t: f64) -> f64 {
        Self::coord(self.p0.y, self.p1.y, self.p2.y, self.p3.y, t)
    }

    fn dx_at(&self, t: f64) -> f64 {
        Self::coord_derivative(self.p0.x, self.p1.x, self.p2.x, self.p3.x, t)
    }

    /// Solve the curve parameter whose x coordinate equals `x`.
    ///
    /// `x` is clamped into `[p0.x, p3.x]`. Newton-Raphson first, then bisection until the residual
    /// is below [`INDEX_EPSILON`].
    pub(crate) fn solve_t(&self, x: f64) -> f64 {
        if x <= self.p0.x {
            return 0.0;
        }
        if x >= self.p3.x {
            return 1.0;
        }

        let span = self.p3.x - self.p0.x;
        let mut t = ((x - self.p0.x) / span).clamp(0.0, 1.0);
        for _ in 0..8 {
            let err = self.x_at(t) - x;
            if err.abs() <= INDEX_EPSILON {
                return t;
            }
            let d = self.dx_at(t);
            if d.abs() < 1e-9 {
                break;
            }
            t = (t - err / d).clamp(0.0, 1.0);
        }

        // x(0) < x < x(1), so the sign change is bracketed by [0, 1].
        let mut lo = 0.0;
        let mut hi = 1.0;
        for _ in 0..64 {
            let err = self.x_at(t) - x;
            if err.abs() <= INDEX_EPSILON {
                break;
            }
            if err < 0.0 {
                lo = t;
            } else {
                hi = t;
            }
            t = 0.5 * (lo + hi);
        }
        t
    }

    /// Value of the curve at frame position `x`.
    pub(crate) fn value_at(&self, x: f64) -> f64 {
        self.y_at(self.solve_t(x))
    }

    /// Split at parameter `t`, preserving the curve geometry exactly.
    pub(crate) fn split(&self, t: f64) -> SplitSegment {
        let p01 = self.p0.lerp(self.p1, t);
        let p12 = self.p1.lerp(self.p2, t);
        let p23 = self.p2.lerp(self.p3, t);
        let p012 = p01.lerp(p12, t);
        let p123 = p12.lerp(p23, t);
        let mid = p012.lerp(p123, t);

        SplitSegment {
            left: CubicSegment {
                p0: self.p0,
                p1: p01,
                p2: p012,
                p3: mid,
            },
            right: CubicSegment {
                p0: mid,
                p1: p123,
                p2: p23,
                p3: self.p3,
            },
        }
    }
}

//! Cubic-Bezier timing curves.
//!
//! A curve is anchored at `(0, 0)` and `(1, 1)` and shaped by two interior
//! control points, the same parameterisation as CSS `cubic-bezier()`. Easing
//! maps normalised elapsed time onto eased progress by first solving the
//! curve's x-polynomial for the Bezier parameter and then sampling y there.

const NEWTON_ITERATIONS: usize = 4;
const NEWTON_MIN_SLOPE: f64 = 0.001;
const SUBDIVISION_PRECISION: f64 = 1e-7;
const SUBDIVISION_MAX_ITERATIONS: usize = 10;

/// A cubic-Bezier easing curve with precomputed polynomial coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}

impl CubicBezier {
    /// Strong ease-out used for lyric scrolling and line transitions.
    pub const SCROLL: Self = Self::new(0.22, 1.0, 0.36, 1.0);

    /// Exponential-style ease-out used by the interlude indicator transitions.
    pub const EXPO_OUT: Self = Self::new(0.19, 1.0, 0.22, 1.0);

    /// Build a curve from its two interior control points.
    #[must_use]
    pub const fn new(p1x: f64, p1y: f64, p2x: f64, p2y: f64) -> Self {
        let cx = 3.0 * p1x;
        let bx = 3.0 * p2x - 6.0 * p1x;
        let ax = 3.0 * p1x - 3.0 * p2x + 1.0;

        let cy = 3.0 * p1y;
        let by = 3.0 * p2y - 6.0 * p1y;
        let ay = 3.0 * p1y - 3.0 * p2y + 1.0;

        Self {
            ax,
            bx,
            cx,
            ay,
            by,
            cy,
        }
    }

    /// Map linear progress `t` in `[0, 1]` to eased progress.
    ///
    /// Inputs outside the unit interval are clamped.
    #[must_use]
    pub fn ease(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        self.sample_y(self.solve_x(t))
    }

    fn sample_x(&self, u: f64) -> f64 {
        ((self.ax * u + self.bx) * u + self.cx) * u
    }

    fn sample_y(&self, u: f64) -> f64 {
        ((self.ay * u + self.by) * u + self.cy) * u
    }

    fn sample_dx(&self, u: f64) -> f64 {
        (3.0 * self.ax * u + 2.0 * self.bx) * u + self.cx
    }

    /// Find `u` with `x(u) == x`: Newton-Raphson first, bisection if the
    /// slope is too flat or Newton has not converged.
    fn solve_x(&self, x: f64) -> f64 {
        let mut u = x;
        for _ in 0..NEWTON_ITERATIONS {
            let err = self.sample_x(u) - x;
            if err.abs() < SUBDIVISION_PRECISION {
                return u;
            }
            let slope = self.sample_dx(u);
            if slope.abs() < NEWTON_MIN_SLOPE {
                break;
            }
            u -= err / slope;
        }
        if (self.sample_x(u) - x).abs() < SUBDIVISION_PRECISION {
            return u;
        }

        let mut lo = 0.0;
        let mut hi = 1.0;
        u = x;
        for _ in 0..SUBDIVISION_MAX_ITERATIONS {
            let err = self.sample_x(u) - x;
            if err.abs() < SUBDIVISION_PRECISION {
                return u;
            }
            if err > 0.0 {
                hi = u;
            } else {
                lo = u;
            }
            u = (hi + lo) / 2.0;
        }
        u
    }
}

impl Default for CubicBezier {
    fn default() -> Self {
        Self::SCROLL
    }
}

/// Build a reusable easing function from four control-point parameters.
#[must_use]
pub fn make_easing(p1x: f64, p1y: f64, p2x: f64, p2y: f64) -> impl Fn(f64) -> f64 {
    let curve = CubicBezier::new(p1x, p1y, p2x, p2y);
    move |t| curve.ease(t)
}

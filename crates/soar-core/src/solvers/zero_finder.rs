//! Bounded one-dimensional searches.

const TOLERANCE: f64 = 1e-6;
const MAX_ITERATIONS: usize = 100;

/// Root of `f` in `[lower, upper]` by Brent's method. Returns `None` when
/// the bounds do not bracket a sign change.
pub fn find_zero<F>(mut f: F, lower: f64, upper: f64) -> Option<f64>
where
    F: FnMut(f64) -> f64,
{
    let (mut a, mut b) = (lower, upper);
    let (mut fa, mut fb) = (f(a), f(b));
    if fa == 0.0 {
        return Some(a);
    }
    if fb == 0.0 {
        return Some(b);
    }
    if fa.signum() == fb.signum() || !fa.is_finite() || !fb.is_finite() {
        return None;
    }

    let (mut c, mut fc) = (a, fa);
    let mut d = b - a;
    let mut e = d;
    for _ in 0..MAX_ITERATIONS {
        if fb.signum() == fc.signum() {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * TOLERANCE;
        let m = 0.5 * (c - b);
        if m.abs() <= tol || fb == 0.0 {
            return Some(b);
        }
        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * m * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * m * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            } else {
                p = -p;
            }
            if 2.0 * p < (3.0 * m * q - (tol * q).abs()).min((e * q).abs()) {
                e = d;
                d = p / q;
            } else {
                d = m;
                e = m;
            }
        } else {
            d = m;
            e = m;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(m) };
        fb = f(b);
    }
    Some(b)
}

/// Minimum of a unimodal `f` over `[lower, upper]` by golden-section search.
pub fn find_min<F>(mut f: F, lower: f64, upper: f64) -> f64
where
    F: FnMut(f64) -> f64,
{
    let ratio = (5.0_f64.sqrt() - 1.0) / 2.0;
    let (mut a, mut b) = (lower, upper);
    let mut x1 = b - ratio * (b - a);
    let mut x2 = a + ratio * (b - a);
    let mut f1 = f(x1);
    let mut f2 = f(x2);
    for _ in 0..MAX_ITERATIONS {
        if (b - a).abs() <= TOLERANCE {
            break;
        }
        if f1 <= f2 {
            b = x2;
            x2 = x1;
            f2 = f1;
            x1 = b - ratio * (b - a);
            f1 = f(x1);
        } else {
            a = x1;
            x1 = x2;
            f1 = f2;
            x2 = a + ratio * (b - a);
            f2 = f(x2);
        }
    }
    0.5 * (a + b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_zero_quadratic() {
        let root = find_zero(|x| x * x - 2.0, 0.0, 2.0).unwrap();
        assert!((root - 2.0_f64.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_find_zero_needs_bracket() {
        assert!(find_zero(|x| x * x + 1.0, -1.0, 1.0).is_none());
    }

    #[test]
    fn test_find_min_parabola() {
        let x = find_min(|x| (x - 0.3) * (x - 0.3), -1.0, 1.0);
        assert!((x - 0.3).abs() < 1e-5);
    }
}

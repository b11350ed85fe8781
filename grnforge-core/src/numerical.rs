//! Safeguarded Newton-Raphson root finding.

/// Finds a root of `funcd` bracketed by `x1` and `x2`.
///
/// `funcd` returns the function value and its first derivative. Newton steps are taken
/// while they stay inside the current bracket and shrink the residual fast enough;
/// otherwise the bracket is bisected. Iteration stops when a step is smaller than `xacc`
/// or after `max_iterations` steps, in which case the current estimate is returned.
///
/// The result always lies within `[min(x1, x2), max(x1, x2)]`. If the endpoints do not
/// bracket a sign change, the endpoint with the smaller residual is returned.
pub fn rtsafe<F>(funcd: F, x1: f64, x2: f64, xacc: f64, max_iterations: usize) -> f64
where
    F: Fn(f64) -> (f64, f64),
{
    let (fl, _) = funcd(x1);
    let (fh, _) = funcd(x2);
    if fl.abs() < 1e-12 {
        return x1;
    }
    if fh.abs() < 1e-12 {
        return x2;
    }
    if (fl > 0.0 && fh > 0.0) || (fl < 0.0 && fh < 0.0) {
        log::debug!("rtsafe: root not bracketed in [{}, {}]", x1, x2);
        return if fl.abs() < fh.abs() { x1 } else { x2 };
    }

    // orient so that f(xl) < 0 < f(xh)
    let (mut xl, mut xh) = if fl < 0.0 { (x1, x2) } else { (x2, x1) };
    let (lo, hi) = (x1.min(x2), x1.max(x2));

    let mut rts = 0.5 * (x1 + x2);
    let mut dxold = (x2 - x1).abs();
    let mut dx = dxold;
    let (mut f, mut df) = funcd(rts);

    for _ in 0..max_iterations {
        let newton_leaves_bracket = ((rts - xh) * df - f) * ((rts - xl) * df - f) > 0.0;
        let newton_too_slow = (2.0 * f).abs() > (dxold * df).abs();
        if newton_leaves_bracket || newton_too_slow {
            dxold = dx;
            dx = 0.5 * (xh - xl);
            rts = xl + dx;
            if xl == rts {
                return rts;
            }
        } else {
            dxold = dx;
            dx = f / df;
            let previous = rts;
            rts -= dx;
            if previous == rts {
                return rts.clamp(lo, hi);
            }
        }
        if dx.abs() < xacc {
            return rts.clamp(lo, hi);
        }
        let (nf, ndf) = funcd(rts);
        f = nf;
        df = ndf;
        if f < 0.0 {
            xl = rts;
        } else {
            xh = rts;
        }
    }
    rts.clamp(lo, hi)
}

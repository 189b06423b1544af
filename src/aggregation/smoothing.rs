//! Savitzky-Golay smoothing with a quadratic fit.
//!
//! Each interior point is replaced by the value of the least-squares parabola
//! through the window centred on it. The first and last half-windows are taken
//! from the parabolas fitted to the first and last full windows.

use log::warn;

pub const POLY_ORDER: usize = 2;

/// Smooths `series` with an odd `window` of at least 3 points.
///
/// Returns `None` (leave the series as it is) when the window is even, too
/// small for a quadratic, or longer than the series.
pub fn savgol_quadratic(series: &[f64], window: usize) -> Option<Vec<f64>> {
    if window % 2 == 0 || window <= POLY_ORDER || window > series.len() {
        warn!(
            "Skipping smoothing: window {} does not fit a series of {} points",
            window,
            series.len()
        );
        return None;
    }
    let half = window / 2;
    let n = series.len();
    let mut smoothed = Vec::with_capacity(n);

    let head = fit_quadratic(&series[..window])?;
    for i in 0..half {
        smoothed.push(head.at(i as f64 - half as f64));
    }
    for centre in half..n - half {
        let fit = fit_quadratic(&series[centre - half..=centre + half])?;
        smoothed.push(fit.at(0.0));
    }
    let tail = fit_quadratic(&series[n - window..])?;
    for i in n - half..n {
        smoothed.push(tail.at((i - (n - window)) as f64 - half as f64));
    }
    Some(smoothed)
}

/// `a + b*x + c*x^2`, with `x` measured from the centre of the fitted window.
struct Quadratic {
    a: f64,
    b: f64,
    c: f64,
}

impl Quadratic {
    fn at(&self, x: f64) -> f64 {
        self.a + self.b * x + self.c * x * x
    }
}

/// Least-squares quadratic through equally spaced points of an odd-length window.
fn fit_quadratic(window: &[f64]) -> Option<Quadratic> {
    let half = (window.len() / 2) as f64;
    // With x symmetric around zero the odd moments vanish, which decouples b.
    let (mut s0, mut s2, mut s4) = (0.0, 0.0, 0.0);
    let (mut t0, mut t1, mut t2) = (0.0, 0.0, 0.0);
    for (i, y) in window.iter().enumerate() {
        let x = i as f64 - half;
        let x2 = x * x;
        s0 += 1.0;
        s2 += x2;
        s4 += x2 * x2;
        t0 += y;
        t1 += x * y;
        t2 += x2 * y;
    }
    let det = s0 * s4 - s2 * s2;
    if det == 0.0 || s2 == 0.0 {
        return None;
    }
    Some(Quadratic {
        a: (t0 * s4 - t2 * s2) / det,
        b: t1 / s2,
        c: (s0 * t2 - s2 * t0) / det,
    })
}

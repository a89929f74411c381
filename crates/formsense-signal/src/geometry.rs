//! Planar joint-angle geometry.
//!
//! Pose landmarks arrive in normalized image coordinates; the angles the
//! exercise profiles track are measured in the image plane, which is what
//! a physiotherapy camera setup observes (subject side-on or front-on to
//! the lens). Depth components, when present, are ignored.

/// Angle at vertex `b` formed by the rays `b -> a` and `b -> c`, in
/// degrees within [0, 180].
///
/// The reflex angle is folded back so the result is orientation-free:
/// a fully extended limb reads near 180°, a fully flexed one near 0°.
#[must_use]
pub fn angle_at(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    let rad = (c.1 - b.1).atan2(c.0 - b.0) - (a.1 - b.1).atan2(a.0 - b.0);
    let mut deg = rad.to_degrees().abs();
    if deg > 180.0 {
        deg = 360.0 - deg;
    }
    deg
}

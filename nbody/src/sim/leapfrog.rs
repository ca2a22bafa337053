//! Leapfrog update kernels, applied per body range by the integration wave.
//!
//! Velocities live half a step behind positions: `initialize` shifts them
//! back by `a * dt / 2`, after which every step kicks with the current
//! acceleration and then drifts with the updated velocity.

/// Shift velocities onto the half step: `v -= a * dt / 2`.
pub fn stagger(vx: &mut [f32], vy: &mut [f32], ax: &[f32], ay: &[f32], dt: f32) {
    let half_dt = 0.5 * dt;
    for (v, a) in vx.iter_mut().zip(ax) {
        *v -= a * half_dt;
    }
    for (v, a) in vy.iter_mut().zip(ay) {
        *v -= a * half_dt;
    }
}

/// One leapfrog step for a block of bodies: kick `v += a * dt`, then drift
/// `x += v * dt` with the kicked velocity.
pub fn kick_drift(
    x: &mut [f32],
    y: &mut [f32],
    vx: &mut [f32],
    vy: &mut [f32],
    ax: &[f32],
    ay: &[f32],
    dt: f32,
) {
    debug_assert!(x.len() == vx.len() && x.len() == ax.len());
    let positions = x.iter_mut().zip(y.iter_mut());
    let velocities = vx.iter_mut().zip(vy.iter_mut());
    let accelerations = ax.iter().zip(ay);
    for (((x, y), (vx, vy)), (ax, ay)) in positions.zip(velocities).zip(accelerations) {
        *vx += ax * dt;
        *vy += ay * dt;

        *x += *vx * dt;
        *y += *vy * dt;
    }
}

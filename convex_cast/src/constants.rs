/// Default CCD tolerance (meters) used when a caller has no better value.
///
/// Sweeps report contact at zero separation regardless of this value; it
/// widens the contact search that recovers hit point and normal.
pub const DEFAULT_ALLOWED_PENETRATION: f32 = 0.01;

/// Squared translation (m^2) below which a sweep is treated as zero-length.
pub const MIN_SWEEP_SQ: f32 = 1.0e-10;

/// Rotation angle (radians) below which start/end orientations are considered equal.
///
/// Sweeps whose orientations differ by more than this use the non-linear cast.
pub const ROTATION_EPS: f32 = 1.0e-6;

/// Prediction distance (meters) for the contact query that recovers the hit
/// point and normal at the time of impact.
pub const CONTACT_PREDICTION: f32 = 0.05;

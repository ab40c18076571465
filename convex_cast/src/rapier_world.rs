//! Rapier-based query world for static geometry, and the sweep/overlap queries
//! the cast adapter issues against it.
//!
//! Design goals
//! - Deterministic: given the same inputs (sorted by `id`), build identical in-memory sets.
//! - Query-only: no dynamics are stepped; the broad phase is built once for scene queries.
//! - Immutable world: statics do not move after construction.

// Re-export Rapier so downstream crates can name handles and shapes
// without needing to depend on `rapier3d` directly.
pub use rapier3d;

use log::trace;
use rapier3d::{
    parry::{
        query::{self, NonlinearRigidMotion, ShapeCastOptions},
        shape::Shape,
    },
    prelude::*,
};

use crate::{
    bridge::{point_from_na, vector_from_na},
    cast::CastHit,
    constants::{CONTACT_PREDICTION, ROTATION_EPS},
    filter::CastFilter,
    rapier::{WorldStaticDef, collider_from_def},
    shape::CastShape,
};

/// The physics-world seam used by [`ConvexCaster`](crate::ConvexCaster).
///
/// Poses are the caller's poses; implementors apply the shape's local frame.
pub trait SweepWorld {
    /// Sweep `shape` from `from` to `to` and return the earliest hit, if any.
    ///
    /// A hit is the first time of contact (zero separation) along the path.
    /// `allowed_penetration` never turns a gap into a hit; it only widens the
    /// contact search used to recover hit details at the time of impact.
    fn sweep(
        &self,
        shape: &CastShape,
        from: &Isometry<Real>,
        to: &Isometry<Real>,
        filter: &CastFilter,
        allowed_penetration: f32,
    ) -> Option<CastHit>;

    /// Static overlap test of `shape` placed at `pose`.
    fn overlap(&self, shape: &CastShape, pose: &Isometry<Real>, filter: &CastFilter)
    -> Option<CastHit>;
}

/// In-memory Rapier structures needed for scene queries against a static world.
///
/// For immutable statics, these can be built once at startup and reused.
pub struct QueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
}

impl QueryWorld {
    /// Build a query world from a list of static collider definitions.
    ///
    /// The input is sorted by `id` before insertion. NaN/invalid values should
    /// be filtered by the caller.
    pub fn build(defs: impl IntoIterator<Item = WorldStaticDef>) -> Self {
        let mut defs: Vec<WorldStaticDef> = defs.into_iter().collect();
        defs.sort_by_key(|d| d.id);

        let bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut modified_colliders = Vec::with_capacity(defs.len());

        for def in &defs {
            let co_handle = colliders.insert(collider_from_def(def));
            modified_colliders.push(co_handle);
        }

        let mut broad_phase = BroadPhaseBvh::new();
        let mut events = Vec::new();
        broad_phase.update(
            &IntegrationParameters::default(),
            &colliders,
            &bodies,
            &modified_colliders,
            &[],
            &mut events,
        );

        log::debug!("built query world with {} statics", colliders.len());

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase: NarrowPhase::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colliders.len() == 0
    }

    /// Look up the collider a [`CastHit`] refers to.
    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    /// Create a borrowed `QueryPipeline` view suitable for scene queries.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Fill in point/normal for a hit on `handle` with the swept shape at `pose`.
    fn describe_hit(
        &self,
        handle: ColliderHandle,
        shape: &dyn Shape,
        pose: &Isometry<Real>,
        motion: &Vector<Real>,
        fraction: f32,
        prediction: f32,
    ) -> CastHit {
        let collider = self.colliders.get(handle);
        let contact = collider.and_then(|co| {
            query::contact(pose, shape, co.position(), co.shape(), prediction)
                .ok()
                .flatten()
        });

        let (point, normal) = match contact {
            // `normal2` is the outward normal of the struck collider.
            Some(c) => (point_from_na(&c.point2), vector_from_na(&c.normal2)),
            None => {
                trace!("no contact at time of impact for {handle:?}, using sweep direction");
                let dir = vector_from_na(motion).normalize_or_zero();
                (vector_from_na(&pose.translation.vector), -dir)
            }
        };

        CastHit {
            collider: handle,
            body: collider.and_then(|co| co.parent()),
            fraction,
            point,
            normal,
            distance: fraction * motion.norm(),
        }
    }
}

impl SweepWorld for QueryWorld {
    fn sweep(
        &self,
        shape: &CastShape,
        from: &Isometry<Real>,
        to: &Isometry<Real>,
        filter: &CastFilter,
        allowed_penetration: f32,
    ) -> Option<CastHit> {
        let start = shape.placed(from);
        let end = shape.placed(to);
        let linvel = end.translation.vector - start.translation.vector;
        let delta_rot = end.rotation * start.rotation.inverse();

        let pipeline =
            self.query_pipeline(QueryFilter::default().groups(filter.interaction_groups()));

        let (handle, impact_pose, fraction) = if delta_rot.angle() <= ROTATION_EPS {
            // Contact at zero separation, matching the non-linear cast below.
            let mut opts = ShapeCastOptions::with_max_time_of_impact(1.0);
            opts.target_distance = 0.0;
            opts.stop_at_penetration = true;

            let (handle, hit) = pipeline.cast_shape(&start, &linvel, shape.shape(), opts)?;
            let toi = hit.time_of_impact;
            let pose = Isometry::from_parts(
                (start.translation.vector + linvel * toi).into(),
                start.rotation,
            );
            (handle, pose, toi)
        } else {
            // Rotate about the shape origin while translating.
            let motion =
                NonlinearRigidMotion::new(start, Point::origin(), linvel, delta_rot.scaled_axis());
            let (handle, hit) =
                pipeline.cast_shape_nonlinear(&motion, shape.shape(), 0.0, 1.0, true)?;
            let toi = hit.time_of_impact;
            (handle, motion.position_at_time(toi), toi)
        };

        Some(self.describe_hit(
            handle,
            shape.shape(),
            &impact_pose,
            &linvel,
            fraction,
            CONTACT_PREDICTION + allowed_penetration,
        ))
    }

    fn overlap(
        &self,
        shape: &CastShape,
        pose: &Isometry<Real>,
        filter: &CastFilter,
    ) -> Option<CastHit> {
        let placed = shape.placed(pose);
        let pipeline =
            self.query_pipeline(QueryFilter::default().groups(filter.interaction_groups()));
        let (handle, _) = pipeline.intersect_shape(placed, shape.shape()).next()?;

        Some(self.describe_hit(
            handle,
            shape.shape(),
            &placed,
            &Vector::zeros(),
            0.0,
            CONTACT_PREDICTION,
        ))
    }
}

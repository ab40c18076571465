//! Convex casts against a physics world.
//!
//! [`ConvexCaster`] is the single entry point for sweeping a convex shape
//! between two poses. It borrows the world it queries and keeps no other
//! state, so casts can be issued re-entrantly or from several threads.
//!
//! The convenience casts (`sphere_cast`, `box_cast`, ...) build one fresh
//! [`CastShape`], forward to [`ConvexCaster::convex_cast`] and drop the shape
//! before returning.

use glam::Vec3;
use log::{debug, warn};
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

use crate::{
    bridge::Pose,
    constants::{DEFAULT_ALLOWED_PENETRATION, MIN_SWEEP_SQ, ROTATION_EPS},
    error::CastError,
    filter::CastFilter,
    rapier_world::{QueryWorld, SweepWorld},
    shape::{CastShape, Orientation, ShapeDef},
};

/// Everything a cast needs besides the shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastQuery {
    pub start: Pose,
    pub end: Pose,
    pub filter: CastFilter,
    /// CCD overlap tolerance in meters; see [`DEFAULT_ALLOWED_PENETRATION`].
    /// A positive value never makes a near miss count as a hit.
    pub allowed_penetration: f32,
}

impl CastQuery {
    pub fn new(start: Pose, end: Pose) -> Self {
        Self {
            start,
            end,
            filter: CastFilter::ALL,
            allowed_penetration: DEFAULT_ALLOWED_PENETRATION,
        }
    }

    /// Pure translation from `from` to `to` with identity orientation.
    pub fn linear(from: Vec3, to: Vec3) -> Self {
        Self::new(Pose::from_position(from), Pose::from_position(to))
    }

    pub fn with_filter(mut self, filter: CastFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_allowed_penetration(mut self, allowed_penetration: f32) -> Self {
        self.allowed_penetration = allowed_penetration;
        self
    }

    /// True when start and end poses coincide, i.e. there is nothing to sweep.
    pub fn is_zero_length(&self) -> bool {
        let moved_sq = self.start.position.distance_squared(self.end.position);
        let turned = self.start.rotation.angle_between(self.end.rotation);
        moved_sq <= MIN_SWEEP_SQ && turned <= ROTATION_EPS
    }

    fn sanitized_penetration(&self) -> f32 {
        let p = self.allowed_penetration;
        if p.is_finite() && p >= 0.0 {
            p
        } else {
            warn!("allowed penetration {p} is not a finite non-negative value, using 0");
            0.0
        }
    }
}

/// Details of the earliest hit along a sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastHit {
    /// Collider that was struck.
    pub collider: ColliderHandle,
    /// Rigid body the collider is attached to, if any.
    pub body: Option<RigidBodyHandle>,
    /// Fraction of the sweep (0..=1) at which the hit occurs.
    pub fraction: f32,
    /// World-space contact point on the struck collider.
    pub point: Vec3,
    /// World-space surface normal of the struck collider at `point`.
    pub normal: Vec3,
    /// Distance travelled before the hit (meters).
    pub distance: f32,
}

/// Result of a cast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CastOutcome {
    Hit(CastHit),
    NoHit,
    /// No physics world was available; nothing was tested.
    WorldUnavailable,
}

impl CastOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, CastOutcome::Hit(_))
    }

    pub fn hit(&self) -> Option<&CastHit> {
        match self {
            CastOutcome::Hit(hit) => Some(hit),
            _ => None,
        }
    }

    /// Hit/no-hit as a boolean, or `None` when no world was available.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CastOutcome::Hit(_) => Some(true),
            CastOutcome::NoHit => Some(false),
            CastOutcome::WorldUnavailable => None,
        }
    }
}

impl From<Option<CastHit>> for CastOutcome {
    fn from(hit: Option<CastHit>) -> Self {
        hit.map_or(CastOutcome::NoHit, CastOutcome::Hit)
    }
}

/// Issues convex casts against a borrowed physics world.
pub struct ConvexCaster<'w, W: SweepWorld = QueryWorld> {
    world: Option<&'w W>,
}

impl<W: SweepWorld> Clone for ConvexCaster<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W: SweepWorld> Copy for ConvexCaster<'_, W> {}

impl<'w, W: SweepWorld> ConvexCaster<'w, W> {
    pub fn new(world: &'w W) -> Self {
        Self { world: Some(world) }
    }

    /// A caster with no world: every cast reports [`CastOutcome::WorldUnavailable`].
    pub fn unavailable() -> Self {
        Self { world: None }
    }

    pub fn from_option(world: Option<&'w W>) -> Self {
        Self { world }
    }

    pub fn has_world(&self) -> bool {
        self.world.is_some()
    }

    /// Sweep `shape` from `query.start` to `query.end`.
    ///
    /// A zero-length sweep is answered with a static overlap test at the start pose.
    pub fn convex_cast(&self, shape: &CastShape, query: &CastQuery) -> CastOutcome {
        let Some(world) = self.world else {
            debug!("convex cast skipped: no physics world");
            return CastOutcome::WorldUnavailable;
        };

        let from = query.start.to_isometry();
        let outcome: CastOutcome = if query.is_zero_length() {
            world.overlap(shape, &from, &query.filter).into()
        } else {
            let to = query.end.to_isometry();
            world
                .sweep(
                    shape,
                    &from,
                    &to,
                    &query.filter,
                    query.sanitized_penetration(),
                )
                .into()
        };

        debug!(
            "convex cast {:?} from {} to {}: {}",
            shape.shared().shape_type(),
            query.start.position,
            query.end.position,
            match &outcome {
                CastOutcome::Hit(hit) => format!(
                    "hit {:?} at fraction {:.4}, point {}",
                    hit.collider, hit.fraction, hit.point
                ),
                _ => "no hit".to_owned(),
            }
        );
        outcome
    }

    /// Cone of base `radius` and full `height` around `orientation` (`None` = Up).
    pub fn cone_cast(
        &self,
        radius: f32,
        height: f32,
        orientation: Orientation,
        query: &CastQuery,
    ) -> Result<CastOutcome, CastError> {
        let shape = CastShape::cone(radius, height, orientation)?;
        Ok(self.convex_cast(&shape, query))
    }

    pub fn sphere_cast(
        &self,
        radius: f32,
        margin: f32,
        query: &CastQuery,
    ) -> Result<CastOutcome, CastError> {
        let shape = CastShape::sphere(radius, margin)?;
        Ok(self.convex_cast(&shape, query))
    }

    pub fn box_cast(
        &self,
        half_extents: Vec3,
        margin: f32,
        query: &CastQuery,
    ) -> Result<CastOutcome, CastError> {
        let shape = CastShape::cuboid(half_extents, margin)?;
        Ok(self.convex_cast(&shape, query))
    }

    /// Cylinder given by half-extents around `orientation` (`None` = Up).
    pub fn cylinder_cast(
        &self,
        half_extents: Vec3,
        orientation: Orientation,
        query: &CastQuery,
    ) -> Result<CastOutcome, CastError> {
        let shape = CastShape::cylinder(half_extents, orientation)?;
        Ok(self.convex_cast(&shape, query))
    }

    pub fn capsule_cast(
        &self,
        radius: f32,
        height: f32,
        margin: f32,
        query: &CastQuery,
    ) -> Result<CastOutcome, CastError> {
        let shape = CastShape::capsule(radius, height, margin)?;
        Ok(self.convex_cast(&shape, query))
    }

    /// Convex hull of `points`.
    pub fn shape_cast(&self, points: &[Vec3], query: &CastQuery) -> Result<CastOutcome, CastError> {
        let shape = CastShape::convex_hull(points)?;
        Ok(self.convex_cast(&shape, query))
    }

    pub fn shape_def_cast(
        &self,
        def: &ShapeDef,
        query: &CastQuery,
    ) -> Result<CastOutcome, CastError> {
        let shape = def.build()?;
        Ok(self.convex_cast(&shape, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filter::{CollisionLayer, FlagBitmask},
        rapier::{StaticShapeDef, WorldStaticDef},
    };
    use rapier3d::{
        na::UnitQuaternion,
        prelude::{SharedShape, Vector},
    };
    use std::sync::Arc;

    /// Static box centered at the origin with half-extents (1, 1, 1).
    fn unit_box_world() -> QueryWorld {
        QueryWorld::build([WorldStaticDef::new(
            1,
            Vector::zeros(),
            UnitQuaternion::identity(),
            StaticShapeDef::Cuboid {
                half_extents: Vector::new(1.0, 1.0, 1.0),
            },
        )
        .with_groups(CollisionLayer::Default.mask(), u32::MAX)])
    }

    fn all_shape_defs() -> Vec<ShapeDef> {
        vec![
            ShapeDef::Cone {
                radius: 0.4,
                height: 0.8,
                orientation: Orientation::Up,
            },
            ShapeDef::Sphere {
                radius: 0.4,
                margin: 0.0,
            },
            ShapeDef::Box {
                half_extents: Vec3::splat(0.4),
                margin: 0.0,
            },
            ShapeDef::Cylinder {
                half_extents: Vec3::new(0.4, 0.4, 0.4),
                orientation: Orientation::Right,
            },
            ShapeDef::Capsule {
                radius: 0.3,
                height: 0.4,
                margin: 0.0,
            },
            ShapeDef::ConvexHull {
                points: vec![
                    Vec3::new(-0.4, -0.4, -0.4),
                    Vec3::new(0.4, -0.4, -0.4),
                    Vec3::new(0.0, -0.4, 0.4),
                    Vec3::new(0.0, 0.4, 0.0),
                ],
            },
        ]
    }

    /// Dispatch through the named convenience cast for `def`.
    fn convenience_cast(
        caster: &ConvexCaster<'_>,
        def: &ShapeDef,
        query: &CastQuery,
    ) -> Result<CastOutcome, CastError> {
        match def {
            ShapeDef::Cone {
                radius,
                height,
                orientation,
            } => caster.cone_cast(*radius, *height, *orientation, query),
            ShapeDef::Sphere { radius, margin } => caster.sphere_cast(*radius, *margin, query),
            ShapeDef::Box {
                half_extents,
                margin,
            } => caster.box_cast(*half_extents, *margin, query),
            ShapeDef::Cylinder {
                half_extents,
                orientation,
            } => caster.cylinder_cast(*half_extents, *orientation, query),
            ShapeDef::Capsule {
                radius,
                height,
                margin,
            } => caster.capsule_cast(*radius, *height, *margin, query),
            ShapeDef::ConvexHull { points } => caster.shape_cast(points, query),
        }
    }

    #[test]
    fn sphere_falling_through_box_hits() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);
        let query = CastQuery::linear(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0))
            .with_filter(CastFilter::ALL)
            .with_allowed_penetration(0.01);

        let outcome = caster.sphere_cast(0.5, 0.0, &query).unwrap();
        assert_eq!(outcome.as_bool(), Some(true));

        let hit = outcome.hit().expect("hit details");
        assert!(hit.fraction > 0.3 && hit.fraction < 0.36, "fraction {}", hit.fraction);
        assert!(hit.normal.y > 0.99, "normal {}", hit.normal);
        assert!(hit.body.is_none());
    }

    #[test]
    fn box_sweeping_beside_obstacle_misses() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);
        let query = CastQuery::linear(Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 5.0, 0.0))
            .with_filter(CastFilter::ALL)
            .with_allowed_penetration(0.01);

        let outcome = caster.box_cast(Vec3::splat(0.1), 0.0, &query).unwrap();
        assert_eq!(outcome, CastOutcome::NoHit);
        assert_eq!(outcome.as_bool(), Some(false));
    }

    #[test]
    fn missing_world_is_reported_distinctly() {
        let caster = ConvexCaster::<QueryWorld>::unavailable();
        assert!(!caster.has_world());

        let query = CastQuery::linear(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0));
        let shape = CastShape::sphere(0.5, 0.0).unwrap();

        let outcome = caster.convex_cast(&shape, &query);
        assert_eq!(outcome, CastOutcome::WorldUnavailable);
        assert_eq!(outcome.as_bool(), None);
        assert!(!outcome.is_hit());

        // Convenience casts propagate the same signal rather than an error.
        assert_eq!(
            caster.sphere_cast(0.5, 0.0, &query),
            Ok(CastOutcome::WorldUnavailable)
        );
    }

    #[test]
    fn zero_length_sweep_matches_static_overlap() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);

        for def in all_shape_defs() {
            let shape = def.build().unwrap();
            for position in [Vec3::new(0.0, 1.2, 0.0), Vec3::new(0.0, 4.0, 0.0)] {
                let pose = Pose::from_position(position);
                let query = CastQuery::new(pose, pose);
                assert!(query.is_zero_length());

                let overlap = world
                    .overlap(&shape, &pose.to_isometry(), &query.filter)
                    .is_some();
                let outcome = convenience_cast(&caster, &def, &query).unwrap();
                assert_eq!(outcome.as_bool(), Some(overlap), "{def:?} at {position}");
            }
        }
    }

    #[test]
    fn every_convenience_cast_hits_when_sweeping_through() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);
        let query = CastQuery::linear(Vec3::new(-6.0, 0.0, 0.0), Vec3::new(6.0, 0.0, 0.0));

        for def in all_shape_defs() {
            let outcome = convenience_cast(&caster, &def, &query).unwrap();
            assert!(outcome.is_hit(), "{def:?}");
            assert_eq!(
                caster.shape_def_cast(&def, &query).unwrap().as_bool(),
                Some(true)
            );
        }
    }

    #[test]
    fn orientation_none_matches_up() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);
        let query = CastQuery::linear(Vec3::new(0.0, 6.0, 0.3), Vec3::new(0.0, -6.0, 0.3));

        let none = caster.cone_cast(0.5, 1.0, Orientation::None, &query).unwrap();
        let up = caster.cone_cast(0.5, 1.0, Orientation::Up, &query).unwrap();
        assert_eq!(none, up);

        let he = Vec3::new(0.3, 0.6, 0.3);
        let none = caster.cylinder_cast(he, Orientation::None, &query).unwrap();
        let up = caster.cylinder_cast(he, Orientation::Up, &query).unwrap();
        assert_eq!(none, up);
    }

    #[test]
    fn cylinder_orientation_changes_reach() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);
        // Slides along Z, 1.5 m above the box top.
        let query = CastQuery::linear(Vec3::new(0.0, 2.5, -6.0), Vec3::new(0.0, 2.5, 6.0));
        let he = Vec3::new(0.1, 2.0, 0.1);

        // Up: 2 m half height along Y reaches down to y = 0.5.
        assert!(caster.cylinder_cast(he, Orientation::Up, &query).unwrap().is_hit());
        // Right: 2 m radius (from y) in the YZ plane also reaches the box.
        assert!(caster.cylinder_cast(he, Orientation::Right, &query).unwrap().is_hit());
        // Back: radius and half height are both 0.1, passing well above the box.
        assert!(!caster.cylinder_cast(he, Orientation::Back, &query).unwrap().is_hit());
    }

    #[test]
    fn invalid_orientation_builds_nothing() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);
        let query = CastQuery::linear(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0));

        let result = Orientation::try_from(9)
            .and_then(|orientation| caster.cone_cast(0.5, 1.0, orientation, &query));
        assert_eq!(result, Err(CastError::InvalidOrientation(9)));

        let result = Orientation::try_from(42).and_then(|orientation| {
            caster.cylinder_cast(Vec3::splat(0.5), orientation, &query)
        });
        assert_eq!(result, Err(CastError::InvalidOrientation(42)));
    }

    #[test]
    fn bad_shape_parameters_fail_before_casting() {
        let caster = ConvexCaster::<QueryWorld>::unavailable();
        let query = CastQuery::linear(Vec3::ZERO, Vec3::X);

        // Construction errors win over the missing world.
        assert!(matches!(
            caster.sphere_cast(-1.0, 0.0, &query),
            Err(CastError::ShapeConstruction { shape: "sphere", .. })
        ));
        assert!(matches!(
            caster.shape_cast(&[Vec3::ZERO, Vec3::X], &query),
            Err(CastError::ShapeConstruction {
                shape: "convex hull",
                ..
            })
        ));
    }

    #[test]
    fn caster_does_not_retain_shapes() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);
        let shape = CastShape::from_shared(SharedShape::ball(0.5)).unwrap();
        let query = CastQuery::linear(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0));

        let before = Arc::strong_count(&shape.shared().0);
        for _ in 0..3 {
            assert!(caster.convex_cast(&shape, &query).is_hit());
        }
        assert_eq!(Arc::strong_count(&shape.shared().0), before);
    }

    #[test]
    fn filter_mask_excludes_obstacle() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);
        let base = CastQuery::linear(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0));

        let skip_default = base.with_filter(CastFilter::with_layers(
            &[CollisionLayer::Dynamic],
            &[CollisionLayer::Default],
        ));
        assert_eq!(
            caster.sphere_cast(0.5, 0.0, &skip_default).unwrap(),
            CastOutcome::NoHit
        );

        let only_default = base.with_filter(CastFilter::with_layers(
            &[CollisionLayer::Default],
            &[CollisionLayer::Projectile],
        ));
        assert!(caster.sphere_cast(0.5, 0.0, &only_default).unwrap().is_hit());
    }

    #[test]
    fn invalid_penetration_falls_back_to_zero() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);
        let query = CastQuery::linear(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0))
            .with_allowed_penetration(f32::NAN);

        assert!(caster.sphere_cast(0.5, 0.0, &query).unwrap().is_hit());
    }

    #[test]
    fn near_miss_is_not_a_hit_on_either_sweep_path() {
        let world = unit_box_world();
        let caster = ConvexCaster::new(&world);
        // Ball bottom passes 5 mm above the box top.
        let start = Pose::from_position(Vec3::new(-5.0, 1.505, 0.0));
        let end = Pose::from_position(Vec3::new(5.0, 1.505, 0.0));
        let turned = Pose::new(end.position, glam::Quat::from_rotation_y(0.01));

        let linear = CastQuery::new(start, end).with_allowed_penetration(0.01);
        let rotating = CastQuery::new(start, turned).with_allowed_penetration(0.01);

        let linear = caster.sphere_cast(0.5, 0.0, &linear).unwrap();
        let rotating = caster.sphere_cast(0.5, 0.0, &rotating).unwrap();
        assert_eq!(linear.as_bool(), rotating.as_bool());
        assert_eq!(linear, CastOutcome::NoHit);
        assert_eq!(rotating, CastOutcome::NoHit);
    }

    #[test]
    fn rotation_only_sweep_is_not_zero_length() {
        let start = Pose::IDENTITY;
        let end = Pose::new(Vec3::ZERO, glam::Quat::from_rotation_z(0.5));
        assert!(!CastQuery::new(start, end).is_zero_length());
        assert!(CastQuery::new(start, start).is_zero_length());
    }
}

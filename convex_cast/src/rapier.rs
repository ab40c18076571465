use rapier3d::{na::UnitQuaternion, prelude::*};

use crate::filter::CastFilter;

/// Canonical definition of an immutable world collider.
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vector<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    /// Collider shape parameters.
    pub shape: StaticShapeDef,
    /// Layers this collider belongs to.
    pub memberships: u32,
    /// Layers this collider accepts interactions from.
    pub filter: u32,
}

impl WorldStaticDef {
    /// A static on every layer, accepting every cast.
    pub fn new(
        id: u32,
        translation: Vector<f32>,
        rotation: UnitQuaternion<f32>,
        shape: StaticShapeDef,
    ) -> Self {
        Self {
            id,
            translation,
            rotation,
            shape,
            memberships: u32::MAX,
            filter: u32::MAX,
        }
    }

    pub fn with_groups(mut self, memberships: u32, filter: u32) -> Self {
        self.memberships = memberships;
        self.filter = filter;
        self
    }

    fn interaction_groups(&self) -> InteractionGroups {
        // A static's memberships/filter have the same layout as a cast's group/mask.
        CastFilter::new(self.filter, self.memberships).interaction_groups()
    }
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum StaticShapeDef {
    /// Infinite plane (half-space).
    ///
    /// The plane normal is derived from the pose as `rotation * +Y`.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },

    /// Y-aligned cone (meters).
    ConeY { radius: f32, half_height: f32 },

    /// Rounded cuboid (meters).
    ///
    /// `border_radius` rounds all edges/corners.
    RoundCuboid {
        half_extents: Vector<f32>,
        border_radius: f32,
    },
}

/// Build a Rapier collider from a `WorldStaticDef`.
///
/// Colliders are parentless: the collider itself carries the world pose and the
/// static's collision groups.
pub fn collider_from_def(def: &WorldStaticDef) -> Collider {
    let builder = match &def.shape {
        StaticShapeDef::Plane {
            offset_along_normal,
        } => {
            // n = R * +Y; the plane is n ⋅ x = n ⋅ t + offset.
            let n = def.rotation * Vector::y();
            let dist = n.dot(&def.translation) + *offset_along_normal;
            let unit_n = UnitVector::new_normalize(n);

            // The half-space is placed at `unit_n * dist` with an identity rotation.
            return ColliderBuilder::new(SharedShape::new(HalfSpace::new(unit_n)))
                .translation(unit_n.into_inner() * dist)
                .collision_groups(def.interaction_groups())
                .build();
        }

        StaticShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }

        StaticShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),

        StaticShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),

        StaticShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius),

        StaticShapeDef::ConeY {
            radius,
            half_height,
        } => ColliderBuilder::cone(*half_height, *radius),

        StaticShapeDef::RoundCuboid {
            half_extents,
            border_radius,
        } => ColliderBuilder::round_cuboid(
            half_extents.x,
            half_extents.y,
            half_extents.z,
            *border_radius,
        ),
    };

    let mut collider = builder.collision_groups(def.interaction_groups()).build();
    collider.set_position(Isometry::from_parts(def.translation.into(), def.rotation));
    collider
}

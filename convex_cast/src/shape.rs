use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use rapier3d::{
    na::UnitQuaternion,
    parry::shape::{Shape, SharedShape},
    prelude::*,
};

use crate::{bridge::point_to_na, error::CastError};

/// Axis a cone or cylinder is built around.
///
/// `None` is accepted wherever an orientation is optional and resolves to `Up`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    None = 0,
    /// Around +Y.
    Up = 1,
    /// Around +X.
    Right = 2,
    /// Around +Z.
    Back = 3,
}

impl Orientation {
    /// Collapse `None` to `Up`.
    #[inline]
    pub fn resolve(self) -> Self {
        match self {
            Orientation::None => Orientation::Up,
            other => other,
        }
    }

    /// Local rotation taking the Y-aligned Rapier primitive onto this axis.
    fn local_rotation(self) -> UnitQuaternion<f32> {
        match self.resolve() {
            Orientation::Right => UnitQuaternion::from_axis_angle(&Vector::z_axis(), -FRAC_PI_2),
            Orientation::Back => UnitQuaternion::from_axis_angle(&Vector::x_axis(), FRAC_PI_2),
            _ => UnitQuaternion::identity(),
        }
    }
}

impl TryFrom<u8> for Orientation {
    type Error = CastError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Orientation::None),
            1 => Ok(Orientation::Up),
            2 => Ok(Orientation::Right),
            3 => Ok(Orientation::Back),
            other => Err(CastError::InvalidOrientation(other)),
        }
    }
}

/// An owned, convex shape ready to be swept.
///
/// The geometry is a ref-counted Rapier [`SharedShape`]; it is released when the
/// last `CastShape` pointing at it is dropped. Build one once and reuse it across
/// casts, or let the convenience casts build and drop one per call.
#[derive(Clone)]
pub struct CastShape {
    shape: SharedShape,
    local_rotation: UnitQuaternion<f32>,
    margin: f32,
}

impl std::fmt::Debug for CastShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CastShape")
            .field("shape_type", &self.shape.shape_type())
            .field("local_rotation", &self.local_rotation)
            .field("margin", &self.margin)
            .finish()
    }
}

impl CastShape {
    /// Wrap a caller-built Rapier shape. Only convex shapes can be swept.
    pub fn from_shared(shape: SharedShape) -> Result<Self, CastError> {
        if !shape.is_convex() {
            return Err(CastError::NonConvexShape);
        }
        Ok(Self {
            shape,
            local_rotation: UnitQuaternion::identity(),
            margin: 0.0,
        })
    }

    pub fn shape(&self) -> &dyn Shape {
        &*self.shape
    }

    pub fn shared(&self) -> &SharedShape {
        &self.shape
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    /// World isometry of the Rapier primitive for a caller pose `iso`.
    #[inline]
    pub fn placed(&self, iso: &Isometry<Real>) -> Isometry<Real> {
        Isometry::from_parts(iso.translation, iso.rotation * self.local_rotation)
    }

    fn oriented(shape: SharedShape, orientation: Orientation, margin: f32) -> Self {
        Self {
            shape,
            local_rotation: orientation.local_rotation(),
            margin,
        }
    }

    /// Cone of the given base `radius` and full `height`, around `orientation`.
    pub fn cone(radius: f32, height: f32, orientation: Orientation) -> Result<Self, CastError> {
        positive("cone", "radius", radius)?;
        positive("cone", "height", height)?;
        let shape = SharedShape::cone(height * 0.5, radius);
        Ok(Self::oriented(shape, orientation, 0.0))
    }

    /// Sphere of `radius`. A ball is already fully rounded, so `margin` does
    /// not change the geometry; it is validated and recorded.
    pub fn sphere(radius: f32, margin: f32) -> Result<Self, CastError> {
        positive("sphere", "radius", radius)?;
        margin_within("sphere", margin, radius)?;
        Ok(Self::oriented(SharedShape::ball(radius), Orientation::Up, margin))
    }

    /// Box with the given half-extents. A non-zero `margin` rounds edges and
    /// corners while keeping the outer extents.
    pub fn cuboid(half_extents: Vec3, margin: f32) -> Result<Self, CastError> {
        positive("box", "half_extents.x", half_extents.x)?;
        positive("box", "half_extents.y", half_extents.y)?;
        positive("box", "half_extents.z", half_extents.z)?;
        margin_within("box", margin, half_extents.min_element())?;

        let shape = if margin > 0.0 {
            let inner = half_extents - Vec3::splat(margin);
            SharedShape::round_cuboid(inner.x, inner.y, inner.z, margin)
        } else {
            SharedShape::cuboid(half_extents.x, half_extents.y, half_extents.z)
        };
        Ok(Self::oriented(shape, Orientation::Up, margin))
    }

    /// Cylinder described by half-extents, around `orientation`.
    ///
    /// The half-extent along the axis is the half-height; the radius comes from
    /// the first remaining axis (x for Up and Back, y for Right).
    pub fn cylinder(half_extents: Vec3, orientation: Orientation) -> Result<Self, CastError> {
        let (half_height, radius) = match orientation.resolve() {
            Orientation::Right => (half_extents.x, half_extents.y),
            Orientation::Back => (half_extents.z, half_extents.x),
            _ => (half_extents.y, half_extents.x),
        };
        positive("cylinder", "radius", radius)?;
        positive("cylinder", "half height", half_height)?;
        let shape = SharedShape::cylinder(half_height, radius);
        Ok(Self::oriented(shape, orientation, 0.0))
    }

    /// Y-aligned capsule; `height` is the distance between the two cap centers.
    pub fn capsule(radius: f32, height: f32, margin: f32) -> Result<Self, CastError> {
        positive("capsule", "radius", radius)?;
        if !height.is_finite() || height < 0.0 {
            return Err(CastError::construction(
                "capsule",
                format!("height must be finite and non-negative, got {height}"),
            ));
        }
        margin_within("capsule", margin, radius)?;
        let shape = SharedShape::capsule_y(height * 0.5, radius);
        Ok(Self::oriented(shape, Orientation::Up, margin))
    }

    /// Convex hull of `points`. Needs at least four non-coplanar points.
    pub fn convex_hull(points: &[Vec3]) -> Result<Self, CastError> {
        if let Some(p) = points.iter().find(|p| !p.is_finite()) {
            return Err(CastError::construction(
                "convex hull",
                format!("non-finite point {p}"),
            ));
        }
        if !spans_volume(points) {
            return Err(CastError::construction(
                "convex hull",
                format!("{} points do not span a volume", points.len()),
            ));
        }
        let na_points: Vec<Point<Real>> = points.iter().copied().map(point_to_na).collect();
        let shape = SharedShape::convex_hull(&na_points).ok_or_else(|| {
            CastError::construction(
                "convex hull",
                format!("hull computation failed for {} points", points.len()),
            )
        })?;
        Ok(Self::oriented(shape, Orientation::Up, 0.0))
    }
}

/// True if `points` contain four points that are not coplanar.
fn spans_volume(points: &[Vec3]) -> bool {
    const EPS: f32 = 1.0e-6;

    let Some(&a) = points.first() else {
        return false;
    };
    let Some(&b) = points.iter().find(|p| p.distance_squared(a) > EPS) else {
        return false;
    };
    let ab = b - a;
    let Some(&c) = points
        .iter()
        .find(|p| ab.cross(**p - a).length_squared() > EPS)
    else {
        return false;
    };
    let normal = ab.cross(c - a);
    points.iter().any(|p| normal.dot(*p - a).abs() > EPS)
}

fn positive(shape: &'static str, what: &str, value: f32) -> Result<(), CastError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CastError::construction(
            shape,
            format!("{what} must be finite and positive, got {value}"),
        ))
    }
}

fn margin_within(shape: &'static str, margin: f32, limit: f32) -> Result<(), CastError> {
    if margin.is_finite() && (0.0..=limit).contains(&margin) {
        Ok(())
    } else {
        Err(CastError::construction(
            shape,
            format!("margin must be within [0, {limit}], got {margin}"),
        ))
    }
}

/// Declarative description of a castable shape.
#[derive(Clone, Debug, PartialEq)]
pub enum ShapeDef {
    Cone {
        radius: f32,
        height: f32,
        orientation: Orientation,
    },
    Sphere {
        radius: f32,
        margin: f32,
    },
    Box {
        half_extents: Vec3,
        margin: f32,
    },
    Cylinder {
        half_extents: Vec3,
        orientation: Orientation,
    },
    Capsule {
        radius: f32,
        height: f32,
        margin: f32,
    },
    ConvexHull {
        points: Vec<Vec3>,
    },
}

impl ShapeDef {
    pub fn build(&self) -> Result<CastShape, CastError> {
        match self {
            ShapeDef::Cone {
                radius,
                height,
                orientation,
            } => CastShape::cone(*radius, *height, *orientation),
            ShapeDef::Sphere { radius, margin } => CastShape::sphere(*radius, *margin),
            ShapeDef::Box {
                half_extents,
                margin,
            } => CastShape::cuboid(*half_extents, *margin),
            ShapeDef::Cylinder {
                half_extents,
                orientation,
            } => CastShape::cylinder(*half_extents, *orientation),
            ShapeDef::Capsule {
                radius,
                height,
                margin,
            } => CastShape::capsule(*radius, *height, *margin),
            ShapeDef::ConvexHull { points } => CastShape::convex_hull(points),
        }
    }
}

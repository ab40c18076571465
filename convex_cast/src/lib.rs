//! Convex casts (shape sweeps) over a Rapier query world, driven with host
//! `glam` math types.
//!
//! ```no_run
//! use convex_cast::{CastQuery, ConvexCaster, QueryWorld};
//! use glam::Vec3;
//!
//! # fn statics() -> Vec<convex_cast::WorldStaticDef> { Vec::new() }
//! let world = QueryWorld::build(statics());
//! let caster = ConvexCaster::new(&world);
//! let query = CastQuery::linear(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -5.0, 0.0));
//! let _hit = caster.sphere_cast(0.5, 0.0, &query)?.is_hit();
//! # Ok::<(), convex_cast::CastError>(())
//! ```

pub mod bridge;
pub mod cast;
pub mod constants;
pub mod error;
pub mod filter;
pub mod rapier;
pub mod rapier_world;
pub mod shape;

pub use bridge::Pose;
pub use cast::{CastHit, CastOutcome, CastQuery, ConvexCaster};
pub use constants::{CONTACT_PREDICTION, DEFAULT_ALLOWED_PENETRATION, MIN_SWEEP_SQ, ROTATION_EPS};
pub use error::CastError;
pub use filter::{BitmaskFlags, CastFilter, CollisionLayer, FlagBitmask};
pub use rapier::{StaticShapeDef, WorldStaticDef, collider_from_def};
pub use rapier_world::{QueryWorld, SweepWorld};
pub use shape::{CastShape, Orientation, ShapeDef};

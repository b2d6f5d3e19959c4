pub mod projectile;
pub(crate) mod sequence;

pub use projectile::{plan_flights, FlightPlan, Impact, Leg, ResolvedProjectile};

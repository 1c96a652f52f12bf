//! The standard per-tick workers, in their pipeline order:
//!
//! 1. [`GridRefreshWorker`] keeps the spatial index matching positions.
//! 2. [`TargetingWorker`] acquires and validates attack targets.
//! 3. [`OrderMovementWorker`] turns orders into movement goals.
//! 4. [`MovementWorker`] integrates movement into positions.
//! 5. [`ArrivalWorker`] clears completed move orders.
//! 6. [`WeaponWorker`] runs weapon timers, damage and death requests.
//! 7. [`ProductionWorker`] ticks periodic spawners.
//! 8. [`CollisionWorker`] pushes overlapping ground units apart.

mod collision;
mod combat;
mod grid_refresh;
mod movement;
mod production;
mod targeting;

pub use collision::CollisionWorker;
pub use combat::WeaponWorker;
pub use grid_refresh::GridRefreshWorker;
pub use movement::{ArrivalWorker, MovementWorker, OrderMovementWorker};
pub use production::ProductionWorker;
pub use targeting::TargetingWorker;

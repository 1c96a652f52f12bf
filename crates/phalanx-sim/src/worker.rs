//! The worker pipeline's shared state and hook trait.
//!
//! A worker is an independent piece of per-tick logic. Workers never hold
//! references into the match state; every hook receives the whole
//! [`MatchData`] instead, and any scratch a worker keeps between hooks lives
//! on the worker itself. Workers do not know about one another; ordering is
//! entirely the orchestrator's concern.

use phalanx_store::entity::EntityId;
use phalanx_store::store::EntityStore;

use crate::spatial::SpatialIndex;

// ---------------------------------------------------------------------------
// MatchData
// ---------------------------------------------------------------------------

/// Everything the workers operate on: the entity table and the spatial
/// index over it.
pub struct MatchData {
    pub store: EntityStore,
    pub spatial: SpatialIndex,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// One stage of the per-tick pipeline.
///
/// Hook order within a tick: every worker's `on_frame_begin`, then for each
/// worker in pipeline order `pre_work`, `run_on_entity` for every living
/// entity in ascending id order, `post_work`, and finally every worker's
/// `on_frame_end`.
pub trait Worker {
    fn name(&self) -> &'static str;

    /// Workers that only make sense on the authoritative side return true;
    /// mirror matches skip all their hooks.
    fn authoritative_only(&self) -> bool {
        false
    }

    fn on_frame_begin(&mut self, _dt: f32, _data: &mut MatchData) {}

    fn pre_work(&mut self, _dt: f32, _data: &mut MatchData) {}

    fn run_on_entity(&mut self, _dt: f32, _id: EntityId, _data: &mut MatchData) {}

    fn post_work(&mut self, _dt: f32, _data: &mut MatchData) {}

    fn on_frame_end(&mut self, _dt: f32, _data: &mut MatchData) {}
}

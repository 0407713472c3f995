//! Render state hooks and identity-based grouping keys.

use std::rc::Rc;

/// A GPU pipeline configuration change, opaque to the engine.
///
/// The engine only ever calls the two hooks, bracketing the draw calls of
/// every primitive sharing this state. A state is free to mutate its own
/// internals between activations (swap a bound texture id, say) as long
/// as the same allocation keeps representing the same group.
pub trait RenderState {
    /// Apply this state to the graphics context.
    fn activate(&self);

    /// Undo whatever [`activate`](RenderState::activate) changed.
    fn deactivate(&self);
}

/// Identity key of a state group.
///
/// Grouping is by allocation identity of the `Rc`, not value equality:
/// the engine has no knowledge of a state's internals, and two
/// value-equal states in distinct allocations form distinct groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey(usize);

impl StateKey {
    /// The key for `state = None`: the no-op state with no hooks.
    pub const NULL: StateKey = StateKey(0);

    pub fn of(state: &Rc<dyn RenderState>) -> Self {
        StateKey(Rc::as_ptr(state) as *const () as usize)
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

//! Shared-state synchronization primitives for the weft workspace.
//!
//! - [`SharedCounter`] - a mutex-guarded integer; the single sanctioned way
//!   for concurrent workers to mutate shared state.
//! - [`WaitGroup`] - a completion barrier counting outstanding participants,
//!   in the add / done / wait style.

pub mod counter;
pub mod wait_group;

pub use counter::SharedCounter;
pub use wait_group::WaitGroup;

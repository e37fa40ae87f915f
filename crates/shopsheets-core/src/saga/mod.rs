//! The combined-order flow.
//!
//! A combined order links one fabric order and one tailoring order under a
//! shared master id. Each sub-order is written to its own sheet as soon as it
//! is submitted, so the combined row is the last step. State lives in the
//! session store so the flow survives a restart.

pub mod combined;
pub mod ids;

pub use combined::{CombinedOrderSaga, SagaData, SagaError, SagaState, SubOrder, SubOrderLink};
pub use ids::LinkedIds;

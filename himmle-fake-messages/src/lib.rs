//! Mock data for running the app without a backend: the seeded demo store and a generator of
//! simulated activity from other participants.

mod activity;
mod seed;

pub use activity::{activity_sender, generate_activity};
pub use seed::seed_store;

//! Frame pacing.

mod pacer;

pub use pacer::{FramePacer, period_nanos};

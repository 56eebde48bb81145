/*!
 * Monitoring
 * Region profiling counters and tracing setup
 */

mod profile;
mod tracer;

pub use profile::{ProfileSnapshot, ProfileUnit, RegionProfiler};
pub use tracer::init_tracing;

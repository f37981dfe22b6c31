//! Application-level configuration.
//!
//! - [`DiscussionParams`]: discussion loop control (windows, limits, timeouts)

pub mod discussion_params;

pub use discussion_params::DiscussionParams;

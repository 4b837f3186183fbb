/// State management module
///
/// Per-channel transition state shared between the controllers and callers
/// that poll it.

pub mod channel_state;

// Re-export commonly used types
pub use channel_state::{ChannelPhase, ChannelState, FadeMode};

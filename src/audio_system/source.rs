/// Audio channel types
///
/// Defines the independent audio lines that each own a transition controller.
use std::fmt;

/// Looping audio channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Background music
    Music,

    /// Ambient audio, optionally anchored in the world
    Ambient,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Music => write!(f, "Music"),
            Channel::Ambient => write!(f, "Ambient"),
        }
    }
}

impl Channel {
    /// Both channels, in dispatch order
    pub const fn all() -> [Channel; 2] {
        [Channel::Music, Channel::Ambient]
    }

    /// Whether transitions on this channel also ramp pitch and spatial blend
    pub fn ramps_pitch_and_blend(&self) -> bool {
        match self {
            Channel::Music => false,
            Channel::Ambient => true,
        }
    }

    /// Catalog label used in log lines and errors
    pub fn catalog_label(&self) -> &'static str {
        match self {
            Channel::Music => "music",
            Channel::Ambient => "ambient",
        }
    }
}

use std::collections::BTreeSet;
use std::fmt;

/// Identifier of one output plane, `<layer>.<component>` (e.g. `SCI.r`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(String);

impl Channel {
    /// Build a channel from an extension name and a component suffix.
    pub fn new(layer: &str, component: &str) -> Self {
        Channel(format!("{layer}.{component}"))
    }

    /// Wrap an already-qualified channel identifier.
    pub fn from_full_name(name: impl Into<String>) -> Self {
        Channel(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before the last `.`.
    pub fn layer(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(layer, _)| layer)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Channel::from_full_name(name)
    }
}

/// A set of channels, used both for what an image offers and for what a
/// row request asks for.
pub type ChannelSet = BTreeSet<Channel>;

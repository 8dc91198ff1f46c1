use std::collections::BTreeMap;

use crate::channel::Channel;

/// Caller-owned output buffers for one row, covering columns `[x, r)`.
///
/// A channel's buffer is created on first write and starts zeroed.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    x: usize,
    r: usize,
    planes: BTreeMap<Channel, Vec<f32>>,
}

impl Row {
    pub fn new(x: usize, r: usize) -> Self {
        Row {
            x,
            r: r.max(x),
            planes: BTreeMap::new(),
        }
    }

    /// First column covered.
    pub fn x(&self) -> usize {
        self.x
    }

    /// One past the last column covered.
    pub fn r(&self) -> usize {
        self.r
    }

    pub fn width(&self) -> usize {
        self.r - self.x
    }

    pub fn writable(&mut self, channel: &Channel) -> &mut [f32] {
        let width = self.width();
        self.planes
            .entry(channel.clone())
            .or_insert_with(|| vec![0.0; width])
    }

    pub fn get(&self, channel: &Channel) -> Option<&[f32]> {
        self.planes.get(channel).map(Vec::as_slice)
    }

    /// Channels that have been written.
    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.planes.keys()
    }
}

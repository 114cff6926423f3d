// Bounded per-channel sample history and the subscription set
use crate::domain::sample::{Sample, Window};
use std::collections::{HashMap, VecDeque};

/// Time-ordered rolling buffer for one channel.
///
/// Samples are kept in arrival order, non-decreasing by timestamp, and the
/// buffer never holds more than the active window's capacity.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    samples: VecDeque<Sample>,
}

impl SampleBuffer {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::new(),
        }
    }

    /// Append a batch, dropping entries that would break the buffer
    /// invariants, then trim the front down to `capacity`.
    pub fn append(&mut self, batch: &[Sample], capacity: usize) {
        for sample in batch {
            if !sample.value.is_finite() {
                continue;
            }
            if let Some(last) = self.samples.back() {
                if sample.timestamp < last.timestamp {
                    continue;
                }
            }
            self.samples.push_back(*sample);
        }

        while self.samples.len() > capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The retained window, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }
}

/// Buffers for the currently subscribed channels.
///
/// Unsubscribing discards the channel's history immediately; resubscribing
/// starts from an empty buffer. Window changes apply on the next append.
#[derive(Debug, Default)]
pub struct ChannelStore {
    buffers: HashMap<String, SampleBuffer>,
    window: Window,
}

impl ChannelStore {
    pub fn new(window: Window) -> Self {
        Self {
            buffers: HashMap::new(),
            window,
        }
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn set_window(&mut self, window: Window) {
        self.window = window;
    }

    pub fn subscribe(&mut self, channel: &str) {
        self.buffers
            .entry(channel.to_string())
            .or_insert_with(SampleBuffer::new);
    }

    pub fn unsubscribe(&mut self, channel: &str) {
        self.buffers.remove(channel);
    }

    pub fn is_subscribed(&self, channel: &str) -> bool {
        self.buffers.contains_key(channel)
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(String::as_str)
    }

    /// Route a decoded batch into the subscribed channels' buffers.
    /// Channels outside the subscription set are ignored.
    pub fn append_batch(&mut self, batch: &HashMap<String, Vec<Sample>>) {
        let capacity = self.window.capacity();
        for (channel, samples) in batch {
            if let Some(buffer) = self.buffers.get_mut(channel) {
                buffer.append(samples, capacity);
            }
        }
    }

    pub fn buffer(&self, channel: &str) -> Option<&SampleBuffer> {
        self.buffers.get(channel)
    }
}

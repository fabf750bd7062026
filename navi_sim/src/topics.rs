// navi_sim/src/topics.rs

use std::collections::VecDeque;
use std::marker::PhantomData;

// --- Core Topic and Reader Structs ---

/// A message stored within a Topic, wrapping the data with a unique ID for cursor tracking.
#[derive(Clone, Debug)]
pub struct StampedMessage<T> {
    pub id: u64,
    pub message: T,
}

/// A bounded, single-topic buffer. The oldest message is dropped once `capacity` is reached.
#[derive(Debug)]
pub struct Topic<T: Clone> {
    name: String,
    buffer: VecDeque<StampedMessage<T>>,
    next_id: u64,
    capacity: usize,
}

impl<T: Clone> Topic<T> {
    pub fn new(name: &str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            name: name.to_string(),
            buffer: VecDeque::with_capacity(capacity),
            next_id: 0,
            capacity,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn publish(&mut self, message: T) {
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        let stamped_message = StampedMessage {
            id: self.next_id,
            message,
        };
        self.buffer.push_back(stamped_message);
        self.next_id += 1;
    }

    pub fn latest(&self) -> Option<&T> {
        self.buffer.back().map(|m| &m.message)
    }

    /// Total number of messages ever published, including evicted ones.
    pub fn published(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// A cursor over a topic. Each message is yielded once per reader.
#[derive(Debug)]
pub struct TopicReader<T> {
    last_id_read: Option<u64>,
    _phantom: PhantomData<T>,
}

impl<T> Default for TopicReader<T> {
    fn default() -> Self {
        Self {
            last_id_read: None,
            _phantom: PhantomData,
        }
    }
}

impl<T: Clone> TopicReader<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages published since the previous call.
    pub fn read<'a>(&mut self, topic: &'a Topic<T>) -> impl Iterator<Item = &'a StampedMessage<T>> {
        let start_index = match self.last_id_read {
            None => 0,
            Some(last_id) => topic
                .buffer
                .iter()
                .position(|msg| msg.id > last_id)
                .unwrap_or(topic.buffer.len()),
        };

        if let Some(newest_message) = topic.buffer.back() {
            self.last_id_read = Some(newest_message.id);
        }
        topic.buffer.range(start_index..)
    }
}

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::runtime::Timestamp;
use crate::value::TypedValue;

pub const DEFAULT_BUFFER_SIZE: usize = 50;

/// A value together with the engine time it was produced at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimestampedValue {
    pub value: TypedValue,
    pub timestamp: Timestamp,
}

impl TimestampedValue {
    pub fn new(value: TypedValue, timestamp: Timestamp) -> Self {
        Self { value, timestamp }
    }
}

/// Bounded FIFO of incoming values. On overflow the oldest item is evicted.
#[derive(Debug, Clone)]
pub struct InletBuffer {
    items: VecDeque<TimestampedValue>,
    capacity: usize,
    dropped: u64,
}

impl InletBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Append an item; returns the evicted oldest item if the buffer was full.
    pub fn push(&mut self, item: TimestampedValue) -> Option<TimestampedValue> {
        let evicted = if self.items.len() >= self.capacity {
            self.dropped += 1;
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    pub fn pop_front(&mut self) -> Option<TimestampedValue> {
        self.items.pop_front()
    }

    pub fn front(&self) -> Option<&TimestampedValue> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of items evicted since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Resize; shrinking evicts the oldest items that no longer fit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.items.len() > self.capacity {
            self.items.pop_front();
            self.dropped += 1;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimestampedValue> {
        self.items.iter()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Default for InletBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(v: i32) -> TimestampedValue {
        TimestampedValue::new(TypedValue::Int(v), v as u64)
    }

    #[test]
    fn overflow_drops_oldest_and_keeps_newest() {
        let capacity = 5;
        let k = 3;
        let mut buffer = InletBuffer::new(capacity);
        for v in 0..(capacity + k) as i32 {
            buffer.push(item(v));
        }
        assert_eq!(buffer.len(), capacity);
        assert_eq!(buffer.dropped(), k as u64);
        let kept: Vec<i32> = buffer
            .iter()
            .map(|i| i.value.extract::<i32>().unwrap())
            .collect();
        assert_eq!(kept, vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn shrinking_evicts_oldest() {
        let mut buffer = InletBuffer::new(4);
        for v in 0..4 {
            buffer.push(item(v));
        }
        buffer.set_capacity(2);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.front().unwrap().value, TypedValue::Int(2));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut buffer = InletBuffer::new(0);
        buffer.push(item(1));
        buffer.push(item(2));
        assert_eq!(buffer.capacity(), 1);
        assert_eq!(buffer.pop_front().unwrap().value, TypedValue::Int(2));
    }
}

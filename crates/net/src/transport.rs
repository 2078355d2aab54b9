// Copyright (c) Arena Engine Contributors
// SPDX-License-Identifier: MIT

//! The loopback transport: two bounded FIFOs connecting a client and
//! server living in the same process. No sockets, no serialization beyond
//! whatever payload type the caller chooses to enqueue.

use std::collections::VecDeque;

use arena_core::LOOPBACK_QUEUE_CAPACITY;
use tracing::warn;

/// One direction of the loopback link. Enqueuing past capacity drops the
/// message silently, matching a lossless-below-capacity transport.
#[derive(Debug)]
pub struct LoopbackQueue<T> {
    capacity: usize,
    messages: VecDeque<T>,
}

impl<T> LoopbackQueue<T> {
    pub fn new() -> Self {
        Self { capacity: LOOPBACK_QUEUE_CAPACITY, messages: VecDeque::new() }
    }

    pub fn push(&mut self, message: T) {
        if self.messages.len() >= self.capacity {
            warn!(capacity = self.capacity, "loopback queue full, dropping message");
            return;
        }
        self.messages.push_back(message);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.messages.pop_front()
    }

    pub fn drain(&mut self) -> std::collections::vec_deque::Drain<'_, T> {
        self.messages.drain(..)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<T> Default for LoopbackQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A client/server pair of loopback queues carrying `T`-typed messages.
#[derive(Debug)]
pub struct LoopbackTransport<T> {
    pub client_to_server: LoopbackQueue<T>,
    pub server_to_client: LoopbackQueue<T>,
}

impl<T> LoopbackTransport<T> {
    pub fn new() -> Self {
        Self { client_to_server: LoopbackQueue::new(), server_to_client: LoopbackQueue::new() }
    }

    pub fn reset(&mut self) {
        self.client_to_server = LoopbackQueue::new();
        self.server_to_client = LoopbackQueue::new();
    }
}

impl<T> Default for LoopbackTransport<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_round_trip_in_order() {
        let mut queue = LoopbackQueue::new();
        queue.push(1);
        queue.push(2);
        queue.push(3);
        assert_eq!(queue.pop(), Some(1));
        assert_eq!(queue.pop(), Some(2));
        assert_eq!(queue.pop(), Some(3));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn pushing_past_capacity_drops_silently() {
        let mut queue = LoopbackQueue::new();
        for i in 0..LOOPBACK_QUEUE_CAPACITY {
            queue.push(i);
        }
        queue.push(9999);
        assert_eq!(queue.len(), LOOPBACK_QUEUE_CAPACITY);
        assert_eq!(queue.pop(), Some(0));
    }
}

// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Producer to consumer streaming
//!
//! Thin wrapper around a `crossbeam-channel` pair that never blocks the
//! producer. When a capacity is set and the channel is full, the oldest queued
//! item is evicted to make room for the new one, so a slow consumer always sees
//! the most recent data.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use log::{log, Level};

/// Sending half, owned by the acquisition thread
pub struct StreamSender<T> {
    sender: Sender<T>,
    // Kept to evict the oldest item when the channel is full
    evict: Receiver<T>,
    name: &'static str,
    drop_level: Level,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

/// Receiving half, polled by the consumer
pub struct StreamReceiver<T> {
    receiver: Receiver<T>,
    dropped: Arc<AtomicU64>,
    closed: Arc<AtomicBool>,
}

/// Create a non-blocking stream
///
/// ### Parameters
/// * `capacity` - Maximum number of queued items, `None` for unbounded
/// * `name` - Stream name used in log messages
/// * `drop_level` - Log level used when an item is evicted
pub fn capped_channel<T>(
    capacity: Option<usize>,
    name: &'static str,
    drop_level: Level,
) -> (StreamSender<T>, StreamReceiver<T>) {
    let (sender, receiver) = match capacity {
        Some(cap) => crossbeam_channel::bounded(cap.max(1)),
        None => crossbeam_channel::unbounded(),
    };
    let dropped = Arc::new(AtomicU64::new(0));
    let closed = Arc::new(AtomicBool::new(false));

    (
        StreamSender {
            sender,
            evict: receiver.clone(),
            name,
            drop_level,
            dropped: dropped.clone(),
            closed: closed.clone(),
        },
        StreamReceiver {
            receiver,
            dropped,
            closed,
        },
    )
}

impl<T> StreamSender<T> {
    /// Queue `item` without blocking
    ///
    /// Returns `false` once the receiving side is gone.
    pub fn publish(&self, item: T) -> bool {
        if self.closed.load(Ordering::Relaxed) {
            return false;
        }
        let mut item = item;
        loop {
            match self.sender.try_send(item) {
                Ok(()) => return true,
                Err(TrySendError::Disconnected(_)) => return false,
                Err(TrySendError::Full(rejected)) => {
                    item = rejected;
                    if self.evict.try_recv().is_ok() {
                        let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        log!(
                            self.drop_level,
                            "{} stream full, dropped oldest item ({} dropped so far)",
                            self.name,
                            total
                        );
                    }
                }
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> StreamReceiver<T> {
    /// Take the oldest queued item, if any
    pub fn try_take(&self) -> Option<T> {
        match self.receiver.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Take every queued item, oldest first
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Number of items evicted because the consumer fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<T> Drop for StreamReceiver<T> {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_arrive_in_order() {
        let (tx, rx) = capped_channel(Some(8), "test", Level::Debug);
        for i in 0..5 {
            assert!(tx.publish(i));
        }
        assert_eq!(rx.len(), 5);
        assert_eq!(rx.try_take(), Some(0));
        assert_eq!(rx.drain(), vec![1, 2, 3, 4]);
        assert_eq!(rx.try_take(), None);
        assert_eq!(rx.dropped(), 0);
    }

    #[test]
    fn test_full_channel_drops_oldest() {
        let (tx, rx) = capped_channel(Some(3), "test", Level::Warn);
        for i in 0..10 {
            assert!(tx.publish(i));
        }
        assert_eq!(rx.drain(), vec![7, 8, 9]);
        assert_eq!(rx.dropped(), 7);
        assert_eq!(tx.dropped(), 7);
    }

    #[test]
    fn test_unbounded_keeps_everything() {
        let (tx, rx) = capped_channel(None, "test", Level::Debug);
        for i in 0..1000 {
            tx.publish(i);
        }
        assert_eq!(rx.drain().len(), 1000);
        assert_eq!(rx.dropped(), 0);
    }

    #[test]
    fn test_publish_after_receiver_dropped() {
        let (tx, rx) = capped_channel(Some(2), "test", Level::Debug);
        assert!(tx.publish(1));
        drop(rx);
        assert!(!tx.publish(2));
    }
}

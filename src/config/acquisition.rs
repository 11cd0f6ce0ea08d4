// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Data acquisition configuration
//!
//! This module defines the structures for configuring the acquisition loop
//! and the streams between the acquisition thread and its consumer.

use serde::{Deserialize, Serialize};

/// Configuration for the data acquisition process.
///
/// This structure contains settings that control the pacing of the
/// acquisition loop and how much data may queue up when the consumer
/// falls behind.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Sleep in milliseconds when the link has no line ready.
    ///
    /// Also bounds the cancellation latency of the acquisition thread.
    /// Must be greater than zero.
    pub poll_interval_ms: u64,

    /// Period in milliseconds of the consumer's polling loop.
    pub consumer_tick_ms: u64,

    /// Maximum number of live frames queued for the consumer, 0 for unbounded.
    ///
    /// When the queue is full the oldest frame is dropped.
    pub max_queued_frames: usize,

    /// Maximum number of completed recordings queued, 0 for unbounded.
    pub max_queued_recordings: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10,
            consumer_tick_ms: 50,
            max_queued_frames: 256,
            max_queued_recordings: 4,
        }
    }
}

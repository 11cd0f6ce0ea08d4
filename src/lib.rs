// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-serial-analyzer project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust Serial Analyzer library
//!
//! This library acquires sampled-signal frames streamed by a microcontroller over a
//! line-oriented serial link, captures fixed-duration recordings on demand and
//! performs offline spectral analysis (magnitude spectrum, low-pass filtering).
//!
//! The pipeline is organised as follows:
//!
//! - [`acquisition`]: line sources, link handshake, frame decoding, recording
//!   assembly and the acquisition daemon running on its own thread
//! - [`recording`]: the captured [`recording::Recording`] and its snapshot format
//! - [`spectral`]: FFT magnitude spectrum
//! - [`preprocessing`]: Butterworth low-pass filtering
//! - [`analysis`]: filtered and unfiltered spectra of a recording
//! - [`config`]: YAML configuration of the application

pub mod acquisition;
pub mod analysis;
pub mod config;
pub mod preprocessing;
pub mod recording;
pub mod spectral;

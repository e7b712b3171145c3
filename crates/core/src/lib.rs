//! Madrigal core: the realtime filtering heart of a parametric equalizer
//!
//! A per-sample signal path of low-cut, peaking bell, and high-cut filters
//! whose parameters can change continuously while audio is playing. The
//! cut bands change their cascade depth with the selected slope without
//! ever reallocating, and the whole per-block path runs in bounded time
//! with no locking and no heap allocation.
//!
//! The host integration surface (parameter automation, state persistence,
//! editor UI) lives with the host; this crate owns the signal path, the
//! lock-free parameter store it reads from, and preset serialization.

pub mod domain;

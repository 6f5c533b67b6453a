//! Bounded slot dispatcher and idle connection timers.
//!
//! This crate implements the execution side of the remotefs connection
//! model:
//!
//! - [`SlotQueue`] multiplexes logical operations onto a fixed number of
//!   slots: at most `size` tasks run at once, extra submissions wait in
//!   FIFO order, and the limit can be resized live without aborting
//!   in-flight work.
//! - [`SlotControl`] lets a task keep its slot busy past its own
//!   completion (long-lived read streams) and release it explicitly.
//! - [`IdleTimers`] owns one cancellable disconnect timer per slot, so
//!   unused backend connections are reclaimed after a fixed idle window.
//!
//! # Architecture
//!
//! ```text
//! capability call ──► SlotQueue::run ──► slot 0..N-1 ──► backend op
//!                        │  FIFO waiters when slots are scarce
//!                        └─ SlotControl: retain / release for streams
//!
//! op done ──► IdleTimers::arm(slot) ──(idle window)──► disconnect(slot)
//! next op ──► IdleTimers::cancel(slot)  (connection reused)
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod idle;
pub mod queue;

pub use idle::IdleTimers;
pub use queue::{ReleaseMode, SlotControl, SlotQueue};

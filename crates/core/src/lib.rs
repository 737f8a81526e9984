//! Shared data structures and wire codec for the fslatency agent and collector
//!
//! Keeping these in one crate guarantees the two binaries can never disagree
//! about the datagram byte layout or the ring buffer / registry contracts
//! both sides depend on.

pub mod datablock;
pub mod nameregistry;
pub mod ringbuffer;
pub mod timestamp;
pub mod wire;

pub use datablock::{Datablock, DatablockFold};
pub use nameregistry::{NameRegistry, RegistryError};
pub use ringbuffer::RingBuffer;
pub use timestamp::Timestamp;
pub use wire::{Messageblock, WireError};

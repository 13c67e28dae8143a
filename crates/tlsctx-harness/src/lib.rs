//! Test harness for the tlsctx connection context.
//!
//! Transport and protocol-state implementations for deterministic,
//! reproducible tests: in-memory duplex pipes, Turmoil-simulated TCP, a
//! seeded protocol state, a recorder for configuration callbacks, and a
//! fault-injecting transport wrapper.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod faulty;
pub mod pipe;
pub mod recorder;
pub mod sim_state;
pub mod sim_transport;

pub use faulty::{Fault, FaultyTransport};
pub use pipe::{PipeContext, PipeTransport, context_pair, memory_pair};
pub use recorder::{HookEvent, HookRecorder};
pub use sim_state::SimState;
pub use sim_transport::{SimListener, SimTransport};

//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams where external collaborators plug in. The
//! application layer works exclusively against these traits; concrete
//! implementations live under `adapter` (the in-memory store and the
//! synthetic source) or in the host (exchange clients, the durable
//! order/fill store).

pub mod outbound;

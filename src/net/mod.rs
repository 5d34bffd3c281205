//! Stroke transport: frame dispatch and peer fan-out.
//!
//! | Module | Role |
//! |--------|------|
//! | [`dispatch`] | Syscall → handler table, stroke frame encoding/decoding |
//! | [`fabric`] | `Fabric` trait and the in-process `LoopbackFabric` |

pub mod dispatch;
pub mod fabric;

pub use dispatch::{DispatchError, Dispatcher};
pub use fabric::{Fabric, LoopbackFabric, Peer};

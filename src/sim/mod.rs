//! Per-tick simulation
//!
//! All gameplay logic lives here. Nothing in this module owns entities or
//! nodes; it reads and writes them through the host traits.
//! - Single-threaded, fixed timestep
//! - Stable iteration order (registration order)
//! - Stale handles are expected, never trusted

pub mod basis;
pub mod damage;
pub mod friction;
pub mod launch;
pub mod portal;
pub mod proxy;
pub mod state;
pub mod tick;

pub use basis::BasisFrame;
pub use damage::{apply_damage, axis_damage, impact_damage};
pub use friction::{Contacts, FaceContact, FrictionSample, Side};
pub use launch::LaunchPad;
pub use portal::{PortalBounds, PortalPlane, plane_crossing};
pub use proxy::{Flung, MotionProxy, ProxyState, attachment_root, fling_entity};
pub use state::Simulation;
pub use tick::tick;

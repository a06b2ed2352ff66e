//! The compiled-in plugin set.
//!
//! Six service modules ship with the broker: `kvs`, `sync`, `barrier`,
//! `api`, `live`, and `log`. Each keeps its domain logic minimal -- the
//! substrate, not the services, is the point -- but all of them are real
//! plugins exercising the hook surface.

pub mod api;
pub mod barrier;
pub mod kvs;
pub mod live;
pub mod log;
pub mod sync;

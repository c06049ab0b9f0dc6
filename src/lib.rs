//! Duration constrained song selection for workout playlists.
//!
//! Songs are fetched from an OpenSubsonic server, filtered by the query of
//! a training, ordered by preference, picked until their total length
//! matches the training duration and finally exported to a device.

pub mod client;
pub mod config;
pub mod models;
pub mod training;

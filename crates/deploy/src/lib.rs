#![doc = include_str!("../README.md")]

pub mod lifecycle;

pub use lifecycle::{CommandLifecycle, Reachability, VmLifecycle};

#![doc = include_str!("../README.md")]

pub mod client;
pub mod target;

pub use client::{CommandOutput, OpenSshClient, RemoteClient};
pub use target::SshTarget;

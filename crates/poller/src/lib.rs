#![doc = include_str!("../README.md")]

pub mod budget;
pub mod poller;
pub mod runner;

pub use budget::PollBudget;
pub use poller::CompletionPoller;
pub use runner::TestRunner;

//! Testing utilities and mocks

pub mod mocks;

pub use mocks::{MockBehavior, MockPipeline};

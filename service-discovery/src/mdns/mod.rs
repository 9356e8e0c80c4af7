pub mod browser;
pub mod engine;
#[cfg(any(test, feature = "simulator"))]
pub mod simulator;

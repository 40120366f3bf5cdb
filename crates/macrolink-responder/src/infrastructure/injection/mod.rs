//! `InputInjector` implementations.
//!
//! Neither implementation touches the OS: [`mock::RecordingInjector`]
//! records calls for assertions and [`logging::LoggingInjector`] reports
//! each call through `tracing`.

pub mod logging;
pub mod mock;

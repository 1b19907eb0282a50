/// Event dispatcher module - broken down into manageable components
mod core;
mod defer;
mod dispatch;
mod listeners;
mod queue;
mod stats;

pub use core::EventDispatcher;
pub use stats::DispatcherStats;

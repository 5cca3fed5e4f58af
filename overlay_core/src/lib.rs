//! overlay_core - sampling and refresh loop for the system monitor overlay
//!
//! Counter session, memory sampler, formatter and the fixed-rate monitor
//! loop. Window toolkits plug in through the [`Overlay`] trait.

pub mod constants;
pub mod counters;
pub mod error;
pub mod format;
pub mod logging;
pub mod memory;
pub mod monitor;
pub mod overlay;

pub use counters::{CounterHandle, CounterSession, CounterStatus, PerfQuery, QueryHandle, SysinfoQuery};
pub use error::{CounterStep, OverlayError, Result};
pub use logging::initialize_logging;
pub use memory::{MemorySampler, MemorySource, MemoryStatus, MemoryUsage, SysinfoMemory};
pub use monitor::{
    FrameLimiter, LoopReport, LoopState, MetricSample, MonitorContext, run_monitor, run_overlay,
};
pub use overlay::{Color, DisplayText, Overlay, OverlayLayout, TextSlot, WindowStatus};

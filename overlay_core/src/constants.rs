//! Compile-time constants for the overlay

use crate::overlay::Color;

/// Window geometry and refresh rate
pub mod window {
    pub const TITLE: &str = "CPU";
    pub const WIDTH: u32 = 169;
    pub const HEIGHT: u32 = 100;
    pub const POSITION_X: i32 = 0;
    pub const POSITION_Y: i32 = 0;
    pub const FRAME_RATE_LIMIT: u32 = 4;
}

/// Text placement in logical pixels
pub mod layout {
    pub const TEXT_X: f64 = 18.0;
    pub const CPU_Y: f64 = 10.0;
    pub const TOTAL_RAM_Y: f64 = 50.0;
    pub const USED_RAM_Y: f64 = 70.0;
    pub const CPU_FONT_SIZE: f64 = 26.0;
    pub const RAM_FONT_SIZE: f64 = 21.0;
}

/// Color scheme
pub mod colors {
    use super::Color;

    pub const BACKGROUND: Color = Color::rgb(33, 33, 33);
    pub const TEXT: Color = Color::rgb(255, 255, 255);
}

/// Performance counter paths
pub mod counters {
    pub const CPU_TOTAL_PATH: &str = r"\Processor(_Total)\% Processor Time";
    pub const DISK_TOTAL_PATH: &str = r"\PhysicalDisk(_Total)\% Disk Time";

    /// Value reported when the session cannot produce a reading
    pub const CPU_SENTINEL: i32 = 0;
}

/// Assets loaded relative to the working directory
pub mod assets {
    pub const FONT_PATH: &str = "font.ttf";
}

pub mod logging {
    pub const DEFAULT_LOG_LEVEL: &str = "info";
    pub const LOG_DIR: &str = "/var/tmp/sysmon_overlay";
    pub const LOG_FILE_MAX_SIZE: u64 = 10_000_000; // 10MB
    pub const LOG_FILE_MAX_COUNT: usize = 5;
}

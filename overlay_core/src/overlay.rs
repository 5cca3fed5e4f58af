//! Overlay window contract, text state and fixed layout

use crate::constants::{colors, layout, window};
use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }
}

/// Where and how big one text widget is drawn, in logical pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextSlot {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLayout {
    pub width: u32,
    pub height: u32,
    pub position: (i32, i32),
    pub background: Color,
    pub text_color: Color,
    pub cpu: TextSlot,
    pub total_ram: TextSlot,
    pub used_ram: TextSlot,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            width: window::WIDTH,
            height: window::HEIGHT,
            position: (window::POSITION_X, window::POSITION_Y),
            background: colors::BACKGROUND,
            text_color: colors::TEXT,
            cpu: TextSlot {
                x: layout::TEXT_X,
                y: layout::CPU_Y,
                size: layout::CPU_FONT_SIZE,
            },
            total_ram: TextSlot {
                x: layout::TEXT_X,
                y: layout::TOTAL_RAM_Y,
                size: layout::RAM_FONT_SIZE,
            },
            used_ram: TextSlot {
                x: layout::TEXT_X,
                y: layout::USED_RAM_Y,
                size: layout::RAM_FONT_SIZE,
            },
        }
    }
}

impl OverlayLayout {
    /// Text widgets in draw order, paired with their slot.
    pub fn widgets<'a>(&self, text: &'a DisplayText) -> [(TextSlot, &'a str); 3] {
        [
            (self.cpu, text.cpu.as_str()),
            (self.used_ram, text.used_ram.as_str()),
            (self.total_ram, text.total_ram.as_str()),
        ]
    }
}

/// The three strings shown on the overlay, overwritten every tick
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayText {
    pub cpu: String,
    pub total_ram: String,
    pub used_ram: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowStatus {
    Open,
    CloseRequested,
}

/// Draw-text/present contract the monitor loop drives.
pub trait Overlay {
    /// Drains every pending window event without blocking.
    fn pump_events(&mut self) -> WindowStatus;

    fn display_text_mut(&mut self) -> &mut DisplayText;

    /// Clears, draws the three text widgets and presents the frame.
    fn render(&mut self) -> Result<()>;

    fn set_cpu_text(&mut self, text: String) {
        self.display_text_mut().cpu = text;
    }

    fn set_total_ram_text(&mut self, text: String) {
        self.display_text_mut().total_ram = text;
    }

    fn set_used_ram_text(&mut self, text: String) {
        self.display_text_mut().used_ram = text;
    }
}

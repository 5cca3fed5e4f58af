use log::{error, info};
use std::path::Path;

use overlay_core::constants::{assets, window};
use overlay_core::{
    FrameLimiter, MonitorContext, OverlayLayout, SysinfoMemory, SysinfoQuery, initialize_logging,
    run_overlay,
};

mod font;
mod overlay_window;

use overlay_window::WinitOverlay;

fn main() {
    // 日志失败不影响覆盖层运行
    if let Err(e) = initialize_logging("winit_softbuffer_overlay") {
        eprintln!("Failed to initialize logging: {}", e);
    }
    info!("Starting winit_softbuffer_overlay");

    let font = font::load_font(Path::new(assets::FONT_PATH));

    let mut overlay = match WinitOverlay::new(OverlayLayout::default(), font) {
        Ok(overlay) => overlay,
        Err(e) => {
            error!("Failed to create overlay window: {:#}", e);
            return;
        }
    };

    let mut ctx: MonitorContext<SysinfoQuery, SysinfoMemory> = MonitorContext::default();
    let limiter = FrameLimiter::new(window::FRAME_RATE_LIMIT);
    let report = run_overlay(&mut ctx, &mut overlay, limiter);

    info!(
        "Overlay closed after {} ticks ({} renders, {} failed)",
        report.ticks, report.renders, report.failed_renders
    );
}

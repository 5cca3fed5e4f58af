use anyhow::{Result, anyhow};
use bytemuck::cast_slice;
use cairo::{Context, Format, ImageSurface};
use log::{error, info};
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Duration;

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalPosition, LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop, OwnedDisplayHandle},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowAttributes, WindowId, WindowLevel},
};

use overlay_core::constants::window::TITLE;
use overlay_core::{DisplayText, Overlay, OverlayError, OverlayLayout, WindowStatus};

use crate::font::OverlayFont;

// 简化泛型类型书写
type SbSurface = softbuffer::Surface<OwnedDisplayHandle, Rc<Window>>;

// 等待首个窗口创建时最多泵事件的次数
const STARTUP_PUMPS: u32 = 50;

// Cairo 后备缓冲：ImageSurface
struct CairoBackBuffer {
    width: u32,
    height: u32,
    image: ImageSurface,
}

impl CairoBackBuffer {
    fn new(width: u32, height: u32) -> Result<Self> {
        let image = ImageSurface::create(Format::ARgb32, width as i32, height as i32)?;
        Ok(Self {
            width,
            height,
            image,
        })
    }

    fn ensure_size(&mut self, width: u32, height: u32) -> Result<()> {
        if self.width == width && self.height == height {
            return Ok(());
        }
        self.image = ImageSurface::create(Format::ARgb32, width as i32, height as i32)?;
        self.width = width;
        self.height = height;
        Ok(())
    }
}

/// winit 回调侧的窗口状态
struct OverlayApp {
    layout: OverlayLayout,
    window: Option<Rc<Window>>,
    window_id: Option<WindowId>,
    soft_surface: Option<SbSurface>,
    surface_size: Option<(u32, u32)>,
    close_requested: bool,
    init_error: Option<anyhow::Error>,
}

impl OverlayApp {
    fn new(layout: OverlayLayout) -> Self {
        Self {
            layout,
            window: None,
            window_id: None,
            soft_surface: None,
            surface_size: None,
            close_requested: false,
            init_error: None,
        }
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let (x, y) = self.layout.position;
        let attrs = WindowAttributes::default()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(
                self.layout.width as f64,
                self.layout.height as f64,
            ))
            .with_position(LogicalPosition::new(x as f64, y as f64))
            .with_decorations(false)
            .with_resizable(false)
            .with_visible(true)
            .with_transparent(false);

        let window = event_loop.create_window(attrs).map(Rc::new)?;

        // 创建窗口本身不保证置顶，创建后立即强制一次
        window.set_window_level(WindowLevel::AlwaysOnTop);

        // softbuffer Context 与 Surface（只创建一次）
        let soft_ctx = softbuffer::Context::new(event_loop.owned_display_handle())
            .map_err(|e| anyhow!("softbuffer::Context::new: {}", e))?;
        let soft_surface = SbSurface::new(&soft_ctx, window.clone())
            .map_err(|e| anyhow!("softbuffer::Surface::new: {}", e))?;

        info!(
            "Overlay window created: {:?} scale={}",
            window.inner_size(),
            window.scale_factor()
        );

        self.window_id = Some(window.id());
        self.window = Some(window);
        self.soft_surface = Some(soft_surface);
        self.surface_size = None;
        Ok(())
    }
}

impl ApplicationHandler for OverlayApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() && self.init_error.is_none() {
            if let Err(e) = self.create_window(event_loop) {
                error!("Failed to create overlay window: {}", e);
                self.init_error = Some(e);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if Some(window_id) != self.window_id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.close_requested = true;
                event_loop.exit();
            }
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                // 下一帧按新尺寸重建 surface
                self.surface_size = None;
            }
            _ => {}
        }
    }
}

/// The overlay window: winit for the window and event pump, cairo for
/// drawing, softbuffer for presenting.
pub struct WinitOverlay {
    event_loop: EventLoop<()>,
    app: OverlayApp,
    back: Option<CairoBackBuffer>,
    font: OverlayFont,
    text: DisplayText,
}

impl WinitOverlay {
    pub fn new(layout: OverlayLayout, font: OverlayFont) -> Result<Self> {
        let mut event_loop = EventLoop::new()?;
        let mut app = OverlayApp::new(layout);

        // 窗口在 resumed 中创建，先泵几轮事件直到它出现
        for _ in 0..STARTUP_PUMPS {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::from_millis(10)), &mut app)
            {
                return Err(anyhow!("event loop exited during startup ({})", code));
            }
            if let Some(e) = app.init_error.take() {
                return Err(e);
            }
            if app.window.is_some() {
                break;
            }
        }
        if app.window.is_none() {
            return Err(anyhow!("window was not created"));
        }

        Ok(Self {
            event_loop,
            app,
            back: None,
            font,
            text: DisplayText::default(),
        })
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(window) = self.app.window.as_ref() else {
            return Ok(());
        };
        let PhysicalSize {
            width: width_px,
            height: height_px,
        } = window.inner_size();
        let (Some(w_nz), Some(h_nz)) = (NonZeroU32::new(width_px), NonZeroU32::new(height_px))
        else {
            // 最小化等情况下无需绘制
            return Ok(());
        };
        let scale = window.scale_factor();

        let Some(surface) = self.app.soft_surface.as_mut() else {
            return Ok(());
        };
        if self.app.surface_size != Some((width_px, height_px)) {
            surface
                .resize(w_nz, h_nz)
                .map_err(|e| anyhow!("softbuffer resize: {}", e))?;
            self.app.surface_size = Some((width_px, height_px));
        }

        // back buffer 尺寸保证
        if self.back.is_none() {
            self.back = Some(CairoBackBuffer::new(width_px, height_px)?);
        }
        let back = self
            .back
            .as_mut()
            .ok_or_else(|| anyhow!("back buffer missing"))?;
        back.ensure_size(width_px, height_px)?;

        // Cairo 绘制
        {
            let layout = &self.app.layout;
            let cr = Context::new(&back.image)?;
            cr.scale(scale, scale);

            let bg = layout.background;
            cr.set_source_rgb(bg.r, bg.g, bg.b);
            cr.set_operator(cairo::Operator::Source);
            cr.paint()?;
            cr.set_operator(cairo::Operator::Over);

            if let Some(face) = self.font.face() {
                cr.set_font_face(face);
            }
            let fg = layout.text_color;
            cr.set_source_rgb(fg.r, fg.g, fg.b);
            for (slot, text) in layout.widgets(&self.text) {
                cr.set_font_size(slot.size);
                // 槽位给的是文本顶部，基线再向下一个字号
                cr.move_to(slot.x, slot.y + slot.size);
                cr.show_text(text)?;
            }
        }

        // 像素提交
        back.image.flush();
        let stride = back.image.stride() as usize;
        let data = back.image.data()?;
        let w = width_px as usize;
        let h = height_px as usize;

        let mut buf = surface.buffer_mut().map_err(|e| anyhow!("{}", e))?;
        if stride == w * 4 {
            let src_u32: &[u32] = cast_slice(&data[..h * stride]); // BGRA字节序小端与 u32 兼容
            buf[..w * h].copy_from_slice(src_u32);
        } else {
            for y in 0..h {
                let row = &data[y * stride..y * stride + w * 4];
                let src_u32: &[u32] = cast_slice(row);
                buf[y * w..(y + 1) * w].copy_from_slice(src_u32);
            }
        }
        buf.present().map_err(|e| anyhow!("{}", e))?;

        Ok(())
    }
}

impl Overlay for WinitOverlay {
    fn pump_events(&mut self) -> WindowStatus {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.app);
        if matches!(status, PumpStatus::Exit(_)) || self.app.close_requested {
            WindowStatus::CloseRequested
        } else {
            WindowStatus::Open
        }
    }

    fn display_text_mut(&mut self) -> &mut DisplayText {
        &mut self.text
    }

    fn render(&mut self) -> overlay_core::Result<()> {
        self.redraw()
            .map_err(|e| OverlayError::render(format!("{:#}", e)))
    }
}

//! The live window and core context handed out by a successful bootstrap.

use core::{
    ffi::{c_char, CStr},
    fmt, ptr,
};

use log::{debug, info, warn};

use crate::{
    bootstrap::{CoreContext, Stage},
    gl::{
        cmd, GlFunctions, GL_COLOR_BUFFER_BIT, GL_DEBUG_OUTPUT, GL_DEBUG_OUTPUT_SYNCHRONOUS, GL_RENDERER,
        GL_VENDOR, GL_VERSION,
    },
    platform::{DeviceContext, Platform, RenderingContext, Size, WindowHandle},
    wgl::WglExtensions,
};

/// A visible window with a current core profile context and its function table.
///
/// Owns the platform that created it; dropping the surface releases the
/// context, the device context and the window.
pub struct GlSurface<P: Platform> {
    platform: P,
    window: WindowHandle,
    dc: DeviceContext,
    context: RenderingContext,
    pixel_format: i32,
    outer_size: Size,
    extensions: WglExtensions,
    gl: GlFunctions,
    history: Vec<Stage>,
}

impl<P: Platform> GlSurface<P> {
    pub(crate) fn new(platform: P, core: CoreContext, gl: GlFunctions, history: Vec<Stage>) -> Self {
        Self {
            platform,
            window: core.window,
            dc: core.dc,
            context: core.context,
            pixel_format: core.pixel_format,
            outer_size: core.outer_size,
            extensions: core.extensions,
            gl,
            history,
        }
    }

    pub fn stage(&self) -> Stage {
        self.history.last().copied().unwrap_or(Stage::Unstarted)
    }

    /// Every stage the bootstrap went through, in order.
    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    pub fn window(&self) -> WindowHandle {
        self.window
    }

    pub fn device_context(&self) -> DeviceContext {
        self.dc
    }

    pub fn context(&self) -> RenderingContext {
        self.context
    }

    pub fn pixel_format(&self) -> i32 {
        self.pixel_format
    }

    pub fn extensions(&self) -> &WglExtensions {
        &self.extensions
    }

    pub fn gl(&self) -> &GlFunctions {
        &self.gl
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn client_size(&self) -> Option<Size> {
        self.platform.client_size(self.window)
    }

    /// Window size including the frame, as created.
    pub fn outer_size(&self) -> Size {
        self.outer_size
    }

    /// Drains pending window messages. `false` once a close was requested.
    pub fn pump_messages(&mut self) -> bool {
        self.platform.pump_messages(self.window)
    }

    pub fn request_close(&mut self) {
        self.platform.request_close(self.window);
    }

    pub fn swap_buffers(&mut self) {
        if !self.platform.swap_buffers(self.dc) {
            warn!("SwapBuffers failed");
        }
    }

    /// Calls `frame` once per pumped frame until the window is asked to close.
    /// Returns the number of frames run.
    pub fn run_until_closed(&mut self, mut frame: impl FnMut(&mut Self)) -> u64 {
        let mut frames = 0;

        while self.pump_messages() {
            frame(self);
            frames += 1;
        }

        debug!("Frame loop ended after {frames} frames");
        frames
    }

    /// Sets the viewport to the client area and clears it.
    ///
    /// # Safety
    ///
    /// The surface's context must be current on this thread.
    pub unsafe fn clear(&self, [r, g, b, a]: [f32; 4]) {
        if let (Some(viewport), Some(size)) = (self.gl.get::<cmd::Viewport>(), self.client_size()) {
            viewport(0, 0, size.width, size.height);
        }

        if let (Some(clear_color), Some(clear)) = (self.gl.get::<cmd::ClearColor>(), self.gl.get::<cmd::Clear>()) {
            clear_color(r, g, b, a);
            clear(GL_COLOR_BUFFER_BIT);
        }
    }

    /// Logs vendor, renderer and version strings.
    ///
    /// # Safety
    ///
    /// The surface's context must be current on this thread.
    pub unsafe fn log_renderer_info(&self) {
        let Some(get_string) = self.gl.get::<cmd::GetString>() else {
            warn!("glGetString unavailable, cannot identify renderer");
            return;
        };

        for (label, name) in [("Vendor", GL_VENDOR), ("Renderer", GL_RENDERER), ("Version", GL_VERSION)] {
            let value = get_string(name);

            if !value.is_null() {
                info!("{label}: {}", CStr::from_ptr(value as *const c_char).to_string_lossy());
            }
        }
    }

    /// Routes driver debug output to the logger. Needs a debug context to
    /// produce anything.
    ///
    /// # Safety
    ///
    /// The surface's context must be current on this thread.
    pub unsafe fn install_debug_callback(&self) -> bool {
        let (Some(enable), Some(callback)) = (self.gl.get::<cmd::Enable>(), self.gl.get::<cmd::DebugMessageCallback>())
        else {
            warn!("glDebugMessageCallback unavailable, debug output disabled");
            return false;
        };

        enable(GL_DEBUG_OUTPUT);
        enable(GL_DEBUG_OUTPUT_SYNCHRONOUS);
        callback(Some(crate::gl::debug_message_callback), ptr::null());

        info!("OpenGL debug output enabled");
        true
    }
}

impl<P: Platform> fmt::Debug for GlSurface<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlSurface")
            .field("window", &self.window)
            .field("context", &self.context)
            .field("pixel_format", &self.pixel_format)
            .field("stage", &self.stage())
            .finish_non_exhaustive()
    }
}

impl<P: Platform> Drop for GlSurface<P> {
    fn drop(&mut self) {
        self.platform.make_current(None, None);
        self.platform.delete_context(self.context);
        self.platform.release_device_context(self.window, self.dc);
        self.platform.destroy_window(self.window);
    }
}

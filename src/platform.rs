//! Window Shell and WGL surface operations the bootstrap drives.
//!
//! Handles are plain integers so the protocol can run against any
//! implementation of [`Platform`]; the Win32 one lives in `crate::win32`.

use core::{ffi::c_void, ptr::NonNull};
use std::ffi::CString;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{resolver::ProcLoader, wgl::WglExtensions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceContext(pub isize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderingContext(pub isize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LibraryHandle(pub isize);

/// Non-null address of a resolved entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProcAddress(NonNull<c_void>);

impl ProcAddress {
    pub fn new(ptr: *const c_void) -> Option<Self> {
        NonNull::new(ptr as *mut c_void).map(Self)
    }

    pub fn as_ptr(self) -> *const c_void {
        self.0.as_ptr()
    }

    pub fn addr(self) -> usize {
        self.0.as_ptr() as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowStyle {
    /// Title bar, borders and system menu.
    #[default]
    Overlapped,
    /// No frame at all; the outer size equals the client size.
    Popup,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowDesc {
    pub size: Size,
    pub title: CString,
    pub style: WindowStyle,
}

/// Legacy pixel format request/description.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    pub color_bits: u8,
    pub alpha_bits: u8,
    pub depth_bits: u8,
    pub stencil_bits: u8,
    pub draw_to_window: bool,
    pub double_buffer: bool,
    pub support_opengl: bool,
}

impl PixelFormatDescriptor {
    /// The format asked of the dummy window; whatever the driver picks is fine.
    pub const fn legacy_default() -> Self {
        Self {
            color_bits: 32,
            alpha_bits: 8,
            depth_bits: 24,
            stencil_bits: 0,
            draw_to_window: true,
            double_buffer: true,
            support_opengl: true,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("module handle unavailable")]
    ModuleHandle,

    #[error("window class registration failed")]
    ClassRegistration,

    #[error("window creation failed")]
    Creation,
}

/// Native windowing and WGL surface calls.
///
/// Booleans report the raw success of the underlying call; the bootstrap
/// decides which failures are fatal.
pub trait Platform: ProcLoader {
    /// Registers the window class on first use and creates a hidden window.
    fn create_window(&mut self, desc: &WindowDesc) -> Result<WindowHandle, WindowError>;
    fn destroy_window(&mut self, window: WindowHandle) -> bool;
    fn show_window(&mut self, window: WindowHandle);

    /// Outer window size whose client area is `client` for `style`.
    fn adjust_window_size(&self, client: Size, style: WindowStyle) -> Option<Size>;
    fn client_size(&self, window: WindowHandle) -> Option<Size>;

    fn device_context(&mut self, window: WindowHandle) -> Option<DeviceContext>;
    fn release_device_context(&mut self, window: WindowHandle, dc: DeviceContext) -> bool;

    fn choose_pixel_format(&mut self, dc: DeviceContext, desc: &PixelFormatDescriptor) -> Option<i32>;
    fn describe_pixel_format(&mut self, dc: DeviceContext, format: i32) -> Option<PixelFormatDescriptor>;
    fn set_pixel_format(&mut self, dc: DeviceContext, format: i32, desc: &PixelFormatDescriptor) -> bool;

    fn create_legacy_context(&mut self, dc: DeviceContext) -> Option<RenderingContext>;
    /// `None` for both releases whatever context is current on this thread.
    fn make_current(&mut self, dc: Option<DeviceContext>, context: Option<RenderingContext>) -> bool;
    fn delete_context(&mut self, context: RenderingContext) -> bool;

    /// Calls `wglChoosePixelFormatARB` with a zero-terminated attribute list.
    fn choose_pixel_format_arb(
        &mut self,
        extensions: &WglExtensions,
        dc: DeviceContext,
        attribs: &[i32],
    ) -> Option<i32>;

    /// Calls `wglCreateContextAttribsARB` with a zero-terminated attribute list.
    fn create_context_attribs_arb(
        &mut self,
        extensions: &WglExtensions,
        dc: DeviceContext,
        attribs: &[i32],
    ) -> Option<RenderingContext>;

    fn swap_buffers(&mut self, dc: DeviceContext) -> bool;

    /// Queues a close request; observed by the next [`Platform::pump_messages`].
    fn request_close(&mut self, window: WindowHandle);

    /// Drains queued messages without blocking. Returns the running flag.
    fn pump_messages(&mut self, window: WindowHandle) -> bool;
}

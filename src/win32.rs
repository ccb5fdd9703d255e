use core::{
    cell::Cell,
    ffi::{c_void, CStr},
    mem, ptr,
};

use log::warn;
use windows_sys::Win32::{
    Foundation::{FreeLibrary, GetLastError, ERROR_CLASS_ALREADY_EXISTS, HMODULE, HWND, LPARAM, LRESULT, RECT, WPARAM},
    Graphics::{
        Gdi::{GetDC, ReleaseDC},
        OpenGL::{
            wglCreateContext, wglDeleteContext, wglGetProcAddress, wglMakeCurrent, ChoosePixelFormat,
            DescribePixelFormat, SetPixelFormat, SwapBuffers, PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW,
            PFD_SUPPORT_OPENGL, PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR,
        },
    },
    System::LibraryLoader::{GetModuleHandleA, GetProcAddress, LoadLibraryA},
    UI::WindowsAndMessaging::{
        AdjustWindowRect, CreateWindowExA, DefWindowProcA, DestroyWindow, DispatchMessageA, GetClientRect,
        GetWindowLongPtrA, LoadCursorA, MessageBoxA, PeekMessageA, PostMessageA, RegisterClassA,
        SetWindowLongPtrA, ShowWindow, TranslateMessage, CREATESTRUCTA, CS_HREDRAW, CS_OWNDC, CS_VREDRAW,
        CW_USEDEFAULT, GWLP_USERDATA, IDC_ARROW, MB_ICONERROR, MSG, PM_REMOVE, SW_SHOW, WINDOW_STYLE,
        WM_CLOSE, WM_NCCREATE, WNDCLASSA, WS_OVERLAPPEDWINDOW, WS_POPUP,
    },
};

use crate::{
    platform::{
        DeviceContext, LibraryHandle, PixelFormatDescriptor, Platform, ProcAddress, RenderingContext, Size,
        WindowDesc, WindowError, WindowHandle, WindowStyle,
    },
    resolver::ProcLoader,
    wgl::WglExtensions,
};

const CLASS_NAME: &CStr = c"celeste-window";

/// Win32 + WGL backend. Every window it creates clears `running` on `WM_CLOSE`.
pub struct Win32Platform {
    instance: HMODULE,
    class_registered: bool,
    running: Box<Cell<bool>>,
}

impl Win32Platform {
    pub fn new() -> Result<Self, WindowError> {
        let instance = unsafe { GetModuleHandleA(ptr::null()) };

        if instance == 0 {
            return Err(WindowError::ModuleHandle);
        }

        Ok(Self {
            instance,
            class_registered: false,
            running: Box::new(Cell::new(true)),
        })
    }

    fn register_class(&mut self) -> Result<(), WindowError> {
        if self.class_registered {
            return Ok(());
        }

        let class = WNDCLASSA {
            style: CS_HREDRAW | CS_VREDRAW | CS_OWNDC,
            lpfnWndProc: Some(message_callback),
            hInstance: self.instance,
            hCursor: unsafe { LoadCursorA(0, IDC_ARROW as _) },
            lpszClassName: CLASS_NAME.as_ptr() as _,
            ..unsafe { mem::zeroed() }
        };

        let atom = unsafe { RegisterClassA(&class) };

        if atom == 0 && unsafe { GetLastError() } != ERROR_CLASS_ALREADY_EXISTS {
            return Err(WindowError::ClassRegistration);
        }

        self.class_registered = true;
        Ok(())
    }
}

fn window_style(style: WindowStyle) -> WINDOW_STYLE {
    match style {
        WindowStyle::Overlapped => WS_OVERLAPPEDWINDOW,
        WindowStyle::Popup => WS_POPUP,
    }
}

fn to_native(desc: &PixelFormatDescriptor) -> PIXELFORMATDESCRIPTOR {
    let mut flags = 0;

    if desc.draw_to_window {
        flags |= PFD_DRAW_TO_WINDOW;
    }

    if desc.double_buffer {
        flags |= PFD_DOUBLEBUFFER;
    }

    if desc.support_opengl {
        flags |= PFD_SUPPORT_OPENGL;
    }

    PIXELFORMATDESCRIPTOR {
        nSize: mem::size_of::<PIXELFORMATDESCRIPTOR>() as _,
        nVersion: 1,
        dwFlags: flags,
        iPixelType: PFD_TYPE_RGBA,
        cColorBits: desc.color_bits,
        cAlphaBits: desc.alpha_bits,
        cDepthBits: desc.depth_bits,
        cStencilBits: desc.stencil_bits,
        ..unsafe { mem::zeroed() }
    }
}

fn from_native(pfd: &PIXELFORMATDESCRIPTOR) -> PixelFormatDescriptor {
    PixelFormatDescriptor {
        color_bits: pfd.cColorBits,
        alpha_bits: pfd.cAlphaBits,
        depth_bits: pfd.cDepthBits,
        stencil_bits: pfd.cStencilBits,
        draw_to_window: pfd.dwFlags & PFD_DRAW_TO_WINDOW != 0,
        double_buffer: pfd.dwFlags & PFD_DOUBLEBUFFER != 0,
        support_opengl: pfd.dwFlags & PFD_SUPPORT_OPENGL != 0,
    }
}

fn proc_address(proc: Option<unsafe extern "system" fn() -> isize>) -> Option<ProcAddress> {
    proc.and_then(|proc| ProcAddress::new(proc as *const c_void))
}

impl ProcLoader for Win32Platform {
    fn driver_proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        proc_address(unsafe { wglGetProcAddress(name.as_ptr() as _) })
    }

    fn open_library(&self, name: &CStr) -> Option<LibraryHandle> {
        let module = unsafe { LoadLibraryA(name.as_ptr() as _) };
        (module != 0).then_some(LibraryHandle(module))
    }

    fn library_proc_address(&self, library: LibraryHandle, name: &CStr) -> Option<ProcAddress> {
        proc_address(unsafe { GetProcAddress(library.0, name.as_ptr() as _) })
    }

    fn close_library(&self, library: LibraryHandle) {
        unsafe { FreeLibrary(library.0) };
    }
}

impl Platform for Win32Platform {
    fn create_window(&mut self, desc: &WindowDesc) -> Result<WindowHandle, WindowError> {
        self.register_class()?;

        let running: *const Cell<bool> = &*self.running;

        let hwnd = unsafe {
            CreateWindowExA(
                0,
                CLASS_NAME.as_ptr() as _,
                desc.title.as_ptr() as _,
                window_style(desc.style),
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                desc.size.width,
                desc.size.height,
                0,
                0,
                self.instance,
                running as *const c_void,
            )
        };

        if hwnd == 0 {
            return Err(WindowError::Creation);
        }

        Ok(WindowHandle(hwnd))
    }

    fn destroy_window(&mut self, window: WindowHandle) -> bool {
        unsafe { DestroyWindow(window.0) != 0 }
    }

    fn show_window(&mut self, window: WindowHandle) {
        unsafe { ShowWindow(window.0, SW_SHOW) };
    }

    fn adjust_window_size(&self, client: Size, style: WindowStyle) -> Option<Size> {
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: client.width,
            bottom: client.height,
        };

        let success = unsafe { AdjustWindowRect(&mut rect, window_style(style), 0) };

        (success != 0).then(|| Size::new(rect.right - rect.left, rect.bottom - rect.top))
    }

    fn client_size(&self, window: WindowHandle) -> Option<Size> {
        let mut rect = unsafe { mem::zeroed::<RECT>() };

        let success = unsafe { GetClientRect(window.0, &mut rect) };

        (success != 0).then(|| Size::new(rect.right - rect.left, rect.bottom - rect.top))
    }

    fn device_context(&mut self, window: WindowHandle) -> Option<DeviceContext> {
        let hdc = unsafe { GetDC(window.0) };
        (hdc != 0).then_some(DeviceContext(hdc))
    }

    fn release_device_context(&mut self, window: WindowHandle, dc: DeviceContext) -> bool {
        unsafe { ReleaseDC(window.0, dc.0) != 0 }
    }

    fn choose_pixel_format(&mut self, dc: DeviceContext, desc: &PixelFormatDescriptor) -> Option<i32> {
        let idx = unsafe { ChoosePixelFormat(dc.0, &to_native(desc)) };
        (idx != 0).then_some(idx)
    }

    fn describe_pixel_format(&mut self, dc: DeviceContext, format: i32) -> Option<PixelFormatDescriptor> {
        let mut pfd = unsafe { mem::zeroed::<PIXELFORMATDESCRIPTOR>() };

        let max = unsafe {
            DescribePixelFormat(dc.0, format as _, mem::size_of::<PIXELFORMATDESCRIPTOR>() as _, &mut pfd)
        };

        (max != 0).then(|| from_native(&pfd))
    }

    fn set_pixel_format(&mut self, dc: DeviceContext, format: i32, desc: &PixelFormatDescriptor) -> bool {
        unsafe { SetPixelFormat(dc.0, format, &to_native(desc)) != 0 }
    }

    fn create_legacy_context(&mut self, dc: DeviceContext) -> Option<RenderingContext> {
        let hglrc = unsafe { wglCreateContext(dc.0) };
        (hglrc != 0).then_some(RenderingContext(hglrc))
    }

    fn make_current(&mut self, dc: Option<DeviceContext>, context: Option<RenderingContext>) -> bool {
        let hdc = dc.map_or(0, |dc| dc.0);
        let hglrc = context.map_or(0, |context| context.0);

        unsafe { wglMakeCurrent(hdc, hglrc) != 0 }
    }

    fn delete_context(&mut self, context: RenderingContext) -> bool {
        unsafe { wglDeleteContext(context.0) != 0 }
    }

    fn choose_pixel_format_arb(
        &mut self,
        extensions: &WglExtensions,
        dc: DeviceContext,
        attribs: &[i32],
    ) -> Option<i32> {
        let mut format = 0;
        let mut count = 0;

        let success = unsafe {
            (extensions.choose_pixel_format)(dc.0, attribs.as_ptr(), ptr::null(), 1, &mut format, &mut count)
        };

        (success != 0 && count > 0).then_some(format)
    }

    fn create_context_attribs_arb(
        &mut self,
        extensions: &WglExtensions,
        dc: DeviceContext,
        attribs: &[i32],
    ) -> Option<RenderingContext> {
        let hglrc = unsafe { (extensions.create_context_attribs)(dc.0, 0, attribs.as_ptr()) };
        (hglrc != 0).then_some(RenderingContext(hglrc))
    }

    fn swap_buffers(&mut self, dc: DeviceContext) -> bool {
        unsafe { SwapBuffers(dc.0) != 0 }
    }

    fn request_close(&mut self, window: WindowHandle) {
        if unsafe { PostMessageA(window.0, WM_CLOSE, 0, 0) } == 0 {
            warn!("Failed to post close request to {window:?}");
        }
    }

    fn pump_messages(&mut self, window: WindowHandle) -> bool {
        let mut message = unsafe { mem::zeroed::<MSG>() };

        while unsafe { PeekMessageA(&mut message, window.0, 0, 0, PM_REMOVE) } != 0 {
            unsafe {
                TranslateMessage(&message);
                DispatchMessageA(&message);
            }
        }

        self.running.get()
    }
}

/// Modal error box, for failures the user would otherwise never see.
pub fn show_error(text: &CStr) {
    unsafe { MessageBoxA(0, text.as_ptr() as _, c"Error".as_ptr() as _, MB_ICONERROR) };
}

extern "system" fn message_callback(hwnd: HWND, message: u32, w: WPARAM, l: LPARAM) -> LRESULT {
    match message {
        WM_NCCREATE => {
            let create = unsafe { (l as *const CREATESTRUCTA).as_ref() };

            if let Some(create) = create {
                unsafe { SetWindowLongPtrA(hwnd, GWLP_USERDATA, create.lpCreateParams as _) };
            }

            unsafe { DefWindowProcA(hwnd, message, w, l) }
        }

        WM_CLOSE => {
            let running = unsafe { GetWindowLongPtrA(hwnd, GWLP_USERDATA) } as *const Cell<bool>;

            if let Some(running) = unsafe { running.as_ref() } {
                running.set(false);
            }

            0
        }

        _ => unsafe { DefWindowProcA(hwnd, message, w, l) },
    }
}

//! Scripted platform and log capture shared by the unit tests.

use core::{
    cell::RefCell,
    ffi::{c_void, CStr},
};
use std::{cell::RefMut, rc::Rc, sync::Once};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::{
    platform::{
        DeviceContext, LibraryHandle, PixelFormatDescriptor, Platform, ProcAddress, RenderingContext, Size,
        WindowDesc, WindowError, WindowHandle, WindowStyle,
    },
    resolver::ProcLoader,
    wgl::WglExtensions,
};

thread_local! {
    static CAPTURED: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED.with(|captured| {
            captured
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Installs the capturing logger and clears this thread's buffer.
pub fn capture_logs() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(LevelFilter::Trace);
    });

    CAPTURED.with(|captured| captured.borrow_mut().clear());
}

pub fn captured() -> Vec<(Level, String)> {
    CAPTURED.with(|captured| captured.borrow().clone())
}

/// Entry points only the base library exports.
const LIBRARY_SYMBOLS: &[&str] = &[
    "glDeleteTextures",
    "glGenTextures",
    "glBindTexture",
    "glDrawArrays",
    "glClearColor",
    "glClear",
    "glViewport",
    "glEnable",
    "glGetString",
];

static DRIVER_SLOTS: [u8; 256] = [0; 256];
static LIBRARY_SLOTS: [u8; 32] = [0; 32];

/// Frame added around the client area of an overlapped window.
pub const FRAME: Size = Size::new(16, 39);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fail {
    RegisterClass,
    /// 0 is the dummy window, 1 the real one.
    CreateWindow(usize),
    DeviceContext(usize),
    AdjustWindowSize,
    ChoosePixelFormat,
    DescribePixelFormat,
    /// Indexed like `CreateWindow`.
    SetPixelFormat(usize),
    CreateLegacyContext,
    ActivateLegacy,
    ChoosePixelFormatArb,
    CreateContextAttribs,
    ActivateCore,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    CreateWindow(WindowHandle, Size),
    DestroyWindow(WindowHandle),
    ShowWindow(WindowHandle),
    GetDc(WindowHandle),
    ReleaseDc(WindowHandle),
    CreateLegacyContext(RenderingContext),
    MakeCurrent(Option<RenderingContext>),
    DeleteContext(RenderingContext),
    ChoosePixelFormatArb,
    CreateContextAttribs(RenderingContext),
}

pub struct MockState {
    next_handle: isize,
    driver_names: Vec<String>,
    hidden: Vec<String>,
    sentinels: Vec<(String, isize)>,
    windows: Vec<(WindowHandle, WindowStyle, Size)>,
    legacy_contexts: Vec<RenderingContext>,
    windows_created: usize,
    dcs_requested: usize,
    formats_set: usize,

    pub calls: Vec<Call>,
    pub live_windows: Vec<WindowHandle>,
    pub max_live_windows: usize,
    pub live_contexts: Vec<RenderingContext>,
    pub current: Option<RenderingContext>,
    pub pixel_format: Option<i32>,
    pub pixel_attribs: Vec<i32>,
    pub context_attribs: Vec<i32>,
    pub failures: Vec<Fail>,
    pub library_missing: bool,
    pub library_opens: usize,
    pub library_closes: usize,
    pub close_pending: bool,
    pub running: bool,
    pub pumps: usize,
    pub swaps: usize,
}

impl MockState {
    fn handle(&mut self) -> isize {
        self.next_handle += 1;
        self.next_handle
    }

    fn fails(&self, fail: Fail) -> bool {
        self.failures.contains(&fail)
    }

    pub fn fail(&mut self, fail: Fail) {
        self.failures.push(fail);
    }

    pub fn hide_driver_symbol(&mut self, name: &str) {
        self.hidden.push(name.into());
    }

    /// Makes the driver answer `name` with a failure sentinel instead of an address.
    pub fn driver_sentinel(&mut self, name: &str, sentinel: isize) {
        self.sentinels.push((name.into(), sentinel));
    }

    /// Pretends a context is current so the driver answers queries.
    pub fn make_current_for_test(&mut self) {
        let context = RenderingContext(self.handle());
        self.live_contexts.push(context);
        self.current = Some(context);
    }

    pub fn created_sizes(&self) -> Vec<Size> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::CreateWindow(_, size) => Some(*size),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, wanted: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.iter().position(wanted)
    }

    fn driver_slot(&mut self, name: &str) -> ProcAddress {
        let index = match self.driver_names.iter().position(|known| known == name) {
            Some(index) => index,
            None => {
                self.driver_names.push(name.into());
                self.driver_names.len() - 1
            }
        };

        ProcAddress::new(&DRIVER_SLOTS[index % DRIVER_SLOTS.len()] as *const u8 as _)
            .expect("static slots are never null")
    }
}

#[derive(Clone)]
pub struct MockPlatform {
    state: Rc<RefCell<MockState>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        let state = MockState {
            next_handle: 0x100,
            driver_names: Vec::new(),
            hidden: Vec::new(),
            sentinels: Vec::new(),
            windows: Vec::new(),
            legacy_contexts: Vec::new(),
            windows_created: 0,
            dcs_requested: 0,
            formats_set: 0,
            calls: Vec::new(),
            live_windows: Vec::new(),
            max_live_windows: 0,
            live_contexts: Vec::new(),
            current: None,
            pixel_format: None,
            pixel_attribs: Vec::new(),
            context_attribs: Vec::new(),
            failures: Vec::new(),
            library_missing: false,
            library_opens: 0,
            library_closes: 0,
            close_pending: false,
            running: true,
            pumps: 0,
            swaps: 0,
        };

        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn failing(fail: Fail) -> Self {
        let platform = Self::new();
        platform.state().fail(fail);
        platform
    }

    pub fn state(&self) -> RefMut<'_, MockState> {
        self.state.borrow_mut()
    }
}

fn frame(style: WindowStyle) -> Size {
    match style {
        WindowStyle::Overlapped => FRAME,
        WindowStyle::Popup => Size::new(0, 0),
    }
}

impl ProcLoader for MockPlatform {
    fn driver_proc_address(&self, name: &CStr) -> Option<ProcAddress> {
        let mut state = self.state();
        let name = name.to_str().ok()?;

        let known = name.starts_with("wgl") || (name.starts_with("gl") && !LIBRARY_SYMBOLS.contains(&name));
        let real = known && name != "glNotARealFunction";

        if state.current.is_none() {
            return None;
        }

        if let Some((_, sentinel)) = state.sentinels.iter().find(|(known, _)| known == name) {
            return ProcAddress::new(*sentinel as *const c_void);
        }

        if !real || state.hidden.iter().any(|hidden| hidden == name) {
            return None;
        }

        Some(state.driver_slot(name))
    }

    fn open_library(&self, _name: &CStr) -> Option<LibraryHandle> {
        let mut state = self.state();

        if state.library_missing {
            return None;
        }

        state.library_opens += 1;
        Some(LibraryHandle(state.handle()))
    }

    fn library_proc_address(&self, _library: LibraryHandle, name: &CStr) -> Option<ProcAddress> {
        let name = name.to_str().ok()?;
        let index = LIBRARY_SYMBOLS.iter().position(|known| *known == name)?;

        ProcAddress::new(&LIBRARY_SLOTS[index] as *const u8 as _)
    }

    fn close_library(&self, _library: LibraryHandle) {
        self.state().library_closes += 1;
    }
}

impl Platform for MockPlatform {
    fn create_window(&mut self, desc: &WindowDesc) -> Result<WindowHandle, WindowError> {
        let mut state = self.state();
        let nth = state.windows_created;
        state.windows_created += 1;

        if state.fails(Fail::RegisterClass) {
            return Err(WindowError::ClassRegistration);
        }

        if state.fails(Fail::CreateWindow(nth)) {
            return Err(WindowError::Creation);
        }

        let window = WindowHandle(state.handle());
        state.windows.push((window, desc.style, desc.size));
        state.live_windows.push(window);
        state.max_live_windows = state.max_live_windows.max(state.live_windows.len());
        state.calls.push(Call::CreateWindow(window, desc.size));

        Ok(window)
    }

    fn destroy_window(&mut self, window: WindowHandle) -> bool {
        let mut state = self.state();
        state.calls.push(Call::DestroyWindow(window));

        let before = state.live_windows.len();
        state.live_windows.retain(|live| *live != window);
        before != state.live_windows.len()
    }

    fn show_window(&mut self, window: WindowHandle) {
        self.state().calls.push(Call::ShowWindow(window));
    }

    fn adjust_window_size(&self, client: Size, style: WindowStyle) -> Option<Size> {
        if self.state.borrow().fails(Fail::AdjustWindowSize) {
            return None;
        }

        let frame = frame(style);
        Some(Size::new(client.width + frame.width, client.height + frame.height))
    }

    fn client_size(&self, window: WindowHandle) -> Option<Size> {
        let state = self.state.borrow();
        let (_, style, outer) = state.windows.iter().find(|(handle, ..)| *handle == window)?;
        let frame = frame(*style);

        Some(Size::new(outer.width - frame.width, outer.height - frame.height))
    }

    fn device_context(&mut self, window: WindowHandle) -> Option<DeviceContext> {
        let mut state = self.state();
        let nth = state.dcs_requested;
        state.dcs_requested += 1;

        if state.fails(Fail::DeviceContext(nth)) || !state.live_windows.contains(&window) {
            return None;
        }

        state.calls.push(Call::GetDc(window));
        Some(DeviceContext(window.0 + 0x1000))
    }

    fn release_device_context(&mut self, window: WindowHandle, _dc: DeviceContext) -> bool {
        self.state().calls.push(Call::ReleaseDc(window));
        true
    }

    fn choose_pixel_format(&mut self, _dc: DeviceContext, _desc: &PixelFormatDescriptor) -> Option<i32> {
        (!self.state().fails(Fail::ChoosePixelFormat)).then_some(7)
    }

    fn describe_pixel_format(&mut self, _dc: DeviceContext, _format: i32) -> Option<PixelFormatDescriptor> {
        (!self.state().fails(Fail::DescribePixelFormat)).then(PixelFormatDescriptor::legacy_default)
    }

    fn set_pixel_format(&mut self, _dc: DeviceContext, format: i32, _desc: &PixelFormatDescriptor) -> bool {
        let mut state = self.state();
        let nth = state.formats_set;
        state.formats_set += 1;

        if state.fails(Fail::SetPixelFormat(nth)) {
            return false;
        }

        state.pixel_format = Some(format);
        true
    }

    fn create_legacy_context(&mut self, _dc: DeviceContext) -> Option<RenderingContext> {
        let mut state = self.state();

        if state.fails(Fail::CreateLegacyContext) {
            return None;
        }

        let context = RenderingContext(state.handle());
        state.legacy_contexts.push(context);
        state.live_contexts.push(context);
        state.calls.push(Call::CreateLegacyContext(context));
        Some(context)
    }

    fn make_current(&mut self, dc: Option<DeviceContext>, context: Option<RenderingContext>) -> bool {
        let mut state = self.state();
        state.calls.push(Call::MakeCurrent(context));

        if let (Some(_), Some(context)) = (dc, context) {
            let legacy = state.legacy_contexts.contains(&context);

            if (legacy && state.fails(Fail::ActivateLegacy)) || (!legacy && state.fails(Fail::ActivateCore)) {
                return false;
            }
        }

        state.current = context;
        true
    }

    fn delete_context(&mut self, context: RenderingContext) -> bool {
        let mut state = self.state();
        state.calls.push(Call::DeleteContext(context));
        state.live_contexts.retain(|live| *live != context);

        if state.current == Some(context) {
            state.current = None;
        }

        true
    }

    fn choose_pixel_format_arb(
        &mut self,
        _extensions: &WglExtensions,
        _dc: DeviceContext,
        attribs: &[i32],
    ) -> Option<i32> {
        let mut state = self.state();
        state.calls.push(Call::ChoosePixelFormatArb);
        state.pixel_attribs = attribs.to_vec();

        (!state.fails(Fail::ChoosePixelFormatArb)).then_some(42)
    }

    fn create_context_attribs_arb(
        &mut self,
        _extensions: &WglExtensions,
        _dc: DeviceContext,
        attribs: &[i32],
    ) -> Option<RenderingContext> {
        let mut state = self.state();
        state.context_attribs = attribs.to_vec();

        if state.fails(Fail::CreateContextAttribs) {
            return None;
        }

        let context = RenderingContext(state.handle());
        state.live_contexts.push(context);
        state.calls.push(Call::CreateContextAttribs(context));
        Some(context)
    }

    fn swap_buffers(&mut self, _dc: DeviceContext) -> bool {
        self.state().swaps += 1;
        true
    }

    fn request_close(&mut self, window: WindowHandle) {
        let mut state = self.state();

        if state.live_windows.contains(&window) {
            state.close_pending = true;
        }
    }

    fn pump_messages(&mut self, _window: WindowHandle) -> bool {
        let mut state = self.state();
        state.pumps += 1;

        if state.close_pending {
            state.close_pending = false;
            state.running = false;
        }

        state.running
    }
}

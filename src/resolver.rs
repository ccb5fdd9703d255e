//! Entry point lookup: driver query first, then the base OpenGL library.

use core::ffi::CStr;

use log::{error, trace, warn};

use crate::platform::{LibraryHandle, ProcAddress};

/// Base library exporting the OpenGL 1.1 entry points.
pub const OPENGL_LIBRARY: &CStr = c"opengl32.dll";

pub trait ProcLoader {
    /// Asks the current rendering context's driver. Only meaningful while a
    /// context is current. Raw answers, sentinels included.
    fn driver_proc_address(&self, name: &CStr) -> Option<ProcAddress>;

    fn open_library(&self, name: &CStr) -> Option<LibraryHandle>;
    fn library_proc_address(&self, library: LibraryHandle, name: &CStr) -> Option<ProcAddress>;
    fn close_library(&self, library: LibraryHandle);
}

/// Some drivers report failure with small sentinels instead of null.
pub fn is_valid_driver_address(addr: isize) -> bool {
    !matches!(addr, 0 | 1 | 2 | 3 | -1)
}

/// Resolves `name`, logging one error when both tiers come up empty.
pub fn resolve<L: ProcLoader + ?Sized>(loader: &L, name: &CStr) -> Option<ProcAddress> {
    match loader.driver_proc_address(name) {
        Some(proc) if is_valid_driver_address(proc.addr() as isize) => {
            trace!("{} resolved by driver", name.to_string_lossy());
            return Some(proc);
        }

        Some(proc) => trace!("Driver returned sentinel {:#x} for {}", proc.addr(), name.to_string_lossy()),
        None => {}
    }

    let proc = match loader.open_library(OPENGL_LIBRARY) {
        Some(library) => {
            let proc = loader.library_proc_address(library, name);
            loader.close_library(library);
            proc
        }

        None => {
            warn!("Failed to load {}", OPENGL_LIBRARY.to_string_lossy());
            None
        }
    };

    match proc {
        Some(_) => trace!("{} resolved from {}", name.to_string_lossy(), OPENGL_LIBRARY.to_string_lossy()),
        None => error!("Failed to load OpenGL function: {}", name.to_string_lossy()),
    }

    proc
}

/// Resolves a symbol and reinterprets it as `unsafe extern "system" fn(..)`.
///
/// Must be used inside `unsafe`: the caller vouches for the signature.
#[macro_export]
macro_rules! resolve_fn {
    ($loader:expr, $name:literal, $($ty:tt)*) => {{
        use ::core::{ffi::{c_void, CStr}, mem};

        let name: &CStr = $name;
        $crate::resolver::resolve($loader, name)
            .map(|proc| mem::transmute::<*const c_void, unsafe extern "system" $($ty)*>(proc.as_ptr()))
    }};
}

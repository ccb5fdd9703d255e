//! WGL_ARB_pixel_format / WGL_ARB_create_context plumbing.
//!
//! Values from <https://www.khronos.org/registry/OpenGL/api/GL/wglext.h>.

use thiserror::Error;

use crate::{config::ContextConfig, resolve_fn, resolver::ProcLoader};

pub const WGL_DRAW_TO_WINDOW_ARB: i32 = 0x2001;
pub const WGL_ACCELERATION_ARB: i32 = 0x2003;
pub const WGL_SUPPORT_OPENGL_ARB: i32 = 0x2010;
pub const WGL_DOUBLE_BUFFER_ARB: i32 = 0x2011;
pub const WGL_PIXEL_TYPE_ARB: i32 = 0x2013;
pub const WGL_COLOR_BITS_ARB: i32 = 0x2014;
pub const WGL_ALPHA_BITS_ARB: i32 = 0x201B;
pub const WGL_DEPTH_BITS_ARB: i32 = 0x2022;
pub const WGL_STENCIL_BITS_ARB: i32 = 0x2023;
pub const WGL_FULL_ACCELERATION_ARB: i32 = 0x2027;
pub const WGL_TYPE_RGBA_ARB: i32 = 0x202B;
pub const WGL_SAMPLE_BUFFERS_ARB: i32 = 0x2041;
pub const WGL_SAMPLES_ARB: i32 = 0x2042;

pub const WGL_CONTEXT_MAJOR_VERSION_ARB: i32 = 0x2091;
pub const WGL_CONTEXT_MINOR_VERSION_ARB: i32 = 0x2092;
pub const WGL_CONTEXT_FLAGS_ARB: i32 = 0x2094;
pub const WGL_CONTEXT_PROFILE_MASK_ARB: i32 = 0x9126;
pub const WGL_CONTEXT_DEBUG_BIT_ARB: i32 = 0x0001;
pub const WGL_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: i32 = 0x0002;
pub const WGL_CONTEXT_CORE_PROFILE_BIT_ARB: i32 = 0x0001;

const TRUE: i32 = 1;

pub type ChoosePixelFormatArb = unsafe extern "system" fn(
    hdc: isize,
    attrib_ilist: *const i32,
    attrib_flist: *const f32,
    max_formats: u32,
    formats: *mut i32,
    num_formats: *mut u32,
) -> i32;

pub type CreateContextAttribsArb =
    unsafe extern "system" fn(hdc: isize, share_context: isize, attrib_list: *const i32) -> isize;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("mandatory WGL extension {0} unavailable")]
pub struct MissingExtension(pub &'static str);

/// The two extension functions the real window cannot be set up without.
#[derive(Clone, Copy, Debug)]
pub struct WglExtensions {
    pub choose_pixel_format: ChoosePixelFormatArb,
    pub create_context_attribs: CreateContextAttribsArb,
}

impl WglExtensions {
    /// Resolves both functions. A context must be current on this thread.
    pub fn load<L: ProcLoader + ?Sized>(loader: &L) -> Result<Self, MissingExtension> {
        let choose_pixel_format = unsafe {
            resolve_fn!(
                loader,
                c"wglChoosePixelFormatARB",
                fn(isize, *const i32, *const f32, u32, *mut i32, *mut u32) -> i32
            )
        };

        let create_context_attribs =
            unsafe { resolve_fn!(loader, c"wglCreateContextAttribsARB", fn(isize, isize, *const i32) -> isize) };

        let choose_pixel_format = choose_pixel_format.ok_or(MissingExtension("wglChoosePixelFormatARB"))?;
        let create_context_attribs =
            create_context_attribs.ok_or(MissingExtension("wglCreateContextAttribsARB"))?;

        Ok(Self {
            choose_pixel_format,
            create_context_attribs,
        })
    }
}

/// Zero-terminated attribute list for `wglChoosePixelFormatARB`.
pub fn pixel_format_attribs(config: &ContextConfig) -> Vec<i32> {
    #[rustfmt::skip]
    let mut attribs = vec![
        WGL_DRAW_TO_WINDOW_ARB, TRUE,
        WGL_SUPPORT_OPENGL_ARB, TRUE,
        WGL_DOUBLE_BUFFER_ARB, TRUE,
        WGL_ACCELERATION_ARB, WGL_FULL_ACCELERATION_ARB,
        WGL_PIXEL_TYPE_ARB, WGL_TYPE_RGBA_ARB,
        WGL_COLOR_BITS_ARB, config.color_bits,
        WGL_ALPHA_BITS_ARB, config.alpha_bits,
        WGL_DEPTH_BITS_ARB, config.depth_bits,
        WGL_STENCIL_BITS_ARB, config.stencil_bits,
    ];

    if config.samples > 0 {
        attribs.extend([WGL_SAMPLE_BUFFERS_ARB, TRUE, WGL_SAMPLES_ARB, config.samples]);
    }

    attribs.push(0);
    attribs
}

/// Zero-terminated attribute list for `wglCreateContextAttribsARB`.
pub fn context_attribs(config: &ContextConfig) -> Vec<i32> {
    let mut flags = WGL_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB;

    if config.debug {
        flags |= WGL_CONTEXT_DEBUG_BIT_ARB;
    }

    #[rustfmt::skip]
    let attribs = vec![
        WGL_CONTEXT_MAJOR_VERSION_ARB, config.major,
        WGL_CONTEXT_MINOR_VERSION_ARB, config.minor,
        WGL_CONTEXT_PROFILE_MASK_ARB, WGL_CONTEXT_CORE_PROFILE_BIT_ARB,
        WGL_CONTEXT_FLAGS_ARB, flags,
        0,
    ];

    attribs
}

/// Looks up `key` in a zero-terminated `key, value` list.
pub fn attrib_value(attribs: &[i32], key: i32) -> Option<i32> {
    attribs
        .chunks_exact(2)
        .take_while(|pair| pair[0] != 0)
        .find(|pair| pair[0] == key)
        .map(|pair| pair[1])
}

//! Core profile entry points as a typed, immutable capability table.
//!
//! Every entry point is named by a [`GlSymbol`] and has a marker type in
//! [`cmd`] carrying its signature, so a call site reads
//!
//! ```ignore
//! if let Some(clear) = gl.get::<cmd::Clear>() {
//!     unsafe { clear(GL_COLOR_BUFFER_BIT) };
//! }
//! ```

use core::{
    ffi::{c_char, c_void, CStr},
    mem,
};

use log::{debug, error, info, trace, warn};

use crate::{
    platform::ProcAddress,
    resolver::{self, ProcLoader},
};

pub type GLenum = u32;
pub type GLbitfield = u32;
pub type GLuint = u32;
pub type GLint = i32;
pub type GLsizei = i32;
pub type GLboolean = u8;
pub type GLfloat = f32;
pub type GLchar = c_char;
pub type GLubyte = u8;
pub type GLintptr = isize;
pub type GLsizeiptr = isize;

pub type GLDEBUGPROC = Option<
    extern "system" fn(
        source: GLenum,
        gltype: GLenum,
        id: GLuint,
        severity: GLenum,
        length: GLsizei,
        message: *const GLchar,
        user_param: *mut c_void,
    ),
>;

pub const GL_COLOR_BUFFER_BIT: GLbitfield = 0x0000_4000;
pub const GL_VENDOR: GLenum = 0x1F00;
pub const GL_RENDERER: GLenum = 0x1F01;
pub const GL_VERSION: GLenum = 0x1F02;
pub const GL_DEBUG_OUTPUT_SYNCHRONOUS: GLenum = 0x8242;
pub const GL_DEBUG_OUTPUT: GLenum = 0x92E0;
pub const GL_DEBUG_SEVERITY_HIGH: GLenum = 0x9146;
pub const GL_DEBUG_SEVERITY_MEDIUM: GLenum = 0x9147;
pub const GL_DEBUG_SEVERITY_LOW: GLenum = 0x9148;
pub const GL_DEBUG_SEVERITY_NOTIFICATION: GLenum = 0x826B;

/// Ties a marker type to its symbol and signature.
pub trait GlCommand {
    const SYMBOL: GlSymbol;
    type Fn: Copy;
}

macro_rules! gl_commands {
    ($($cmd:ident => $name:literal, fn($($arg:ty),*) $(-> $ret:ty)?;)*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum GlSymbol {
            $($cmd,)*
        }

        impl GlSymbol {
            pub const ALL: &'static [GlSymbol] = &[$(GlSymbol::$cmd,)*];

            pub fn name(self) -> &'static CStr {
                match self {
                    $(GlSymbol::$cmd => $name,)*
                }
            }
        }

        /// Signature markers, one per [`GlSymbol`].
        pub mod cmd {
            #[allow(unused_imports)]
            use super::*;

            $(
                pub enum $cmd {}

                impl GlCommand for $cmd {
                    const SYMBOL: GlSymbol = GlSymbol::$cmd;
                    type Fn = unsafe extern "system" fn($($arg),*) $(-> $ret)?;
                }
            )*
        }
    };
}

gl_commands! {
    CreateProgram => c"glCreateProgram", fn() -> GLuint;
    DeleteTextures => c"glDeleteTextures", fn(GLsizei, *const GLuint);
    GenTextures => c"glGenTextures", fn(GLsizei, *mut GLuint);
    BindTexture => c"glBindTexture", fn(GLenum, GLuint);
    DrawArrays => c"glDrawArrays", fn(GLenum, GLint, GLsizei);
    CreateShader => c"glCreateShader", fn(GLenum) -> GLuint;
    GetUniformLocation => c"glGetUniformLocation", fn(GLuint, *const GLchar) -> GLint;
    Uniform1f => c"glUniform1f", fn(GLint, GLfloat);
    Uniform2fv => c"glUniform2fv", fn(GLint, GLsizei, *const GLfloat);
    Uniform3fv => c"glUniform3fv", fn(GLint, GLsizei, *const GLfloat);
    Uniform1i => c"glUniform1i", fn(GLint, GLint);
    UniformMatrix4fv => c"glUniformMatrix4fv", fn(GLint, GLsizei, GLboolean, *const GLfloat);
    VertexAttribDivisor => c"glVertexAttribDivisor", fn(GLuint, GLuint);
    ActiveTexture => c"glActiveTexture", fn(GLenum);
    BufferSubData => c"glBufferSubData", fn(GLenum, GLintptr, GLsizeiptr, *const c_void);
    DrawArraysInstanced => c"glDrawArraysInstanced", fn(GLenum, GLint, GLsizei, GLsizei);
    BindFramebuffer => c"glBindFramebuffer", fn(GLenum, GLuint);
    CheckFramebufferStatus => c"glCheckFramebufferStatus", fn(GLenum) -> GLenum;
    GenFramebuffers => c"glGenFramebuffers", fn(GLsizei, *mut GLuint);
    FramebufferTexture2D => c"glFramebufferTexture2D", fn(GLenum, GLenum, GLenum, GLuint, GLint);
    DrawBuffers => c"glDrawBuffers", fn(GLsizei, *const GLenum);
    DeleteFramebuffers => c"glDeleteFramebuffers", fn(GLsizei, *const GLuint);
    BlendFunci => c"glBlendFunci", fn(GLuint, GLenum, GLenum);
    BlendEquation => c"glBlendEquation", fn(GLenum);
    ClearBufferfv => c"glClearBufferfv", fn(GLenum, GLint, *const GLfloat);
    ShaderSource => c"glShaderSource", fn(GLuint, GLsizei, *const *const GLchar, *const GLint);
    CompileShader => c"glCompileShader", fn(GLuint);
    GetShaderiv => c"glGetShaderiv", fn(GLuint, GLenum, *mut GLint);
    GetShaderInfoLog => c"glGetShaderInfoLog", fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar);
    AttachShader => c"glAttachShader", fn(GLuint, GLuint);
    LinkProgram => c"glLinkProgram", fn(GLuint);
    ValidateProgram => c"glValidateProgram", fn(GLuint);
    GetProgramiv => c"glGetProgramiv", fn(GLuint, GLenum, *mut GLint);
    GetProgramInfoLog => c"glGetProgramInfoLog", fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar);
    GenBuffers => c"glGenBuffers", fn(GLsizei, *mut GLuint);
    GenVertexArrays => c"glGenVertexArrays", fn(GLsizei, *mut GLuint);
    GetAttribLocation => c"glGetAttribLocation", fn(GLuint, *const GLchar) -> GLint;
    BindVertexArray => c"glBindVertexArray", fn(GLuint);
    EnableVertexAttribArray => c"glEnableVertexAttribArray", fn(GLuint);
    VertexAttribPointer => c"glVertexAttribPointer", fn(GLuint, GLint, GLenum, GLboolean, GLsizei, *const c_void);
    BindBuffer => c"glBindBuffer", fn(GLenum, GLuint);
    BindBufferBase => c"glBindBufferBase", fn(GLenum, GLuint, GLuint);
    BufferData => c"glBufferData", fn(GLenum, GLsizeiptr, *const c_void, GLenum);
    GetVertexAttribPointerv => c"glGetVertexAttribPointerv", fn(GLuint, GLenum, *mut *mut c_void);
    UseProgram => c"glUseProgram", fn(GLuint);
    DeleteVertexArrays => c"glDeleteVertexArrays", fn(GLsizei, *const GLuint);
    DeleteBuffers => c"glDeleteBuffers", fn(GLsizei, *const GLuint);
    DeleteProgram => c"glDeleteProgram", fn(GLuint);
    DetachShader => c"glDetachShader", fn(GLuint, GLuint);
    DeleteShader => c"glDeleteShader", fn(GLuint);
    DrawElementsInstanced => c"glDrawElementsInstanced", fn(GLenum, GLsizei, GLenum, *const c_void, GLsizei);
    GenerateMipmap => c"glGenerateMipmap", fn(GLenum);
    DebugMessageCallback => c"glDebugMessageCallback", fn(GLDEBUGPROC, *const c_void);
    ClearColor => c"glClearColor", fn(GLfloat, GLfloat, GLfloat, GLfloat);
    Clear => c"glClear", fn(GLbitfield);
    Viewport => c"glViewport", fn(GLint, GLint, GLsizei, GLsizei);
    Enable => c"glEnable", fn(GLenum);
    GetString => c"glGetString", fn(GLenum) -> *const GLubyte;
}

/// Addresses for every [`GlSymbol`], resolved once against one context.
///
/// A missing entry stays `None`; it was logged by name during [`GlFunctions::load`].
pub struct GlFunctions {
    table: Box<[Option<ProcAddress>]>,
}

impl GlFunctions {
    /// Resolves the whole table. The target context must be current.
    pub fn load<L: ProcLoader + ?Sized>(loader: &L) -> Self {
        let table: Box<[_]> = GlSymbol::ALL
            .iter()
            .map(|symbol| resolver::resolve(loader, symbol.name()))
            .collect();

        let loaded = table.iter().filter(|entry| entry.is_some()).count();

        if loaded == table.len() {
            info!("Loaded OpenGL functions ({loaded})");
        } else {
            warn!("Loaded {loaded} of {} OpenGL functions", table.len());
        }

        Self { table }
    }

    pub fn address(&self, symbol: GlSymbol) -> Option<ProcAddress> {
        self.table[symbol as usize]
    }

    pub fn is_loaded(&self, symbol: GlSymbol) -> bool {
        self.address(symbol).is_some()
    }

    pub fn missing(&self) -> impl Iterator<Item = GlSymbol> + '_ {
        GlSymbol::ALL.iter().copied().filter(|symbol| !self.is_loaded(*symbol))
    }

    /// Typed pointer for `C`. Calling it is still `unsafe`.
    pub fn get<C: GlCommand>(&self) -> Option<C::Fn> {
        debug_assert_eq!(mem::size_of::<C::Fn>(), mem::size_of::<*const c_void>());

        self.address(C::SYMBOL)
            .map(|proc| unsafe { mem::transmute_copy::<*const c_void, C::Fn>(&proc.as_ptr()) })
    }
}

/// Forwards driver debug output to `log` at a matching level.
pub extern "system" fn debug_message_callback(
    _source: GLenum,
    _gltype: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    _user_param: *mut c_void,
) {
    if message.is_null() {
        return;
    }

    let text = match usize::try_from(length) {
        Ok(len) => {
            let bytes = unsafe { core::slice::from_raw_parts(message as *const u8, len) };
            String::from_utf8_lossy(bytes).into_owned()
        }

        Err(_) => unsafe { CStr::from_ptr(message) }.to_string_lossy().into_owned(),
    };

    match severity {
        GL_DEBUG_SEVERITY_HIGH => error!("GL [{id}] {text}"),
        GL_DEBUG_SEVERITY_MEDIUM => warn!("GL [{id}] {text}"),
        GL_DEBUG_SEVERITY_LOW => debug!("GL [{id}] {text}"),
        _ => trace!("GL [{id}] {text}"),
    }
}

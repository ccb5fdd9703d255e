//! Two-pass window/context bring-up.
//!
//! A multisampled core profile context needs `wglChoosePixelFormatARB` and
//! `wglCreateContextAttribsARB`, which can only be resolved while *some*
//! context is current. So a throwaway window gets a legacy context first,
//! the two extensions are resolved through it, everything is torn down, and
//! only then is the real window created and given its final pixel format
//! (which a window can be assigned only once).

use log::{debug, error, info, trace, warn};
use thiserror::Error;

use crate::{
    config::{Config, ConfigError},
    gl::GlFunctions,
    platform::{
        DeviceContext, PixelFormatDescriptor, Platform, RenderingContext, Size, WindowError, WindowHandle,
    },
    surface::GlSurface,
    wgl::{self, MissingExtension, WglExtensions},
};

/// Bootstrap progress. Ordered: a run only ever moves forward, or to `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Unstarted,
    DummyWindowCreated,
    LegacyContextCurrent,
    ExtensionsResolved,
    LegacyTeardown,
    RealWindowCreated,
    FormatChosen,
    CoreContextCurrent,
    Failed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BootstrapErrorKind {
    #[error("invalid window description: {0}")]
    Config(String),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error("device context unavailable")]
    NoDeviceContext,

    #[error("no matching pixel format found")]
    NoMatchingPixelFormat,

    #[error("pixel format {0} could not be described")]
    DescribePixelFormat(i32),

    #[error("SetPixelFormat failed for format {0}")]
    SetPixelFormat(i32),

    #[error("legacy rendering context creation failed")]
    LegacyContextCreation,

    #[error("legacy rendering context activation failed")]
    LegacyContextActivation,

    #[error(transparent)]
    MissingExtension(#[from] MissingExtension),

    #[error("OpenGL {major}.{minor} core context creation failed")]
    CoreContextCreation { major: i32, minor: i32 },

    #[error("core rendering context activation failed")]
    CoreContextActivation,
}

impl From<ConfigError> for BootstrapErrorKind {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// `kind` happened while trying to leave `stage`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("bootstrap failed after {stage:?}: {kind}")]
pub struct BootstrapError {
    pub stage: Stage,
    #[source]
    pub kind: BootstrapErrorKind,
}

/// Runs the full protocol and hands back the live surface.
///
/// The platform is moved into the result so the surface owns every handle
/// it references. On failure every window and context created so far has
/// been torn down.
pub fn bootstrap<P: Platform>(platform: P, config: &Config) -> Result<GlSurface<P>, BootstrapError> {
    let mut bootstrap = Bootstrap {
        platform,
        stage: Stage::Unstarted,
        history: vec![Stage::Unstarted],
    };

    let core = bootstrap.run(config)?;
    let gl = GlFunctions::load(&bootstrap.platform);

    Ok(GlSurface::new(bootstrap.platform, core, gl, bootstrap.history))
}

/// Handles produced by a successful run.
pub(crate) struct CoreContext {
    pub window: WindowHandle,
    pub dc: DeviceContext,
    pub context: RenderingContext,
    pub pixel_format: i32,
    pub outer_size: Size,
    pub extensions: WglExtensions,
}

struct Bootstrap<P> {
    platform: P,
    stage: Stage,
    history: Vec<Stage>,
}

/// Whatever part of a window/context pair exists so far.
#[derive(Default)]
struct Partial {
    window: Option<WindowHandle>,
    dc: Option<DeviceContext>,
    context: Option<RenderingContext>,
}

impl<P: Platform> Bootstrap<P> {
    fn advance(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "{next:?} does not follow {:?}", self.stage);
        debug!("Bootstrap: {:?} -> {next:?}", self.stage);

        self.stage = next;
        self.history.push(next);
    }

    fn fail(&mut self, kind: BootstrapErrorKind) -> BootstrapError {
        error!("Bootstrap failed after {:?}: {kind}", self.stage);

        let err = BootstrapError {
            stage: self.stage,
            kind,
        };

        self.stage = Stage::Failed;
        self.history.push(Stage::Failed);
        err
    }

    fn run(&mut self, config: &Config) -> Result<CoreContext, BootstrapError> {
        let mut dummy = Partial::default();
        let extensions = self.legacy_phase(config, &mut dummy);

        // The extensions stay valid after their context is gone.
        self.teardown(dummy);
        let extensions = extensions.map_err(|kind| self.fail(kind))?;
        self.advance(Stage::LegacyTeardown);

        let mut real = Partial::default();

        match self.core_phase(config, extensions, &mut real) {
            Ok(core) => {
                self.platform.show_window(core.window);
                info!("OpenGL {}.{} core context ready", config.context.major, config.context.minor);
                Ok(core)
            }

            Err(kind) => {
                self.teardown(real);
                Err(self.fail(kind))
            }
        }
    }

    fn legacy_phase(
        &mut self,
        config: &Config,
        dummy: &mut Partial,
    ) -> Result<WglExtensions, BootstrapErrorKind> {
        let desc = config.window.desc(config.window.client_size())?;
        let window = self.platform.create_window(&desc)?;
        dummy.window = Some(window);
        self.advance(Stage::DummyWindowCreated);

        let dc = self
            .platform
            .device_context(window)
            .ok_or(BootstrapErrorKind::NoDeviceContext)?;
        dummy.dc = Some(dc);

        let request = PixelFormatDescriptor::legacy_default();
        let format = self
            .platform
            .choose_pixel_format(dc, &request)
            .ok_or(BootstrapErrorKind::NoMatchingPixelFormat)?;

        if !self.platform.set_pixel_format(dc, format, &request) {
            return Err(BootstrapErrorKind::SetPixelFormat(format));
        }

        let context = self
            .platform
            .create_legacy_context(dc)
            .ok_or(BootstrapErrorKind::LegacyContextCreation)?;
        dummy.context = Some(context);

        if !self.platform.make_current(Some(dc), Some(context)) {
            return Err(BootstrapErrorKind::LegacyContextActivation);
        }

        self.advance(Stage::LegacyContextCurrent);

        let extensions = WglExtensions::load(&self.platform)?;
        self.advance(Stage::ExtensionsResolved);

        Ok(extensions)
    }

    fn core_phase(
        &mut self,
        config: &Config,
        extensions: WglExtensions,
        real: &mut Partial,
    ) -> Result<CoreContext, BootstrapErrorKind> {
        let client = config.window.client_size();

        let outer = self
            .platform
            .adjust_window_size(client, config.window.style)
            .unwrap_or_else(|| {
                warn!("Could not adjust {client:?} for the window frame");
                client
            });

        let window = self.platform.create_window(&config.window.desc(outer)?)?;
        real.window = Some(window);
        self.advance(Stage::RealWindowCreated);

        let dc = self
            .platform
            .device_context(window)
            .ok_or(BootstrapErrorKind::NoDeviceContext)?;
        real.dc = Some(dc);

        let attribs = wgl::pixel_format_attribs(&config.context);
        let format = self
            .platform
            .choose_pixel_format_arb(&extensions, dc, &attribs)
            .ok_or(BootstrapErrorKind::NoMatchingPixelFormat)?;

        let desc = self
            .platform
            .describe_pixel_format(dc, format)
            .ok_or(BootstrapErrorKind::DescribePixelFormat(format))?;

        if !self.platform.set_pixel_format(dc, format, &desc) {
            return Err(BootstrapErrorKind::SetPixelFormat(format));
        }

        self.advance(Stage::FormatChosen);

        let attribs = wgl::context_attribs(&config.context);
        let context = self
            .platform
            .create_context_attribs_arb(&extensions, dc, &attribs)
            .ok_or(BootstrapErrorKind::CoreContextCreation {
                major: config.context.major,
                minor: config.context.minor,
            })?;
        real.context = Some(context);

        if !self.platform.make_current(Some(dc), Some(context)) {
            return Err(BootstrapErrorKind::CoreContextActivation);
        }

        self.advance(Stage::CoreContextCurrent);

        Ok(CoreContext {
            window,
            dc,
            context,
            pixel_format: format,
            outer_size: outer,
            extensions,
        })
    }

    /// Best effort; failures here are not fatal.
    fn teardown(&mut self, partial: Partial) {
        if let Some(context) = partial.context {
            let released = self.platform.make_current(None, None);
            let deleted = self.platform.delete_context(context);
            trace!("Released context {context:?} (current: {released}, deleted: {deleted})");
        }

        if let (Some(window), Some(dc)) = (partial.window, partial.dc) {
            let released = self.platform.release_device_context(window, dc);
            trace!("Released device context {dc:?}: {released}");
        }

        if let Some(window) = partial.window {
            let destroyed = self.platform.destroy_window(window);
            trace!("Destroyed window {window:?}: {destroyed}");
        }
    }
}

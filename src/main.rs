use std::process::ExitCode;

use celeste::{
    config::{Config, CONFIG_PATH},
    logging,
};
use log::{error, trace};

fn main() -> ExitCode {
    logging::init();
    trace!("Starting Celeste...");

    let config = match Config::load_or_default(CONFIG_PATH) {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid {CONFIG_PATH}: {err}");
            return ExitCode::FAILURE;
        }
    };

    run(&config)
}

#[cfg(windows)]
fn run(config: &Config) -> ExitCode {
    use std::ffi::CString;

    use celeste::{bootstrap, win32};

    let platform = match win32::Win32Platform::new() {
        Ok(platform) => platform,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let mut surface = match bootstrap(platform, config) {
        Ok(surface) => surface,
        // Already logged with its stage by the bootstrap.
        Err(err) => {
            if let Ok(message) = CString::new(err.to_string()) {
                win32::show_error(&message);
            }

            return ExitCode::FAILURE;
        }
    };

    unsafe {
        surface.log_renderer_info();

        if config.context.debug {
            surface.install_debug_callback();
        }
    }

    trace!("Starting game loop...");

    let clear_color = config.clear_color;

    surface.run_until_closed(|surface| {
        unsafe { surface.clear(clear_color) };
        surface.swap_buffers();
    });

    trace!("Stopping Celeste...");
    ExitCode::SUCCESS
}

#[cfg(not(windows))]
fn run(_config: &Config) -> ExitCode {
    error!("WGL is only available on Windows");
    ExitCode::FAILURE
}

use std::fmt::Debug;
use std::panic::PanicHookInfo;
use std::process::ExitCode;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::OnceLock;

pub trait CliArgs: clap::Parser + Debug { }
impl<T: clap::Parser + Debug> CliArgs for T { }

// Library crates in this workspace that get the app's log level
const WORKSPACE_CRATES: &[&str] = &[
    "nab_rvb",
    "descriptor_rvb",
];

fn crate_name<T>() -> &'static str // hacky
{
    let name = std::any::type_name::<T>();
    &name[0..name.find("::").unwrap_or(name.len())]
}

// Warn for dependencies, debug (or info in release) for this workspace
fn init_logging(app_crate: &'static str)
{
    let workspace_level = match cfg!(debug_assertions)
    {
        true => log::LevelFilter::Debug,
        false => log::LevelFilter::Info,
    };

    let mut log_builder = colog::basic_builder();
    log_builder.filter_level(log::LevelFilter::Warn);
    for module in std::iter::once(app_crate).chain(WORKSPACE_CRATES.iter().copied())
    {
        log_builder.filter_module(module, workspace_level);
    }
    log_builder.parse_default_env().init();
}

#[derive(Debug)]
pub struct AppRun<TCliArgs: CliArgs>
{
    pub app_name: &'static str,
    pub version_str: &'static str,

    pub start_time: chrono::DateTime<chrono::Local>,
    pub args: TCliArgs,
    pub pid: u32,
    pub is_elevated: bool,

    log_target: &'static str, // the app crate, so start and exit lines pass the log filter
    exit_reason: AtomicI32,
}
impl<TCliArgs: CliArgs> AppRun<TCliArgs>
{
    pub fn startup(app_name: &'static str, app_version: &'static str) -> Self
    {
        let log_target = crate_name::<TCliArgs>();
        init_logging(log_target);

        let app_run = Self
        {
            app_name,
            version_str: app_version,
            start_time: chrono::Local::now(),
            args: TCliArgs::parse(),
            pid: std::process::id(),
            is_elevated: is_root::is_root(),
            log_target,
            exit_reason: AtomicI32::new(ExitReason::NormalExit as i32),
        };

        log::info!(target: log_target,
            "=== Starting {} v{} [{}] (PID {}){} at {} ===",
            app_run.app_name,
            app_run.version_str,
            std::env::args().collect::<Vec<_>>().join(" "),
            app_run.pid,
            if app_run.is_elevated { " elevated" } else { "" },
            app_run.start_time);

        app_run
    }

    pub fn set_exit_reason(&self, exit_reason: ExitReason)
    {
        self.exit_reason.store(exit_reason as i32, Ordering::SeqCst);
    }
    pub fn get_exit_reason(&self) -> ExitReason
    {
        ExitReason::from_raw(self.exit_reason.load(Ordering::SeqCst))
    }
}
impl<TCliArgs: CliArgs> Drop for AppRun<TCliArgs>
{
    fn drop(&mut self)
    {
        log::info!(target: self.log_target,
            "Exiting {} (PID {}) at {} with reason {:?}",
            self.app_name,
            self.pid,
            chrono::Local::now(),
            self.get_exit_reason());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitReason
{
    Unset = !1, // this should never be set
    NormalExit = 0,
    BuildFailed = 1,
    Panic = -99,
}
impl ExitReason
{
    fn from_raw(raw: i32) -> Self
    {
        match raw
        {
            0 => Self::NormalExit,
            1 => Self::BuildFailed,
            -99 => Self::Panic,
            _ => Self::Unset,
        }
    }
}
impl std::process::Termination for ExitReason
{
    fn report(self) -> ExitCode
    {
        (self as i32 as u8).into()
    }
}

#[derive(Clone, Copy)]
struct Panic<'p>(&'p PanicHookInfo<'p>);
impl Debug for Panic<'_>
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result
    {
        if let Some(payload_str) = self.0.payload().downcast_ref::<&str>()
        {
            f.write_fmt(format_args!("{payload_str}\n"))?;
        }
        else if let Some(payload_str) = self.0.payload().downcast_ref::<String>()
        {
            f.write_fmt(format_args!("{payload_str}\n"))?;
        }

        if let Some(location) = self.0.location()
        {
            Debug::fmt(&location, f)?
        }

        Ok(())
    }
}

pub fn set_panic_hook()
{
    let default_panic_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic|
    {
        default_panic_hook(panic);
        fatal_error(FatalError::Panic, Panic(panic))
    }));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FatalError
{
    Panic = 1,
}
impl FatalError
{
    pub const fn short_name(self) -> &'static str
    {
        match self
        {
            FatalError::Panic => "PNC",
        }
    }

    // e.g. PNC-0001
    pub fn code(self) -> String { format!("{}-{:04X}", self.short_name(), self as u16) }
}

pub static FATAL_ERROR_CB: OnceLock<fn(&str)> = OnceLock::new();

// Exit the app with a fatal error. Details are only printed in debug builds
pub fn fatal_error(fatal_error: FatalError, details: impl Debug) -> !
{
    let mut error_msg = fatal_error.code();
    if cfg!(debug_assertions)
    {
        error_msg.push_str(&format!("\n\n{details:#?}"));
    }

    eprintln!("!!! FATAL: {}", error_msg);
    if let Some(error_cb) = FATAL_ERROR_CB.get()
    {
        error_cb(&error_msg);
    }

    eprintln!("Exiting (PID {}) at {} with reason {:?}",
              std::process::id(),
              chrono::Local::now(),
              ExitReason::Panic);

    std::process::exit(ExitReason::Panic as i32)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn exit_reason_round_trips_through_raw()
    {
        assert_eq!(ExitReason::BuildFailed, ExitReason::from_raw(ExitReason::BuildFailed as i32));
        assert_eq!(ExitReason::Unset, ExitReason::from_raw(1234));
    }

    #[test]
    fn fatal_codes()
    {
        assert_eq!("PNC", FatalError::Panic.short_name());
        assert_eq!("PNC-0001", FatalError::Panic.code());
    }

    #[test]
    fn crate_name_of_local_type()
    {
        struct Local;
        assert_eq!("nab_rvb", crate_name::<Local>());
    }
}

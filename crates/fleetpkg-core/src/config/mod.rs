//! Run configuration: the settings file and validated command-line options.

pub mod run;
pub mod settings;

pub use run::{BatchSpec, OutputFormat, RawArgs, RunConfig, Verbosity};
pub use settings::{CONFIG_ENV, Settings, Timing};

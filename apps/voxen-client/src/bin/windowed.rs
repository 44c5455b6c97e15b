//! Voxen client without a console window on Windows.

#![windows_subsystem = "windows"]

use std::process::ExitCode;

use voxen_app::{run_app, AppConfig};

fn main() -> ExitCode {
    run_app(AppConfig::default()).into()
}

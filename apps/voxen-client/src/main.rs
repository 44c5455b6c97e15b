//! Voxen client
//!
//! Opens a 500x500 window and clears it every frame with a slowly pulsing
//! blue. Exits with status 1 if the engine fails to come up or a frame fails.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p voxen-client --bin voxen
//! RUST_LOG=debug cargo run -p voxen-client --bin voxen
//! ```

use std::process::ExitCode;

use voxen_app::{run_app, AppConfig};

fn main() -> ExitCode {
    run_app(AppConfig::default()).into()
}

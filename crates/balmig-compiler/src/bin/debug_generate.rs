//! Debug script to see what the migrator generates for one flow document.
//!
//! Usage: `debug_generate [flow.json]`. Without an argument a built-in sample
//! is used. Set `RUST_LOG=debug` to see translator events.

use std::path::Path;

use balmig_compiler::legacy::{load_file, LegacyFile, LegacyProject};
use balmig_compiler::{Migrator, MigratorConfig};
use miette::IntoDiagnostic;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SAMPLE: &str = include_str!("../../tests/fixtures/orders.json");

fn main() -> miette::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let file: LegacyFile = match std::env::args().nth(1) {
        Some(path) => load_file(Path::new(&path))?,
        None => serde_json::from_str(SAMPLE).into_diagnostic()?,
    };

    let project = LegacyProject { files: vec![file] };
    let modules = Migrator::new(MigratorConfig::from_env()).migrate(&project)?;

    for module in &modules {
        println!("// ===== {} =====", module.path.display());
        println!("{}", module.source);
    }
    Ok(())
}

//! wasmlink CLI entry point.
//!
//! Loads one or more WebAssembly modules, builds an import registry from
//! the standard host environment and an optional TOML environment file,
//! and reports whether each module links.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wasmlink_common::ResolverConfig;
use wasmlink_core::{ImportRegistry, ModuleCatalog, Resolver};
use wasmlink_host::{EnvFile, base_environment, registry_from_env};

/// Check that WebAssembly modules link against a host environment.
#[derive(Debug, Parser)]
#[command(name = "wasmlink", version, about)]
struct Args {
    /// WebAssembly modules to check.
    #[arg(required = true, value_name = "MODULE.wasm")]
    modules: Vec<PathBuf>,

    /// TOML environment file with additional import bindings.
    #[arg(long, value_name = "FILE.toml")]
    env: Option<PathBuf>,

    /// Do not register the standard `env` namespace.
    #[arg(long)]
    no_base_env: bool,

    /// Report every link failure per module instead of stopping at the first.
    #[arg(long)]
    collect_all: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wasmlink=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = build_registry(&args)?;
    info!(bindings = registry.len(), "import registry ready");

    let config = if args.collect_all {
        ResolverConfig::collect_all()
    } else {
        ResolverConfig::fail_fast()
    };
    let resolver = Resolver::with_config(config);
    let catalog = ModuleCatalog::new();

    let mut failures = 0usize;
    for path in &args.modules {
        let display = path.display().to_string();
        let bytes = std::fs::read(path).with_context(|| format!("failed to read '{display}'"))?;

        let module = match catalog.load(display.clone(), &bytes) {
            Ok(module) => module,
            Err(err) => {
                println!("{display}: FAILED");
                println!("  {err}");
                failures += 1;
                continue;
            }
        };

        match resolver.instantiate(&module, &registry) {
            Ok(instance) => {
                println!(
                    "{display}: ok ({} imports, {} exports)",
                    instance.import_table().len(),
                    module.export_count()
                );
            }
            Err(err) => {
                println!("{display}: FAILED");
                for error in err.into_errors() {
                    println!("  {error}");
                }
                failures += 1;
            }
        }
    }

    if failures > 0 {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Assemble the import registry from the base environment and the
/// optional environment file; file bindings win on conflicts.
fn build_registry(args: &Args) -> anyhow::Result<ImportRegistry> {
    let mut registry = if args.no_base_env {
        ImportRegistry::new()
    } else {
        base_environment()
    };

    if let Some(path) = &args.env {
        let env = EnvFile::from_file(path)?;
        let from_file = registry_from_env(&env)?;
        registry.merge(&from_file);
        info!(path = %path.display(), bindings = from_file.len(), "environment file loaded");
    }

    Ok(registry)
}

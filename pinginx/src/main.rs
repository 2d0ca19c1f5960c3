//! Pinginx - an nginx-style web server built on Pingora
//!
//! This is the main entry point for the Pinginx CLI.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use pinginx_config::{Compiler, render_diagnostic};
use pinginx_core::ServerDefinition;
use pinginx_proxy::{PinginxProxy, build_listeners};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(target_os = "linux")]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Pinginx - nginx-style configuration, powered by Pingora
#[derive(Parser)]
#[command(name = "pinginx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "PINGINX_CONFIG",
        default_value = "conf/nginx.conf"
    )]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the configuration and serve it
    Run,

    /// Check a configuration file without serving it
    Validate,

    /// Print the parsed configuration tree as JSON
    Dump,

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match cli.command {
        Commands::Run => {
            tracing::info!("Starting Pinginx with config: {}", cli.config.display());
            let servers = load(&cli.config)?;
            run_server(servers)
        }

        Commands::Validate => {
            let source = pinginx_config::read_file(&cli.config)?;
            let mut compiler = Compiler::new();
            let servers = compile(&mut compiler, &source, &cli.config)?;

            for warning in compiler.warnings() {
                println!("⚠️  {}", warning);
            }
            println!(
                "✅ {} is valid: {} server(s), {} warning(s)",
                cli.config.display(),
                servers.len(),
                compiler.warnings().len()
            );
            Ok(())
        }

        Commands::Dump => {
            let source = pinginx_config::read_file(&cli.config)?;
            let block = match pinginx_config::parse(&source) {
                Ok(block) => block,
                Err(e) => {
                    let name = cli.config.display().to_string();
                    eprint!("{}", render_diagnostic(&e.into(), &source, &name));
                    bail!("failed to parse {}", name);
                }
            };
            println!("{}", serde_json::to_string_pretty(&block)?);
            Ok(())
        }

        Commands::Version => {
            println!("pinginx {}", pinginx_core::VERSION);
            Ok(())
        }
    }
}

/// Read and compile a configuration file
fn load(path: &Path) -> anyhow::Result<Vec<ServerDefinition>> {
    let source = pinginx_config::read_file(path)?;
    compile(&mut Compiler::new(), &source, path)
}

/// Compile, printing a source diagnostic on failure
fn compile(
    compiler: &mut Compiler,
    source: &str,
    path: &Path,
) -> anyhow::Result<Vec<ServerDefinition>> {
    match compiler.compile_source(source) {
        Ok(servers) => Ok(servers),
        Err(e) => {
            let name = path.display().to_string();
            eprint!("{}", render_diagnostic(&e, source, &name));
            bail!("invalid configuration in {}", name);
        }
    }
}

/// Run the Pingora server with one proxy service per listen port
fn run_server(servers: Vec<ServerDefinition>) -> anyhow::Result<()> {
    let listeners = build_listeners(servers);

    let mut server =
        pingora::server::Server::new(None).context("Failed to create Pingora server")?;
    server.bootstrap();

    tracing::info!("🌐 Server binding information:");
    for hosts in listeners.into_hosts() {
        let addr = format!("0.0.0.0:{}", hosts.port());
        let names: Vec<&str> = hosts.servers().iter().map(|s| s.name()).collect();
        tracing::info!("   📍 {} -> [{}]", addr, names.join(", "));

        let mut service =
            pingora::proxy::http_proxy_service(&server.configuration, PinginxProxy::new(hosts));
        service.add_tcp(&addr);
        server.add_service(service);
    }

    println!("🚀 Pinginx running...");
    server.run_forever();
}

//! autoresponder
//!
//! Command line front end for the auto-responder rule engine.
//!
//! # Architecture Overview
//!
//! ```text
//!     rule file ──▶ parser ──▶ RuleSet ──swap──▶ RuleStore ◀── lookup(path) ◀── request
//!                                 ▲                  │
//!            SIGHUP / file change │                  ▼
//!                            reload loop      LocalSubstitute / 200 + header
//! ```
//!
//! Fatal rule errors (bad line grammar, bad path pattern, read error)
//! exit with status 65. A reload task that aborts exits with 70.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use autoresponder::autoresp::parser::load_rules;
use autoresponder::autoresp::{CompileOptions, MatchMode, RuleError, RuleStore, StoreSettings};
use autoresponder::config::{load_config, ResponderConfig, RulesWatcher};
use autoresponder::http::DecisionServer;
use autoresponder::lifecycle::signals::spawn_signal_listener;
use autoresponder::lifecycle::{run_reload_loop, ReloadError, ReloadTrigger, Shutdown, ShutdownReason};
use autoresponder::observability::{logging, metrics};

/// Exit status for configuration problems (sysexits `EX_CONFIG`).
const EX_CONFIG: u8 = 78;

#[derive(Parser)]
#[command(name = "autoresponder")]
#[command(about = "Map request paths to local substitute files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a rule file and list its rules in order
    Check {
        rules: PathBuf,

        /// Print rules as JSON
        #[arg(long)]
        json: bool,

        /// Compile path patterns case-sensitively
        #[arg(long)]
        case_sensitive: bool,
    },
    /// Look up one or more request paths
    Lookup {
        /// TOML configuration file
        #[arg(short, long, conflicts_with = "rules")]
        config: Option<PathBuf>,

        /// Rule file (overrides the configured one)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Only evaluate the first rule
        #[arg(long)]
        first_rule_only: bool,

        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Run the decision service with hot reload
    Serve {
        /// TOML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Serialize)]
struct RuleView<'a> {
    index: usize,
    path_pattern: &'a str,
    local_file_pattern: &'a str,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            rules,
            json,
            case_sensitive,
        } => {
            init_cli_logging();
            check(rules, json, case_sensitive)
        }
        Commands::Lookup {
            config,
            rules,
            first_rule_only,
            paths,
        } => {
            init_cli_logging();
            lookup(config, rules, first_rule_only, &paths)
        }
        Commands::Serve { config } => serve(config),
    }
}

fn init_cli_logging() {
    let mut observability = autoresponder::config::ObservabilityConfig::default();
    observability.log_level = "warn".to_string();
    let _ = logging::init_logging(&observability);
}

fn fatal(err: &RuleError) -> ExitCode {
    eprintln!("{err}");
    ExitCode::from(err.exit_code())
}

fn check(rules: PathBuf, json: bool, case_sensitive: bool) -> ExitCode {
    let options = CompileOptions {
        case_insensitive: !case_sensitive,
    };

    let set = match load_rules(&rules, options) {
        Ok(Some(set)) => set,
        Ok(None) => {
            eprintln!("error in opening file {}", rules.display());
            return ExitCode::FAILURE;
        }
        Err(e) => return fatal(&e),
    };

    let views: Vec<_> = set
        .iter()
        .enumerate()
        .map(|(index, rule)| RuleView {
            index,
            path_pattern: rule.path_pattern(),
            local_file_pattern: rule.local_file_pattern().as_ref(),
        })
        .collect();

    if json {
        match serde_json::to_string_pretty(&views) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        for view in &views {
            println!("{:>3}  {}  \"{}\"", view.index, view.path_pattern, view.local_file_pattern);
        }
        println!("{} rule(s)", views.len());
    }
    ExitCode::SUCCESS
}

fn lookup(
    config: Option<PathBuf>,
    rules: Option<PathBuf>,
    first_rule_only: bool,
    paths: &[String],
) -> ExitCode {
    let mut settings = match config {
        Some(path) => match load_config(&path) {
            Ok(config) => StoreSettings::from(&config.autoresponder),
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                return ExitCode::from(EX_CONFIG);
            }
        },
        None => StoreSettings::default(),
    };
    if rules.is_some() {
        settings.rules_path = rules;
    }
    if first_rule_only {
        settings.match_mode = MatchMode::FirstRuleOnly;
    }

    let store = RuleStore::new(settings);
    if let Err(e) = store.init() {
        return fatal(&e);
    }

    for path in paths {
        match store.lookup(path) {
            Some(target) => println!("{path}\t{target}"),
            None => println!("{path}\tno match"),
        }
    }
    store.destroy();
    ExitCode::SUCCESS
}

fn serve(config_path: PathBuf) -> ExitCode {
    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", config_path.display());
            return ExitCode::from(EX_CONFIG);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run_server(config))
}

async fn run_server(config: ResponderConfig) -> ExitCode {
    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
    }

    tracing::info!("autoresponder v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = Arc::new(RuleStore::new(StoreSettings::from(&config.autoresponder)));
    if let Err(e) = store.init() {
        tracing::error!(error = %e, "Failed to load autoresponder rules");
        return fatal(&e);
    }

    tracing::info!(
        rules_path = ?store.source(),
        match_mode = ?store.match_mode(),
        rules = store.rule_count(),
        "Autoresponder configured"
    );

    let shutdown = Arc::new(Shutdown::new());
    let reload_shutdown = shutdown.subscribe();
    let server_shutdown_signal = shutdown.subscribe();
    let (reload_tx, reload_rx) = mpsc::unbounded_channel();

    if let Err(e) = spawn_signal_listener(reload_tx.clone(), shutdown.clone()) {
        tracing::error!(error = %e, "Failed to install signal handlers");
        return ExitCode::FAILURE;
    }

    // Held for the lifetime of the server; dropping it stops watching.
    let _watcher = match (&config.autoresponder.rules_path, config.autoresponder.watch) {
        (Some(path), true) => {
            let poll = Duration::from_secs(config.autoresponder.watch_poll_secs);
            let (watcher, mut changes) = RulesWatcher::new(path, poll);
            let tx = reload_tx.clone();
            tokio::spawn(async move {
                while changes.recv().await.is_some() {
                    if tx.send(ReloadTrigger::FileChanged).is_err() {
                        break;
                    }
                }
            });
            match watcher.run() {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "Rules watcher unavailable, relying on SIGHUP");
                    None
                }
            }
        }
        _ => None,
    };
    drop(reload_tx);

    let listener = match TcpListener::bind(&config.listener.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %config.listener.bind_address, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    let reloader = tokio::spawn(run_reload_loop(
        store.clone(),
        reload_rx,
        reload_shutdown,
    ));
    let server = DecisionServer::new(&config, store.clone());
    let server_shutdown = shutdown.clone();
    let server_task = tokio::spawn(async move {
        let result = server.run(listener, server_shutdown_signal).await;
        server_shutdown.trigger(ShutdownReason::ServerStopped);
        result
    });

    let mut exit = ExitCode::SUCCESS;
    match reloader.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            match &e {
                ReloadError::Rules(_) => {
                    tracing::error!(error = %e, "Fatal error while reloading rules")
                }
                ReloadError::Aborted(_) => tracing::error!(error = %e, "Rule reload aborted"),
            }
            exit = ExitCode::from(e.exit_code());
            shutdown.trigger(ShutdownReason::ReloadFailed);
        }
        Err(e) => {
            tracing::error!(error = %e, "Reload loop panicked");
            exit = ExitCode::from(autoresponder::lifecycle::reload::EX_SOFTWARE);
            shutdown.trigger(ShutdownReason::ReloadFailed);
        }
    }

    let grace = Duration::from_secs(config.timeouts.shutdown_secs);
    match tokio::time::timeout(grace, server_task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => {
            tracing::error!(error = %e, "Server error");
            exit = ExitCode::FAILURE;
        }
        Ok(Err(e)) => tracing::error!(error = %e, "Server task panicked"),
        Err(_) => tracing::warn!("Shutdown grace period elapsed, exiting"),
    }

    store.destroy();
    tracing::info!(reason = ?shutdown.reason(), "Shutdown complete");
    exit
}

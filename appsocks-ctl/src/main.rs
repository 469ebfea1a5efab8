//! Command-line manager for the appsocks routing service
//!
//! Thin presentation layer: every subcommand is a straight composition of
//! core operations (load, edit, save, service control) plus operator-facing
//! output. Business rules live in `appsocks-core`.

use anyhow::{Context, Result};
use appsocks_core::service::{self, SystemRunner};
use appsocks_core::{
    ConfigStore, LogLevel, RuleDraft, RuleEditor, ServiceController, DEFAULT_CONFIG_FILE,
};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Bound on each service control invocation; a hung service surfaces as a
/// timeout failure instead of hanging the manager.
const STAGE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(
    name = "appsocks-ctl",
    about = "Configuration manager for the appsocks per-application SOCKS5 routing service",
    version
)]
struct Args {
    /// Configuration file path
    #[arg(long, short = 'c', value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Service executable (default: appsocks-svc beside this binary)
    #[arg(long, value_name = "PATH")]
    service: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current configuration
    Show,

    /// Set the service log level (Error, Warning, Info, Debug or All)
    SetLogLevel { level: String },

    /// Append a new proxy rule
    AddRule {
        #[command(flatten)]
        rule: RuleArgs,
    },

    /// Replace the proxy rule at INDEX with the given fields
    EditRule {
        index: usize,
        #[command(flatten)]
        rule: RuleArgs,
    },

    /// Remove the proxy rule at INDEX
    RemoveRule { index: usize },

    /// Replace the global exclude list
    SetExcludes {
        /// Application name to exclude from all proxying (repeatable)
        #[arg(long = "app", value_name = "NAME")]
        apps: Vec<String>,
    },

    /// Register the service, then start it
    Install,

    /// Stop the service, then remove its registration
    Uninstall,

    /// Start the service
    Start,

    /// Stop the service
    Stop,

    /// Stop the service, then start it again to pick up saved changes
    Restart,
}

#[derive(ClapArgs)]
struct RuleArgs {
    /// Application image name to route (repeatable)
    #[arg(long = "app", value_name = "NAME")]
    apps: Vec<String>,

    /// SOCKS5 upstream as host:port
    #[arg(long, value_name = "ENDPOINT", default_value = "")]
    endpoint: String,

    /// Username for an authenticated upstream
    #[arg(long, default_value = "")]
    username: String,

    /// Password for an authenticated upstream
    #[arg(long, default_value = "")]
    password: String,

    /// Proxy TCP traffic (the default when no protocol flag is given)
    #[arg(long)]
    tcp: bool,

    /// Proxy UDP traffic
    #[arg(long)]
    udp: bool,
}

impl RuleArgs {
    fn to_draft(&self) -> RuleDraft {
        RuleDraft {
            app_names: self.apps.join("\n"),
            endpoint: self.endpoint.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            // TCP is preselected unless the operator asked for UDP alone.
            tcp: self.tcp || !self.udp,
            udp: self.udp,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(if args.verbose { "debug" } else { "warn" })
        .with_writer(std::io::stderr)
        .init();

    let store = ConfigStore::new(&args.config);

    match args.command {
        Command::Show => {
            let config = store.load();
            let json = serde_json::to_string_pretty(&config)
                .context("Failed to render the configuration")?;
            println!("{json}");
        }

        Command::SetLogLevel { level } => {
            let level: LogLevel = level.parse()?;
            let mut config = store.load();
            config.log_level = level;
            store.save(&config).context("Failed to save the configuration")?;
            println!("Log level set to {level}");
        }

        Command::AddRule { rule } => {
            let mut config = store.load();
            let index = RuleEditor::add_rule(&mut config);
            RuleEditor::commit_rule_edit(&mut config, index, &rule.to_draft());
            store.save(&config).context("Failed to save the configuration")?;
            println!("Added proxy rule {index}");
        }

        Command::EditRule { index, rule } => {
            let mut config = store.load();
            if RuleEditor::commit_rule_edit(&mut config, index, &rule.to_draft()) {
                store.save(&config).context("Failed to save the configuration")?;
                println!("Updated proxy rule {index}");
            } else {
                println!(
                    "No proxy rule at index {index} ({} configured); nothing saved",
                    config.proxies.len()
                );
            }
        }

        Command::RemoveRule { index } => {
            let mut config = store.load();
            RuleEditor::remove_rule(&mut config, index)?;
            store.save(&config).context("Failed to save the configuration")?;
            println!("Removed proxy rule {index}");
        }

        Command::SetExcludes { apps } => {
            let mut config = store.load();
            RuleEditor::set_excludes(&mut config, &apps.join("\n"));
            store.save(&config).context("Failed to save the configuration")?;
            println!(
                "Excluding {} application(s) from proxying",
                config.excludes.len()
            );
        }

        Command::Install => {
            service_controller(&args.service)?.install()?;
            println!("Service installed and started");
        }

        Command::Uninstall => {
            service_controller(&args.service)?.uninstall()?;
            println!("Service stopped and uninstalled");
        }

        Command::Start => {
            service_controller(&args.service)?.start()?;
            println!("Service started");
        }

        Command::Stop => {
            service_controller(&args.service)?.stop()?;
            println!("Service stopped");
        }

        Command::Restart => {
            service_controller(&args.service)?.restart()?;
            println!("Service restarted");
        }
    }

    Ok(())
}

fn service_controller(
    override_path: &Option<PathBuf>,
) -> Result<ServiceController<SystemRunner>> {
    let executable = match override_path {
        Some(path) => path.clone(),
        None => service::default_executable_path()?,
    };
    Ok(ServiceController::with_runner(
        executable,
        SystemRunner::with_timeout(STAGE_TIMEOUT),
    ))
}

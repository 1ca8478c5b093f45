//! Minikube-dev CLI - Development tool for local minikube environments

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use minikube_dev::commands;
use minikube_dev::config::settings::{ImageOverrides, Settings};
use minikube_dev::utils::dryrun;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "minikube-dev")]
#[command(author, version, about = "Development CLI tool for local minikube Kubernetes environments", long_about = None)]
struct Cli {
    /// Verbose output (can be used multiple times: -v, -vv)
    /// default: INFO, -v: DEBUG, -vv: TRACE
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dry-run mode: show what would be done without making changes
    #[arg(long, global = true)]
    dry_run: bool,

    /// Path to a config file (default: .minikube-dev.toml or XDG config)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Per-component image override flags, shared by start/configure/pull
#[derive(Args, Default, Clone)]
struct ImageOverrideArgs {
    /// Custom pause image URL
    #[arg(long, value_name = "URL")]
    pause: Option<String>,

    /// Custom kube-apiserver image URL
    #[arg(long, value_name = "URL")]
    apiserver: Option<String>,

    /// Custom kube-scheduler image URL
    #[arg(long, value_name = "URL")]
    scheduler: Option<String>,

    /// Custom kube-controller-manager image URL
    #[arg(long, value_name = "URL")]
    controller: Option<String>,

    /// Custom kube-proxy image URL
    #[arg(long, value_name = "URL")]
    proxy: Option<String>,

    /// Custom etcd image URL
    #[arg(long, value_name = "URL")]
    etcd: Option<String>,

    /// Custom coredns image URL
    #[arg(long, value_name = "URL")]
    coredns: Option<String>,

    /// Custom storage-provisioner image URL
    #[arg(long, value_name = "URL")]
    storage: Option<String>,

    /// Custom kicbase image URL
    #[arg(long, value_name = "URL")]
    kicbase: Option<String>,
}

impl ImageOverrideArgs {
    fn into_overrides(self) -> ImageOverrides {
        ImageOverrides {
            pause: self.pause,
            apiserver: self.apiserver,
            scheduler: self.scheduler,
            controller: self.controller,
            proxy: self.proxy,
            etcd: self.etcd,
            coredns: self.coredns,
            storage: self.storage,
            kicbase: self.kicbase,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the cluster (pre-pulls images, retries on failure)
    Start {
        /// Profile name
        #[arg(short, long)]
        profile: Option<String>,

        /// VM/container driver
        #[arg(long)]
        driver: Option<String>,

        /// Memory in MB
        #[arg(long)]
        memory: Option<u32>,

        /// Number of CPUs
        #[arg(long)]
        cpus: Option<u32>,

        /// Disk size in GB
        #[arg(long)]
        disk_size: Option<u32>,

        /// Skip the image pre-pull step
        #[arg(long)]
        skip_pull: bool,

        #[command(flatten)]
        images: ImageOverrideArgs,
    },

    /// Stop the cluster
    Stop {
        /// Profile name
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Delete the cluster profile
    Delete {
        /// Profile name
        #[arg(short, long)]
        profile: Option<String>,

        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show cluster and node status
    Status {
        /// Profile name
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Download and install minikube and kubectl
    FreshInstall {
        /// Reinstall even if the tools are already on PATH
        #[arg(long)]
        force: bool,
    },

    /// Check Docker and print installation guidance
    SetupDocker,

    /// Persist configuration (images, registries, mirrors, proxy)
    Configure {
        #[command(subcommand)]
        command: ConfigureCommands,
    },

    /// Manage component container images
    Images {
        #[command(subcommand)]
        command: ImagesCommands,
    },

    /// Collect and print diagnostics
    Troubleshoot {
        /// Profile name
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum ConfigureCommands {
    /// Persist per-component image override URLs
    Images {
        #[command(flatten)]
        images: ImageOverrideArgs,
    },

    /// Persist insecure registry entries
    Registry {
        /// Registry host:port accessed without TLS validation (repeatable)
        #[arg(long = "insecure", value_name = "HOST:PORT")]
        insecure: Vec<String>,

        /// Clear existing entries first
        #[arg(long)]
        clear: bool,
    },

    /// Persist registry mirror entries
    Mirror {
        /// Mirror URL (repeatable)
        #[arg(long = "mirror", value_name = "URL")]
        mirrors: Vec<String>,

        /// Clear existing entries first
        #[arg(long)]
        clear: bool,
    },

    /// Persist proxy settings (empty value clears an entry)
    Proxy {
        #[arg(long, value_name = "URL")]
        http: Option<String>,

        #[arg(long, value_name = "URL")]
        https: Option<String>,

        #[arg(long, value_name = "LIST")]
        no_proxy: Option<String>,
    },

    /// Print an example configuration file
    Example,
}

#[derive(Subcommand)]
enum ImagesCommands {
    /// Pre-pull component images with registry fallback
    Pull {
        #[command(flatten)]
        images: ImageOverrideArgs,
    },

    /// List resolved image URLs from config
    List,

    /// Load cached images into the cluster runtime
    Load {
        /// Profile name
        #[arg(short, long)]
        profile: Option<String>,
    },

    /// Remove component images from the local Docker store
    Clean {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity level
    let log_level = match cli.verbose {
        0 => "info",  // Default
        1 => "debug", // -v
        _ => "trace", // -vv
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    if cli.dry_run {
        dryrun::set_dry_run(true);
        minikube_dev::log_info!("DRY RUN MODE: No changes will be made");
        println!();
    }

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Start {
            profile,
            driver,
            memory,
            cpus,
            disk_size,
            skip_pull,
            images,
        } => commands::cluster::start(
            &settings,
            commands::cluster::StartOptions {
                profile,
                driver,
                memory,
                cpus,
                disk_size,
                skip_pull,
                image_overrides: images.into_overrides(),
            },
        ),
        Commands::Stop { profile } => commands::cluster::stop(&settings, profile),
        Commands::Delete { profile, yes } => commands::cluster::delete(&settings, profile, yes),
        Commands::Status { profile } => commands::cluster::status(&settings, profile),
        Commands::FreshInstall { force } => commands::install::fresh_install(&settings, force),
        Commands::SetupDocker => commands::install::setup_docker(),
        Commands::Configure { command } => handle_configure_command(command),
        Commands::Images { command } => handle_images_command(&settings, command),
        Commands::Troubleshoot { profile } => commands::troubleshoot::run(&settings, profile),
        Commands::Completion { shell } => handle_completion_command(shell),
        Commands::Version => handle_version_command(),
    }
}

fn handle_configure_command(command: ConfigureCommands) -> Result<()> {
    match command {
        ConfigureCommands::Images { images } => {
            commands::configure::images(&images.into_overrides())
        }
        ConfigureCommands::Registry { insecure, clear } => {
            commands::configure::registry(insecure, clear)
        }
        ConfigureCommands::Mirror { mirrors, clear } => {
            commands::configure::mirror(mirrors, clear)
        }
        ConfigureCommands::Proxy {
            http,
            https,
            no_proxy,
        } => commands::configure::proxy(http, https, no_proxy),
        ConfigureCommands::Example => commands::configure::show_example(),
    }
}

fn handle_images_command(settings: &Settings, command: ImagesCommands) -> Result<()> {
    match command {
        ImagesCommands::Pull { images } => {
            commands::images::pull(settings, &images.into_overrides())
        }
        ImagesCommands::List => commands::images::list(settings),
        ImagesCommands::Load { profile } => commands::images::load(settings, profile),
        ImagesCommands::Clean { yes } => commands::images::clean(settings, yes),
    }
}

fn handle_completion_command(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "minikube-dev", &mut io::stdout());
    Ok(())
}

fn handle_version_command() -> Result<()> {
    println!("minikube-dev {}", env!("CARGO_PKG_VERSION"));
    println!("Development CLI tool for local minikube Kubernetes environments");
    Ok(())
}

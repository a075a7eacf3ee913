//! CLI command and subcommand definitions

use clap::{Args, Parser, Subcommand};

/// Gandi hosting CLI
#[derive(Parser, Debug)]
#[command(name = "gandictl")]
#[command(
    version,
    about = "Manage Gandi hosting servers and bootstrap them",
    long_about = None
)]
pub struct Cli {
    /// Gandi API key (overrides environment and config file)
    #[arg(short = 'K', long, global = true)]
    pub api_key: Option<String>,

    /// XML-RPC endpoint URL (overrides config file)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Output format (overrides config file)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Don't load config file
    #[arg(long)]
    pub no_config: bool,

    /// Config file path (default: ~/.config/gandi/cli.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Fail instead of prompting for missing values
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output
    Table,
    /// JSON output
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }
}

impl From<&OutputFormat> for crate::format::OutputFormat {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Table => crate::format::OutputFormat::Table,
            OutputFormat::Json => crate::format::OutputFormat::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Datacenter commands
    Datacenter {
        #[command(subcommand)]
        command: DatacenterCommands,
    },

    /// System image commands
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Server (VM) commands
    Server {
        #[command(subcommand)]
        command: ServerCommands,
    },

    /// Show or manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum DatacenterCommands {
    /// List available datacenters
    List,
}

#[derive(Subcommand, Debug)]
pub enum ImageCommands {
    /// List available system images
    List {
        /// Only list images of this datacenter
        #[arg(short = 'D', long)]
        datacenter_id: Option<i64>,

        /// Only list 32 bit images
        #[arg(long = "32", conflicts_with = "arch_64")]
        arch_32: bool,

        /// Only list 64 bit images
        #[arg(long = "64")]
        arch_64: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ServerCommands {
    /// List servers
    List {
        /// IP protocol version (4|6) of the addresses shown
        #[arg(short = 'W', long, default_value_t = 4)]
        ip_version: u8,
    },

    /// Create a server and bootstrap it
    Create(CreateArgs),

    /// Stop and delete a server
    Delete {
        /// Server ID
        server_id: i64,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// Options of `server create`; any value left out is taken from the
/// config file, else asked for
#[derive(Args, Debug, Clone, Default)]
pub struct CreateArgs {
    /// Hostname of the new server
    #[arg(short = 'S', long)]
    pub server_name: Option<String>,

    /// Number of CPU cores
    #[arg(short = 'C', long)]
    pub cores: Option<i64>,

    /// Amount of memory in MB
    #[arg(short = 'M', long)]
    pub memory: Option<i64>,

    /// Network bandwidth in MB
    #[arg(short = 'B', long)]
    pub bandwidth: Option<i64>,

    /// IP protocol version (4|6)
    #[arg(short = 'W', long)]
    pub ip_version: Option<i64>,

    /// Datacenter to create the server in
    #[arg(short = 'D', long)]
    pub datacenter_id: Option<i64>,

    /// System image (see `gandictl image list`)
    #[arg(short = 'I', long)]
    pub image_id: Option<i64>,

    /// Name of the system disk (default: disk_<hostname>)
    #[arg(short = 'H', long)]
    pub disk_name: Option<String>,

    /// Account created on the server
    #[arg(short = 'x', long)]
    pub login: Option<String>,

    /// Password of that account, also used for the bootstrap
    #[arg(short = 'P', long)]
    pub password: Option<String>,

    /// Node name (default: <hostname>_gandi-<id>)
    #[arg(short = 'N', long)]
    pub node_name: Option<String>,

    /// Comma separated list of roles/recipes to apply
    #[arg(short = 'r', long)]
    pub run_list: Option<String>,

    /// Environment the node joins
    #[arg(short = 'E', long)]
    pub environment: Option<String>,

    /// SSH identity file used by the bootstrap
    #[arg(short = 'i', long)]
    pub identity_file: Option<String>,

    /// Bootstrap template
    #[arg(short = 'd', long)]
    pub distro: Option<String>,

    /// Version of the agent to install
    #[arg(long)]
    pub bootstrap_version: Option<String>,

    /// Custom bootstrap template file
    #[arg(long)]
    pub template_file: Option<String>,

    /// Install pre-release agent packages
    #[arg(long)]
    pub prerelease: bool,

    /// Run the bootstrap without sudo
    #[arg(long)]
    pub no_sudo: bool,

    /// Create the server only
    #[arg(long)]
    pub no_bootstrap: bool,
}

impl CreateArgs {
    /// Run list entries, split on commas and whitespace
    pub fn run_list(&self) -> Vec<String> {
        self.run_list
            .as_deref()
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect()
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key (e.g. `api_key`, `create.memory`, `ssh.settle_delay`)
        key: String,

        /// Configuration value
        value: String,
    },

    /// Reset configuration to defaults
    Reset,
}

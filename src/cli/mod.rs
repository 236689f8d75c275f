// dbinventory — CLI Module
//
// Command-line interface using clap derive macros. Without a subcommand the
// binary behaves as an Ansible dynamic inventory script (`--list`,
// `--host <name>`); subcommands manage the database.

mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::store::{HostFields, SelectionType};

pub use commands::{default_db_path, execute};

/// Produce an Ansible inventory from an SQLite database.
#[derive(Parser, Debug)]
#[command(name = "dbinventory")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the hosts database file.
    /// Defaults to `<data dir>/dbinventory/dbinventory.sqlite3`.
    #[arg(long, short = 'd', env = "DBINVENTORY_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Passphrase for host password encryption.
    #[arg(long, short = 's', env = "DBINVENTORY_SECRET", hide_env_values = true, global = true)]
    pub db_secret: Option<String>,

    /// Create the database if it does not already exist.
    #[arg(long, short = 'c', global = true)]
    pub db_create: bool,

    /// Pretty-print JSON output.
    #[arg(long, short = 'p', global = true)]
    pub pretty: bool,

    /// List all hosts (the default).
    #[arg(long, conflicts_with = "host")]
    pub list: bool,

    /// Print the inventory variables of a single host.
    #[arg(long)]
    pub host: Option<String>,

    /// Print hosts in SSH config format instead of JSON.
    #[arg(long, conflicts_with = "host")]
    pub ssh_config: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a tag group.
    AddGroup {
        /// Name of the tag group.
        name: String,

        /// How the group's tags are chosen.
        #[arg(long = "type", default_value = "select")]
        selection_type: SelectionType,
    },

    /// Add a tag to an existing tag group.
    AddTag {
        /// Name of the tag.
        name: String,

        /// Tag group the tag belongs to.
        #[arg(long)]
        group: String,
    },

    /// Add a host.
    AddHost {
        /// Inventory name of the host.
        host: String,

        #[command(flatten)]
        fields: HostArgs,

        /// Tags to assign (repeatable or comma-separated).
        #[arg(long = "tag", value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// Change fields of an existing host.
    UpdateHost {
        /// Inventory name of the host.
        host: String,

        #[command(flatten)]
        fields: HostArgs,

        /// Replace the host's tags with this comma-separated list.
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },

    /// Remove a tag group, its tags and their assignments.
    DelGroup { name: String },

    /// Remove a tag from every host and delete it.
    DelTag { name: String },

    /// Remove a host.
    DelHost { host: String },

    /// Import groups, tags and hosts from a JSON file.
    Import {
        /// Path to the JSON document.
        file: PathBuf,
    },

    /// Export groups, tags and hosts as JSON.
    Export,
}

/// Scalar host fields shared by `add-host` and `update-host`.
#[derive(Args, Debug, Default)]
pub struct HostArgs {
    /// Connection address (IP or FQDN).
    #[arg(long)]
    pub host_name: Option<String>,

    #[arg(long)]
    pub ssh_user: Option<String>,

    #[arg(long)]
    pub ssh_port: Option<i64>,

    /// SSH password; requires a passphrase.
    #[arg(long)]
    pub ssh_pass: Option<String>,

    /// sudo password; requires a passphrase.
    #[arg(long)]
    pub sudo_pass: Option<String>,
}

impl From<HostArgs> for HostFields {
    fn from(args: HostArgs) -> Self {
        Self {
            host_name: args.host_name,
            ssh_user: args.ssh_user,
            ssh_port: args.ssh_port,
            ssh_pass: args.ssh_pass,
            sudo_pass: args.sudo_pass,
        }
    }
}

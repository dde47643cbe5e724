use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pricetag::{
    models::{AddressId, CartId, CustomerId},
    tag::FullTag,
};
use strum::Display;
use tracing::Level;

use crate::PROJECT_DIRS;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(short, long, env = "PRICETAG_LOG", default_value_t = Level::INFO)]
    pub log_level: Level,
    #[arg(long, default_value = PROJECT_DIRS.data_dir().join("pricetag.log").into_os_string())]
    pub log_location: PathBuf,
    #[arg(short, long, default_value = PROJECT_DIRS.config_dir().join("config.toml").into_os_string())]
    pub config: PathBuf,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage the tag catalog.
    Tag {
        #[command(subcommand)]
        command: TagCommand,
    },
    /// Manage customers, their addresses and their default tags.
    Customer {
        #[command(subcommand)]
        command: CustomerCommand,
    },
    /// Manage address-level tag overrides.
    Override {
        #[command(subcommand)]
        command: OverrideCommand,
    },
    /// Show the tags in effect at an address.
    Resolve {
        customer: CustomerId,
        address: AddressId,
        /// Show where each tag comes from.
        #[arg(short, long)]
        detailed: bool,
    },
    Cart {
        #[command(subcommand)]
        command: CartCommand,
    },
    Bulk {
        #[command(subcommand)]
        command: BulkCommand,
    },
    /// Serve the HTTP API.
    Serve,
    /// Print shell completions.
    Completions { shell: clap_complete::Shell },
}

#[derive(Subcommand)]
pub enum TagCommand {
    Create {
        /// The tag as prefix:code, e.g. categoria-di-sconto:sconto-45.
        full_tag: FullTag,
        #[arg(short, long)]
        description: Option<String>,
        /// Display color as #rrggbb.
        #[arg(short, long)]
        color: Option<String>,
    },
    List {
        /// Include deactivated tags.
        #[arg(short, long)]
        all: bool,
        #[command(flatten)]
        display_options: TagDisplayOptions,
    },
    /// Update the display metadata of a tag.
    Describe {
        full_tag: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
    },
    Deactivate {
        full_tag: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Recompute customer counts from the customers' tags.
    Recount,
}

#[derive(Subcommand)]
pub enum CustomerCommand {
    Create {
        name: String,
    },
    List {
        #[command(flatten)]
        display_options: CustomerDisplayOptions,
    },
    Show {
        customer: CustomerId,
    },
    AddAddress {
        customer: CustomerId,
        label: String,
    },
    /// Assign a default tag, replacing any tag with the same prefix.
    Assign {
        customer: CustomerId,
        full_tag: String,
    },
    Remove {
        customer: CustomerId,
        full_tag: String,
    },
}

#[derive(Subcommand)]
pub enum OverrideCommand {
    /// Override the customer's tag of the same prefix at one address.
    Assign {
        customer: CustomerId,
        address: AddressId,
        full_tag: String,
    },
    Remove {
        customer: CustomerId,
        address: AddressId,
        full_tag: String,
    },
}

#[derive(Subcommand)]
pub enum CartCommand {
    /// Create a draft cart, or return the existing one for the address.
    Create {
        customer: CustomerId,
        address: AddressId,
    },
    Show {
        cart: CartId,
    },
    Submit {
        cart: CartId,
    },
}

#[derive(Subcommand)]
pub enum BulkCommand {
    /// Import customers from a file with one JSON record per line.
    Import { path: PathBuf },
}

#[derive(Clone, Copy, ValueEnum, Display)]
pub enum TagColumn {
    Id,
    #[strum(to_string = "Tag")]
    FullTag,
    Description,
    Color,
    Active,
    Customers,
}

#[derive(Clone, Args)]
pub struct TagDisplayOptions {
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [TagColumn::FullTag, TagColumn::Description, TagColumn::Active, TagColumn::Customers])]
    pub columns: Vec<TagColumn>,
}

#[derive(Clone, Copy, ValueEnum, Display)]
pub enum CustomerColumn {
    Id,
    Name,
    Tags,
    Addresses,
}

#[derive(Clone, Args)]
pub struct CustomerDisplayOptions {
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = [CustomerColumn::Id, CustomerColumn::Name, CustomerColumn::Tags, CustomerColumn::Addresses])]
    pub columns: Vec<CustomerColumn>,
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "locker")]
#[command(
    version,
    about = "Local, single-user encrypted credential lockers."
)]
pub struct Cli {
    /// Working directory holding the `lockers/` folder
    #[arg(long, global = true, value_name = "PATH", env = "LOCKER_DIR")]
    pub dir: Option<PathBuf>,

    /// Append diagnostic logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH", env = "LOCKER_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Locker and item key shared by item commands.
#[derive(Debug, Args)]
pub struct ItemRef {
    /// Locker name
    pub locker: String,

    /// Item key
    pub key: String,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Lists the lockers in the working directory
    Lockers {
        #[arg(long)]
        json: bool,
    },

    /// Creates a new empty locker
    #[command(arg_required_else_help = true)]
    Create { name: String },

    /// Lists the items of a locker
    #[command(arg_required_else_help = true)]
    Items {
        locker: String,

        /// Only keys containing this text (case-sensitive)
        #[arg(short, long, default_value = "")]
        query: String,

        #[arg(long)]
        json: bool,
    },

    /// Prints an item including its secrets
    #[command(arg_required_else_help = true)]
    Show {
        #[command(flatten)]
        item: ItemRef,

        #[arg(long)]
        json: bool,
    },

    /// Adds an API key; the value is prompted for if not given
    #[command(arg_required_else_help = true)]
    AddApikey {
        #[command(flatten)]
        item: ItemRef,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long)]
        value: Option<String>,
    },

    /// Adds account credentials; the password is prompted for if not given
    #[command(arg_required_else_help = true)]
    AddAccount {
        #[command(flatten)]
        item: ItemRef,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long, default_value = "")]
        username: String,

        #[arg(long)]
        password: Option<String>,

        #[arg(long, default_value = "")]
        url: String,
    },

    /// Adds a secure note; the text is prompted for if not given
    #[command(arg_required_else_help = true)]
    AddNote {
        #[command(flatten)]
        item: ItemRef,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long)]
        text: Option<String>,
    },

    /// Updates an API key; omitted fields keep their current value
    #[command(arg_required_else_help = true)]
    UpdateApikey {
        #[command(flatten)]
        item: ItemRef,

        #[arg(long)]
        new_key: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        value: Option<String>,
    },

    /// Updates account credentials; omitted fields keep their current value
    #[command(arg_required_else_help = true)]
    UpdateAccount {
        #[command(flatten)]
        item: ItemRef,

        #[arg(long)]
        new_key: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        url: Option<String>,
    },

    /// Updates a secure note; omitted fields keep their current value
    #[command(arg_required_else_help = true)]
    UpdateNote {
        #[command(flatten)]
        item: ItemRef,

        #[arg(long)]
        new_key: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        text: Option<String>,
    },

    /// Removes an item
    #[command(arg_required_else_help = true)]
    Delete {
        #[command(flatten)]
        item: ItemRef,
    },
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(version)]
#[command(about = "Track the weather in your saved cities")]
pub struct Cli {
    /// Config file to use instead of ~/.config/nimbus/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh every saved city and show the home screen (default)
    Home,

    /// List saved cities without refreshing
    List,

    /// Search cities by name
    Search {
        query: String,

        /// Maximum number of matches
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Search a city and add it to the saved list
    Add {
        query: String,

        /// Which match to add (1 = first)
        #[arg(short, long, default_value_t = 1)]
        pick: usize,
    },

    /// Remove a saved city by id
    Remove { id: String },

    /// Show details for a saved city
    Show { id: String },
}

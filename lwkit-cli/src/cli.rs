//! Command line surface.

use clap::{Parser, Subcommand};

/// Search, browse, and save bookmarks from a launcher.
#[derive(Parser, Debug)]
#[command(name = "lw")]
#[command(about = "Search, browse, and save links in a self-hosted bookmark service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search links. Supports `#tag`, `@collection`, `tag:x` and `collection:x`.
    Search {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },

    /// List collections, optionally filtered by name or description.
    ///
    /// `browse:<id>` and `collection:<id>` show the links of one collection.
    Collections {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        filter: Vec<String>,
    },

    /// Show the newest links in a collection.
    Browse { collection_id: i64 },

    /// Preview a save: parse a URL with optional `#tags` and `@collections`.
    SaveFilter {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        input: Vec<String>,
    },

    /// Save a link. Accepts `save_enhanced:{json}`, `save_url:<url>`, or a URL.
    Save { arg: String },

    /// Inspect or maintain the local cache.
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCommand {
    /// Counters, hit rate, and configured TTLs.
    Stats,
    /// Per-entry size, age, and status.
    Info,
    /// Remove every entry and reset statistics.
    Clear,
    /// Remove expired and unreadable entries only.
    Cleanup,
}

/// Join positional words back into the string the launcher typed.
pub fn joined(words: &[String]) -> String {
    words.join(" ")
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "routine-picker", version, about = "Pick beauty products and get an AI-built routine for them")]
pub struct Args {
    /// TOML config file; defaults to the user config dir when present
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub endpoint: Option<String>,

    /// Give up on the completion endpoint after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Catalog path or http(s) URL
    #[arg(long)]
    pub catalog: Option<String>,

    /// Selection storage file
    #[arg(long)]
    pub storage: Option<PathBuf>,

    /// Keep the selection in memory only
    #[arg(long, default_value_t = false)]
    pub ephemeral: bool,

    #[arg(long, default_value_t = false)]
    pub save_exchange: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List catalog categories
    Categories,
    /// Show products in a category
    List { category: String },
    /// Show one product's details
    Show { id: i64 },
    /// Add a product to the selection
    Select { id: i64 },
    /// Remove a product from the selection
    Remove { id: i64 },
    /// Print the current selection
    Selected,
    /// Remove all selected products
    Clear {
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Generate a routine for the current selection
    Generate,
    /// Ask a one-off question
    Ask { text: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_interactive() {
        let args = Args::parse_from(["routine-picker", "--timeout-secs", "20"]);
        assert!(args.command.is_none());
        assert_eq!(args.timeout_secs, Some(20));
    }

    #[test]
    fn ask_collects_words() {
        let args = Args::parse_from(["routine-picker", "ask", "is", "retinol", "ok?"]);
        match args.command {
            Some(Command::Ask { text }) => assert_eq!(text.join(" "), "is retinol ok?"),
            other => panic!("unexpected {other:?}"),
        }
    }
}

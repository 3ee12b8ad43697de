use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListOutputFormat {
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "fl-cli", version, about = "Folio content store CLI")]
pub struct Cli {
    /// SQLite content database (falls back to FOLIO_DB_PATH).
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the content tables.
    Init,
    /// Create or update a category.
    WriteCategory {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// URL slug (defaults to the slugified name).
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value = "#000000")]
        color: String,
        #[arg(long, default_value_t = 0)]
        sort_index: i64,
    },
    /// Write a Markdown article with YAML frontmatter.
    WriteArticle {
        /// Markdown file path.
        #[arg(long)]
        file: PathBuf,
        /// Article id (overrides frontmatter `id` and the file stem).
        #[arg(long)]
        id: Option<String>,
        /// Comma-separated category ids (overrides frontmatter `categories`).
        #[arg(long)]
        categories: Option<String>,
        /// Structured editor document (JSON) stored next to the markdown.
        #[arg(long)]
        document: Option<PathBuf>,
    },
    /// Print every category with its published articles as view models.
    List {
        #[arg(long, value_enum, default_value = "table")]
        format: ListOutputFormat,
    },
    /// Print the resolved page of one article as JSON.
    Show {
        #[arg(long)]
        id: String,
        /// Include unpublished articles.
        #[arg(long)]
        drafts: bool,
    },
}

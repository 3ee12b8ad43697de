pub mod init;
pub mod list;
pub mod show;
pub mod write_article;
pub mod write_category;

use std::path::PathBuf;

use anyhow::{Context, Result};
use folio_shared::{config::ContentConfig, mapper::ViewMapper, sqlite_store::SqliteContentStore};

use crate::cli::{Cli, Commands};

/// Store and mapper for one CLI invocation. `--db-path` wins over the
/// environment.
pub(crate) struct Workspace {
    pub store: SqliteContentStore,
    pub mapper: ViewMapper,
}

impl Workspace {
    fn open(db_path: Option<PathBuf>) -> Result<Self> {
        let mut config = ContentConfig::from_env().context("invalid content configuration")?;
        if db_path.is_some() {
            config.database_path = db_path;
        }
        Ok(Self {
            store: SqliteContentStore::from_config(&config),
            mapper: ViewMapper::from_config(&config),
        })
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let workspace = Workspace::open(cli.db_path)?;
    match cli.command {
        Commands::Init => init::run(&workspace).await,
        Commands::WriteCategory {
            id,
            name,
            slug,
            color,
            sort_index,
        } => write_category::run(&workspace, id, name, slug, color, sort_index).await,
        Commands::WriteArticle {
            file,
            id,
            categories,
            document,
        } => write_article::run(&workspace, &file, id, categories, document.as_deref()).await,
        Commands::List {
            format,
        } => list::run(&workspace, format).await,
        Commands::Show {
            id,
            drafts,
        } => show::run(&workspace, &id, drafts).await,
    }
}

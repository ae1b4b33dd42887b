//! Catalog maintenance: JSON imports, deletions and statistics.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use songclip_server::catalog_import::{import_file, ImportFile};
use songclip_server::catalog_store::{
    CatalogStats, Song, SqliteCatalogStore, WritableCatalogStore,
};
use songclip_server::cli_style::{
    get_styles, print_error, print_key_value, print_section_footer, print_section_header,
    print_success, print_warning, TableBuilder,
};
use songclip_server::config::{AppConfig, CliConfig, FileConfig};
use songclip_server::logging::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "cli-catalog", styles = get_styles())]
#[command(about = "Import songs into the catalog and inspect it")]
struct Args {
    /// Directory holding catalog.db.
    #[arg(long)]
    db_dir: Option<PathBuf>,

    /// Optional TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Imports a JSON song list. Songs already in the catalog gain the category.
    Import {
        #[arg(value_name = "JSON_FILE")]
        path: PathBuf,

        /// Category to file the songs under instead of the one in the file.
        #[arg(long)]
        category: Option<String>,
    },

    /// Deletes songs by id, with their category memberships and reports.
    DeleteSongs {
        #[arg(value_name = "SONG_ID", required = true)]
        ids: Vec<String>,
    },

    /// Takes a category away from the given songs. The songs stay in the catalog.
    RemoveCategory {
        #[arg(long)]
        category: String,

        #[arg(value_name = "SONG_ID", required = true)]
        ids: Vec<String>,
    },

    /// Prints song counts per category, difficulty, era and region.
    Stats,
}

fn open_store(args: &Args) -> Result<SqliteCatalogStore> {
    let file_config = args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli = CliConfig {
        db_dir: args.db_dir.clone(),
        ..Default::default()
    };
    let config = AppConfig::resolve(&cli, file_config)?;
    SqliteCatalogStore::new(config.catalog_db_path(), 1)
}

fn import(store: &SqliteCatalogStore, path: &Path, category: Option<&str>) -> Result<()> {
    let file = ImportFile::load(path)?;
    let stats = import_file(store, &file, category, &mut rand::rng())?;

    print_section_header("Import complete");
    print_key_value("File", &path.display().to_string());
    print_key_value("Songs in file", &file.songs.len().to_string());
    print_key_value("Added", &stats.added.to_string());
    print_key_value("Updated", &stats.updated.to_string());
    print_key_value("Skipped", &stats.skipped.to_string());
    print_section_footer();
    Ok(())
}

fn songs_table(songs: &[Song]) -> TableBuilder {
    let mut table = TableBuilder::new(vec!["Id", "Title", "Artists"]);
    for song in songs {
        table.add_row(vec![song.id.clone(), song.title.clone(), song.artists.join(", ")]);
    }
    table
}

fn warn_not_found(not_found: &[String]) {
    if !not_found.is_empty() {
        print_warning(&format!("Not found: {}", not_found.join(", ")));
    }
}

fn delete_songs(store: &SqliteCatalogStore, ids: &[String]) -> Result<()> {
    let outcome = store.delete_songs(ids)?;

    print_section_header("Deleted songs");
    print_key_value("Deleted", &outcome.deleted.len().to_string());
    print_key_value("Not found", &outcome.not_found.len().to_string());
    print_section_footer();
    if !outcome.deleted.is_empty() {
        songs_table(&outcome.deleted).print();
        print_warning("Rebuild the variant table so counts match the catalog");
    }
    warn_not_found(&outcome.not_found);
    Ok(())
}

fn remove_category(store: &SqliteCatalogStore, category: &str, ids: &[String]) -> Result<()> {
    let name = category.trim().to_lowercase();
    let Some(outcome) = store.remove_song_category(ids, &name)? else {
        anyhow::bail!("Category \"{}\" not found", name);
    };

    print_section_header(&format!("Removed category \"{}\"", name));
    print_key_value("Removed from", &outcome.removed.len().to_string());
    print_key_value("Without category", &outcome.without_category.len().to_string());
    print_key_value("Not found", &outcome.not_found.len().to_string());
    print_section_footer();
    if !outcome.removed.is_empty() {
        songs_table(&outcome.removed).print();
        print_warning("Rebuild the variant table so counts match the catalog");
    }
    if !outcome.without_category.is_empty() {
        let ids: Vec<&str> = outcome.without_category.iter().map(|s| s.id.as_str()).collect();
        print_warning(&format!("Not in category: {}", ids.join(", ")));
    }
    warn_not_found(&outcome.not_found);
    Ok(())
}

fn distribution_table(header: &str, rows: &[(String, usize)]) -> TableBuilder {
    let mut table = TableBuilder::new(vec![header, "Songs"]);
    for (label, count) in rows {
        table.add_row(vec![label.clone(), count.to_string()]);
    }
    table
}

fn print_stats(stats: &CatalogStats) {
    print_section_header("Catalog");
    print_key_value("Songs", &stats.total_songs.to_string());
    print_key_value("Categories", &stats.categories.len().to_string());
    if let (Some(oldest), Some(newest)) = (stats.oldest_release_year, stats.newest_release_year) {
        print_key_value("Release years", &format!("{} - {}", oldest, newest));
    }
    print_section_footer();

    let mut categories = TableBuilder::new(vec!["Category", "Songs", "By difficulty"]);
    for category in &stats.categories {
        let breakdown: Vec<String> = category
            .difficulty_breakdown
            .iter()
            .map(|(rating, count)| format!("{}:{}", rating, count))
            .collect();
        categories.add_row(vec![
            category.name.clone(),
            category.songs.to_string(),
            breakdown.join(" "),
        ]);
    }
    categories.print();

    let difficulties: Vec<(String, usize)> = stats
        .difficulty_distribution
        .iter()
        .map(|(rating, count)| (rating.to_string(), *count))
        .collect();
    distribution_table("Difficulty", &difficulties).print();
    distribution_table("Region", &stats.regions).print();
}

fn run(args: &Args) -> Result<()> {
    let store = open_store(args)?;
    match &args.command {
        Command::Import { path, category } => import(&store, path, category.as_deref()),
        Command::DeleteSongs { ids } => delete_songs(&store, ids),
        Command::RemoveCategory { category, ids } => remove_category(&store, category, ids),
        Command::Stats => {
            print_stats(&store.stats()?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();
    info!("cli-catalog {:?}", args.command);
    match run(&args) {
        Ok(()) => {
            if !matches!(args.command, Command::Stats) {
                print_success("Done");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{:#}", err);
            print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

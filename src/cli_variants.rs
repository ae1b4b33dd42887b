//! Builds, inspects and exports the variant table.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use songclip_server::catalog_store::SqliteCatalogStore;
use songclip_server::cli_style::{
    get_styles, print_error, print_key_value, print_section_footer, print_section_header,
    print_success, print_warning, TableBuilder,
};
use songclip_server::config::{AppConfig, CliConfig, FileConfig};
use songclip_server::logging::init_tracing;
use songclip_server::groups::{GroupName, ResolvedGroups};
use songclip_server::variants::qr::{write_qr_codes, DEFAULT_QR_SIZE};
use songclip_server::variants::{
    SqliteVariantStore, SubsetExport, VariantBuilder, VariantReport, VariantSubset, VariantTable,
};

#[derive(Parser, Debug)]
#[command(name = "cli-variants", styles = get_styles())]
#[command(about = "Build and inspect the variant table")]
struct Args {
    /// Directory holding catalog.db and variants.db.
    #[arg(long)]
    db_dir: Option<PathBuf>,

    /// Optional TOML config file (groups, regions, build parallelism).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Counts every variant against the catalog and publishes the table.
    Build,

    /// Summarizes the latest published table.
    Report {
        #[arg(long, value_enum, default_value_t = VariantSubset::All)]
        subset: VariantSubset,

        /// Also list the variants, best populated first.
        #[arg(long)]
        list: bool,

        /// Print the summary as plain text, without colors.
        #[arg(long)]
        plain: bool,
    },

    /// Writes the latest published table, or a subset of it, as JSON.
    Export {
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = VariantSubset::All)]
        subset: VariantSubset,
    },

    /// Writes one SVG QR code per variant, each opening the client on it.
    Qr {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Client address the codes point at.
        #[arg(long, default_value = "http://localhost:3000")]
        base_url: String,

        #[arg(long, value_enum, default_value_t = VariantSubset::All)]
        subset: VariantSubset,

        /// Minimum image width in pixels.
        #[arg(long, default_value_t = DEFAULT_QR_SIZE)]
        size: u32,
    },
}

fn resolve_config(args: &Args) -> Result<AppConfig> {
    let file_config = args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let cli = CliConfig {
        db_dir: args.db_dir.clone(),
        ..Default::default()
    };
    AppConfig::resolve(&cli, file_config)
}

fn load_latest(config: &AppConfig) -> Result<VariantTable> {
    let store = SqliteVariantStore::new(config.variants_db_path())?;
    store
        .load_latest()?
        .context("No variant table published yet, run `cli-variants build` first")
}

fn build(config: &AppConfig) -> Result<()> {
    let catalog = SqliteCatalogStore::new(config.catalog_db_path(), config.build_parallelism)?;
    let variant_store = SqliteVariantStore::new(config.variants_db_path())?;

    let groups = ResolvedGroups::load(&config.groups, &catalog)?;
    print_section_header("Genre groups");
    for group in GroupName::ALL {
        let members = groups.members(group);
        let mut value = format!("{} categories", members.len());
        if group == GroupName::Other && groups.is_other_derived() {
            value.push_str(" (derived)");
        }
        print_key_value(group.token(), &value);
    }
    print_section_footer();

    let builder = VariantBuilder::new(&catalog, config.regions.clone(), config.build_parallelism);
    let table = builder.build_and_publish(&groups, &variant_store)?;

    print_success(&format!(
        "Published variant table {} ({} variants over {} songs)",
        table.build_id(),
        table.len(),
        table.catalog_songs()
    ));
    let empty = table.ranked().iter().filter(|v| v.match_count == 0).count();
    if empty > 0 {
        print_warning(&format!("{} variants have no songs", empty));
    }
    Ok(())
}

fn report(config: &AppConfig, subset: VariantSubset, list: bool, plain: bool) -> Result<()> {
    let table = load_latest(config)?;
    let report = VariantReport::new(&table, subset);

    if plain {
        print!("{}", report);
    } else {
        print_section_header(&format!("Variants ({})", subset));
        print_key_value("Build", &report.build_id);
        print_key_value("Variants", &report.total.to_string());
        print_key_value("With songs", &report.with_songs.to_string());
        print_key_value("Without songs", &report.without_songs.to_string());
        print_key_value("Average songs", &format!("{:.1}", report.average_songs));
        if let Some((key, count)) = &report.most_populated {
            print_key_value("Most populated", &format!("{} ({})", key, count));
        }
        if let Some((key, count)) = &report.least_populated {
            print_key_value("Least populated", &format!("{} ({})", key, count));
        }
        print_section_footer();
    }

    if list {
        let mut rows = TableBuilder::new(vec!["Rank", "Subset rank", "Key", "Songs"]);
        for entry in subset.select(&table) {
            rows.add_row(vec![
                entry.variant.rank.to_string(),
                entry.subset_rank.to_string(),
                entry.variant.key.to_string(),
                entry.variant.match_count.to_string(),
            ]);
        }
        if plain {
            for line in rows.render() {
                println!("{}", line);
            }
        } else {
            rows.print();
        }
    }
    Ok(())
}

fn export(config: &AppConfig, path: &Path, subset: VariantSubset) -> Result<()> {
    let table = load_latest(config)?;
    let export = SubsetExport::new(&table, subset);
    export.write_atomically(path)?;
    print_success(&format!(
        "Wrote {} variants of build {} to {}",
        export.variants.len(),
        export.build_id,
        path.display()
    ));
    Ok(())
}

fn qr(
    config: &AppConfig,
    dir: &Path,
    base_url: &str,
    subset: VariantSubset,
    size: u32,
) -> Result<()> {
    let table = load_latest(config)?;
    let written = write_qr_codes(&table, subset, dir, base_url, size)?;
    print_success(&format!(
        "Wrote {} QR codes of build {} to {}",
        written,
        table.build_id(),
        dir.display()
    ));
    Ok(())
}

fn run(args: &Args) -> Result<()> {
    let config = resolve_config(args)?;
    match &args.command {
        Command::Build => build(&config),
        Command::Report {
            subset,
            list,
            plain,
        } => report(&config, *subset, *list, *plain),
        Command::Export { path, subset } => export(&config, path, *subset),
        Command::Qr {
            dir,
            base_url,
            subset,
            size,
        } => qr(&config, dir, base_url, *subset, *size),
    }
}

fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();
    info!("cli-variants {:?}", args.command);
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}

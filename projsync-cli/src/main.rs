use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use projsync_cli::config::{self, ConfigMerger};
use projsync_core::adapters::{FsDocumentStore, FsProject, GitVersionControl, NoVersionControl};
use projsync_core::ports::{ProjectIdentity, VersionControl};
use projsync_core::{ProjectKind, ProjectSync, SyncError};
use serde_json::json;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "projsync",
    version,
    about = "Inspect and update project build documents."
)]
struct Cli {
    /// Project build document.
    #[arg(long, global = true, env = "PROJSYNC_PROJECT", default_value = "")]
    project: Utf8PathBuf,

    /// Project kind: native, native-store-variant, managed, or a type identifier.
    /// Inferred from the file extension when omitted.
    #[arg(long, global = true)]
    kind: Option<String>,

    /// Config file (default: <project dir>/projsync.toml).
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Global property override, NAME=VALUE. Repeatable.
    #[arg(long = "property", short = 'p', global = true)]
    properties: Vec<String>,

    /// Skip version control when writing.
    #[arg(long, global = true, default_value_t = false)]
    no_vcs: bool,

    /// Output format (text, json).
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List tracked source items in document order.
    Items,
    /// Report whether a file is an item produced by code generation.
    Generated {
        /// File path (relative paths are resolved against the current directory).
        file: Utf8PathBuf,
    },
    /// Report whether a build integration is installed.
    Installed {
        /// Integration name (default: the configured default integration).
        #[arg(long)]
        integration: Option<String>,
    },
    /// Read a property.
    Property {
        name: String,
        /// Read the evaluated value instead of the authored text.
        #[arg(long, default_value_t = false)]
        evaluated: bool,
        /// Value printed when the property is absent or empty.
        #[arg(long, default_value = "")]
        default: String,
    },
    /// Read metadata of the item with the given include.
    ItemMetadata {
        identity: String,
        name: String,
        #[arg(long, default_value = "")]
        default: String,
    },
    /// Set metadata on matching items.
    SetMetadata {
        name: String,
        value: String,
        /// Only items of this type.
        #[arg(long = "type")]
        item_type: Option<String>,
        /// Only items with this label.
        #[arg(long)]
        label: Option<String>,
        /// Set the tracked item type's default metadata instead of item metadata.
        #[arg(long, default_value_t = false, conflicts_with_all = ["item_type", "label"])]
        definition: bool,
    },
    /// Add a build integration's imports if missing.
    AddIntegration {
        /// Integration name (default: the configured default integration).
        name: Option<String>,
    },
    /// Add a project type identifier to ProjectTypeGuids if missing.
    AddFlavor { flavor: String },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        let code = e.downcast_ref::<SyncError>().map_or(1, SyncError::exit_code);
        return ExitCode::from(code);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.project.as_str().is_empty() {
        anyhow::bail!("no project given; pass --project or set PROJSYNC_PROJECT");
    }

    let project = project_identity(&cli.project, cli.kind.as_deref());
    let sync = build_sync(&cli, &project)?;
    let format = cli.format;

    match cli.cmd {
        Command::Items => {
            let items = sync.tracked_items(&project);
            match format {
                OutputFormat::Text => items.iter().for_each(|i| println!("{i}")),
                OutputFormat::Json => print_json(&json!({ "items": items }))?,
            }
        }
        Command::Generated { file } => {
            let abs = absolute(&file)?;
            let generated = sync.is_generated_item(&project, &abs);
            print_flag(format, "generated", generated)?;
        }
        Command::Installed { integration } => {
            let name = integration.unwrap_or_else(|| sync.settings().default_integration.clone());
            let installed = sync.is_named_integration_installed(&project, &name);
            print_flag(format, "installed", installed)?;
        }
        Command::Property {
            name,
            evaluated,
            default,
        } => {
            let value = if evaluated {
                sync.evaluated_property_or(&project, &name, &default)
            } else {
                sync.property_or(&project, &name, &default)
            };
            print_value(format, &name, &value)?;
        }
        Command::ItemMetadata {
            identity,
            name,
            default,
        } => {
            let value = sync.item_metadata(&project, &identity, &name, &default);
            print_value(format, &name, &value)?;
        }
        Command::SetMetadata {
            name,
            value,
            item_type,
            label,
            definition,
        } => {
            if definition {
                sync.set_default_item_metadata(&project, &name, &value)?;
                info!(name = %name, "set default item metadata");
            } else {
                let updated = sync.set_item_metadata(
                    &project,
                    item_type.as_deref(),
                    label.as_deref(),
                    &name,
                    &value,
                )?;
                info!(name = %name, updated, "set item metadata");
                match format {
                    OutputFormat::Text => println!("{updated}"),
                    OutputFormat::Json => print_json(&json!({ "updated": updated }))?,
                }
            }
        }
        Command::AddIntegration { name } => {
            let name = name.unwrap_or_else(|| sync.settings().default_integration.clone());
            let changed = sync.add_integration_if_missing(&project, &name)?;
            print_flag(format, "changed", changed)?;
        }
        Command::AddFlavor { flavor } => {
            let changed = sync.add_project_flavor_if_missing(&project, &flavor)?;
            print_flag(format, "changed", changed)?;
        }
    }
    Ok(())
}

fn project_identity(path: &Utf8Path, kind: Option<&str>) -> FsProject {
    match kind {
        Some(kind) => FsProject::new(path, kind.parse::<ProjectKind>().unwrap_or_default()),
        None => FsProject::with_inferred_kind(path),
    }
}

fn build_sync(cli: &Cli, project: &FsProject) -> anyhow::Result<ProjectSync> {
    let file_config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => {
            let path = project.full_path().context("resolve project path")?;
            config::load_for_project(&path).context("load projsync.toml config")?
        }
    };
    let cli_properties = config::parse_cli_properties(&cli.properties)?;
    let settings = ConfigMerger::new(file_config).merge(&cli_properties);
    debug!(
        "merged config: tracked={}, marker={}, integrations={}, properties={:?}",
        settings.tracked_item_type,
        settings.generated_marker,
        settings.integrations.len(),
        settings.global_properties
    );

    let vcs: Box<dyn VersionControl> = if cli.no_vcs {
        Box::new(NoVersionControl)
    } else {
        Box::new(GitVersionControl)
    };
    Ok(ProjectSync::with_ports(
        Box::new(FsDocumentStore),
        vcs,
        settings,
    ))
}

fn absolute(path: &Utf8Path) -> anyhow::Result<Utf8PathBuf> {
    let abs = std::path::absolute(path).with_context(|| format!("resolve {}", path))?;
    Utf8PathBuf::from_path_buf(abs).map_err(|p| anyhow::anyhow!("non-UTF-8 path {}", p.display()))
}

fn print_flag(format: OutputFormat, key: &str, value: bool) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{value}"),
        OutputFormat::Json => print_json(&json!({ key: value }))?,
    }
    Ok(())
}

fn print_value(format: OutputFormat, key: &str, value: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{value}"),
        OutputFormat::Json => print_json(&json!({ "name": key, "value": value }))?,
    }
    Ok(())
}

fn print_json(v: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(v).context("serialize json")?);
    Ok(())
}

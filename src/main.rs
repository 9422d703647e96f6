use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use popmachine::chemicals::models as chemicals;
use popmachine::config::{Config, connect};
use popmachine::designs::models::{self as designs, DesignType, DesignUpdate};
use popmachine::machine::{Machine, Query};
use popmachine::plates::{models as plates, services as plate_services};
use popmachine::projects::models as projects;
use popmachine::services::{DesignTable, MeasurementTable, PlateImport, import_plate};
use popmachine::strains::models as strains;
use sea_orm::DatabaseConnection;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "popmachine", version, about = "Plate and well experiment store")]
struct Cli {
    /// Database URL, overriding DB_URL and the DB_* variables
    #[arg(long, global = true)]
    db_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or upgrade the schema
    Migrate,
    #[command(subcommand)]
    Project(ProjectCommand),
    #[command(subcommand)]
    Plate(PlateCommand),
    #[command(subcommand)]
    Design(DesignCommand),
    #[command(subcommand)]
    Chemical(ChemicalCommand),
    #[command(subcommand)]
    Strain(StrainCommand),
    /// Select wells, e.g. `search "media=LB,M9; include=temperature"`
    Search(SearchArgs),
}

#[derive(Subcommand)]
enum ProjectCommand {
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    List,
    /// Delete a project with all of its plates
    Delete { name: String },
}

#[derive(Subcommand)]
enum PlateCommand {
    /// Create a plate from a measurement table and an optional design table
    Import(ImportArgs),
    Delete {
        project: String,
        name: String,
    },
    /// List a plate's wells and their readings count
    Show {
        project: String,
        name: String,
    },
}

#[derive(Args)]
struct ImportArgs {
    project: String,
    name: String,
    /// Plate reader export: `well,<t0>,<t1>,...`
    #[arg(long)]
    data: PathBuf,
    /// Conditions per well: `well,<design>,...`
    #[arg(long)]
    design: Option<PathBuf>,
    /// Design columns to skip
    #[arg(long, value_delimiter = ',')]
    ignore: Vec<String>,
}

#[derive(Subcommand)]
enum DesignCommand {
    Create {
        name: String,
        #[arg(long, default_value = "str")]
        design_type: DesignType,
    },
    List,
    Update {
        name: String,
        #[arg(long)]
        design_type: Option<DesignType>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        protocol: Option<String>,
    },
}

#[derive(Subcommand)]
enum ChemicalCommand {
    Create {
        name: String,
        #[arg(long)]
        abbreviation: Option<String>,
    },
    List,
}

#[derive(Subcommand)]
enum StrainCommand {
    Create {
        name: String,
        #[arg(long)]
        pubmed_id: Option<i32>,
        #[arg(long)]
        parent: Option<Uuid>,
    },
    /// Print a strain and its ancestors
    Lineage { id: Uuid },
}

#[derive(Args)]
struct SearchArgs {
    query: String,
    /// Print the dataset as JSON instead of CSV
    #[arg(long)]
    json: bool,
    /// Also print the readings in long form
    #[arg(long)]
    series: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(url) = cli.db_url {
        config.db_url = url;
    }

    let migrate = matches!(cli.command, Command::Migrate);
    let db = connect(&config, migrate)
        .await
        .with_context(|| format!("Could not connect to {}", config.db_url))?;

    match cli.command {
        Command::Migrate => println!(
            "{} {} schema is up to date ({} deployment)",
            style("✓").green(),
            config.app_name,
            config.deployment.to_uppercase()
        ),
        Command::Project(command) => project(&db, command).await?,
        Command::Plate(command) => plate(&db, command).await?,
        Command::Design(command) => design(&db, command).await?,
        Command::Chemical(command) => chemical(&db, command).await?,
        Command::Strain(command) => strain(&db, command).await?,
        Command::Search(args) => search(&db, args).await?,
    }
    Ok(())
}

async fn project(db: &DatabaseConnection, command: ProjectCommand) -> Result<()> {
    match command {
        ProjectCommand::Create { name, description } => {
            let project = projects::create_project(db, &name, description).await?;
            println!("{} Created project {}", style("✓").green(), style(&project.name).bold());
        }
        ProjectCommand::List => {
            for project in projects::list_projects(db).await? {
                let plates = plates::list_plates(db, project.id).await?;
                println!(
                    "{}  {} plates  {}",
                    style(&project.name).bold(),
                    plates.len(),
                    project.description.unwrap_or_default()
                );
            }
        }
        ProjectCommand::Delete { name } => {
            let project = projects::find_project_by_name(db, &name).await?;
            projects::delete_project(db, project.id).await?;
            println!("{} Deleted project {}", style("✓").green(), name);
        }
    }
    Ok(())
}

async fn plate(db: &DatabaseConnection, command: PlateCommand) -> Result<()> {
    match command {
        PlateCommand::Import(args) => {
            let project = projects::find_project_by_name(db, &args.project).await?;
            let data = MeasurementTable::from_path(&args.data)
                .with_context(|| format!("Reading {}", args.data.display()))?;
            let design = match &args.design {
                Some(path) => Some(
                    DesignTable::from_path(path)
                        .with_context(|| format!("Reading {}", path.display()))?,
                ),
                None => None,
            };

            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .context("Invalid progress template")?,
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message(format!("Importing {} wells into {}", data.wells.len(), args.name));

            let outcome = import_plate(
                db,
                PlateImport {
                    project_id: project.id,
                    name: args.name,
                    data_table: Some(args.data.display().to_string()),
                    data,
                    design,
                    ignore: args.ignore,
                },
            )
            .await;

            match outcome {
                Ok(result) => {
                    pb.finish_with_message("Import complete");
                    println!(
                        "{} {}: {} wells, {} readings, {} design values in {} ms",
                        style("✓").green(),
                        result.plate,
                        result.wells_created,
                        result.measurements_created,
                        result.design_values_created,
                        result.processing_time_ms
                    );
                    if !result.designs_created.is_empty() {
                        println!("  new designs: {}", result.designs_created.join(", "));
                    }
                    if !result.columns_ignored.is_empty() {
                        println!("  ignored: {}", result.columns_ignored.join(", "));
                    }
                }
                Err(e) => {
                    pb.abandon_with_message("Import failed");
                    return Err(e.into());
                }
            }
        }
        PlateCommand::Delete { project, name } => {
            let project = projects::find_project_by_name(db, &project).await?;
            let plate = plates::find_plate(db, project.id, &name).await?;
            plate_services::delete_plate(db, plate.id).await?;
            println!("{} Deleted {}", style("✓").green(), plate);
        }
        PlateCommand::Show { project, name } => {
            let project = projects::find_project_by_name(db, &project).await?;
            let plate = plates::find_plate(db, project.id, &name).await?;
            let wells = plate_services::plate_wells(db, plate.id).await?;
            let ids: Vec<Uuid> = wells.iter().map(|w| w.id).collect();
            let series = plate_services::well_series(db, &ids).await?;

            println!("{} ({} wells)", style(&plate).bold(), wells.len());
            for well in &wells {
                let readings = series.get(&well.id).map_or(0, Vec::len);
                println!("  {:>4}  {}  {} readings", well.plate_number, well.id, readings);
            }
        }
    }
    Ok(())
}

async fn design(db: &DatabaseConnection, command: DesignCommand) -> Result<()> {
    match command {
        DesignCommand::Create { name, design_type } => {
            let design = designs::create_design(db, &name, design_type).await?;
            println!("{} Created design {}", style("✓").green(), design);
        }
        DesignCommand::List => {
            for design in designs::list_designs(db).await? {
                println!(
                    "{}  {}",
                    style(&design).bold(),
                    design.description.as_deref().unwrap_or_default()
                );
            }
        }
        DesignCommand::Update {
            name,
            design_type,
            description,
            protocol,
        } => {
            let Some(design) = designs::find_design_by_name(db, &name).await? else {
                bail!("No design called '{name}'");
            };
            let updated = designs::update_design(
                db,
                design.id,
                DesignUpdate {
                    design_type,
                    description,
                    protocol,
                },
            )
            .await?;
            println!("{} Updated design {}", style("✓").green(), updated);
        }
    }
    Ok(())
}

async fn chemical(db: &DatabaseConnection, command: ChemicalCommand) -> Result<()> {
    match command {
        ChemicalCommand::Create { name, abbreviation } => {
            let chemical = chemicals::create_chemical(db, &name, abbreviation.as_deref()).await?;
            println!("{} Created chemical {}", style("✓").green(), chemical);
        }
        ChemicalCommand::List => {
            for chemical in chemicals::list_chemicals(db).await? {
                println!("{chemical}");
            }
        }
    }
    Ok(())
}

async fn strain(db: &DatabaseConnection, command: StrainCommand) -> Result<()> {
    match command {
        StrainCommand::Create {
            name,
            pubmed_id,
            parent,
        } => {
            let strain = strains::create_strain(db, &name, pubmed_id, parent).await?;
            println!("{} Created strain {} ({})", style("✓").green(), strain, strain.id);
        }
        StrainCommand::Lineage { id } => {
            for (depth, strain) in strains::lineage(db, id).await?.iter().enumerate() {
                println!("{}{}", "  ".repeat(depth), strain);
            }
        }
    }
    Ok(())
}

async fn search(db: &DatabaseConnection, args: SearchArgs) -> Result<()> {
    let query = Query::parse(&args.query)?;
    let dataset = Machine::new(db).search(&query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&dataset)?);
    } else {
        dataset.write_csv(io::stdout().lock())?;
        if args.series {
            println!();
            dataset.write_series_csv(io::stdout().lock())?;
        }
    }
    eprintln!(
        "{} {} wells, grouped by {}",
        style("✓").green(),
        dataset.len(),
        query.grouping_fields().join(", ")
    );
    Ok(())
}

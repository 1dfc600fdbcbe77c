use clap::{Parser, Subcommand};
use rate_grid::{
    geometry::Point,
    grid::CellSize,
    io::{
        geojson::write_grid_geojson,
        json::{read_blocks_json, write_blocks_json},
        part::{read_part_file, write_part_file},
    },
    state::ImportReport,
    store::SqliteStore,
    CellStatus, EditorState, RateGridError, Result,
};

#[derive(Parser)]
#[command(name = "rate_grid_cli", version, about = "Variable-rate grid editor")]
struct Cli {
    /// Session database holding grid settings and blocks.
    #[arg(long, global = true, env = "RATE_GRID_DB", default_value = "rate_grid.db")]
    db: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new grid. Unspecified values keep the current settings.
    Init {
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Cell width in meters.
        #[arg(long)]
        width: Option<f64>,
        /// Cell height in meters.
        #[arg(long)]
        height: Option<f64>,
        #[arg(long)]
        rows: Option<usize>,
        #[arg(long)]
        cols: Option<usize>,
        /// Discard existing blocks without asking.
        #[arg(long)]
        yes: bool,
    },
    /// Print the grid settings and a summary of the session.
    Show,
    /// Find the cell containing a location.
    Locate {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Add a block on the cell containing a location.
    Add {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        rate: u32,
    },
    /// Change the target rate of a block.
    Update { id: String, rate: u32 },
    /// Delete a block.
    Delete { id: String },
    /// Delete every block.
    Clear,
    /// Set the status of several cells. The rate is ignored for `unselected`.
    Batch {
        status: CellStatus,
        rate: u32,
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// List blocks as `id,rate`.
    List,
    /// Write blocks to a binary part file.
    ExportPart { output: String },
    /// Replace blocks with the contents of a part file.
    ImportPart { input: String },
    /// Write blocks to a JSON backup.
    ExportJson { output: String },
    /// Replace blocks with the contents of a JSON backup.
    ImportJson { input: String },
    /// Write grid cells as GeoJSON polygons.
    ExportGeojson { output: String },
}

fn print_report(report: &ImportReport) {
    println!(
        "Imported {} block(s), skipped {}",
        report.imported, report.skipped
    );
}

fn run(cli: Cli) -> Result<()> {
    let mut store = SqliteStore::open(&cli.db)?;
    let mut state = EditorState::restore(&store)?;

    match cli.command {
        Commands::Init {
            lat,
            lng,
            width,
            height,
            rows,
            cols,
            yes,
        } => {
            let mut settings = *state.settings();
            let center = settings.grid_center;
            settings.grid_center = Point::new(
                lat.unwrap_or(center.latitude),
                lng.unwrap_or(center.longitude),
            );
            settings.cell_size = CellSize::new(
                width.unwrap_or(settings.cell_size.width),
                height.unwrap_or(settings.cell_size.height),
            );
            settings.grid_dimensions.rows = rows.unwrap_or(settings.grid_dimensions.rows);
            settings.grid_dimensions.cols = cols.unwrap_or(settings.grid_dimensions.cols);

            let proposal = state.propose_grid_change(settings)?;
            let discarded = state.commit_grid_change(proposal, yes)?;
            state.persist(&mut store)?;
            println!(
                "Generated {}x{} grid, discarded {} block(s)",
                settings.grid_dimensions.rows, settings.grid_dimensions.cols, discarded
            );
        }
        Commands::Show => {
            let settings = state.settings();
            println!(
                "Center: {:.6},{:.6}",
                settings.grid_center.latitude, settings.grid_center.longitude
            );
            println!(
                "Cell size: {} x {} m",
                settings.cell_size.width, settings.cell_size.height
            );
            println!(
                "Dimensions: {} rows x {} cols",
                settings.grid_dimensions.rows, settings.grid_dimensions.cols
            );
            if let Some(grid) = state.grid() {
                let b = grid.bounds();
                println!(
                    "Bounds: N {:.7} S {:.7} E {:.7} W {:.7}",
                    b.north, b.south, b.east, b.west
                );
            }
            println!("Blocks: {}", state.blocks().len());
        }
        Commands::Locate { lat, lng } => {
            let grid = state.grid().ok_or(RateGridError::GridNotReady)?;
            let cell = grid.locate_checked(lat, lng)?;
            match cell.target_rate {
                Some(rate) => println!("Cell {} ({}, rate {})", cell.id, cell.status, rate),
                None => println!("Cell {} ({})", cell.id, cell.status),
            }
        }
        Commands::Add { lat, lng, rate } => {
            let id = state.add_block(lat, lng, rate)?.id.clone();
            state.persist(&mut store)?;
            println!("Added block {id} with rate {rate}");
        }
        Commands::Update { id, rate } => {
            state.set_block_rate(&id, rate)?;
            state.persist(&mut store)?;
            println!("Updated block {id} to rate {rate}");
        }
        Commands::Delete { id } => {
            state.delete_block(&id)?;
            state.persist(&mut store)?;
            println!("Deleted block {id}");
        }
        Commands::Clear => {
            let count = state.blocks().len();
            state.clear_all();
            state.persist(&mut store)?;
            println!("Cleared {count} block(s)");
        }
        Commands::Batch { status, rate, ids } => {
            let count = state.batch_set_status(&ids, status, Some(rate))?;
            state.persist(&mut store)?;
            println!("Set {count} cell(s) to {status}");
        }
        Commands::List => {
            for block in state.blocks() {
                println!("{},{}", block.id, block.target_rate);
            }
        }
        Commands::ExportPart { output } => {
            let count = write_part_file(&output, state.blocks())?;
            println!("Wrote {count} record(s) to {output}");
        }
        Commands::ImportPart { input } => {
            let records = read_part_file(&input)?;
            let report = state.import_part_records(records)?;
            state.persist(&mut store)?;
            print_report(&report);
        }
        Commands::ExportJson { output } => {
            write_blocks_json(&output, state.blocks())?;
            println!("Wrote {output}");
        }
        Commands::ImportJson { input } => {
            let blocks = read_blocks_json(&input)?;
            let report = state.import_blocks(blocks)?;
            state.persist(&mut store)?;
            print_report(&report);
        }
        Commands::ExportGeojson { output } => {
            let grid = state.grid().ok_or(RateGridError::GridNotReady)?;
            write_grid_geojson(&output, grid)?;
            println!("Wrote {output}");
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

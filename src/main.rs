// main.rs

// --- External Crate Imports ---
use anyhow::{anyhow, Context, Error, Result};
use clap::Parser;
use expression_pca::{AnalysisConfig, AnalysisPipeline, PcaError, ProjectionMode, RawTable};
use log::{error, info};
use std::{
    fs::File,
    io::{self, BufReader},
    path::Path,
    process,
    time::Instant,
};

// --- Main Function ---
fn main() {
    let cli_args = cli::CliArgs::parse();

    // Initialize logger
    let log_level = cli_args
        .log_level
        .parse::<log::LevelFilter>()
        .unwrap_or_else(|_| {
            eprintln!(
                "Warning: Invalid log level '{}' provided. Defaulting to Info.",
                cli_args.log_level
            );
            log::LevelFilter::Info
        });
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_micros()
        .init();

    if let Err(err) = run(&cli_args) {
        error!("{:#}", err);
        process::exit(exit_code(&err));
    }
}

/// Library errors carry their own exit code; I/O and argument problems exit with 1.
fn exit_code(err: &Error) -> i32 {
    err.downcast_ref::<PcaError>().map_or(1, PcaError::exit_code)
}

fn run(cli_args: &cli::CliArgs) -> Result<(), Error> {
    let total_time_start = Instant::now();
    info!("Starting expression_pca with args: {:?}", cli_args);

    // Configure Rayon thread pool
    let num_threads = cli_args.threads.unwrap_or_else(num_cpus::get);
    info!("Using {} threads for parallel operations.", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    // --- 1. Load Table ---
    let table = input_reader::load_table(&cli_args.input, cli_args.delimiter.as_deref())?;
    info!("Loaded {} record(s).", table.len());

    // --- 2. Run Analysis ---
    let mode: ProjectionMode = cli_args.mode.into();
    let mut config = AnalysisConfig::default().with_orientation(cli_args.orientation.into());
    if let Some(k) = cli_args.components {
        config = match mode {
            ProjectionMode::Scatter => config.with_scatter_components(Some(k)),
            ProjectionMode::Scree => config.with_scree_components(k),
            ProjectionMode::Loadings => config.with_loadings_components(k),
        };
    }
    let pipeline = AnalysisPipeline::new(config)?;
    let artifact = pipeline.run(&table, mode)?;

    // --- 3. Write Output ---
    output_writer::write_artifact(cli_args.out.as_deref(), &artifact, cli_args.pretty)?;

    info!(
        "expression_pca finished successfully in {:.2?}.",
        total_time_start.elapsed()
    );
    Ok(())
}

// --- Module Implementations ---

mod cli {
    use clap::{Parser, ValueEnum};
    use expression_pca::{Orientation, ProjectionMode};
    use std::path::PathBuf;

    #[derive(ValueEnum, Clone, Copy, Debug)]
    pub(crate) enum ModeArg {
        Scatter,
        Scree,
        Loadings,
    }

    impl From<ModeArg> for ProjectionMode {
        fn from(mode: ModeArg) -> Self {
            match mode {
                ModeArg::Scatter => ProjectionMode::Scatter,
                ModeArg::Scree => ProjectionMode::Scree,
                ModeArg::Loadings => ProjectionMode::Loadings,
            }
        }
    }

    #[derive(ValueEnum, Clone, Copy, Debug)]
    pub(crate) enum OrientationArg {
        /// Columns are samples, rows are features (genes x conditions)
        Columns,
        /// Rows are samples, columns are features
        Rows,
    }

    impl From<OrientationArg> for Orientation {
        fn from(orientation: OrientationArg) -> Self {
            match orientation {
                OrientationArg::Columns => Orientation::SamplesAsColumns,
                OrientationArg::Rows => Orientation::SamplesAsRows,
            }
        }
    }

    #[derive(Parser, Debug)]
    #[command(
        author,
        version,
        about = "PCA plots for labeled expression tables.",
        long_about = None,
        propagate_version = true
    )]
    pub(crate) struct CliArgs {
        /// JSON, CSV or TSV table; `-` reads JSON from stdin
        #[arg(short, long, required = true)]
        pub(crate) input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ModeArg::Scatter)]
        pub(crate) mode: ModeArg,

        #[arg(long, value_enum, default_value_t = OrientationArg::Columns)]
        pub(crate) orientation: OrientationArg,

        /// Components to fit; defaults depend on the mode
        #[arg(short = 'k', long)]
        pub(crate) components: Option<usize>,

        /// Field delimiter; forces delimited input (otherwise ',' for .csv, tab for .tsv)
        #[arg(long)]
        pub(crate) delimiter: Option<String>,

        /// Output file; stdout when absent
        #[arg(short, long)]
        pub(crate) out: Option<PathBuf>,

        #[arg(long)]
        pub(crate) pretty: bool,

        #[arg(short = 't', long)]
        pub(crate) threads: Option<usize>,

        #[arg(long, default_value = "Info")]
        pub(crate) log_level: String,
    }
}

mod input_reader {
    use super::{anyhow, io, BufReader, Context, File, Path, RawTable, Result};
    use log::debug;

    enum Format {
        Json,
        Delimited(u8),
    }

    fn detect_format(path: &Path, delimiter: Option<&str>) -> Result<Format> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match (delimiter, ext.as_deref()) {
            (Some(d), _) => match d.as_bytes() {
                [byte] => Ok(Format::Delimited(*byte)),
                _ => Err(anyhow!("Delimiter '{}' must be a single ASCII character.", d)),
            },
            (None, Some("csv")) => Ok(Format::Delimited(b',')),
            (None, Some("tsv")) => Ok(Format::Delimited(b'\t')),
            (None, _) => Ok(Format::Json),
        }
    }

    pub(crate) fn load_table(path: &Path, delimiter: Option<&str>) -> Result<RawTable> {
        if path.as_os_str() == "-" {
            debug!("Reading JSON table from stdin.");
            return Ok(RawTable::from_json_reader(io::stdin().lock())?);
        }
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        let reader = BufReader::new(file);
        let table = match detect_format(path, delimiter)? {
            Format::Json => {
                debug!("Reading {} as JSON.", path.display());
                RawTable::from_json_reader(reader)?
            }
            Format::Delimited(d) => {
                debug!("Reading {} as delimited text ({:?}).", path.display(), d as char);
                RawTable::from_csv_reader(reader, d)?
            }
        };
        Ok(table)
    }
}

mod output_writer {
    use super::{anyhow, info, File, Path, Result};
    use expression_pca::PlotArtifact;
    use std::io::{self, BufWriter, Write};

    pub(crate) fn write_artifact(
        out: Option<&Path>,
        artifact: &PlotArtifact,
        pretty: bool,
    ) -> Result<()> {
        let mut writer: BufWriter<Box<dyn Write>> = match out {
            Some(path) => {
                let file = File::create(path).map_err(|e| {
                    anyhow!("Failed to create output file {}: {}", path.display(), e)
                })?;
                info!("Writing plot artifact to {}", path.display());
                BufWriter::new(Box::new(file))
            }
            None => BufWriter::new(Box::new(io::stdout().lock())),
        };
        if pretty {
            serde_json::to_writer_pretty(&mut writer, artifact)?;
        } else {
            serde_json::to_writer(&mut writer, artifact)?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

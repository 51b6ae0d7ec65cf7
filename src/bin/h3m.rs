use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use h3m_decoder::{
    available_exporters, decode_with, exporter_for, DecodeOptions, Decoded, ExportOptions,
    MapSections,
};

#[derive(Parser)]
#[command(name = "h3m")]
#[command(about = "Inspect and export Heroes III map files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DecodeArgs {
    /// JSON file with DecodeOptions overrides
    #[arg(long)]
    options: Option<PathBuf>,
    #[arg(long)]
    resync_window: Option<usize>,
    #[arg(long)]
    resync_attempts: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary and every decode warning
    Info {
        file: PathBuf,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// Render the map with one of the exporters
    Export {
        file: PathBuf,
        #[arg(long, default_value = "json")]
        format: String,
        /// Defaults to the input path with the exporter's extension
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Comma-separated: header, players, additional, tiles, objects, underground, full
        #[arg(long, value_delimiter = ',')]
        sections: Vec<String>,
        #[arg(long)]
        surface_only: bool,
        #[command(flatten)]
        decode: DecodeArgs,
    },
    /// List available export formats
    Formats,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_options(args: &DecodeArgs) -> CliResult<DecodeOptions> {
    let mut options = match &args.options {
        Some(path) => serde_json::from_reader(File::open(path)?)?,
        None => DecodeOptions::default(),
    };
    if let Some(window) = args.resync_window {
        options.resync_window = window;
    }
    if let Some(attempts) = args.resync_attempts {
        options.resync_attempts = attempts;
    }
    Ok(options)
}

fn decode_file(path: &Path, args: &DecodeArgs) -> CliResult<Decoded> {
    let options = load_options(args)?;
    let data = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "read map file");
    Ok(decode_with(&data, &options)?)
}

fn parse_sections(names: &[String]) -> CliResult<MapSections> {
    if names.is_empty() {
        return Ok(MapSections::all());
    }
    let mut sections = MapSections::empty();
    for name in names {
        sections |= MapSections::parse_section(name.trim())
            .ok_or_else(|| format!("unknown section '{}'", name))?;
    }
    Ok(sections)
}

fn info(file: &Path, decode: &DecodeArgs) -> CliResult<()> {
    let Decoded { map, warnings } = decode_file(file, decode)?;
    println!("File:        {}", file.display());
    println!("Format:      {} ({:#x})", map.format, map.format.code());
    println!("Name:        {}", map.info.name);
    println!("Size:        {0}x{0}, {1} level(s)", map.info.map_size, map.info.levels());
    println!(
        "Players:     {} playable",
        map.players.iter().filter(|p| p.is_playable()).count()
    );
    println!("Tiles:       {}", map.tiles.len());
    println!("Templates:   {}", map.templates.len());
    println!("Objects:     {}", map.objects.len());
    if let Some(suffix) = &map.unparsed_suffix {
        println!("Unparsed:    {} bytes", suffix.len());
    }
    if !warnings.is_empty() {
        println!("\nWarnings ({}):", warnings.len());
        for w in &warnings {
            println!("  {}", w);
        }
    }
    Ok(())
}

fn export(
    file: &Path,
    format: &str,
    output: Option<PathBuf>,
    sections: &[String],
    surface_only: bool,
    decode: &DecodeArgs,
) -> CliResult<()> {
    let exporter = exporter_for(format).ok_or_else(|| {
        let known: Vec<_> = available_exporters().iter().map(|e| e.format_name()).collect();
        format!("unknown format '{}' (available: {})", format, known.join(", "))
    })?;

    let mut options = ExportOptions::with_sections(parse_sections(sections)?);
    if surface_only {
        options.exclude_underground();
    }

    let decoded = decode_file(file, decode)?;
    for w in &decoded.warnings {
        eprintln!("warning: {}", w);
    }

    let path = output.unwrap_or_else(|| {
        file.with_extension(exporter.file_extension().trim_start_matches('.'))
    });
    let mut out = BufWriter::new(File::create(&path)?);
    exporter.export(&decoded.map, &options, &mut out)?;
    out.flush()?;
    tracing::info!(path = %path.display(), format = exporter.format_name(), "export written");
    Ok(())
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info { file, decode } => info(&file, &decode),
        Commands::Export { file, format, output, sections, surface_only, decode } => {
            export(&file, &format, output, &sections, surface_only, &decode)
        }
        Commands::Formats => {
            for e in available_exporters() {
                println!("{:<10} {}", e.format_name(), e.file_extension());
            }
            Ok(())
        }
    }
}

//! Mainlist CLI - turn marketplace order exports into the "Main List" workbook
//!
//! # Main Commands
//!
//! ```bash
//! mainlist serve                        # Start HTTP server (port 8000)
//! mainlist convert orders.csv           # Write Основной_список.xlsx
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! mainlist parse orders.csv             # Decoded table as JSON
//! mainlist columns orders.csv           # Show which columns were matched
//! ```

use clap::{Parser, Subcommand};
use mainlist::{
    convert_file, parse_file, resolve_columns,
    server::{start_server, ServerConfig},
    ConvertOptions, FILE_NAME,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mainlist")]
#[command(about = "Build a print-ready Main List from a marketplace order export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start HTTP server
    Serve {
        /// Address to bind (default: MAINLIST_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default: MAINLIST_PORT or 8000)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Convert an export (CSV or spreadsheet) into the Main List workbook
    Convert {
        /// Input file
        input: PathBuf,

        /// Output xlsx file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// CSV delimiter
        #[arg(short, long, default_value = ";")]
        delimiter: char,

        /// Print the list as JSON instead of writing a workbook
        #[arg(long)]
        json: bool,
    },

    /// Decode a file and output its rows as JSON
    Parse {
        /// Input file
        input: PathBuf,

        /// CSV delimiter
        #[arg(short, long, default_value = ";")]
        delimiter: char,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how the input columns map onto the required fields
    Columns {
        /// Input file
        input: PathBuf,

        /// CSV delimiter
        #[arg(short, long, default_value = ";")]
        delimiter: char,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { host, port } => cmd_serve(host, port).await,

        Commands::Convert {
            input,
            output,
            delimiter,
            json,
        } => cmd_convert(&input, output.as_deref(), delimiter, json),

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Columns { input, delimiter } => cmd_columns(&input, delimiter),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env().with_overrides(host, port);
    start_server(config, ConvertOptions::default()).await?;
    Ok(())
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    delimiter: char,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let options = ConvertOptions {
        delimiter,
        ..ConvertOptions::default()
    };

    let result = convert_file(input, &options).map_err(|e| {
        eprintln!("   {}", e.user_message());
        e
    })?;
    let conversion = &result.analysis.conversion;

    eprintln!("   Rows: {} ({} ready)", conversion.input_rows, conversion.ready_rows);
    eprintln!("   Articles: {}", conversion.main_list.articles.len());
    eprintln!("   Multi-article shipments: {}", conversion.main_list.shipments.len());

    if json {
        let preview = mainlist::api::PreviewResponse::from(result.analysis);
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    let path = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(FILE_NAME));
    fs::write(&path, &result.xlsx)?;
    eprintln!("💾 Output written to: {}", path.display());
    eprintln!("\n✨ Done!");

    Ok(())
}

fn cmd_parse(
    input: &Path,
    delimiter: char,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing: {}", input.display());

    let parsed = parse_file(input, delimiter)?;
    if let Some(encoding) = parsed.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    eprintln!("   Columns: {}", parsed.table.columns.join(", "));
    eprintln!("✅ Parsed {} rows", parsed.table.len());

    let json = serde_json::to_string_pretty(&parsed.table.to_records())?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_columns(input: &Path, delimiter: char) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = parse_file(input, delimiter)?;
    let options = ConvertOptions::default();

    match resolve_columns(&parsed.table.columns, &options.aliases) {
        Ok(map) => {
            for (field, column) in map.iter() {
                println!("  {:<18} ← [{:2}] {}", field.label(), column.index + 1, column.name);
            }
            Ok(())
        }
        Err(missing) => {
            eprintln!("   Available: {}", parsed.table.columns.join(", "));
            Err(missing.into())
        }
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

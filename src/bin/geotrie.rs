//! geotrie: CLI tool for merging and querying IPv4 range databases.

use clap::{Parser, Subcommand};
use geotrie::cidr::parse_ip;
use geotrie::{MergeConfig, OutputFormat, SourceConfig, Tree};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "geotrie")]
#[command(version = "0.1.0")]
#[command(about = "Merge IPv4 CIDR/range databases into a minimal block list", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the sources listed in a YAML config
    Merge {
        /// YAML merge config
        #[arg(short, long)]
        config: PathBuf,

        /// Output file (overrides the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: text or json (overrides the config)
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// Build a tree from source files given on the command line
    Build {
        /// Input text files, inserted in order
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Later inputs replace payloads of earlier ones
        #[arg(long)]
        overwrite: bool,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Look up addresses in the merged inputs
    Lookup {
        /// Input text files, inserted in order
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Later inputs replace payloads of earlier ones
        #[arg(long)]
        overwrite: bool,

        /// Addresses to query
        #[arg(required = true)]
        addresses: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Merge {
            config,
            output,
            format,
        } => merge(&config, output, format),
        Commands::Build {
            input,
            overwrite,
            output,
            format,
        } => build(&input, overwrite, output, format),
        Commands::Lookup {
            input,
            overwrite,
            addresses,
        } => lookup(&input, overwrite, &addresses),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn merge(
    config_path: &Path,
    output: Option<PathBuf>,
    format: Option<OutputFormat>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = MergeConfig::from_path(config_path)?;
    if output.is_some() {
        config.output = output;
    }
    if let Some(format) = format {
        config.format = format;
    }

    let tree = config.build_tree()?;
    write_tree(&tree, config.output.as_deref(), config.format)
}

fn build(
    inputs: &[PathBuf],
    overwrite: bool,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let tree = load_inputs(inputs, overwrite)?;
    write_tree(&tree, output.as_deref(), format)
}

fn lookup(
    inputs: &[PathBuf],
    overwrite: bool,
    addresses: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let tree = load_inputs(inputs, overwrite)?;

    for address in addresses {
        let addr = parse_ip(address)?;
        match tree.lookup(addr) {
            Some(payload) => println!("{} {}", address, payload),
            None => println!("{} not found", address),
        }
    }
    Ok(())
}

fn load_inputs(inputs: &[PathBuf], overwrite: bool) -> Result<Tree<String>, Box<dyn std::error::Error>> {
    let sources = inputs
        .iter()
        .map(|path| SourceConfig::new(path.clone()).with_overwrite(overwrite))
        .collect();
    Ok(MergeConfig::new(sources).build_tree()?)
}

fn write_tree(
    tree: &Tree<String>,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = format.render(tree)?;

    match output {
        Some(path) => {
            fs::write(path, &rendered)?;
            log::info!("Wrote {} blocks to {:?} ({})", tree.len(), path, format);
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

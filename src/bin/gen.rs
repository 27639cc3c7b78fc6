//! k2geosite-gen: CLI tool for building geosite.dat files from remote domain lists.

use clap::{Parser, Subcommand};
use k2geosite::{BuildConfig, FetcherConfig, GeoSiteReader};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "k2geosite-gen")]
#[command(author = "Kaitu.io")]
#[command(version)]
#[command(about = "Build geosite.dat files from remote domain lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every listed source and write a geosite database
    Build {
        /// File with one LABEL,URL source per line
        #[arg(short, long, default_value = "urls.txt")]
        urlfile: PathBuf,

        /// Output directory, created if missing
        #[arg(short, long, default_value = "./output")]
        outputdir: PathBuf,

        /// Output file name
        #[arg(short = 'n', long, default_value = "geosite.dat")]
        outputname: String,

        /// Fail when the source file contains malformed lines
        #[arg(long)]
        strict: bool,

        /// Also write <output>.sha256sum
        #[arg(long)]
        checksum: bool,

        /// Per-download timeout in seconds (no timeout by default)
        #[arg(long)]
        timeout: Option<u64>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the groups of an existing geosite database
    Inspect {
        /// Input geosite file
        #[arg(short, long)]
        input: PathBuf,

        /// List every domain, not just group sizes
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            urlfile,
            outputdir,
            outputname,
            strict,
            checksum,
            timeout,
            verbose,
        } => {
            init_logger(verbose);
            let config = BuildConfig {
                source_file: urlfile,
                output_dir: outputdir,
                output_name: outputname,
                strict,
                write_checksum: checksum,
                fetcher: FetcherConfig {
                    timeout: timeout.map(Duration::from_secs),
                    ..FetcherConfig::default()
                },
            };
            if let Err(e) = build(&config) {
                log::error!("{}", e);
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Inspect { input, verbose } => {
            init_logger(false);
            if let Err(e) = inspect(&input, verbose) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn build(config: &BuildConfig) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(k2geosite::run(config))?;

    log::debug!("Build report: {:?}", report);
    if report.rejected_sources > 0 {
        log::warn!("Skipped {} malformed source lines", report.rejected_sources);
    }
    if report.warnings > 0 {
        log::warn!("Dropped {} invalid domain lines", report.warnings);
    }
    if let Some(path) = &report.checksum_path {
        println!("Checksum written to {:?}", path);
    }
    println!(
        "Successfully generated {:?} ({} groups, {} domains, {} bytes)",
        report.output_path, report.groups, report.domains, report.bytes
    );
    Ok(())
}

fn inspect(input: &Path, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let groups = GeoSiteReader::open(input)?;

    let total: usize = groups.iter().map(|g| g.domains.len()).sum();
    println!("{:?}: {} groups, {} domains", input, groups.len(), total);

    for group in &groups {
        println!("{:<24} {:>8}", group.label, group.domains.len());
        if verbose {
            for domain in &group.domains {
                println!("    {}:{}", domain.kind, domain.value);
            }
        }
    }
    Ok(())
}

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand};

use skymatch::matcher::Matcher;
use skymatch::matchfile;

#[derive(Parser)]
#[command(name = "skymatch", about = "HEALPix cross-matching of spherical catalogs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match a primary catalog against a secondary and write a match file.
    Match {
        /// Primary catalog: one "ra dec radius" per line, degrees.
        primary: PathBuf,

        /// Secondary catalog: one "ra dec" per line, degrees.
        secondary: PathBuf,

        /// Output match file ("cat_ind input_ind cosdist" per line).
        #[arg(short, long)]
        output: PathBuf,

        /// HEALPix nside for the spatial index.
        #[arg(long, default_value = "512")]
        nside: i64,

        /// Maximum matches kept per primary point (0 = unlimited).
        #[arg(long, default_value = "0")]
        maxmatch: usize,

        /// Skip identical indices (matching a catalog against itself).
        #[arg(long)]
        self_match: bool,
    },

    /// Count the lines of a match file.
    CountLines {
        /// Path to a match file.
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Match {
            primary,
            secondary,
            output,
            nside,
            maxmatch,
            self_match,
        } => cmd_match(&primary, &secondary, &output, nside, maxmatch, self_match),
        Commands::CountLines { path } => cmd_count_lines(&path),
    }
}

/// Read "ra dec" or "ra dec radius" columns from a text catalog.
fn read_catalog(path: &Path, with_radius: bool) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let body = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {e}", path.display());
        process::exit(1);
    });

    let ncols = if with_radius { 3 } else { 2 };
    let mut ra = Vec::new();
    let mut dec = Vec::new();
    let mut radius = Vec::new();

    for (i, line) in body.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < ncols {
            eprintln!(
                "{}:{}: expected {} columns, got {}",
                path.display(),
                i + 1,
                ncols,
                fields.len()
            );
            process::exit(1);
        }
        let parse = |field: &str| -> f64 {
            field.parse().unwrap_or_else(|_| {
                eprintln!("{}:{}: bad number '{}'", path.display(), i + 1, field);
                process::exit(1);
            })
        };
        ra.push(parse(fields[0]));
        dec.push(parse(fields[1]));
        if with_radius {
            radius.push(parse(fields[2]));
        }
    }

    (ra, dec, radius)
}

fn cmd_match(
    primary: &Path,
    secondary: &Path,
    output: &Path,
    nside: i64,
    maxmatch: usize,
    self_match: bool,
) {
    let (ra1, dec1, radii) = read_catalog(primary, true);
    eprintln!("Loaded primary: {} points", ra1.len());

    let (ra2, dec2, _) = read_catalog(secondary, false);
    eprintln!("Loaded secondary: {} points", ra2.len());

    let mut matcher = Matcher::new(nside, &ra1, &dec1, &radii).unwrap_or_else(|e| {
        eprintln!("Failed to build catalog: {e}");
        process::exit(1);
    });
    eprintln!(
        "Built catalog: nside={}, pixel area {:.3e} sr",
        matcher.hpix_nside(),
        matcher.hpix_area()
    );

    let start = Instant::now();
    matcher
        .match_to_file(maxmatch, self_match, &ra2, &dec2, output)
        .unwrap_or_else(|e| {
            eprintln!("Match failed: {e}");
            process::exit(1);
        });

    eprintln!(
        "Wrote {} matches to {} in {:.2}s",
        matcher.nmatches(),
        output.display(),
        start.elapsed().as_secs_f64()
    );
}

fn cmd_count_lines(path: &Path) {
    let nlines = matchfile::count_lines(path).unwrap_or_else(|e| {
        eprintln!("Failed to count lines in {}: {e}", path.display());
        process::exit(1);
    });
    println!("{nlines}");
}

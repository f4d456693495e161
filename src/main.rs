use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

mod plot;
mod records;

use plot::{plot_records, render_svg};
use records::RecordStore;

/// Plot the locations of houses at or under a price cutoff.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// CSV file with house records
    #[arg(default_value = "houses.csv")]
    file: PathBuf,

    /// Maximum price a house may have to be plotted
    #[arg(short = 'p', long, default_value_t = 0)]
    max_price: u64,

    /// Where to write the rendered SVG
    #[arg(short, long, default_value = "houses.svg")]
    output: PathBuf,

    /// Also write the surviving records as CSV to stdout
    #[arg(long)]
    dump: bool,
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let store = RecordStore::from_path(&args.file)
        .with_context(|| format!("loading {}", args.file.display()))?;
    info!("loaded {} records", store.len());

    let cheap = store.filter_by_max_price(args.max_price);
    info!(
        "{} of {} records at or under {}",
        cheap.len(),
        store.len(),
        args.max_price
    );

    let commands = plot_records(cheap.values())?;
    render_svg(&commands, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!(
        "plotted {} of {} houses to {}",
        cheap.len(),
        store.len(),
        args.output.display()
    );

    if args.dump {
        let mut wtr = csv::Writer::from_writer(std::io::stdout());
        for record in cheap.values() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
    }

    Ok(())
}

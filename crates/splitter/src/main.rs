use crate::prelude::*;
use clap::Parser;

mod error;
mod inspect;
mod prelude;
mod split;
mod stores;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Split store packing-slip PDFs into one PDF per vendor using a SKU map"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(
        long,
        env = "ORDER_SPLITTER_VERBOSE",
        global = true,
        default_value = "false"
    )]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Split packing slips into per-vendor PDFs and reports
    Split(crate::split::SplitOptions),

    /// Show the candidate identifiers found on each page of a PDF
    Inspect(crate::inspect::InspectOptions),

    /// List supported stores and the labels they are matched on
    Stores,
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Split(options) => crate::split::run(options, app.global),
        SubCommands::Inspect(options) => crate::inspect::run(options, app.global),
        SubCommands::Stores => crate::stores::run(app.global),
    }
}

use clap::Parser;
use log::LevelFilter;
use miette::Result;
use swatchcam::cli::{load_config, Cli, Commands};
use swatchcam::output::Printer;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    let printer = Printer::new();

    match cli.command {
        Commands::Sample(args) => {
            let manifest = load_config(cli.config.as_deref())?;
            swatchcam::cli::sample::run(args, manifest, &printer).await?
        }
        Commands::Watch(args) => {
            let manifest = load_config(cli.config.as_deref())?;
            swatchcam::cli::watch::run(args, manifest, &printer).await?
        }
        Commands::List(args) => {
            swatchcam::cli::list::run(args, &load_config(cli.config.as_deref())?, &printer)?
        }
        Commands::Delete(args) => {
            swatchcam::cli::delete::run(args, &load_config(cli.config.as_deref())?, &printer)?
        }
        Commands::Export(args) => {
            swatchcam::cli::export::run(args, &load_config(cli.config.as_deref())?, &printer)?
        }
        Commands::Init(args) => swatchcam::cli::init::run(args, &printer)?,
        Commands::Completions(args) => swatchcam::cli::completions::run(args)?,
    }

    Ok(())
}

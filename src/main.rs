use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    bookscrape::logging::init().context("init logging")?;

    let cli = bookscrape::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        bookscrape::cli::Command::Crawl(args) => {
            bookscrape::crawl::run(args).context("crawl")?;
        }
        bookscrape::cli::Command::Convert(args) => {
            bookscrape::convert::run(args).context("convert")?;
        }
    }

    Ok(())
}

use anyhow::Context as _;

/// Crawl progress at info; the HTML parser and HTTP stack stay quiet unless
/// `RUST_LOG` asks for them.
const DEFAULT_FILTER: &str = "info,html5ever=warn,selectors=warn,reqwest=warn";

/// Installs the stderr subscriber. stdout is left for command output.
pub fn init() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(DEFAULT_FILTER))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}

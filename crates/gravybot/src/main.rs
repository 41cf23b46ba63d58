use anyhow::Context;
use clap::Parser;

use gravybot_core::{
    config::Config,
    dispatch::Dispatcher,
    intent::Classifier,
    session::Session,
    transport::{self, TelnetReader},
};

#[derive(Debug, Parser)]
#[command(name = "gravybot", version, about = "Xepher MUSH bot")]
struct Args {
    /// Server host:port (overrides GRAVYBOT_SERVER).
    #[arg(short = 's', long = "server")]
    server: Option<String>,

    /// Yirp shorten endpoint (overrides YIRP_API_ADDR).
    #[arg(long = "yirp-addr", alias = "yirpaddr")]
    yirp_addr: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    gravybot_core::logging::init("gravybot")?;

    // Config touches the process environment; the runtime's worker threads come after.
    let mut cfg = Config::load()?;
    if let Some(server) = args.server {
        cfg.server_addr = server;
    }
    if let Some(addr) = args.yirp_addr {
        cfg.yirp_api_addr = addr;
    }

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    rt.block_on(run(cfg))
}

async fn run(cfg: Config) -> anyhow::Result<()> {
    tracing::info!("Xepher MUSH Bot version: {}", env!("CARGO_PKG_VERSION"));
    for key in cfg.missing_api_keys() {
        tracing::warn!("{key} is not set; lookups that need it will fail");
    }

    let classifier = Classifier::new(&cfg.trigger)?;
    let dispatcher = Dispatcher::new(gravybot_apis::http_adapters(&cfg)?, cfg.adapter_timeout);

    tracing::info!(server = %cfg.server_addr, "connecting");
    let stream = transport::connect(&cfg.server_addr, cfg.connect_timeout)
        .await
        .with_context(|| format!("connect to {} failed", cfg.server_addr))?;
    let (reader, writer) = stream.into_split();

    let mut session = Session::new(
        cfg.credentials.clone(),
        TelnetReader::new(reader),
        writer,
        classifier,
        dispatcher,
    );
    session.run().await.context("session ended")
}

use clap::Parser;
use scaffold::backend::MemoryStore;
use server::{app, config::OperationConfig, demo};
use std::path::PathBuf;

mod test_runner;

/// Start the demo GraphQL server.
#[derive(Clone, Debug, Parser)]
struct Options {
    /// The port where the app should be served.
    #[clap(short, long, env = "SCAFFOLD_PORT", default_value = "80")]
    port: u16,

    /// JSON file with settings for each query, keyed by query name.
    #[clap(short, long, env = "SCAFFOLD_CONFIG")]
    config: Option<PathBuf>,
}

impl Options {
    async fn serve(&self) -> anyhow::Result<()> {
        let config = match &self.config {
            Some(path) => OperationConfig::load(path)?,
            None => OperationConfig::default(),
        };
        let store = MemoryStore::new();
        demo::seed(&store).await;
        let schema = demo::build_schema(&store, &config)?;

        tracing::info!("serving GraphQL on port {}", self.port);
        app(schema).listen(format!("0.0.0.0:{}", self.port)).await?;
        Ok(())
    }
}

#[async_std::main]
async fn main() -> anyhow::Result<()> {
    scaffold::init_logging();
    Options::parse().serve().await
}

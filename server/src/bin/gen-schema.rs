use clap::Parser;
use scaffold::backend::MemoryStore;
use server::{config::OperationConfig, demo};
use std::path::PathBuf;

/// Print the GraphQL schema of the demo server.
#[derive(Parser)]
struct Options {
    /// JSON file with settings for each query, keyed by query name.
    #[clap(short, long, env = "SCAFFOLD_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    scaffold::init_logging();
    let opt = Options::parse();
    let config = match opt.config {
        Some(path) => OperationConfig::load(path)?,
        None => OperationConfig::default(),
    };
    let schema = demo::build_schema(&MemoryStore::new(), &config)?;
    println!("{}", schema.sdl());
    Ok(())
}

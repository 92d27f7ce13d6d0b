use anyhow::Result;
use clap::Parser;
use semsearch_cli::{CliArgs, SemsearchApp};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let app = SemsearchApp::from_args("semsearch", &args)?;
    app.run(args).await?;
    Ok(())
}

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    txwatch_daemon::run().await?;
    Ok(())
}

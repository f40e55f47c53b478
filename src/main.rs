#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = proctor_rust::run().await {
        eprintln!("proctor-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lessondeck_backend::run().await
}

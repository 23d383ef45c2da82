use delivery_router::runner;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    runner::run().await
}

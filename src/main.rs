#[tokio::main]
async fn main() -> anyhow::Result<()> {
    signsense_lib::run(std::env::args().skip(1).collect()).await
}

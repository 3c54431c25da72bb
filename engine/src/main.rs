use filterforge::FilterForgeApp;

#[tokio::main]
async fn main() {
    if let Err(e) = FilterForgeApp::run().await {
        eprintln!("\nError: {:#}\n", e);
        std::process::exit(1);
    }
}

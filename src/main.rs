#[tokio::main]
async fn main() {
    if let Err(e) = meeting_scheduler::run().await {
        eprintln!("meeting-scheduler failed to start: {}", e);
        std::process::exit(1);
    }
}

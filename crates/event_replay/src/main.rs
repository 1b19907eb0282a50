//! `event-replay` binary entry point.

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lib_event_replay::init().await
}

use newsletter_events::pipeline::RunOutcome;
use newsletter_events::startup;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting newsletter event extraction");

    // Load configuration
    let config = startup::load_config()?;

    let mut pipeline = startup::build_pipeline(&config)?;

    match pipeline.run().await? {
        RunOutcome::NoMatch => info!("Nothing found from {}", config.sender),
        RunOutcome::EmptyBody => info!("Latest message from {} has no text", config.sender),
        RunOutcome::Completed { events, path } => {
            info!("Done: saved and categorised {} events in {}", events, path.display())
        }
    }

    Ok(())
}

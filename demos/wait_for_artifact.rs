//! Send one prompt to a fresh session and wait for the image, polling with
//! exponential backoff instead of the fixed interval.
//!
//! ```sh
//! cargo run --example wait_for_artifact
//! ```

use std::time::Duration;
use tailor_probe::{ArtifactProbe, Backoff, DesignClient, PollOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let client = DesignClient::new("http://localhost:3000");

    let session = client.create_session("retro sunset stripes").await?;
    println!("Session: {}", session.id);

    let baseline = client.artifacts(&session.id).await?.len();
    client
        .send_message(&session.id, "three orange stripes across the chest", "DemoUser")
        .await?;

    let mut probe = ArtifactProbe::new(&client).with_strategy(Backoff::new(
        Duration::from_millis(500),
        2,
        Duration::from_secs(8),
    ));
    let outcome = probe
        .wait_for_new_artifact(&session.id, baseline, Duration::from_secs(120), |elapsed| {
            println!("  still waiting ({}s)", elapsed.as_secs())
        })
        .await?;

    match outcome {
        PollOutcome::Ready(artifact) => println!("Done! {} at {}", artifact.id, artifact.storage_url),
        PollOutcome::TimedOut => eprintln!("Timed out"),
    }

    Ok(())
}

//! # tailor-probe
//!
//! Smoke-test client for the design service. Creates a session, posts
//! messages, and polls the session's artifact list until the image the
//! messages asked for shows up.
//!
//! The polling core lives in [`poll`]: a deadline-bounded loop over
//! re-fetched state with a swappable [`PollStrategy`]. [`probe`] applies it
//! to "wait until the collection grows past a baseline", and [`scenario`]
//! strings the calls together into the generate-then-modify loop.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tailor_probe::{ArtifactProbe, DesignClient, PollOutcome};
//! use std::time::Duration;
//!
//! # async fn example() -> tailor_probe::Result<()> {
//! let client = DesignClient::new("http://localhost:3000");
//! let session = client.create_session("simple geometric pattern").await?;
//!
//! let baseline = client.artifacts(&session.id).await?.len();
//! client
//!     .send_message(&session.id, "create a simple blue circle on the shirt", "TestUser")
//!     .await?;
//!
//! let mut probe = ArtifactProbe::new(&client);
//! match probe
//!     .wait_for_new_artifact(&session.id, baseline, Duration::from_secs(90), |_| {})
//!     .await?
//! {
//!     PollOutcome::Ready(artifact) => println!("Generated {}", artifact.storage_url),
//!     PollOutcome::TimedOut => eprintln!("No artifact in time"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod poll;
pub mod probe;
pub mod scenario;
pub mod types;

pub use client::DesignClient;
pub use config::ProbeConfig;
pub use console::Console;
pub use error::{ProbeError, Result};
pub use poll::{poll_until, Backoff, FixedInterval, PollOutcome, PollStrategy};
pub use probe::{wait_for_new_item, ArtifactProbe};
pub use scenario::{Lineage, Phase, Scenario, ScenarioFailure, ScenarioReport};
pub use types::{Artifact, Message, MessageRole, Session};

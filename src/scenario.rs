//! End-to-end generation and modification loop.
//!
//! Creates a session, asks for an image, asks for a change to that image,
//! and checks that the second artifact points back at the first.

use std::fmt;
use std::io::Write;

use crate::client::DesignClient;
use crate::config::ProbeConfig;
use crate::console::Console;
use crate::error::Result;
use crate::poll::{FixedInterval, PollOutcome};
use crate::probe::ArtifactProbe;
use crate::types::{Artifact, Message};

/// Which half of the loop a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Generate,
    Modify,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Generate => write!(f, "Initial generation did not complete"),
            Phase::Modify => write!(f, "Modification did not complete"),
        }
    }
}

/// How the modified artifact relates to the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lineage {
    /// `sourceArtifactId` equals the original's id.
    Linked,
    /// `sourceArtifactId` is set but names some other artifact.
    Mismatch { expected: String, actual: String },
    /// `sourceArtifactId` is absent.
    Missing,
}

impl Lineage {
    pub fn between(original: &Artifact, modified: &Artifact) -> Self {
        match &modified.source_artifact_id {
            Some(source) if *source == original.id => Lineage::Linked,
            Some(source) => Lineage::Mismatch {
                expected: original.id.clone(),
                actual: source.clone(),
            },
            None => Lineage::Missing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioFailure {
    /// No new artifact appeared before the deadline.
    Timeout(Phase),
    /// The modified artifact was not linked to the original (strict mode only).
    Lineage(Lineage),
}

/// Everything observed during a run, including partial results on failure.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub session_id: String,
    pub initial: Option<Artifact>,
    pub modified: Option<Artifact>,
    pub lineage: Option<Lineage>,
    /// Warnings about the artifact list that do not fail the run.
    pub ordering_warnings: Vec<String>,
    pub conversation: Vec<Message>,
    pub failure: Option<ScenarioFailure>,
}

impl ScenarioReport {
    fn new(session_id: String) -> Self {
        Self {
            session_id,
            initial: None,
            modified: None,
            lineage: None,
            ordering_warnings: Vec::new(),
            conversation: Vec::new(),
            failure: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Drives the generate-then-modify loop against a live service.
pub struct Scenario<'a> {
    client: &'a DesignClient,
    config: &'a ProbeConfig,
}

impl<'a> Scenario<'a> {
    pub fn new(client: &'a DesignClient, config: &'a ProbeConfig) -> Self {
        Self { client, config }
    }

    /// Run the loop, narrating to `console`.
    ///
    /// Timeouts and lineage problems are reported in the returned
    /// [`ScenarioReport`]. Transport and HTTP errors abort with `Err`.
    pub async fn run<W: Write>(&self, console: &mut Console<W>) -> Result<ScenarioReport> {
        let cfg = self.config;
        console.banner("TESTING IMAGE GENERATION & MODIFICATION LOOP")?;

        console.line(&format!("Creating session with vibe: {}", cfg.vibe_description))?;
        let session = self.client.create_session(&cfg.vibe_description).await?;
        console.ok(&format!("Created session: {}", session.id))?;
        let session_id = session.id;
        let mut report = ScenarioReport::new(session_id.clone());

        console.section("STEP 1: Generate Initial Image")?;
        let baseline = self.client.artifacts(&session_id).await?.len();
        let initial = match self
            .phase(console, &session_id, &cfg.generate_prompt, baseline)
            .await?
        {
            Some(artifact) => artifact,
            None => return self.fail(console, report, Phase::Generate).await,
        };
        console.line(&format!("\n  Initial artifact ID: {}", initial.id))?;
        report.initial = Some(initial.clone());

        console.section("STEP 2: Modify the Image")?;
        tokio::time::sleep(cfg.settle_delay).await;
        let baseline = self.client.artifacts(&session_id).await?.len();
        let modified = match self
            .phase(console, &session_id, &cfg.modify_prompt, baseline)
            .await?
        {
            Some(artifact) => artifact,
            None => return self.fail(console, report, Phase::Modify).await,
        };
        report.modified = Some(modified.clone());

        console.section("RESULTS")?;
        let lineage = Lineage::between(&initial, &modified);
        match &lineage {
            Lineage::Linked => {
                console.pass(&format!("Modification linked to source: {}", initial.id))?;
                console.pass("Source artifact matches the original!")?;
            }
            Lineage::Mismatch { expected, actual } => {
                console.pass(&format!("Modification linked to source: {actual}"))?;
                console.warn(&format!("Source artifact doesn't match original ({expected})"))?;
                tracing::warn!(expected = %expected, actual = %actual, "source artifact mismatch");
            }
            Lineage::Missing => {
                console.warn(
                    "No sourceArtifactId set - modification may not have used source image",
                )?;
                tracing::warn!(artifact_id = %modified.id, "modified artifact has no source");
            }
        }
        if cfg.strict_lineage && lineage != Lineage::Linked {
            report.failure = Some(ScenarioFailure::Lineage(lineage.clone()));
        }
        report.lineage = Some(lineage);

        report.ordering_warnings = self.check_ordering(&session_id, &modified).await?;
        for warning in &report.ordering_warnings {
            console.warn(warning)?;
            tracing::warn!(session_id = %session_id, "{}", warning);
        }

        console.section("SUMMARY")?;
        console.line(&format!("Session ID: {}", session_id))?;
        console.line(&format!("Initial artifact: {}", initial.id))?;
        console.line(&format!("Modified artifact: {}", modified.id))?;
        console.line(&format!(
            "Source linked: {}",
            modified.source_artifact_id.as_deref().unwrap_or("None")
        ))?;

        self.conversation(console, &mut report).await?;

        if let Some(ScenarioFailure::Lineage(_)) = &report.failure {
            console.fail("Modified artifact is not linked to the original")?;
        } else {
            console.footer("TEST COMPLETE")?;
        }
        console.line(&format!("\nView in browser: {}", self.client.design_url(&session_id)))?;
        Ok(report)
    }

    /// Send one prompt and wait for the artifact it should produce.
    async fn phase<W: Write>(
        &self,
        console: &mut Console<W>,
        session_id: &str,
        prompt: &str,
        baseline: usize,
    ) -> Result<Option<Artifact>> {
        console.sending(prompt)?;
        let message = self
            .client
            .send_message(session_id, prompt, &self.config.author_name)
            .await?;
        console.ok(&format!("Message sent: {}", message.id))?;

        let timeout = self.config.artifact_timeout;
        console.waiting_for("new artifact", timeout)?;
        let mut probe = ArtifactProbe::new(self.client)
            .with_strategy(FixedInterval(self.config.poll_interval));
        let outcome = probe
            .wait_for_new_artifact(session_id, baseline, timeout, |elapsed| console.tick(elapsed))
            .await?;

        match outcome {
            PollOutcome::Ready(artifact) => {
                console.artifact(&artifact)?;
                Ok(Some(artifact))
            }
            PollOutcome::TimedOut => {
                console.timed_out("artifact")?;
                Ok(None)
            }
        }
    }

    /// Record a phase timeout, then print what was observed so far.
    async fn fail<W: Write>(
        &self,
        console: &mut Console<W>,
        mut report: ScenarioReport,
        phase: Phase,
    ) -> Result<ScenarioReport> {
        console.fail(&phase.to_string())?;
        report.failure = Some(ScenarioFailure::Timeout(phase));
        self.conversation(console, &mut report).await?;
        console.line(&format!(
            "\nView in browser: {}",
            self.client.design_url(&report.session_id)
        ))?;
        Ok(report)
    }

    async fn conversation<W: Write>(
        &self,
        console: &mut Console<W>,
        report: &mut ScenarioReport,
    ) -> Result<()> {
        console.section("CONVERSATION")?;
        report.conversation = self.client.messages(&report.session_id).await?;
        console.transcript(&report.conversation)?;
        Ok(())
    }

    /// The probe trusts the first list entry to be the newest. Re-list twice
    /// and report if that ordering or the listing itself is unstable.
    async fn check_ordering(&self, session_id: &str, newest: &Artifact) -> Result<Vec<String>> {
        let first = self.client.artifacts(session_id).await?;
        let second = self.client.artifacts(session_id).await?;
        let mut warnings = Vec::new();
        if first != second {
            warnings.push("Artifact listing changed between two reads with no writes".to_string());
        }
        match first.first() {
            Some(head) if head.id == newest.id => {}
            Some(head) => warnings.push(format!(
                "Artifact list is not newest first: expected {} at the head, found {}",
                newest.id, head.id
            )),
            None => warnings.push("Artifact list is empty after modification".to_string()),
        }
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(id: &str, source: Option<&str>) -> Artifact {
        Artifact {
            id: id.into(),
            kind: "image".into(),
            storage_url: format!("https://cdn/{id}.png"),
            source_artifact_id: source.map(String::from),
        }
    }

    #[test]
    fn test_lineage_linked() {
        let a1 = artifact("a1", None);
        let a2 = artifact("a2", Some("a1"));
        assert_eq!(Lineage::between(&a1, &a2), Lineage::Linked);
    }

    #[test]
    fn test_lineage_mismatch_and_missing() {
        let a1 = artifact("a1", None);
        assert_eq!(
            Lineage::between(&a1, &artifact("a2", Some("a0"))),
            Lineage::Mismatch {
                expected: "a1".into(),
                actual: "a0".into()
            }
        );
        assert_eq!(Lineage::between(&a1, &artifact("a2", None)), Lineage::Missing);
    }

    #[test]
    fn test_phase_messages() {
        assert_eq!(Phase::Generate.to_string(), "Initial generation did not complete");
        assert_eq!(Phase::Modify.to_string(), "Modification did not complete");
    }

    #[test]
    fn test_report_passed() {
        let mut report = ScenarioReport::new("s".into());
        assert!(report.passed());
        report.failure = Some(ScenarioFailure::Timeout(Phase::Modify));
        assert!(!report.passed());
    }
}

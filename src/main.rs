use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use tailor_probe::config::DEFAULT_BASE_URL;
use tailor_probe::{
    ArtifactProbe, Console, DesignClient, FixedInterval, PollOutcome, ProbeConfig, ProbeError,
    Scenario,
};

#[derive(Parser)]
#[command(name = "tailor-probe")]
#[command(about = "Smoke-test the design service's image generation loop", long_about = None)]
#[command(version)]
struct Cli {
    /// Base address of the design service
    #[arg(long, global = true, env = "TAILOR_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    request_timeout: u64,

    /// Log debug diagnostics to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full generate-then-modify loop (default)
    Run(RunArgs),

    /// List a session's artifacts, newest first
    Artifacts {
        /// Session ID
        session_id: String,
    },

    /// Print a session's conversation
    Messages {
        /// Session ID
        session_id: String,
    },

    /// Wait for a new artifact to appear in an existing session
    Wait {
        /// Session ID
        session_id: String,

        /// Known artifact count (defaults to the current count)
        #[arg(short, long)]
        baseline: Option<usize>,

        /// Seconds to wait before giving up
        #[arg(short, long, default_value_t = 120, value_parser = positive_secs())]
        timeout: u64,

        /// Seconds between polls
        #[arg(long, default_value_t = 2, value_parser = positive_secs())]
        poll_interval: u64,
    },
}

/// Timeouts and intervals are whole seconds and never zero.
fn positive_secs() -> clap::builder::RangedU64ValueParser<u64> {
    clap::value_parser!(u64).range(1..)
}

#[derive(Args, Default)]
struct RunArgs {
    /// Seconds to wait for each artifact
    #[arg(short, long, value_parser = positive_secs())]
    timeout: Option<u64>,

    /// Seconds between polls
    #[arg(long, value_parser = positive_secs())]
    poll_interval: Option<u64>,

    /// Author name attached to messages
    #[arg(long)]
    author: Option<String>,

    /// Description for the new session
    #[arg(long)]
    vibe: Option<String>,

    /// Message that should produce the first image
    #[arg(long)]
    generate_prompt: Option<String>,

    /// Message that should modify the first image
    #[arg(long)]
    modify_prompt: Option<String>,

    /// Fail when the modified image is not linked to the original
    #[arg(long)]
    strict_lineage: bool,
}

impl RunArgs {
    fn into_config(self, base_url: String, request_timeout: Duration) -> ProbeConfig {
        let mut builder = ProbeConfig::builder()
            .with_base_url(base_url)
            .with_request_timeout(request_timeout)
            .with_strict_lineage(self.strict_lineage);
        if let Some(secs) = self.timeout {
            builder = builder.with_artifact_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.poll_interval {
            builder = builder.with_poll_interval(Duration::from_secs(secs));
        }
        if let Some(author) = self.author {
            builder = builder.with_author_name(author);
        }
        if let Some(vibe) = self.vibe {
            builder = builder.with_vibe_description(vibe);
        }
        if let Some(prompt) = self.generate_prompt {
            builder = builder.with_generate_prompt(prompt);
        }
        if let Some(prompt) = self.modify_prompt {
            builder = builder.with_modify_prompt(prompt);
        }
        builder.build()
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "tailor_probe=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let base_url = cli.base_url.clone();

    let mut console = Console::stdout();
    let result = run(cli, &mut console).await;
    ExitCode::from(finish(&mut console, result, &base_url))
}

/// Report how the command ended and pick the process exit status:
/// 0 when it passed, 1 for a failed check or any error.
fn finish<W: Write>(console: &mut Console<W>, result: Result<bool>, base_url: &str) -> u8 {
    let e = match result {
        Ok(true) => return 0,
        Ok(false) => return 1,
        Err(e) => e,
    };
    let printed = match e.downcast_ref::<ProbeError>() {
        Some(err) if err.is_connect() => console.unreachable(base_url),
        _ => {
            eprintln!("{:?}", e);
            console.error(&format!("{:#}", e))
        }
    };
    if let Err(io) = printed {
        eprintln!("{}: {}", e, io);
    }
    1
}

/// Returns whether the command passed.
async fn run<W: Write>(cli: Cli, console: &mut Console<W>) -> Result<bool> {
    let request_timeout = Duration::from_secs(cli.request_timeout);

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let config = args.into_config(cli.base_url, request_timeout);
            config.validate()?;
            let client = DesignClient::new(&config.base_url).with_request_timeout(request_timeout);
            let report = Scenario::new(&client, &config).run(console).await?;
            Ok(report.passed())
        }
        Commands::Artifacts { session_id } => {
            let client = DesignClient::new(cli.base_url).with_request_timeout(request_timeout);
            let artifacts = client
                .artifacts(&session_id)
                .await
                .with_context(|| format!("listing artifacts for session {}", session_id))?;
            for artifact in &artifacts {
                console.artifact_row(artifact)?;
            }
            Ok(true)
        }
        Commands::Messages { session_id } => {
            let client = DesignClient::new(cli.base_url).with_request_timeout(request_timeout);
            let messages = client
                .messages(&session_id)
                .await
                .with_context(|| format!("listing messages for session {}", session_id))?;
            console.transcript(&messages)?;
            Ok(true)
        }
        Commands::Wait {
            session_id,
            baseline,
            timeout,
            poll_interval,
        } => {
            let timeout = Duration::from_secs(timeout);
            let client = DesignClient::new(cli.base_url).with_request_timeout(request_timeout);
            let baseline = match baseline {
                Some(n) => n,
                None => client.artifacts(&session_id).await?.len(),
            };
            console.waiting_for("new artifact", timeout)?;
            let mut probe = ArtifactProbe::new(&client)
                .with_strategy(FixedInterval(Duration::from_secs(poll_interval)));
            let outcome = probe
                .wait_for_new_artifact(&session_id, baseline, timeout, |e| console.tick(e))
                .await?;
            match outcome {
                PollOutcome::Ready(artifact) => {
                    console.artifact(&artifact)?;
                    Ok(true)
                }
                PollOutcome::TimedOut => {
                    console.timed_out("artifact")?;
                    Ok(false)
                }
            }
        }
    }
}

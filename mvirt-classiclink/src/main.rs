//! mvirt-classiclink: drive one VPC ClassicLink through its lifecycle.
//!
//! Runs a single create, read, update or delete against the control-plane API
//! and prints the resulting record as JSON.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mvirt_classiclink::{
    ClassicLinkApi, ClassicLinkReconciler, ClientConfig, DesiredState, HttpClient, Reconciler,
};

/// mvirt ClassicLink controller
#[derive(Parser, Debug)]
#[command(name = "mvirt-classiclink", version, about)]
struct Cli {
    #[command(flatten)]
    client: ClientConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Link an instance to a VPC
    Create(LinkArgs),
    /// Refresh a link from the control plane
    Read(LinkArgs),
    /// Move a link to a new VPC or security group set
    Update {
        #[command(flatten)]
        link: LinkArgs,

        /// VPC the link currently points to
        #[arg(long)]
        previous_network_id: String,

        /// Security groups the link currently has (repeatable)
        #[arg(long = "previous-security-group-id")]
        previous_security_group_ids: Vec<String>,
    },
    /// Unlink an instance from a VPC
    Delete(LinkArgs),
}

#[derive(Args, Debug)]
struct LinkArgs {
    /// Instance ID
    #[arg(long)]
    instance_id: String,

    /// VPC ID
    #[arg(long)]
    network_id: String,

    /// Security group ID (repeatable)
    #[arg(long = "security-group-id")]
    security_group_ids: Vec<String>,

    /// Identity of an existing link (<instance_id>/<vpc_id>)
    #[arg(long, default_value = "")]
    identity: String,
}

impl LinkArgs {
    fn state(&self) -> DesiredState {
        let mut state = DesiredState::new(
            self.instance_id.clone(),
            self.network_id.clone(),
            self.security_group_ids.iter().cloned(),
        );
        state.identity = self.identity.clone();
        state
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mvirt_classiclink=info,reqwest=warn,hyper=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    info!("Control-plane endpoint: {}", cli.client.endpoint);

    let api: Arc<dyn ClassicLinkApi> =
        Arc::new(HttpClient::new(&cli.client).context("Invalid client configuration")?);
    let reconciler = ClassicLinkReconciler::new(api);

    let state = match run(&reconciler, cli.command).await {
        Ok(state) => state,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

async fn run(
    reconciler: &ClassicLinkReconciler<dyn ClassicLinkApi>,
    command: Command,
) -> Result<DesiredState> {
    match command {
        Command::Create(link) => {
            let mut state = link.state();
            reconciler
                .create(&mut state)
                .await
                .context("Create failed")?;
            Ok(state)
        }
        Command::Read(link) => {
            let mut state = link.state();
            reconciler.read(&mut state).await.context("Read failed")?;
            Ok(state)
        }
        Command::Update {
            link,
            previous_network_id,
            previous_security_group_ids,
        } => {
            let mut state = link.state();
            let mut previous = DesiredState::new(
                state.instance_id.clone(),
                previous_network_id,
                previous_security_group_ids,
            );
            previous.identity = state.identity.clone();

            reconciler
                .update(&previous, &mut state)
                .await
                .context("Update failed")?;
            Ok(state)
        }
        Command::Delete(link) => {
            let mut state = link.state();
            reconciler
                .delete(&mut state)
                .await
                .context("Delete failed")?;
            Ok(state)
        }
    }
}

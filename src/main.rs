use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use onprem_context::{
    kubernetes::KubernetesYamlGenerator, ClusterBuilder, ContextSource, ContextSourceConfig,
    OnPremContextSource,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "onprem-context", about = "Stage build contexts in MinIO and build images with kaniko")]
struct Cli {
    /// Bucket to stage contexts in (overrides CONTEXT_BUCKET)
    #[arg(long, global = true)]
    bucket: Option<String>,

    /// Namespace for builder pods (overrides BUILD_NAMESPACE)
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Secret holding registry credentials (overrides REGISTRY_CREDS_SECRET)
    #[arg(long, global = true)]
    registry_creds: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a build-context archive and print its store URL
    Upload {
        archive: PathBuf,
    },
    /// Upload the context and print the builder pod manifest
    Render {
        #[command(flatten)]
        target: BuildTarget,
        /// Print only the pod spec instead of a full Pod manifest
        #[arg(long)]
        spec_only: bool,
    },
    /// Upload the context and run the builder pod to completion
    Build {
        #[command(flatten)]
        target: BuildTarget,
        /// Keep the builder pod after it finishes
        #[arg(long)]
        keep_pod: bool,
    },
}

#[derive(Args)]
struct BuildTarget {
    archive: PathBuf,
    /// Destination image reference
    #[arg(long)]
    image: String,
    /// Build without pushing the image
    #[arg(long)]
    no_push: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = ContextSourceConfig::init()?;
    if let Some(bucket) = cli.bucket {
        config.bucket = Some(bucket);
    }
    if let Some(namespace) = cli.namespace {
        config.namespace = namespace;
    }
    if let Some(secret) = cli.registry_creds {
        config.registry_creds = Some(secret);
    }
    config.validate()?;

    let mut source = OnPremContextSource::from_config(&config)?;

    match cli.command {
        Command::Upload { archive } => {
            let uploaded = source.prepare(&archive).await?;
            println!("{}", uploaded.url);
            println!("{}", uploaded.context_name);
        }
        Command::Render { target, spec_only } => {
            if spec_only {
                source.prepare(&target.archive).await?;
                let spec = source.generate_pod_spec(&target.image, !target.no_push);
                print!("{}", KubernetesYamlGenerator::generate_pod_spec_yaml(&spec)?);
            } else {
                let mut builder = ClusterBuilder::new(source, &config);
                let yaml = builder
                    .render(&target.archive, &target.image, !target.no_push)
                    .await?;
                print!("{}", yaml);
            }
        }
        Command::Build { target, keep_pod } => {
            let mut builder = ClusterBuilder::new(source, &config).keep_pod(keep_pod);
            let outcome = builder
                .build(&target.archive, &target.image, !target.no_push)
                .await?;
            print!("{}", outcome.logs);
            info!("🏁 Built {} in pod {}", outcome.image, outcome.pod_name);
        }
    }

    Ok(())
}

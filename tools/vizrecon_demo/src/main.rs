use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use vizrecon::{
    parser, BumpChartPolicy, EngineConfig, LineGraphPolicy, QueryEngine, QueryOutcome, Reconciler,
    Reconciliation, ResultSpec, Selections, StandardPolicy, VisualizationPolicy, VisualizationType,
};

mod report;
mod session;

use report::{print_json, print_report, StepReport};
use session::{load_backend, load_session, FixtureTransport, Step};

#[derive(Parser)]
#[command(name = "vizrecon-demo")]
#[command(about = "Replay dashboard sessions through the query result reconciler")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a session script against a fixture backend
    Run {
        /// Session script (YAML)
        #[arg(long, default_value = "fixtures/session.yaml")]
        session: PathBuf,

        /// Fixture backend responses (YAML)
        #[arg(long, default_value = "fixtures/backend.yaml")]
        backend: PathBuf,

        /// Engine configuration (YAML); defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the session's visualization type
        #[arg(long)]
        viz: Option<VisualizationType>,

        /// Emit reports as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate an engine configuration and print the resolved endpoints
    CheckConfig {
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Run { session, backend, config, viz, json } => {
            handle_run(session, backend, config, viz, json).await
        }
        Commands::CheckConfig { config } => handle_check_config(config),
    }
}

async fn handle_run(
    session_path: PathBuf,
    backend_path: PathBuf,
    config_path: Option<PathBuf>,
    viz: Option<VisualizationType>,
    json: bool,
) -> anyhow::Result<()> {
    let session = load_session(&session_path)?;
    let backend = load_backend(&backend_path)?;
    let config = match config_path {
        Some(path) => parser::parse_config_file(path)?,
        None => EngineConfig::default(),
    };
    let viz = viz.unwrap_or(session.visualization);

    let transport = Arc::new(FixtureTransport::new(backend));
    let cache = config.build_cache();
    let engine = config.query_engine(viz, transport, cache.as_ref());
    tracing::info!(visualization = %viz, endpoint = %config.endpoint(viz), "replaying session");

    let reports = match viz {
        VisualizationType::LineGraph => replay(LineGraphPolicy, engine, &session.steps).await?,
        VisualizationType::BumpChart => replay(BumpChartPolicy, engine, &session.steps).await?,
        other => replay(StandardPolicy::new(other), engine, &session.steps).await?,
    };

    if json {
        print_json(&reports)?;
    } else {
        reports.iter().for_each(print_report);
    }
    Ok(())
}

async fn replay<P>(
    policy: P,
    engine: Arc<dyn QueryEngine>,
    steps: &[Step],
) -> anyhow::Result<Vec<StepReport>>
where
    P: VisualizationPolicy,
    P::Data: Serialize,
{
    let reconciler = Reconciler::new(policy, engine);
    let mut selections = Selections::default();
    let mut result_spec = ResultSpec::default();
    let mut background = Vec::new();
    let mut reports = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        let step_no = index + 1;
        if step.retry {
            let Some(task) = reconciler.retry() else {
                anyhow::bail!("step {}: nothing to retry yet", step_no);
            };
            let snapshot = match task.run().await {
                QueryOutcome::Applied(s) | QueryOutcome::Failed(s) => s,
                QueryOutcome::Superseded => reconciler.snapshot(),
            };
            reports.push(StepReport::new(step_no, step.label.clone(), "retry", &snapshot));
            continue;
        }

        if let Some(next) = &step.selections {
            selections = next.clone();
        }
        if let Some(next) = &step.result_spec {
            result_spec = next.clone();
        }

        let report = match reconciler.update(selections.clone(), result_spec.clone()) {
            Reconciliation::Unchanged(snapshot) => {
                StepReport::new(step_no, step.label.clone(), "unchanged", &snapshot)
            }
            Reconciliation::Rebuilt(snapshot) => {
                StepReport::new(step_no, step.label.clone(), "rebuild", &snapshot)
            }
            Reconciliation::Query(task) if step.wait => {
                let snapshot = match task.run().await {
                    QueryOutcome::Applied(s) | QueryOutcome::Failed(s) => s,
                    QueryOutcome::Superseded => reconciler.snapshot(),
                };
                StepReport::new(step_no, step.label.clone(), "query", &snapshot)
            }
            Reconciliation::Query(task) => {
                let generation = task.generation();
                background.push((generation, tokio::spawn(task.run())));
                StepReport::new(step_no, step.label.clone(), "query", &reconciler.snapshot())
            }
        };
        reports.push(report);
    }

    for (generation, handle) in background {
        if let QueryOutcome::Superseded = handle.await? {
            tracing::info!(generation, "background query was superseded");
        }
    }
    let settled = reconciler.snapshot();
    reports.push(StepReport::new(steps.len() + 1, Some("final".into()), "settled", &settled));
    Ok(reports)
}

fn handle_check_config(path: PathBuf) -> anyhow::Result<()> {
    let config = parser::parse_config_file(&path)?;
    println!("Configuration '{}' is valid", path.display());
    for viz in VisualizationType::ALL {
        println!("  {:<14} -> {}", viz.to_string(), config.endpoint(viz));
    }
    if config.cache.enabled {
        println!("  cache: {} entries", config.cache.capacity);
    } else {
        println!("  cache: disabled");
    }
    Ok(())
}

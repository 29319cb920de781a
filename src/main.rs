use anyhow;
use chrono;
use clap::{Parser, Subcommand};
use env_logger::fmt::Formatter;
use irisserve::config::{default_model_path, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use irisserve::model::artifact::ModelArtifact;
use irisserve::model::inference::predict_features;
use irisserve::serve::run_server;
use log::{info, Record};
use std::io::Write;
use std::path::PathBuf;

/// Serve predictions of a pre-trained Iris classifier
#[derive(Parser, Debug)]
#[command(
    name = "irisserve",
    version,
    about = "Serve class predictions of a pre-trained model over HTTP",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// serve the model over a web API
    Serve {
        /// path to the model artifact.
        /// Defaults to $IRISSERVE_MODEL, then models/gaussnb_iris.json
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// host to listen to
        #[arg(short('H'), long, default_value = DEFAULT_HOST)]
        host: String,

        /// port to listen to
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// number of HTTP worker threads
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// predict a single feature vector and print the result as JSON
    Predict {
        /// path to the model artifact
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// feature values, e.g. 5.1 3.5 1.4 0.2
        #[arg(required = true, num_args = 1.., allow_negative_numbers = true)]
        features: Vec<f64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .format(|buf: &mut Formatter, record: &Record| {
            writeln!(
                buf,
                "[{} {}] {}",
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                record.level(),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve {
            model,
            host,
            port,
            workers,
        } => {
            let model_path = model.clone().unwrap_or_else(default_model_path);
            info!("Loading model artifact from {}", model_path.display());
            let artifact = ModelArtifact::load(&model_path).await?;

            let config = ServerConfig {
                host: host.to_string(),
                port: port.to_owned(),
                workers: workers.to_owned(),
            };
            run_server(config, artifact).await?;
        }

        Commands::Predict { model, features } => {
            let model_path = model.clone().unwrap_or_else(default_model_path);
            let artifact = ModelArtifact::load(&model_path).await?;

            let response = predict_features(&artifact, features).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{Level, event};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use sygus_unif::config::UnifConfig;
use sygus_unif::config::candidate::{CandidateConfig, PointConfig};
use sygus_unif::term::Value;

#[derive(Debug, Clone, Subcommand)]
pub enum UnifCommands {
    /// Write a sample problem
    New { config: Option<PathBuf> },
    /// Build solutions for the problem in a config file
    Solve { config: PathBuf },
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct UnifArguments {
    #[command(subcommand)]
    command: UnifCommands,
}

fn main() -> anyhow::Result<()> {
    let args = UnifArguments::parse();
    match args.command {
        UnifCommands::New { config } => new(config.unwrap_or(PathBuf::from("./sygus-unif.toml"))),
        UnifCommands::Solve { config } => solve(config),
    }
}

fn new(path: PathBuf) -> anyhow::Result<()> {
    let point = |x: i64, y: i64, output: &str| PointConfig {
        args: vec![Value::Int(x), Value::Int(y)],
        output: output.to_string(),
    };
    let config = UnifConfig {
        meta: Default::default(),
        unification: Default::default(),
        candidates: vec![CandidateConfig {
            name: "max".to_string(),
            root: "max_e".to_string(),
            condition: Some("max_c".to_string()),
            template: None,
            guard: None,
            default: None,
            conditions: vec!["(>= x0 x1)".to_string()],
            points: vec![point(1, 2, "x1"), point(5, 3, "x0"), point(4, 4, "x0")],
        }],
    };
    fs::write(path, config.to_toml()?)?;
    Ok(())
}

fn solve(path: PathBuf) -> anyhow::Result<()> {
    let config = UnifConfig::from_path(path)?;
    let level = config.meta.level()?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .from_env()?
        .add_directive(format!("sygus_unif={level}").parse()?);
    let indicatif_layer = IndicatifLayer::new();
    let writer = indicatif_layer.get_stderr_writer();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(indicatif_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();
    match config.solve() {
        Ok(synthesis) => {
            for (candidate, solution) in &synthesis.solutions {
                event!(Level::INFO, "{candidate} := {solution}");
                println!("(define-fun {candidate} {solution})");
            }
            if synthesis.complete {
                event!(Level::INFO, "Unification successful :)");
            } else {
                event!(Level::WARN, "Unification needs refinement");
            }
            for lemma in &synthesis.lemmas {
                println!("(assert {lemma})");
            }
        }
        Err(e) => {
            event!(Level::ERROR, "Unification error: {}", e)
        }
    }
    Ok(())
}

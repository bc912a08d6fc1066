use anyhow::{Context, Result};
use clap::Parser;
use riskforest::cli::{Cli, OutputFormat};
use riskforest::dataset::PopulationDataset;
use riskforest::report::{self, RiskReport};
use riskforest::{input, pipeline};
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Prompt on stdin for one applicant and score it against the fitted model
fn score_applicant(model: &pipeline::FittedModel, prompt: &mut dyn Write) -> Result<f64> {
    let stdin = io::stdin();
    let record = input::collect_record(&mut stdin.lock(), prompt)
        .context("Failed to read applicant details")?;
    model
        .score_one(&record)
        .context("Failed to score applicant")
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = args
        .pipeline_config()
        .context("Invalid pipeline configuration")?;

    let population = PopulationDataset::from_path(&args.population).with_context(|| {
        format!(
            "Failed to load population from {}",
            args.population.display()
        )
    })?;

    let model = pipeline::fit_all(population.records(), &config)
        .context("Failed to fit risk model")?;
    let scores = pipeline::score_all(population.records(), &model)?;

    let scored = report::scored_records(population.ids(), &scores);
    let shown = match args.head {
        0 => &scored[..],
        n => &scored[..n.min(scored.len())],
    };

    match args.format {
        OutputFormat::Text => {
            print!("{}", report::format_population(shown));
            if !args.no_prompt {
                let risk = score_applicant(&model, &mut io::stdout())?;
                print!("{}", report::format_query(risk));
            }
        }
        OutputFormat::Json => {
            // Keep stdout valid JSON: prompts go to stderr
            let query_risk_score = if args.no_prompt {
                None
            } else {
                Some(score_applicant(&model, &mut io::stderr())?)
            };

            let output = RiskReport {
                population_size: model.population_size(),
                num_trees: model.forest().num_trees(),
                raw_score_range: model.range(),
                population: shown.to_vec(),
                query_risk_score,
            };
            println!("{}", output.to_json()?);
        }
    }

    Ok(())
}

use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info, warn};

use pricecurve::benchmark::BenchmarkTable;
use pricecurve::config::PricingConfig;
use pricecurve::csv::{read_benchmarks, CsvReader, CsvWriter};
use pricecurve::curve::{AnchorPolicy, PricingModel};
use pricecurve::file::{ReadJsonFile, WriteJsonFile};
use pricecurve::fit::{fit, InitialGuess, OffsetMode};
use pricecurve::linear::regression::RegressionModel;
use pricecurve::print;
use pricecurve::resolve::{PolicyKind, Resolution};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// number of apps to price (defaults to the configured query)
    query: Option<f64>,

    /// JSON file to source the pricing config from
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// CSV file of `input,price` benchmarks, replacing the configured ones
    #[clap(short = 'b', long)]
    benchmarks: Option<PathBuf>,

    /// resolution policy: direct, step or nearest
    #[clap(short = 'p', long)]
    policy: Option<PolicyKind>,

    /// anchor policy: disabled, minimum-input or any-benchmark
    #[clap(short = 'a', long)]
    anchor: Option<AnchorPolicy>,

    /// seed the fit from a linear regression on ln(x + c)
    #[clap(long = "regression-seed")]
    regression_seed: bool,

    /// add to the query before pricing, staying within the configured bounds
    #[clap(long)]
    nudge: Option<f64>,

    /// fit the offset c rather than holding it fixed
    #[clap(long = "free-offset")]
    free_offset: bool,

    /// write curve samples to a CSV file for plotting
    #[clap(long = "samples-csv")]
    samples_csv: Option<PathBuf>,

    /// number of curve samples to write
    #[clap(long)]
    samples: Option<usize>,

    /// write the effective config to a JSON file
    #[clap(long = "dump-config")]
    dump_config: Option<PathBuf>,

    /// currency label for displayed prices
    #[clap(long, default_value = "Eur")]
    currency: String,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if let Some(query) = self.query {
            if !query.is_finite() {
                bail!("query must be finite");
            }
        }
        if let Some(nudge) = self.nudge {
            if !nudge.is_finite() {
                bail!("nudge must be finite");
            }
        }
        if self.samples.is_some() && self.samples_csv.is_none() {
            bail!("--samples requires --samples-csv");
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let config = read_config(&args)?;
    debug!("config: {config:?}");
    if let Some(path) = &args.dump_config {
        config.write_json_file(path)?;
        info!("wrote config to {}", path.display());
    }

    let outcome = fit(&config.benchmarks, &config.fit)?;
    info!(
        "fitted f(x) = {:.4} + {:.4}·ln(x + {:.4}) in {} steps, RMSE: {:.1}",
        outcome.params.a,
        outcome.params.b,
        outcome.params.c,
        outcome.steps,
        outcome.rmse(config.benchmarks.len())
    );
    if config.fit.init == InitialGuess::Regression {
        match RegressionModel::fit(&config.benchmarks, outcome.params.c) {
            Ok(regression) => info!(
                "regression seed:\n{}",
                Console::default().render(&regression.tabulate())
            ),
            Err(err) => warn!("regression seed unavailable: {err}"),
        }
    }

    let model = PricingModel::new(outcome.params, &config.benchmarks, config.anchor);
    info!(
        "benchmarks:\n{}",
        Console::default().render(&print::tabulate_benchmarks(&config.benchmarks, &model))
    );

    let query = config
        .bounds
        .nudge(args.query.unwrap_or(config.query), args.nudge.unwrap_or_default());
    let policy = config.policy(config.policy);
    let resolution = policy.resolve(query, &config.benchmarks, &model)?;
    info!(
        "{} pricing:\n{}",
        policy.kind(),
        Console::default().render(&print::tabulate_resolution(&resolution, &args.currency))
    );

    if let Some(path) = &args.samples_csv {
        write_samples(path, &config, &model, &resolution)?;
        info!("wrote {} curve samples to {}", config.samples, path.display());
    }
    Ok(())
}

fn read_config(args: &Args) -> anyhow::Result<PricingConfig> {
    let mut config = match &args.config {
        None => PricingConfig::default(),
        Some(path) => {
            debug!("reading config from {}", path.display());
            PricingConfig::read_json_file(path)?
        }
    };
    if let Some(path) = &args.benchmarks {
        debug!("reading benchmarks from {}", path.display());
        let points = read_benchmarks(CsvReader::open(path)?)?;
        config.benchmarks = BenchmarkTable::try_from(points)?;
    }
    if let Some(policy) = args.policy {
        config.policy = policy;
    }
    if let Some(anchor) = args.anchor {
        config.anchor = anchor;
    }
    if args.free_offset {
        config.fit.offset = OffsetMode::free();
    }
    if args.regression_seed {
        config.fit.init = InitialGuess::Regression;
    }
    if let Some(samples) = args.samples {
        config.samples = samples;
    }
    config.validate()?;
    Ok(config)
}

fn write_samples(
    path: &Path,
    config: &PricingConfig,
    model: &PricingModel,
    resolution: &Resolution,
) -> Result<(), Box<dyn Error>> {
    let to = config
        .benchmarks
        .max_input()
        .unwrap_or(config.bounds.max)
        .max(resolution.adjusted);
    let samples = model.params().sample(config.bounds.min, to, config.samples)?;

    let mut csv = CsvWriter::create(path)?;
    csv.append(["series", "input", "price"])?;
    for (input, price) in samples {
        csv.append(["curve".to_string(), input.to_string(), price.to_string()])?;
    }
    for point in config.benchmarks.iter() {
        csv.append([
            "benchmark".to_string(),
            point.input.to_string(),
            point.price.to_string(),
        ])?;
    }
    csv.append([
        "quote".to_string(),
        resolution.adjusted.to_string(),
        resolution.price.to_string(),
    ])?;
    csv.flush()?;
    Ok(())
}

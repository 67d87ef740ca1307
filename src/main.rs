use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use oligopoly::control::{RiccatiConfig, RiccatiMethod};
use oligopoly::data::{read_parameters_from_path, write_market_path_to_file};
use oligopoly::policy::cache::PolicyCache;
use oligopoly::policy::experimental::{recursive_representation, RecursivePolicy};
use oligopoly::policy::{simulate_market, DominantFirmPolicy, InitialState, MarketObservation};
use oligopoly::utils::plot::plot_market;
use oligopoly::Parameters;

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Doubling,
    FixedPoint,
}

#[derive(Parser)]
#[command(name = "oligopoly")]
#[command(version)]
#[command(about = "Optimal decision rule of a dominant firm facing a competitive fringe")]
struct Cli {
    /// CSV file of parameter vectors (header a0,a1,rho,c_eps,c,d,e,g,h,beta).
    /// Without it the reference parameters are solved.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Initial demand shock
    #[arg(long, default_value_t = 0.0)]
    eta0: f64,

    /// Initial output of the dominant firm
    #[arg(long, default_value_t = 0.0)]
    leader_output: f64,

    /// Initial aggregate output of the fringe
    #[arg(long, default_value_t = 0.0)]
    fringe_output: f64,

    #[arg(long, value_enum, default_value_t = Method::Doubling)]
    method: Method,

    #[arg(long, default_value_t = 1e-10)]
    tolerance: f64,

    #[arg(long, default_value_t = 500)]
    max_iter: usize,

    /// Reject parameters outside the model's domain instead of warning
    #[arg(long)]
    strict: bool,

    /// Also print the experimental recursive form of the rule
    #[arg(long)]
    experimental: bool,

    /// Number of periods to simulate
    #[arg(long)]
    simulate: Option<usize>,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write the simulated path as CSV
    #[arg(long, requires = "simulate")]
    csv: Option<PathBuf>,

    /// Plot the simulated path (PNG)
    #[arg(long, requires = "simulate")]
    plot: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")
}

struct Solved {
    params: Parameters,
    policy: DominantFirmPolicy,
    recursive: Option<RecursivePolicy>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    let rows = match &cli.params {
        Some(path) => read_parameters_from_path(path)
            .with_context(|| format!("Failed to read parameters from {path:?}"))?,
        None => vec![Parameters::default()],
    };
    if rows.is_empty() {
        bail!("no parameter rows to solve");
    }
    if cli.simulate.is_some() && rows.len() > 1 {
        bail!("--simulate needs a single parameter vector, got {}", rows.len());
    }

    let config = RiccatiConfig {
        method: match cli.method {
            Method::Doubling => RiccatiMethod::Doubling,
            Method::FixedPoint => RiccatiMethod::FixedPoint,
        },
        tolerance: cli.tolerance,
        max_iter: cli.max_iter,
    };
    let initial = InitialState {
        eta0: cli.eta0,
        leader_output: cli.leader_output,
        fringe_output: cli.fringe_output,
    };

    // everything is solved before anything is printed
    let mut cache = PolicyCache::new(config);
    let mut solved = Vec::with_capacity(rows.len());
    for (i, params) in rows.iter().enumerate() {
        if let Err(e) = params.validate() {
            if cli.strict {
                return Err(e).with_context(|| format!("parameter row {i}"));
            }
            warn!("parameter row {i}: {e}");
        }
        let policy = *cache
            .get_or_solve(params, &initial)
            .with_context(|| format!("Failed to solve parameter row {i}"))?;
        let recursive = if cli.experimental {
            Some(recursive_representation(&policy).with_context(|| {
                format!("Failed to derive the recursive rule for row {i}")
            })?)
        } else {
            None
        };
        solved.push(Solved {
            params: *params,
            policy,
            recursive,
        });
    }
    info!(
        "solved {} parameter vectors ({} cached)",
        solved.len(),
        cache.hits()
    );

    let path: Option<Vec<MarketObservation>> = cli.simulate.map(|steps| {
        let mut rng = StdRng::seed_from_u64(cli.seed);
        simulate_market(&solved[0].policy, &solved[0].params, steps, &mut rng)
    });

    report(&cli, &solved, path.as_deref(), &mut std::io::stdout().lock())
}

/// Writes the requested files, then prints the policies and, without output
/// files, the simulated path. Nothing is printed when a file cannot be written.
fn report(
    cli: &Cli,
    solved: &[Solved],
    path: Option<&[MarketObservation]>,
    out: &mut impl Write,
) -> Result<()> {
    if let Some(path) = path {
        if let Some(filename) = &cli.csv {
            write_market_path_to_file(filename, path)
                .with_context(|| format!("Failed to write {filename:?}"))?;
            info!("simulated path written to {filename:?}");
        }
        if let Some(filename) = &cli.plot {
            plot_market(filename, path).with_context(|| format!("Failed to plot {filename:?}"))?;
            info!("plot written to {filename:?}");
        }
    }

    for (i, s) in solved.iter().enumerate() {
        if solved.len() > 1 {
            writeln!(out, "# row {i}: {:?}", s.params.to_array())?;
        }
        writeln!(out, "P = {}", s.policy.p)?;
        writeln!(out, "F = {}", s.policy.f)?;
        writeln!(out, "D0 = {}", s.policy.observable.d0)?;
        if let Some(r) = &s.recursive {
            writeln!(out, "experimental: u_t = rho_u u_(t-1) + gamma1 z_t + gamma2 z_(t-1)")?;
            writeln!(out, "rho_u = {}", r.rho_u)?;
            writeln!(out, "gamma1 = {}", r.gamma1)?;
            writeln!(out, "gamma2 = {}", r.gamma2)?;
        }
    }

    if let Some(path) = path {
        if cli.csv.is_none() && cli.plot.is_none() {
            for o in path {
                writeln!(
                    out,
                    "{} {:.4} {:.4} {:.4} {:.4}",
                    o.period, o.demand_shock, o.leader_output, o.fringe_output, o.price
                )?;
            }
        }
    }
    Ok(())
}

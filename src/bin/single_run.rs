// Evolve a single temperature and print the magnetisation history
use clap::Parser;
use mobile_ising::export::stride;
use mobile_ising::utils::rng::run_rng;
use mobile_ising::{evolve, SimConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
struct Cli {
    /// Temperature
    #[arg(long, short, default_value = "1.0")]
    temperature: f64,

    /// Number of sites
    #[arg(long, short = 'n', default_value = "400")]
    sites: usize,

    #[arg(long, default_value = "0.5")]
    iter_mode: f64,

    #[arg(long, default_value = "500")]
    rounds: usize,

    #[arg(long, default_value = "10")]
    ther_rounds: usize,

    #[arg(long, default_value = "42")]
    seed: u64,

    /// Rows to print
    #[arg(long, default_value = "25")]
    rows: usize,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mobile_ising=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let cfg = SimConfig {
        t_min: cli.temperature,
        t_max: cli.temperature,
        t_steps: 0,
        site_count: cli.sites,
        iter_mode: cli.iter_mode,
        max_rounds: cli.rounds,
        ther_rounds: cli.ther_rounds,
        seed: Some(cli.seed),
        ..SimConfig::default()
    };

    let initializer = match cfg.validate().and_then(|_| cfg.initializer()) {
        Ok(init) => init,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    let mut rng = run_rng(cli.seed, 0);
    let initial = match initializer.build(&mut rng) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("initialisation failed: {e}");
            std::process::exit(1);
        }
    };

    println!("T = {}, N = {}, seed = {}", cli.temperature, cli.sites, cli.seed);
    let trace = evolve(initial, &cfg.evolve_params(cli.temperature), &mut rng);

    println!("{:>8} {:>10} {:>12}", "round", "m", "dE/N");
    let n = trace.site_count() as f64;
    let k = stride(trace.len(), cli.rows);
    for (round, (m, de)) in trace
        .magnetization
        .iter()
        .zip(&trace.energy_shift)
        .enumerate()
        .step_by(k)
    {
        println!("{:>8} {:>10.4} {:>12.5}", round, m, de / n);
    }
    println!(
        "\nstopped after {} rounds: {} (final m = {:.4})",
        trace.rounds(),
        trace.termination.as_str(),
        trace.final_magnetization()
    );
}

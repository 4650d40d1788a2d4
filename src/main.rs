use clap::Parser;
use log::info;
use rand::{rngs::StdRng, SeedableRng};

use unif_dt::{
    cegis::{Driver, ThresholdEnumerator},
    gen::{Instance, Params},
    UnifOptions,
};

/// Learns a random threshold decision program by decision-tree unification.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, default_value_t = 2)]
    arity: usize,
    #[arg(long, default_value_t = 12)]
    points: usize,
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(i64).range(0..))]
    range: i64,
    #[arg(long, default_value_t = 2)]
    depth: usize,
    #[arg(long, default_value_t = 1000)]
    max_rounds: usize,
    #[command(flatten)]
    options: UnifOptions,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let params = Params { arity: args.arity, points: args.points, range: args.range, depth: args.depth };
    let instance = Instance::random(&mut StdRng::seed_from_u64(args.seed), &params);
    info!("reference program {}", instance.reference);

    let enumerator = ThresholdEnumerator::new(params.arity, params.range);
    let mut driver = Driver::new(instance, args.options, enumerator);
    let report = driver.run(args.max_rounds)?;

    println!("rounds: {}, examples: {}, lemmas: {}", report.rounds, report.examples, report.lemmas.len());
    match report.program {
        Some(p) => {
            println!("{}", p);
            Ok(())
        }
        None => {
            for lemma in report.lemmas.iter().rev().take(3) {
                println!("{}", lemma);
            }
            println!("no program found");
            std::process::exit(1);
        }
    }
}

mod config;
mod quiz;

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;

use grad_core::session::format_value;
use grad_core::{Catalog, CoefficientRule, FamilyId, Point, QuestionSession};

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "grad",
    version,
    about = "Gradient trainer - practice partial derivatives of two-variable functions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer gradient questions interactively
    Quiz {
        /// Seed for reproducible questions (overrides the config file)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Stop after this many graded questions
        #[arg(short, long)]
        rounds: Option<usize>,
    },

    /// Draw one function and show its value, gradient and render geometry
    Explore {
        /// Function family
        #[arg(short, long)]
        family: CliFamily,

        /// x coordinate of the evaluation point
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        x: f64,

        /// y coordinate of the evaluation point
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        y: f64,

        /// Seed for the coefficient draw
        #[arg(short, long)]
        seed: Option<u64>,

        /// Print the full payload as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate an expression in x and y
    Eval {
        /// Expression, e.g. "2*x + sin(y)"
        expr: String,

        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        x: f64,

        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        y: f64,
    },

    /// List function families
    Families,

    /// Show the effective configuration
    Config,
}

#[derive(Clone, ValueEnum)]
enum CliFamily {
    Quadratic,
    Exponential,
    Sinusoidal,
    Saddle,
}

impl From<CliFamily> for FamilyId {
    fn from(val: CliFamily) -> Self {
        match val {
            CliFamily::Quadratic => FamilyId::Quadratic,
            CliFamily::Exponential => FamilyId::Exponential,
            CliFamily::Sinusoidal => FamilyId::Sinusoidal,
            CliFamily::Saddle => FamilyId::Saddle,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = config::load_config()?;

    match cli.command {
        Commands::Quiz { seed, rounds } => cmd_quiz(&config, seed, rounds),
        Commands::Explore {
            family,
            x,
            y,
            seed,
            json,
        } => cmd_explore(&config, family.into(), Point::new(x, y), seed, json),
        Commands::Eval { expr, x, y } => cmd_eval(&expr, Point::new(x, y)),
        Commands::Families => cmd_families(),
        Commands::Config => cmd_config(&config),
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

fn open_session(config: &Config, seed: Option<u64>) -> Result<QuestionSession<StdRng>> {
    let rng = make_rng(seed.or(config.question.seed));
    QuestionSession::new(rng, config.session_config()).context("invalid configuration")
}

fn cmd_quiz(config: &Config, seed: Option<u64>, rounds: Option<usize>) -> Result<()> {
    let mut session = open_session(config, seed)?;
    println!("Type each partial derivative as a number or an expression in x and y.");
    println!("Type quit to stop.");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    quiz::run_quiz(&mut session, &mut input, &mut out, rounds)?;
    Ok(())
}

fn cmd_explore(
    config: &Config,
    family: FamilyId,
    point: Point,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let mut session = open_session(config, seed)?;
    let exploration = session.explore(family, point)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&exploration)?);
        return Ok(());
    }

    println!("Family:      {}", exploration.family);
    println!("f(x, y) =    {}", exploration.formula);
    println!("Point:       {}", exploration.point);
    println!("f =          {}", format_value(exploration.value));
    println!(
        "Gradient:    ({}, {})",
        format_value(exploration.dfdx),
        format_value(exploration.dfdy)
    );
    let surface = &exploration.render.surface;
    println!("Surface:     {} x {} samples", surface.cols(), surface.rows());
    let arrow = &exploration.render.gradient_arrow;
    if arrow.is_degenerate() {
        println!("Arrow:       none (flat point)");
    } else {
        println!(
            "Arrow:       ({:.3}, {:.3}) -> ({:.3}, {:.3})",
            arrow.start.x, arrow.start.y, arrow.end.x, arrow.end.y
        );
    }
    Ok(())
}

fn cmd_eval(expr: &str, point: Point) -> Result<()> {
    let value = grad_core::expr::evaluate(expr, point)?;
    println!("{}", format_value(value));
    Ok(())
}

fn describe_rule(rule: &CoefficientRule) -> String {
    match rule.exclude {
        Some(v) => format!("{} in [{}, {}] except {v}", rule.name, rule.min, rule.max),
        None => format!("{} in [{}, {}]", rule.name, rule.min, rule.max),
    }
}

fn cmd_families() -> Result<()> {
    let catalog = Catalog::builtin()?;
    for family in catalog.families() {
        let templates = family.id.templates();
        println!("{} ({})", family.id, family.name);
        println!("  f     = {}", templates.function);
        println!("  df/dx = {}", templates.partial_x);
        println!("  df/dy = {}", templates.partial_y);
        let rules: Vec<String> = family.rules.iter().map(describe_rule).collect();
        println!("  {}", rules.join(", "));
    }
    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("Config: {}", config::show_config_path());
    println!();
    println!("[grading]");
    println!("tolerance = {}", config.grading.tolerance);
    println!();
    println!("[question]");
    println!("point_range = {}", config.question.point_range);
    match config.question.seed {
        Some(s) => println!("seed = {s}"),
        None => println!("# seed not set, questions are random"),
    }
    println!();
    println!("[surface]");
    println!("half_range = {}", config.surface.half_range);
    println!("step = {}", config.surface.step);
    println!();
    println!("[arrow]");
    println!("length = {}", config.arrow.length);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_explore_with_negative_point() {
        let cli = Cli::try_parse_from([
            "grad", "explore", "--family", "saddle", "-x", "-1", "-y", "2", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Explore {
                family, x, y, json, ..
            } => {
                assert_eq!(FamilyId::from(family), FamilyId::Saddle);
                assert_eq!((x, y), (-1.0, 2.0));
                assert!(json);
            }
            _ => panic!("expected explore"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_family() {
        assert!(Cli::try_parse_from(["grad", "explore", "--family", "cubic"]).is_err());
    }

    #[test]
    fn test_describe_rule() {
        assert_eq!(
            describe_rule(&CoefficientRule::non_zero("a", -3, 3)),
            "a in [-3, 3] except 0"
        );
        assert_eq!(describe_rule(&CoefficientRule::new("b", 1, 3)), "b in [1, 3]");
    }

    #[test]
    fn test_seed_flag_overrides_config() {
        let config: Config = toml::from_str("[question]\nseed = 1\n").unwrap();
        let mut a = open_session(&config, Some(5)).unwrap();
        let mut b = open_session(&Config::default(), Some(5)).unwrap();
        assert_eq!(
            a.new_question().unwrap().question.formula,
            b.new_question().unwrap().question.formula
        );
    }
}

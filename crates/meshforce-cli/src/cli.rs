use clap::{Args, Parser, Subcommand};
use meshforce::engine::config::Backend;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "meshforce - triangle area-conservation forces and edge-flip sampling for triangulated membrane meshes.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute area-conservation forces, energies and the total mesh area.
    Evaluate(EvaluateArgs),
    /// Run Metropolis edge-flip sweeps and write the re-triangulated mesh.
    Flip(FlipArgs),
}

/// Arguments for the `evaluate` subcommand.
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Path to the input mesh file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub mesh: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the force engine backend.
    #[arg(short, long, value_name = "reference|accelerated")]
    pub backend: Option<Backend>,

    /// Number of consecutive evaluations to run.
    #[arg(short, long, value_name = "INT")]
    pub steps: Option<u64>,

    /// Skip virial accumulation, overriding the config file.
    #[arg(long)]
    pub no_virial: bool,
}

/// Arguments for the `flip` subcommand.
#[derive(Args, Debug)]
pub struct FlipArgs {
    /// Path to the input mesh file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub mesh: PathBuf,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path for the output mesh file. Defaults to `<mesh>.flipped.toml`.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the number of sweeps over the interior edges.
    #[arg(long, value_name = "INT")]
    pub sweeps: Option<usize>,

    /// Override the Metropolis temperature (energy units).
    #[arg(short, long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Seed for the random number generator.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_arguments_are_parsed() {
        let cli = Cli::parse_from([
            "meshforce",
            "-vv",
            "evaluate",
            "--mesh",
            "vesicle.toml",
            "--backend",
            "reference",
            "--steps",
            "3",
            "--no-virial",
        ]);
        assert_eq!(cli.verbose, 2);
        let Commands::Evaluate(args) = cli.command else {
            panic!("expected evaluate command");
        };
        assert_eq!(args.mesh, PathBuf::from("vesicle.toml"));
        assert_eq!(args.backend, Some(Backend::Reference));
        assert_eq!(args.steps, Some(3));
        assert!(args.no_virial);
    }

    #[test]
    fn flip_accepts_global_flags_after_the_subcommand() {
        let cli = Cli::parse_from([
            "meshforce", "flip", "-m", "in.toml", "-o", "out.toml", "--seed", "9", "-j", "2",
        ]);
        assert_eq!(cli.threads, Some(2));
        let Commands::Flip(args) = cli.command else {
            panic!("expected flip command");
        };
        assert_eq!(args.output, Some(PathBuf::from("out.toml")));
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.sweeps, None);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["meshforce", "-q", "-v", "evaluate", "-m", "x.toml"]);
        assert!(result.is_err());
    }
}

//! Command-line arguments for `cad3d-convert`.

use std::path::PathBuf;

use clap::Parser;

/// Convert one 2D drawing into a STEP model with the local storage backend.
///
/// Prints the job outcome as JSON on stdout; exits non-zero on failure.
#[derive(Debug, Parser)]
#[command(name = "cad3d-convert", version, about)]
pub struct Cli {
    /// PNG or JPEG drawing to convert.
    pub image: PathBuf,

    /// Instructions passed to the engine. Defaults to the built-in prompt.
    #[arg(long)]
    pub prompt: Option<String>,

    /// Engine executable.
    #[arg(long, default_value = "cad3dify-engine")]
    pub engine: PathBuf,

    /// Extra engine argument placed before the staged paths. Repeatable.
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,

    /// Engine budget in seconds.
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    /// Directory that receives the published `drawings/` and `models/` buckets.
    #[arg(long, default_value = "./cad3d-output")]
    pub out_dir: PathBuf,

    /// Root for per-job staging directories.
    #[arg(long)]
    pub staging_dir: Option<PathBuf>,

    /// Log stage transitions.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn parses_image_with_defaults() {
        let cli = Cli::parse_from(["cad3d-convert", "bracket.png"]);
        assert_eq!(cli.image, PathBuf::from("bracket.png"));
        assert!(cli.prompt.is_none());
        assert!(cli.engine_args.is_empty());
        assert_eq!(cli.timeout_secs, 300);
        assert_eq!(cli.out_dir, PathBuf::from("./cad3d-output"));
        assert!(!cli.verbose);
    }

    #[test]
    fn parses_repeated_engine_args() {
        let cli = Cli::parse_from([
            "cad3d-convert",
            "--engine",
            "python3",
            "--engine-arg",
            "-m",
            "--engine-arg",
            "cad3dify",
            "--prompt",
            "a hex nut",
            "--timeout-secs",
            "60",
            "nut.jpg",
        ]);
        assert_eq!(cli.engine, PathBuf::from("python3"));
        assert_eq!(cli.engine_args, vec!["-m", "cad3dify"]);
        assert_eq!(cli.prompt.as_deref(), Some("a hex nut"));
        assert_eq!(cli.timeout_secs, 60);
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}

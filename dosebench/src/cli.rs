use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 30s, 250ms, 1m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!(
            "invalid duration '{s}' (expected e.g. 30s, 250ms, 1m)"
        ));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 30s, 250ms, 1m)"))?;

    let duration = match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Duration::from_secs(value),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => Duration::from_millis(value),
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Duration::from_secs(secs)
        }
        _ => {
            return Err(format!(
                "invalid duration '{s}' (expected e.g. 30s, 250ms, 1m)"
            ));
        }
    };

    if duration.is_zero() {
        return Err(format!("duration '{s}' must be greater than zero"));
    }
    Ok(duration)
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable progress and summary.
    HumanReadable,
    /// One JSON object per line (NDJSON) on stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "dosebench",
    author,
    version,
    about = "Latency benchmark for the dosing service and local scripts",
    long_about = "dosebench times sequential invocations of a target and summarizes them.\n\nA target is either an HTTP endpoint of the dosing service (GET {base-url}{path}) or a local executable launched with no arguments. Runs are strictly sequential so every sample measures an uncontended call.\n\nWith --runs 1 the single response or script output is shown instead of statistics.",
    after_help = "Examples:\n  dosebench http\n  dosebench http --base-url http://localhost:3000 --path /iob --runs 10\n  dosebench http --path /iob --runs 1\n  dosebench exec ./example.sh --runs 20\n  dosebench compare --runs 3\n  dosebench compare --path /start --path /iob --output json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Time GET requests against one endpoint of the service
    Http(HttpArgs),

    /// Time runs of a local executable
    Exec(ExecArgs),

    /// Time several endpoints one after another and rank them by mean latency
    #[command(
        long_about = "Run the same benchmark against each path in turn and print the paths ordered by mean latency (fastest first).\n\nA path whose health check fails is left out of the ranking."
    )]
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
pub struct RunOptions {
    /// Number of sequential runs (1 shows the output instead of statistics)
    #[arg(
        long,
        short = 'n',
        env = "DOSEBENCH_RUNS",
        default_value_t = 100,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub runs: usize,

    /// Do not print a line per run
    #[arg(long)]
    pub no_progress: bool,

    /// Output format
    #[arg(long, value_enum, env = "DOSEBENCH_OUTPUT", default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ServiceArgs {
    /// Base address of the service (scheme, host and port)
    #[arg(long, env = "DOSEBENCH_BASE_URL", default_value = "http://localhost:3000")]
    pub base_url: String,

    /// Upper bound for each request (e.g. 30s, 500ms)
    #[arg(long, env = "DOSEBENCH_TIMEOUT", default_value = "30s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Upper bound for the health check made before timing starts
    #[arg(long, env = "DOSEBENCH_HEALTH_TIMEOUT", default_value = "5s", value_parser = parse_duration)]
    pub health_timeout: Duration,
}

#[derive(Debug, Args)]
pub struct HttpArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Path of the operation to time
    #[arg(long, env = "DOSEBENCH_PATH", default_value = "/start")]
    pub path: String,

    #[command(flatten)]
    pub run: RunOptions,
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Executable to run (launched with no arguments)
    #[arg(env = "DOSEBENCH_SCRIPT", default_value = "./example.sh")]
    pub script: PathBuf,

    /// Kill the executable after this long and record a timeout (unbounded by default)
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    #[command(flatten)]
    pub run: RunOptions,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    #[command(flatten)]
    pub service: ServiceArgs,

    /// Path to include (repeatable; defaults to /start, /iob, /meal, /health)
    #[arg(long = "path", value_name = "PATH")]
    pub paths: Vec<String>,

    #[command(flatten)]
    pub run: RunOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        match Cli::try_parse_from(args) {
            Ok(v) => v,
            Err(err) => panic!("failed to parse args: {err}"),
        }
    }

    #[test]
    fn parse_duration_accepts_common_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("5"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_duration("1m"), Ok(Duration::from_secs(60)));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("0s").is_err());
    }

    #[test]
    fn http_defaults_match_the_service_layout() {
        let cli = parse(&["dosebench", "http"]);
        match cli.command {
            Command::Http(args) => {
                assert_eq!(args.service.base_url, "http://localhost:3000");
                assert_eq!(args.service.timeout, Duration::from_secs(30));
                assert_eq!(args.service.health_timeout, Duration::from_secs(5));
                assert_eq!(args.path, "/start");
                assert_eq!(args.run.runs, 100);
                assert!(!args.run.no_progress);
                assert!(matches!(args.run.output, OutputFormat::HumanReadable));
            }
            _ => panic!("expected http command"),
        }
    }

    #[test]
    fn exec_takes_a_script_and_runs() {
        let cli = parse(&["dosebench", "exec", "./calc.sh", "-n", "1", "--timeout", "2s"]);
        match cli.command {
            Command::Exec(args) => {
                assert_eq!(args.script, PathBuf::from("./calc.sh"));
                assert_eq!(args.run.runs, 1);
                assert_eq!(args.timeout, Some(Duration::from_secs(2)));
            }
            _ => panic!("expected exec command"),
        }
    }

    #[test]
    fn compare_collects_repeated_paths() {
        let cli = parse(&[
            "dosebench",
            "compare",
            "--path",
            "/start",
            "--path",
            "/iob",
            "--runs",
            "3",
            "--output",
            "json",
        ]);
        match cli.command {
            Command::Compare(args) => {
                assert_eq!(args.paths, vec!["/start".to_string(), "/iob".to_string()]);
                assert_eq!(args.run.runs, 3);
                assert!(matches!(args.run.output, OutputFormat::Json));
            }
            _ => panic!("expected compare command"),
        }
    }

    #[test]
    fn runs_must_be_a_positive_integer() {
        assert!(Cli::try_parse_from(["dosebench", "http", "--runs", "0"]).is_err());
        assert!(Cli::try_parse_from(["dosebench", "http", "--runs", "ten"]).is_err());
        assert!(Cli::try_parse_from(["dosebench", "exec", "--runs", "-3"]).is_err());
    }
}

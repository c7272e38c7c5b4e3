use std::env;
use std::path::PathBuf;

pub struct CliOptions {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub method: Option<String>,
    pub all_methods: bool,
    pub dt_hours: Option<f64>,
    pub series_out: Option<PathBuf>,
    pub steps: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut input = None;
    let mut config = None;
    let mut preset = None;
    let mut method = None;
    let mut all_methods = false;
    let mut dt_hours = None;
    let mut series_out = None;
    let mut steps = false;

    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --input (expected a CSV file path)")?;
                if input.replace(PathBuf::from(path)).is_some() {
                    return Err("--input provided more than once".to_string());
                }
            }
            "--config" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --config (expected a TOML file path)")?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--method" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --method (expected a sizing method)")?;
                if method.replace(name.to_string()).is_some() {
                    return Err("--method provided more than once".to_string());
                }
            }
            "--all-methods" => all_methods = true,
            "--dt-hours" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --dt-hours (expected hours)")?;
                let value = raw
                    .parse::<f64>()
                    .map_err(|_| format!("--dt-hours value \"{raw}\" is not a number"))?;
                if dt_hours.replace(value).is_some() {
                    return Err("--dt-hours provided more than once".to_string());
                }
            }
            "--series-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --series-out (expected a file path)")?;
                if series_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--series-out provided more than once".to_string());
                }
            }
            "--steps" => steps = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    let input = input.ok_or_else(|| "missing required argument --input".to_string())?;

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if method.is_some() && all_methods {
        return Err("arguments `--method` and `--all-methods` are mutually exclusive".to_string());
    }

    if config.is_none() && preset.is_none() {
        preset = Some("peak_shaving".to_string());
    }

    Ok(CliOptions {
        input,
        config,
        preset,
        method,
        all_methods,
        dt_hours,
        series_out,
        steps,
    })
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("bess-sizer: size a battery for a load / PV series");
    eprintln!();
    eprintln!("Usage:");
    eprintln!(
        "  bess-sizer --input <csv> [--config <toml> | --preset <name>] [--method <name> | --all-methods]"
    );
    eprintln!("             [--dt-hours <hours>] [--series-out <csv>] [--steps]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --input <csv>        Load / PV series (timestamp, load, pv_production[, price])");
    eprintln!("  --config <toml>      Run configuration file");
    eprintln!("  --preset <name>      Built-in configuration (default: peak_shaving)");
    eprintln!("  --method <name>      Override the configured sizing method");
    eprintln!("  --all-methods        Compare every sizing method side by side");
    eprintln!("  --dt-hours <hours>   Override the sample duration");
    eprintln!("  --series-out <csv>   Export the annotated series");
    eprintln!("  --steps              Print every annotated sample");
    eprintln!();
    eprintln!("Set RUST_LOG (e.g. RUST_LOG=debug) to control log output on stderr.");
}

#[cfg(test)]
mod tests {
    use super::parse_args_from;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn input_with_default_preset() {
        let opts = parse_args_from(args(&["--input", "load.csv"])).expect("parse should succeed");
        assert_eq!(opts.input.to_str(), Some("load.csv"));
        assert_eq!(opts.preset.as_deref(), Some("peak_shaving"));
        assert!(opts.config.is_none());
        assert!(!opts.all_methods);
    }

    #[test]
    fn supports_config_cli() {
        let opts = parse_args_from(args(&["--input", "a.csv", "--config", "run.toml"]))
            .expect("parse should succeed");
        assert_eq!(
            opts.config.as_deref().and_then(|p| p.to_str()),
            Some("run.toml")
        );
        assert!(opts.preset.is_none());
    }

    #[test]
    fn parses_every_flag() {
        let opts = parse_args_from(args(&[
            "--input",
            "a.csv",
            "--preset",
            "self_consumption",
            "--method",
            "guaranteed",
            "--dt-hours",
            "0.5",
            "--series-out",
            "out.csv",
            "--steps",
        ]))
        .expect("parse should succeed");
        assert_eq!(opts.method.as_deref(), Some("guaranteed"));
        assert_eq!(opts.dt_hours, Some(0.5));
        assert!(opts.series_out.is_some());
        assert!(opts.steps);
    }

    #[test]
    fn input_is_required() {
        let err = parse_args_from(args(&["--preset", "strict_limits"])).err();
        assert!(err.is_some_and(|e| e.contains("--input")));
    }

    #[test]
    fn config_and_preset_conflict() {
        let err = parse_args_from(args(&[
            "--input", "a.csv", "--config", "r.toml", "--preset", "x",
        ]))
        .err();
        assert!(err.is_some_and(|e| e.contains("mutually exclusive")));
    }

    #[test]
    fn method_and_all_methods_conflict() {
        let err = parse_args_from(args(&[
            "--input",
            "a.csv",
            "--method",
            "guaranteed",
            "--all-methods",
        ]))
        .err();
        assert!(err.is_some());
    }

    #[test]
    fn rejects_bad_dt() {
        let err = parse_args_from(args(&["--input", "a.csv", "--dt-hours", "quarter"])).err();
        assert!(err.is_some_and(|e| e.contains("--dt-hours")));
    }

    #[test]
    fn rejects_unknown_argument() {
        let err = parse_args_from(args(&["--input", "a.csv", "--seed", "1"])).err();
        assert_eq!(err.as_deref(), Some("unknown argument: --seed"));
    }
}

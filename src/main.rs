//! bess-sizer entry point: CLI wiring and config-driven sizing runs.

mod cli;

use std::path::Path;
use std::process;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bess_sizer::config::RunConfig;
use bess_sizer::io::export::export_csv;
use bess_sizer::io::load::load_csv;
use bess_sizer::reporting::{print_comparison, print_sizing_report, print_steps};
use bess_sizer::runner::compare_methods;

use cli::CliOptions;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

/// Resolves the run configuration: `--config` file or preset, then CLI overrides.
fn load_config(cli: &CliOptions) -> Result<RunConfig, String> {
    let mut config = match (&cli.config, &cli.preset) {
        (Some(path), _) => RunConfig::from_toml_file(path),
        (None, Some(name)) => RunConfig::from_preset(name),
        (None, None) => Ok(RunConfig::default()),
    }
    .map_err(|e| e.to_string())?;

    if let Some(method) = &cli.method {
        config.sizing.method = method.clone();
    }
    if let Some(dt_hours) = cli.dt_hours {
        config.input.dt_hours = dt_hours;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        return Err(format!("{} invalid configuration field(s)", errors.len()));
    }
    Ok(config)
}

fn run(cli: &CliOptions) -> Result<(), String> {
    let config = load_config(cli)?;
    let series = load_csv(&cli.input, &config.load_options()).map_err(|e| e.to_string())?;
    if series.is_empty() {
        warn!(path = %cli.input.display(), "input series has no samples");
    }

    let results = if cli.all_methods {
        let policy = config.dispatch_policy().map_err(|e| e.to_string())?;
        let methods = config.all_sizing_methods().map_err(|e| e.to_string())?;
        compare_methods(&series, policy, &methods, config.sizing.soc_mode)
    } else {
        let sizing_run = config.sizing_run().map_err(|e| e.to_string())?;
        info!(
            policy = %sizing_run.policy(),
            method = %sizing_run.method(),
            "running sizing"
        );
        sizing_run.run(&series).map(|result| vec![result])
    }
    .map_err(|e| e.to_string())?;

    if cli.steps {
        if let Some(first) = results.first() {
            print_steps(first);
        }
    }

    match results.as_slice() {
        [single] => print_sizing_report(single),
        many => print_comparison(many),
    }

    if let Some(path) = &cli.series_out {
        let Some(result) = results.first() else {
            return Ok(());
        };
        if results.len() > 1 {
            info!(method = result.method.name(), "exporting series of the first method");
        }
        export_csv(&result.steps, Path::new(path))
            .map_err(|e| format!("failed to write CSV: {e}"))?;
    }

    Ok(())
}

fn main() {
    init_tracing();

    let cli = match cli::parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            error!("{e}");
            cli::print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli) {
        error!("{e}");
        process::exit(1);
    }
}

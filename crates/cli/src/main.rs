use imageprobe_cli::cli::commands::{
    CliArgs, Commands, ImageMatrixArgs, MatrixArgs, ProbeArgs, VariantArgs,
};
use imageprobe_cli::cli::output::OutputFormatter;
use imageprobe_cli::logging::{self, LoggingConfig};
use imageprobe_cli::{NAME, VERSION};
use imageprobe_core::checks::{self, CheckRunner};
use imageprobe_core::expected::startup_file;
use imageprobe_core::image_matrix::{self, SdkVersions};
use imageprobe_core::variant::VariantSummary;
use imageprobe_core::{
    CommandRunner, ContainerRunner, HarnessConfig, ImageVariant, MatrixInputs, Prober,
    ShellSettings, SystemRunner,
};

use clap::Parser;
use std::process;
use tracing::{debug, error, info, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Matrix(matrix_args) => handle_matrix(matrix_args),
        Commands::ImageMatrix(image_args) => handle_image_matrix(image_args),
        Commands::Variant(variant_args) => handle_variant(variant_args),
        Commands::Probe(probe_args) => handle_probe(probe_args),
        Commands::Config => handle_config(),
    };

    process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let base = logging::config_from_env(LoggingConfig::default());

    let level = if let Some(level_str) = &args.log_level {
        logging::parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        base.level
    };

    logging::init_logging(LoggingConfig {
        level,
        use_json: args.log_json || base.use_json,
        ..base
    });
}

fn load_config() -> Option<HarnessConfig> {
    match HarnessConfig::from_env() {
        Ok(config) => {
            debug!("{}", config);
            Some(config)
        }
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("\nPlease check your environment variables.");
            None
        }
    }
}

fn print_or_fail(rendered: anyhow::Result<String>) -> i32 {
    match rendered {
        Ok(text) => {
            println!("{}", text.trim_end());
            0
        }
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

fn handle_matrix(args: &MatrixArgs) -> i32 {
    let Some(config) = load_config() else {
        return 1;
    };

    let inputs = MatrixInputs::from_config(&config);
    let cases = inputs.build();
    info!(count = cases.len(), "Built template matrix");

    print_or_fail(OutputFormatter::new(args.format.into()).format_matrix(&cases))
}

fn handle_image_matrix(args: &ImageMatrixArgs) -> i32 {
    let versions = SdkVersions::default();
    let rendered = if args.sync {
        serde_json::to_string(&image_matrix::sync_images(&versions))
    } else {
        serde_json::to_string(&image_matrix::generate(&versions, !args.no_arch))
    };

    print_or_fail(rendered.map_err(anyhow::Error::from))
}

fn resolve_variant(name: Option<&str>, config: &HarnessConfig) -> Option<ImageVariant> {
    let resolved = match name {
        Some(name) => ImageVariant::parse(name).map_err(|e| e.to_string()),
        None => config
            .require_variant()
            .cloned()
            .map_err(|e| e.to_string()),
    };

    match resolved {
        Ok(variant) => Some(variant),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

fn handle_variant(args: &VariantArgs) -> i32 {
    let Some(config) = load_config() else {
        return 1;
    };
    let Some(variant) = resolve_variant(args.name.as_deref(), &config) else {
        return 1;
    };

    print_or_fail(
        OutputFormatter::new(args.format.into()).format_variant(&VariantSummary::from(&variant)),
    )
}

fn handle_probe(args: &ProbeArgs) -> i32 {
    let Some(config) = load_config() else {
        return 1;
    };
    let Some(variant) = resolve_variant(args.variant.as_deref(), &config) else {
        return 1;
    };

    let shell = ShellSettings::new(startup_file(&variant));
    let container = args.container.clone().or_else(|| config.probe_container.clone());

    match container {
        Some(container) => {
            info!(%container, %variant, "Probing container");
            match ContainerRunner::connect(container) {
                Ok(runner) => run_checks(runner, shell, &variant, args),
                Err(e) => {
                    error!("{}", e);
                    1
                }
            }
        }
        None => {
            info!(%variant, "Probing local environment");
            run_checks(SystemRunner::new(), shell, &variant, args)
        }
    }
}

fn run_checks<R: CommandRunner>(
    runner: R,
    shell: ShellSettings,
    variant: &ImageVariant,
    args: &ProbeArgs,
) -> i32 {
    let checks = match checks::for_variant(variant) {
        Ok(checks) => checks,
        Err(e) => {
            error!("{}", e);
            return 1;
        }
    };

    let outcomes = CheckRunner::new(Prober::new(runner, shell)).run_all(&checks);
    let failed = outcomes.iter().filter(|o| !o.passed).count();

    let code = print_or_fail(OutputFormatter::new(args.format.into()).format_outcomes(&outcomes));
    if failed > 0 {
        error!(failed, total = outcomes.len(), "Environment checks failed");
        return 1;
    }
    code
}

fn handle_config() -> i32 {
    match load_config() {
        Some(config) => {
            print!("{}", config);
            0
        }
        None => 1,
    }
}

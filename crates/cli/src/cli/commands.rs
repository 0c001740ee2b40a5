use clap::{Parser, Subcommand, ValueEnum};

/// Integration-test tooling for IaC container images
#[derive(Parser, Debug)]
#[command(
    name = "imageprobe",
    about = "Integration-test tooling for IaC container images",
    version,
    long_about = "imageprobe builds the template test matrix, classifies image variants and \
                  checks a running image's environment the way deployment runners see it, \
                  both without a shell and through a login shell."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Print the template test matrix",
        long_about = "Builds the SDK x cloud template matrix from SDKS_TO_TEST, LANGUAGE_VERSION, \
                      MATRIX_EXCLUSIONS and GCP_PROJECT_NAME.\n\n\
                      Examples:\n  \
                      imageprobe matrix\n  \
                      SDKS_TO_TEST=go,python imageprobe matrix --format json"
    )]
    Matrix(MatrixArgs),

    #[command(
        about = "Print the CI build matrix for the per-language images",
        long_about = "Prints the GitHub Actions matrix with every image combination listed \
                      under `include`.\n\n\
                      Examples:\n  \
                      imageprobe image-matrix\n  \
                      imageprobe image-matrix --no-arch\n  \
                      imageprobe image-matrix --sync"
    )]
    ImageMatrix(ImageMatrixArgs),

    #[command(about = "Classify an image variant")]
    Variant(VariantArgs),

    #[command(
        about = "Check the environment of an image",
        long_about = "Runs the environment checks for IMAGE_VARIANT, in this process's \
                      environment or inside a running container.\n\n\
                      Examples:\n  \
                      IMAGE_VARIANT=pulumi-debian-python imageprobe probe\n  \
                      imageprobe probe --variant pulumi-ubi-go --container my-container"
    )]
    Probe(ProbeArgs),

    #[command(about = "Show the harness configuration read from the environment")]
    Config,
}

#[derive(Parser, Debug, Clone)]
pub struct MatrixArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ImageMatrixArgs {
    #[arg(long, help = "Omit the arch field, for multi-arch manifests")]
    pub no_arch: bool,

    #[arg(
        long,
        conflicts_with = "no_arch",
        help = "Print the list of images to mirror instead"
    )]
    pub sync: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct VariantArgs {
    #[arg(value_name = "NAME", help = "Variant name (defaults to IMAGE_VARIANT)")]
    pub name: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ProbeArgs {
    #[arg(long, value_name = "NAME", help = "Variant to check (defaults to IMAGE_VARIANT)")]
    pub variant: Option<String>,

    #[arg(
        short = 'c',
        long,
        value_name = "CONTAINER",
        help = "Run the checks inside this container (defaults to PROBE_CONTAINER)"
    )]
    pub container: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

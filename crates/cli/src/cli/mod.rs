pub mod commands;
pub mod output;

pub use commands::{CliArgs, Commands, ImageMatrixArgs, MatrixArgs, ProbeArgs, VariantArgs};
pub use output::{OutputFormat, OutputFormatter};

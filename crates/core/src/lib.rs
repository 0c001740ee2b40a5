pub mod checks;
pub mod cloud;
pub mod config;
pub mod expected;
pub mod fixtures;
pub mod id_enum;
pub mod image_matrix;
pub mod matrix;
pub mod probe;
pub mod serial;
pub mod stack;
pub mod variant;

pub use checks::{CheckOutcome, CheckRunner, EnvironmentCheck, Expectation};
pub use cloud::{CloudChecks, CloudError};
pub use config::{ConfigError, HarnessConfig};
pub use expected::ExpectationError;
pub use fixtures::{Fixture, FixtureError};
pub use matrix::{build_matrix, ExclusionSet, MatrixInputs, TestCase};
pub use probe::{
    CommandRunner, ContainerRunner, ExecMode, MockRunner, ProbeError, ProbeResult, Prober,
    ShellSettings, SystemRunner,
};
pub use serial::SerialGroup;
pub use stack::{StackCycle, StackError, StackOptions};
pub use variant::{Base, ImageVariant, Runtime, VariantError};

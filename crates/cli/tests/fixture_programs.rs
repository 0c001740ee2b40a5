//! Static checks on the language-version fixture programs, so a broken fixture shows up
//! without deploying it.

mod support;

use imageprobe_core::fixtures::{self, NODE_DEFAULT};
use std::fs;
use yare::parameterized;

fn read_fixture(name: &str, file: &str) -> String {
    let path = support::language_version_fixtures().join(name).join(file);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e))
}

#[test]
fn test_dotnet_six_expects_roll_forward() {
    let program = read_fixture("dotnet-6.0", "Program.cs");
    assert!(program.contains("running.Major == 6"));
    assert!(!program.contains("running.Major != 6"));

    let project = read_fixture("dotnet-6.0", "dotnet-6.0.csproj");
    assert!(project.contains("<TargetFramework>net6.0</TargetFramework>"));
    assert!(project.contains("<RollForward>LatestMajor</RollForward>"));
}

#[parameterized(
    dotnet_8 = { "dotnet-8.0", "running.Major != 8" },
    dotnet_9 = { "dotnet-9.0", "running.Major != 9" },
)]
fn test_dotnet_requires_own_major(name: &str, guard: &str) {
    assert!(read_fixture(name, "Program.cs").contains(guard));
}

#[test]
fn test_every_fixture_is_a_named_project() {
    let found = fixtures::discover(&support::language_version_fixtures()).unwrap();
    assert_eq!(found[0].name, NODE_DEFAULT);
    assert!(found.len() >= 9);

    for fixture in found {
        let raw = read_fixture(&fixture.name, "Pulumi.yaml");
        let project: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
        assert_eq!(project["name"].as_str(), Some(fixture.name.as_str()));
        assert!(!project["runtime"].is_null(), "{} has no runtime", fixture.name);
    }
}

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::parser::xml;
use crate::report::{Finding, Report};

/// Strategy for deriving the logical module a file belongs to. Concrete
/// detectors inspect build files, manifests, or whatever else identifies a
/// build unit; the resolver depends only on this one method.
pub trait ModuleDetector {
    /// Guess the module name for an absolute file path. `None` when this
    /// strategy cannot tell.
    fn guess_module_name(&self, file_name: &str) -> Option<String>;
}

/// Assigns module names to the findings of a report that do not carry one.
///
/// Explicit module names set by an adapter are never overwritten, so the
/// pass is idempotent.
#[derive(Debug, Default)]
pub struct ModuleResolver;

impl ModuleResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, report: &mut Report, detector: &dyn ModuleDetector) {
        let findings: Vec<Arc<Finding>> = report.iter().cloned().collect();

        let mut resolved = 0;
        for finding in &findings {
            if finding.has_module_name() {
                continue;
            }
            if let Some(module) = detector.guess_module_name(finding.file_name()) {
                if !module.is_empty() {
                    debug!("{} belongs to module {module}", finding.file_name());
                    finding.set_module_name(module);
                    resolved += 1;
                }
            }
        }

        report.refresh_module_counts();
        report.log_info(format!("-> resolved module names for {resolved} findings"));
    }
}

/// Walks up from the affected file looking for a build file that names the
/// enclosing project.
///
/// `Cargo.toml` contributes `package.name`, a Maven `pom.xml` its `name` or
/// `artifactId`; a Gradle build file contributes its directory name.
#[derive(Debug, Default)]
pub struct BuildFileModuleDetector;

impl BuildFileModuleDetector {
    pub fn new() -> Self {
        Self
    }

    fn read_cargo_name(path: &Path) -> Option<String> {
        let content = std::fs::read_to_string(path).ok()?;
        let value: toml::Value = toml::from_str(&content).ok()?;
        value
            .get("package")?
            .get("name")?
            .as_str()
            .map(str::to_owned)
    }

    fn read_maven_name(path: &Path) -> Option<String> {
        let content = std::fs::read_to_string(path).ok()?;
        xml::direct_child_text(&content, "name")
            .or_else(|| xml::direct_child_text(&content, "artifactId"))
    }
}

impl ModuleDetector for BuildFileModuleDetector {
    fn guess_module_name(&self, file_name: &str) -> Option<String> {
        let mut dir = Path::new(file_name).parent()?;
        loop {
            let cargo = dir.join("Cargo.toml");
            if cargo.is_file() {
                if let Some(name) = Self::read_cargo_name(&cargo) {
                    return Some(name);
                }
            }
            let pom = dir.join("pom.xml");
            if pom.is_file() {
                if let Some(name) = Self::read_maven_name(&pom) {
                    return Some(name);
                }
            }
            if dir.join("build.gradle").is_file() || dir.join("build.gradle.kts").is_file() {
                return dir.file_name().map(|name| name.to_string_lossy().into_owned());
            }
            dir = dir.parent()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::FindingBuilder;
    use std::fs;

    struct StubDetector {
        file_name: &'static str,
        module: &'static str,
    }

    impl ModuleDetector for StubDetector {
        fn guess_module_name(&self, file_name: &str) -> Option<String> {
            (file_name == self.file_name).then(|| self.module.to_owned())
        }
    }

    #[test]
    fn assigns_module_names_without_overwriting() {
        let file_name = "/file/with/warnings.txt";
        let mut report = Report::new();
        let mut builder = FindingBuilder::new();
        builder.file_name(file_name);
        report.add(builder.build());
        report.add(builder.module_name("module2").message("preset").build());

        let detector = StubDetector {
            file_name,
            module: "module1",
        };
        ModuleResolver::new().run(&mut report, &detector);

        assert_eq!(report.get(0).module_name(), "module1");
        assert_eq!(report.get(1).module_name(), "module2");
        assert!(report
            .info_messages()
            .contains(&"-> resolved module names for 1 findings".to_owned()));
    }

    #[test]
    fn refreshes_module_counts() {
        let file_name = "/src/lib.rs";
        let mut report = Report::new();
        report.add(FindingBuilder::new().file_name(file_name).build());
        assert_eq!(report.modules().get("-"), Some(&1));

        let detector = StubDetector {
            file_name,
            module: "core",
        };
        ModuleResolver::new().run(&mut report, &detector);

        assert_eq!(report.modules().get("core"), Some(&1));
        assert_eq!(report.modules().get("-"), None);
    }

    #[test]
    fn running_twice_resolves_nothing_new() {
        let file_name = "/src/lib.rs";
        let mut report = Report::new();
        report.add(FindingBuilder::new().file_name(file_name).build());

        let detector = StubDetector {
            file_name,
            module: "core",
        };
        let resolver = ModuleResolver::new();
        resolver.run(&mut report, &detector);
        resolver.run(&mut report, &detector);

        assert_eq!(report.get(0).module_name(), "core");
        assert!(report
            .info_messages()
            .contains(&"-> resolved module names for 0 findings".to_owned()));
    }

    #[test]
    fn detects_cargo_package_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"widget\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();
        let nested = dir.path().join("src/deep");
        fs::create_dir_all(&nested).unwrap();
        let source = nested.join("lib.rs");
        fs::write(&source, "").unwrap();

        let detector = BuildFileModuleDetector::new();
        let module = detector.guess_module_name(&source.to_string_lossy());

        assert_eq!(module.as_deref(), Some("widget"));
    }

    #[test]
    fn detects_maven_artifact_ids() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pom.xml"),
            "<project><modelVersion>4.0.0</modelVersion>\
             <parent><artifactId>parent</artifactId></parent>\
             <artifactId>widget-maven</artifactId></project>",
        )
        .unwrap();
        let source = dir.path().join("Widget.java");
        fs::write(&source, "").unwrap();

        let detector = BuildFileModuleDetector::new();
        let module = detector.guess_module_name(&source.to_string_lossy());

        assert_eq!(module.as_deref(), Some("widget-maven"));
    }

    #[test]
    fn returns_none_without_build_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("orphan.c");
        fs::write(&source, "").unwrap();

        let detector = BuildFileModuleDetector::new();
        // The walk may escape the temp dir; only assert that nothing inside
        // the temp dir produced a name.
        let module = detector.guess_module_name(&source.to_string_lossy());
        assert_ne!(module.as_deref(), Some("orphan.c"));
    }
}

//! End-to-end generation tests.
//!
//! The compiler and pkg-config are replaced by small shell scripts that log
//! their arguments, so these tests run the same on every unix host.

#![cfg(unix)]

use aods_build::{BuildError, CompileCommands, Generator, PkgConfig, PlanBuilder};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

/// Prints `<object>: <source>` like `cc -MM`, or fails if the source is missing.
const FAKE_CC: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/cc.log"
target=""
src=""
while [ $# -gt 0 ]; do
  case "$1" in
    -MT) shift; target="$1" ;;
    -MM) shift; src="$1" ;;
  esac
  shift
done
if [ ! -f "$src" ]; then
  echo "fatal error: $src: No such file or directory" >&2
  exit 1
fi
printf '%s: %s\n' "$target" "$src"
"#;

/// Knows `zlib` and `libpng`.
const FAKE_PKG_CONFIG: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/pkg.log"
mode="$1"
shift
case "$mode" in
  --exists)
    case "$1" in
      zlib|libpng) exit 0 ;;
      *) exit 1 ;;
    esac ;;
  -cflags)
    for p in "$@"; do printf '%s ' "-I/opt/$p/include"; done
    echo ;;
  -libs)
    for p in "$@"; do printf '%s ' "-l$p"; done
    echo ;;
  --variable=prefix) echo "/opt/$1" ;;
  *) exit 2 ;;
esac
"#;

// Spawning a script while another thread holds a write handle to a fresh
// script fails with ETXTBSY, so tests in this file run one at a time.
static SERIAL: Mutex<()> = Mutex::new(());

struct Project {
    _guard: MutexGuard<'static, ()>,
    dir: TempDir,
    cc: String,
    pkg_config: PkgConfig,
}

impl Project {
    fn new() -> Self {
        let guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        let dir = TempDir::new().expect("Failed to create temp dir");

        let bin = dir.path().join("bin");
        fs::create_dir(&bin).unwrap();
        let cc = write_script(&bin.join("cc"), FAKE_CC);
        let pkg_config = write_script(&bin.join("pkg-config"), FAKE_PKG_CONFIG);

        Self {
            _guard: guard,
            dir,
            cc,
            pkg_config: PkgConfig::with_program(pkg_config),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn build_dir(&self) -> PathBuf {
        self.root().join("build")
    }

    fn source(&self, name: &str) {
        let path = self.root().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "int main(void) { return 0; }\n").unwrap();
    }

    fn builder(&self) -> PlanBuilder {
        PlanBuilder::new("app", &self.cc, self.build_dir())
            .unwrap()
            .pkg_config(self.pkg_config.clone())
    }

    fn generator(&self) -> Generator {
        Generator::new(self.root())
    }

    fn log(&self, tool: &str) -> Vec<String> {
        fs::read_to_string(self.root().join("bin").join(format!("{tool}.log")))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn makefile(&self) -> String {
        fs::read_to_string(self.root().join("Makefile")).unwrap()
    }

    fn database(&self) -> CompileCommands {
        CompileCommands::from_file(&self.build_dir().join("compile_commands.json")).unwrap()
    }
}

fn write_script(path: &Path, body: &str) -> String {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    path.display().to_string()
}

#[test]
fn test_single_source_project() {
    let project = Project::new();
    project.source("main.c");

    let mut builder = project.builder();
    builder.add_source("main.c").add_include("include");
    project.generator().generate(&builder.build()).unwrap();

    let cc = &project.cc;
    let build = project.build_dir().display().to_string();
    assert_eq!(
        project.makefile(),
        format!(
            "{build}/app: {build}/main.o\n\
             \t{cc} -o {build}/app {build}/main.o\n\
             {build}/main.o: main.c\n\
             \t{cc} -c -Iinclude -o {build}/main.o main.c\n"
        )
    );

    // The header scan saw the include path, target and source in order
    assert_eq!(
        project.log("cc"),
        vec![format!("-Iinclude -MT {build}/main.o -MM main.c")]
    );

    let db = project.database();
    assert_eq!(db.commands().len(), 1);
    let entry = &db.commands()[0];
    assert_eq!(entry.file, "main.c");
    assert_eq!(entry.directory, project.root());
    assert_eq!(
        entry.command.as_deref(),
        Some(format!("{cc} -c -Iinclude -o {build}/main.o main.c").as_str())
    );
}

#[test]
fn test_relative_build_dir_resolves_against_working_dir() {
    let project = Project::new();
    project.source("main.c");

    // The builder also creates `build` under the test's own cwd; the
    // generator must still write everything under the project root.
    let mut builder = PlanBuilder::new("app", &project.cc, "build")
        .unwrap()
        .pkg_config(project.pkg_config.clone());
    builder.add_source("main.c").add_include("include");
    project.generator().generate(&builder.build()).unwrap();

    let cc = &project.cc;
    assert_eq!(
        project.makefile(),
        format!(
            "build/app: build/main.o\n\
             \t{cc} -o build/app build/main.o\n\
             build/main.o: main.c\n\
             \t{cc} -c -Iinclude -o build/main.o main.c\n"
        )
    );
    assert_eq!(
        project.log("cc"),
        vec!["-Iinclude -MT build/main.o -MM main.c"]
    );

    let db = project.database();
    assert_eq!(db.commands().len(), 1);
    assert_eq!(db.commands()[0].file, "main.c");
    assert_eq!(db.commands()[0].directory, project.root());
}

#[test]
fn test_database_follows_source_order() {
    let project = Project::new();
    project.source("src/b.c");
    project.source("a.c");

    let mut builder = project.builder();
    builder.add_sources(["./src/b.c", "a.c"]);
    let plan = builder.build();
    project.generator().generate(&plan).unwrap();

    let db = project.database();
    let files: Vec<_> = db.commands().iter().map(|c| c.file.as_str()).collect();
    assert_eq!(files, vec!["./src/b.c", "a.c"]);

    let entry = db.find_command("a.c").unwrap();
    assert_eq!(entry.get_args().last().map(String::as_str), Some("a.c"));

    let build = project.build_dir().display().to_string();
    assert!(project
        .makefile()
        .starts_with(&format!("{build}/app: {build}/b.o {build}/a.o\n")));
}

#[test]
fn test_dependency_batch_is_resolved_once() {
    let project = Project::new();
    project.source("main.c");

    let mut builder = project.builder();
    builder.add_flag("-Wall");
    builder.add_dependencies(["zlib", "libpng"]).unwrap();

    assert_eq!(
        builder.flags(),
        "-Wall -I/opt/zlib/include -I/opt/libpng/include"
    );
    assert_eq!(builder.libs(), "-lzlib -llibpng");
    assert_eq!(
        project.log("pkg"),
        vec![
            "--exists zlib",
            "--exists libpng",
            "-cflags zlib libpng",
            "-libs zlib libpng",
        ]
    );

    builder.add_source("main.c");
    let plan = builder.build();
    assert_eq!(plan.dependencies(), ["zlib", "libpng"]);
    assert!(plan
        .link_command()
        .contains("-Wall -I/opt/zlib/include -I/opt/libpng/include -lzlib -llibpng -o "));
}

#[test]
fn test_dependency_batch_fails_fast() {
    let project = Project::new();

    let mut builder = project.builder();
    builder.add_dependency("zlib").unwrap();
    let (flags, libs) = (builder.flags(), builder.libs());

    let err = builder.add_dependencies(["libpng", "openssl"]).unwrap_err();
    assert!(matches!(err, BuildError::DependencyNotFound(ref name) if name == "openssl"));

    // Nothing from the failed batch was merged or even queried for flags
    assert_eq!(builder.flags(), flags);
    assert_eq!(builder.libs(), libs);
    assert_eq!(builder.build().dependencies(), ["zlib"]);
    assert_eq!(
        project
            .log("pkg")
            .iter()
            .filter(|line| line.starts_with("-cflags"))
            .count(),
        1
    );
}

#[test]
fn test_missing_dependency_message() {
    let project = Project::new();

    let err = project.builder().add_dependency("zlib-ng").unwrap_err();
    assert_eq!(err.to_string(), "`zlib-ng` not installed!");
}

#[test]
fn test_repeated_generation_is_identical() {
    let project = Project::new();
    project.source("main.c");
    project.source("util.c");

    let mut builder = project.builder();
    builder.add_sources(["main.c", "util.c"]).add_flag("-O2");
    let plan = builder.build();
    let generator = project.generator();

    generator.generate(&plan).unwrap();
    let makefile = project.makefile();
    let database = fs::read(project.build_dir().join("compile_commands.json")).unwrap();

    generator.generate(&plan).unwrap();
    assert_eq!(project.makefile(), makefile);
    assert_eq!(
        fs::read(project.build_dir().join("compile_commands.json")).unwrap(),
        database
    );

    // Header scans are not cached: one per source per generation
    assert_eq!(project.log("cc").len(), 4);
}

#[test]
fn test_scan_failure_aborts_generation() {
    let project = Project::new();
    project.source("main.c");

    let mut builder = project.builder();
    builder.add_sources(["main.c", "missing.c"]);

    match project.generator().generate(&builder.build()) {
        Err(BuildError::CompileDependency { source_file, stderr }) => {
            assert_eq!(source_file, "missing.c");
            assert!(stderr.contains("No such file or directory"));
        }
        other => panic!("expected compile dependency error, got {:?}", other),
    }

    assert!(!project.root().join("Makefile").exists());
    assert!(!project.build_dir().join("compile_commands.json").exists());
}

#[test]
fn test_package_variable() {
    let project = Project::new();

    assert_eq!(project.pkg_config.variable("zlib", "prefix").unwrap(), "/opt/zlib");
    assert!(matches!(
        project.pkg_config.variable("zlib", "libdir"),
        Err(BuildError::Resolution { .. })
    ));
}

#[test]
fn test_custom_makefile_path() {
    let project = Project::new();
    project.source("main.c");

    let mut builder = project.builder();
    builder.add_source("main.c");
    let generator = project.generator().makefile("app.mk");
    generator.generate(&builder.build()).unwrap();

    assert!(project.root().join("app.mk").is_file());
    assert!(!project.root().join("Makefile").exists());
}

use aods_build::{default_flags, find_compiler, BuildType, Generator, Manifest, PkgConfig};
use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aods")]
#[command(author, version, about = "Generate Makefiles and compile_commands.json for C projects")]
struct Cli {
    /// Log every tool invocation
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the Makefile and compile_commands.json for a manifest
    Generate {
        /// Manifest to read
        #[arg(short, long, default_value = aods_build::MANIFEST_FILE)]
        manifest: PathBuf,

        /// Project root (default: `project.root`, else the manifest's directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Makefile path, relative to the project root
        #[arg(long)]
        makefile: Option<PathBuf>,
    },

    /// Print a compiler flag preset
    Flags {
        #[arg(value_enum)]
        build_type: Profile,
    },

    /// Print the compiler that would be used by default
    Toolchain,

    /// Query pkg-config for a package
    Pkg {
        /// Package name
        name: String,

        /// Print a single pkg-config variable instead of the flags
        #[arg(long)]
        variable: Option<String>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Profile {
    /// Symbols, sanitizers and extra warnings
    Debug,
    /// Optimization, LTO and hardening
    Release,
}

impl From<Profile> for BuildType {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Debug => BuildType::Debug,
            Profile::Release => BuildType::Release,
        }
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate {
            manifest,
            root,
            makefile,
        } => cmd_generate(&manifest, root, makefile)?,

        Commands::Flags { build_type } => {
            println!("{}", default_flags(build_type.into()).join(" "));
        }

        Commands::Toolchain => {
            println!("{}", find_compiler()?);
        }

        Commands::Pkg { name, variable } => {
            let pkg = pkg_config();
            pkg.assert_installed(&name)?;
            match variable {
                Some(var) => println!("{}", pkg.variable(&name, &var)?),
                None => {
                    let names = [name];
                    let cflags = pkg.cflags(&names)?;
                    let libs = pkg.libs(&names)?;
                    println!("{}", [cflags, libs].join(" ").trim());
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// `PKG_CONFIG` selects the provider program, as it does for autotools.
fn pkg_config() -> PkgConfig {
    match std::env::var("PKG_CONFIG") {
        Ok(program) if !program.is_empty() => PkgConfig::with_program(program),
        _ => PkgConfig::new(),
    }
}

fn cmd_generate(manifest_path: &Path, root: Option<PathBuf>, makefile: Option<PathBuf>) -> Result<()> {
    let manifest = Manifest::from_file(manifest_path)?;

    let manifest_dir = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let root = root
        .or_else(|| manifest.project.root.as_ref().map(|r| manifest_dir.join(r)))
        .unwrap_or_else(|| manifest_dir.to_path_buf());

    // Sources, includes and the build directory are relative to the root
    std::env::set_current_dir(&root)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to enter project root {}", root.display()))?;
    debug!(root = %root.display(), "entered project root");

    let plan = manifest.to_builder(pkg_config())?.build();

    let mut generator = Generator::from_current_dir()?;
    if let Some(path) = makefile {
        generator = generator.makefile(path);
    }
    generator.generate(&plan)?;

    info!(
        project = plan.name(),
        sources = plan.sources().len(),
        "generated build files"
    );
    println!(
        "Wrote {} and {}",
        generator.makefile_path().display(),
        generator.compile_commands_path(&plan).display()
    );
    Ok(())
}

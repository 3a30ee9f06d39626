use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use archconf_cli::report::{shell_join, summary, CheckReport};
use archconf_cli::source::{environment, read_source, ArchSource};
use archconf_parse::parse_str;
use archconf_types::presets::PRESETS;
use archconf_types::{BuildConfig, Features, MpiMode, Override, ResolveOptions};
use clap::{Args, Parser, Subcommand, ValueEnum};
use simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};

#[derive(Parser, Debug)]
#[command(name = "archconf")]
#[command(about = "Resolve and validate PDAF make.arch build configurations")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Path to an arch include file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Name of a built-in preset (see `archconf presets`)
    #[arg(long, conflicts_with = "file")]
    preset: Option<String>,

    /// Arch name used when neither --file nor --preset is given
    #[arg(long, env = "PDAF_ARCH")]
    arch: Option<String>,

    /// Directory holding <arch>.h files
    #[arg(long)]
    arch_dir: Option<PathBuf>,

    /// MPI binding: auto, on or off
    #[arg(long, default_value = "auto")]
    mpi: MpiMode,

    /// Require NetCDF library and include paths
    #[arg(long)]
    netcdf: bool,

    /// Override a variable as on the make command line (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<Override>,

    /// Let unassigned variables fall back to the environment
    #[arg(long)]
    use_env: bool,
}

impl SourceArgs {
    fn load(&self) -> Result<BuildConfig> {
        let source = ArchSource::select(
            self.file.clone(),
            self.preset.clone(),
            self.arch.clone(),
            self.arch_dir.clone(),
        )?;
        let opts = ResolveOptions {
            features: Features {
                mpi: self.mpi,
                netcdf: self.netcdf,
            },
            overrides: self.overrides.clone(),
            environment: if self.use_env {
                environment()
            } else {
                Default::default()
            },
        };
        source.load(&opts)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve an arch file and report problems
    Check {
        #[command(flatten)]
        source: SourceArgs,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Print the resolved configuration
    Resolve {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// Print one compiler, linker or archiver command line
    Command {
        #[command(flatten)]
        source: SourceArgs,

        #[command(subcommand)]
        step: Step,
    },

    /// Write the canonical, fully expanded arch file
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the SHA-256 fingerprint of the resolved configuration
    Fingerprint {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Parse an arch file and dump its syntax tree
    Parse {
        /// Path to an arch include file
        file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Pretty)]
        format: Format,
    },

    /// List built-in presets
    Presets,
}

#[derive(Subcommand, Debug)]
enum Step {
    /// Compile one source file
    Compile {
        /// Fortran source file
        file: String,

        /// Object file (default: source with .o extension)
        #[arg(short, long)]
        output: Option<String>,

        /// Directory for module files
        #[arg(long)]
        module_dir: Option<String>,
    },
    /// Link objects into an executable
    Link {
        /// Executable name
        #[arg(short, long)]
        output: String,

        /// Object files, in link order
        #[arg(required = true)]
        objects: Vec<String>,
    },
    /// Add objects to a static library
    Archive {
        archive: String,

        #[arg(required = true)]
        objects: Vec<String>,
    },
    /// Index a static library
    Ranlib { archive: String },
    /// Run the external C preprocessor
    Preprocess { file: String, output: String },
}

#[derive(ValueEnum, Clone, Debug)]
enum Format {
    Pretty,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Check {
            source,
            strict,
            format,
        } => cmd_check(&source, strict, format),
        Commands::Resolve { source, format } => cmd_resolve(&source, format),
        Commands::Command { source, step } => cmd_command(&source, step),
        Commands::Render { source, output } => cmd_render(&source, output.as_deref()),
        Commands::Fingerprint { source } => {
            println!("{}", source.load()?.fingerprint());
            Ok(())
        }
        Commands::Parse { file, format } => cmd_parse(&file, format),
        Commands::Presets => {
            for p in PRESETS {
                println!("{:<24} {}", p.name, p.description);
            }
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        LogConfig::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")
}

fn cmd_check(source: &SourceArgs, strict: bool, format: Format) -> Result<()> {
    let cfg = source.load()?;
    let report = CheckReport::new(&cfg);

    match format {
        Format::Pretty => {
            println!(
                "ok: {} (MPI {}, {})",
                report.platform, report.mpi, report.fingerprint
            );
            for w in &report.warnings {
                println!("warning: {}", w);
            }
            for n in &report.notes {
                println!("note: {}", n);
            }
        }
        Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if strict && !report.warnings.is_empty() {
        bail!(
            "{} warning(s) in {} with --strict",
            report.warnings.len(),
            report.platform
        );
    }
    Ok(())
}

fn cmd_resolve(source: &SourceArgs, format: Format) -> Result<()> {
    let cfg = source.load()?;
    match format {
        Format::Pretty => print!("{}", summary(&cfg)),
        Format::Json => println!("{}", serde_json::to_string_pretty(&cfg)?),
    }
    Ok(())
}

fn cmd_command(source: &SourceArgs, step: Step) -> Result<()> {
    let cfg = source.load()?;
    let argv = match step {
        Step::Compile {
            file,
            output,
            module_dir,
        } => {
            let object = output.unwrap_or_else(|| {
                Path::new(&file)
                    .with_extension("o")
                    .to_string_lossy()
                    .into_owned()
            });
            cfg.compile_args(&file, &object, module_dir.as_deref())
        }
        Step::Link { output, objects } => cfg.link_args(&objects, &output),
        Step::Archive { archive, objects } => cfg.archive_args(&archive, &objects),
        Step::Ranlib { archive } => cfg.ranlib_args(&archive),
        Step::Preprocess { file, output } => match cfg.preprocess_args(&file, &output) {
            Some(argv) => argv,
            None => bail!("{} has no external preprocessor (CPP)", cfg.platform().id()),
        },
    };
    println!("{}", shell_join(&argv));
    Ok(())
}

fn cmd_render(source: &SourceArgs, output: Option<&Path>) -> Result<()> {
    let text = source.load()?.render();
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write '{}'", path.display()))?,
        None => print!("{}", text),
    }
    Ok(())
}

fn cmd_parse(file: &Path, format: Format) -> Result<()> {
    let src = read_source(file)?;
    let parsed = parse_str(&file.display().to_string(), &src)?;
    match format {
        Format::Pretty => println!("{:#?}", parsed),
        Format::Json => println!("{}", serde_json::to_string_pretty(&parsed)?),
    }
    Ok(())
}

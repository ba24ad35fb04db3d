use color_print::cprintln;
use scbc::Target;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Source file
    source: PathBuf,

    /// Target ABI
    #[clap(short, long)]
    target: Option<Target>,

    /// Output assembly file
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Assemble and link into an executable
    #[clap(short, long)]
    compile: bool,

    /// YAML configuration file
    #[clap(long)]
    config: Option<PathBuf>,

    /// Print the generated assembly
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    target: Option<Target>,
    cc: Option<String>,
    cflags: Vec<String>,
    runtime: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("Failed to read {}: {1}", .0.display())]
    Read(PathBuf, std::io::Error),

    #[error("Failed to write {}: {1}", .0.display())]
    Write(PathBuf, std::io::Error),

    #[error("Invalid config {}: {1}", .0.display())]
    Config(PathBuf, serde_yaml::Error),

    #[error("Failed to run {0}: {1}")]
    Spawn(String, std::io::Error),

    #[error("{0} exited with {1}")]
    Toolchain(String, std::process::ExitStatus),

    #[error("Program uses the runtime but no runtime file is configured")]
    NoRuntime,
}

impl Config {
    fn load(path: &Path) -> Result<Self, DriverError> {
        let file =
            std::fs::File::open(path).map_err(|e| DriverError::Read(path.to_path_buf(), e))?;
        serde_yaml::from_reader(std::io::BufReader::new(file))
            .map_err(|e| DriverError::Config(path.to_path_buf(), e))
    }
}

fn main() {
    use clap::Parser;

    let args: Args = Args::parse();
    println!("SCB IR Compiler");

    if let Err(e) = run(&args) {
        cprintln!("<red,bold>error</>: {}", e);
        std::process::exit(1);
    }
}

/// Executable next to `source`; never the source itself.
fn exe_path(source: &Path, target: Target) -> PathBuf {
    let exe = source.with_extension(target.exe_suffix().trim_start_matches('.'));
    if exe == source {
        source.with_extension("out")
    } else {
        exe
    }
}

fn run(args: &Args) -> Result<(), DriverError> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let target = args.target.or(config.target).unwrap_or_default();

    println!("1. Read Source");
    println!("  < {}", args.source.display());
    let source = std::fs::read_to_string(&args.source)
        .map_err(|e| DriverError::Read(args.source.clone(), e))?;

    println!("2. Generate Assembly ({})", target);
    let output = match scbc::compile(&source, target) {
        Ok(output) => output,
        Err(e) => {
            e.print_diag(&args.source.display().to_string(), &source);
            std::process::exit(1);
        }
    };

    let asm_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.source.with_extension("s"));
    println!("  > {}", asm_path.display());
    std::fs::write(&asm_path, &output.asm).map_err(|e| DriverError::Write(asm_path.clone(), e))?;

    if args.verbose {
        for line in &output.listing {
            println!("{}", line.cformat());
        }
    }

    if args.compile {
        println!("3. Assemble & Link");
        let exe = exe_path(&args.source, target);
        let cc = config.cc.clone().unwrap_or_else(|| "gcc".to_string());
        let mut cmd = Command::new(&cc);
        cmd.args(&config.cflags).arg("-o").arg(&exe).arg(&asm_path);
        if output.runtime {
            let runtime = config.runtime.as_ref().ok_or(DriverError::NoRuntime)?;
            println!("  < {}", runtime.display());
            cmd.arg(runtime);
        }
        let status = cmd.status().map_err(|e| DriverError::Spawn(cc.clone(), e))?;
        if !status.success() {
            return Err(DriverError::Toolchain(cc, status));
        }
        println!("  > {}", exe.display());
        std::fs::remove_file(&asm_path).map_err(|e| DriverError::Write(asm_path.clone(), e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exe_next_to_source() {
        assert_eq!(exe_path(Path::new("hello.scb"), Target::Linux), Path::new("hello"));
        assert_eq!(
            exe_path(Path::new("hello.scb"), Target::Win64),
            Path::new("hello.exe")
        );
        assert_eq!(exe_path(Path::new("hello"), Target::Win64), Path::new("hello.exe"));
    }

    #[test]
    fn extensionless_source_not_overwritten() {
        let source = Path::new("dir/hello");
        let exe = exe_path(source, Target::Linux);
        assert_ne!(exe, source);
        assert_eq!(exe, Path::new("dir/hello.out"));
    }
}

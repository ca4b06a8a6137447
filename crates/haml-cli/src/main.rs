use clap::{Parser, Subcommand};
use haml_parser::{Compilation, CompileOptions};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "haml")]
#[command(about = "HAML template compiler: templates to JavaScript function bodies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct CompileArgs {
    /// Input .haml file
    path: String,

    /// Compile options as JSON, e.g. '{"tolerateFaults": true}'
    #[arg(long)]
    options: Option<String>,

    /// Report malformed lines and keep going instead of stopping at the first
    #[arg(long)]
    tolerate_faults: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a .haml file to a JavaScript function body
    Build {
        #[command(flatten)]
        args: CompileArgs,

        /// Output file (defaults to <name>.js next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a .haml file for errors without writing output
    Check {
        #[command(flatten)]
        args: CompileArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Build { args, output } => cmd_build(&args, output),
        Command::Check { args } => cmd_check(&args),
    }
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

/// Options from `--options`, with `--tolerate-faults` taking precedence.
fn resolve_options(args: &CompileArgs) -> Result<CompileOptions, serde_json::Error> {
    let mut options = match &args.options {
        Some(json) => serde_json::from_str(json)?,
        None => CompileOptions::default(),
    };
    if args.tolerate_faults {
        options.tolerate_faults = true;
    }
    Ok(options)
}

fn template_name(path: &str) -> &str {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("template")
}

/// Compile the file named in `args`, exiting on any error.
fn compile_file(args: &CompileArgs) -> Compilation {
    let options = match resolve_options(args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Invalid --options: {e}");
            std::process::exit(2);
        }
    };
    let source = read_source(&args.path);

    let compilation = match haml_codegen::compile_template(template_name(&args.path), &source, &options) {
        Ok(compilation) => compilation,
        Err(e) => {
            eprintln!("Parse error in {}: {e}", args.path);
            std::process::exit(1);
        }
    };

    for diagnostic in &compilation.diagnostics {
        eprintln!("Warning in {}: {diagnostic}", args.path);
    }
    compilation
}

fn cmd_build(args: &CompileArgs, output: Option<PathBuf>) {
    let compilation = compile_file(args);

    let out_path = output.unwrap_or_else(|| {
        let dir = Path::new(&args.path).parent().unwrap_or(Path::new("."));
        dir.join(format!("{}.js", template_name(&args.path)))
    });

    if let Err(e) = std::fs::write(&out_path, &compilation.code) {
        eprintln!("Error writing {}: {e}", out_path.display());
        std::process::exit(1);
    }

    eprintln!("Built: {}", out_path.display());
}

fn cmd_check(args: &CompileArgs) {
    let compilation = compile_file(args);

    if compilation.diagnostics.is_empty() {
        eprintln!("OK: {}", args.path);
    } else {
        eprintln!(
            "{}: {} problem(s) skipped",
            args.path,
            compilation.diagnostics.len()
        );
        std::process::exit(1);
    }
}

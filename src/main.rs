use std::path::PathBuf;

use clap::{CommandFactory, Parser as ClapParser, error::ErrorKind};
use colored::Colorize;
use tracing::{Level, info};

use yalcc::{
    CompileError,
    backend::codegen::{CodeGenerator, CodegenOptions},
    frontend::{
        parse_tree::{latex, pretty_print::pretty_print_tree},
        parser::Parser,
        token_stream::{TokenStream, UnknownUnitPolicy},
    },
};

#[derive(Debug, ClapParser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Token stream produced by the scanner
    input: PathBuf,

    /// Where to write the IR, defaults to the input with an `ll` extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export the parse tree as a LaTeX document
    #[arg(short = 't', long, value_name = "PATH")]
    write_tree: Option<PathBuf>,

    /// Print the parse tree to stdout
    #[arg(long)]
    print_tree: bool,

    /// Skip tokens with unknown lexical units instead of failing
    #[arg(long)]
    lenient_tokens: bool,

    /// Annotate the IR with source line comments
    #[arg(long)]
    annotate: bool,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    if !args.input.exists() {
        Args::command()
            .error(
                ErrorKind::InvalidValue,
                format!("Token file '{}' does not exist!", args.input.display()),
            )
            .exit()
    }

    if !args.input.is_file() {
        Args::command()
            .error(
                ErrorKind::InvalidValue,
                format!("Input path '{}' is not a file!", args.input.display()),
            )
            .exit()
    }

    if let Err(error) = run(&args) {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CompileError> {
    let policy = if args.lenient_tokens {
        UnknownUnitPolicy::Skip
    } else {
        UnknownUnitPolicy::Reject
    };

    let tokens = TokenStream::read(&args.input, policy)?;
    info!(count = tokens.len(), "read token stream");

    let tree = Parser::parse_program(tokens.symbols())?;

    if args.print_tree {
        pretty_print_tree(&tree);
    }

    if let Some(path) = &args.write_tree {
        latex::export(&tree, path)?;
        info!(path = %path.display(), "wrote parse tree");
    }

    let generator = CodeGenerator::new(CodegenOptions {
        annotate_source_lines: args.annotate,
    });
    let ir = generator.generate(&tree)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension("ll"));

    std::fs::write(&output, ir)?;
    info!(path = %output.display(), "wrote IR");

    Ok(())
}

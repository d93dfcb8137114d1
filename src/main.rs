//! SmallLang Interpreter
//!
//! A front end (table-driven DFA lexer, recursive-descent parser,
//! type-checking semantic analyzer) and a tree-walking evaluator for
//! the SmallLang toy language.

mod frontend;
mod interp;
mod scope;
mod utils;
mod xml;

use clap::{Parser, Subcommand};
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use frontend::ast::Program;
use frontend::lexer::Lexer;
use frontend::parser::Parser as SmallParser;
use frontend::semantic::Analyzer;
use interp::executor::Executor;
use xml::XmlWriter;

/// SmallLang Interpreter
#[derive(Parser, Debug)]
#[command(name = "smallc")]
#[command(version = "0.1.0")]
#[command(about = "SmallLang interpreter - lexes, checks and runs SmallLang programs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input source file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a source file
    Run {
        /// Input source file
        input: PathBuf,
    },
    /// Check a source file for errors without running it
    Check {
        /// Input source file
        input: PathBuf,
    },
    /// Print the program tree as XML
    Dump {
        /// Input source file
        input: PathBuf,

        /// Write the dump to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { input }) => run_file(&input),
        Some(Commands::Check { input }) => check_file(&input),
        Some(Commands::Dump { input, output }) => dump_file(&input, output),
        Some(Commands::Version) => {
            println!("smallc 0.1.0");
            println!("SmallLang interpreter");
            println!("License: Apache-2.0");
        }
        None => match cli.input {
            // Default: run the input file
            Some(input) => run_file(&input),
            None => {
                eprintln!("error: no input file specified");
                eprintln!("usage: smallc <FILE> or smallc run <FILE>");
                process::exit(1);
            }
        },
    }
}

fn read_source(input: &Path) -> String {
    match fs::read_to_string(input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error reading {}: {}", input.display(), e);
            process::exit(1);
        }
    }
}

fn parse_source(source: &str) -> Program {
    debug!("lexing and parsing");
    match SmallParser::new(Lexer::new(source)).parse_program() {
        Ok(program) => program,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn analyze_program(program: &Program) {
    debug!("semantic analysis");
    if let Err(e) = Analyzer::new().analyze(program) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run_file(input: &Path) {
    let source = read_source(input);
    let program = parse_source(&source);
    analyze_program(&program);

    debug!("executing");
    let stdout = io::stdout();
    if let Err(e) = Executor::new(stdout.lock()).execute(&program) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn check_file(input: &Path) {
    let source = read_source(input);
    let program = parse_source(&source);
    analyze_program(&program);
    println!("{}: ok", input.display());
}

fn dump_file(input: &Path, output: Option<PathBuf>) {
    let source = read_source(input);
    let program = parse_source(&source);

    let doc = XmlWriter::new().render(&program);
    match output {
        Some(path) => {
            if let Err(e) = fs::write(&path, doc) {
                eprintln!("error writing {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", doc),
    }
}

//! SMIL CLI and REPL
//!
//! Usage:
//!   smil run [-v] <file.smil> [inputs...]   - Execute a SMIL file
//!   smil repl                              - Start interactive REPL
//!   smil help                              - Show help message

use std::env;
use std::fs;
use std::io;
use std::process;
use std::sync::Once;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use smil::{Completion, Parser, VERSION, VM};

static TRACING_INIT: Once = Once::new();

/// Install the log subscriber. `RUST_LOG` wins over the verbose flag.
fn init_tracing(verbose: bool) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(if verbose { "smil=debug" } else { "warn" }));
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(io::stderr),
            )
            .with(filter)
            .init();
    });
}

struct RunOptions {
    verbose: bool,
    path: String,
    inputs: Vec<String>,
}

/// Flags come before the path; everything after it is a program input
fn parse_run_args(args: &[String]) -> Option<RunOptions> {
    let mut verbose = false;
    let mut rest = args.iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            path => {
                return Some(RunOptions {
                    verbose,
                    path: path.to_string(),
                    inputs: rest.cloned().collect(),
                })
            }
        }
    }
    None
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "run" => match parse_run_args(&args[2..]) {
            Some(options) => run_file(options),
            None => {
                eprintln!("{}: missing file argument", "error".red());
                eprintln!("Usage: smil run [-v] <file.smil> [inputs...]");
                process::exit(1);
            }
        },
        "repl" => run_repl(),
        "help" | "--help" | "-h" => print_help(),
        "version" | "--version" | "-V" => println!("SMIL {}", VERSION),
        first => {
            // Assume it's a file
            match parse_run_args(&args[1..]) {
                Some(options) if first.starts_with('-') || options.path.ends_with(".smil") => {
                    run_file(options)
                }
                _ => {
                    eprintln!("{}: unknown command '{}'", "error".red(), first);
                    print_help();
                    process::exit(1);
                }
            }
        }
    }
}

fn print_help() {
    println!("{}", "SMIL".cyan().bold());
    println!("A scripting language written in two-character sigils");
    println!("{} {}\n", "Version".cyan(), VERSION);
    println!("{}", "USAGE:".yellow());
    println!("  smil run [-v] <file.smil> [inputs...]   Execute a SMIL file");
    println!("  smil repl                              Start interactive REPL");
    println!("  smil help                              Show this help message");
    println!("  smil version                           Show version\n");
    println!("{}", "OPTIONS:".yellow());
    println!("  -v, --verbose   Log code generation and dump the bytecode");
    println!("  RUST_LOG=...    Override the log filter\n");
    println!("{}", "EXAMPLES:".yellow());
    println!("  smil run demos/hello.smil Ada");
    println!("  smil -v demos/countdown.smil 3\n");
    print_sigils();
}

fn print_sigils() {
    println!("{}", "LANGUAGE:".yellow());
    println!("  <3 ... </3           Program start / end (optional)");
    println!("  :( name :)           Variable, ;( name :) inverted");
    println!("  :( :( expr :) :)     Variable named by an expression");
    println!("  :$  :$:$  ...        First, second, ... program input");
    println!("  :(x:) := expr        Assignment");
    println!("  :+ :- :* :/ :% && || Operators (&& || bind tightest)");
    println!("  :P a b :D            Print");
    println!("  o/                   Hello, <first input>!");
    println!("  :^ expr  :v :(x:)  :@  Push, pop into x, clear the stack");
    println!("  8) c 8| ... 8( ... 8D  Loop while c > 0, else branch if never");
    println!("  :L expr              Length");
    println!("  :# text              Comment");
    println!("  :|  :X               No-op, exit");
}

fn run_file(options: RunOptions) {
    init_tracing(options.verbose);

    let source = match fs::read_to_string(&options.path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!(
                "{}: cannot read file '{}': {}",
                "error".red(),
                options.path,
                e
            );
            process::exit(1);
        }
    };

    let (program, chunk) = match smil::compile(&source) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprintln!("{}", e.with_source(&source));
            process::exit(1);
        }
    };

    if options.verbose {
        eprintln!("{}", "=== Program ===".dimmed());
        for stmt in &program.statements {
            eprintln!("{}", stmt);
        }
        eprintln!("{}", chunk.disassemble(&options.path).dimmed());
        eprintln!("{}", "=== Output ===".dimmed());
    }

    let mut vm = VM::new(io::stdout().lock());
    if let Err(e) = vm.bind_inputs(program.input_count, &options.inputs) {
        eprintln!("{}: {}", "error".red(), e);
        process::exit(1);
    }

    match vm.run(&chunk) {
        Ok(Completion::Finished) => {}
        Ok(Completion::Exit(code)) => process::exit(code),
        Err(e) => {
            eprintln!("{}", e.with_source(&source));
            process::exit(1);
        }
    }
}

fn run_repl() {
    init_tracing(false);

    println!(
        "{} {} - {}",
        "SMIL".cyan().bold(),
        VERSION.cyan(),
        "two characters at a time".dimmed()
    );
    println!(
        "Type {} to exit, {} for help\n",
        "exit".yellow(),
        "help".yellow()
    );

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("{}: cannot start REPL: {}", "error".red(), e);
            process::exit(1);
        }
    };

    // Variables and the evaluation stack persist across lines
    let mut vm = VM::new(io::stdout());

    loop {
        match rl.readline(&format!("{} ", "smil>".green().bold())) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                match line {
                    "exit" | "quit" => {
                        println!("{}", "Goodbye!".cyan());
                        break;
                    }
                    "help" => {
                        print_repl_help();
                        continue;
                    }
                    "clear" => {
                        vm = VM::new(io::stdout());
                        println!("{}", "State cleared.".dimmed());
                        continue;
                    }
                    _ => {}
                }

                let compiled = Parser::new(line).parse().and_then(|program| {
                    smil::compiler::Compiler::new().compile(&program)
                });
                let chunk = match compiled {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        eprintln!("{}", e.with_source(line).to_string().red());
                        continue;
                    }
                };

                match vm.run(&chunk) {
                    Ok(Completion::Finished) => {}
                    Ok(Completion::Exit(code)) => {
                        println!("{} {}", "exit".dimmed(), code);
                        break;
                    }
                    Err(e) => {
                        eprintln!("{}", e.with_source(line).to_string().red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".cyan());
                break;
            }
            Err(err) => {
                eprintln!("{}: {:?}", "error".red(), err);
                break;
            }
        }
    }
}

fn print_repl_help() {
    println!("{}", "REPL Commands:".yellow());
    println!("  exit, quit   Exit the REPL");
    println!("  clear        Forget all variables and the stack");
    println!("  help         Show this help\n");
    print_sigils();
}

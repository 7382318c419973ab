// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use clap::{Parser as ClapParser, Subcommand};
use relink::{CompileOptions, ParserKind, compile};
use relink_cli::{
    DiskLoader, LoadError, check_source, exit_with_compile_error, exit_with_parse_errors,
    print_check,
};
use tracing_subscriber::EnvFilter;

/// A live-binding ES module rewriter
#[derive(Debug, ClapParser)] // requires `derive` feature
#[command(name = "relink")]
#[command(about = "A live-binding ES module rewriter", long_about = None)]
struct Cli {
    /// Enables debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parses a file and logs out the module tree
    Parse {
        /// The path of the file to parse
        path: String,
        #[arg(long, default_value_t)]
        parser: ParserKind,
    },

    /// Compiles a file and prints the rewritten code
    Compile {
        /// The path of the file to compile
        path: String,
        #[arg(long, default_value_t)]
        parser: ParserKind,
        /// Name of the runtime object the emitted code calls into
        #[arg(long, default_value = "module")]
        alias: String,
        /// Also print the rewritten module tree
        #[arg(long)]
        ast: bool,
    },

    /// Compiles files with every parser and reports differences
    Check {
        /// The files to check
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Loads an entry module and its relative imports and prints the order
    /// in which their bodies run
    Order {
        /// The entry module
        entry: String,
        /// Directory module ids are relative to. Defaults to the entry's
        /// directory
        #[arg(long)]
        root: Option<String>,
        #[arg(long, default_value_t)]
        parser: ParserKind,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("relink=debug,relink_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    init_logging(args.verbose);

    match args.command {
        Command::Parse { path, parser } => {
            let file = std::fs::read_to_string(&path)?;
            match parser.parse_fn()(&file) {
                Ok(tree) => println!("{tree:#?}"),
                Err(failure) => exit_with_parse_errors(failure.diagnostics, &path, &file),
            }
        }
        Command::Compile {
            path,
            parser,
            alias,
            ast,
        } => {
            let file = std::fs::read_to_string(&path)?;
            let options = CompileOptions {
                ast,
                parse: parser.parse_fn(),
                runtime_alias: alias,
                resolver: None,
            };
            match compile(&file, &options) {
                Ok(output) => {
                    print!("{}", output.code);
                    if let Some(tree) = output.ast {
                        println!("{tree:#?}");
                    }
                }
                Err(error) => exit_with_compile_error(error, &path, &file),
            }
        }
        Command::Check { paths } => {
            let mut failed = false;
            for path in paths {
                let file = std::fs::read_to_string(&path)?;
                let outcome = check_source(&file);
                failed |= !outcome.is_ok();
                print_check(&path, &outcome);
            }
            if failed {
                std::process::exit(1);
            }
        }
        Command::Order {
            entry,
            root,
            parser,
        } => {
            let entry_path = PathBuf::from(&entry);
            let root = match root {
                Some(root) => PathBuf::from(root),
                None => entry_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            };
            let root = std::fs::canonicalize(&root).unwrap_or(root);
            let entry_path = std::fs::canonicalize(&entry_path).unwrap_or(entry_path);
            let loader = DiskLoader::new(root, parser.parse_fn());
            let mut loaded = match loader.load(&entry_path) {
                Ok(loaded) => loaded,
                Err(LoadError::Parse {
                    path,
                    source_text,
                    failure,
                }) => exit_with_parse_errors(
                    failure.diagnostics,
                    &path.to_string_lossy(),
                    &source_text,
                ),
                Err(error) => return Err(error.into()),
            };
            for id in loaded.execution_order()? {
                println!("{id}");
            }
            for id in &loaded.external {
                println!("{id} (external)");
            }
        }
    }
    Ok(())
}

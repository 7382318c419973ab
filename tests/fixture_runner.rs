// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use clap::Parser as ClapParser;
use rayon::iter::{ParallelBridge, ParallelIterator};
use relink::{CompileError, CompileOptions, ParserKind, compile};
use serde::{Deserialize, Serialize};
use std::{
    cell::RefCell,
    collections::HashMap,
    fs::{File, read_dir, read_to_string},
    num::NonZeroUsize,
    path::{Path, PathBuf, absolute},
};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum FixtureExpectation {
    /// Both parser adapters compile the fixture to the same code, and
    /// compiling that code again reproduces it.
    Pass,
    /// Only the oxc adapter parses the fixture.
    LiteRejected,
    /// The adapters disagree.
    Mismatch,
    /// Compiling the recompiled output changed it.
    Unstable,
    /// The fixture does not compile.
    Error,
}

fn is_fixture_file(file_name: &str) -> bool {
    file_name.ends_with(".js") || file_name.ends_with(".mjs")
}

fn compile_with(kind: ParserKind, source: &str) -> Result<String, CompileError> {
    let options = CompileOptions {
        parse: kind.parse_fn(),
        ..Default::default()
    };
    compile(source, &options).map(|output| output.code)
}

fn run_fixture(path: &Path) -> FixtureExpectation {
    let Ok(source) = read_to_string(path) else {
        return FixtureExpectation::Error;
    };
    let oxc = match compile_with(ParserKind::Oxc, &source) {
        Ok(code) => code,
        Err(_) => return FixtureExpectation::Error,
    };
    match compile_with(ParserKind::Lite, &source) {
        Ok(lite) if lite != oxc => return FixtureExpectation::Mismatch,
        Ok(_) => {}
        Err(CompileError::Parse(_)) => return FixtureExpectation::LiteRejected,
        Err(_) => return FixtureExpectation::Mismatch,
    }
    for kind in ParserKind::ALL {
        if compile_with(kind, &oxc).ok().as_ref() != Some(&oxc) {
            return FixtureExpectation::Unstable;
        }
    }
    FixtureExpectation::Pass
}

#[derive(Debug, Default)]
struct RunnerState {
    unexpected_results: HashMap<PathBuf, FixtureExpectation>,
    num_fixtures_run: usize,
    num_fixtures_pass: usize,
}

thread_local! {
    static RUNNER_STATE: RefCell<RunnerState> = Default::default();
}

#[derive(Debug)]
struct FixtureRunner {
    fixtures_base: PathBuf,
    expectations: HashMap<PathBuf, FixtureExpectation>,
    verbose: bool,
}

impl FixtureRunner {
    fn run(&self, num_threads: Option<NonZeroUsize>) -> RunnerState {
        let thread_pool = {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(num_threads) = num_threads {
                builder = builder.num_threads(num_threads.get());
            };
            builder.use_current_thread().build().unwrap()
        };

        thread_pool.install(|| {
            self.walk_dir(&self.fixtures_base);
        });

        // Get the runner state for each thread, and merge them together.
        thread_pool
            .broadcast(|_| RUNNER_STATE.take())
            .into_iter()
            .reduce(|mut acc, el| {
                acc.num_fixtures_run += el.num_fixtures_run;
                acc.num_fixtures_pass += el.num_fixtures_pass;
                acc.unexpected_results.extend(el.unexpected_results);
                acc
            })
            .unwrap()
    }

    fn walk_dir(&self, path: &Path) {
        // Iterate through every entry in this directory in parallel.
        read_dir(path).unwrap().par_bridge().for_each(|entry| {
            let entry = entry.unwrap();
            let file_type = entry.file_type().unwrap();
            if file_type.is_dir() {
                self.walk_dir(&entry.path());
            } else if file_type.is_file()
                && entry.file_name().to_str().is_some_and(is_fixture_file)
            {
                self.run_fixture(&entry.path());
            }
        })
    }

    fn run_fixture(&self, path: &Path) {
        let result = run_fixture(path);
        let relpath = path.strip_prefix(&self.fixtures_base).unwrap();
        if self.verbose {
            println!("{result:?}: {}", relpath.display());
        }

        RUNNER_STATE.with_borrow_mut(|state| {
            state.num_fixtures_run += 1;
            if result == FixtureExpectation::Pass {
                state.num_fixtures_pass += 1;
            }
        });

        let expectation = self
            .expectations
            .get(relpath)
            .copied()
            .unwrap_or(FixtureExpectation::Pass);

        if result != expectation {
            // Expectation keys use forward slashes on every platform.
            let output_path = PathBuf::from(relpath.to_string_lossy().replace('\\', "/"));
            RUNNER_STATE
                .with_borrow_mut(|state| state.unexpected_results.insert(output_path, result));
        }
    }
}

#[derive(Debug, ClapParser)]
#[command(name = "fixtures")]
#[command(about = "Compiles module fixtures with every relink parser adapter.", long_about = None)]
struct Cli {
    #[arg(short = 'j', long)]
    num_threads: Option<NonZeroUsize>,

    /// Updates the expectations file with the results of the run.
    #[arg(short, long)]
    update: bool,

    /// Prints the result of every fixture.
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding the fixtures. Defaults to the relink crate's
    /// fixtures.
    fixtures: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    // We're expecting this binary to always be run in the same machine at
    // the same time as the repo checkout exists.
    let runner_base_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let fixtures_base = absolute(
        cli.fixtures
            .unwrap_or_else(|| runner_base_path.join("../relink/tests/fixtures")),
    )
    .unwrap();

    let expectation_path = runner_base_path.join("expectations.json");
    let expectations: HashMap<PathBuf, FixtureExpectation> = match File::open(&expectation_path) {
        Ok(file) => {
            let read_result = serde_json::from_reader(&file);
            if cli.update && read_result.is_err() {
                // Failed to parse JSON, but it's okay since we're updating
                // the expectations file anyway.
                Default::default()
            } else {
                read_result.unwrap()
            }
        }
        Err(_) if cli.update => Default::default(),
        Err(error) => panic!("cannot open {}: {error}", expectation_path.display()),
    };

    let runner = FixtureRunner {
        fixtures_base,
        expectations,
        verbose: cli.verbose,
    };
    let run_result = runner.run(cli.num_threads);

    if run_result.num_fixtures_run == 0 {
        println!("No fixtures found.");
        std::process::exit(1);
    }
    println!(
        "{} of {} fixtures pass",
        run_result.num_fixtures_pass, run_result.num_fixtures_run
    );

    if run_result.unexpected_results.is_empty() {
        println!("No unexpected fixture results");
    } else if !cli.update {
        println!(
            "Found {} unexpected fixture results:",
            run_result.unexpected_results.len()
        );
        for (path, result) in &run_result.unexpected_results {
            let expectation = runner
                .expectations
                .get(path)
                .copied()
                .unwrap_or(FixtureExpectation::Pass);
            println!("\t{path:?} -- Expected {expectation:?}, got {result:?}",);
        }
        std::process::exit(1);
    } else {
        println!(
            "Updating the expectations file with {} unexpected fixture results.",
            run_result.unexpected_results.len()
        );

        let mut expectations = runner.expectations;
        for (path, result) in run_result.unexpected_results {
            if result == FixtureExpectation::Pass {
                expectations.remove(&path);
            } else {
                expectations.insert(path, result);
            }
        }

        // We convert to a JSON value first because that way the paths are
        // ordered alphabetically.
        let json = serde_json::to_value(expectations).unwrap();
        let mut file = File::create(expectation_path).unwrap();
        serde_json::to_writer_pretty(&mut file, &json).unwrap();
    }
}

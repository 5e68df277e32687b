// Copyright (c) 2019-2021 The pisim developers

//! The pisim command line front end.

#[macro_use]
extern crate clap;
#[macro_use]
extern crate log;

use anyhow::{bail, Context, Result};
use clap::Arg;
use pisim::pass::DeadRefElim;
use pisim::sim::{ByteSource, Engine, State};
use pisim::write::Writer;
use pisim::{parser, source, Lexer, Proc};
use std::fs::File;
use std::io::{self, BufWriter, Cursor, Read};
use std::path::PathBuf;

fn main() -> Result<()> {
    let matches = app_from_crate!()
        .about("Runs programs written in a small pi-calculus process language.")
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .multiple(true)
                .help(HELP_VERBOSITY.lines().next().unwrap())
                .long_help(HELP_VERBOSITY),
        )
        .arg(
            Arg::with_name("INPUT")
                .help("Source files to run")
                .required(true)
                .multiple(true),
        )
        .arg(
            Arg::with_name("stdin")
                .long("stdin")
                .value_name("STRING")
                .takes_value(true)
                .help("Replace standard input with a literal string"),
        )
        .arg(
            Arg::with_name("stdin_add")
                .long("stdin_add")
                .value_name("STRING")
                .takes_value(true)
                .conflicts_with("stdin")
                .help("Append a literal string to real standard input"),
        )
        .arg(
            Arg::with_name("write_core")
                .long("write_core")
                .value_name("PATH")
                .takes_value(true)
                .help("Write the unoptimized core tree to a file"),
        )
        .arg(
            Arg::with_name("write_opt_core")
                .long("write_opt_core")
                .value_name("PATH")
                .takes_value(true)
                .help("Write the optimized core tree to a file"),
        )
        .arg(
            Arg::with_name("no-opt")
                .long("no-opt")
                .help("Run the unoptimized tree"),
        )
        .arg(
            Arg::with_name("max-cycles")
                .short("N")
                .long("max_cycles")
                .value_name("N")
                .takes_value(true)
                .help("Stop after a fixed number of delivery cycles"),
        )
        .arg(
            Arg::with_name("time-phases")
                .short("t")
                .long("time")
                .help("Print execution time statistics per phase"),
        )
        .get_matches();

    // Configure the logger.
    let verbose = std::cmp::max(1, matches.occurrences_of("verbosity") as usize) - 1;
    let quiet = !matches.is_present("verbosity");
    stderrlog::new()
        .module("pisim")
        .quiet(quiet)
        .verbosity(verbose)
        .init()
        .unwrap();

    let mut times = vec![];
    let tinit = time::precise_time_ns();

    // Tokenize the closure of the given files.
    let t0 = time::precise_time_ns();
    let lexer = Lexer::new();
    let paths: Vec<PathBuf> = matches
        .values_of("INPUT")
        .unwrap()
        .map(PathBuf::from)
        .collect();
    let tokens = source::load_program(&lexer, &paths)?;
    let t1 = time::precise_time_ns();
    times.push(("tokenize", t1 - t0));

    // Parse.
    let t0 = time::precise_time_ns();
    let (procs, errors) = parser::parse(&tokens);
    if !errors.is_empty() {
        eprint!("{}", errors);
        bail!("terminated because the input contains {} errors", errors.len());
    }
    let t1 = time::precise_time_ns();
    times.push(("parse", t1 - t0));

    if let Some(path) = matches.value_of("write_core") {
        dump(path, &procs)?;
    }

    // Optimize.
    let t0 = time::precise_time_ns();
    let optimized = DeadRefElim::run(&procs);
    let t1 = time::precise_time_ns();
    times.push(("optimize", t1 - t0));

    if let Some(path) = matches.value_of("write_opt_core") {
        dump(path, &optimized)?;
    }

    let program: &[Proc] = if matches.is_present("no-opt") {
        info!("running the unoptimized tree");
        &procs
    } else {
        &optimized
    };

    // Assemble the input source and run.
    let t0 = time::precise_time_ns();
    let stdin = io::stdin();
    let mut input: Box<dyn ByteSource> = match (
        matches.value_of("stdin"),
        matches.value_of("stdin_add"),
    ) {
        (Some(literal), _) => Box::new(Cursor::new(literal.as_bytes().to_vec())),
        (None, Some(literal)) => Box::new(
            stdin
                .lock()
                .chain(Cursor::new(literal.as_bytes().to_vec())),
        ),
        (None, None) => Box::new(stdin.lock()),
    };
    let max_cycles = match matches.value_of("max-cycles") {
        Some(n) => Some(n.parse::<u64>().context("invalid --max_cycles value")?),
        None => None,
    };
    let mut output = io::stdout();
    let mut debug = io::stderr();
    let mut state = State::new(program);
    Engine::new(&mut state, &mut *input, &mut output, &mut debug)
        .run_until(max_cycles)
        .context("run failed")?;
    let t1 = time::precise_time_ns();
    times.push(("run", t1 - t0));
    times.push(("total", time::precise_time_ns() - tinit));

    if matches.is_present("time-phases") {
        eprintln!("Execution Time Statistics:");
        for (name, ns) in times {
            eprintln!("  {:10} {:8.3} ms", format!("{}:", name), ns as f64 * 1.0e-6);
        }
    }

    Ok(())
}

fn dump(path: &str, procs: &[Proc]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path))?;
    let mut writer = Writer::new(BufWriter::new(file));
    writer
        .write_procs(procs)
        .with_context(|| format!("failed to write {}", path))?;
    Ok(())
}

static HELP_VERBOSITY: &str = "Increase message verbosity

This option can be specified multiple times to increase the level of \
verbosity in the output:

-v      Only print errors
-vv     Also print warnings
-vvv    Also print info messages
-vvvv   Also print debug messages
-vvvvv  Also print detailed tracing messages
";

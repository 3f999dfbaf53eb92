use std::sync::atomic::Ordering;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::eyre;

use flowcheck::block::{Block, CmpOp, Condition};
use flowcheck::program::Program;
use flowcheck::search::Search;
use flowcheck::thread::Thread;

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Scenario {
    /// Two writers and a reader of shared `x`: the printed value depends on scheduling.
    Race,
    /// Two threads print the same constant from private variables.
    Independent,
    /// One thread reads from the input stream, another prints a constant.
    Reader,
    /// A thread spinning on a flag nobody sets: only the timeout ends the search.
    Spin,
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Program to check.
    #[arg(value_enum, default_value = "race")]
    scenario: Scenario,

    /// Depth bound for coverage statistics.
    #[clap(long, value_name = "INT", default_value = "10")]
    k: usize,

    /// Stop the search after this many milliseconds.
    #[clap(long, value_name = "MS", default_value = "1000")]
    timeout_ms: u64,

    /// Log level (off, error, warn, info, debug, trace).
    #[clap(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

fn race() -> color_eyre::Result<(Program, Vec<i64>, Vec<u32>)> {
    let mut program = Program::new("racy writers");
    program.declare_variable("x");
    for (id, tmp) in [(1, "t1"), (2, "t2")] {
        program.declare_variable(tmp);
        program.add_thread(Thread::from_blocks(
            id,
            [
                Block::start(0, 1),
                Block::assign_var(1, tmp, "x", 2),
                Block::decision(2, Condition::new(tmp, CmpOp::Eq, 0), 3, 4),
                Block::assign_const(3, "x", 1, 5),
                Block::assign_const(4, "x", 2, 5),
                Block::end(5),
            ],
        )?)?;
    }
    program.add_thread(Thread::from_blocks(
        3,
        [Block::start(0, 1), Block::print(1, "x", 2), Block::end(2)],
    )?)?;
    Ok((program, vec![], vec![2]))
}

fn independent() -> color_eyre::Result<(Program, Vec<i64>, Vec<u32>)> {
    let mut program = Program::new("independent printers");
    for (id, var) in [(1, "a"), (2, "b")] {
        program.declare_variable(var);
        program.add_thread(Thread::from_blocks(
            id,
            [
                Block::start(0, 1),
                Block::assign_const(1, var, 42, 2),
                Block::print(2, var, 3),
                Block::end(3),
            ],
        )?)?;
    }
    Ok((program, vec![], vec![42, 42]))
}

fn reader() -> color_eyre::Result<(Program, Vec<i64>, Vec<u32>)> {
    let mut program = Program::new("reader");
    program.declare_variable("x");
    program.declare_variable("c");
    program.add_thread(Thread::from_blocks(
        1,
        [
            Block::start(0, 1),
            Block::input(1, "x", 2),
            Block::print(2, "x", 3),
            Block::end(3),
        ],
    )?)?;
    program.add_thread(Thread::from_blocks(
        2,
        [
            Block::start(0, 1),
            Block::assign_const(1, "c", 7, 2),
            Block::print(2, "c", 3),
            Block::end(3),
        ],
    )?)?;
    Ok((program, vec![5], vec![5, 7]))
}

fn spin() -> color_eyre::Result<(Program, Vec<i64>, Vec<u32>)> {
    let mut program = Program::new("spin");
    program.declare_variable("f");
    program.add_thread(Thread::from_blocks(
        1,
        [
            Block::start(0, 1),
            Block::decision(1, Condition::new("f", CmpOp::Eq, 1), 2, 1),
            Block::end(2),
        ],
    )?)?;
    Ok((program, vec![], vec![]))
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();
    let log_level: simplelog::LevelFilter = args
        .log_level
        .parse()
        .map_err(|_| eyre!("invalid log level '{}'", args.log_level))?;

    simplelog::TermLogger::init(
        log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();
    println!("args = {:?}", args);

    let (program, input, expected) = match args.scenario {
        Scenario::Race => race()?,
        Scenario::Independent => independent()?,
        Scenario::Reader => reader()?,
        Scenario::Spin => spin()?,
    };

    if let Err(errors) = program.validate() {
        for e in &errors {
            eprintln!("{}", e);
        }
        return Err(eyre!("program '{}' has {} validation errors", program.name(), errors.len()));
    }

    println!("Program '{}':", program.name());
    for thread in program.threads() {
        println!("  {}:", thread.name());
        for block in thread.blocks() {
            println!("    {}", block);
        }
    }
    println!("input = {:?}, expected = {:?}", input, expected);

    let mut search = Search::new(&program, input, expected);

    let flag = search.stop_flag();
    let timeout = Duration::from_millis(args.timeout_ms);
    std::thread::spawn(move || {
        std::thread::sleep(timeout);
        flag.store(true, Ordering::Relaxed);
    });

    let outcome = search.run();
    println!("Outcome: {}", outcome);
    println!(
        "explored {} states, visited {}",
        search.explored_count(),
        search.visited_count()
    );
    if let Some(cex) = search.counterexample() {
        println!("{}", cex);
    }

    println!("{}", search.coverage(args.k));
    println!(
        "schedules of length <= {}: {}",
        args.k,
        search.schedules_up_to_k(args.k)
    );

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}

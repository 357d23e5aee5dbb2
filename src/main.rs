// SPDX-License-Identifier: BSD-3-Clause
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Error, Result};
use clap::Parser;

use tracing_flame::FlameLayer;
use tracing_subscriber::{fmt, prelude::*};

use ptflow::analysis::{andersen, parallel, steensgaard};
use ptflow::{print, Module};

mod cli;

fn setup_global_subscriber() -> impl Drop {
    let filter_layer = tracing::level_filters::LevelFilter::TRACE;
    let fmt_layer = fmt::Layer::default();
    let (flame_layer, _guard) = FlameLayer::with_file("./tracing.folded").unwrap();
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(flame_layer)
        .init();
    _guard
}

fn load(path: &Path) -> Result<llvm_ir::Module> {
    let loaded = if path.extension().is_some_and(|e| e == "ll") {
        llvm_ir::Module::from_ir_path(path)
    } else {
        llvm_ir::Module::from_bc_path(path)
    };
    loaded
        .map_err(Error::msg)
        .with_context(|| format!("Couldn't parse LLVM module at {}", path.display()))
}

fn main() -> Result<()> {
    let args = cli::Args::parse();

    let _guard = if args.tracing {
        Some(setup_global_subscriber())
    } else {
        None
    };

    let llvm_module = load(&args.module)?;
    let module = Module::from_llvm(&llvm_module).context("Malformed LLVM module")?;

    let mut stdout = io::stdout().lock();
    match args.analysis {
        cli::Mode::Intra => writeln!(stdout, "Intra-procedural Andersen analysis")?,
        cli::Mode::Inter => writeln!(stdout, "Inter-procedural Andersen analysis")?,
        cli::Mode::Steensgaard => writeln!(stdout, "Steensgaard's analysis")?,
        cli::Mode::Parallel => writeln!(stdout, "Intra-procedural Andersen analysis")?,
    }
    writeln!(stdout, "{} function(s)", module.num_functions())?;

    let start = Instant::now();
    match args.analysis {
        cli::Mode::Intra => run_intra(&mut stdout, &args, &module)?,
        cli::Mode::Inter => run_inter(&mut stdout, &args, &module)?,
        cli::Mode::Steensgaard => run_steensgaard(&mut stdout, &args, &module)?,
        cli::Mode::Parallel => run_parallel(&mut stdout, &args, &module)?,
    }
    writeln!(stdout, "Analysis time: {} us", start.elapsed().as_micros())?;

    Ok(())
}

fn run_intra(out: &mut impl Write, args: &cli::Args, module: &Module) -> Result<()> {
    let mut csv = if args.csv {
        let mut path = args.module.clone().into_os_string();
        path.push(".csv");
        let path = PathBuf::from(path);
        let file =
            File::create(&path).with_context(|| format!("Couldn't create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "name,size,inum,time(us)")?;
        Some(writer)
    } else {
        None
    };
    let runs = args.runs.max(1);

    for (f, function) in module.functions() {
        let fstart = Instant::now();
        let mut analysis = andersen::intra_function(module, f);
        let mut elapsed_us = fstart.elapsed().as_micros();

        if let Some(csv) = &mut csv {
            for _ in 1..runs {
                let fstart = Instant::now();
                analysis = andersen::intra_function(module, f);
                elapsed_us += fstart.elapsed().as_micros();
            }
            writeln!(
                csv,
                "{},{},{},{}",
                function.name,
                function.size(),
                function.instruction_count(),
                elapsed_us / u128::from(runs)
            )?;
        }

        if args.print_results {
            writeln!(out)?;
            writeln!(out, "Function: {}", function.name)?;
            print::andersen(out, module, &analysis)?;
            writeln!(out, "******************************** {}", function.name)?;
        }
    }
    if let Some(csv) = &mut csv {
        csv.flush()?;
    }
    Ok(())
}

fn run_inter(out: &mut impl Write, args: &cli::Args, module: &Module) -> Result<()> {
    match andersen::inter(module) {
        None => writeln!(out, "Cannot find main function.")?,
        Some(analysis) => {
            if args.print_results {
                print::andersen(out, module, &analysis)?;
            }
        }
    }
    Ok(())
}

fn run_steensgaard(out: &mut impl Write, args: &cli::Args, module: &Module) -> Result<()> {
    let classes = steensgaard::analyze(module);
    if args.print_results {
        print::steensgaard(out, module, &classes)?;
    }
    Ok(())
}

fn run_parallel(out: &mut impl Write, args: &cli::Args, module: &Module) -> Result<()> {
    writeln!(out, "Concurrent mode ({} threads)", args.threads)?;
    let (results, stats) = parallel::analyze(module, args.threads, args.stats);

    if args.print_results {
        for (f, analysis) in &results {
            writeln!(out)?;
            writeln!(out, "Function: {}", module.function(*f).name)?;
            print::andersen(out, module, analysis)?;
        }
    }

    for s in &stats {
        writeln!(out)?;
        writeln!(out, "Worker {}\ttime:\t{} ms", s.worker, s.elapsed.as_millis())?;
        writeln!(
            out,
            "Max task time:\t{} ms with\t{} BBs",
            s.max_task_time.as_millis(),
            s.max_task_size
        )?;
        writeln!(out, "Tasks processed:\t{}", s.tasks)?;
        writeln!(
            out,
            "Task size mean:\t{:.1}, var:\t{:.1}, std dev:\t{:.1}",
            s.size.mean(),
            s.size.variance(),
            s.size.stddev()
        )?;
        writeln!(
            out,
            "Task time mean:\t{:.1} us, var:\t{:.1}, std dev:\t{:.1}",
            s.time.mean(),
            s.time.variance(),
            s.time.stddev()
        )?;
    }
    Ok(())
}

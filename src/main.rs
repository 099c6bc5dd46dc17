//! corestat - Measure per-core CPU utilization and track the cores
//! assigned to processes.
//!
//! Samples `/proc/stat` and `/proc/<pid>/stat` on a fixed interval and
//! renders the results as a stdout table and/or CSV files, until
//! interrupted.

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(not(target_os = "linux"))]
use corestat::collector::mock::MockFs;
#[cfg(target_os = "linux")]
use corestat::collector::RealFs;
use corestat::collector::{FileSystem, ProcReader};
use corestat::consumer::{CpuUtilCsvWriter, CsvSettings, ProcessCsvWriter, Table, TableSettings};
use corestat::runner::{Runner, StopToken};
use corestat::sampler::{CpuSampler, ProcessSampler};
use corestat::settings::Settings;

/// Measure CPU utilization and track threads cores.
#[derive(Parser)]
#[command(
    name = "corestat",
    about = "Measure CPU utilization and track process core assignment",
    version
)]
struct Args {
    /// Interval between measurements in milliseconds.
    #[arg(short, long, default_value = "1000")]
    interval: u64,

    /// Do not record CPU stats.
    #[arg(long)]
    no_cpu: bool,

    /// Track CPUs assigned to the process or thread with this PID.
    /// May be given multiple times.
    #[arg(short, long = "pid", value_name = "PID")]
    pid: Vec<i32>,

    /// Track all processes present, rediscovered every interval.
    #[arg(short = 'a', long)]
    all_pids: bool,

    /// Base name for CSV files where to record results
    /// (<BASE>_cpus.csv and <BASE>_pids.csv).
    #[arg(short, long, value_name = "BASE")]
    file: Option<String>,

    /// CSV file name to record CPU stats (overrides --file).
    #[arg(long, value_name = "PATH")]
    cpu_file: Option<PathBuf>,

    /// CSV file name to record PID stats (overrides --file).
    #[arg(long, value_name = "PATH")]
    pid_file: Option<PathBuf>,

    /// Field delimiter for the CSV files.
    #[arg(short, long, default_value = ";")]
    delim: char,

    /// Record utilization as a fraction in [0,1] instead of a percentage.
    #[arg(long)]
    normalize: bool,

    /// Skip CSV header rows and the table heading.
    #[arg(long)]
    no_header: bool,

    /// Path to the proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber. Logs go to stderr so they never
/// interleave with the table on stdout.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("corestat={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Builds the core-facing settings from parsed flags.
fn settings_from_args(args: &Args) -> Settings {
    let mut settings = Settings {
        interval_ms: args.interval,
        use_cpu_stats: !args.no_cpu,
        pids: args.pid.clone(),
        track_all: args.all_pids,
        delim: args.delim,
        write_header: !args.no_header,
        normalize: args.normalize,
        ..Settings::default()
    };
    if let Some(base) = &args.file
        && !base.is_empty()
    {
        settings.cpu_csv = Some(PathBuf::from(format!("{}_cpus.csv", base)));
        settings.pid_csv = Some(PathBuf::from(format!("{}_pids.csv", base)));
    }
    if let Some(path) = &args.cpu_file {
        settings.cpu_csv = Some(path.clone());
    }
    if let Some(path) = &args.pid_file {
        settings.pid_csv = Some(path.clone());
    }
    settings
}

/// Creates samplers and consumers per the settings, binds them together
/// and runs the loop until `stop` is set.
fn build_and_run<F>(fs: F, settings: &Settings, proc_path: &str, stop: &StopToken)
where
    F: FileSystem + Clone + 'static,
{
    let num_cpus = ProcReader::new(fs.clone(), proc_path).count_cpu_cores();
    if num_cpus == 0 {
        warn!("no cpu cores discovered under {}", proc_path);
    }
    let track_pids = settings.track_processes();

    let table = Rc::new(RefCell::new(Table::new(
        TableSettings {
            show_heading: settings.write_header,
            show_divider: settings.write_header,
            show_outer_delims: true,
            show_cpu_stats: settings.use_cpu_stats,
            show_pid_stats: track_pids,
            delim: '|',
            num_cpus,
            normalize_cpu_util: settings.normalize,
        },
        io::stdout(),
    )));

    let mut runner = Runner::new();
    runner.add_consumer(table.clone());

    if settings.use_cpu_stats {
        let mut cpu_sampler = CpuSampler::new(ProcReader::new(fs.clone(), proc_path));
        cpu_sampler.add_identity_acceptor(table.clone());
        cpu_sampler.add_util_acceptor(table.clone());
        if let Some(path) = &settings.cpu_csv {
            info!("recording CPU stats to {}", path.display());
            let writer = Rc::new(RefCell::new(CpuUtilCsvWriter::new(
                CsvSettings {
                    path: path.clone(),
                    delim: settings.delim,
                    write_header: settings.write_header,
                },
                num_cpus,
                settings.normalize,
            )));
            runner.add_consumer(writer.clone());
            cpu_sampler.add_util_acceptor(writer);
        }
        runner.add_sampler(Box::new(cpu_sampler));
    }

    if track_pids {
        let mut pid_sampler = ProcessSampler::new(ProcReader::new(fs, proc_path));
        pid_sampler.set_track_all(settings.track_all);
        for &pid in &settings.pids {
            pid_sampler.add_pid(pid);
        }
        pid_sampler.add_acceptor(table.clone());
        if let Some(path) = &settings.pid_csv {
            info!("recording PID stats to {}", path.display());
            let writer = Rc::new(RefCell::new(ProcessCsvWriter::new(CsvSettings {
                path: path.clone(),
                delim: settings.delim,
                write_header: settings.write_header,
            })));
            runner.add_consumer(writer.clone());
            pid_sampler.add_acceptor(writer);
        }
        runner.add_sampler(Box::new(pid_sampler));
    }

    runner.run(Duration::from_millis(settings.interval_ms), stop);
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let settings = settings_from_args(&args);
    if let Err(e) = settings.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("corestat {} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "Config: interval={}ms, cpu_stats={}, pids={:?}, all_pids={}",
        settings.interval_ms, settings.use_cpu_stats, settings.pids, settings.track_all
    );

    let stop = StopToken::new();
    let handler_token = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_token.stop();
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    #[cfg(target_os = "linux")]
    let fs = RealFs::new();
    #[cfg(not(target_os = "linux"))]
    let fs = MockFs::two_core_system();

    build_and_run(fs, &settings, &args.proc_path, &stop);
}

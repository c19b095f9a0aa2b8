mod cli;
mod config;
mod csv_sink;
mod run;

use clap::Parser;
use cli::Cli;
use config::SchedulerConfig;
use csv_sink::CsvEventSink;
use elastisim_driver::Scheduler;
use elastisim_transport::UnixSocketTransport;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = match SchedulerConfig::load(cli.config.as_deref(), &cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("elastisim-scheduler: {e}");
            std::process::exit(1);
        }
    };

    if config.wait_for_input {
        eprintln!("Press Enter to begin scheduling...");
        let mut discard = String::new();
        let _ = std::io::stdin().read_line(&mut discard);
    }

    let mut scheduler = Scheduler::new(config.variant.0.build());
    let variant_name = scheduler.variant().name;

    let result = match &cli.replay {
        Some(path) => run_replay(&mut scheduler, &config, path),
        None => run_scheduler(&mut scheduler, &config),
    };

    if let Err(e) = result {
        eprintln!("\nScheduler Error for {variant_name}");
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}

fn run_scheduler(scheduler: &mut Scheduler, config: &SchedulerConfig) -> anyhow::Result<()> {
    let mut sink = CsvEventSink::create(&config.event_log)?;
    let mut transport = UnixSocketTransport::bind_and_accept(&config.transport_url)?;
    info!(url = %config.transport_url, "accepted simulator connection");
    run::run(scheduler, &mut transport, &mut sink)
}

fn run_replay(scheduler: &mut Scheduler, config: &SchedulerConfig, path: &std::path::Path) -> anyhow::Result<()> {
    let mut sink = CsvEventSink::create(&config.event_log)?;
    info!(path = %path.display(), "replaying recorded requests");
    run::run_replay(scheduler, path, &mut sink)
}

/// Level is set only by `--debug`, never by an environment variable
/// (spec.md §6 "No environment variables" applies to the scheduler's own
/// configuration, which this ambient logging knob is not an instance of;
/// we still avoid reading `RUST_LOG` to stay unambiguous).
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .init();
}

use std::path::Path;

use elastisim_core::{Cluster, EventSink};
use elastisim_driver::Scheduler;
use elastisim_transport::{InMemoryTransport, Reply, Request, Transport};
use tracing::{error, info};

/// Drives `transport` to completion against `scheduler`, one tick per
/// request, writing events to `sink` (spec.md §4.6, §6). Returns `Ok(())`
/// on a clean disconnect; an error carries the scheduler-name-prefixed
/// message the caller should print before exiting non-zero.
pub fn run(
    scheduler: &mut Scheduler,
    transport: &mut dyn Transport,
    sink: &mut dyn EventSink,
) -> anyhow::Result<()> {
    loop {
        let Some(request) = transport.recv_request()? else {
            info!("simulator disconnected");
            return Ok(());
        };

        let time = request.system.time;
        let mut cluster = Cluster::new(request.jobs, request.nodes);

        scheduler.tick(&mut cluster, time, sink).map_err(|e| {
            error!(%e, "scheduler tick failed");
            anyhow::anyhow!("{e}")
        })?;

        let (jobs, nodes) = cluster.into_parts();
        transport.send_reply(&Reply { jobs, nodes })?;
    }
}

/// Debug entry point for `--replay`: reads `path` as newline-delimited JSON
/// `{jobs, nodes, system}` requests, drives `scheduler` over an
/// [`InMemoryTransport`] instead of the real IPC channel, and prints each
/// reply as a JSON line on stdout.
pub fn run_replay(scheduler: &mut Scheduler, path: &Path, sink: &mut dyn EventSink) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)?;
    let requests: Vec<Request> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;

    let mut transport = InMemoryTransport::new(requests);
    run(scheduler, &mut transport, sink)?;

    for reply in &transport.replies {
        println!("{}", serde_json::to_string(reply)?);
    }
    Ok(())
}

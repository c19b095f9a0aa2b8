use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use elastisim_core::{EventKind, EventSink, EventSubject, NodeId};
use tracing::warn;

/// Writes the scheduling event trace to a CSV file, header
/// `Time,Event,Jobs,Nodes`, one row per event, matching the original's CSV
/// event log exactly (spec.md §6). Node lists render as `N<id>` space-joined.
///
/// A write failure is a "Logging I/O failure" (spec.md §7): non-fatal, the
/// tick's scheduling decision stands regardless, so failures are logged via
/// `tracing::warn!` rather than returned.
pub struct CsvEventSink {
    writer: Option<BufWriter<File>>,
}

impl CsvEventSink {
    pub fn create(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let is_new = !path.exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        if is_new {
            writeln!(writer, "Time,Event,Jobs,Nodes")?;
        }
        Ok(Self { writer: Some(writer) })
    }

    fn render_nodes(nodes: &[NodeId]) -> String {
        nodes.iter().map(NodeId::to_string).collect::<Vec<_>>().join(" ")
    }

    fn try_record(&mut self, time: f64, kind: EventKind, subject: EventSubject, nodes: &[NodeId]) -> std::io::Result<()> {
        let writer = self.writer.as_mut().expect("writer only taken on drop");
        writeln!(writer, "{time},{},{subject},{}", kind.as_str(), Self::render_nodes(nodes))?;
        writer.flush()
    }
}

impl EventSink for CsvEventSink {
    fn record(&mut self, time: f64, kind: EventKind, subject: EventSubject, nodes: &[NodeId]) {
        if let Err(e) = self.try_record(time, kind, subject, nodes) {
            warn!(error = %e, "failed to write event log row");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elastisim_core::JobId;

    #[test]
    fn writes_header_once_and_renders_node_lists() {
        let dir = tempdir();
        let path = dir.join("event.csv");

        let mut sink = CsvEventSink::create(&path).unwrap();
        sink.record(1.0, EventKind::Start, EventSubject::Job(JobId(3)), &[NodeId(0), NodeId(1)]);
        drop(sink);

        let mut sink2 = CsvEventSink::create(&path).unwrap();
        sink2.record(2.0, EventKind::Stop, EventSubject::Job(JobId(3)), &[]);
        drop(sink2);

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "Time,Event,Jobs,Nodes");
        assert_eq!(lines[1], "1,START,J3,N0 N1");
        assert_eq!(lines[2], "2,STOP,J3,");
        fs::remove_dir_all(dir).ok();
    }

    fn tempdir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("elastisim-csv-sink-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}

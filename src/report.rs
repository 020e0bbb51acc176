use bucketeer_transfer::relocate::Relocation;
use bucketeer_transfer::upload::{UploadEvent, UploadSummary};
use std::io::{self, Write};

/// Renders upload events as plain lines, one per file, followed by a summary.
pub struct Report<W> {
    out: W,
    summary: UploadSummary,
    dry_run: bool,
    planned: u64,
}
impl<W: Write> Report<W> {
    /// A dry-run report ends with the number of planned uploads instead of
    /// upload totals.
    pub fn new(out: W, dry_run: bool) -> Self {
        Self {
            out,
            summary: UploadSummary::default(),
            dry_run,
            planned: 0,
        }
    }

    pub fn event(&mut self, event: &UploadEvent) -> io::Result<()> {
        match event {
            UploadEvent::Uploaded(outcome) => {
                self.summary.record(outcome);
                writeln!(self.out, "{outcome}")
            },
            UploadEvent::Planned { key, .. } => {
                self.planned += 1;
                writeln!(self.out, "Would upload: {key}")
            },
            UploadEvent::Relocated(Relocation::Failed { path, error }) => {
                writeln!(self.out, "Uploaded but not moved: {}: {}", path.display(), **error)
            },
            UploadEvent::Started
            | UploadEvent::DiscoveryComplete(_)
            | UploadEvent::Relocated(Relocation::Moved { .. })
            | UploadEvent::Complete => Ok(()),
        }
    }

    /// Writes the summary line and returns the totals.
    pub fn finish(mut self) -> io::Result<UploadSummary> {
        if self.dry_run {
            writeln!(self.out, "{} planned", self.planned)?;
        } else {
            writeln!(self.out, "{}", self.summary)?;
        }
        self.out.flush()?;
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bucketeer_storage::error::ErrorKind as StorageErrorKind;
    use bucketeer_storage::{PutReceipt, UploadKey};
    use bucketeer_transfer::upload::UploadOutcome;
    use std::path::PathBuf;

    fn key(relative: &str) -> UploadKey {
        UploadKey::derive("out/", relative).unwrap()
    }

    fn render(events: &[UploadEvent], dry_run: bool) -> (String, UploadSummary) {
        let mut buffer = Vec::new();
        let mut report = Report::new(&mut buffer, dry_run);
        for event in events {
            report.event(event).unwrap();
        }
        let summary = report.finish().unwrap();
        (String::from_utf8(buffer).unwrap(), summary)
    }

    #[test]
    fn test_outcomes_and_summary() {
        let events = [
            UploadEvent::Started,
            UploadEvent::DiscoveryComplete(2),
            UploadEvent::Uploaded(UploadOutcome::Uploaded {
                path: PathBuf::from("x.txt"),
                receipt: PutReceipt::new(key("x.txt"), 5),
            }),
            UploadEvent::Uploaded(UploadOutcome::Failed {
                path: PathBuf::from("sub/y.txt"),
                key: key("sub/y.txt"),
                error: exn::Exn::from(StorageErrorKind::Network("simulated connection error".to_string())),
            }),
            UploadEvent::Complete,
        ];
        let (output, summary) = render(&events, false);
        assert_eq!(
            output,
            "Uploaded: out/x.txt\n\
             Failed upload for out/sub/y.txt: network error: simulated connection error\n\
             1 uploaded, 1 failed, 5 bytes\n"
        );
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn test_dry_run() {
        let events = [
            UploadEvent::Planned {
                path: PathBuf::from("x.txt"),
                key: key("x.txt"),
            },
            UploadEvent::Complete,
        ];
        let (output, summary) = render(&events, true);
        assert_eq!(output, "Would upload: out/x.txt\n1 planned\n");
        assert_eq!(summary.total(), 0);
    }

    #[test]
    fn test_dry_run_of_empty_tree() {
        let events = [UploadEvent::Started, UploadEvent::DiscoveryComplete(0), UploadEvent::Complete];
        assert_eq!(render(&events, true).0, "0 planned\n");
        assert_eq!(render(&events, false).0, "0 uploaded, 0 failed, 0 bytes\n");
    }
}

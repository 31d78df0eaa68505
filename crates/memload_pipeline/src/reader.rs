//! File reader pool (component C3): one thread per input file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::SyncSender;

use flate2::read::GzDecoder;
use tracing::{error, info, warn};

/// Decompress `path` and send every trimmed line to `line_tx`, tagged with
/// its file-local 0-based line number. Never panics: open/decoder failures
/// and mid-stream decode errors are logged and simply end this file's
/// contribution to the pipeline.
pub fn read_file(path: &Path, line_tx: SyncSender<(u64, String)>) {
    info!(file = %path.display(), "reading file");

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            error!(file = %path.display(), error = %err, "failed to open file");
            return;
        }
    };

    let decoder = GzDecoder::new(file);
    let mut reader = BufReader::new(decoder);
    let mut line_num: u64 = 0;
    let mut buf = String::new();

    loop {
        buf.clear();
        match reader.read_line(&mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let trimmed = buf.trim_end_matches(['\r', '\n']).trim_matches(' ').to_string();
                if line_tx.send((line_num, trimmed)).is_err() {
                    // Receivers gone (supervisor shutting down); stop quietly.
                    return;
                }
                line_num += 1;
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, line_num, "decode error, stopping file");
                break;
            }
        }
    }

    info!(file = %path.display(), lines = line_num, "finished reading file");
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::sync::mpsc::sync_channel;
    use tempfile::NamedTempFile;

    fn gzip_fixture(contents: &str) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        let mut encoder = GzEncoder::new(file.reopen().unwrap(), Compression::default());
        encoder.write_all(contents.as_bytes()).unwrap();
        encoder.finish().unwrap();
        file
    }

    #[test]
    fn emits_trimmed_lines_with_file_local_numbers() {
        let fixture = gzip_fixture("  idfa\tA\t1.0\t2.0\t1  \ngaid\tB\t3.0\t4.0\t2,3\n");
        let (tx, rx) = sync_channel(16);
        read_file(fixture.path(), tx);

        let lines: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            lines,
            vec![
                (0, "idfa\tA\t1.0\t2.0\t1".to_string()),
                (1, "gaid\tB\t3.0\t4.0\t2,3".to_string()),
            ]
        );
    }

    #[test]
    fn empty_lines_are_still_emitted() {
        let fixture = gzip_fixture("idfa\tA\t1.0\t2.0\t1\n\n");
        let (tx, rx) = sync_channel(16);
        read_file(fixture.path(), tx);
        let lines: Vec<_> = rx.try_iter().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].1, "");
    }

    #[test]
    fn missing_file_emits_nothing_and_does_not_panic() {
        let (tx, rx) = sync_channel(16);
        read_file(Path::new("/nonexistent/path/does-not-exist.tsv.gz"), tx);
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn non_gzip_input_stops_without_panicking() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not actually gzip data").unwrap();
        let (tx, rx) = sync_channel(16);
        read_file(file.path(), tx);
        assert_eq!(rx.try_iter().count(), 0);
    }
}

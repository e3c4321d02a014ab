use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Destination of a computed feed-in series.
#[derive(Debug)]
pub enum FeedinOutput {
    /// Writes one `<result key>_feedin.csv` file per run into the directory.
    Directory(PathBuf),
    /// Discards everything; runs the pipeline for its side effects and errors
    /// only.
    Sink,
}

impl FeedinOutput {
    pub fn writer(&self, result_key: &str) -> anyhow::Result<Box<dyn Write>> {
        Ok(match self {
            Self::Directory(directory) => Box::new(BufWriter::new(File::create(
                directory.join(format!("{result_key}_feedin.csv")),
            )?)),
            Self::Sink => Box::new(io::sink()),
        })
    }

    /// Whether writing the series can be skipped entirely.
    pub fn is_sink(&self) -> bool {
        matches!(self, Self::Sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn sink_accepts_and_discards_writes() {
        let output = FeedinOutput::Sink;
        assert!(output.is_sink());
        let mut writer = output.writer("ignored").unwrap();
        writer.write_all(b"discarded").unwrap();
    }

    #[test]
    fn directory_output_names_the_file_after_the_result_key() {
        let directory = std::env::temp_dir().join("feedin-output-test");
        fs::create_dir_all(&directory).unwrap();
        let output = FeedinOutput::Directory(directory.clone());
        assert!(!output.is_sink());
        {
            let mut writer = output.writer("pv").unwrap();
            writer.write_all(b"timestamp,feedin [W]\n").unwrap();
        }
        let written = fs::read_to_string(directory.join("pv_feedin.csv")).unwrap();
        assert!(written.starts_with("timestamp"));
    }
}

extern crate feedin;

use clap::Parser;
use feedin::output::FeedinOutput;
use feedin::run_feedin;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Parser, Default, Debug)]
#[clap(author, version, about, long_about = None)]
struct FeedinArgs {
    /// JSON file describing the plant and an optional scaling.
    input_file: String,
    /// Weather CSV file with a `# key: value` metadata header.
    weather_file: String,
    /// Directory the feed-in CSV is written to.
    #[arg(long, short, default_value = ".")]
    output_directory: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = FeedinArgs::parse();

    let input_file = args.input_file.as_str();
    let input_file_ext = Path::new(input_file).extension().and_then(OsStr::to_str);
    let input_file_stem = match input_file_ext {
        Some(ext) => &input_file[..(input_file.len() - ext.len() - 1)],
        None => input_file,
    };
    let result_key = Path::new(input_file_stem)
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("feedin");

    let output = FeedinOutput::Directory(args.output_directory);

    run_feedin(
        BufReader::new(File::open(Path::new(input_file))?),
        BufReader::new(File::open(Path::new(args.weather_file.as_str()))?),
        result_key,
        &output,
    )
}

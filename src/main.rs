use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use clap::Parser;
use color_eyre::eyre::WrapErr;
use tracing::{error, info, info_span, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};
use crate::record::Record;
use crate::source::SourceFormat;

mod record;
mod source;
mod utils;

/// Merge postal addresses from XML, TSV and plain-text files into one JSON array sorted by zip code
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// input files, `.xml`, `.tsv` and `.txt` are understood; others are skipped
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// where to write the merged records
    #[arg(short, long, env = "ADDRESS_MERGE_OUTPUT", default_value = "output.json")]
    output: PathBuf,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };
    init_tracing();

    match color_eyre::install().and_then(|_| run(cli)) {
        Err(e) => {
            let message = fatal_message(&e);
            error!("{message}");
            // stderr regardless of RUST_LOG
            eprintln!("{message}");
            std::process::exit(1);
        }
        _ => {}
    }
}

fn fatal_message(e: &color_eyre::Report) -> String {
    format!("Error: {:?}", e)
}

/// log to stderr, filtered by `RUST_LOG` (`info` when unset)
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .init();
}

fn run(cli: Cli) -> color_eyre::Result<()> {
    let records = collect_records(&cli.files)?;
    info!("finished parsing, got [{}] records in total", records.len());

    info!("saving records to [{}]", cli.output.display());
    save_records(records, &cli.output)
}

/// parse every supported file in order, stopping at the first one that fails
fn collect_records(paths: &[PathBuf]) -> color_eyre::Result<Vec<Record>> {
    let mut records = Vec::new();
    for (idx, path) in paths.iter().enumerate() {
        let _span = info_span!("source", path = %path.display()).entered();

        let Some(format) = SourceFormat::from_path(path) else {
            warn!("unsupported file format for [{}], skipping", path.display());
            continue;
        };
        info!("[{}/{}] parsing {:?} file...", idx + 1, paths.len(), format);
        let parsed = format.parse(path)
            .wrap_err_with(|| format!("error processing [{}]", path.display()))?;
        info!("got [{}] records", parsed.len());
        records.extend(parsed);
    }
    Ok(records)
}

/// sort the records by zip and write them as a pretty-printed JSON array
fn save_records(mut records: Vec<Record>, save_path: impl AsRef<Path>) -> color_eyre::Result<()> {
    record::sort_records(&mut records);
    if let Some(parent) = save_path.as_ref().parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = BufWriter::new(File::create(save_path)?);
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use serde_json::{json, Value};
    use super::*;

    const XML: &str = "<EXPORT><ENT><NAME>Ann Lee</NAME><COMPANY/><STREET>5 Peach St</STREET>\
                       <CITY>Atlanta</CITY><STATE>GA</STATE><POSTAL_CODE>30301</POSTAL_CODE></ENT></EXPORT>";
    const TSV: &str = "first\tmiddle\tlast\torganization\taddress\tcity\tstate\tcounty\tzip\tzip4\n\
                       \t\t\tEmpire Holdings\t350 5th Ave\tNew York\tNY\t\t10001\t0001\n";
    const TXT: &str = "Bob Stone\n9 Palm Dr\nBeverly Hills, CA 90210\n";

    fn write_inputs(dir: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
        files.iter()
            .map(|(name, content)| {
                let path = dir.join(name);
                fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    fn merge(paths: &[PathBuf], output: &Path) -> color_eyre::Result<Value> {
        save_records(collect_records(paths)?, output)?;
        Ok(serde_json::from_str(&fs::read_to_string(output)?)?)
    }

    fn zips(value: &Value) -> Vec<&str> {
        value.as_array().unwrap()
            .iter()
            .map(|record| record["zip"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn merges_all_formats_sorted_by_zip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), &[("a.xml", XML), ("b.tsv", TSV), ("c.txt", TXT)]);
        let output = dir.path().join("output.json");

        let merged = merge(&paths, &output).unwrap();
        assert_eq!(zips(&merged), ["10001-0001", "30301", "90210"]);
        assert_eq!(merged[0]["organization"], json!("Empire Holdings"));
        assert_eq!(merged[1]["name"], json!("Ann Lee"));
        for record in merged.as_array().unwrap() {
            let object = record.as_object().unwrap();
            assert!(object.contains_key("name") ^ object.contains_key("organization"));
        }
    }

    #[test]
    fn output_is_indented_with_two_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), &[("c.txt", TXT)]);
        let output = dir.path().join("output.json");
        merge(&paths, &output).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("[\n  {\n    \"name\": \"Bob Stone\",\n"));
    }

    #[test]
    fn equal_zips_keep_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), &[
            ("first.txt", "Zed Last\n1 A St\nX, CA 90210\n\nAmy First\n2 B St\nY, CA 10001"),
            ("second.txt", "Mid Person\n3 C St\nZ, CA 90210"),
        ]);
        let merged = merge(&paths, &dir.path().join("out.json")).unwrap();
        let names = merged.as_array().unwrap()
            .iter()
            .map(|record| record["name"].as_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Amy First", "Zed Last", "Mid Person"]);
    }

    #[test]
    fn unsupported_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), &[
            ("a.xml", XML),
            ("extra.csv", "name,zip\nCarl,00001\n"),
            ("c.txt", TXT),
        ]);
        let merged = merge(&paths, &dir.path().join("output.json")).unwrap();
        assert_eq!(zips(&merged), ["30301", "90210"]);
    }

    #[test]
    fn empty_inputs_contribute_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), &[
            ("a.xml", "<EXPORT/>"),
            ("b.tsv", "first\tmiddle\tlast\torganization\taddress\tcity\tstate\tcounty\tzip\tzip4\n"),
            ("c.txt", ""),
        ]);
        let merged = merge(&paths, &dir.path().join("output.json")).unwrap();
        assert_eq!(merged, json!([]));
    }

    #[test]
    fn failing_file_aborts_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), &[
            ("a.xml", XML),
            ("broken.txt", "Bob Stone\n9 Palm Dr"),
        ]);
        let output = dir.path().join("output.json");

        let err = merge(&paths, &output).unwrap_err();
        assert!(format!("{err:?}").contains("broken.txt"));
        assert!(!output.exists());
    }

    #[test]
    fn fatal_message_names_failing_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), &[("broken.tsv", "organization\taddress\nAcme\t1 Main\n")]);

        let err = collect_records(&paths).unwrap_err();
        let message = fatal_message(&err);
        assert!(message.starts_with("Error: error processing ["));
        assert!(message.contains("broken.tsv"));
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_inputs(dir.path(), &[("c.txt", TXT)]);
        let output = dir.path().join("result").join("output.json");
        merge(&paths, &output).unwrap();
        assert!(output.exists());
    }

    #[test]
    fn requires_at_least_one_file() {
        assert!(Cli::try_parse_from(["address-merge"]).is_err());

        let cli = Cli::try_parse_from(["address-merge", "a.xml", "-o", "out/merged.json"]).unwrap();
        assert_eq!(cli.files, [PathBuf::from("a.xml")]);
        assert_eq!(cli.output, PathBuf::from("out/merged.json"));
    }
}

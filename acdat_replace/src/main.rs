use std::error::Error;
use std::fs::File;
use std::io::{prelude::*, stdin, stdout, BufReader, BufWriter};
use std::path::PathBuf;
use std::time::Instant;

use acdat::{Bytewise, Charwise, Replacer};
use clap::Parser;
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "acdat_replace",
    about = "A program to replace dictionary words in text."
)]
struct Args {
    /// Dictionary file of `key<TAB>value` lines
    #[arg(long)]
    dict: PathBuf,

    /// Input file. Standard input is used if omitted
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output file. Standard output is used if omitted
    #[arg(long)]
    output: Option<PathBuf>,

    /// Matches raw bytes instead of Unicode code points
    #[arg(long)]
    bytewise: bool,
}

#[derive(Deserialize)]
struct DictRecord {
    key: String,
    #[serde(default)]
    value: String,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("ACDAT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Reads tab-separated entries, skipping rows with an empty key.
fn load_dict<R>(rdr: R) -> Result<Vec<(String, String)>, csv::Error>
where
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(rdr);
    let mut dict = vec![];
    for (i, result) in rdr.deserialize().enumerate() {
        let record: DictRecord = result?;
        if record.key.is_empty() {
            warn!(line = i + 1, "skipped an entry with an empty key");
            continue;
        }
        dict.push((record.key, record.value));
    }
    Ok(dict)
}

/// Rewrites every line with `replace`, keeping line breaks as they are.
///
/// Returns the number of input bytes.
fn replace_lines<R, W, F>(
    mut rdr: R,
    mut wtr: W,
    mut replace: F,
) -> Result<usize, Box<dyn Error>>
where
    R: BufRead,
    W: Write,
    F: FnMut(&[u8], &mut Vec<u8>) -> Result<(), Box<dyn Error>>,
{
    let mut line = vec![];
    let mut buf = vec![];
    let mut n_bytes = 0;
    loop {
        line.clear();
        if rdr.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        n_bytes += line.len();
        buf.clear();
        replace(&line, &mut buf)?;
        wtr.write_all(&buf)?;
    }
    wtr.flush()?;
    Ok(n_bytes)
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let args = Args::parse();

    info!(path = %args.dict.display(), "loading dictionary");
    let dict = load_dict(File::open(&args.dict)?)?;
    info!(num_entries = dict.len(), "loaded dictionary");

    let rdr: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(stdin().lock()),
    };
    let wtr: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(stdout().lock())),
    };

    let start = Instant::now();
    let n_bytes = if args.bytewise {
        let replacer = Replacer::<Bytewise>::new(dict)?;
        info!(num_entries = replacer.num_entries(), "built bytewise automaton");
        replace_lines(rdr, wtr, |line, buf| {
            replacer.replace_into(line, buf);
            Ok(())
        })?
    } else {
        let replacer = Replacer::<Charwise>::new(dict)?;
        info!(num_entries = replacer.num_entries(), "built charwise automaton");
        replace_lines(rdr, wtr, |line, buf| {
            replacer.replace_into(std::str::from_utf8(line)?, buf);
            Ok(())
        })?
    };
    let duration = start.elapsed();
    info!(
        elapsed_sec = duration.as_secs_f64(),
        mb_per_sec = n_bytes as f64 / 1_000_000.0 / duration.as_secs_f64(),
        "finished replacement"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_charwise(dict: &str, input: &str) -> String {
        let replacer = Replacer::<Charwise>::new(load_dict(dict.as_bytes()).unwrap()).unwrap();
        let mut output = vec![];
        replace_lines(input.as_bytes(), &mut output, |line, buf| {
            replacer.replace_into(std::str::from_utf8(line)?, buf);
            Ok(())
        })
        .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_load_dict() {
        let dict = load_dict("東京\tTokyo\n\"a\"\tquoted\nnovalue\n\tempty\n".as_bytes()).unwrap();
        assert_eq!(
            vec![
                ("東京".to_string(), "Tokyo".to_string()),
                ("\"a\"".to_string(), "quoted".to_string()),
                ("novalue".to_string(), String::new()),
            ],
            dict
        );
    }

    #[test]
    fn test_replace_lines_keeps_line_breaks() {
        let output = run_charwise("ab\tX\nabc\tY\n", "abc ab\n\nxabcab\r\nab");
        assert_eq!("Y X\n\nxYX\r\nX", output);
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let output = run_charwise("猫\tcat\n猫\tneko\n", "猫と猫\n");
        assert_eq!("catとcat\n", output);
    }

    #[test]
    fn test_replace_lines_bytewise() {
        let dict = load_dict("é\te\n".as_bytes()).unwrap();
        let replacer = Replacer::<Bytewise>::new(dict).unwrap();
        let mut output = vec![];
        let n_bytes = replace_lines(&b"caf\xc3\xa9 \xff\n"[..], &mut output, |line, buf| {
            replacer.replace_into(line, buf);
            Ok(())
        })
        .unwrap();
        assert_eq!(8, n_bytes);
        assert_eq!(b"cafe \xff\n".to_vec(), output);
    }

    #[test]
    fn test_replace_lines_invalid_utf8() {
        let replacer = Replacer::<Charwise>::new([("a", "b")]).unwrap();
        let result = replace_lines(&b"a\xff\n"[..], vec![], |line, buf| {
            replacer.replace_into(std::str::from_utf8(line)?, buf);
            Ok(())
        });
        assert!(result.is_err());
    }
}

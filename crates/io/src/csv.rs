// CSV/TSV import/export

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::table::{Cell, Table};

/// Import a delimited text file, dropping `skip_lines` physical lines first.
///
/// Lines are counted before CSV parsing, so blank lines in a report preamble
/// count toward the skip. The delimiter is sniffed from what remains.
pub fn import(path: &Path, skip_lines: usize) -> Result<Table, String> {
    let content = read_file_as_utf8(path)?;
    let body = skip_physical_lines(&content, skip_lines);
    let delimiter = sniff_delimiter(&body);
    import_from_string(&body, delimiter)
        .map_err(|e| format!("{}: {}", path.display(), e))
}

fn skip_physical_lines(content: &str, n: usize) -> String {
    if n == 0 {
        return content.to_string();
    }
    content.split_inclusive('\n').skip(n).collect()
}

/// Rows after the header consulted when sniffing.
const SNIFF_ROWS: usize = 10;

/// Field delimiter for a body whose first non-blank line is the header row.
///
/// A candidate must split the header into more than one field. Among those,
/// the one whose header width is reproduced by the most following rows wins,
/// then the wider header. Comma when nothing splits the header.
fn sniff_delimiter(body: &str) -> u8 {
    // Ties go to the last candidate
    const CANDIDATES: [u8; 4] = [b'|', b';', b'\t', b','];

    let mut lines = body.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        return b',';
    };
    let sample: Vec<&str> = lines.take(SNIFF_ROWS).collect();

    CANDIDATES
        .into_iter()
        .filter_map(|delim| {
            let width = field_count(header, delim);
            (width > 1).then(|| {
                let agreeing = sample.iter().filter(|l| field_count(l, delim) == width).count();
                ((agreeing, width), delim)
            })
        })
        .max_by_key(|(score, _)| *score)
        .map_or(b',', |(_, delim)| delim)
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map_or(1, |r| r.len())
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = fs::File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            let bytes = e.into_bytes();
            // Carrier portals export Windows-1252
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match content.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => content,
    })
}

fn import_from_string(content: &str, delimiter: u8) -> Result<Table, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        let row: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    Ok(Table::new(rows))
}

/// Write a header row plus records to `path`.
///
/// The file is written to a hidden sibling first and renamed into place, so
/// a failed write never leaves a truncated artifact at `path`.
pub fn export<I, R>(path: &Path, headers: &[&str], records: I) -> Result<(), String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let tmp = temp_sibling(path);
    let written = write_records(&tmp, headers, records);
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        format!("{}: {}", path.display(), e)
    })
}

fn write_records<I, R>(path: &Path, headers: &[&str], records: I) -> Result<(), String>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    writer.write_record(headers).map_err(|e| e.to_string())?;
    for record in records {
        writer.write_record(record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

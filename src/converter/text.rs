//! Plain-text source parser.
//!
//! One entry per line, `#` starts a comment. Accepted entry forms:
//!
//! ```text
//! 1.0.0.0/24 AU                  # CIDR block, whitespace, payload
//! 1.0.1.0-1.0.3.255 CN           # address range, whitespace, payload
//! "1.0.4.0","1.0.7.255","AU"     # CSV range dump
//! ```

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::cidr::parse_ip;
use crate::{Cidr, Error, Record, Result};

/// Gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Text source parser producing records with string payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextParser {
    strict: bool,
}

impl TextParser {
    /// Create a lenient parser: malformed lines are logged and skipped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail on the first malformed line instead of skipping it.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Parse a file, transparently decompressing gzip content.
    ///
    /// Gzip is detected by its magic bytes, not the file name. Concatenated
    /// gzip members are all decoded.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Record<String>>> {
        let mut reader = BufReader::new(File::open(path)?);
        let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

        log::debug!("Parsing {:?} (gzip: {})", path, is_gzip);
        if is_gzip {
            self.parse(MultiGzDecoder::new(reader))
        } else {
            self.parse(reader)
        }
    }

    /// Parse records from a reader.
    pub fn parse<R: Read>(&self, reader: R) -> Result<Vec<Record<String>>> {
        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (index, line) in BufReader::new(reader).lines().enumerate() {
            let line = line?;

            // Remove comments
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => &line,
            };
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match parse_entry(line) {
                Some(parsed) => records.extend(parsed),
                None if self.strict => {
                    return Err(Error::InvalidLine {
                        line: index + 1,
                        content: line.to_string(),
                    });
                }
                None => {
                    log::warn!("Skipping invalid entry at line {}: {}", index + 1, line);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            log::info!("Skipped {} invalid entries", skipped);
        }
        Ok(records)
    }
}

/// Parse one non-empty, comment-free entry.
fn parse_entry(line: &str) -> Option<Vec<Record<String>>> {
    if line.contains(',') {
        if let Some(records) = parse_csv(line) {
            return Some(records);
        }
    }

    let (block, payload) = line.split_once(char::is_whitespace)?;
    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    if let Some((low, high)) = block.split_once('-') {
        let low = parse_ip(low).ok()?;
        let high = parse_ip(high).ok()?;
        return Some(Record::from_range(low, high, payload.to_string()));
    }

    let cidr: Cidr = block.parse().ok()?;
    Some(vec![Record::new(cidr, payload.to_string())])
}

/// `low,high,payload` with optional double quotes around each field.
fn parse_csv(line: &str) -> Option<Vec<Record<String>>> {
    let mut fields = line.splitn(3, ',').map(|f| f.trim().trim_matches('"').trim());
    let low = parse_ip(fields.next()?).ok()?;
    let high = parse_ip(fields.next()?).ok()?;
    let payload = fields.next()?;
    if payload.is_empty() {
        return None;
    }
    Some(Record::from_range(low, high, payload.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn lines(records: &[Record<String>]) -> Vec<String> {
        records.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_parse_text_entries() {
        let text = r#"
# Comment
1.0.0.0/24 AU
1.0.1.0-1.0.3.255 CN   # trailing comment

"1.0.4.0","1.0.7.255","AU"
"#;

        let records = TextParser::new().parse(text.as_bytes()).unwrap();
        assert_eq!(
            lines(&records),
            [
                "1.0.0.0/24 (AU)",
                "1.0.1.0/24 (CN)",
                "1.0.2.0/23 (CN)",
                "1.0.4.0/22 (AU)",
            ]
        );
    }

    #[test]
    fn test_payload_with_spaces() {
        let records = TextParser::new()
            .parse("8.8.8.0/24 United States".as_bytes())
            .unwrap();
        assert_eq!(records[0].payload(), "United States");
    }

    #[test]
    fn test_payload_with_comma() {
        let records = TextParser::new()
            .parse("1.11.0.0/16 Korea, Republic of".as_bytes())
            .unwrap();
        assert_eq!(lines(&records), ["1.11.0.0/16 (Korea, Republic of)"]);
    }

    #[test]
    fn test_lenient_skips_invalid() {
        let text = "garbage\n1.0.0.0/33 X\n2001:db8::/32 X\n1.0.0.0/8\n10.0.0.0/8 LAN\n";
        let records = TextParser::new().parse(text.as_bytes()).unwrap();
        assert_eq!(lines(&records), ["10.0.0.0/8 (LAN)"]);
    }

    #[test]
    fn test_strict_rejects_invalid() {
        let text = "10.0.0.0/8 LAN\nnot-an-ip X\n";
        let err = TextParser::new()
            .strict(true)
            .parse(text.as_bytes())
            .unwrap_err();
        match err {
            Error::InvalidLine { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "not-an-ip X");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parse_gzip_file() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"192.168.0.0/16 LAN\n").unwrap();
        let data = encoder.finish().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();

        let records = TextParser::new().parse_file(file.path()).unwrap();
        assert_eq!(lines(&records), ["192.168.0.0/16 (LAN)"]);
    }

    #[test]
    fn test_parse_concatenated_gzip_members() {
        let member = |text: &[u8]| {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(text).unwrap();
            encoder.finish().unwrap()
        };

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&member(b"1.0.0.0/24 AU\n")).unwrap();
        file.write_all(&member(b"2.0.0.0/24 CN\n")).unwrap();

        let records = TextParser::new()
            .strict(true)
            .parse_file(file.path())
            .unwrap();
        assert_eq!(lines(&records), ["1.0.0.0/24 (AU)", "2.0.0.0/24 (CN)"]);
    }

    #[test]
    fn test_parse_plain_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "172.16.0.0/12 LAN").unwrap();

        let records = TextParser::new().parse_file(file.path()).unwrap();
        assert_eq!(lines(&records), ["172.16.0.0/12 (LAN)"]);
    }
}

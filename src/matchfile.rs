//! Plain-text match files.
//!
//! One match per line, `<cat_ind> <input_ind> <cosdist>`, separated by
//! single spaces and terminated by a single `\n`. No header, no trailing
//! blank line. Indices are signed 64-bit decimals; `cosdist` is written
//! with 17 significant digits so the exact double survives a parse round
//! trip.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::error::MatchError;
use crate::matches::Match;

/// Write one match line.
pub fn write_match(w: &mut impl Write, m: &Match) -> io::Result<()> {
    writeln!(w, "{} {} {:.16e}", m.cat_ind, m.input_ind, m.cosdist)
}

/// Count `\n` bytes in a file.
///
/// Reads the raw byte stream to the end; a file without a final newline
/// reports only its completed lines.
pub fn count_lines(path: &Path) -> Result<u64, MatchError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut nlines = 0u64;
    loop {
        let consumed = {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                break;
            }
            nlines += buf.iter().filter(|&&b| b == b'\n').count() as u64;
            buf.len()
        };
        reader.consume(consumed);
    }

    Ok(nlines)
}

/// Load every match from a file written by the streaming writer.
///
/// Fails with [`MatchError::Parse`] (carrying the 1-based line number) on
/// a line with fewer than three fields or with unparseable numbers.
pub fn load_matches(path: &Path) -> Result<Vec<Match>, MatchError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut matches = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let m = parse_line(&line).ok_or(MatchError::Parse { line: i + 1 })?;
        matches.push(m);
    }

    Ok(matches)
}

fn parse_line(line: &str) -> Option<Match> {
    let mut fields = line.split_whitespace();
    let cat_ind = fields.next()?.parse().ok()?;
    let input_ind = fields.next()?.parse().ok()?;
    let cosdist = fields.next()?.parse().ok()?;
    Some(Match {
        cat_ind,
        input_ind,
        cosdist,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("skymatch_test_{name}_{}.txt", std::process::id()))
    }

    #[test]
    fn round_trip_is_lossless() {
        let written = vec![
            Match {
                cat_ind: 0,
                input_ind: 3,
                cosdist: 0.999_847_695_156_391_27,
            },
            Match {
                cat_ind: 12,
                input_ind: 0,
                cosdist: 1.0,
            },
            Match {
                cat_ind: 7,
                input_ind: 123_456_789_012,
                cosdist: -0.333_333_333_333_333_31,
            },
        ];

        let path = temp_path("round_trip");
        {
            let mut w = io::BufWriter::new(File::create(&path).unwrap());
            for m in &written {
                write_match(&mut w, m).unwrap();
            }
            w.flush().unwrap();
        }

        let loaded = load_matches(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), written.len());
        for (a, b) in loaded.iter().zip(written.iter()) {
            assert_eq!(a.cat_ind, b.cat_ind);
            assert_eq!(a.input_ind, b.input_ind);
            assert_eq!(a.cosdist.to_bits(), b.cosdist.to_bits(), "cosdist drifted");
        }
    }

    #[test]
    fn line_format() {
        let mut out = Vec::new();
        write_match(
            &mut out,
            &Match {
                cat_ind: 3,
                input_ind: -1,
                cosdist: 0.5,
            },
        )
        .unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.ends_with('\n'));
        assert!(!line.contains('\r'));
        assert_eq!(line.matches(' ').count(), 2);
        assert!(line.starts_with("3 -1 "));
    }

    #[test]
    fn count_lines_counts_newlines_exactly() {
        let path = temp_path("count_lines");

        std::fs::write(&path, "").unwrap();
        assert_eq!(count_lines(&path).unwrap(), 0);

        std::fs::write(&path, "0 1 0.5\n2 3 0.25\n").unwrap();
        assert_eq!(count_lines(&path).unwrap(), 2);

        // no terminating newline on the last line
        std::fs::write(&path, "0 1 0.5\n2 3 0.25").unwrap();
        assert_eq!(count_lines(&path).unwrap(), 1);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn count_lines_large_file() {
        // spans several reader buffers
        let path = temp_path("count_lines_large");
        let mut body = String::new();
        for i in 0..20_000 {
            body.push_str(&format!("{i} {i} 0.5\n"));
        }
        std::fs::write(&path, &body).unwrap();
        assert_eq!(count_lines(&path).unwrap(), 20_000);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_rejects_short_line() {
        let path = temp_path("short_line");
        std::fs::write(&path, "0 1 0.5\n2 3\n4 5 0.25\n").unwrap();
        let err = load_matches(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, MatchError::Parse { line: 2 }));
    }

    #[test]
    fn load_rejects_bad_number() {
        let path = temp_path("bad_number");
        std::fs::write(&path, "0 1 not-a-float\n").unwrap();
        let err = load_matches(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, MatchError::Parse { line: 1 }));
    }

    #[test]
    fn load_accepts_legacy_formatting() {
        // files written by older tools carry plain decimal notation
        let path = temp_path("legacy");
        std::fs::write(&path, "5 9 0.9998476951563913\n").unwrap();
        let loaded = load_matches(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].cat_ind, 5);
        assert!((loaded[0].cosdist - 0.9998476951563913).abs() < 1e-15);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = temp_path("definitely_absent");
        std::fs::remove_file(&path).ok();
        assert!(matches!(count_lines(&path), Err(MatchError::Io(_))));
        assert!(matches!(load_matches(&path), Err(MatchError::Io(_))));
    }
}

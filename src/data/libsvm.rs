//! LIBSVM text format reader and writer
//!
//! One example per line:
//! label index:value index:value ...
//!
//! Example:
//! +1 1:0.5 3:1.2 7:0.8
//! 2 2:0.3 5:2.1
//! -1
//!
//! Indices are 1-based and strictly ascending. A line holding only a label
//! is an all-zero vector. Blank lines and lines starting with `#` are skipped.

use crate::core::{FeatureVector, Result, SVMError};
use crate::data::Problem;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Load a problem from a LIBSVM format file
pub fn read_problem_file<P: AsRef<Path>>(path: P) -> Result<Problem> {
    let file = File::open(path)?;
    read_problem(BufReader::new(file))
}

/// Load a problem from a reader
pub fn read_problem<R: BufRead>(reader: R) -> Result<Problem> {
    let mut problem = Problem::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (label, vector) =
            parse_line(line).map_err(|message| SVMError::parse(line_num + 1, message))?;
        problem.add(label, vector);
    }

    Ok(problem)
}

/// Parse a single non-empty line into a label and feature vector
pub fn parse_line(line: &str) -> std::result::Result<(i32, FeatureVector), String> {
    let mut parts = line.split_whitespace();
    let label_str = parts.next().ok_or_else(|| "empty line".to_string())?;
    let label = parse_label(label_str)?;

    let mut pairs = Vec::new();
    let mut last_index = 0;

    for feature_str in parts {
        let (index_str, value_str) = feature_str
            .split_once(':')
            .ok_or_else(|| format!("invalid feature format: {feature_str}"))?;

        let index = index_str
            .parse::<usize>()
            .map_err(|_| format!("invalid feature index: {index_str}"))?;
        let value = value_str
            .parse::<f64>()
            .map_err(|_| format!("invalid feature value: {value_str}"))?;

        if index == 0 {
            return Err(format!("feature index must be positive: {feature_str}"));
        }
        if index <= last_index {
            return Err(format!(
                "feature indices must be ascending: {index} after {last_index}"
            ));
        }

        last_index = index;
        pairs.push((index, value));
    }

    let vector = FeatureVector::new(pairs).map_err(|e| e.to_string())?;
    Ok((label, vector))
}

/// Labels are integers; integral floats such as `1.0` are accepted
fn parse_label(token: &str) -> std::result::Result<i32, String> {
    if let Ok(label) = token.parse::<i32>() {
        return Ok(label);
    }
    match token.parse::<f64>() {
        Ok(value)
            if value.fract() == 0.0
                && value >= f64::from(i32::MIN)
                && value <= f64::from(i32::MAX) =>
        {
            Ok(value as i32)
        }
        _ => Err(format!("invalid label: {token}")),
    }
}

/// Write one example per line, leaving out the bias feature
pub fn write_problem<W: Write>(writer: W, problem: &Problem) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    let bias_index = problem.bias().map(|_| problem.n_features() + 1);

    for (label, vector) in problem.iter() {
        write!(writer, "{label}")?;
        for (index, value) in vector.iter() {
            if Some(index) == bias_index {
                continue;
            }
            write!(writer, " {index}:{value}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_line_basic() {
        let (label, vector) = parse_line("+1 1:0.5 3:1.2").unwrap();

        assert_eq!(label, 1);
        assert_eq!(vector.indices(), &[1, 3]);
        assert_eq!(vector.values(), &[0.5, 1.2]);
    }

    #[test]
    fn test_parse_line_multiclass_label() {
        let (label, _) = parse_line("3 2:0.3").unwrap();
        assert_eq!(label, 3);

        let (label, _) = parse_line("-2.0 2:0.3").unwrap();
        assert_eq!(label, -2);
    }

    #[test]
    fn test_parse_line_label_only() {
        let (label, vector) = parse_line("-1").unwrap();
        assert_eq!(label, -1);
        assert!(vector.is_empty());
    }

    #[test]
    fn test_parse_line_invalid_format() {
        assert!(parse_line("+1 1").is_err());
        assert!(parse_line("+1 abc:1.0").is_err());
        assert!(parse_line("+1 1:abc").is_err());
        assert!(parse_line("+1 0:1.0").is_err());
        assert!(parse_line("0.5 1:1.0").is_err());
        assert!(parse_line("1 3:1.0 2:1.0").is_err());
        assert!(parse_line("1 2:1.0 2:1.0").is_err());
    }

    #[test]
    fn test_read_problem_basic() {
        let data = "+1 1:0.5 3:1.2\n-1 2:0.3 5:2.1\n";
        let problem = read_problem(Cursor::new(data)).unwrap();

        assert_eq!(problem.size(), 2);
        assert_eq!(problem.n_features(), 5);
        assert_eq!(problem.labels(), &[1, -1]);
        assert_eq!(problem.vector_at(1).get(5), 2.1);
    }

    #[test]
    fn test_read_problem_skips_comments_and_blank_lines() {
        let data = "# header\n+1 1:0.5\n\n# another\n-1 2:0.3\n";
        let problem = read_problem(Cursor::new(data)).unwrap();

        assert_eq!(problem.labels(), &[1, -1]);
    }

    #[test]
    fn test_read_problem_reports_line_number() {
        let data = "+1 1:0.5\n\n-1 2:x\n";
        let err = read_problem(Cursor::new(data)).unwrap_err();

        match err {
            SVMError::ParseError { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("invalid feature value"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_read_problem_empty_input() {
        let problem = read_problem(Cursor::new("# nothing\n")).unwrap();
        assert!(problem.is_empty());
    }

    #[test]
    fn test_write_problem_skips_bias() {
        let mut problem = read_problem(Cursor::new("1 1:0.5 4:2\n-1\n")).unwrap();
        problem.set_bias(1.0);

        let mut out = Vec::new();
        write_problem(&mut out, &problem).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1 1:0.5 4:2\n-1\n");
    }

    #[test]
    fn test_read_problem_file() {
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "+1 1:0.5 3:1.2").expect("Failed to write");
        writeln!(temp_file, "-1 2:0.3 5:2.1").expect("Failed to write");
        temp_file.flush().expect("Failed to flush");

        let problem = read_problem_file(temp_file.path()).unwrap();
        assert_eq!(problem.size(), 2);
        assert_eq!(problem.n_features(), 5);
    }

    #[test]
    fn test_read_problem_file_io_error() {
        let result = read_problem_file("/non/existent/file.libsvm");
        assert!(matches!(result, Err(SVMError::IoError(_))));
    }
}

use anyhow::Context;
use std::io::Read;
use std::path::Path;

pub type CliResult<T> = anyhow::Result<T>;

/// Read the query description from `path`, or from standard input for `-`.
pub fn read_source(path: &Path) -> CliResult<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source).context("failed to read standard input")?;
        return Ok(source);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[rstest]
    fn reads_files_and_reports_missing_ones() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"expr": {{"kind": "literal"}}}}"#).unwrap();
        assert!(read_source(file.path()).unwrap().contains("literal"));

        let missing = file.path().with_extension("missing");
        let err = read_source(&missing).unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }
}

use std::fs::OpenOptions;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use anyhow::Context as _;
use serde::Serialize;

/// Writes `value` as pretty JSON. Refuses to replace an existing file unless
/// `force`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, force: bool) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true);
    if force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options
        .open(path)
        .with_context(|| format!("open output: {}", path.display()))?;
    let mut out = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut out, value).context("serialize output json")?;
    out.write_all(b"\n").context("write output newline")?;
    out.flush().context("flush output")?;
    Ok(())
}

pub fn ensure_output_writable(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("output already exists: {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_output_needs_force() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("nested").join("out.json");

        write_json(&path, &["가", "b"], false)?;
        assert!(ensure_output_writable(&path, false).is_err());
        assert!(write_json(&path, &["c"], false).is_err());

        write_json(&path, &["c"], true)?;
        let written: Vec<String> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(written, vec!["c"]);
        Ok(())
    }

    #[test]
    fn non_ascii_is_written_verbatim() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("out.json");
        write_json(&path, &["과학"], false)?;
        assert!(std::fs::read_to_string(&path)?.contains("과학"));
        Ok(())
    }
}

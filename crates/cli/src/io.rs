use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Read the whole input from `path`, or from stdin when absent or `-`.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("failed to read input: {}", p.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Write `text` to `path`, or to stdout with a trailing newline.
pub fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(p) => std::fs::write(p, text)
            .with_context(|| format!("failed to write output: {}", p.display())),
        None => {
            let mut out = std::io::stdout().lock();
            writeln!(out, "{text}").context("failed to write stdout")?;
            out.flush().context("failed to flush stdout")
        }
    }
}

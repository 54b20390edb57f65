//! Atomic file writes for generated rule documents.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, error};

use crate::ruleset::RulesetOutput;

/// Write a text file atomically via tempfile + rename.
///
/// The temporary file lives in the target directory so the final rename
/// never crosses a filesystem boundary.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    use std::io::Write;
    use tempfile::NamedTempFile;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let parent_dir = path.parent().unwrap_or(Path::new("."));
    let mut temp_file = NamedTempFile::new_in(parent_dir)
        .with_context(|| format!("Failed to create temporary file in {:?}", parent_dir))?;

    temp_file.write_all(content.as_bytes())?;
    temp_file.as_file().sync_all()?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist {:?}", path))?;

    Ok(())
}

/// Write every output document under the output directory.
///
/// Plain lists land as `<class>_<kind>.txt`, directive documents as
/// `<directive_dir>/<class>.txt`. Each file is replaced wholesale. A
/// failed write is reported and the remaining files are still attempted;
/// returns the number of files written.
pub fn write_outputs(output_dir: &Path, directive_dir: &str, output: &RulesetOutput) -> usize {
    let mut written = 0;

    for (stem, content) in &output.plain {
        let path = output_dir.join(format!("{}.txt", stem));
        match write_text_atomic(&path, content) {
            Ok(()) => {
                debug!("Wrote {:?}", path);
                written += 1;
            }
            Err(e) => error!("Failed to write {:?}: {:#}", path, e),
        }
    }

    for (class, content) in &output.directives {
        let path = output_dir
            .join(directive_dir)
            .join(format!("{}.txt", class));
        match write_text_atomic(&path, content) {
            Ok(()) => {
                debug!("Wrote {:?}", path);
                written += 1;
            }
            Err(e) => error!("Failed to write {:?}: {:#}", path, e),
        }
    }

    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkClass, RuleKind};
    use crate::formatter::RenderOptions;
    use crate::ruleset::Ruleset;

    #[test]
    fn test_write_text_atomic_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/list.txt");
        write_text_atomic(&path, "content").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_write_text_atomic_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        write_text_atomic(&path, "old").unwrap();
        write_text_atomic(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_write_outputs_layout() {
        let dir = tempfile::tempdir().unwrap();

        let mut ruleset = Ruleset::new();
        ruleset.add("example.com", &RuleKind::DomainSuffix, NetworkClass::Proxy);
        ruleset.add("10.0.0.0/8", &RuleKind::Cidr, NetworkClass::Direct);
        let output = ruleset.finalize(&RenderOptions::default());

        let written = write_outputs(dir.path(), "clash", &output);
        assert_eq!(written, 4);

        assert_eq!(
            std::fs::read_to_string(dir.path().join("Proxy_DomainSuffix.txt")).unwrap(),
            "example.com"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Direct_IpCidr.txt")).unwrap(),
            "10.0.0.0/8"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("clash/Proxy.txt")).unwrap(),
            "DOMAIN-SUFFIX,example.com"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("clash/Direct.txt")).unwrap(),
            "IP-CIDR,10.0.0.0/8,no-resolve"
        );
    }
}

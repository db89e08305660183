// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Unsigned transactions written out for manual co-signature.

use std::path::{Path, PathBuf};

use crate::utils::create_dir_if_dne;

/// Writes `NN_tag.json` files, numbering them in the order they are produced.
#[derive(Debug)]
pub struct ArtifactWriter {
    dir: PathBuf,
    written: usize,
}

/// Replaces characters that cannot appear in artifact names.
pub fn sanitize_tag(tag: &str) -> String {
    tag.replace([' ', '/'], "_")
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&mut self, tag: &str, json: &str) -> std::io::Result<PathBuf> {
        create_dir_if_dne(&self.dir)?;
        self.written += 1;
        let path = self
            .dir
            .join(format!("{:02}_{}.json", self.written, sanitize_tag(tag)));
        std::fs::write(&path, json)?;
        Ok(path)
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_and_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ArtifactWriter::new(dir.path().join("txs"));
        let first = writer.write("lp stable/v2", "{}").unwrap();
        let second = writer.write("factory_v2", "{\"type\":13}").unwrap();

        assert_eq!(first.file_name().unwrap(), "01_lp_stable_v2.json");
        assert_eq!(second.file_name().unwrap(), "02_factory_v2.json");
        assert_eq!(std::fs::read_to_string(second).unwrap(), "{\"type\":13}");
        assert_eq!(writer.written(), 2);
    }
}

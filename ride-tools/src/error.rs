// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("toml deserialize error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("{0}")]
    Node(#[from] crate::core::node::NodeError),
    #[error("{0}")]
    Compile(#[from] crate::core::compile::CompileError),
    #[error("{0}")]
    Registry(#[from] crate::core::registry::RegistryError),
    #[error("{0}")]
    Submit(#[from] crate::core::submit::SubmitError),
    #[error("{0}")]
    Sync(#[from] crate::core::sync::SyncError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::{MemoryStore, Registry, RegistryDocument, RegistryError};

    fn load(path: &std::path::Path) -> Result<usize> {
        let text = std::fs::read_to_string(path)?;
        let document: RegistryDocument = toml::from_str(&text)?;
        Ok(Registry::new(MemoryStore::new(document)).get_all()?.len())
    }

    #[test]
    fn component_errors_convert() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(&dir.path().join("nope.toml")), Err(Error::Io(_))));

        let path = dir.path().join("registry.toml");
        std::fs::write(&path, "[[contracts]]\nfile = 3").unwrap();
        assert!(matches!(load(&path), Err(Error::TomlDeserialize(_))));

        let record = "[[contracts]]\nfile = \"lp.ride\"\ntag = \"\"\nbase_public_key = \"x\"";
        std::fs::write(&path, record).unwrap();
        assert!(matches!(
            load(&path),
            Err(Error::Registry(RegistryError::Invalid { .. }))
        ));
    }
}

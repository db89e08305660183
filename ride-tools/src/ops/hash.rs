// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::{path::Path, sync::Arc};

use crate::{
    core::{
        compile::{Compiler, LEGACY_SCRIPT_SIZE, MAX_SCRIPT_SIZE},
        diff::allow_hash,
        node::NodeApi,
    },
    utils::{color::Color, format_amount, format_script_size},
};

/// Compiles a local source and prints the hash a factory would approve for it.
pub async fn hash(
    node: Arc<dyn NodeApi>,
    source: impl AsRef<Path>,
    compact: bool,
) -> eyre::Result<String> {
    let source = source.as_ref();
    let compiled = Compiler::new(node).compile_file(source, compact).await?;
    let hash = allow_hash(&compiled.bytes);

    greyln!(
        "script size: {}",
        format_script_size(compiled.bytes.len(), LEGACY_SCRIPT_SIZE, MAX_SCRIPT_SIZE)
    );
    greyln!("set-script fee: {}", format_amount(compiled.fee));
    println!("{} {}", hash.mint(), source.display().to_string().grey());
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::node::{CompileResponse, MockNodeApi};

    #[tokio::test]
    async fn prints_allow_hash_of_compiled_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lp.ride");
        std::fs::write(&path, "{-# STDLIB_VERSION 6 #-}").unwrap();

        let mut node = MockNodeApi::new();
        node.expect_compile()
            .withf(|_, compact| *compact)
            .times(1)
            .returning(|_, _| {
                Ok(CompileResponse {
                    script: "base64:AAEB".into(),
                    ..Default::default()
                })
            });

        let hash = hash(Arc::new(node), &path, true).await.unwrap();
        assert_eq!(hash, "m6h2iU26xbRRpxHRfGuN/U3O4ptKIfNEDi4HNUBercs=");
    }
}

// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Compiler gateway.
//!
//! Ride sources are compiled by the node's utility endpoints. Results are memoized for the
//! lifetime of the [`Compiler`], keyed by a fingerprint of the source bytes and the compaction
//! mode.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::core::{
    crypto::blake2b256,
    fee,
    node::{NodeApi, NodeError},
};

const BASE64_PREFIX: &str = "base64:";

/// Size limit of scripts below standard library version 6.
pub const LEGACY_SCRIPT_SIZE: usize = 32 * 1024;
pub const MAX_SCRIPT_SIZE: usize = 160 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("{0}")]
    Node(#[from] NodeError),
    #[error("compiler returned invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("compiler returned an empty script")]
    EmptyScript,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Output of a successful compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledScript {
    /// Base64 form without the `base64:` marker.
    pub base64: String,
    pub bytes: Vec<u8>,
    /// Fee of a set-script transaction carrying these bytes.
    pub fee: u64,
}

/// Drops the optional `base64:` marker the node puts in front of scripts.
pub fn strip_base64_prefix(script: &str) -> &str {
    script.strip_prefix(BASE64_PREFIX).unwrap_or(script)
}

pub fn decode_script(script: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(strip_base64_prefix(script))
}

pub struct Compiler {
    node: Arc<dyn NodeApi>,
    cache: HashMap<([u8; 32], bool), CompiledScript>,
}

impl Compiler {
    pub fn new(node: Arc<dyn NodeApi>) -> Self {
        Self {
            node,
            cache: HashMap::new(),
        }
    }

    pub async fn compile(
        &mut self,
        source: &[u8],
        compact: bool,
    ) -> Result<CompiledScript, CompileError> {
        let key = (blake2b256(source), compact);
        if let Some(compiled) = self.cache.get(&key) {
            return Ok(compiled.clone());
        }

        let response = self.node.compile(source, compact).await?;
        let base64 = strip_base64_prefix(&response.script).to_string();
        let bytes = STANDARD.decode(&base64)?;
        if bytes.is_empty() {
            return Err(CompileError::EmptyScript);
        }
        debug!(@grey,
            "compiled {} bytes (compact: {compact}, complexity: {:?})",
            bytes.len(),
            response.complexity
        );

        let compiled = CompiledScript {
            fee: fee::set_script_fee(bytes.len()),
            base64,
            bytes,
        };
        self.cache.insert(key, compiled.clone());
        Ok(compiled)
    }

    pub async fn compile_file(
        &mut self,
        path: impl AsRef<Path>,
        compact: bool,
    ) -> Result<CompiledScript, CompileError> {
        let path = path.as_ref();
        let source = tokio::fs::read(path)
            .await
            .map_err(|source| CompileError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        self.compile(&source, compact).await
    }

    /// Decompiles a base64 script. Empty input yields empty output without calling the node.
    pub async fn decompile(&self, script: &str) -> Result<String, CompileError> {
        let script = strip_base64_prefix(script);
        if script.is_empty() {
            return Ok(String::new());
        }
        Ok(self.node.decompile(script).await?)
    }

    pub fn node(&self) -> &Arc<dyn NodeApi> {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::core::node::{CompileResponse, MockNodeApi};

    fn response(script: &str) -> CompileResponse {
        CompileResponse {
            script: script.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn caches_per_source_and_mode() {
        let mut node = MockNodeApi::new();
        node.expect_compile()
            .with(eq(b"func a() = 1".to_vec()), eq(false))
            .times(1)
            .returning(|_, _| Ok(response("base64:AAEB")));
        node.expect_compile()
            .with(eq(b"func a() = 1".to_vec()), eq(true))
            .times(1)
            .returning(|_, _| Ok(response("AAEC")));

        let mut compiler = Compiler::new(Arc::new(node));
        let first = compiler.compile(b"func a() = 1", false).await.unwrap();
        let second = compiler.compile(b"func a() = 1", false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.base64, "AAEB");
        assert_eq!(first.bytes, vec![0, 1, 1]);
        assert_eq!(first.fee, fee::MIN_SET_SCRIPT_FEE);

        let compact = compiler.compile(b"func a() = 1", true).await.unwrap();
        assert_eq!(compact.bytes, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn compile_errors_are_not_cached() {
        let mut node = MockNodeApi::new();
        let mut calls = 0;
        node.expect_compile().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Err(NodeError::Status {
                    status: 400,
                    body: "syntax error".into(),
                })
            } else {
                Ok(response("AAEB"))
            }
        });

        let mut compiler = Compiler::new(Arc::new(node));
        assert!(matches!(
            compiler.compile(b"src", false).await,
            Err(CompileError::Node(NodeError::Status { status: 400, .. }))
        ));
        compiler.compile(b"src", false).await.unwrap();
    }

    #[tokio::test]
    async fn empty_decompile_skips_the_node() {
        let node = MockNodeApi::new();
        let compiler = Compiler::new(Arc::new(node));
        assert_eq!(compiler.decompile("").await.unwrap(), "");
        assert_eq!(compiler.decompile("base64:").await.unwrap(), "");
    }

    #[tokio::test]
    async fn decompile_strips_marker() {
        let mut node = MockNodeApi::new();
        node.expect_decompile()
            .with(eq("AAEB"))
            .times(1)
            .returning(|_| Ok("{-# STDLIB_VERSION 6 #-}".into()));
        let compiler = Compiler::new(Arc::new(node));
        let source = compiler.decompile("base64:AAEB").await.unwrap();
        assert!(source.starts_with("{-#"));
    }
}

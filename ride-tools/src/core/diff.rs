// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Script fingerprints and human-readable diffs between deployed and local scripts.

use std::{io::Write, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine};
use tempfile::NamedTempFile;
use tokio::process::Command;

use crate::{
    core::{
        compile::{strip_base64_prefix, CompileError, Compiler},
        crypto::blake2b256,
    },
    utils::sys,
};

#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error("{0}")]
    Compile(#[from] CompileError),
    #[error("failed to write decompiled script: {0}")]
    Io(#[from] std::io::Error),
}

/// Fixed-size fingerprint of compiled script bytes.
pub fn content_hash(bytes: &[u8]) -> [u8; 32] {
    blake2b256(bytes)
}

/// The string posted on-chain to approve a library script.
pub fn allow_hash(bytes: &[u8]) -> String {
    STANDARD.encode(content_hash(bytes))
}

/// Whether two base64 scripts carry the same bytes, ignoring the `base64:` marker.
pub fn same_script(left: &str, right: &str) -> bool {
    strip_base64_prefix(left) == strip_base64_prefix(right)
}

/// Decompiles both scripts and prints `git diff` between them.
///
/// This is a review aid. A missing or failing `git` is reported and otherwise ignored.
pub async fn print_diff(
    compiler: &Compiler,
    scratch_dir: &Path,
    file: &str,
    left: &str,
    right: &str,
) -> Result<String, DiffError> {
    let left = decompiled_file(compiler, scratch_dir, file, left).await?;
    let right = decompiled_file(compiler, scratch_dir, file, right).await?;
    if !sys::command_exists("git") {
        warn!(@yellow, "git is not installed, skipping diff of {file}");
        return Ok(String::new());
    }

    let mut command = Command::new("git");
    command
        .args(["--no-pager", "diff", "--color", "--no-index"])
        .arg(left.path())
        .arg(right.path());
    greyln!(
        "git --no-pager diff --color --no-index {} {}",
        left.path().display(),
        right.path().display()
    );

    // git exits with 1 when the files differ.
    let output = match command.output().await {
        Ok(output) => String::from_utf8_lossy(&output.stdout).into_owned(),
        Err(err) => {
            warn!(@yellow, "unable to run git diff for {file}: {err}");
            return Ok(String::new());
        }
    };
    println!("{output}");
    Ok(output)
}

async fn decompiled_file(
    compiler: &Compiler,
    scratch_dir: &Path,
    file: &str,
    script: &str,
) -> Result<NamedTempFile, DiffError> {
    let source = compiler.decompile(script).await?;
    let mut temp = tempfile::Builder::new()
        .prefix(&format!("{file} "))
        .tempfile_in(scratch_dir)?;
    temp.write_all(source.as_bytes())?;
    temp.flush()?;
    debug!(@grey, "decompiled {} to {}", file.lavender(), temp.path().display());
    Ok(temp)
}

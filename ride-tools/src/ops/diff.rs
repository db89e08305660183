// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::{path::Path, sync::Arc};

use crate::core::{
    compile::Compiler,
    crypto::Address,
    diff::{print_diff, same_script},
    node::NodeApi,
};

/// Compiles a local source and prints its diff against the program deployed at `address`.
///
/// Returns whether the two differ.
pub async fn diff(
    node: Arc<dyn NodeApi>,
    source: impl AsRef<Path>,
    compact: bool,
    address: &Address,
    scratch_dir: impl AsRef<Path>,
) -> eyre::Result<bool> {
    let source = source.as_ref();
    let file = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string());

    let mut compiler = Compiler::new(Arc::clone(&node));
    let compiled = compiler.compile_file(source, compact).await?;
    let deployed = node.script(address).await?.unwrap_or_default();

    if same_script(&deployed, &compiled.base64) {
        mintln!("{file} matches the program deployed at {address}");
        return Ok(false);
    }
    greyln!(
        "{} differs from {} (left: blockchain, right: local)",
        file.lavender(),
        address.to_string().lavender()
    );
    print_diff(
        &compiler,
        scratch_dir.as_ref(),
        &file,
        &deployed,
        &compiled.base64,
    )
    .await?;
    Ok(true)
}

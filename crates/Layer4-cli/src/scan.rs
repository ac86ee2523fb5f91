//! `hzero scan` - 폴더 스캔 후 트리 출력

use crate::host::CliHost;
use crate::Runtime;
use hzero_core::{ChannelSink, DispatchRouter, ResultStore, TreeNode};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

pub async fn run(runtime: &Runtime, dir: PathBuf, json: bool) -> anyhow::Result<()> {
    let ctx = runtime.context(Arc::new(CliHost::non_interactive())).await?;

    // 이 명령은 응답 메시지를 보내지 않는다
    let (sink, _replies) = ChannelSink::new();
    let router = DispatchRouter::new(ctx, Arc::new(sink));

    router.scan(Some(dir)).await?;

    let store = &router.context().store;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, store.snapshot().as_ref())?;
        writeln!(out)?;
    } else {
        write_tree(&mut out, store)?;
    }
    Ok(())
}

/// 파일 → 권한 → 상세 순으로 들여쓰기 출력
fn write_tree(out: &mut impl Write, store: &ResultStore) -> std::io::Result<()> {
    for file in store.children(None) {
        write_node(out, store, &file, 0)?;
    }
    Ok(())
}

fn write_node(
    out: &mut impl Write,
    store: &ResultStore,
    node: &TreeNode,
    depth: usize,
) -> std::io::Result<()> {
    match node {
        TreeNode::File { label, path } => writeln!(out, "{} ({})", label, path.display())?,
        _ => writeln!(out, "{}{}", "  ".repeat(depth), node.label())?,
    }
    if node.is_expandable() {
        for child in store.children(Some(node)) {
            write_node(out, store, &child, depth + 1)?;
        }
    }
    Ok(())
}

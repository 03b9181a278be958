use std::io;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use markup5ever_rcdom::{Handle, SerializableHandle};

/// 序列化整个文档
pub fn serialize_document(document: &Handle) -> io::Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = document.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// 序列化节点的子节点（不含节点自身的标签）
pub fn serialize_children(node: &Handle) -> io::Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = node.clone().into();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..Default::default()
    };
    serialize(&mut buf, &serializable, opts)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// crates/nvmsafe-rs-psf/src/checksum.rs

//! Structural checksum of an XML tree.
//!
//! Nodes are visited in pre-order. Each node contributes its name, its
//! pre-order index (u32, little-endian), its text, and then every attribute
//! name and value in document order. Every string is folded as its length
//! followed by its bytes. The root's own `checksum` attribute is left out so
//! that a document can carry its checksum. Any change to names, text,
//! attribute values or the order of nodes moves the result; indentation
//! between elements and the XML declaration do not.

use crate::document::XmlNode;
use nvmsafe_rs::Crc16Folder;

/// Name of the root attribute holding the document checksum.
pub const CHECKSUM_ATTRIBUTE: &str = "checksum";

/// Folds the tree rooted at `root` into a CRC-16.
pub fn structural_checksum(root: &XmlNode) -> u16 {
    let mut folder = Crc16Folder::new();
    let mut index = 0u32;
    fold_node(&mut folder, root, &mut index, true);
    folder.finish()
}

fn fold_node(folder: &mut Crc16Folder, node: &XmlNode, index: &mut u32, is_root: bool) {
    folder.fold_field(&node.name);
    folder.fold_u32(*index);
    *index = index.wrapping_add(1);
    folder.fold_field(&node.text);
    for (name, value) in &node.attributes {
        if is_root && name == CHECKSUM_ATTRIBUTE {
            continue;
        }
        folder.fold_field(name);
        folder.fold_field(value);
    }
    for child in &node.children {
        fold_node(folder, child, index, false);
    }
}

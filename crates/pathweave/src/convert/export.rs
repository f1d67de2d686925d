//! Reconstitution of a diagram document from a wrapper set.

use log::debug;

use pathweave_core::model::DiagramDocument;

use super::anchors::merge_chain;
use crate::{
    error::PathweaveError,
    wrapper::{Binding, WrapperSet},
};

/// Emits one element per wrapper, in wrapper order, from the live copies.
///
/// Split lines are merged back from their segments; their references come
/// from the live line. Anchors keep their live positions, which edits keep
/// in step with the chain. Group membership lives in each live copy's
/// `group_ref`.
///
/// # Errors
///
/// Returns [`PathweaveError::BrokenChain`] when a split line's segments no
/// longer form a chain.
pub fn export(wrappers: &WrapperSet) -> Result<DiagramDocument, PathweaveError> {
    let mut document = DiagramDocument::new();

    for wrapper in wrappers.iter() {
        let live = wrapper.live();
        let element = match wrapper.binding() {
            Binding::Chain(split) => {
                let mut line = merge_chain(split.segments(), split.anchors())?.line;
                *line.kind_mut() = *live.kind();
                line.set_group_ref(live.group_ref());
                line
            }
            _ => live.clone(),
        };
        document.push(element);
    }

    debug!(elements = document.len(); "Exported document");
    Ok(document)
}

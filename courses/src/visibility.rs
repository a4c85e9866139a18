//! A public container may only live below public containers.

use crate::{
    error::{Error, Result},
    model::{Container, ContainerId, Visibility},
};

/// Checks a proposed visibility against the parent of the container.
pub fn validate_visibility(proposed: Visibility, parent: Option<&Container>) -> Result<()> {
    match parent {
        Some(parent) if proposed == Visibility::Public && !parent.is_public() => {
            Err(Error::VisibilityConflict { parent: parent.id })
        }
        _ => Ok(()),
    }
}

/// Checks a proposed visibility of `container` against its direct children:
/// a container with public children cannot become private.
pub fn validate_children(
    proposed: Visibility,
    container: ContainerId,
    children: &[Container],
) -> Result<()> {
    if proposed == Visibility::Private && children.iter().any(Container::is_public) {
        return Err(Error::VisibilityConflict { parent: container });
    }
    Ok(())
}

//! Effective permission of a user on a container.
//!
//! Access is the maximum of what the container grants locally (the direct
//! grant, raised to at least [`AccessLevel::Visitor`] on public containers)
//! and what the user inherits from the ancestors.
//! Creators and admins are editors of everything they touch.

use std::collections::HashSet;

use lib::auth::User;
use tracing::{debug, trace, warn};

use crate::{
    model::{AccessLevel, Container},
    store::Store,
};

/// Resolves the access level of `user` on `container`. `None` means no access.
///
/// Never fails: a store error is logged and the affected level counts as no
/// access, and a parent that does not exist (anymore) is treated as absent.
pub async fn effective_access<S: Store + ?Sized>(
    store: &S,
    container: &Container,
    user: Option<&User>,
) -> Option<AccessLevel> {
    let user = user?;
    if user.admin {
        return Some(AccessLevel::Editor);
    }

    let mut visited = HashSet::new();
    let mut level = None;
    let mut current = container.clone();
    loop {
        if !visited.insert(current.id) {
            debug!("cycle detected at {}", current.id);
            break;
        }
        if current.is_creator(user.id) {
            return Some(AccessLevel::Editor);
        }

        level = level.max(local_access(store, &current, user).await);
        trace!("access of {} on {}: {level:?}", user.id, current.id);

        let Some(parent) = current.parent else {
            break;
        };
        current = match store.container(parent).await {
            Ok(Some(parent)) => parent,
            Ok(None) => {
                debug!("parent {parent} of {} does not exist", current.id);
                break;
            }
            Err(err) => {
                warn!("could not load {parent}: {err}");
                break;
            }
        };
    }
    level
}

/// Whether `user` may view (or edit, if `require_edit`) `container`.
pub async fn has_access<S: Store + ?Sized>(
    store: &S,
    container: &Container,
    user: Option<&User>,
    require_edit: bool,
) -> bool {
    permits(
        effective_access(store, container, user).await,
        require_edit,
    )
}

pub fn permits(level: Option<AccessLevel>, require_edit: bool) -> bool {
    let required = if require_edit {
        AccessLevel::Editor
    } else {
        AccessLevel::Visitor
    };
    level >= Some(required)
}

async fn local_access<S: Store + ?Sized>(
    store: &S,
    container: &Container,
    user: &User,
) -> Option<AccessLevel> {
    let granted = match store.grant(user.id, container.id).await {
        Ok(level) => level,
        Err(err) => {
            warn!(
                "could not load grant of {} on {}: {err}",
                user.id, container.id
            );
            None
        }
    };
    if container.is_public() {
        granted.max(Some(AccessLevel::Visitor))
    } else {
        granted
    }
}

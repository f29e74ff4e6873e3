//! Ownership-based access rules shared by every resource.
//!
//! The action comes from the request method. Reads are always allowed. Writes
//! need an authenticated caller who owns the target: the loaded record for
//! updates and deletes, the record about to be written for attendee and
//! comment creation. Event creation has no target; the caller becomes the
//! organizer.

use axum::http::Method;
use uuid::Uuid;

use crate::auth::Identity;
use crate::utils::error::AppError;

/// A resource with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn from_method(method: &Method) -> Self {
        if *method == Method::POST {
            Action::Create
        } else if *method == Method::PUT || *method == Method::PATCH {
            Action::Update
        } else if *method == Method::DELETE {
            Action::Delete
        } else {
            Action::Read
        }
    }

    pub fn is_safe(self) -> bool {
        matches!(self, Action::Read)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    AuthenticationRequired,
    Forbidden,
}

impl Decision {
    pub fn into_result(self, resource: &str) -> Result<(), AppError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::AuthenticationRequired => Err(AppError::authentication_required()),
            Decision::Forbidden => Err(AppError::Forbidden(format!(
                "Only the owner of this {} may modify it",
                resource
            ))),
        }
    }
}

pub fn decide(action: Action, resource: Option<&dyn Owned>, caller: Option<&Identity>) -> Decision {
    if action.is_safe() {
        return Decision::Allow;
    }

    let Some(caller) = caller else {
        return Decision::AuthenticationRequired;
    };

    match resource {
        Some(resource) if resource.owner_id() != caller.user_id => Decision::Forbidden,
        _ => Decision::Allow,
    }
}

/// [`decide`] with a denial turned into the matching [`AppError`].
pub fn authorize(
    action: Action,
    resource: Option<&dyn Owned>,
    caller: Option<&Identity>,
    resource_name: &str,
) -> Result<(), AppError> {
    decide(action, resource, caller).into_result(resource_name)
}

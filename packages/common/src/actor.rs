use serde::{Deserialize, Serialize};

use crate::{ActorId, OrganizationId};

/// See every event regardless of privacy.
pub const SEE_PRIVATE: &str = "event:see_private";
/// Edit every event.
pub const EDIT_ALL: &str = "event:edit_all";
/// Edit events the actor is an editor of.
pub const EDIT_OWN: &str = "event:edit_own";

/// Identity snapshot supplied by the identity/capability service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub is_authenticated: bool,
    /// Superusers ignore event ban lists.
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub organization_ids: Vec<OrganizationId>,
}

impl Actor {
    /// An authenticated actor with no permissions and no organizations.
    pub fn user(id: ActorId) -> Self {
        Self {
            id,
            is_authenticated: true,
            is_superuser: false,
            permissions: Vec::new(),
            organization_ids: Vec::new(),
        }
    }

    /// An unauthenticated visitor.
    pub fn anonymous() -> Self {
        Self {
            id: 0,
            is_authenticated: false,
            is_superuser: false,
            permissions: Vec::new(),
            organization_ids: Vec::new(),
        }
    }

    pub fn with_permission(mut self, permission: &str) -> Self {
        self.permissions.push(permission.to_string());
        self
    }

    pub fn with_organization(mut self, organization_id: OrganizationId) -> Self {
        self.organization_ids.push(organization_id);
        self
    }

    /// Superusers hold every permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_authenticated
            && (self.is_superuser || self.permissions.iter().any(|p| p == permission))
    }

    /// Holds `event:see_private` or `event:edit_all`.
    pub fn has_global_event_access(&self) -> bool {
        self.has_permission(SEE_PRIVATE) || self.has_permission(EDIT_ALL)
    }
}

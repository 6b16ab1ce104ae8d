//! Actor resolution and event-level authorization.
//!
//! Session handling, tokens and tenant provisioning are external
//! collaborators; this module only defines who the current actor is and
//! what their relationship to a stocking event permits. The HTTP extractor
//! resolves the actor from the `x-user-id` header populated by the fronting
//! identity proxy.

use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};

use crate::{
    entities::person::{self, Entity as PersonEntity},
    errors::ServiceError,
    AppState,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorKind {
    Freelancer,
    TenantMember,
    Admin,
    Inspector,
}

/// The authenticated party performing a lifecycle operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub kind: ActorKind,
    pub tenant_id: Option<i64>,
    pub email: String,
}

impl Actor {
    pub fn from_person(person: &person::Model) -> Self {
        let kind = if person.is_admin() {
            ActorKind::Admin
        } else if person.is_inspector() {
            ActorKind::Inspector
        } else if person.tenant_id.is_some() {
            ActorKind::TenantMember
        } else {
            ActorKind::Freelancer
        };
        Self {
            id: person.id,
            kind,
            tenant_id: person.tenant_id,
            email: person.email.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.kind == ActorKind::Admin
    }

    pub fn require_admin(&self) -> Result<(), ServiceError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ServiceError::NoRights(
                "administrator role required".to_string(),
            ))
        }
    }
}

/// Extractor wrapper so handlers can take the current actor as an argument.
pub struct AuthActor(pub Actor);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthActor {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::NoRights("missing x-user-id header".to_string()))?;
        let user_id: i64 = user_id
            .parse()
            .map_err(|_| ServiceError::NoRights("malformed x-user-id header".to_string()))?;

        let person = PersonEntity::find_by_id(user_id)
            .one(&*state.db)
            .await?
            .ok_or_else(|| ServiceError::NoRights("unknown user".to_string()))?;

        Ok(AuthActor(Actor::from_person(&person)))
    }
}

//! Access gate for timer mutations.
//!
//! Identity is supplied by the external auth collaborator through the
//! `x-actor-id` and `x-actor-role` headers; this module only decides whether
//! a given actor may act on a given timer.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::{
    dao::models::TimerEntity,
    error::{AppError, ServiceError},
};

const ACTOR_ID_HEADER: &str = "x-actor-id";
const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Role carried by the calling operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    /// Regular operator; may only act on timers they authored.
    User,
    /// May act on any timer.
    Moderator,
    /// May act on any timer.
    Admin,
}

impl ActorRole {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "USER" => Some(ActorRole::User),
            "MODERATOR" => Some(ActorRole::Moderator),
            "ADMIN" => Some(ActorRole::Admin),
            _ => None,
        }
    }

    /// Whether this role bypasses the author check.
    pub fn is_privileged(self) -> bool {
        matches!(self, ActorRole::Moderator | ActorRole::Admin)
    }
}

/// Caller identity extracted from request headers.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    /// Operator id, compared against the timer's author.
    pub id: Uuid,
    /// Operator role.
    pub role: ActorRole,
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Forbidden(format!("missing `{ACTOR_ID_HEADER}` header")))?;
        let id = Uuid::parse_str(id)
            .map_err(|_| AppError::BadRequest(format!("malformed `{ACTOR_ID_HEADER}` header")))?;

        let role = match parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            Some(raw) => ActorRole::parse(raw).ok_or_else(|| {
                AppError::BadRequest(format!("unknown `{ACTOR_ROLE_HEADER}` value `{raw}`"))
            })?,
            None => ActorRole::User,
        };

        Ok(Actor { id, role })
    }
}

/// Allow the operation if the actor authored the timer or holds a
/// privileged role.
pub fn check_access(actor: Actor, timer: &TimerEntity) -> Result<(), ServiceError> {
    if actor.role.is_privileged() || actor.id == timer.author {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "actor `{}` may not modify timer `{}`",
            actor.id, timer.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer_of(author: Uuid) -> TimerEntity {
        TimerEntity::idle("Station 1".into(), Uuid::new_v4(), author)
    }

    #[test]
    fn author_is_allowed() {
        let author = Uuid::new_v4();
        let actor = Actor {
            id: author,
            role: ActorRole::User,
        };
        assert!(check_access(actor, &timer_of(author)).is_ok());
    }

    #[test]
    fn stranger_is_rejected() {
        let actor = Actor {
            id: Uuid::new_v4(),
            role: ActorRole::User,
        };
        let result = check_access(actor, &timer_of(Uuid::new_v4()));
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
    }

    #[test]
    fn privileged_roles_bypass_author_check() {
        for role in [ActorRole::Moderator, ActorRole::Admin] {
            let actor = Actor {
                id: Uuid::new_v4(),
                role,
            };
            assert!(check_access(actor, &timer_of(Uuid::new_v4())).is_ok());
        }
    }

    #[test]
    fn role_parsing_is_case_insensitive() {
        assert_eq!(ActorRole::parse("admin"), Some(ActorRole::Admin));
        assert_eq!(ActorRole::parse("Moderator"), Some(ActorRole::Moderator));
        assert_eq!(ActorRole::parse("USER"), Some(ActorRole::User));
        assert_eq!(ActorRole::parse("owner"), None);
    }
}

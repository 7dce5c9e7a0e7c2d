//! Axum extractors for the resolved principal
//!
//! All of them read the [`Principal`] the `authenticate` middleware left in
//! the request extensions. `RequirePermission` is generic over any state `S`
//! where `AccessController: FromRef<S>`.

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::access::AccessController;
use crate::error::AuthError;
use crate::permission::PermissionCode;
use crate::types::{AuthIdentity, Principal};

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts.extensions.get::<Principal>().cloned().ok_or_else(|| {
            tracing::error!(path = %parts.uri.path(), "Principal missing; authenticate middleware not installed");
            AuthError::PrincipalUnavailable
        })
    }
}

/// Any authenticated principal, activated or not
#[derive(Debug)]
pub struct AuthenticatedPrincipal(pub AuthIdentity);

impl<S> FromRequestParts<S> for AuthenticatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match Principal::from_request_parts(parts, state).await? {
            Principal::Anonymous => Err(AuthError::AuthenticationRequired),
            Principal::Authenticated(identity) => Ok(AuthenticatedPrincipal(identity)),
        }
    }
}

/// Authenticated principal whose account has been activated
#[derive(Debug)]
pub struct ActivatedPrincipal(pub AuthIdentity);

impl<S> FromRequestParts<S> for ActivatedPrincipal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let AuthenticatedPrincipal(identity) =
            AuthenticatedPrincipal::from_request_parts(parts, state).await?;

        if !identity.is_active {
            return Err(AuthError::InactiveAccount);
        }
        Ok(ActivatedPrincipal(identity))
    }
}

/// Activated principal holding permission `P`.
///
/// ```ignore
/// async fn create_movie(
///     RequirePermission(identity, _): RequirePermission<MoviesWrite>,
///     ...
/// )
/// ```
#[derive(Debug)]
pub struct RequirePermission<P: PermissionCode>(pub AuthIdentity, pub PhantomData<P>);

impl<S, P> FromRequestParts<S> for RequirePermission<P>
where
    AccessController: FromRef<S>,
    S: Send + Sync,
    P: PermissionCode,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        let access = AccessController::from_ref(state);

        access.authorize(&principal, P::CODE).await?.into_result()?;

        match principal {
            Principal::Authenticated(identity) => Ok(RequirePermission(identity, PhantomData)),
            Principal::Anonymous => Err(AuthError::AuthenticationRequired),
        }
    }
}

use async_graphql::{Context, Error, Result};
use uuid::Uuid;

use crate::auth::Claims;

/// The authenticated caller's user id, or an auth error for anonymous
/// requests. Claims are placed in the GraphQL context by the JWT
/// middleware and the request handler.
pub fn require_user(ctx: &Context<'_>) -> Result<Uuid> {
    let claims = ctx
        .data_opt::<Claims>()
        .ok_or_else(|| Error::new("Authentication required"))?;

    Uuid::parse_str(&claims.sub).map_err(|_| Error::new("Invalid token subject"))
}

/// Guards mutations reserved for whoever organizes the resource.
pub fn require_organizer(caller: Uuid, organizer: Uuid) -> Result<()> {
    if caller != organizer {
        return Err(Error::new("Only the organizer can do this"));
    }
    Ok(())
}

use async_graphql::dataloader::DataLoader;
use async_graphql::Schema;

use super::loaders::{ProfileLoader, SportLoader, VenueLoader};
use super::{MutationRoot, QueryRoot, SubscriptionRoot};
use crate::state::AppState;

pub type AppSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// Build the GraphQL schema and inject shared state (AppState) into the context.
pub fn build_schema(state: AppState) -> AppSchema {
    let sport_loader = DataLoader::new(SportLoader::new(state.db.clone()), tokio::spawn);
    let venue_loader = DataLoader::new(VenueLoader::new(state.db.clone()), tokio::spawn);
    let profile_loader = DataLoader::new(ProfileLoader::new(state.db.clone()), tokio::spawn);

    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(state) // AppState is Clone; available in resolvers via ctx.data::<AppState>()
        .data(sport_loader)
        .data(venue_loader)
        .data(profile_loader)
        .finish()
}

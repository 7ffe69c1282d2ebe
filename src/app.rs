use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use recipebox_db::Store;
use recipebox_rating::RatingSubscriber;
use recipebox_recipe::{Assembler, Collaborators, Provider, RecipeSubscriber, Tags};
use recipebox_shared::{NotificationBus, Photos, State, SubscriptionHandle};
use recipebox_user::{CookList, Favorites, Recents, UserSubscriber};
use sqlx::SqlitePool;

use crate::config::Config;

/// Every service of the process, wired over one pool and one bus.
pub struct App {
    pub pool: SqlitePool,
    pub state: State<Store>,
    pub users: recipebox_user::Command,
    pub ratings: recipebox_rating::Command,
    pub favorites: Favorites,
    pub cook_list: CookList,
    pub recents: Recents,
    pub tags: Tags,
    pub recipes: recipebox_recipe::Command,
    pub provider: Provider,
    subscriptions: Vec<SubscriptionHandle>,
}

impl App {
    /// Opens the pool, applies migrations and starts the subscribers.
    pub async fn start(config: &Config) -> Result<Self> {
        let pool = crate::db::create_pool(&config.database.url, config.database.max_connections)
            .await?;
        crate::db::migrate(&pool).await?;

        let app = Self::build(pool, config);

        Ok(app.subscribe())
    }

    fn build(pool: SqlitePool, config: &Config) -> Self {
        let state = State {
            store: Store::new(pool.clone()),
            bus: NotificationBus::new(config.bus.capacity),
        };
        let photos = Photos::new(&config.photo.base_url, &config.photo.prefix);

        let users = recipebox_user::Command::new(state.clone(), photos.clone());
        let ratings =
            recipebox_rating::Command::new(state.clone()).max_attempts(config.rating.max_attempts);
        let favorites = Favorites::new(state.clone());
        let cook_list = CookList::new(state.clone());
        let recents = Recents::new(state.clone()).size(config.recent.size);
        let tags = Tags::new(state.clone());

        let assembler = Assembler::new(
            Collaborators {
                tags: Arc::new(tags.clone()),
                users: Arc::new(users.clone()),
                ratings: Arc::new(ratings.clone()),
                photos: Arc::new(photos),
                favorites: Arc::new(favorites.clone()),
                cook_list: Arc::new(cook_list.clone()),
            },
            state.bus.clone(),
        )
        .timeout(Duration::from_millis(config.assembler.timeout_ms));

        let recipes = recipebox_recipe::Command::new(state.clone(), assembler.clone());
        let provider = Provider::new(
            state.clone(),
            assembler,
            tags.clone(),
            ratings.clone(),
            favorites.clone(),
            cook_list.clone(),
            recents.clone(),
            config.provider,
        );

        Self {
            pool,
            state,
            users,
            ratings,
            favorites,
            cook_list,
            recents,
            tags,
            recipes,
            provider,
            subscriptions: vec![],
        }
    }

    fn subscribe(mut self) -> Self {
        let bus = &self.state.bus;

        self.subscriptions = vec![
            bus.spawn(Arc::new(RatingSubscriber(self.ratings.clone()))),
            bus.spawn(Arc::new(UserSubscriber {
                favorites: self.favorites.clone(),
                cook_list: self.cook_list.clone(),
                recents: self.recents.clone(),
            })),
            bus.spawn(Arc::new(RecipeSubscriber(self.recipes.clone()))),
        ];

        tracing::info!(count = self.subscriptions.len(), "subscriptions started");

        self
    }

    /// Stops the subscribers, then closes the pool.
    pub async fn shutdown(self) {
        tracing::info!("Shutting down subscriptions...");

        let results = futures::future::join_all(
            self.subscriptions
                .into_iter()
                .map(|subscription| subscription.shutdown_and_wait()),
        )
        .await;

        for result in results {
            if let Err(e) = result {
                tracing::error!("{e}");
            }
        }

        tracing::info!("Closing database pool...");
        self.pool.close().await;
        tracing::info!("Graceful shutdown complete");
    }
}

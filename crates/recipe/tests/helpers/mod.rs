#![allow(dead_code)]

use std::sync::Arc;
use std::{path::PathBuf, str::FromStr};

use recipebox_db::Store;
use recipebox_recipe::{Assembler, Collaborators, Command, Provider, ProviderConfig, Tags};
use recipebox_shared::{NotificationBus, Photos, State};
use recipebox_user::{CookList, Favorites, Recents};
use sqlx::{SqlitePool, sqlite::SqliteConnectOptions};
use sqlx_migrator::{Migrate, Plan};

pub async fn setup_test_state(path: PathBuf) -> anyhow::Result<State<Store>> {
    let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.to_str().unwrap()))?
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;
    let mut conn = pool.acquire().await?;
    recipebox_db::migrator()?
        .run(&mut conn, &Plan::apply_all())
        .await?;

    Ok(State {
        store: Store::new(pool),
        bus: NotificationBus::new(64),
    })
}

pub struct Services {
    pub state: State<Store>,
    pub tags: Tags,
    pub users: recipebox_user::Command,
    pub ratings: recipebox_rating::Command,
    pub favorites: Favorites,
    pub cook_list: CookList,
    pub recents: Recents,
    pub assembler: Assembler,
    pub command: Command,
    pub provider: Provider,
}

pub fn services(state: State<Store>) -> Services {
    let photos = Photos::new("http://localhost:4000", "/photos/");
    let tags = Tags::new(state.clone());
    let users = recipebox_user::Command::new(state.clone(), photos.clone());
    let ratings = recipebox_rating::Command::new(state.clone());
    let favorites = Favorites::new(state.clone());
    let cook_list = CookList::new(state.clone());
    let recents = Recents::new(state.clone());

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
    );

    let command = Command::new(state.clone(), assembler.clone());
    let provider = Provider::new(
        state.clone(),
        assembler.clone(),
        tags.clone(),
        ratings.clone(),
        favorites.clone(),
        cook_list.clone(),
        recents.clone(),
        ProviderConfig {
            featured_limit: 3,
            page_size: 20,
            max_page_size: 50,
        },
    );

    Services {
        state,
        tags,
        users,
        ratings,
        favorites,
        cook_list,
        recents,
        assembler,
        command,
        provider,
    }
}

pub async fn register(services: &Services, username: &str) -> anyhow::Result<String> {
    Ok(services
        .users
        .register(recipebox_user::RegisterInput {
            username: username.to_owned(),
            email: format!("{username}@recipebox.local"),
        })
        .await?)
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use recipebox_db::Stored;
use recipebox_recipe::assembler::{
    CookListLookup, FavoriteLookup, PhotoLookup, RatingLookup, RatingSummary, TagLookup,
    UserLookup,
};
use recipebox_recipe::{Assembler, Collaborators, RatingInfo, RecipeRecord};
use recipebox_shared::{
    Error, Notification, NotificationBus, Picture, RatingRef, Result, Role, Target,
};
use recipebox_user::UserView;

#[derive(Default)]
struct Calls {
    tag_id: AtomicUsize,
    tag_name: AtomicUsize,
    user: AtomicUsize,
    summary: AtomicUsize,
    my_rating: AtomicUsize,
    photo: AtomicUsize,
    favorite: AtomicUsize,
    cook_list: AtomicUsize,
}

#[derive(Default)]
struct Fake {
    calls: Calls,
    tags: HashMap<String, String>,
    summaries: HashMap<String, RatingSummary>,
    user_delay: Option<Duration>,
}

impl Fake {
    fn with_tags(names: &[&str]) -> Self {
        Self {
            tags: names
                .iter()
                .map(|name| (format!("id-{name}"), name.to_string()))
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl TagLookup for Fake {
    async fn tag_id(&self, name: &str) -> Result<String> {
        self.calls.tag_id.fetch_add(1, Ordering::SeqCst);

        if name == "twice" {
            return Err(Error::Integrity("more than one tag named twice".to_owned()));
        }

        Ok(format!("id-{name}"))
    }

    async fn tag_name(&self, id: &str) -> Result<String> {
        self.calls.tag_name.fetch_add(1, Ordering::SeqCst);

        // Later tags answer first.
        let delay = 30u64.saturating_sub(id.len() as u64 * 3);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        match self.tags.get(id) {
            Some(name) => Ok(name.to_owned()),
            None => recipebox_shared::not_found!("tag {id} not found"),
        }
    }
}

#[async_trait::async_trait]
impl UserLookup for Fake {
    async fn sanitized(&self, user_id: &str) -> Result<UserView> {
        self.calls.user.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.user_delay {
            tokio::time::sleep(delay).await;
        }

        Ok(UserView {
            id: user_id.to_owned(),
            username: format!("name-{user_id}"),
            joined_at: 1,
            avatar_url: String::new(),
            role: Role::User,
        })
    }
}

#[async_trait::async_trait]
impl RatingLookup for Fake {
    async fn summary(&self, rating_id: &str) -> Result<RatingSummary> {
        self.calls.summary.fetch_add(1, Ordering::SeqCst);

        match self.summaries.get(rating_id) {
            Some(summary) => Ok(*summary),
            None => recipebox_shared::not_found!("rating {rating_id} not found"),
        }
    }

    async fn rating_for_user(&self, _recipe_id: &str, _user_id: &str) -> Result<f64> {
        self.calls.my_rating.fetch_add(1, Ordering::SeqCst);

        Ok(4.0)
    }
}

#[async_trait::async_trait]
impl PhotoLookup for Fake {
    async fn url(&self, filename: &str) -> Result<String> {
        self.calls.photo.fetch_add(1, Ordering::SeqCst);

        Ok(format!("http://photos/{filename}"))
    }
}

#[async_trait::async_trait]
impl FavoriteLookup for Fake {
    async fn is_favorite(&self, _recipe_id: &str, _viewer_id: &str) -> Result<bool> {
        self.calls.favorite.fetch_add(1, Ordering::SeqCst);

        Ok(true)
    }
}

#[async_trait::async_trait]
impl CookListLookup for Fake {
    async fn is_on_cook_list(&self, _recipe_id: &str, _viewer_id: &str) -> Result<bool> {
        self.calls.cook_list.fetch_add(1, Ordering::SeqCst);

        Ok(false)
    }
}

fn assembler(fake: &Arc<Fake>, bus: NotificationBus) -> Assembler {
    Assembler::new(
        Collaborators {
            tags: fake.clone(),
            users: fake.clone(),
            ratings: fake.clone(),
            photos: fake.clone(),
            favorites: fake.clone(),
            cook_list: fake.clone(),
        },
        bus,
    )
}

fn record(id: &str, tags: &[&str]) -> Stored<RecipeRecord> {
    Stored {
        id: id.to_owned(),
        version: 1,
        created_at: 0,
        updated_at: 0,
        data: RecipeRecord {
            name: format!("recipe {id}"),
            description: String::new(),
            ingredients: vec![],
            steps: vec!["mix".to_owned()],
            tags: tags.iter().map(|t| format!("id-{t}")).collect(),
            owner: "u1".to_owned(),
            rating: RatingRef::Unrated,
            picture: Picture::None,
            creation_timestamp: 10,
            update_timestamp: 20,
        },
    }
}

#[tokio::test]
async fn test_convert_recipe_without_viewer() -> anyhow::Result<()> {
    let fake = Arc::new(Fake::with_tags(&["dessert", "vegan"]));
    let bus = NotificationBus::new(8);
    let mut rx = bus.subscribe();
    let assembler = assembler(&fake, bus);

    let recipe = assembler
        .convert_recipe(&record("r1", &["dessert", "vegan"]), None)
        .await?;

    assert_eq!(recipe.owner.id, "u1");
    assert_eq!(recipe.owner.username, "name-u1");
    assert_eq!(recipe.tags, vec!["dessert", "vegan"]);
    assert_eq!(recipe.rating, RatingInfo::default());
    assert_eq!(recipe.picture, "");
    assert_eq!(recipe.is_favorite, None);
    assert_eq!(recipe.my_rating, None);
    assert_eq!(recipe.is_on_cook_list, None);

    assert_eq!(fake.calls.summary.load(Ordering::SeqCst), 0);
    assert_eq!(fake.calls.photo.load(Ordering::SeqCst), 0);
    assert_eq!(fake.calls.favorite.load(Ordering::SeqCst), 0);
    assert_eq!(fake.calls.my_rating.load(Ordering::SeqCst), 0);
    assert_eq!(fake.calls.cook_list.load(Ordering::SeqCst), 0);
    assert!(rx.try_recv().is_err());

    let json = serde_json::to_value(&recipe)?;
    assert_eq!(json["rating"]["averageRating"], 0.0);
    assert_eq!(json["rating"]["numberOfRatings"], 0);
    assert!(json.get("isFavorite").is_none());
    assert!(json.get("myRating").is_none());

    Ok(())
}

#[tokio::test]
async fn test_convert_recipe_with_viewer_personalizes_and_records_view() -> anyhow::Result<()> {
    let mut fake = Fake::with_tags(&["soup"]);
    fake.summaries.insert(
        "c1".to_owned(),
        RatingSummary {
            average_rating: Some(3.5),
            number_of_ratings: 2,
        },
    );
    let fake = Arc::new(fake);
    let bus = NotificationBus::new(8);
    let mut rx = bus.subscribe();
    let assembler = assembler(&fake, bus);

    let mut stored = record("r1", &["soup"]);
    stored.rating = RatingRef::Collection("c1".to_owned());
    stored.picture = Picture::File("soup.webp".to_owned());

    let recipe = assembler.convert_recipe(&stored, Some("u2")).await?;

    assert_eq!(
        recipe.rating,
        RatingInfo {
            average_rating: 3.5,
            number_of_ratings: 2
        }
    );
    assert_eq!(recipe.picture, "http://photos/soup.webp");
    assert_eq!(recipe.is_favorite, Some(true));
    assert_eq!(recipe.my_rating, Some(4.0));
    assert_eq!(recipe.is_on_cook_list, Some(false));

    assert_eq!(
        rx.try_recv()?,
        Notification::RecipeViewed {
            recipe_id: "r1".to_owned(),
            user_id: "u2".to_owned(),
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_rating_without_average_assembles_as_zero() -> anyhow::Result<()> {
    let mut fake = Fake::default();
    fake.summaries.insert(
        "c1".to_owned(),
        RatingSummary {
            average_rating: None,
            number_of_ratings: 0,
        },
    );
    let fake = Arc::new(fake);
    let assembler = assembler(&fake, NotificationBus::new(8));

    let info = assembler
        .convert_rating_ref_to_info(&RatingRef::Collection("c1".to_owned()))
        .await?;
    assert_eq!(info, RatingInfo::default());

    let info = assembler
        .convert_rating_ref_to_info(&RatingRef::Unrated)
        .await?;
    assert_eq!(info, RatingInfo::default());
    assert_eq!(fake.calls.summary.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_convert_recipes_preserves_order_without_recording_views() -> anyhow::Result<()> {
    let fake = Arc::new(Fake::with_tags(&["a", "bb", "ccc", "dddd"]));
    let bus = NotificationBus::new(8);
    let mut rx = bus.subscribe();
    let assembler = assembler(&fake, bus);

    let records = vec![
        record("r1", &["a"]),
        record("r2", &["bb"]),
        record("r3", &["ccc", "dddd"]),
    ];

    let recipes = assembler.convert_recipes(&records, Some("u2")).await?;
    let ids: Vec<_> = recipes.iter().map(|r| r.id.as_str()).collect();

    assert_eq!(ids, vec!["r1", "r2", "r3"]);
    assert_eq!(recipes[2].tags, vec!["ccc", "dddd"]);
    assert!(recipes.iter().all(|r| r.is_favorite == Some(true)));
    assert!(rx.try_recv().is_err());

    Ok(())
}

#[tokio::test]
async fn test_tag_conversion_keeps_input_order() -> anyhow::Result<()> {
    let fake = Arc::new(Fake::with_tags(&["x", "yy", "zzz"]));
    let assembler = assembler(&fake, NotificationBus::new(8));

    let names = vec!["zzz".to_owned(), "x".to_owned(), "yy".to_owned()];
    let ids = assembler.convert_tags_to_id(&names).await?;
    assert_eq!(ids, vec!["id-zzz", "id-x", "id-yy"]);

    let back = assembler.convert_tags_to_name(&ids).await?;
    assert_eq!(back, names);

    Ok(())
}

#[tokio::test]
async fn test_unresolved_tag_names_the_target() -> anyhow::Result<()> {
    let fake = Arc::new(Fake::with_tags(&["known"]));
    let assembler = assembler(&fake, NotificationBus::new(8));

    let err = assembler
        .convert_recipe(&record("r1", &["known", "missing"]), None)
        .await
        .unwrap_err();

    assert_eq!(err.target(), Some(Target::Tag));
    assert!(err.is_not_found());

    let records = vec![record("r1", &["known"]), record("r2", &["missing"])];
    let err = assembler
        .convert_recipes(&records, None)
        .await
        .unwrap_err();
    assert_eq!(err.target(), Some(Target::Tag));

    Ok(())
}

#[tokio::test]
async fn test_integrity_violation_is_not_wrapped() -> anyhow::Result<()> {
    let fake = Arc::new(Fake::default());
    let assembler = assembler(&fake, NotificationBus::new(8));

    let err = assembler
        .convert_tags_to_id(&["ok".to_owned(), "twice".to_owned()])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Integrity(_)));

    Ok(())
}

#[tokio::test]
async fn test_slow_collaborator_times_out() -> anyhow::Result<()> {
    let fake = Arc::new(Fake {
        user_delay: Some(Duration::from_secs(5)),
        ..Default::default()
    });
    let bus = NotificationBus::new(8);
    let mut rx = bus.subscribe();
    let assembler = assembler(&fake, bus).timeout(Duration::from_millis(50));

    let err = assembler
        .convert_recipe(&record("r1", &[]), Some("u2"))
        .await
        .unwrap_err();

    match err {
        Error::Resolution { target, source } => {
            assert_eq!(target, Target::User);
            assert!(matches!(*source, Error::Timeout));
        }
        other => panic!("expected a resolution error, got {other:?}"),
    }
    assert!(rx.try_recv().is_err());

    Ok(())
}

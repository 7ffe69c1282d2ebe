use recipebox_db::Page;
use recipebox_recipe::{CreateInput, FilterInput, RecipeSubscriber};
use recipebox_shared::{Error, notification::drain};
use temp_dir::TempDir;

mod helpers;

fn input(name: &str, tags: &[&str]) -> CreateInput {
    CreateInput {
        name: name.to_owned(),
        steps: vec!["cook".to_owned()],
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Default::default()
    }
}

fn tag_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn names(recipes: &[recipebox_recipe::AssembledRecipe]) -> Vec<&str> {
    recipes.iter().map(|r| r.name.as_str()).collect()
}

struct Fixture {
    services: helpers::Services,
    alice: String,
    bob: String,
    soup: String,
    salad: String,
    cake: String,
}

async fn fixture(dir: &TempDir) -> anyhow::Result<Fixture> {
    let state = helpers::setup_test_state(dir.child("db.sqlite3")).await?;
    let mut rx = state.bus.subscribe();
    let services = helpers::services(state);
    let alice = helpers::register(&services, "alice").await?;
    let bob = helpers::register(&services, "bob").await?;

    let soup = services
        .command
        .create(&alice, input("Tomato Soup", &["vegan", "warm"]))
        .await?
        .recipe_id;
    let salad = services
        .command
        .create(&alice, input("Green Salad", &["vegan", "cold"]))
        .await?
        .recipe_id;
    let cake = services
        .command
        .create(&bob, input("Cheese Cake", &["sweet"]))
        .await?
        .recipe_id;

    services.ratings.add(&soup, &bob, 5.0).await?;
    services.ratings.add(&salad, &bob, 2.0).await?;
    services.ratings.add(&salad, &alice, 3.0).await?;

    drain(&RecipeSubscriber(services.command.clone()), &mut rx).await;

    Ok(Fixture {
        services,
        alice,
        bob,
        soup,
        salad,
        cake,
    })
}

#[tokio::test]
async fn test_get_by_id_unknown_is_not_found() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let f = fixture(&dir).await?;

    let err = f.services.provider.get_by_id("nope", None).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_from_user_and_by_name() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let f = fixture(&dir).await?;
    let provider = &f.services.provider;

    let recipes = provider.from_user(&f.alice, None, None).await?;
    assert_eq!(names(&recipes), vec!["Tomato Soup", "Green Salad"]);

    let recipes = provider.from_user(&f.alice, Some(Page::new(2, 1)), None).await?;
    assert_eq!(names(&recipes), vec!["Green Salad"]);

    let recipes = provider.by_name("cAKe", None, Some(&f.alice)).await?;
    assert_eq!(names(&recipes), vec!["Cheese Cake"]);
    assert_eq!(recipes[0].owner.id, f.bob);
    assert_eq!(recipes[0].my_rating, Some(0.0));

    let err = provider.by_name("c", None, None).await.unwrap_err();
    assert!(matches!(err, Error::Validate(_)));

    Ok(())
}

#[tokio::test]
async fn test_by_tags_union_and_intersection() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let f = fixture(&dir).await?;
    let provider = &f.services.provider;

    let recipes = provider
        .by_tags(&tag_names(&["warm", "sweet"]), false, None, None)
        .await?;
    assert_eq!(names(&recipes), vec!["Tomato Soup", "Cheese Cake"]);

    let recipes = provider
        .by_tags(&tag_names(&["vegan", "cold"]), true, None, None)
        .await?;
    assert_eq!(names(&recipes), vec!["Green Salad"]);

    let recipes = provider
        .by_tags(&tag_names(&["vegan", "unknown"]), true, None, None)
        .await?;
    assert!(recipes.is_empty());

    let recipes = provider
        .by_tags(&tag_names(&["vegan", "unknown"]), false, None, None)
        .await?;
    assert_eq!(recipes.len(), 2);

    assert!(f.services.tags.find_by_name("unknown").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_by_min_rating() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let f = fixture(&dir).await?;
    let provider = &f.services.provider;

    let recipes = provider.by_min_rating(2.5, None, None).await?;
    assert_eq!(names(&recipes), vec!["Tomato Soup", "Green Salad"]);
    assert_eq!(recipes[1].rating.average_rating, 2.5);

    let recipes = provider.by_min_rating(4.0, None, None).await?;
    assert_eq!(names(&recipes), vec!["Tomato Soup"]);

    let recipes = provider.by_min_rating(5.5, None, None).await?;
    assert!(recipes.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_filter_combines_criteria() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let f = fixture(&dir).await?;
    let provider = &f.services.provider;

    let recipes = provider.filter(FilterInput::default(), None, None).await?;
    assert_eq!(recipes.len(), 3);

    let recipes = provider
        .filter(
            FilterInput {
                text: "a".to_owned(),
                rating_min: 2.5,
                tags: vec!["vegan".to_owned()],
            },
            None,
            None,
        )
        .await?;
    assert_eq!(names(&recipes), vec!["Tomato Soup", "Green Salad"]);

    let recipes = provider
        .filter(
            FilterInput {
                text: "salad".to_owned(),
                rating_min: 3.0,
                tags: vec![],
            },
            None,
            None,
        )
        .await?;
    assert!(recipes.is_empty());

    let recipes = provider
        .filter(
            FilterInput {
                text: String::new(),
                rating_min: 0.0,
                tags: vec!["sweet".to_owned()],
            },
            None,
            None,
        )
        .await?;
    assert_eq!(names(&recipes), vec!["Cheese Cake"]);

    Ok(())
}

#[tokio::test]
async fn test_featured_is_limited() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let f = fixture(&dir).await?;

    f.services
        .command
        .create(&f.bob, input("Apple Pie", &["sweet"]))
        .await?;

    let recipes = f.services.provider.featured(None).await?;
    assert_eq!(
        names(&recipes),
        vec!["Tomato Soup", "Green Salad", "Cheese Cake"]
    );

    Ok(())
}

#[tokio::test]
async fn test_user_lists_keep_their_order() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let f = fixture(&dir).await?;
    let services = &f.services;

    services.favorites.add(&f.bob, &f.cake).await?;
    services.favorites.add(&f.bob, "gone").await?;
    services.favorites.add(&f.bob, &f.soup).await?;
    services.cook_list.add(&f.bob, &f.salad).await?;

    let favorites = services.provider.favorites_of(&f.bob).await?;
    assert_eq!(names(&favorites), vec!["Cheese Cake", "Tomato Soup"]);
    assert!(favorites.iter().all(|r| r.is_favorite == Some(true)));

    let cook_list = services.provider.cook_list_of(&f.bob).await?;
    assert_eq!(names(&cook_list), vec!["Green Salad"]);
    assert_eq!(cook_list[0].is_on_cook_list, Some(true));
    assert_eq!(cook_list[0].my_rating, Some(2.0));

    assert!(services.provider.recents_of(&f.bob).await?.is_empty());

    Ok(())
}

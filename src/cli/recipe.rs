use anyhow::Result;
use recipebox::{App, config::Config};

pub async fn show(config: Config, recipe_id: String, viewer: Option<String>) -> Result<()> {
    let app = App::start(&config).await?;

    let result = app.provider.get_by_id(&recipe_id, viewer.as_deref()).await;

    app.shutdown().await;

    let recipe = result?;
    println!("{}", serde_json::to_string_pretty(&recipe)?);

    Ok(())
}

pub async fn rate(
    config: Config,
    recipe_id: String,
    user: String,
    value: Option<f64>,
) -> Result<()> {
    let app = App::start(&config).await?;

    // No value means --remove.
    let result = match value {
        Some(value) => app.ratings.add(&recipe_id, &user, value).await,
        None => app.ratings.remove(&recipe_id, &user).await,
    };

    app.shutdown().await;

    let response = result?;
    if !response.success {
        tracing::warn!(recipe_id, user, "{}", response.message);
    }

    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

use crate::auth::hash_password;
use crate::models::{post, user};
use sea_orm::*;

/// Seed a demo account with a few posts. Safe to run repeatedly.
pub async fn seed_demo_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    let now = chrono::Utc::now().to_rfc3339();

    let demo_password = hash_password("demo").unwrap();
    let demo = user::ActiveModel {
        username: Set("demo".to_owned()),
        password_hash: Set(demo_password),
        created_at: Set(now.clone()),
        updated_at: Set(now.clone()),
        ..Default::default()
    };

    user::Entity::insert(demo)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let Some(owner) = user::Entity::find()
        .filter(user::Column::Username.eq("demo"))
        .one(db)
        .await?
    else {
        return Ok(());
    };

    // Only seed posts once
    let existing = post::Entity::find()
        .filter(post::Column::UserId.eq(owner.id))
        .count(db)
        .await?;
    if existing > 0 {
        return Ok(());
    }

    let samples = [
        ("Hello, inkpost", Some("A first draft to play with."), false),
        ("Publishing works", Some("This one is already live."), true),
        ("Untitled thoughts", None, false),
    ];
    for (title, content, published) in samples {
        let draft = post::ActiveModel {
            user_id: Set(owner.id),
            title: Set(title.to_owned()),
            content: Set(content.map(str::to_owned)),
            published: Set(published),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        };
        draft.insert(db).await?;
    }

    Ok(())
}

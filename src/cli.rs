use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::fs;

use crate::models::{Folder, Note, Tag};

#[derive(Deserialize)]
struct SeedData {
    #[serde(default)]
    folders: Vec<SeedFolder>,
    #[serde(default)]
    tags: Vec<SeedTag>,
    #[serde(default)]
    notes: Vec<SeedNote>,
}

#[derive(Deserialize)]
struct SeedFolder {
    name: String,
}

#[derive(Deserialize)]
struct SeedTag {
    name: String,
}

#[derive(Deserialize)]
struct SeedNote {
    title: String,
    content: Option<String>,
    // Fixtures reference folders and tags by name; ids are generated here.
    folder: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Wipe all collections and load the fixtures from `file_path`.
pub async fn seed_database(
    pool: &SqlitePool,
    file_path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let data: SeedData = serde_json::from_str(&content)?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM note_tags").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM notes").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM tags").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM folders").execute(&mut *tx).await?;

    let mut folder_ids: HashMap<String, String> = HashMap::new();
    for seed in &data.folders {
        let folder = Folder::new(seed.name.clone());
        sqlx::query("INSERT INTO folders (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&folder.id)
            .bind(&folder.name)
            .bind(&folder.created_at)
            .bind(&folder.updated_at)
            .execute(&mut *tx)
            .await?;
        folder_ids.insert(seed.name.clone(), folder.id);
    }

    let mut tag_ids: HashMap<String, String> = HashMap::new();
    for seed in &data.tags {
        let tag = Tag::new(seed.name.clone());
        sqlx::query(
            "INSERT INTO tags (id, name, normalized, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&tag.id)
        .bind(&tag.name)
        .bind(&tag.normalized)
        .bind(&tag.created_at)
        .bind(&tag.updated_at)
        .execute(&mut *tx)
        .await?;
        tag_ids.insert(seed.name.clone(), tag.id);
    }

    for seed in &data.notes {
        let folder_id = match &seed.folder {
            Some(name) => Some(
                folder_ids
                    .get(name)
                    .cloned()
                    .ok_or_else(|| format!("Unknown folder '{name}'"))?,
            ),
            None => None,
        };

        let note = Note::new(seed.title.clone(), seed.content.clone(), folder_id);
        sqlx::query(
            r#"
            INSERT INTO notes (id, title, content, folder_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&note.id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.folder_id)
        .bind(&note.created_at)
        .bind(&note.updated_at)
        .execute(&mut *tx)
        .await?;

        for tag_name in &seed.tags {
            let tag_id = tag_ids
                .get(tag_name)
                .ok_or_else(|| format!("Unknown tag '{tag_name}'"))?;

            sqlx::query("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?, ?)")
                .bind(&note.id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    println!(
        "Seeded {} folders, {} tags, {} notes",
        data.folders.len(),
        data.tags.len(),
        data.notes.len()
    );

    Ok(())
}

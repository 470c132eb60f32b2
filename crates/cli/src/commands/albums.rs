use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use photoalbum_core::catalog::Catalog;
use photoalbum_core::domain::{AlbumId, PhotoId};
use photoalbum_core::Library;

pub fn list<C: Catalog>(library: &Library<C>, json: bool) -> Result<()> {
    let albums = library.album_summaries()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&albums)?);
        return Ok(());
    }

    if albums.is_empty() {
        println!("No albums yet. Run `photoalbum upload <path>` first.");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID"),
        Cell::new("Order"),
        Cell::new("Album"),
        Cell::new("Photos"),
    ]);

    for summary in &albums {
        table.add_row(vec![
            Cell::new(summary.album.id),
            Cell::new(summary.album.order),
            Cell::new(&summary.album.name),
            Cell::new(summary.photo_count),
        ]);
    }

    println!("{table}");
    Ok(())
}

pub fn photos<C: Catalog>(library: &Library<C>, album_id: i64) -> Result<()> {
    let album = library.album(AlbumId(album_id))?;
    let photos = library.photo_infos_in_album(album.id)?;

    println!("Album #{} {} ({} photos)", album.id, album.name, photos.len());
    println!("{}", "-".repeat(60));

    for photo in &photos {
        println!(
            "  #{:<6} {} ({}, {:.1} KB, {})",
            photo.id,
            photo.name,
            photo.media_type,
            photo.size as f64 / 1024.0,
            photo.date,
        );
    }

    Ok(())
}

pub fn reorder<C: Catalog>(library: &Library<C>, album_ids: &[i64]) -> Result<()> {
    let sequence: Vec<AlbumId> = album_ids.iter().copied().map(AlbumId).collect();
    library.reorder(&sequence)?;
    println!("Album order updated.");
    list(library, false)
}

pub fn remove_photo<C: Catalog>(library: &Library<C>, photo_id: i64) -> Result<()> {
    let photo = library.photo(PhotoId(photo_id))?;
    library.delete_photo(photo.id)?;
    println!("Removed photo #{} ({})", photo.id, photo.name);
    Ok(())
}

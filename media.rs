//! Content-addressed media storage for wall photos and beta videos.
//!
//! Files are named by the xxh3 hash of their bytes, so re-importing the
//! same photo or clip is a no-op. Deletes are best-effort: the catalog
//! entry goes away regardless, and anything left behind shows up in the
//! orphan sweep.

use image::imageops::FilterType;
use image::ImageFormat;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use xxhash_rust::xxh3::xxh3_128;

use crate::config::AppPaths;
use crate::error::{Error, Result};
use crate::models::{Library, WallImage};

const THUMB_MAX_DIM: u32 = 320;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v"];

/// Stores a wall photo, probing its natural pixel size and generating a
/// thumbnail. The photo bytes are written verbatim.
pub fn store_wall_image(paths: &AppPaths, bytes: &[u8]) -> Result<WallImage> {
    let format = image::guess_format(bytes)?;
    let ext = match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Png => "png",
        other => return Err(Error::UnsupportedMedia(format!("{other:?}"))),
    };

    let decoded = image::load_from_memory(bytes)?;
    let hash = xxh3_128(bytes);
    let file_name = format!("{hash:x}.{ext}");
    let dest = paths.images_dir.join(&file_name);
    if !dest.exists() {
        fs::write(&dest, bytes)?;
    }

    let thumb_name = match build_thumbnail(&decoded, &paths.thumbs_dir, hash) {
        Ok(name) => Some(name),
        Err(err) => {
            log::warn!("Thumbnail generation failed for {}: {}", file_name, err);
            None
        }
    };

    Ok(WallImage {
        file_name,
        width: decoded.width(),
        height: decoded.height(),
        thumb_name,
    })
}

fn build_thumbnail(
    image: &image::DynamicImage,
    dest_dir: &Path,
    hash: u128,
) -> Result<String> {
    fs::create_dir_all(dest_dir)?;
    let resized = image.resize(THUMB_MAX_DIM, THUMB_MAX_DIM, FilterType::CatmullRom);
    let file_name = format!("{hash:x}_thumb.jpg");
    resized.to_rgb8().save(dest_dir.join(&file_name))?;
    Ok(file_name)
}

/// Stores a beta video clip. The bytes are never inspected; only the
/// extension is checked against the playable set.
pub fn store_beta_video(paths: &AppPaths, bytes: &[u8], ext: &str) -> Result<String> {
    let ext = ext.trim_start_matches('.').to_lowercase();
    if !VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        return Err(Error::UnsupportedMedia(ext));
    }
    let hash = xxh3_128(bytes);
    let file_name = format!("{hash:x}.{ext}");
    let dest = paths.videos_dir.join(&file_name);
    if !dest.exists() {
        fs::write(&dest, bytes)?;
    }
    Ok(file_name)
}

pub fn wall_image_path(paths: &AppPaths, image: &WallImage) -> PathBuf {
    paths.images_dir.join(&image.file_name)
}

pub fn beta_video_path(paths: &AppPaths, file_name: &str) -> PathBuf {
    paths.videos_dir.join(file_name)
}

/// Releases a wall photo and its thumbnail, best-effort.
pub fn delete_wall_image(paths: &AppPaths, image: &WallImage) {
    remove_file_best_effort(&paths.images_dir.join(&image.file_name));
    if let Some(thumb) = &image.thumb_name {
        remove_file_best_effort(&paths.thumbs_dir.join(thumb));
    }
}

/// Releases a stored clip, best-effort.
pub fn delete_beta_video_file(paths: &AppPaths, file_name: &str) {
    remove_file_best_effort(&paths.videos_dir.join(file_name));
}

fn remove_file_best_effort(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            log::warn!("Failed to delete {}: {}", path.display(), err);
        }
    }
}

/// Walks the media directories and reports files the library no longer
/// references. Orphans are logged and returned, never deleted here.
pub fn sweep_orphans(paths: &AppPaths, library: &Library) -> Vec<PathBuf> {
    let mut referenced: HashSet<String> = HashSet::new();
    for wall in &library.walls {
        referenced.insert(wall.image.file_name.clone());
        if let Some(thumb) = &wall.image.thumb_name {
            referenced.insert(thumb.clone());
        }
        for climb in wall.climbs() {
            for video in &climb.beta_videos {
                referenced.insert(video.file_name.clone());
            }
        }
    }

    let mut orphans = Vec::new();
    for dir in [&paths.images_dir, &paths.videos_dir, &paths.thumbs_dir] {
        for entry in WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if !referenced.contains(&name) {
                log::warn!("Orphaned media file: {}", entry.path().display());
                orphans.push(entry.into_path());
            }
        }
    }
    orphans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Wall;
    use image::RgbImage;
    use std::io::Cursor;

    fn scratch_paths(name: &str) -> AppPaths {
        let root = std::env::temp_dir().join("homewall_test_media").join(name);
        let _ = fs::remove_dir_all(&root);
        AppPaths::at(root).unwrap()
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]);
        }
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn stores_image_with_probed_dimensions_and_thumbnail() {
        let paths = scratch_paths("image");
        let stored = store_wall_image(&paths, &png_bytes(640, 480)).unwrap();
        assert_eq!(stored.width, 640);
        assert_eq!(stored.height, 480);
        assert!(paths.images_dir.join(&stored.file_name).exists());
        let thumb = stored.thumb_name.expect("thumbnail");
        assert!(paths.thumbs_dir.join(thumb).exists());
        let _ = fs::remove_dir_all(&paths.root);
    }

    #[test]
    fn storing_the_same_bytes_twice_reuses_the_file() {
        let paths = scratch_paths("dedupe");
        let bytes = png_bytes(64, 64);
        let first = store_wall_image(&paths, &bytes).unwrap();
        let second = store_wall_image(&paths, &bytes).unwrap();
        assert_eq!(first.file_name, second.file_name);
        let _ = fs::remove_dir_all(&paths.root);
    }

    #[test]
    fn rejects_non_image_bytes() {
        let paths = scratch_paths("garbage");
        assert!(store_wall_image(&paths, b"definitely not an image").is_err());
        let _ = fs::remove_dir_all(&paths.root);
    }

    #[test]
    fn stores_and_deletes_video_files() {
        let paths = scratch_paths("video");
        let file_name = store_beta_video(&paths, b"fake clip bytes", "MP4").unwrap();
        assert!(file_name.ends_with(".mp4"));
        let path = beta_video_path(&paths, &file_name);
        assert!(path.exists());

        delete_beta_video_file(&paths, &file_name);
        assert!(!path.exists());
        // Deleting again is quietly tolerated.
        delete_beta_video_file(&paths, &file_name);
        let _ = fs::remove_dir_all(&paths.root);
    }

    #[test]
    fn rejects_unplayable_video_extensions() {
        let paths = scratch_paths("badext");
        assert!(matches!(
            store_beta_video(&paths, b"bytes", "exe"),
            Err(Error::UnsupportedMedia(_))
        ));
        let _ = fs::remove_dir_all(&paths.root);
    }

    #[test]
    fn sweep_reports_unreferenced_files_only() {
        let paths = scratch_paths("sweep");
        let stored = store_wall_image(&paths, &png_bytes(32, 32)).unwrap();
        let stray = store_beta_video(&paths, b"stray clip", "mp4").unwrap();

        let mut library = Library::default();
        library.walls.push(Wall::new("Shed", stored));

        let orphans = sweep_orphans(&paths, &library);
        assert_eq!(orphans.len(), 1);
        assert!(orphans[0].ends_with(&stray));
        let _ = fs::remove_dir_all(&paths.root);
    }
}

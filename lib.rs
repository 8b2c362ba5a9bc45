//! Offline model core for a home climbing wall app.
//!
//! A wall is a photographed climbing surface; climbs are routes marked on
//! the photo as colored holds; established climbs collect ticks (logged
//! sends) and beta videos. Everything lives in one local JSON snapshot plus
//! a content-addressed media directory; there is no server.
//!
//! [`AppState`] is the single state container. UI layers call its command
//! methods and redraw from the accessors; transient screen state (the
//! gesture editor, the zoom/pan viewport) lives in [`geometry`] and is
//! never persisted. To edit a draft climb's holds, clone the climb, mutate
//! it through [`models::Climb::holds_mut`] (driven by a
//! [`geometry::HoldEditor`]), and hand it back to [`AppState::update_climb`].

pub mod config;
pub mod error;
pub mod filters;
pub mod geometry;
pub mod grades;
pub mod media;
pub mod models;
pub mod store;

use chrono::Utc;
use uuid::Uuid;

use crate::config::{AppPaths, Settings};
use crate::error::{Error, Result};
use crate::filters::{ClimbFilters, Session};
use crate::geometry::{HoldEditor, RenderedHold, Size};
use crate::models::{BetaVideo, Climb, Library, Playlist, Wall};

pub struct AppState {
    paths: AppPaths,
    settings: Settings,
    library: Library,
}

impl AppState {
    /// Opens the library rooted at `paths`, loading whatever snapshot is
    /// present (an empty library on first run).
    pub fn open(paths: AppPaths, settings: Settings) -> Self {
        let library = store::load(&paths.library_path);
        Self {
            paths,
            settings,
            library,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn walls(&self) -> &[Wall] {
        &self.library.walls
    }

    pub fn wall(&self, wall_id: Uuid) -> Result<&Wall> {
        self.library
            .wall(wall_id)
            .ok_or(Error::WallNotFound(wall_id))
    }

    pub fn climb(&self, wall_id: Uuid, climb_id: Uuid) -> Result<&Climb> {
        self.wall(wall_id)?
            .climb(climb_id)
            .ok_or(Error::ClimbNotFound(climb_id))
    }

    /// Writes the full snapshot. On failure the error is returned to the
    /// caller while the in-memory mutation stands; the next successful
    /// save repairs the file.
    fn persist(&self) -> Result<()> {
        store::save(&self.paths.library_path, &self.library)
    }

    fn wall_mut(&mut self, wall_id: Uuid) -> Result<&mut Wall> {
        self.library
            .wall_mut(wall_id)
            .ok_or(Error::WallNotFound(wall_id))
    }

    fn climb_mut(&mut self, wall_id: Uuid, climb_id: Uuid) -> Result<&mut Climb> {
        self.wall_mut(wall_id)?
            .climb_mut(climb_id)
            .ok_or(Error::ClimbNotFound(climb_id))
    }

    fn find_climb(&self, climb_id: Uuid) -> Option<&Climb> {
        self.library.walls.iter().find_map(|w| w.climb(climb_id))
    }

    // ----- walls -----

    /// Creates a wall from a captured photo, probing its natural pixel
    /// size and storing the bytes plus a thumbnail in the media store.
    pub fn create_wall(&mut self, name: &str, image_bytes: &[u8]) -> Result<Uuid> {
        let image = media::store_wall_image(&self.paths, image_bytes)?;
        let wall = Wall::new(name, image);
        let wall_id = wall.id;
        self.library.walls.push(wall);
        self.persist()?;
        Ok(wall_id)
    }

    pub fn rename_wall(&mut self, wall_id: Uuid, name: &str) -> Result<()> {
        self.wall_mut(wall_id)?.name = name.to_string();
        self.persist()
    }

    /// Deletes a wall and everything it owns. Media files go best-effort;
    /// playlists keep their now-dangling climb ids.
    pub fn delete_wall(&mut self, wall_id: Uuid) -> Result<()> {
        let index = self
            .library
            .walls
            .iter()
            .position(|w| w.id == wall_id)
            .ok_or(Error::WallNotFound(wall_id))?;
        let wall = self.library.walls.remove(index);
        media::delete_wall_image(&self.paths, &wall.image);
        for climb in wall.climbs() {
            for video in &climb.beta_videos {
                media::delete_beta_video_file(&self.paths, &video.file_name);
            }
        }
        self.persist()
    }

    // ----- climbs -----

    /// Appends a new draft climb with an auto-generated name and an empty
    /// hold list.
    pub fn create_climb(&mut self, wall_id: Uuid) -> Result<Uuid> {
        let wall = self.wall_mut(wall_id)?;
        let climb = Climb::new(wall.next_climb_name());
        let climb_id = climb.id;
        wall.add_climb(climb);
        self.persist()?;
        Ok(climb_id)
    }

    /// Replace-by-id with a fully formed entity; there is no partial-patch
    /// path.
    pub fn update_climb(&mut self, wall_id: Uuid, climb: Climb) -> Result<()> {
        self.wall_mut(wall_id)?.replace_climb(climb)?;
        self.persist()
    }

    /// Removes a climb, deleting its beta video files best-effort.
    /// Playlists referencing the climb are left alone; readers filter the
    /// dangling ids.
    pub fn delete_climb(&mut self, wall_id: Uuid, climb_id: Uuid) -> Result<()> {
        let wall = self.wall_mut(wall_id)?;
        let climb = wall
            .remove_climb(climb_id)
            .ok_or(Error::ClimbNotFound(climb_id))?;
        for video in &climb.beta_videos {
            media::delete_beta_video_file(&self.paths, &video.file_name);
        }
        self.persist()
    }

    /// One-way draft -> established transition; requires at least one hold
    /// and a nonempty name, and freezes the hold list.
    pub fn establish_climb(&mut self, wall_id: Uuid, climb_id: Uuid) -> Result<()> {
        self.climb_mut(wall_id, climb_id)?.establish()?;
        self.persist()
    }

    /// Logs a send now. Grade and rating ride along and overwrite the
    /// stored values when provided.
    pub fn tick_climb(
        &mut self,
        wall_id: Uuid,
        climb_id: Uuid,
        difficulty: Option<String>,
        rating: Option<u8>,
    ) -> Result<()> {
        self.climb_mut(wall_id, climb_id)?
            .record_tick(Utc::now(), difficulty, rating)?;
        self.persist()
    }

    /// Reverses every logged send: ticks, grade and rating all reset.
    pub fn clear_ticks(&mut self, wall_id: Uuid, climb_id: Uuid) -> Result<()> {
        self.climb_mut(wall_id, climb_id)?.clear_ticks();
        self.persist()
    }

    // ----- beta videos -----

    pub fn add_beta_video(
        &mut self,
        wall_id: Uuid,
        climb_id: Uuid,
        video_bytes: &[u8],
        ext: &str,
        uploader: &str,
        notes: Option<String>,
    ) -> Result<Uuid> {
        let file_name = media::store_beta_video(&self.paths, video_bytes, ext)?;
        let video = BetaVideo {
            id: Uuid::new_v4(),
            file_name,
            uploader: uploader.to_string(),
            uploaded_at: Utc::now(),
            notes,
        };
        let video_id = video.id;
        self.climb_mut(wall_id, climb_id)?.beta_videos.push(video);
        self.persist()?;
        Ok(video_id)
    }

    /// Removes a beta video from the climb and deletes its file
    /// best-effort; a failed file delete never restores the list entry.
    pub fn remove_beta_video(
        &mut self,
        wall_id: Uuid,
        climb_id: Uuid,
        video_id: Uuid,
    ) -> Result<()> {
        let climb = self.climb_mut(wall_id, climb_id)?;
        let index = climb
            .beta_videos
            .iter()
            .position(|v| v.id == video_id)
            .ok_or(Error::BetaVideoNotFound(video_id))?;
        let video = climb.beta_videos.remove(index);
        media::delete_beta_video_file(&self.paths, &video.file_name);
        self.persist()
    }

    // ----- playlists -----

    pub fn create_playlist(&mut self, name: &str) -> Result<Uuid> {
        let playlist = Playlist::new(name);
        let playlist_id = playlist.id;
        self.library.playlists.push(playlist);
        self.persist()?;
        Ok(playlist_id)
    }

    pub fn rename_playlist(&mut self, playlist_id: Uuid, name: &str) -> Result<()> {
        self.library
            .playlist_mut(playlist_id)
            .ok_or(Error::PlaylistNotFound(playlist_id))?
            .name = name.to_string();
        self.persist()
    }

    pub fn delete_playlist(&mut self, playlist_id: Uuid) -> Result<()> {
        let before = self.library.playlists.len();
        self.library.playlists.retain(|p| p.id != playlist_id);
        if self.library.playlists.len() == before {
            return Err(Error::PlaylistNotFound(playlist_id));
        }
        self.persist()
    }

    pub fn add_to_playlist(&mut self, playlist_id: Uuid, climb_id: Uuid) -> Result<()> {
        if !self.library.climb_exists(climb_id) {
            return Err(Error::ClimbNotFound(climb_id));
        }
        self.library
            .playlist_mut(playlist_id)
            .ok_or(Error::PlaylistNotFound(playlist_id))?
            .add(climb_id);
        self.persist()
    }

    pub fn remove_from_playlist(&mut self, playlist_id: Uuid, climb_id: Uuid) -> Result<()> {
        self.library
            .playlist_mut(playlist_id)
            .ok_or(Error::PlaylistNotFound(playlist_id))?
            .remove(climb_id);
        self.persist()
    }

    /// Resolves a playlist to the climbs that still exist. Dangling ids
    /// are skipped and surface only as a logged warning; they are never
    /// cleaned up eagerly.
    pub fn playlist_climbs(&self, playlist_id: Uuid) -> Result<Vec<&Climb>> {
        let playlist = self
            .library
            .playlist(playlist_id)
            .ok_or(Error::PlaylistNotFound(playlist_id))?;
        let mut resolved = Vec::new();
        let mut dangling = 0usize;
        for id in &playlist.climb_ids {
            match self.find_climb(*id) {
                Some(climb) => resolved.push(climb),
                None => dangling += 1,
            }
        }
        if dangling > 0 {
            log::warn!(
                "Playlist '{}' references {} deleted climbs",
                playlist.name,
                dangling
            );
        }
        Ok(resolved)
    }

    // ----- queries -----

    pub fn filtered_climbs(&self, wall_id: Uuid, filters: &ClimbFilters) -> Result<Vec<&Climb>> {
        Ok(filters::filter_climbs(self.wall(wall_id)?.climbs(), filters))
    }

    /// Logbook sessions for a wall, most recent first.
    pub fn sessions(&self, wall_id: Uuid) -> Result<Vec<Session>> {
        let entries = filters::log_entries(self.wall(wall_id)?.climbs());
        let gap = chrono::Duration::minutes(self.settings.sessions.max_gap_minutes);
        Ok(filters::segment_sessions(entries, gap))
    }

    /// Builds a gesture editor bound to a wall photo's natural size and
    /// the container size of the current layout pass.
    pub fn hold_editor(&self, wall_id: Uuid, container: Size) -> Result<HoldEditor> {
        let wall = self.wall(wall_id)?;
        let image = Size::new(wall.image.width as f32, wall.image.height as f32);
        Ok(HoldEditor::new(image, container, self.settings.geometry))
    }

    /// Decodes a climb's holds to absolute positions for drawing in the
    /// given container.
    pub fn render_holds(
        &self,
        wall_id: Uuid,
        climb_id: Uuid,
        container: Size,
    ) -> Result<Vec<RenderedHold>> {
        let wall = self.wall(wall_id)?;
        let climb = wall
            .climb(climb_id)
            .ok_or(Error::ClimbNotFound(climb_id))?;
        let image = Size::new(wall.image.width as f32, wall.image.height as f32);
        Ok(geometry::render_holds(climb.holds(), image, container))
    }

    /// Reports media files no longer referenced by the library.
    pub fn sweep_orphaned_media(&self) -> Vec<std::path::PathBuf> {
        media::sweep_orphans(&self.paths, &self.library)
    }
}

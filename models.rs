use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::grades;

/// Categorical hold color. Tapping a hold advances it through the fixed
/// cycle red -> green -> blue -> purple; advancing past purple deletes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoldColor {
    Red,
    Green,
    Blue,
    Purple,
}

impl HoldColor {
    /// The next color in the tap cycle; `None` means the hold is removed.
    pub fn next(self) -> Option<HoldColor> {
        match self {
            HoldColor::Red => Some(HoldColor::Green),
            HoldColor::Green => Some(HoldColor::Blue),
            HoldColor::Blue => Some(HoldColor::Purple),
            HoldColor::Purple => None,
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            HoldColor::Red => [230, 57, 70],
            HoldColor::Green => [42, 157, 143],
            HoldColor::Blue => [69, 123, 157],
            HoldColor::Purple => [155, 93, 229],
        }
    }
}

/// A marked grip location in resolution-independent form.
///
/// `relative_x`/`relative_y` are fractions of the displayed image content
/// area. `relative_size` is a fraction of container width, not image width;
/// the on-screen diameter of a hold therefore stays a fixed share of the
/// container across devices. Coordinates may leave [0,1] while a hold is
/// dragged past the image edge; they are stored unclamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hold {
    pub relative_x: f32,
    pub relative_y: f32,
    pub relative_size: f32,
    pub color: HoldColor,
}

/// Reference to a stored wall photo plus its natural pixel size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallImage {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub thumb_name: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetaVideo {
    pub id: Uuid,
    pub file_name: String,
    pub uploader: String,
    pub uploaded_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Climb {
    pub id: Uuid,
    pub name: String,
    holds: Vec<Hold>,
    pub created_at: DateTime<Utc>,
    difficulty: Option<String>,
    pub notes: Option<String>,
    #[serde(default = "default_match_allowed")]
    pub match_allowed: bool,
    #[serde(default)]
    tick_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    is_established: bool,
    rating: Option<u8>,
    #[serde(default)]
    pub beta_videos: Vec<BetaVideo>,
    // Pre-list schema kept a single optional video; folded into
    // `beta_videos` by the load-time migration.
    #[serde(default)]
    legacy_beta_video: Option<BetaVideo>,
}

fn default_match_allowed() -> bool {
    true
}

impl Climb {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            holds: Vec::new(),
            created_at: Utc::now(),
            difficulty: None,
            notes: None,
            match_allowed: true,
            tick_dates: Vec::new(),
            is_established: false,
            rating: None,
            beta_videos: Vec::new(),
            legacy_beta_video: None,
        }
    }

    pub fn holds(&self) -> &[Hold] {
        &self.holds
    }

    /// Mutable access to the hold list, rejected once the climb is
    /// established.
    pub fn holds_mut(&mut self) -> Result<&mut Vec<Hold>> {
        if self.is_established {
            return Err(Error::ClimbEstablished);
        }
        Ok(&mut self.holds)
    }

    pub fn is_established(&self) -> bool {
        self.is_established
    }

    /// One-way draft -> established transition. Requires at least one hold
    /// and a nonempty name; the hold list is frozen afterwards.
    pub fn establish(&mut self) -> Result<()> {
        if self.holds.is_empty() {
            return Err(Error::EstablishRejected("climb has no holds"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::EstablishRejected("climb has no name"));
        }
        self.is_established = true;
        Ok(())
    }

    pub fn difficulty(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }

    pub fn set_difficulty(&mut self, difficulty: Option<String>) -> Result<()> {
        if let Some(grade) = difficulty.as_deref() {
            if !grades::is_valid_grade(grade) {
                return Err(Error::InvalidGrade(grade.to_string()));
            }
        }
        self.difficulty = difficulty;
        Ok(())
    }

    pub fn rating(&self) -> Option<u8> {
        self.rating
    }

    pub fn set_rating(&mut self, rating: Option<u8>) -> Result<()> {
        if let Some(value) = rating {
            if !(1..=4).contains(&value) {
                return Err(Error::InvalidRating(value));
            }
        }
        self.rating = rating;
        Ok(())
    }

    pub fn tick_dates(&self) -> &[DateTime<Utc>] {
        &self.tick_dates
    }

    pub fn is_ticked(&self) -> bool {
        !self.tick_dates.is_empty()
    }

    pub fn send_count(&self) -> usize {
        self.tick_dates.len()
    }

    pub fn last_tick_date(&self) -> Option<DateTime<Utc>> {
        self.tick_dates.iter().max().copied()
    }

    /// Appends a send to the tick history. Grade and rating ride along and
    /// overwrite the stored values when provided.
    pub fn record_tick(
        &mut self,
        at: DateTime<Utc>,
        difficulty: Option<String>,
        rating: Option<u8>,
    ) -> Result<()> {
        if let Some(grade) = difficulty.as_deref() {
            if !grades::is_valid_grade(grade) {
                return Err(Error::InvalidGrade(grade.to_string()));
            }
        }
        if let Some(value) = rating {
            if !(1..=4).contains(&value) {
                return Err(Error::InvalidRating(value));
            }
        }
        self.tick_dates.push(at);
        if difficulty.is_some() {
            self.difficulty = difficulty;
        }
        if rating.is_some() {
            self.rating = rating;
        }
        Ok(())
    }

    /// Wipes the tick history together with grade and rating; the full undo
    /// of every logged send.
    pub fn clear_ticks(&mut self) {
        self.tick_dates.clear();
        self.difficulty = None;
        self.rating = None;
    }

    pub fn beta_video(&self, video_id: Uuid) -> Option<&BetaVideo> {
        self.beta_videos.iter().find(|v| v.id == video_id)
    }

    /// Folds the pre-list singular beta video into the list. Returns true
    /// when an entry was migrated.
    pub fn migrate_legacy_beta_video(&mut self) -> bool {
        match self.legacy_beta_video.take() {
            Some(video) if self.beta_videos.is_empty() => {
                self.beta_videos.push(video);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub id: Uuid,
    pub name: String,
    pub image: WallImage,
    climbs: Vec<Climb>,
    pub created_at: DateTime<Utc>,
}

impl Wall {
    pub fn new(name: impl Into<String>, image: WallImage) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            image,
            climbs: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn climbs(&self) -> &[Climb] {
        &self.climbs
    }

    pub fn climb(&self, climb_id: Uuid) -> Option<&Climb> {
        self.climbs.iter().find(|c| c.id == climb_id)
    }

    pub fn climb_mut(&mut self, climb_id: Uuid) -> Option<&mut Climb> {
        self.climbs.iter_mut().find(|c| c.id == climb_id)
    }

    pub fn add_climb(&mut self, climb: Climb) {
        self.climbs.push(climb);
    }

    /// Replace-by-id with a fully formed entity; there are no partial
    /// patches.
    pub fn replace_climb(&mut self, climb: Climb) -> Result<()> {
        match self.climbs.iter_mut().find(|c| c.id == climb.id) {
            Some(slot) => {
                *slot = climb;
                Ok(())
            }
            None => Err(Error::ClimbNotFound(climb.id)),
        }
    }

    pub fn remove_climb(&mut self, climb_id: Uuid) -> Option<Climb> {
        let index = self.climbs.iter().position(|c| c.id == climb_id)?;
        Some(self.climbs.remove(index))
    }

    pub fn next_climb_name(&self) -> String {
        format!("Climb {}", self.climbs.len() + 1)
    }
}

/// A named set of climbs referenced by id. References are weak: deleting a
/// climb leaves its id behind, and readers filter the dangling entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: Uuid,
    pub name: String,
    pub climb_ids: Vec<Uuid>,
}

impl Playlist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            climb_ids: Vec::new(),
        }
    }

    pub fn contains(&self, climb_id: Uuid) -> bool {
        self.climb_ids.contains(&climb_id)
    }

    /// Adds a climb id; a second add of the same id is a no-op.
    pub fn add(&mut self, climb_id: Uuid) {
        if !self.contains(climb_id) {
            self.climb_ids.push(climb_id);
        }
    }

    pub fn remove(&mut self, climb_id: Uuid) -> bool {
        let before = self.climb_ids.len();
        self.climb_ids.retain(|id| *id != climb_id);
        self.climb_ids.len() != before
    }
}

/// The whole persisted document: every wall with its climbs, plus the
/// playlists. Serialized as a single JSON snapshot after each mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    #[serde(default)]
    pub walls: Vec<Wall>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
}

impl Library {
    pub fn wall(&self, wall_id: Uuid) -> Option<&Wall> {
        self.walls.iter().find(|w| w.id == wall_id)
    }

    pub fn wall_mut(&mut self, wall_id: Uuid) -> Option<&mut Wall> {
        self.walls.iter_mut().find(|w| w.id == wall_id)
    }

    pub fn playlist(&self, playlist_id: Uuid) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == playlist_id)
    }

    pub fn playlist_mut(&mut self, playlist_id: Uuid) -> Option<&mut Playlist> {
        self.playlists.iter_mut().find(|p| p.id == playlist_id)
    }

    pub fn climb_exists(&self, climb_id: Uuid) -> bool {
        self.walls
            .iter()
            .any(|w| w.climbs().iter().any(|c| c.id == climb_id))
    }

    /// Applies load-time schema upgrades to a freshly parsed snapshot.
    /// Returns the number of entries touched.
    pub fn migrate(&mut self) -> usize {
        let mut migrated = 0;
        for wall in &mut self.walls {
            for climb in &mut wall.climbs {
                if climb.migrate_legacy_beta_video() {
                    migrated += 1;
                }
            }
        }
        migrated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hold() -> Hold {
        Hold {
            relative_x: 0.5,
            relative_y: 0.5,
            relative_size: 0.08,
            color: HoldColor::Red,
        }
    }

    #[test]
    fn color_cycle_ends_after_purple() {
        let mut color = Some(HoldColor::Red);
        let mut seen = Vec::new();
        while let Some(c) = color {
            seen.push(c);
            color = c.next();
        }
        assert_eq!(
            seen,
            vec![
                HoldColor::Red,
                HoldColor::Green,
                HoldColor::Blue,
                HoldColor::Purple
            ]
        );
    }

    #[test]
    fn establish_requires_holds_and_name() {
        let mut climb = Climb::new("Traverse");
        assert!(matches!(
            climb.establish(),
            Err(Error::EstablishRejected(_))
        ));
        assert!(!climb.is_established());

        climb.holds_mut().unwrap().push(hold());
        climb.establish().unwrap();
        assert!(climb.is_established());
    }

    #[test]
    fn establish_freezes_holds() {
        let mut climb = Climb::new("Roof line");
        climb.holds_mut().unwrap().push(hold());
        climb.establish().unwrap();
        assert!(matches!(climb.holds_mut(), Err(Error::ClimbEstablished)));
        assert_eq!(climb.holds().len(), 1);
    }

    #[test]
    fn tick_then_clear_restores_pristine_state() {
        let mut climb = Climb::new("Sit start");
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap();
        climb
            .record_tick(at, Some("V4".to_string()), Some(3))
            .unwrap();
        assert!(climb.is_ticked());
        assert_eq!(climb.send_count(), 1);
        assert_eq!(climb.difficulty(), Some("V4"));
        assert_eq!(climb.rating(), Some(3));
        assert_eq!(climb.last_tick_date(), Some(at));

        climb.clear_ticks();
        assert!(!climb.is_ticked());
        assert_eq!(climb.send_count(), 0);
        assert_eq!(climb.difficulty(), None);
        assert_eq!(climb.rating(), None);
        assert_eq!(climb.last_tick_date(), None);
    }

    #[test]
    fn record_tick_validates_grade_and_rating() {
        let mut climb = Climb::new("Dyno");
        let at = Utc::now();
        assert!(matches!(
            climb.record_tick(at, Some("5.11a".to_string()), None),
            Err(Error::InvalidGrade(_))
        ));
        assert!(matches!(
            climb.record_tick(at, None, Some(5)),
            Err(Error::InvalidRating(5))
        ));
        assert!(!climb.is_ticked());
    }

    #[test]
    fn repeat_ticks_append_in_order() {
        let mut climb = Climb::new("Campus");
        let first = Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 6, 2, 19, 30, 0).unwrap();
        climb.record_tick(first, None, None).unwrap();
        climb.record_tick(second, None, None).unwrap();
        assert_eq!(climb.tick_dates(), &[first, second]);
        assert_eq!(climb.send_count(), 2);
        assert_eq!(climb.last_tick_date(), Some(second));
    }

    #[test]
    fn legacy_beta_video_is_folded_into_list() {
        let json = r#"{
            "id": "6a7a2f6e-18f1-4f26-9d2b-0a9c9c6f1a01",
            "name": "Arete",
            "holds": [],
            "created_at": "2024-05-01T10:00:00Z",
            "legacy_beta_video": {
                "id": "8e9e3b1c-2af5-4f2a-8a6a-4242deadbeef",
                "file_name": "abc123.mp4",
                "uploader": "Sam",
                "uploaded_at": "2024-05-02T12:00:00Z"
            }
        }"#;
        let mut climb: Climb = serde_json::from_str(json).unwrap();
        assert!(climb.migrate_legacy_beta_video());
        assert_eq!(climb.beta_videos.len(), 1);
        assert_eq!(climb.beta_videos[0].uploader, "Sam");
        // A second pass has nothing left to do.
        assert!(!climb.migrate_legacy_beta_video());
        assert_eq!(climb.beta_videos.len(), 1);
    }

    #[test]
    fn playlist_add_is_idempotent() {
        let mut playlist = Playlist::new("Warmups");
        let id = Uuid::new_v4();
        playlist.add(id);
        playlist.add(id);
        assert_eq!(playlist.climb_ids.len(), 1);
        assert!(playlist.remove(id));
        assert!(!playlist.remove(id));
    }

    #[test]
    fn climb_round_trips_through_json() {
        let mut climb = Climb::new("Cave exit");
        climb.holds_mut().unwrap().push(hold());
        climb
            .record_tick(Utc::now(), Some("V7".to_string()), Some(4))
            .unwrap();
        climb.establish().unwrap();

        let json = serde_json::to_string(&climb).unwrap();
        let restored: Climb = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id, climb.id);
        assert_eq!(restored.holds(), climb.holds());
        assert_eq!(restored.difficulty(), Some("V7"));
        assert!(restored.is_established());
        assert_eq!(restored.send_count(), 1);
    }
}

use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image Error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Path Error: {0}")]
    Path(String),

    #[error("Wall not found: {0}")]
    WallNotFound(Uuid),

    #[error("Climb not found: {0}")]
    ClimbNotFound(Uuid),

    #[error("Beta video not found: {0}")]
    BetaVideoNotFound(Uuid),

    #[error("Playlist not found: {0}")]
    PlaylistNotFound(Uuid),

    #[error("Climb is established; holds can no longer be edited")]
    ClimbEstablished,

    #[error("Cannot establish climb: {0}")]
    EstablishRejected(&'static str),

    #[error("Invalid rating {0}; expected a value in 1..=4")]
    InvalidRating(u8),

    #[error("Invalid grade token: {0}")]
    InvalidGrade(String),

    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),
}

//! Postgres persistence for Rescore job records.
//!
//! One repository per entity over a shared [`sqlx::PgPool`]. Status
//! transitions are single guarded `UPDATE ... RETURNING` statements so a
//! claim or a terminal write that lost the race affects zero rows instead
//! of clobbering a concurrent writer. The job tables are the single source
//! of truth for status; object storage holds only bytes.

pub mod avatar;
pub mod error;
pub mod montage;
pub mod motion;
pub mod pool;
pub mod track;
pub mod video;

pub use avatar::AvatarRepository;
pub use error::{DbError, DbResult};
pub use montage::MontageRepository;
pub use motion::MotionRepository;
pub use pool::{connect, migrate, DbConfig};
pub use track::{NewTrack, TrackRepository};
pub use video::VideoRepository;

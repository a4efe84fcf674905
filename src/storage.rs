//! One JSON file per keyed blob under the data directory. Reads never fail:
//! a missing blob is seeded or defaulted, an unreadable one falls back to
//! its empty value.

use crate::errors::AppError;
use crate::models::{AppData, AttendanceTable, AuditEntry, Member, User};
use crate::store::{default_users, sample_members};
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info};

pub const USERS_KEY: &str = "gym_users";
pub const MEMBERS_KEY: &str = "gym_members";
pub const ATTENDANCE_KEY: &str = "gym_attendance";
pub const AUDIT_KEY: &str = "gym_audit";
pub const MEMBER_SEQ_KEY: &str = "gym_member_seq";

enum Blob<T> {
    Missing,
    Loaded(T),
    Unreadable,
}

impl<T: Default> Blob<T> {
    fn or_default(self) -> T {
        match self {
            Blob::Loaded(value) => value,
            Blob::Missing | Blob::Unreadable => T::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub async fn load(&self) -> AppData {
        let users = match self.read_blob::<Vec<User>>(USERS_KEY).await {
            Blob::Loaded(users) => users,
            Blob::Missing => self.seed(USERS_KEY, default_users()).await,
            Blob::Unreadable => Vec::new(),
        };
        let members = match self.read_blob::<Vec<Member>>(MEMBERS_KEY).await {
            Blob::Loaded(members) => members,
            Blob::Missing => self.seed(MEMBERS_KEY, sample_members()).await,
            Blob::Unreadable => Vec::new(),
        };

        AppData {
            users,
            members,
            attendance: self.read_blob::<AttendanceTable>(ATTENDANCE_KEY).await.or_default(),
            audit: self.read_blob::<Vec<AuditEntry>>(AUDIT_KEY).await.or_default(),
            member_seq: self.read_blob::<u64>(MEMBER_SEQ_KEY).await.or_default(),
        }
    }

    pub async fn persist_members(&self, members: &[Member]) -> Result<(), AppError> {
        self.write_blob(MEMBERS_KEY, members).await
    }

    pub async fn persist_attendance(&self, attendance: &AttendanceTable) -> Result<(), AppError> {
        self.write_blob(ATTENDANCE_KEY, attendance).await
    }

    pub async fn persist_audit(&self, audit: &[AuditEntry]) -> Result<(), AppError> {
        self.write_blob(AUDIT_KEY, audit).await
    }

    pub async fn persist_member_seq(&self, seq: u64) -> Result<(), AppError> {
        self.write_blob(MEMBER_SEQ_KEY, &seq).await
    }

    async fn seed<T: Serialize>(&self, key: &str, value: T) -> T {
        info!("seeding {key}");
        if let Err(err) = self.write_blob(key, &value).await {
            error!("failed to seed {key}: {}", err.message);
        }
        value
    }

    async fn read_blob<T: DeserializeOwned>(&self, key: &str) -> Blob<T> {
        match fs::read(self.blob_path(key)).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Blob::Loaded(value),
                Err(err) => {
                    error!("failed to parse {key}: {err}");
                    Blob::Unreadable
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Blob::Missing,
            Err(err) => {
                error!("failed to read {key}: {err}");
                Blob::Unreadable
            }
        }
    }

    async fn write_blob<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let payload = serde_json::to_vec_pretty(value).map_err(AppError::internal)?;
        fs::write(self.blob_path(key), payload).await.map_err(AppError::internal)?;
        Ok(())
    }
}

//! Social connection data structures.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Relationship between the logged-in account and another user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Connection {
    Friend,
    #[default]
    #[serde(other)]
    Connection,
}

impl Connection {
    pub fn is_friend(self) -> bool {
        self == Connection::Friend
    }
}

/// A social connection shown in the people list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub image_url: String,
    pub connection: Connection,
    pub online: bool,
    pub location_name: String,
}

impl User {
    /// Online users first, then case-insensitive by name.
    pub fn display_order(a: &User, b: &User) -> Ordering {
        b.online
            .cmp(&a.online)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            name: record.username,
            image_url: record.images.thumbnail.unwrap_or_default(),
            connection: record.connection,
            online: record.online,
            location_name: record
                .location
                .and_then(|l| l.root)
                .map(|r| r.name)
                .unwrap_or_default(),
        }
    }
}

/// Raw user entry from the users endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub username: String,

    #[serde(default)]
    pub connection: Connection,

    #[serde(default)]
    pub online: bool,

    #[serde(default)]
    pub images: UserImages,

    #[serde(default)]
    pub location: Option<UserLocation>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct UserImages {
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserLocation {
    #[serde(default)]
    pub root: Option<LocationRoot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationRoot {
    #[serde(default)]
    pub name: String,
}

/// Envelope of the users listing.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub status: String,

    pub data: Option<UsersData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersData {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

//! CRUD resources exposed by the backend.
//!
//! Users, parks and plant collections share one list/get/create/update/delete
//! shape; only the path, id type and payload types differ. Each resource is a
//! zero-sized marker implementing `Resource`.

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{
    Park, ParkCreate, ParkUpdate, PlantCollection, PlantCollectionCreate, PlantCollectionUpdate,
    User, UserCreate, UserUpdate,
};

pub trait Resource {
    /// Collection path without a trailing slash, e.g. `/api/users`.
    const PATH: &'static str;
    /// Human-readable name used in log lines.
    const NAME: &'static str;

    type Id: Display;
    type Record: DeserializeOwned;
    type Create: Serialize;
    type Update: Serialize;
}

/// User accounts. The backend only serves these to super admins.
#[derive(Debug, Clone, Copy)]
pub struct Users;

impl Resource for Users {
    const PATH: &'static str = "/api/users";
    const NAME: &'static str = "users";
    type Id = String;
    type Record = User;
    type Create = UserCreate;
    type Update = UserUpdate;
}

#[derive(Debug, Clone, Copy)]
pub struct Parks;

impl Resource for Parks {
    const PATH: &'static str = "/api/taman-kehati";
    const NAME: &'static str = "parks";
    type Id = i64;
    type Record = Park;
    type Create = ParkCreate;
    type Update = ParkUpdate;
}

#[derive(Debug, Clone, Copy)]
pub struct PlantCollections;

impl Resource for PlantCollections {
    const PATH: &'static str = "/api/koleksi-tumbuhan";
    const NAME: &'static str = "plant collections";
    type Id = i64;
    type Record = PlantCollection;
    type Create = PlantCollectionCreate;
    type Update = PlantCollectionUpdate;
}

/// Interchange formats offered by the export endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Darwin Core biological records.
    DarwinCore,
    GeoJson,
}

impl ExportFormat {
    pub fn path(self) -> &'static str {
        match self {
            ExportFormat::DarwinCore => "/api/export/dwc",
            ExportFormat::GeoJson => "/api/export/geojson",
        }
    }
}

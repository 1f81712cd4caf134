//! Domain DTOs for the Taman Kehati API.
//!
//! # Design
//! Field names follow the backend's wire schema. Response types accept a
//! missing key wherever the backend allows `null`; create/update payloads
//! leave unset optional fields out of the JSON entirely. Nullable fields of
//! update payloads are `Option<Option<T>>`: `None` leaves the field alone,
//! `Some(None)` sends `null` and clears it. Timestamps are kept as the opaque
//! strings the server sends.

use serde::{Deserialize, Deserializer, Serialize};

/// Missing key stays `None`; an explicit `null` becomes `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SuperAdmin,
    Admin,
    Viewer,
}

/// Publication status of parks and collection records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Ownership type of a park.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParkType {
    Government,
    Private,
    Community,
}

/// Result of a successful password-grant login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Offset pagination shared by every list and export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 100;

    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }
    }

    pub(crate) fn query(&self) -> String {
        format!("?skip={}&limit={}", self.skip, self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub full_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

// ---------------------------------------------------------------------------
// Parks (taman kehati)
// ---------------------------------------------------------------------------

/// A conservation park as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Park {
    pub id: i64,
    pub nama_resmi: String,
    #[serde(default)]
    pub nama_alternatif: Option<String>,
    #[serde(default)]
    pub alamat: Option<String>,
    #[serde(default)]
    pub provinsi_id: Option<i64>,
    #[serde(default)]
    pub kabupaten_kota_id: Option<i64>,
    #[serde(default)]
    pub kecamatan_id: Option<i64>,
    #[serde(default)]
    pub kelurahan_desa_id: Option<i64>,
    #[serde(default)]
    pub kode_pos: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Area in hectares.
    #[serde(default)]
    pub luas: Option<f64>,
    #[serde(default)]
    pub tipe_taman: Option<ParkType>,
    #[serde(default)]
    pub deskripsi: Option<String>,
    #[serde(default)]
    pub sejarah: Option<String>,
    #[serde(default)]
    pub kontak_person: Option<String>,
    #[serde(default)]
    pub telepon: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    pub status: PublicationStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParkCreate {
    pub nama_resmi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nama_alternatif: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alamat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provinsi_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kabupaten_kota_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kecamatan_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kelurahan_desa_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kode_pos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub luas: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipe_taman: Option<ParkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deskripsi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sejarah: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kontak_person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telepon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParkUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nama_resmi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub nama_alternatif: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub alamat: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub provinsi_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub kabupaten_kota_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub kecamatan_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub kelurahan_desa_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub kode_pos: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub longitude: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub luas: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub tipe_taman: Option<Option<ParkType>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub deskripsi: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub sejarah: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub kontak_person: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub telepon: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub email: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub website: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub instagram: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub facebook: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub twitter: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,
}

// ---------------------------------------------------------------------------
// Plant collections (koleksi tumbuhan)
// ---------------------------------------------------------------------------

/// A plant collection record. Always belongs to exactly one park via
/// `taman_kehati_id`; the client trusts the server on that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantCollection {
    pub id: i64,
    pub taman_kehati_id: i64,
    pub nama_ilmiah: String,
    #[serde(default)]
    pub nama_umum_nasional: Option<String>,
    #[serde(default)]
    pub nama_umum_lokal: Option<String>,
    #[serde(default)]
    pub familia: Option<String>,
    #[serde(default)]
    pub genus: Option<String>,
    #[serde(default)]
    pub spesies: Option<String>,
    #[serde(default)]
    pub varietas: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub nomor_koleksi: Option<String>,
    #[serde(default)]
    pub tanggal_koleksi: Option<String>,
    #[serde(default)]
    pub lokasi_koleksi: Option<String>,
    #[serde(default)]
    pub habitat: Option<String>,
    #[serde(default)]
    pub deskripsi: Option<String>,
    #[serde(default)]
    pub catatan: Option<String>,
    #[serde(default)]
    pub foto_url: Option<String>,
    pub status: PublicationStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantCollectionCreate {
    pub taman_kehati_id: i64,
    pub nama_ilmiah: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nama_umum_nasional: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nama_umum_lokal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub familia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genus: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spesies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub varietas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nomor_koleksi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tanggal_koleksi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lokasi_koleksi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habitat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deskripsi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catatan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foto_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantCollectionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taman_kehati_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nama_ilmiah: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub nama_umum_nasional: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub nama_umum_lokal: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub familia: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub genus: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub spesies: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub varietas: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub author: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub nomor_koleksi: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub tanggal_koleksi: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub lokasi_koleksi: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub habitat: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub deskripsi: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub catatan: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "nullable")]
    pub foto_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PublicationStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_is_zero_offset_hundred_items() {
        assert_eq!(Page::default(), Page::new(0, 100));
        assert_eq!(Page::new(0, 10).query(), "?skip=0&limit=10");
    }

    #[test]
    fn status_uses_lowercase_wire_names() {
        assert_eq!(serde_json::to_value(PublicationStatus::Archived).unwrap(), "archived");
        let status: PublicationStatus = serde_json::from_str(r#""published""#).unwrap();
        assert_eq!(status, PublicationStatus::Published);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let result: Result<PublicationStatus, _> = serde_json::from_str(r#""deleted""#);
        assert!(result.is_err());
    }

    #[test]
    fn user_role_uses_snake_case() {
        assert_eq!(serde_json::to_value(UserRole::SuperAdmin).unwrap(), "super_admin");
    }

    #[test]
    fn update_payload_omits_unset_fields() {
        let update = ParkUpdate {
            luas: Some(Some(12.5)),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"luas": 12.5}));
    }

    #[test]
    fn update_payload_sends_null_to_clear() {
        let update = ParkUpdate {
            nama_alternatif: Some(None),
            latitude: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"nama_alternatif": null, "latitude": null}));

        let user = UserUpdate {
            full_name: Some(None),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&user).unwrap(), r#"{"full_name":null}"#);
    }

    #[test]
    fn update_payload_keeps_null_apart_from_missing() {
        let update: PlantCollectionUpdate =
            serde_json::from_str(r#"{"familia":null,"genus":"Ficus"}"#).unwrap();
        assert_eq!(update.familia, Some(None));
        assert_eq!(update.genus, Some(Some("Ficus".to_string())));
        assert_eq!(update.habitat, None);
    }

    #[test]
    fn park_tolerates_missing_nullable_fields() {
        let park: Park = serde_json::from_str(
            r#"{"id":1,"nama_resmi":"Taman Kehati Bogor","status":"published",
                "created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(park.nama_resmi, "Taman Kehati Bogor");
        assert!(park.latitude.is_none());
        assert!(park.tipe_taman.is_none());
    }

    #[test]
    fn collection_create_requires_scientific_name() {
        let result: Result<PlantCollectionCreate, _> =
            serde_json::from_str(r#"{"taman_kehati_id":1}"#);
        assert!(result.is_err());
    }
}

//! Blocking API client for the Taman Kehati biodiversity catalog backend.
//!
//! # Overview
//! `KehatiClient` builds `HttpRequest` values and parses `HttpResponse`
//! values without touching the network (host-does-IO pattern). `ApiClient`
//! pairs it with a `Transport` and exposes typed endpoints for auth, users,
//! parks, plant collections and data exports.
//!
//! # Design
//! - The bearer credential lives in a `TokenStore` passed to the client at
//!   construction. Login writes it; logout clears it; every request reads it.
//! - Every failure is a value: non-2xx responses become `ApiError::Http`
//!   with the status and decoded body. Nothing is retried.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod resource;
pub mod token;
pub mod transport;
pub mod types;

pub use api::{ApiClient, Auth, Endpoint, Exports};
pub use client::{KehatiClient, RequestBody};
pub use config::ApiConfig;
pub use error::{ApiError, ResponseBody};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use resource::{ExportFormat, Parks, PlantCollections, Resource, Users};
pub use token::{FileStorage, MemoryStorage, TokenStorage, TokenStore};
pub use transport::{Transport, UreqTransport};
pub use types::{
    LoginResponse, Page, Park, ParkCreate, ParkType, ParkUpdate, PlantCollection, PlantCollectionCreate,
    PlantCollectionUpdate, PublicationStatus, User, UserCreate, UserRole, UserUpdate,
};

//! leafnode external providers
//!
//! HTTP clients for the third-party sources used by the enrichment jobs.
//! Each client implements the core `Provider` trait for one query/candidate
//! pair so it can be placed in a resolver chain.

pub mod criterion;
pub mod error;
pub mod functions;
pub mod google_books;
pub mod http;
pub mod image_probe;
pub mod omdb;
pub mod open_library;
pub mod tmdb;
pub mod types;
pub mod youtube;

pub use criterion::{CriterionSearchLink, VerifiedCriterionLinks};
pub use error::ClientError;
pub use functions::{HttpJobInvoker, build_invoker_client};
pub use google_books::{GoogleBooksClient, GoogleBooksConfig};
pub use http::{build_client, HttpConfig};
pub use image_probe::HttpImageProbe;
pub use omdb::{OmdbClient, OmdbConfig};
pub use open_library::{OpenLibraryClient, OpenLibraryConfig};
pub use tmdb::{TmdbClient, TmdbConfig};
pub use types::{BookQuery, CoverCandidate, CriterionLink, FilmQuery, PosterCandidate, TrailerCandidate};
pub use youtube::{YouTubeClient, YouTubeConfig};

//! API Module
//!
//! HTTP handlers and routing for the scraping API.
//!
//! # Endpoints
//! - Synchronous scraping: `/scrape/profile/:username`, `/scrape/repos/:username`
//! - Background jobs: `/scrape/async/:username`, `/jobs`, `/jobs/:id`,
//!   `/jobs/:id/cancel`
//! - Export: `/export/:id/:format`, `/export/:id/files`, `/download/:id/:filename`
//! - Cache administration: `/cache/:key`, `/cache/stats`
//! - Observability: `/stats`, `/health`

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;

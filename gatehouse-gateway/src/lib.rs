//! Gatehouse Gateway - HTTP request gate in front of the auth endpoints
//!
//! Every API route is admitted by a token bucket keyed by action class and
//! caller address before anything else runs. Protected routes then verify a
//! bearer access token and hand the caller's identity to the handler.
//!
//! # Architecture
//!
//! ```text
//! gatehouse-gateway/
//! └── presentation/
//!     ├── auth/          # Register, login, refresh, logout; extractors
//!     ├── controllers/   # Health and profile handlers
//!     ├── middleware/    # Rate limit gate, auth gate, error mapping
//!     ├── models.rs      # Shared response DTOs
//!     └── routes.rs      # Router, OpenAPI document, layer stack
//! ```
//!
//! # API Endpoints
//!
//! | Endpoint | Method | Action class | Auth |
//! |----------|--------|--------------|------|
//! | `/api/v1/auth/register` | POST | register | - |
//! | `/api/v1/auth/login` | POST | login | - |
//! | `/api/v1/auth/refresh` | POST | refresh | - |
//! | `/api/v1/auth/logout` | POST | logout | bearer |
//! | `/api/v1/profile` | GET | profile | bearer |
//! | `/health` | GET | - | - |
//! | `/api-docs/openapi.json` | GET | - | - |

pub mod presentation;

pub use presentation::{GatewayState, create_router};

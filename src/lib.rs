//! secrets-api - secrets encryption service with pluggable backends.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── api/              # HTTP transport (axum)
//! │   ├── handlers      # create / rewrap / purge endpoints
//! │   └── error         # Uniform error body
//! ├── cli/              # Command-line interface
//! │   ├── server        # Run the HTTP server
//! │   └── keygen        # Generate a local key file
//! └── core/             # Transport-independent logic
//!     ├── cipher/       # Encryption backends
//!     │   ├── mod       # Backend dispatch and backend table
//!     │   ├── envelope  # Transport encoding and signatures
//!     │   ├── local_key # AES-256-GCM under local keys
//!     │   ├── vault     # Vault transit with optional KV persistence
//!     │   └── rewrap    # RSA-OAEP export keys
//!     ├── store/        # External transit and KV store
//!     │   ├── http      # Vault over HTTP
//!     │   └── memory    # In-process stand-in
//!     ├── domain/       # Secret records and payloads
//!     ├── validation    # Request validation
//!     ├── rewrap        # Rewrap state machine
//!     ├── service       # Secret service
//!     └── config        # TOML configuration
//! ```
//!
//! # Features
//!
//! - Three backends behind one API: `none`, `local-key`, `vault`
//! - MD5 signatures over raw ciphertext, verified before any rewrap
//! - Per-instance storage namespaces in the shared Vault KV store
//! - Bulk requests that succeed or fail as a whole

pub mod api;
pub mod cli;
pub mod core;
pub mod error;

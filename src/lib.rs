//! # content-store
//!
//! A persistent, append-only, random-access store mapping small integer ids
//! to arbitrary-length UTF-8 strings, with block-indexed retrieval of
//! arbitrary character-offset substrings.
//!
//! See [`api::store::Store`] for the public entry point.

/// Public high-level API: the store handle, its tuning settings, and its
/// error types.
pub mod api {
    pub mod error;
    pub mod settings;
    pub mod store;
}

/// Data structures mirrored 1:1 to what's on disk, and the ergonomic,
/// owned types built from them.
pub mod headers {
    /// `#[repr(C, packed)]` structures matching the on-disk byte layout.
    pub mod raw {
        pub mod toc_entry_raw;
    }

    /// Owned, ergonomic in-memory types that (de)serialize to/from `raw`.
    pub mod managed {
        pub mod toc;
        pub mod toc_entry;
    }
}

/// The block codec, data-file set, TOC file, and ingestion/retrieval state
/// machines that drive them.
pub mod implementation {
    pub mod block_codec;
    pub mod data_file_set;
    pub mod ingestion;
    pub mod retrieval;
    pub mod toc_file;
}

pub mod utilities {
    /// Little-endian integer (de)serialization over byte slices.
    pub mod little_endian;
}

pub use api::error::{CodecError, StoreError};
pub use api::settings::StoreSettings;
pub use api::store::Store;

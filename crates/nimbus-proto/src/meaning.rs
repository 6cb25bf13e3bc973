//! Meaning tags shared by both wire schemas.
//!
//! A meaning is a secondary discriminator on a wire value. The legacy schema
//! relies on it for every non-default type; the public schema only keeps it
//! where the structural value shape is ambiguous.
//!
//! IMPORTANT: these values are part of the stored format and must never be
//! renumbered.

pub const NO_MEANING: i32 = 0;
pub const ATOM_CATEGORY: i32 = 1;
pub const ATOM_LINK: i32 = 2;
pub const ATOM_TITLE: i32 = 3;
pub const ATOM_CONTENT: i32 = 4;
pub const ATOM_SUMMARY: i32 = 5;
pub const ATOM_AUTHOR: i32 = 6;
pub const GD_WHEN: i32 = 7;
pub const GD_EMAIL: i32 = 8;
pub const GEORSS_POINT: i32 = 9;
pub const GD_IM: i32 = 10;
pub const GD_PHONENUMBER: i32 = 11;
pub const GD_POSTALADDRESS: i32 = 12;
pub const GD_RATING: i32 = 13;
pub const BLOB: i32 = 14;
pub const TEXT: i32 = 15;
pub const BYTESTRING: i32 = 16;
pub const BLOBKEY: i32 = 17;
pub const INDEX_VALUE: i32 = 18;
pub const ENTITY_PROTO: i32 = 19;
pub const PREDEFINED_ENTITY_USER: i32 = 20;
pub const EMPTY_LIST: i32 = 24;

/// Largest meaning value this client knows how to interpret.
///
/// Meanings above this bound come from newer writers and are read as if no
/// meaning were present.
pub const MAX_KNOWN: i32 = EMPTY_LIST;

/// Whether `meaning` lies inside the range this client understands.
#[must_use]
pub const fn is_known(meaning: i32) -> bool {
    meaning > NO_MEANING && meaning <= MAX_KNOWN
}

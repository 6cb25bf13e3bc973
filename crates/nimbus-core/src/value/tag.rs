use nimbus_proto::meaning;
use std::fmt;

///
/// ValueType
///
/// One tag per `Value` variant. Carries the per-type facts the translators
/// dispatch on: the legacy meaning tag, indexability and a stable label.
///
/// IMPORTANT:
/// `MEANINGLESS_PROBE_ORDER` is a disambiguation order, not just a
/// performance hint. Reordering it changes how untagged wire values decode.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ValueType {
    Null,
    Int,
    Double,
    Bool,
    String,
    Text,
    ShortBlob,
    Blob,
    DateTime,
    GeoPt,
    User,
    Key,
    Entity,
    Link,
    Category,
    Email,
    PostalAddress,
    PhoneNumber,
    ImHandle,
    Rating,
    BlobKey,
    Raw,
}

impl ValueType {
    /// Types carrying no meaning tag, probed in this order when a wire
    /// record has meaning 0.
    pub const MEANINGLESS_PROBE_ORDER: [Self; 6] = [
        Self::Int,
        Self::Double,
        Self::String,
        Self::Bool,
        Self::Key,
        Self::User,
    ];

    /// Meaning tag written by the legacy protocol, `0` for none.
    #[must_use]
    pub const fn meaning(self) -> i32 {
        match self {
            Self::Null
            | Self::Int
            | Self::Double
            | Self::Bool
            | Self::String
            | Self::User
            | Self::Key => meaning::NO_MEANING,
            Self::Text => meaning::TEXT,
            Self::ShortBlob => meaning::BYTESTRING,
            Self::Blob => meaning::BLOB,
            Self::DateTime => meaning::GD_WHEN,
            Self::GeoPt => meaning::GEORSS_POINT,
            Self::Entity => meaning::ENTITY_PROTO,
            Self::Link => meaning::ATOM_LINK,
            Self::Category => meaning::ATOM_CATEGORY,
            Self::Email => meaning::GD_EMAIL,
            Self::PostalAddress => meaning::GD_POSTALADDRESS,
            Self::PhoneNumber => meaning::GD_PHONENUMBER,
            Self::ImHandle => meaning::GD_IM,
            Self::Rating => meaning::GD_RATING,
            Self::BlobKey => meaning::BLOBKEY,
            Self::Raw => meaning::INDEX_VALUE,
        }
    }

    /// Type registered for a non-zero legacy meaning tag.
    ///
    /// `EMPTY_LIST` is a marker rather than a type and is not registered.
    #[must_use]
    pub const fn for_meaning(m: i32) -> Option<Self> {
        match m {
            meaning::TEXT => Some(Self::Text),
            meaning::BYTESTRING => Some(Self::ShortBlob),
            meaning::BLOB => Some(Self::Blob),
            meaning::GD_WHEN => Some(Self::DateTime),
            meaning::GEORSS_POINT => Some(Self::GeoPt),
            meaning::ENTITY_PROTO => Some(Self::Entity),
            meaning::ATOM_LINK => Some(Self::Link),
            meaning::ATOM_CATEGORY => Some(Self::Category),
            meaning::GD_EMAIL => Some(Self::Email),
            meaning::GD_POSTALADDRESS => Some(Self::PostalAddress),
            meaning::GD_PHONENUMBER => Some(Self::PhoneNumber),
            meaning::GD_IM => Some(Self::ImHandle),
            meaning::GD_RATING => Some(Self::Rating),
            meaning::BLOBKEY => Some(Self::BlobKey),
            meaning::INDEX_VALUE => Some(Self::Raw),
            _ => None,
        }
    }

    /// Whether values of this type can be stored in an index.
    /// Embedded entities are refined per value by `Value::is_indexable`.
    #[must_use]
    pub const fn is_indexable(self) -> bool {
        !matches!(self, Self::Text | Self::Blob | Self::Entity)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Int => "Int",
            Self::Double => "Double",
            Self::Bool => "Bool",
            Self::String => "String",
            Self::Text => "Text",
            Self::ShortBlob => "ShortBlob",
            Self::Blob => "Blob",
            Self::DateTime => "DateTime",
            Self::GeoPt => "GeoPt",
            Self::User => "User",
            Self::Key => "Key",
            Self::Entity => "EmbeddedEntity",
            Self::Link => "Link",
            Self::Category => "Category",
            Self::Email => "Email",
            Self::PostalAddress => "PostalAddress",
            Self::PhoneNumber => "PhoneNumber",
            Self::ImHandle => "ImHandle",
            Self::Rating => "Rating",
            Self::BlobKey => "BlobKey",
            Self::Raw => "RawValue",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//! Public protocol.
//!
//! Entities hold one property map. Multi-valued properties are explicit
//! `ArrayValue`s and indexing is controlled per value with
//! `exclude_from_indexes`.

use std::collections::BTreeMap;

///
/// PartitionId
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PartitionId {
    #[prost(string, tag = "2")]
    pub project_id: String,
    #[prost(string, tag = "4")]
    pub namespace_id: String,
}

///
/// Key
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Key {
    #[prost(message, optional, tag = "1")]
    pub partition_id: Option<PartitionId>,
    #[prost(message, repeated, tag = "2")]
    pub path: Vec<key::PathElement>,
}

pub mod key {
    ///
    /// PathElement
    /// An element without an id type is incomplete.
    ///

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PathElement {
        #[prost(string, tag = "1")]
        pub kind: String,
        #[prost(oneof = "path_element::IdType", tags = "2, 3")]
        pub id_type: Option<path_element::IdType>,
    }

    pub mod path_element {
        #[derive(Clone, PartialEq, ::prost::Oneof)]
        pub enum IdType {
            #[prost(int64, tag = "2")]
            Id(i64),
            #[prost(string, tag = "3")]
            Name(String),
        }
    }
}

///
/// Timestamp
///

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Timestamp {
    #[prost(int64, tag = "1")]
    pub seconds: i64,
    #[prost(int32, tag = "2")]
    pub nanos: i32,
}

///
/// LatLng
///

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct LatLng {
    #[prost(double, tag = "1")]
    pub latitude: f64,
    #[prost(double, tag = "2")]
    pub longitude: f64,
}

///
/// ArrayValue
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ArrayValue {
    #[prost(message, repeated, tag = "1")]
    pub values: Vec<Value>,
}

///
/// Value
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Value {
    #[prost(int32, tag = "14")]
    pub meaning: i32,
    #[prost(bool, tag = "19")]
    pub exclude_from_indexes: bool,
    #[prost(oneof = "value::ValueType", tags = "11, 1, 2, 3, 10, 5, 17, 18, 8, 6, 9")]
    pub value_type: Option<value::ValueType>,
}

pub mod value {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum ValueType {
        #[prost(int32, tag = "11")]
        NullValue(i32),
        #[prost(bool, tag = "1")]
        BooleanValue(bool),
        #[prost(int64, tag = "2")]
        IntegerValue(i64),
        #[prost(double, tag = "3")]
        DoubleValue(f64),
        #[prost(message, tag = "10")]
        TimestampValue(super::Timestamp),
        #[prost(message, tag = "5")]
        KeyValue(super::Key),
        #[prost(string, tag = "17")]
        StringValue(String),
        #[prost(bytes = "vec", tag = "18")]
        BlobValue(Vec<u8>),
        #[prost(message, tag = "8")]
        GeoPointValue(super::LatLng),
        #[prost(message, tag = "6")]
        EntityValue(super::Entity),
        #[prost(message, tag = "9")]
        ArrayValue(super::ArrayValue),
    }
}

///
/// Entity
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Entity {
    #[prost(message, optional, tag = "1")]
    pub key: Option<Key>,
    #[prost(btree_map = "string, message", tag = "3")]
    pub properties: BTreeMap<String, Value>,
}

///
/// PropertyReference
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PropertyReference {
    #[prost(string, tag = "2")]
    pub name: String,
}

///
/// KindExpression
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KindExpression {
    #[prost(string, tag = "1")]
    pub name: String,
}

///
/// Projection
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Projection {
    #[prost(message, optional, tag = "1")]
    pub property: Option<PropertyReference>,
}

///
/// Direction
///

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Direction {
    Unspecified = 0,
    Ascending = 1,
    Descending = 2,
}

///
/// PropertyOrder
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PropertyOrder {
    #[prost(message, optional, tag = "1")]
    pub property: Option<PropertyReference>,
    #[prost(enumeration = "Direction", tag = "2")]
    pub direction: i32,
}

///
/// CompositeOperator
///

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum CompositeOperator {
    Unspecified = 0,
    And = 1,
    Or = 2,
}

///
/// PropertyOperator
///

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum PropertyOperator {
    Unspecified = 0,
    LessThan = 1,
    LessThanOrEqual = 2,
    GreaterThan = 3,
    GreaterThanOrEqual = 4,
    Equal = 5,
    In = 6,
    NotEqual = 9,
    HasAncestor = 11,
    NotIn = 13,
}

///
/// CompositeFilter
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompositeFilter {
    #[prost(enumeration = "CompositeOperator", tag = "1")]
    pub op: i32,
    #[prost(message, repeated, tag = "2")]
    pub filters: Vec<Filter>,
}

///
/// PropertyFilter
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PropertyFilter {
    #[prost(message, optional, tag = "1")]
    pub property: Option<PropertyReference>,
    #[prost(enumeration = "PropertyOperator", tag = "2")]
    pub op: i32,
    #[prost(message, optional, tag = "3")]
    pub value: Option<Value>,
}

///
/// Filter
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Filter {
    #[prost(oneof = "filter::FilterType", tags = "1, 2")]
    pub filter_type: Option<filter::FilterType>,
}

pub mod filter {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum FilterType {
        #[prost(message, tag = "1")]
        CompositeFilter(super::CompositeFilter),
        #[prost(message, tag = "2")]
        PropertyFilter(super::PropertyFilter),
    }
}

///
/// Query
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Query {
    #[prost(message, repeated, tag = "2")]
    pub projection: Vec<Projection>,
    #[prost(message, repeated, tag = "3")]
    pub kind: Vec<KindExpression>,
    #[prost(message, optional, tag = "4")]
    pub filter: Option<Filter>,
    #[prost(message, repeated, tag = "5")]
    pub order: Vec<PropertyOrder>,
    #[prost(message, repeated, tag = "6")]
    pub distinct_on: Vec<PropertyReference>,
    #[prost(bytes = "vec", tag = "7")]
    pub start_cursor: Vec<u8>,
    #[prost(bytes = "vec", tag = "8")]
    pub end_cursor: Vec<u8>,
    #[prost(int32, tag = "10")]
    pub offset: i32,
    #[prost(int32, optional, tag = "12")]
    pub limit: Option<i32>,
}

///
/// RunQueryRequest
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RunQueryRequest {
    #[prost(string, tag = "8")]
    pub project_id: String,
    #[prost(message, optional, tag = "2")]
    pub partition_id: Option<PartitionId>,
    #[prost(message, optional, tag = "3")]
    pub query: Option<Query>,
}

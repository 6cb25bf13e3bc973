//! Legacy internal protocol.
//!
//! Entities carry indexed properties in `property` and unindexed ones in
//! `raw_property`. Repeated records with the same name and `multiple = true`
//! form one multi-valued property. Embedded entities are nested, serialized
//! `EntityProto` bytes in `string_value` tagged with `ENTITY_PROTO`.

///
/// PointValue
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PointValue {
    #[prost(double, tag = "1")]
    pub x: f64,
    #[prost(double, tag = "2")]
    pub y: f64,
}

///
/// UserValue
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserValue {
    #[prost(string, tag = "1")]
    pub email: String,
    #[prost(string, tag = "2")]
    pub auth_domain: String,
    #[prost(string, optional, tag = "3")]
    pub nickname: Option<String>,
    #[prost(string, optional, tag = "4")]
    pub federated_identity: Option<String>,
    #[prost(string, optional, tag = "5")]
    pub federated_provider: Option<String>,
    #[prost(string, optional, tag = "6")]
    pub obfuscated_gaiaid: Option<String>,
}

///
/// ReferenceElement
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReferenceElement {
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(int64, optional, tag = "2")]
    pub id: Option<i64>,
    #[prost(string, optional, tag = "3")]
    pub name: Option<String>,
}

///
/// ReferenceValue
/// Key stored as a property value.
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReferenceValue {
    #[prost(string, tag = "1")]
    pub app: String,
    #[prost(string, optional, tag = "2")]
    pub name_space: Option<String>,
    #[prost(message, repeated, tag = "3")]
    pub path_element: Vec<ReferenceElement>,
}

///
/// PropertyValue
///
/// At most one payload field is set. An empty value is the explicit null.
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PropertyValue {
    #[prost(int64, optional, tag = "1")]
    pub int64_value: Option<i64>,
    #[prost(bool, optional, tag = "2")]
    pub boolean_value: Option<bool>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub string_value: Option<Vec<u8>>,
    #[prost(double, optional, tag = "4")]
    pub double_value: Option<f64>,
    #[prost(message, optional, tag = "5")]
    pub point_value: Option<PointValue>,
    #[prost(message, optional, tag = "8")]
    pub user_value: Option<UserValue>,
    #[prost(message, optional, tag = "12")]
    pub reference_value: Option<ReferenceValue>,
}

impl PropertyValue {
    /// True when no payload field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.int64_value.is_none()
            && self.boolean_value.is_none()
            && self.string_value.is_none()
            && self.double_value.is_none()
            && self.point_value.is_none()
            && self.user_value.is_none()
            && self.reference_value.is_none()
    }
}

///
/// Property
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Property {
    #[prost(int32, optional, tag = "1")]
    pub meaning: Option<i32>,
    #[prost(string, optional, tag = "2")]
    pub meaning_uri: Option<String>,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(bool, tag = "4")]
    pub multiple: bool,
    #[prost(message, optional, tag = "5")]
    pub value: Option<PropertyValue>,
}

///
/// PathElement
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PathElement {
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(int64, optional, tag = "2")]
    pub id: Option<i64>,
    #[prost(string, optional, tag = "3")]
    pub name: Option<String>,
}

///
/// Path
/// Root-first list of path elements.
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Path {
    #[prost(message, repeated, tag = "1")]
    pub element: Vec<PathElement>,
}

///
/// Reference
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Reference {
    #[prost(string, tag = "13")]
    pub app: String,
    #[prost(string, optional, tag = "20")]
    pub name_space: Option<String>,
    #[prost(message, optional, tag = "14")]
    pub path: Option<Path>,
}

///
/// EntityProto
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EntityProto {
    #[prost(message, optional, tag = "13")]
    pub key: Option<Reference>,
    #[prost(message, optional, tag = "16")]
    pub entity_group: Option<Path>,
    #[prost(message, repeated, tag = "14")]
    pub property: Vec<Property>,
    #[prost(message, repeated, tag = "15")]
    pub raw_property: Vec<Property>,
}

///
/// FilterOp
///

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum FilterOp {
    LessThan = 1,
    LessThanOrEqual = 2,
    GreaterThan = 3,
    GreaterThanOrEqual = 4,
    Equal = 5,
    In = 6,
    Exists = 7,
    ContainedInRegion = 8,
}

///
/// Direction
///

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Direction {
    Ascending = 1,
    Descending = 2,
}

///
/// RegionPoint
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegionPoint {
    #[prost(double, tag = "1")]
    pub latitude: f64,
    #[prost(double, tag = "2")]
    pub longitude: f64,
}

///
/// CircleRegion
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CircleRegion {
    #[prost(message, optional, tag = "1")]
    pub center: Option<RegionPoint>,
    #[prost(double, tag = "2")]
    pub radius_meters: f64,
}

///
/// RectangleRegion
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RectangleRegion {
    #[prost(message, optional, tag = "1")]
    pub southwest: Option<RegionPoint>,
    #[prost(message, optional, tag = "2")]
    pub northeast: Option<RegionPoint>,
}

///
/// GeoRegion
/// Exactly one shape is expected; the server rejects anything else.
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GeoRegion {
    #[prost(message, optional, tag = "1")]
    pub circle: Option<CircleRegion>,
    #[prost(message, optional, tag = "2")]
    pub rectangle: Option<RectangleRegion>,
}

///
/// Filter
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Filter {
    #[prost(enumeration = "FilterOp", tag = "6")]
    pub op: i32,
    #[prost(message, repeated, tag = "14")]
    pub property: Vec<Property>,
    #[prost(message, optional, tag = "40")]
    pub geo_region: Option<GeoRegion>,
}

///
/// Order
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Order {
    #[prost(string, tag = "10")]
    pub property: String,
    #[prost(enumeration = "Direction", tag = "11")]
    pub direction: i32,
}

///
/// Transaction
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Transaction {
    #[prost(fixed64, tag = "1")]
    pub handle: u64,
    #[prost(string, tag = "2")]
    pub app: String,
}

///
/// Query
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Query {
    #[prost(string, tag = "1")]
    pub app: String,
    #[prost(string, optional, tag = "29")]
    pub name_space: Option<String>,
    #[prost(string, optional, tag = "3")]
    pub kind: Option<String>,
    #[prost(message, optional, tag = "17")]
    pub ancestor: Option<Reference>,
    #[prost(message, repeated, tag = "4")]
    pub filter: Vec<Filter>,
    #[prost(message, repeated, tag = "9")]
    pub order: Vec<Order>,
    #[prost(bool, tag = "21")]
    pub keys_only: bool,
    #[prost(string, repeated, tag = "33")]
    pub property_name: Vec<String>,
    #[prost(string, repeated, tag = "34")]
    pub group_by_property_name: Vec<String>,
    #[prost(bool, tag = "35")]
    pub distinct: bool,
    #[prost(bytes = "vec", optional, tag = "30")]
    pub compiled_cursor: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "31")]
    pub end_compiled_cursor: Option<Vec<u8>>,
    #[prost(int32, optional, tag = "12")]
    pub offset: Option<i32>,
    #[prost(int32, optional, tag = "16")]
    pub limit: Option<i32>,
    #[prost(message, optional, tag = "22")]
    pub transaction: Option<Transaction>,
}

///
/// QueryResult
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct QueryResult {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub cursor: Option<Vec<u8>>,
    #[prost(message, repeated, tag = "2")]
    pub result: Vec<EntityProto>,
    #[prost(bool, tag = "3")]
    pub more_results: bool,
    #[prost(bool, tag = "4")]
    pub keys_only: bool,
}

///
/// GetRequest
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetRequest {
    #[prost(message, repeated, tag = "1")]
    pub key: Vec<Reference>,
    #[prost(message, optional, tag = "2")]
    pub transaction: Option<Transaction>,
}

///
/// GetResponseEntity
/// Either `entity` is set (found) or only `key` is set (missing).
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetResponseEntity {
    #[prost(message, optional, tag = "1")]
    pub entity: Option<EntityProto>,
    #[prost(message, optional, tag = "2")]
    pub key: Option<Reference>,
}

///
/// GetResponse
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetResponse {
    #[prost(message, repeated, tag = "1")]
    pub entity: Vec<GetResponseEntity>,
}

///
/// PutRequest
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PutRequest {
    #[prost(message, repeated, tag = "1")]
    pub entity: Vec<EntityProto>,
    #[prost(message, optional, tag = "2")]
    pub transaction: Option<Transaction>,
}

///
/// PutResponse
/// Keys are returned in request order, with ids assigned where missing.
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PutResponse {
    #[prost(message, repeated, tag = "1")]
    pub key: Vec<Reference>,
}

///
/// DeleteRequest
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteRequest {
    #[prost(message, repeated, tag = "1")]
    pub key: Vec<Reference>,
    #[prost(message, optional, tag = "2")]
    pub transaction: Option<Transaction>,
}

///
/// BeginTransactionRequest
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BeginTransactionRequest {
    #[prost(string, tag = "1")]
    pub app: String,
    #[prost(bool, tag = "2")]
    pub allow_multiple_eg: bool,
}

///
/// VoidProto
/// Empty request/response body.
///

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VoidProto {}

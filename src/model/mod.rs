//! In-memory API model consumed by the generators
//!
//! The model is a pure value: it never carries emission bookkeeping.
//! Reference counts live in [`crate::generation::RefCounts`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Built-in types every target language maps natively
pub const INTRINSIC_TYPES: &[&str] = &[
    "string", "int32", "int64", "float", "double", "boolean", "datetime", "uri", "any",
];

/// Tag metadata declared at the top of the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: String,
    pub description: Option<String>,
}

/// Where a method parameter travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
}

/// A reference from a declaration to a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    /// A type registered in [`ApiModel::types`] by name
    Named(String),
    Array(Box<TypeRef>),
    Hash(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// Innermost named type
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::Array(inner) | TypeRef::Hash(inner) => inner.base_name(),
        }
    }

    pub fn is_intrinsic(&self) -> bool {
        INTRINSIC_TYPES.contains(&self.base_name())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => write!(f, "{name}"),
            TypeRef::Array(inner) => write!(f, "{inner}[]"),
            TypeRef::Hash(inner) => write!(f, "Hash[{inner}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub location: ParamLocation,
    pub type_ref: TypeRef,
    pub required: bool,
    pub description: Option<String>,
}

/// One API operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub http_method: String,
    pub endpoint: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub params: Vec<Param>,
    pub result_type: Option<TypeRef>,
    /// Name of the Request type bundling this method's arguments
    pub request_type: Option<String>,
    pub deprecated: bool,
}

impl Method {
    pub fn required_params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| p.required)
    }

    pub fn optional_params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|p| !p.required)
    }

    pub fn body_param(&self) -> Option<&Param> {
        self.params
            .iter()
            .find(|p| p.location == ParamLocation::Body)
    }

    pub fn params_in(&self, location: ParamLocation) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(move |p| p.location == location)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    Intrinsic,
    Standard,
    Request,
    Write,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub type_ref: TypeRef,
    pub required: bool,
    pub read_only: bool,
    pub nullable: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    pub properties: Vec<Property>,
    pub enum_values: Vec<String>,
}

impl Type {
    pub fn intrinsic(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Intrinsic,
            description: None,
            properties: Vec::new(),
            enum_values: Vec::new(),
        }
    }

    pub fn is_intrinsic(&self) -> bool {
        self.kind == TypeKind::Intrinsic
    }

    pub fn has_read_only(&self) -> bool {
        self.properties.iter().any(|p| p.read_only)
    }
}

/// Parsed API description: methods grouped by tag plus the type table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiModel {
    pub title: String,
    pub version: String,
    pub tag_infos: Vec<TagInfo>,
    /// Methods grouped by tag, in document order
    pub tags: IndexMap<String, Vec<Method>>,
    /// Types sorted by name
    pub types: IndexMap<String, Type>,
}

impl ApiModel {
    /// Spec metadata for a tag, if the schema declares it
    pub fn tag_info(&self, name: &str) -> Option<&TagInfo> {
        self.tag_infos.iter().find(|t| t.name == name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.tags.values().flatten()
    }

    pub fn method_count(&self) -> usize {
        self.tags.values().map(Vec::len).sum()
    }

    pub fn get_type(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }
}

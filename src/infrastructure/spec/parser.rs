//! OpenAPI 3 document to [`ApiModel`] parser
//!
//! Handles `$ref` resolution for parameters, request bodies and responses,
//! and derives the synthetic Request and Write types the generators need.

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};

use crate::core::utils::to_proper_case;
use crate::infrastructure::spec::SpecError;
use crate::infrastructure::spec::converter::DEFAULT_TAG;
use crate::model::{
    ApiModel, INTRINSIC_TYPES, Method, Param, ParamLocation, Property, TagInfo, Type, TypeKind,
    TypeRef,
};

/// Operation keys of a path item
pub const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];

/// Methods with at least this many optional parameters get a Request type
const REQUEST_TYPE_THRESHOLD: usize = 2;

pub struct ApiModelParser {
    json: JsonValue,
}

impl ApiModelParser {
    pub fn new(json: JsonValue) -> Self {
        Self { json }
    }

    pub fn from_text(text: &str) -> Result<Self, SpecError> {
        let json = serde_json::from_str(text)
            .map_err(|e| SpecError::Parse(format!("Invalid JSON: {e}")))?;
        Ok(Self::new(json))
    }

    pub fn parse(&self) -> Result<ApiModel, SpecError> {
        let paths = self
            .json
            .get("paths")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| SpecError::Parse("Missing 'paths' object".to_string()))?;
        let schemas = self
            .json
            .pointer("/components/schemas")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| SpecError::Parse("Missing 'components.schemas' object".to_string()))?;

        let mut model = ApiModel {
            title: self.info_str("title").unwrap_or_default(),
            version: self.info_str("version").unwrap_or_default(),
            tag_infos: self.tag_infos(),
            ..Default::default()
        };

        for name in INTRINSIC_TYPES {
            model.types.insert(name.to_string(), Type::intrinsic(name));
        }
        for (name, schema) in schemas {
            let schema = self.deref(schema)?;
            model.types.insert(name.clone(), self.component_type(name, schema));
        }

        for (endpoint, item) in paths {
            let Some(item) = item.as_object() else {
                continue;
            };
            for verb in HTTP_METHODS {
                let Some(operation) = item.get(*verb).and_then(JsonValue::as_object) else {
                    continue;
                };
                let tag = operation
                    .get("tags")
                    .and_then(JsonValue::as_array)
                    .and_then(|tags| tags.first())
                    .and_then(JsonValue::as_str)
                    .unwrap_or(DEFAULT_TAG)
                    .to_string();
                let method = self.method(endpoint, verb, item, operation)?;
                model.tags.entry(tag).or_default().push(method);
            }
        }

        derive_write_types(&mut model);
        derive_request_types(&mut model);
        model.types.sort_keys();

        tracing::debug!(
            methods = model.method_count(),
            types = model.types.len(),
            "Parsed API model"
        );
        Ok(model)
    }

    fn info_str(&self, key: &str) -> Option<String> {
        self.json
            .get("info")?
            .get(key)?
            .as_str()
            .map(String::from)
    }

    fn tag_infos(&self) -> Vec<TagInfo> {
        self.json
            .get("tags")
            .and_then(JsonValue::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| {
                        Some(TagInfo {
                            name: tag.get("name")?.as_str()?.to_string(),
                            description: text(tag, "description"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn method(
        &self,
        endpoint: &str,
        verb: &str,
        item: &Map<String, JsonValue>,
        operation: &Map<String, JsonValue>,
    ) -> Result<Method, SpecError> {
        let name = operation
            .get("operationId")
            .and_then(JsonValue::as_str)
            .map(String::from)
            .unwrap_or_else(|| {
                format!(
                    "{verb}_{}",
                    endpoint
                        .trim_start_matches('/')
                        .replace(['/', '{', '}'], "_")
                        .trim_matches('_')
                )
            });

        let mut params = Vec::new();
        for source in [item.get("parameters"), operation.get("parameters")] {
            let Some(list) = source.and_then(JsonValue::as_array) else {
                continue;
            };
            for param in list {
                let param = self.parameter(self.deref(param)?)?;
                // operation-level parameters override path-level ones
                params.retain(|p: &Param| p.name != param.name || p.location != param.location);
                params.push(param);
            }
        }

        if let Some(body) = operation.get("requestBody") {
            let body = self.deref(body)?;
            if let Some(schema) = json_schema(body) {
                params.push(Param {
                    name: "body".to_string(),
                    location: ParamLocation::Body,
                    type_ref: self.type_ref(schema),
                    required: body
                        .get("required")
                        .and_then(JsonValue::as_bool)
                        .unwrap_or(false),
                    description: text(body, "description"),
                });
            }
        }

        Ok(Method {
            name,
            http_method: verb.to_uppercase(),
            endpoint: endpoint.to_string(),
            summary: operation.get("summary").and_then(JsonValue::as_str).map(String::from),
            description: operation
                .get("description")
                .and_then(JsonValue::as_str)
                .map(String::from),
            params,
            result_type: self.result_type(operation)?,
            request_type: None,
            deprecated: operation
                .get("deprecated")
                .and_then(JsonValue::as_bool)
                .unwrap_or(false),
        })
    }

    fn parameter(&self, param: &JsonValue) -> Result<Param, SpecError> {
        let name = param
            .get("name")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| SpecError::Parse("Parameter missing name".to_string()))?;
        let location = match param.get("in").and_then(JsonValue::as_str) {
            Some("path") => ParamLocation::Path,
            Some("query") => ParamLocation::Query,
            Some("header") => ParamLocation::Header,
            other => {
                return Err(SpecError::Parse(format!(
                    "Parameter '{name}' has unsupported location {other:?}"
                )));
            }
        };

        Ok(Param {
            name: name.to_string(),
            location,
            type_ref: param
                .get("schema")
                .map(|s| self.type_ref(s))
                .unwrap_or_else(|| TypeRef::named("string")),
            required: location == ParamLocation::Path
                || param
                    .get("required")
                    .and_then(JsonValue::as_bool)
                    .unwrap_or(false),
            description: text(param, "description"),
        })
    }

    /// Type of the first successful JSON response
    fn result_type(&self, operation: &Map<String, JsonValue>) -> Result<Option<TypeRef>, SpecError> {
        let Some(responses) = operation.get("responses").and_then(JsonValue::as_object) else {
            return Ok(None);
        };
        for (status, response) in responses {
            if !status.starts_with('2') {
                continue;
            }
            let response = self.deref(response)?;
            if let Some(schema) = json_schema(response) {
                return Ok(Some(self.type_ref(schema)));
            }
        }
        Ok(None)
    }

    fn component_type(&self, name: &str, schema: &JsonValue) -> Type {
        let description = text(schema, "description");
        if let Some(values) = schema.get("enum").and_then(JsonValue::as_array) {
            return Type {
                name: name.to_string(),
                kind: TypeKind::Enum,
                description,
                properties: Vec::new(),
                enum_values: values
                    .iter()
                    .map(|v| match v {
                        JsonValue::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            };
        }

        let required: Vec<&str> = schema
            .get("required")
            .and_then(JsonValue::as_array)
            .map(|r| r.iter().filter_map(JsonValue::as_str).collect())
            .unwrap_or_default();

        let properties = schema
            .get("properties")
            .and_then(JsonValue::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(prop_name, prop)| Property {
                        name: prop_name.clone(),
                        type_ref: self.type_ref(prop),
                        required: required.contains(&prop_name.as_str()),
                        read_only: flag(prop, "readOnly"),
                        nullable: flag(prop, "nullable"),
                        description: text(prop, "description"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Type {
            name: name.to_string(),
            kind: TypeKind::Standard,
            description,
            properties,
            enum_values: Vec::new(),
        }
    }

    /// Map a schema onto a type reference
    fn type_ref(&self, schema: &JsonValue) -> TypeRef {
        if let Some(reference) = schema.get("$ref").and_then(JsonValue::as_str) {
            return TypeRef::named(ref_name(reference));
        }
        if let Some(parts) = schema.get("allOf").and_then(JsonValue::as_array) {
            if parts.len() == 1 {
                return self.type_ref(&parts[0]);
            }
        }

        let format = schema.get("format").and_then(JsonValue::as_str);
        match schema.get("type").and_then(JsonValue::as_str) {
            Some("array") => TypeRef::Array(Box::new(
                schema
                    .get("items")
                    .map(|items| self.type_ref(items))
                    .unwrap_or_else(|| TypeRef::named("any")),
            )),
            Some("object") => match schema.get("additionalProperties") {
                Some(inner) if inner.is_object() => TypeRef::Hash(Box::new(self.type_ref(inner))),
                _ => TypeRef::Hash(Box::new(TypeRef::named("any"))),
            },
            Some("string") => TypeRef::named(match format {
                Some("date-time") => "datetime",
                Some("uri") => "uri",
                _ => "string",
            }),
            Some("integer") => TypeRef::named(match format {
                Some("int64") => "int64",
                _ => "int32",
            }),
            Some("number") => TypeRef::named(match format {
                Some("float") => "float",
                _ => "double",
            }),
            Some("boolean") => TypeRef::named("boolean"),
            _ => TypeRef::named("any"),
        }
    }

    /// Follow a local `$ref` if the node is one
    fn deref<'a>(&'a self, node: &'a JsonValue) -> Result<&'a JsonValue, SpecError> {
        let Some(reference) = node.get("$ref").and_then(JsonValue::as_str) else {
            return Ok(node);
        };
        let pointer = reference
            .strip_prefix('#')
            .ok_or_else(|| SpecError::Parse(format!("External references not supported: {reference}")))?;
        self.json
            .pointer(pointer)
            .ok_or_else(|| SpecError::Parse(format!("Unable to resolve reference: {reference}")))
    }
}

fn ref_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn text(node: &JsonValue, key: &str) -> Option<String> {
    node.get(key).and_then(JsonValue::as_str).map(String::from)
}

fn flag(node: &JsonValue, key: &str) -> bool {
    node.get(key).and_then(JsonValue::as_bool).unwrap_or(false)
}

/// Schema under `content`, preferring `application/json`
fn json_schema(node: &JsonValue) -> Option<&JsonValue> {
    let content = node.get("content")?.as_object()?;
    content
        .get("application/json")
        .or_else(|| content.values().next())?
        .get("schema")
}

fn with_base_name(type_ref: &TypeRef, name: &str) -> TypeRef {
    match type_ref {
        TypeRef::Named(_) => TypeRef::named(name),
        TypeRef::Array(inner) => TypeRef::Array(Box::new(with_base_name(inner, name))),
        TypeRef::Hash(inner) => TypeRef::Hash(Box::new(with_base_name(inner, name))),
    }
}

/// Body types with read-only properties get a `Write<Name>` twin without them
fn derive_write_types(model: &mut ApiModel) {
    let mut write_types: IndexMap<String, Type> = IndexMap::new();

    for methods in model.tags.values_mut() {
        for method in methods {
            let Some(body) = method
                .params
                .iter_mut()
                .find(|p| p.location == ParamLocation::Body)
            else {
                continue;
            };
            let base = body.type_ref.base_name().to_string();
            let Some(source) = model.types.get(&base) else {
                continue;
            };
            if source.kind != TypeKind::Standard || !source.has_read_only() {
                continue;
            }

            let write_name = format!("Write{base}");
            write_types.entry(write_name.clone()).or_insert_with(|| Type {
                name: write_name.clone(),
                kind: TypeKind::Write,
                description: source.description.clone(),
                properties: source
                    .properties
                    .iter()
                    .filter(|p| !p.read_only)
                    .cloned()
                    .collect(),
                enum_values: Vec::new(),
            });
            body.type_ref = with_base_name(&body.type_ref, &write_name);
        }
    }

    model.types.extend(write_types);
}

fn derive_request_types(model: &mut ApiModel) {
    let mut request_types = Vec::new();

    for methods in model.tags.values_mut() {
        for method in methods {
            if method.optional_params().count() < REQUEST_TYPE_THRESHOLD {
                continue;
            }
            let name = format!("Request{}", to_proper_case(&method.name));
            request_types.push(Type {
                name: name.clone(),
                kind: TypeKind::Request,
                description: Some(format!("Dynamically generated request type for {}", method.name)),
                properties: method
                    .params
                    .iter()
                    .map(|p| Property {
                        name: p.name.clone(),
                        type_ref: p.type_ref.clone(),
                        required: p.required,
                        read_only: false,
                        nullable: false,
                        description: p.description.clone(),
                    })
                    .collect(),
                enum_values: Vec::new(),
            });
            method.request_type = Some(name);
        }
    }

    for request in request_types {
        model.types.insert(request.name.clone(), request);
    }
}

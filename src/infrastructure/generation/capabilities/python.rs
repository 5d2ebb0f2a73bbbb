//! Python rendering capability
//!
//! Python SDKs bind a single API version and take optional arguments by
//! keyword, so Request types are never emitted.

use std::path::PathBuf;

use super::{method_doc, version_suffix};
use crate::generation::{Category, CapabilitySettings, FormatterCapability, Language, RefCounts};
use crate::model::{Method, ParamLocation, Type, TypeKind, TypeRef};

const INDENT: &str = "    ";

pub struct PythonCapability {
    settings: CapabilitySettings,
}

impl PythonCapability {
    pub fn new(settings: &CapabilitySettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    fn sdk_dir(&self) -> PathBuf {
        self.settings
            .output_root
            .join("python")
            .join("looker_sdk")
            .join("sdk")
    }

    /// Python annotation for a reference. Model names are qualified with the
    /// `models` module outside the models file and quoted inside it.
    fn type_name(type_ref: &TypeRef, refs: &mut RefCounts, in_models: bool) -> String {
        match type_ref {
            TypeRef::Named(name) => {
                refs.reference(name);
                match name.as_str() {
                    "string" | "uri" => "str".to_string(),
                    "int32" | "int64" => "int".to_string(),
                    "float" | "double" => "float".to_string(),
                    "boolean" => "bool".to_string(),
                    "datetime" => "datetime.datetime".to_string(),
                    "any" => "Any".to_string(),
                    other if in_models => format!("\"{other}\""),
                    other => format!("mdls.{other}"),
                }
            }
            TypeRef::Array(inner) => {
                format!("Sequence[{}]", Self::type_name(inner, refs, in_models))
            }
            TypeRef::Hash(inner) => format!(
                "MutableMapping[str, {}]",
                Self::type_name(inner, refs, in_models)
            ),
        }
    }

    fn docstring(indent: &str, lines: &[String]) -> String {
        let mut out = vec![format!("{indent}\"\"\"")];
        for line in lines {
            if line.is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("{indent}{line}"));
            }
        }
        out.push(format!("{indent}\"\"\""));
        out.join("\n")
    }
}

impl FormatterCapability for PythonCapability {
    fn language(&self) -> Language {
        Language::Python
    }

    fn api_version(&self) -> &str {
        &self.settings.api_version
    }

    fn reset(&mut self) {}

    fn supports_multi_api(&self) -> bool {
        false
    }

    fn use_named_parameters(&self) -> bool {
        true
    }

    fn item_indent(&self, category: Category) -> &'static str {
        match category {
            Category::Methods => INDENT,
            _ => "",
        }
    }

    fn comment_header(&self, indent: &str, text: &str) -> String {
        self.comment(indent, text)
    }

    fn comment(&self, indent: &str, text: &str) -> String {
        text.lines()
            .map(|line| {
                if line.is_empty() {
                    format!("{indent}#")
                } else {
                    format!("{indent}# {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn begin_region(&self, indent: &str, description: &str) -> String {
        format!("{indent}# region {description}\n")
    }

    fn end_region(&self, indent: &str, description: &str) -> String {
        format!("{indent}# endregion {description}\n")
    }

    fn prologue(&mut self, category: Category, indent: &str) -> String {
        let version = &self.settings.api_version;
        match category {
            Category::Methods => format!(
                "import datetime\n\
                 from typing import Any, MutableMapping, Optional, Sequence, Union, cast\n\
                 import warnings\n\n\
                 from . import models as mdls\n\
                 from looker_sdk.rtl import api_methods\n\
                 from looker_sdk.rtl import transport\n\n\n\
                 {indent}class Looker{}SDK(api_methods.APIMethods):\n\
                 {indent}{INDENT}api_version = \"{version}\"\n",
                version_suffix(version),
            ),
            Category::Models => "import datetime\n\
                 import enum\n\
                 from typing import Any, MutableMapping, Optional, Sequence\n\n\
                 import attr\n\n\
                 from looker_sdk.rtl import model\n\
                 from looker_sdk.rtl import serialize as sr\n\n\
                 EXPLICIT_NULL = model.EXPLICIT_NULL  # type: ignore\n\
                 DelimSequence = model.DelimSequence\n"
                .to_string(),
            _ => String::new(),
        }
    }

    fn epilogue(&mut self, category: Category, _indent: &str) -> String {
        match category {
            Category::Models => "import functools  # noqa:E402\n\n\
                 forward_ref_structure_hook = functools.partial(\n\
                 \x20   sr.forward_ref_structure_hook, globals(), sr.converter\n\
                 )\n"
                .to_string(),
            _ => String::new(),
        }
    }

    fn declare_method(&mut self, indent: &str, method: &Method, refs: &mut RefCounts) -> String {
        let result = match &method.result_type {
            Some(result) => Self::type_name(result, refs, false),
            None => "None".to_string(),
        };
        let body_indent = format!("{indent}{INDENT}");

        let mut out = Vec::new();
        for line in method_doc(method, &result) {
            if line.is_empty() {
                out.push(format!("{indent}#"));
            } else {
                out.push(format!("{indent}# {line}"));
            }
        }

        let mut args = vec![format!("{body_indent}self,")];
        for param in method.required_params() {
            let ty = Self::type_name(&param.type_ref, refs, false);
            args.push(format!("{body_indent}{}: {ty},", param.name));
        }
        for param in method.optional_params() {
            let ty = Self::type_name(&param.type_ref, refs, false);
            args.push(format!("{body_indent}{}: Optional[{ty}] = None,", param.name));
        }
        args.push(format!(
            "{body_indent}transport_options: Optional[transport.TransportOptions] = None,"
        ));
        out.push(format!("{indent}def {}(", method.name));
        out.extend(args);
        out.push(format!("{indent}) -> {result}:"));

        if let Some(summary) = &method.summary {
            out.push(Self::docstring(&body_indent, &[summary.clone()]));
        }
        if method.deprecated {
            out.push(format!(
                "{body_indent}warnings.warn(\"This API {} call is deprecated\", DeprecationWarning)",
                self.settings.api_version
            ));
        }
        for param in method.params_in(ParamLocation::Path) {
            out.push(format!(
                "{body_indent}{name} = self.encode_path_param({name})",
                name = param.name
            ));
        }

        let mut call = vec![format!("path=f\"{}\"", method.endpoint)];
        if method.result_type.is_some() {
            call.push(format!("structure={result}"));
        }
        let queries: Vec<String> = method
            .params_in(ParamLocation::Query)
            .map(|p| format!("\"{0}\": {0}", p.name))
            .collect();
        if !queries.is_empty() {
            call.push(format!("query_params={{{}}}", queries.join(", ")));
        }
        if let Some(body) = method.body_param() {
            call.push(format!("body={}", body.name));
        }
        call.push("transport_options=transport_options".to_string());

        let verb = method.http_method.to_lowercase();
        let call_indent = format!("{body_indent}{INDENT}{INDENT}");
        let call = call
            .iter()
            .map(|c| format!("{call_indent}{c},"))
            .collect::<Vec<_>>()
            .join("\n");
        out.push(format!(
            "{body_indent}response = cast(\n{body_indent}{INDENT}{result},\n{body_indent}{INDENT}self.{verb}(\n{call}\n{body_indent}{INDENT}),\n{body_indent})"
        ));
        out.push(format!("{body_indent}return response\n"));
        out.join("\n")
    }

    fn declare_type(&mut self, indent: &str, ty: &Type, refs: &mut RefCounts) -> String {
        let member_indent = format!("{indent}{INDENT}");
        let mut out = Vec::new();

        if ty.kind == TypeKind::Enum {
            out.push(format!("{indent}class {}(enum.Enum):", ty.name));
            out.push(Self::docstring(
                &member_indent,
                &[ty
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("{} values", ty.name))],
            ));
            out.push(String::new());
            for value in &ty.enum_values {
                let member = value
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                    .collect::<String>();
                out.push(format!("{member_indent}{member} = \"{value}\""));
            }
            out.push(String::new());
            return out.join("\n");
        }

        out.push(format!("{indent}@attr.s(auto_attribs=True, init=False)"));
        out.push(format!("{indent}class {}(model.Model):", ty.name));

        let mut doc = Vec::new();
        if let Some(description) = &ty.description {
            doc.extend(description.lines().map(str::to_string));
            doc.push(String::new());
        }
        doc.push("Attributes:".to_string());
        for prop in &ty.properties {
            let text = prop.description.as_deref().unwrap_or("");
            doc.push(format!("{INDENT}{}: {text}", prop.name).trim_end().to_string());
        }
        out.push(Self::docstring(&member_indent, &doc));
        out.push(String::new());

        // attrs needs defaulted attributes after the mandatory ones
        let required = ty.properties.iter().filter(|p| p.required);
        let optional = ty.properties.iter().filter(|p| !p.required);
        for prop in required {
            let prop_type = Self::type_name(&prop.type_ref, refs, true);
            out.push(format!("{member_indent}{}: {prop_type}", prop.name));
        }
        for prop in optional {
            let prop_type = Self::type_name(&prop.type_ref, refs, true);
            out.push(format!(
                "{member_indent}{}: Optional[{prop_type}] = None",
                prop.name
            ));
        }
        out.push(String::new());
        out.join("\n")
    }

    fn file_name(&self, category: Category) -> PathBuf {
        self.sdk_dir()
            .join(format!("api{}", version_suffix(&self.settings.api_version)))
            .join(format!("{}.{}", category.as_str(), self.file_extension()))
    }

    fn constants_file(&self) -> Option<PathBuf> {
        Some(self.sdk_dir().join("constants.py"))
    }
}

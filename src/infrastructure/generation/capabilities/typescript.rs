//! TypeScript rendering capability
//!
//! Emits one SDK class per API version plus a matching interface, free
//! functions and a streaming class. Model references are collected while
//! rendering and turned into the `./models` import list in the prologue.

use std::collections::BTreeSet;
use std::path::PathBuf;

use super::{method_doc, version_suffix};
use crate::generation::{Category, CapabilitySettings, FormatterCapability, Language, RefCounts};
use crate::model::{Method, ParamLocation, Type, TypeKind, TypeRef};

const RUNTIME_PACKAGE: &str = "@looker/sdk-rtl";
const ERROR_TYPE: &str = "Error";

pub struct TypeScriptCapability {
    settings: CapabilitySettings,
    /// Model types referenced by the file being rendered
    imports: BTreeSet<String>,
}

impl TypeScriptCapability {
    pub fn new(settings: &CapabilitySettings) -> Self {
        Self {
            settings: settings.clone(),
            imports: BTreeSet::new(),
        }
    }

    fn sdk_name(&self) -> String {
        format!("Looker{}SDK", version_suffix(&self.settings.api_version))
    }

    fn api_dir(&self) -> PathBuf {
        self.settings
            .output_root
            .join("typescript")
            .join("sdk")
            .join("src")
            .join(version_suffix(&self.settings.api_version))
    }

    fn type_name(&mut self, type_ref: &TypeRef, refs: &mut RefCounts) -> String {
        match type_ref {
            TypeRef::Named(name) => {
                refs.reference(name);
                match name.as_str() {
                    "string" => "string".to_string(),
                    "int32" | "int64" | "float" | "double" => "number".to_string(),
                    "boolean" => "boolean".to_string(),
                    "datetime" => "Date".to_string(),
                    "uri" => "Url".to_string(),
                    "any" => "any".to_string(),
                    other => {
                        let name = format!("I{other}");
                        self.imports.insert(name.clone());
                        name
                    }
                }
            }
            TypeRef::Array(inner) => format!("{}[]", self.type_name(inner, refs)),
            TypeRef::Hash(inner) => format!("IDictionary<{}>", self.type_name(inner, refs)),
        }
    }

    fn result_name(&mut self, method: &Method, refs: &mut RefCounts) -> String {
        match &method.result_type {
            Some(result) => self.type_name(result, refs),
            None => "void".to_string(),
        }
    }

    fn error_name(&mut self, refs: &mut RefCounts) -> String {
        self.type_name(&TypeRef::named(ERROR_TYPE), refs)
    }

    fn doc(&self, indent: &str, method: &Method, result: &str) -> String {
        let mut out = vec![format!("{indent}/**")];
        for line in method_doc(method, result) {
            if line.is_empty() {
                out.push(format!("{indent} *"));
            } else {
                out.push(format!("{indent} * {line}"));
            }
        }
        out.push(format!("{indent} */"));
        out.join("\n")
    }

    /// Argument list, either one per parameter or a single request object
    fn arguments(&mut self, method: &Method, refs: &mut RefCounts) -> Vec<String> {
        if let Some(request) = &method.request_type {
            let request = self.type_name(&TypeRef::named(request.clone()), refs);
            return vec![format!("request: {request}")];
        }
        let mut args = Vec::new();
        for param in method.required_params().chain(method.optional_params()) {
            let ty = self.type_name(&param.type_ref, refs);
            let optional = if param.required { "" } else { "?" };
            args.push(format!("{}{optional}: {ty}", param.name));
        }
        args
    }

    /// Statements that encode path params and issue the transport call
    fn call_body(&self, indent: &str, method: &Method, target: &str, prefix: &str) -> Vec<String> {
        let source = if method.request_type.is_some() {
            "request."
        } else {
            ""
        };
        let mut lines = Vec::new();
        for param in method.params_in(ParamLocation::Path) {
            lines.push(format!(
                "{indent}{source}{name} = encodeParam({source}{name})",
                name = param.name
            ));
        }

        let path = if source.is_empty() {
            method.endpoint.replace('{', "${")
        } else {
            method.endpoint.replace('{', "${request.")
        };
        let queries: Vec<String> = method
            .params_in(ParamLocation::Query)
            .map(|p| {
                if source.is_empty() {
                    p.name.clone()
                } else {
                    format!("{}: request.{}", p.name, p.name)
                }
            })
            .collect();
        let query = if queries.is_empty() {
            "null".to_string()
        } else {
            format!("{{ {} }}", queries.join(", "))
        };
        let body = match method.body_param() {
            Some(body) => format!("{source}{}", body.name),
            None => "null".to_string(),
        };

        lines.push(format!(
            "{indent}return {target}{prefix}`{path}`, {query}, {body}, options)",
        ));
        lines
    }

    fn signature(
        &mut self,
        indent: &str,
        head: &str,
        leading: Option<String>,
        method: &Method,
        refs: &mut RefCounts,
    ) -> String {
        let mut args: Vec<String> = leading.into_iter().collect();
        args.extend(self.arguments(method, refs));
        args.push("options?: Partial<ITransportSettings>".to_string());
        let arg_indent = format!("{indent}  ");
        let args = args
            .iter()
            .map(|a| format!("{arg_indent}{a}"))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{indent}{head}(\n{args}\n{indent})")
    }

    fn imports_block(&self, runtime: &[&str], models_path: &str) -> String {
        let mut lines = vec![format!(
            "import type {{ {} }} from '{RUNTIME_PACKAGE}'",
            runtime.join(", ")
        )];
        let models: Vec<&str> = self.imports.iter().map(String::as_str).collect();
        if !models.is_empty() {
            lines.push(format!(
                "import type {{ {} }} from '{models_path}'",
                models.join(", ")
            ));
        }
        lines.join("\n")
    }
}

impl FormatterCapability for TypeScriptCapability {
    fn language(&self) -> Language {
        Language::TypeScript
    }

    fn api_version(&self) -> &str {
        &self.settings.api_version
    }

    fn reset(&mut self) {
        self.imports.clear();
    }

    fn will_it_stream(&self) -> bool {
        true
    }

    fn use_functions(&self) -> bool {
        true
    }

    fn use_interfaces(&self) -> bool {
        true
    }

    fn item_indent(&self, category: Category) -> &'static str {
        match category {
            Category::Methods | Category::Streams | Category::MethodsInterface => "  ",
            Category::Funcs | Category::Models => "",
        }
    }

    fn comment_header(&self, indent: &str, text: &str) -> String {
        let mut out = vec![format!("{indent}/*")];
        out.push(String::new());
        for line in text.lines() {
            if line.is_empty() {
                out.push(String::new());
            } else {
                out.push(format!("{indent} {line}"));
            }
        }
        out.push(String::new());
        out.push(format!("{indent} */"));
        out.join("\n")
    }

    fn comment(&self, indent: &str, text: &str) -> String {
        text.lines()
            .map(|line| format!("{indent}/** {line} */"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn begin_region(&self, indent: &str, description: &str) -> String {
        format!("{indent}//#region {description}")
    }

    fn end_region(&self, indent: &str, description: &str) -> String {
        format!("{indent}//#endregion {description}\n")
    }

    fn prologue(&mut self, category: Category, indent: &str) -> String {
        let sdk = self.sdk_name();
        let version = &self.settings.api_version;
        match category {
            Category::Methods => format!(
                "{}\nimport {{ APIMethods, encodeParam }} from '{RUNTIME_PACKAGE}'\nimport {{ sdkVersion }} from '../constants'\nimport type {{ I{sdk} }} from './methodsInterface'\n\n{indent}export class {sdk} extends APIMethods implements I{sdk} {{\n{indent}  static readonly ApiVersion = '{version}'\n",
                self.imports_block(&["IAuthSession", "ITransportSettings", "IDictionary", "SDKResponse"], "./models"),
            ),
            Category::Streams => format!(
                "import type {{ Readable }} from 'readable-stream'\n{}\nimport {{ APIMethods, encodeParam }} from '{RUNTIME_PACKAGE}'\n\n{indent}export class {sdk}Stream extends APIMethods {{\n{indent}  static readonly ApiVersion = '{version}'\n",
                self.imports_block(&["IAuthSession", "ITransportSettings", "IDictionary"], "./models"),
            ),
            Category::MethodsInterface => format!(
                "{}\n\n{indent}export interface I{sdk} {{\n",
                self.imports_block(&["IAPIMethods", "ITransportSettings", "IDictionary", "SDKResponse"], "./models"),
            ),
            Category::Funcs => format!(
                "{}\nimport {{ encodeParam }} from '{RUNTIME_PACKAGE}'\n",
                self.imports_block(&["IAPIMethods", "ITransportSettings", "IDictionary", "SDKResponse"], "./models"),
            ),
            Category::Models => format!(
                "import type {{ IDictionary, Url }} from '{RUNTIME_PACKAGE}'\n"
            ),
        }
    }

    fn epilogue(&mut self, category: Category, indent: &str) -> String {
        match category {
            Category::Methods | Category::Streams | Category::MethodsInterface => {
                format!("{indent}}}")
            }
            Category::Funcs | Category::Models => String::new(),
        }
    }

    fn declare_method(&mut self, indent: &str, method: &Method, refs: &mut RefCounts) -> String {
        let result = self.result_name(method, refs);
        let error = self.error_name(refs);
        let signature = self.signature(indent, &format!("async {}", method.name), None, method, refs);
        let verb = method.http_method.to_lowercase();
        let body = self.call_body(
            &format!("{indent}  "),
            method,
            "this.",
            &format!("{verb}<{result}, {error}>("),
        );
        format!(
            "{}\n{signature}: Promise<SDKResponse<{result}, {error}>> {{\n{}\n{indent}}}\n",
            self.doc(indent, method, &result),
            body.join("\n"),
        )
    }

    fn declare_interface(&mut self, indent: &str, method: &Method, refs: &mut RefCounts) -> String {
        let result = self.result_name(method, refs);
        let error = self.error_name(refs);
        let signature = self.signature(indent, &method.name, None, method, refs);
        format!(
            "{}\n{signature}: Promise<SDKResponse<{result}, {error}>>\n",
            self.doc(indent, method, &result),
        )
    }

    fn declare_function(&mut self, indent: &str, method: &Method, refs: &mut RefCounts) -> String {
        let result = self.result_name(method, refs);
        let error = self.error_name(refs);
        let signature = self.signature(
            indent,
            &format!("export const {} = async ", method.name),
            Some("sdk: IAPIMethods".to_string()),
            method,
            refs,
        );
        let verb = method.http_method.to_lowercase();
        let body = self.call_body(
            &format!("{indent}  "),
            method,
            "sdk.",
            &format!("{verb}<{result}, {error}>("),
        );
        format!(
            "{}\n{signature}: Promise<SDKResponse<{result}, {error}>> => {{\n{}\n{indent}}}\n",
            self.doc(indent, method, &result),
            body.join("\n"),
        )
    }

    fn declare_streamer(&mut self, indent: &str, method: &Method, refs: &mut RefCounts) -> String {
        let result = self.result_name(method, refs);
        let signature = self.signature(
            indent,
            &format!("async {}", method.name),
            Some(format!("callback: (readable: Readable) => Promise<{result}>")),
            method,
            refs,
        );
        let body = self.call_body(
            &format!("{indent}  "),
            method,
            "this.",
            &format!(
                "authStream<{result}>(callback, '{}', ",
                method.http_method.to_uppercase()
            ),
        );
        format!(
            "{}\n{signature} {{\n{}\n{indent}}}\n",
            self.doc(indent, method, &result),
            body.join("\n"),
        )
    }

    fn declare_type(&mut self, indent: &str, ty: &Type, refs: &mut RefCounts) -> String {
        let mut out = Vec::new();
        if let Some(description) = &ty.description {
            out.push(self.comment(indent, description));
        }

        if ty.kind == TypeKind::Enum {
            let values = ty
                .enum_values
                .iter()
                .map(|v| format!("'{v}'"))
                .collect::<Vec<_>>()
                .join(" | ");
            out.push(format!("{indent}export type I{} = {values}\n", ty.name));
            return out.join("\n");
        }

        out.push(format!("{indent}export interface I{} {{", ty.name));
        for prop in &ty.properties {
            let prop_type = self.type_name(&prop.type_ref, refs);
            let nullable = if prop.nullable { " | null" } else { "" };
            let optional = if prop.required { "" } else { "?" };
            if let Some(description) = &prop.description {
                out.push(self.comment(&format!("{indent}  "), description));
            }
            out.push(format!(
                "{indent}  {}{optional}: {prop_type}{nullable}",
                prop.name
            ));
        }
        out.push(format!("{indent}}}\n"));
        out.join("\n")
    }

    fn file_name(&self, category: Category) -> PathBuf {
        self.api_dir()
            .join(format!("{}.{}", category.as_str(), self.file_extension()))
    }

    fn constants_file(&self) -> Option<PathBuf> {
        Some(
            self.settings
                .output_root
                .join("typescript")
                .join("sdk")
                .join("src")
                .join("constants.ts"),
        )
    }
}

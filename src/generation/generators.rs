//! Generator family
//!
//! Every generator walks the [`ApiModel`] and asks the injected
//! [`FormatterCapability`] to render one item at a time. The shared
//! [`render_with`] routine fixes the file layout: license header, tally
//! comment, prologue, rendered items, epilogue. Generators only decide
//! which items to render and how to count them.

use tracing::warn;

use crate::generation::{Category, FormatterCapability, RefCounts};
use crate::model::{ApiModel, Method, TypeKind};

/// Banner placed at the top of every generated file
pub const LICENSE_HEADER: &str = "MIT License\n\n\
This file is generated from the API specification.\n\
Manual changes will be overwritten the next time the SDK is generated.";

pub trait Generator {
    fn category(&self) -> Category;

    /// Rendered declarations for this generator's items, in emission order
    fn items(
        &self,
        model: &ApiModel,
        formatter: &mut dyn FormatterCapability,
        refs: &mut RefCounts,
        indent: &str,
    ) -> Vec<String>;

    /// Summary comment describing what was emitted
    fn tally(&self, model: &ApiModel, refs: &RefCounts) -> String;

    /// Full file content for this category
    fn render(
        &self,
        model: &ApiModel,
        formatter: &mut dyn FormatterCapability,
        refs: &mut RefCounts,
    ) -> String {
        render_with(self, model, formatter, refs)
    }
}

/// Shared render routine for every generator
pub fn render_with<G: Generator + ?Sized>(
    generator: &G,
    model: &ApiModel,
    formatter: &mut dyn FormatterCapability,
    refs: &mut RefCounts,
) -> String {
    let category = generator.category();
    formatter.reset();
    refs.reset_if_pending(model);

    let indent = formatter.item_indent(category);
    let body = generator.items(model, formatter, refs, indent);
    let tally = generator.tally(model, refs);

    let sections = [
        formatter.comment_header("", LICENSE_HEADER),
        formatter.comment("", &tally),
        formatter.prologue(category, ""),
        body.join("\n"),
        formatter.epilogue(category, ""),
    ];

    let mut content = sections
        .iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    content.push('\n');
    content
}

/// Render every method grouped into one region per tag
fn tagged_regions<F>(
    model: &ApiModel,
    formatter: &mut dyn FormatterCapability,
    refs: &mut RefCounts,
    indent: &str,
    mut declare: F,
) -> Vec<String>
where
    F: FnMut(&mut dyn FormatterCapability, &str, &Method, &mut RefCounts) -> String,
{
    let mut buf = Vec::new();
    for (tag, methods) in &model.tags {
        if methods.is_empty() {
            continue;
        }
        let description = match model.tag_info(tag) {
            Some(info) => match &info.description {
                Some(text) => format!("{tag}: {text}"),
                None => tag.clone(),
            },
            None => {
                warn!(tag = %tag, "Tag not found in specification");
                tag.clone()
            }
        };

        buf.push(formatter.begin_region(indent, &description));
        for method in methods {
            buf.push(declare(formatter, indent, method, refs));
        }
        buf.push(formatter.end_region(indent, &description));
    }
    buf
}

fn method_tally(model: &ApiModel) -> String {
    format!("{} API methods", model.method_count())
}

/// Standard method declarations
pub struct MethodGenerator;

impl Generator for MethodGenerator {
    fn category(&self) -> Category {
        Category::Methods
    }

    fn items(
        &self,
        model: &ApiModel,
        formatter: &mut dyn FormatterCapability,
        refs: &mut RefCounts,
        indent: &str,
    ) -> Vec<String> {
        tagged_regions(model, formatter, refs, indent, |f, i, m, r| {
            f.declare_method(i, m, r)
        })
    }

    fn tally(&self, model: &ApiModel, _refs: &RefCounts) -> String {
        method_tally(model)
    }
}

/// Streaming method declarations
pub struct StreamGenerator {
    /// Skip the whole category
    pub omit: bool,
}

impl StreamGenerator {
    pub fn new(omit: bool) -> Self {
        Self { omit }
    }
}

impl Generator for StreamGenerator {
    fn category(&self) -> Category {
        Category::Streams
    }

    fn items(
        &self,
        model: &ApiModel,
        formatter: &mut dyn FormatterCapability,
        refs: &mut RefCounts,
        indent: &str,
    ) -> Vec<String> {
        tagged_regions(model, formatter, refs, indent, |f, i, m, r| {
            f.declare_streamer(i, m, r)
        })
    }

    fn tally(&self, model: &ApiModel, _refs: &RefCounts) -> String {
        method_tally(model)
    }

    fn render(
        &self,
        model: &ApiModel,
        formatter: &mut dyn FormatterCapability,
        refs: &mut RefCounts,
    ) -> String {
        if self.omit {
            warn!(
                language = %formatter.language(),
                "Skipping streaming methods generation"
            );
            return String::new();
        }
        render_with(self, model, formatter, refs)
    }
}

/// Signature-only method declarations
pub struct InterfaceGenerator;

impl Generator for InterfaceGenerator {
    fn category(&self) -> Category {
        Category::MethodsInterface
    }

    fn items(
        &self,
        model: &ApiModel,
        formatter: &mut dyn FormatterCapability,
        refs: &mut RefCounts,
        indent: &str,
    ) -> Vec<String> {
        tagged_regions(model, formatter, refs, indent, |f, i, m, r| {
            f.declare_interface(i, m, r)
        })
    }

    fn tally(&self, model: &ApiModel, _refs: &RefCounts) -> String {
        method_tally(model)
    }
}

/// Free-function method declarations
pub struct FunctionGenerator;

impl Generator for FunctionGenerator {
    fn category(&self) -> Category {
        Category::Funcs
    }

    fn items(
        &self,
        model: &ApiModel,
        formatter: &mut dyn FormatterCapability,
        refs: &mut RefCounts,
        indent: &str,
    ) -> Vec<String> {
        tagged_regions(model, formatter, refs, indent, |f, i, m, r| {
            f.declare_function(i, m, r)
        })
    }

    fn tally(&self, model: &ApiModel, _refs: &RefCounts) -> String {
        method_tally(model)
    }
}

/// Referenced-type counts by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeTally {
    pub standard: usize,
    pub request: usize,
    pub write: usize,
    pub enums: usize,
}

impl TypeTally {
    pub fn total(&self) -> usize {
        self.standard + self.request + self.write + self.enums
    }

    /// Count non-intrinsic types referenced at least once in this pass
    pub fn from_refs(model: &ApiModel, refs: &RefCounts) -> Self {
        let mut tally = TypeTally::default();
        for ty in model.types.values() {
            if !refs.is_referenced(&ty.name) {
                continue;
            }
            match ty.kind {
                TypeKind::Intrinsic => {}
                TypeKind::Standard => tally.standard += 1,
                TypeKind::Request => tally.request += 1,
                TypeKind::Write => tally.write += 1,
                TypeKind::Enum => tally.enums += 1,
            }
        }
        tally
    }
}

impl std::fmt::Display for TypeTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} API models: {} Spec, {} Request, {} Write, {} Enum",
            self.total(),
            self.standard,
            self.request,
            self.write,
            self.enums
        )
    }
}

/// Type declarations
pub struct TypeGenerator;

impl Generator for TypeGenerator {
    fn category(&self) -> Category {
        Category::Models
    }

    fn items(
        &self,
        model: &ApiModel,
        formatter: &mut dyn FormatterCapability,
        refs: &mut RefCounts,
        indent: &str,
    ) -> Vec<String> {
        let named_params = formatter.use_named_parameters();
        let mut buf = Vec::new();
        for ty in model.types.values() {
            if ty.is_intrinsic() {
                continue;
            }
            if named_params && ty.kind == TypeKind::Request {
                continue;
            }
            buf.push(formatter.declare_type(indent, ty, refs));
        }
        buf
    }

    fn tally(&self, model: &ApiModel, refs: &RefCounts) -> String {
        TypeTally::from_refs(model, refs).to_string()
    }
}

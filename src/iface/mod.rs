//! Interface reflection: from a service's declared method surface to a
//! protocol interface description.
//!
//! Rather than scanning an object for callable members and filtering
//! framework internals out, reflection here is an explicit capability:
//! a mock service lists its exposed methods through
//! [`ReflectableService::list_methods`]. Only listed methods end up in
//! the interface, so no ignore list is needed.
//!
//! A method that declares a return type must also document its return
//! fields (`return name: type`); that documentation is the only source
//! of return field names, so its absence fails interface construction
//! immediately rather than at call time.

pub mod cast;

use serde_json::Value;

use crate::error::{MockError, Result};
pub use cast::cast_type;
use mocklink_wire::CallError;

/// One declared parameter of a mock method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    /// Native type token, cast via [`cast_type`] when rendered.
    pub ty: String,
}

/// The declared shape of one exposed mock method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MethodSpec {
    pub name: String,
    pub params: Vec<ParamSpec>,
    /// Declared return type token, if the method returns anything.
    pub returns: Option<String>,
    /// Return-field documentation, `return name: type` form.
    pub doc: Option<String>,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>) -> Self {
        MethodSpec {
            name: name.into(),
            ..MethodSpec::default()
        }
    }

    /// Add a declared parameter.
    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    /// Declare the return type token.
    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.returns = Some(ty.into());
        self
    }

    /// Attach the return-field documentation string.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// The capability a service must expose to have an interface derived
/// from it. Listing a method is what exposes it; there is no hidden
/// filtering.
pub trait ReflectableService {
    /// Exposed methods, in the order they should appear in the
    /// interface description.
    fn list_methods(&self) -> Vec<MethodSpec>;
}

/// Behaviour source for a mocked service: reflectable shape plus the
/// call dispatch the mock process serves from.
pub trait MockService: ReflectableService + Send + Sync {
    /// Compute the reply payload for one call. `method` is the bare
    /// member name; `parameters` are the caller's arguments.
    fn call(&self, method: &str, parameters: &Value) -> std::result::Result<Value, CallError>;
}

/// Render the interface-description line for one method.
///
/// Parameters render as `name: type` with cast types, joined by `,`. The
/// parenthesized return-field list comes from the documentation string
/// with its leading `return ` marker stripped (outer parentheses are
/// tolerated); a method without a return type renders `-> ()`.
pub fn method_line(spec: &MethodSpec) -> Result<String> {
    let params: Vec<String> = spec
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, cast_type(&p.ty)))
        .collect();

    let returned = match &spec.returns {
        Some(_) => {
            let doc = spec
                .doc
                .as_deref()
                .map(str::trim)
                .filter(|doc| !doc.is_empty())
                .ok_or_else(|| MockError::MissingReturnDoc {
                    method: spec.name.clone(),
                })?;
            let fields = doc.strip_prefix("return ").unwrap_or(doc).trim();
            fields
                .strip_prefix('(')
                .and_then(|rest| rest.strip_suffix(')'))
                .unwrap_or(fields)
                .trim()
                .to_string()
        }
        None => String::new(),
    };

    Ok(format!(
        "method {name}({signature}) -> ({returned})",
        name = spec.name,
        signature = params.join(","),
        returned = returned
    ))
}

/// An ordered textual interface description: one header line naming the
/// interface, then one method line per listed method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescription {
    name: String,
    lines: Vec<String>,
}

impl InterfaceDescription {
    /// Build the description for `service` under the given interface
    /// name. A service that lists no methods yields the degenerate
    /// header-only description.
    pub fn build<S: ReflectableService + ?Sized>(name: &str, service: &S) -> Result<Self> {
        let mut lines = vec![format!("interface {name}")];
        for method in service.list_methods() {
            lines.push(method_line(&method)?);
        }
        Ok(InterfaceDescription {
            name: name.to_string(),
            lines,
        })
    }

    /// The interface name from the header line.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All lines, header first, in reflection order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The file content: lines newline-joined.
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

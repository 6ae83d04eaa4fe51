//! Rust source rendering of emitted declarations.

use std::collections::HashSet;

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use tracing::trace;
use wsbind_wsdl::{
    descriptions::Descriptions,
    types::{FieldKind, NamespacedName, TypeKind},
};

use crate::{
    emitter::{ClassDecl, CodeEmitter, DelegateDecl, EventDecl, FieldDecl, MethodDecl, Metadata},
    error::EmitError,
    identifiers::{make_valid, to_pascal_case},
    mapping::{SchemaTypeMapper, TypeMapper},
    options::GenerationStyle,
    parameters::ParameterDirection,
};

fn ident(name: &str) -> Ident {
    format_ident!("{}", make_valid(name))
}

fn doc_attributes<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<TokenStream> {
    lines
        .into_iter()
        .flat_map(str::lines)
        .map(|line| {
            let line = format!(" {}", line.trim());
            quote! { #[doc = #line] }
        })
        .collect()
}

fn metadata_lines(metadata: &[Metadata]) -> Vec<String> {
    metadata.iter().map(|metadata| format!("`{}`", metadata)).collect()
}

struct ModuleScope {
    name: String,
    docs: Vec<String>,
    items: Vec<TokenStream>,
}

struct ClassScope {
    decl: ClassDecl,
    docs: Vec<String>,
    methods: Vec<TokenStream>,
    fields: Vec<TokenStream>,
    events: Vec<TokenStream>,
    delegates: Vec<TokenStream>,
}

/// Renders classes as traits inside one module per namespace.
#[derive(Default)]
pub struct RustEmitter {
    docs: Vec<String>,
    items: Vec<TokenStream>,
    modules: Vec<ModuleScope>,
    class: Option<ClassScope>,
    has_types: bool,
    error: Option<EmitError>,
}

impl RustEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_type(&mut self, ty: &str) -> Option<syn::Type> {
        match syn::parse_str::<syn::Type>(ty) {
            Ok(parsed) => Some(parsed),
            Err(source) => {
                if self.error.is_none() {
                    self.error = Some(EmitError::InvalidType {
                        ty: ty.to_owned(),
                        source,
                    });
                }
                None
            }
        }
    }

    fn push_item(&mut self, item: TokenStream) {
        match self.modules.last_mut() {
            Some(module) => module.items.push(item),
            None => self.items.push(item),
        }
    }

    /// Adds a `types` module with one item per schema type.
    pub fn add_schema_types(&mut self, descriptions: &Descriptions) {
        let mapper = SchemaTypeMapper::new(descriptions);
        let mut seen = HashSet::new();
        let mut items = Vec::new();

        for definition in descriptions.iter() {
            for element in &definition.types.elements {
                if let Some(FieldKind::Inner(kind)) = &element.ty {
                    self.schema_item(&mapper, &element.name, kind, &mut seen, &mut items);
                }
            }

            for ty in &definition.types.types {
                self.schema_item(&mapper, &ty.name, &ty.kind, &mut seen, &mut items);
            }
        }

        self.items.push(quote! {
            pub mod types {
                #(#items)*
            }
        });
        self.has_types = true;
    }

    fn schema_item(
        &mut self,
        mapper: &SchemaTypeMapper<'_>,
        owner: &NamespacedName,
        kind: &TypeKind,
        seen: &mut HashSet<String>,
        items: &mut Vec<TokenStream>,
    ) {
        let type_name = to_pascal_case(&owner.name);
        if !seen.insert(type_name.clone()) {
            trace!(ty = %type_name, "type already generated");
            return;
        }
        let name = ident(&type_name);

        match kind {
            TypeKind::Struct(fields) => {
                for field in fields {
                    if let FieldKind::Inner(inner) = &field.ty {
                        let inner_name = NamespacedName::new(
                            owner.namespace.clone(),
                            format!("{}{}", owner.name, to_pascal_case(&field.name.name)),
                        );
                        self.schema_item(mapper, &inner_name, inner, seen, items);
                    }
                }

                let mut members = Vec::new();
                for member in mapper.struct_members(owner, fields) {
                    let member_name = ident(&member.member_name);
                    let xml_name = format!(" `{}`", member.xml_name);
                    if let Some(ty) = self.parse_type(&member.native_type) {
                        members.push(quote! {
                            #[doc = #xml_name]
                            pub #member_name: #ty,
                        });
                    }

                    if member.check_specified {
                        let specified = format_ident!("{}_specified", member_name);
                        members.push(quote! { pub #specified: bool, });
                    }
                }

                items.push(quote! {
                    #[derive(Debug, Clone, Default, PartialEq)]
                    pub struct #name {
                        #(#members)*
                    }
                });
            }

            TypeKind::Simple(base) => {
                if let Some(native) = mapper.map_type(base) {
                    if let Some(ty) = self.parse_type(&native.name) {
                        items.push(quote! { pub type #name = #ty; });
                    }
                }
            }

            TypeKind::Alias(alias) => {
                if alias != owner {
                    let alias = ident(&to_pascal_case(&alias.name));
                    items.push(quote! { pub type #name = #alias; });
                }
            }
        }
    }

    /// Formatted source of everything emitted so far.
    pub fn to_source(self) -> Result<String, EmitError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let docs = self
            .docs
            .iter()
            .map(|line| {
                let line = format!(" {}", line);
                quote! { #![doc = #line] }
            })
            .collect::<Vec<_>>();
        let items = self.items;

        let file = syn::parse2::<syn::File>(quote! {
            #(#docs)*
            #(#items)*
        })?;

        Ok(prettyplease::unparse(&file))
    }
}

impl CodeEmitter for RustEmitter {
    fn begin_namespace(&mut self, name: &str) {
        self.modules.push(ModuleScope {
            name: name.to_owned(),
            docs: Vec::new(),
            items: Vec::new(),
        });
    }

    fn end_namespace(&mut self) {
        let depth = self.modules.len();
        let module = match self.modules.pop() {
            Some(module) => module,
            None => return,
        };

        let name = ident(&module.name);
        let docs = module
            .docs
            .iter()
            .map(|line| {
                let line = format!(" {}", line);
                quote! { #![doc = #line] }
            })
            .collect::<Vec<_>>();
        let items = module.items;

        let uses = if self.has_types {
            let supers = (0..depth).map(|_| quote! { super:: });
            quote! {
                #[allow(unused_imports)]
                use #(#supers)* types::*;
            }
        } else {
            quote! {}
        };

        self.push_item(quote! {
            pub mod #name {
                #(#docs)*
                #uses
                #(#items)*
            }
        });
    }

    fn begin_class(&mut self, class: &ClassDecl) {
        self.class = Some(ClassScope {
            decl: class.clone(),
            docs: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            events: Vec::new(),
            delegates: Vec::new(),
        });
    }

    fn end_class(&mut self) {
        let class = match self.class.take() {
            Some(class) => class,
            None => return,
        };

        let decl = &class.decl;
        let name = ident(&decl.name);

        let mut lines = decl.docs.iter().cloned().collect::<Vec<_>>();
        lines.extend(metadata_lines(&decl.metadata));
        lines.extend(class.docs.iter().map(|comment| format!("Warning: {}", comment)));
        let docs = doc_attributes(lines.iter().map(String::as_str));

        let methods = &class.methods;
        let delegates = &class.delegates;

        let mut tokens = quote! {
            #(#delegates)*

            #(#docs)*
            pub trait #name {
                #(#methods)*
            }
        };

        if !class.fields.is_empty() {
            let headers = format_ident!("{}Headers", name);
            let fields = &class.fields;
            tokens.extend(quote! {
                #[derive(Debug, Clone, Default, PartialEq)]
                pub struct #headers {
                    #(#fields)*
                }
            });
        }

        if !class.events.is_empty() {
            let events_name = format_ident!("{}Events", name);
            let events = &class.events;
            tokens.extend(quote! {
                #[derive(Default)]
                pub struct #events_name {
                    #(#events)*
                }
            });
        }

        self.push_item(tokens);
    }

    fn add_method(&mut self, method: &MethodDecl) {
        let style = match &self.class {
            Some(class) => class.decl.style,
            None => return,
        };

        let name = ident(&method.name);
        let receiver = match style {
            GenerationStyle::Client => quote! { &mut self },
            GenerationStyle::Server => quote! { &self },
        };

        let mut parameters = Vec::new();
        for parameter in &method.parameters {
            let parameter_name = ident(&parameter.name);
            let ty = match self.parse_type(&parameter.ty) {
                Some(ty) => ty,
                None => return,
            };

            parameters.push(match parameter.direction {
                ParameterDirection::In => quote! { #parameter_name: #ty },
                ParameterDirection::Out | ParameterDirection::ByRef => quote! { #parameter_name: &mut #ty },
            });
        }

        let output = match &method.return_type {
            Some(ty) => match self.parse_type(ty) {
                Some(ty) => quote! { -> #ty },
                None => return,
            },
            None => quote! {},
        };

        let mut lines = method.docs.iter().cloned().collect::<Vec<_>>();
        lines.extend(metadata_lines(&method.metadata));
        let docs = doc_attributes(lines.iter().map(String::as_str));

        if let Some(class) = self.class.as_mut() {
            class.methods.push(quote! {
                #(#docs)*
                fn #name(#receiver, #(#parameters),*) #output;
            });
        }
    }

    fn add_field(&mut self, field: &FieldDecl) {
        let ty = match self.parse_type(&field.ty) {
            Some(ty) => ty,
            None => return,
        };

        let name = ident(&field.name);
        let lines = metadata_lines(&field.metadata);
        let docs = doc_attributes(lines.iter().map(String::as_str));

        if let Some(class) = self.class.as_mut() {
            class.fields.push(quote! {
                #(#docs)*
                pub #name: #ty,
            });
        }
    }

    fn add_event(&mut self, event: &EventDecl) {
        let name = ident(&event.name);
        let delegate = ident(&event.delegate);

        if let Some(class) = self.class.as_mut() {
            class.events.push(quote! {
                pub #name: Option<#delegate>,
            });
        }
    }

    fn add_delegate(&mut self, delegate: &DelegateDecl) {
        let mut types = Vec::new();
        for parameter in &delegate.parameters {
            match self.parse_type(&parameter.ty) {
                Some(ty) => types.push(ty),
                None => return,
            }
        }

        let name = ident(&delegate.name);
        if let Some(class) = self.class.as_mut() {
            class.delegates.push(quote! {
                pub type #name = Box<dyn FnMut(#(#types),*)>;
            });
        }
    }

    fn add_comment(&mut self, comment: &str) {
        if let Some(class) = self.class.as_mut() {
            class.docs.push(comment.to_owned());
        } else if let Some(module) = self.modules.last_mut() {
            module.docs.push(comment.to_owned());
        } else {
            self.docs.push(comment.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::ParamDecl;

    fn class() -> ClassDecl {
        ClassDecl {
            name: "StockQuoteSoap".into(),
            style: GenerationStyle::Client,
            docs: Some("Quotes.".into()),
            metadata: Vec::new(),
        }
    }

    #[test]
    fn renders_trait_with_mutable_out_parameters() {
        let mut emitter = RustEmitter::new();
        emitter.begin_namespace("services");
        emitter.begin_class(&class());
        emitter.add_field(&FieldDecl {
            name: "session".into(),
            ty: "Option<String>".into(),
            metadata: Vec::new(),
        });
        emitter.add_method(&MethodDecl {
            name: "get_quote".into(),
            parameters: vec![
                ParamDecl {
                    name: "symbol".into(),
                    ty: "String".into(),
                    direction: ParameterDirection::In,
                },
                ParamDecl {
                    name: "count".into(),
                    ty: "i32".into(),
                    direction: ParameterDirection::ByRef,
                },
            ],
            return_type: Some("f64".into()),
            docs: None,
            metadata: Vec::new(),
        });
        emitter.add_comment("optional extension ignored");
        emitter.end_class();
        emitter.end_namespace();

        let source = emitter.to_source().expect("source");
        assert!(source.contains("pub mod services"));
        assert!(source.contains("pub trait StockQuoteSoap"));
        assert!(source.contains("fn get_quote(&mut self, symbol: String, count: &mut i32) -> f64;"));
        assert!(source.contains("pub struct StockQuoteSoapHeaders"));
        assert!(source.contains("Warning: optional extension ignored"));
    }

    #[test]
    fn invalid_type_is_reported() {
        let mut emitter = RustEmitter::new();
        emitter.begin_class(&class());
        emitter.add_field(&FieldDecl {
            name: "broken".into(),
            ty: "Vec<".into(),
            metadata: Vec::new(),
        });
        emitter.end_class();

        assert!(matches!(
            emitter.to_source(),
            Err(EmitError::InvalidType { ty, .. }) if ty == "Vec<"
        ));
    }
}

//! The import driver: walks bindings and hands each bound operation to a
//! protocol importer.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, error, info, trace};
use wsbind_wsdl::{
    descriptions::Descriptions,
    extensions::Extension,
    types::{Binding, Definition, NamespacedName, Operation, OperationBinding, Port, PortType},
};

use crate::{
    diagnostics::{Diagnostics, Warning, Warnings},
    emitter::{ClassDecl, CodeEmitter, DelegateDecl, EventDecl, MethodDecl, ParamDecl, RecordingEmitter},
    error::ImportError,
    identifiers::{to_pascal_case, Identifiers},
    mapping::TypeMapper,
    options::ImportOptions,
    parameters::ParameterDirection,
    protocol::{
        self, BoundOperation, ClassState, ImportContext, ImportedMethod, MethodOutcome, ProtocolImporter,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Idle,
    DescriptionScan,
    BindingSelected,
    ClassOpen,
    OperationLoop,
    ClassClose,
    NamespaceClose,
}

/// Stable identity of an imported operation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId {
    pub binding: NamespacedName,
    pub operation: String,
    pub input: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub warnings: Warnings,
    pub messages: Vec<Warning>,
    pub classes: Vec<String>,
    pub methods: BTreeMap<OperationId, ImportedMethod>,
}

impl ImportReport {
    /// First method imported for `operation` of the binding named `binding`.
    pub fn find_method(&self, binding: &str, operation: &str) -> Option<&ImportedMethod> {
        self.methods
            .iter()
            .find(|(id, _)| id.binding.name == binding && id.operation == operation)
            .map(|(_, method)| method)
    }
}

struct Candidate<'a> {
    definition: &'a Definition,
    binding: &'a Binding,
    port: Option<&'a Port>,
}

struct BindingImport {
    buffer: RecordingEmitter,
    diagnostics: Diagnostics,
    methods: Vec<(OperationId, ImportedMethod)>,
}

fn match_operation<'p>(
    port_type: &'p PortType,
    port_type_name: &NamespacedName,
    binding: &OperationBinding,
) -> Result<(usize, &'p Operation), ImportError> {
    let named = port_type
        .operations
        .iter()
        .enumerate()
        .filter(|(_, operation)| operation.name == binding.name)
        .collect::<Vec<_>>();

    let bound = named
        .iter()
        .copied()
        .filter(|(_, operation)| operation.is_bound_by(binding))
        .collect::<Vec<_>>();

    match bound.as_slice() {
        [single] => Ok(*single),

        [] => match named.first() {
            Some((_, operation)) if operation.input().is_some() && binding.input.is_none() => {
                Err(ImportError::MissingMessageBinding {
                    operation: binding.name.clone(),
                    kind: "input",
                })
            }

            Some((_, operation)) if operation.output().is_some() && binding.output.is_none() => {
                Err(ImportError::MissingMessageBinding {
                    operation: binding.name.clone(),
                    kind: "output",
                })
            }

            _ => Err(ImportError::MissingPortTypeOperation {
                operation: binding.name.clone(),
                port_type: port_type_name.clone(),
            }),
        },

        _ => Err(ImportError::DuplicateOperationBinding {
            operation: binding.name.clone(),
            port_type: port_type_name.clone(),
        }),
    }
}

fn report_unhandled(
    binding: &Binding,
    imported: &[&OperationBinding],
    diagnostics: &mut Diagnostics,
    buffer: &mut RecordingEmitter,
) {
    let mut unhandled: Vec<&Extension> = binding.extensions.unhandled().collect();

    for operation in imported {
        unhandled.extend(operation.extensions.unhandled());
        for message in operation.message_bindings() {
            unhandled.extend(message.extensions.unhandled());
        }
    }

    for extension in unhandled {
        let (flag, kind) = if extension.required {
            (Warnings::REQUIRED_EXTENSIONS_IGNORED, "required")
        } else {
            (Warnings::OPTIONAL_EXTENSIONS_IGNORED, "optional")
        };

        let message = format!(
            "{} extension '{}' in binding '{}' was ignored",
            kind,
            extension.kind.element_name(),
            binding.name
        );
        buffer.add_comment(&message);
        diagnostics.warn(flag, message);
    }
}

fn add_async(buffer: &mut RecordingEmitter, class: &mut ClassState, method: &MethodDecl) {
    let delegate = class
        .members
        .add_unique(&format!("{}CompletedHandler", to_pascal_case(&method.name)), ());

    let mut scope = Identifiers::new();
    let mut parameters = Vec::new();

    if let Some(ty) = &method.return_type {
        parameters.push(ParamDecl {
            name: scope.add_unique("result", ()),
            ty: ty.clone(),
            direction: ParameterDirection::In,
        });
    }

    for parameter in &method.parameters {
        if parameter.direction != ParameterDirection::In {
            parameters.push(ParamDecl {
                name: scope.add_unique(&parameter.name, ()),
                ty: parameter.ty.clone(),
                direction: ParameterDirection::In,
            });
        }
    }

    buffer.add_delegate(&DelegateDecl {
        name: delegate.clone(),
        parameters,
    });

    let event = class
        .members
        .add_unique(&format!("{}_completed", method.name), ());
    buffer.add_event(&EventDecl { name: event, delegate });
}

pub struct ImportDriver<'a> {
    descriptions: &'a Descriptions,
    mapper: &'a dyn TypeMapper,
    options: &'a ImportOptions,
    state: DriverState,
    classes: Identifiers,
    diagnostics: Diagnostics,
    report: ImportReport,
}

impl<'a> ImportDriver<'a> {
    pub fn new(descriptions: &'a Descriptions, mapper: &'a dyn TypeMapper, options: &'a ImportOptions) -> Self {
        Self {
            descriptions,
            mapper,
            options,
            state: DriverState::Idle,
            classes: Identifiers::new(),
            diagnostics: Diagnostics::default(),
            report: ImportReport::default(),
        }
    }

    fn transition(&mut self, next: DriverState) {
        trace!(from = ?self.state, to = ?next, "import driver");
        self.state = next;
    }

    /// Bindings reachable from service ports, each once; every binding when
    /// no port leads anywhere.
    fn scan(&self) -> Vec<Candidate<'a>> {
        let descriptions = self.descriptions;
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for definition in descriptions.iter() {
            for service in &definition.services {
                for port in &service.ports {
                    match descriptions.find_binding_with_definition(&port.binding) {
                        Some((definition, binding)) => {
                            if seen.insert(definition.qualify(binding.name.clone())) {
                                candidates.push(Candidate {
                                    definition,
                                    binding,
                                    port: Some(port),
                                });
                            }
                        }
                        None => debug!(port = %port.name, binding = %port.binding, "port references a missing binding"),
                    }
                }
            }
        }

        if candidates.is_empty() {
            for (definition, binding) in descriptions.bindings() {
                if seen.insert(definition.qualify(binding.name.clone())) {
                    candidates.push(Candidate {
                        definition,
                        binding,
                        port: None,
                    });
                }
            }
        }

        candidates
    }

    fn import_binding(
        &mut self,
        importer: &dyn ProtocolImporter,
        candidate: &Candidate<'a>,
        class_name: &str,
    ) -> Result<BindingImport, ImportError> {
        let descriptions = self.descriptions;
        let binding = candidate.binding;
        let binding_name = candidate.definition.qualify(binding.name.clone());
        let port_type = descriptions.port_type(&binding.ty)?;

        let mut buffer = RecordingEmitter::new();
        let mut diagnostics = Diagnostics::default();
        let mut class = ClassState::default();
        let mut methods = Vec::new();

        self.transition(DriverState::ClassOpen);
        buffer.begin_class(&ClassDecl {
            name: class_name.to_owned(),
            style: self.options.style,
            docs: binding.docs.text.clone().or_else(|| port_type.docs.text.clone()),
            metadata: importer.class_metadata(candidate.definition, binding, candidate.port),
        });

        self.transition(DriverState::OperationLoop);
        let mut bound_operations = HashSet::new();
        let mut imported = Vec::new();

        for operation_binding in &binding.operations {
            let (index, operation) = match_operation(port_type, &binding.ty, operation_binding)?;
            if !bound_operations.insert(index) {
                return Err(ImportError::OperationBoundTwice {
                    operation: operation.name.clone(),
                    port_type: binding.ty.clone(),
                });
            }

            let flow = operation.flow();
            if !importer.supports_flow(flow) {
                let message = format!(
                    "operation '{}' has a {} flow, which {} does not support",
                    operation.name,
                    flow,
                    importer.protocol_name()
                );
                buffer.add_comment(&message);
                diagnostics.warn(Warnings::UNSUPPORTED_OPERATIONS_IGNORED, message);
                continue;
            }

            let bound = BoundOperation {
                operation,
                binding: operation_binding,
                port_type: &binding.ty,
            };

            let mut context = ImportContext {
                descriptions,
                mapper: self.mapper,
                options: self.options,
                definition: candidate.definition,
                binding,
                class: &mut class,
                diagnostics: &mut diagnostics,
            };

            match importer.import_method(&mut context, &bound)? {
                MethodOutcome::Imported(import) => {
                    for field in &import.fields {
                        buffer.add_field(field);
                    }
                    buffer.add_method(&import.method);

                    if self.options.generate_async {
                        add_async(&mut buffer, &mut class, &import.method);
                    }

                    imported.push(operation_binding);
                    methods.push((
                        OperationId {
                            binding: binding_name.clone(),
                            operation: operation.name.clone(),
                            input: operation_binding.input.as_ref().and_then(|input| input.name.clone()),
                        },
                        import.record,
                    ));
                }

                MethodOutcome::Unsupported(reason) => {
                    let message = format!("operation '{}' was skipped: {}", operation.name, reason);
                    buffer.add_comment(&message);
                    diagnostics.warn(Warnings::UNSUPPORTED_OPERATIONS_IGNORED, message);
                }
            }
        }

        report_unhandled(binding, &imported, &mut diagnostics, &mut buffer);

        self.transition(DriverState::ClassClose);
        if methods.is_empty() {
            let message = format!("no methods were generated for binding '{}'", binding.name);
            buffer.add_comment(&message);
            diagnostics.warn(Warnings::NO_METHODS_GENERATED, message);
        }
        buffer.end_class();

        Ok(BindingImport {
            buffer,
            diagnostics,
            methods,
        })
    }

    pub fn run(mut self, emitter: &mut dyn CodeEmitter) -> Result<ImportReport, ImportError> {
        self.transition(DriverState::DescriptionScan);

        let importers = match &self.options.protocol {
            Some(name) => vec![protocol::importer(name)?],
            None => protocol::importers(),
        };

        self.descriptions.reset_handled();

        for name in &self.options.reserved_names {
            self.classes.add_reserved(name);
        }
        for name in self.mapper.type_names() {
            self.classes.add_reserved(&name);
        }

        let candidates = self.scan();
        debug!(bindings = candidates.len(), "scanned descriptions");

        emitter.begin_namespace(&self.options.module);

        for candidate in &candidates {
            self.transition(DriverState::BindingSelected);
            let binding = candidate.binding;

            let importer = match importers
                .iter()
                .find(|importer| importer.is_binding_supported(binding))
            {
                Some(importer) => importer.as_ref(),
                None => {
                    let protocols = importers
                        .iter()
                        .map(|importer| importer.protocol_name())
                        .collect::<Vec<_>>();
                    let message = format!(
                        "binding '{}' is not supported by {}",
                        binding.name,
                        protocols.join(", ")
                    );
                    emitter.add_comment(&message);
                    self.diagnostics.warn(Warnings::UNSUPPORTED_BINDINGS_IGNORED, message);
                    continue;
                }
            };

            let candidate_name = to_pascal_case(candidate.port.map_or(&binding.name, |port| &port.name));
            let class_name = self.classes.make_unique(&candidate_name);

            match self.import_binding(importer, candidate, &class_name) {
                Ok(imported) => {
                    self.classes.add_unique(&candidate_name, ());
                    imported.buffer.replay(emitter);

                    info!(
                        binding = %binding.name,
                        class = %class_name,
                        protocol = importer.protocol_name(),
                        methods = imported.methods.len(),
                        "imported binding"
                    );

                    self.diagnostics.append(imported.diagnostics);
                    self.report.classes.push(class_name);
                    self.report.methods.extend(imported.methods);
                }

                Err(import_error) => {
                    error!(binding = %binding.name, error = %import_error, "unable to import binding");

                    let message = format!("unable to import binding '{}': {}", binding.name, import_error);
                    emitter.add_comment(&message);
                    self.diagnostics.warn(Warnings::UNSUPPORTED_BINDINGS_IGNORED, message);
                }
            }
        }

        self.transition(DriverState::NamespaceClose);
        if self.report.classes.is_empty() {
            self.diagnostics
                .warn(Warnings::NO_CODE_GENERATED, "no code was generated");
        }
        emitter.end_namespace();

        self.transition(DriverState::Idle);

        let ImportDriver {
            diagnostics,
            mut report,
            ..
        } = self;
        let (warnings, messages) = diagnostics.into_parts();
        report.warnings = warnings;
        report.messages = messages;

        Ok(report)
    }
}

/// Imports every usable binding in `descriptions` into `emitter`.
pub fn import(
    descriptions: &Descriptions,
    mapper: &dyn TypeMapper,
    options: &ImportOptions,
    emitter: &mut dyn CodeEmitter,
) -> Result<ImportReport, ImportError> {
    ImportDriver::new(descriptions, mapper, options).run(emitter)
}

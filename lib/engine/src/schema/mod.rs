pub mod directives;
pub mod introspection;
pub mod registry;
pub mod scalars;
pub mod types;

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::ast::OperationKind;
use crate::schema::directives::DirectiveDefinition;
use crate::schema::registry::{RegistryInput, TypeRegistry};
use crate::schema::types::NamedType;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Type \"{0}\" is defined more than once with different definitions")]
    DuplicateTypeName(String),
    #[error("Unknown type \"{name}\" referenced by \"{referenced_by}\"")]
    UnknownType { name: String, referenced_by: String },
    #[error("Type \"{0}\" references itself while it is being registered")]
    CyclicTypeReference(String),
    #[error("The {operation} root type must be an object type, \"{name}\" is not")]
    InvalidRootType {
        operation: OperationKind,
        name: String,
    },
    #[error("\"{implementor}\" cannot implement \"{interface}\", which is not an interface type")]
    InvalidInterface {
        implementor: String,
        interface: String,
    },
    #[error("Union \"{union}\" can only include object types, \"{member}\" is not one")]
    InvalidUnionMember { union: String, member: String },
    #[error("Invalid type for \"{coordinate}\": {reason}")]
    InvalidFieldType { coordinate: String, reason: String },
    #[error("Directive \"@{0}\" is defined more than once")]
    DuplicateDirective(String),
}

/// A schema as assembled by the application. Nothing is resolved until [`Schema::initialize`]
/// is called, which happens at most once; later calls return the same registry (or error).
pub struct Schema {
    query: NamedType,
    mutation: Option<NamedType>,
    subscription: Option<NamedType>,
    types: Vec<NamedType>,
    directives: Vec<DirectiveDefinition>,
    registry: OnceCell<Result<Arc<TypeRegistry>, SchemaError>>,
}

impl Schema {
    pub fn build(query: impl Into<NamedType>) -> SchemaBuilder {
        SchemaBuilder {
            query: query.into(),
            mutation: None,
            subscription: None,
            types: Vec::new(),
            directives: Vec::new(),
        }
    }

    pub fn initialize(&self) -> Result<Arc<TypeRegistry>, SchemaError> {
        self.registry
            .get_or_init(|| {
                TypeRegistry::build(RegistryInput {
                    query: self.query.clone(),
                    mutation: self.mutation.clone(),
                    subscription: self.subscription.clone(),
                    types: self.types.clone(),
                    directives: self.directives.clone(),
                })
                .map(Arc::new)
            })
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.registry.get().is_some()
    }
}

pub struct SchemaBuilder {
    query: NamedType,
    mutation: Option<NamedType>,
    subscription: Option<NamedType>,
    types: Vec<NamedType>,
    directives: Vec<DirectiveDefinition>,
}

impl SchemaBuilder {
    pub fn mutation(mut self, mutation: impl Into<NamedType>) -> Self {
        self.mutation = Some(mutation.into());
        self
    }

    pub fn subscription(mut self, subscription: impl Into<NamedType>) -> Self {
        self.subscription = Some(subscription.into());
        self
    }

    /// Registers a type that is not reachable from the roots, such as an implementation of an
    /// interface that is only ever returned through the interface.
    pub fn register(mut self, ty: impl Into<NamedType>) -> Self {
        self.types.push(ty.into());
        self
    }

    pub fn directive(mut self, directive: DirectiveDefinition) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn finish(self) -> Schema {
        Schema {
            query: self.query,
            mutation: self.mutation,
            subscription: self.subscription,
            types: self.types,
            directives: self.directives,
            registry: OnceCell::new(),
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, instrument};

use crate::ast::OperationKind;
use crate::schema::directives::{builtin_directives, DirectiveDefinition};
use crate::schema::introspection::{self, SCHEMA_FIELD, TYPENAME_FIELD, TYPE_FIELD};
use crate::schema::scalars::builtin_scalars;
use crate::schema::types::{FieldDefinition, NamedType, ObjectType, TypeRef};
use crate::schema::SchemaError;

/// The resolved, immutable view of a schema: every reachable type by name, the root operation
/// types, directives and the possible concrete types of every abstract type.
pub struct TypeRegistry {
    types: IndexMap<String, NamedType>,
    query_type: Arc<ObjectType>,
    mutation_type: Option<Arc<ObjectType>>,
    subscription_type: Option<Arc<ObjectType>>,
    directives: IndexMap<String, DirectiveDefinition>,
    possible_types: HashMap<String, IndexSet<String>>,
}

pub(crate) struct RegistryInput {
    pub query: NamedType,
    pub mutation: Option<NamedType>,
    pub subscription: Option<NamedType>,
    pub types: Vec<NamedType>,
    pub directives: Vec<DirectiveDefinition>,
}

impl TypeRegistry {
    #[instrument(level = "debug", skip_all, fields(query = %input.query.name()))]
    pub(crate) fn build(input: RegistryInput) -> Result<TypeRegistry, SchemaError> {
        let mut builder = RegistryBuilder::default();

        for scalar in builtin_scalars() {
            builder.register(scalar)?;
        }
        for meta in introspection::meta_types() {
            builder.register(meta)?;
        }

        builder.register(&input.query)?;
        if let Some(mutation) = &input.mutation {
            builder.register(mutation)?;
        }
        if let Some(subscription) = &input.subscription {
            builder.register(subscription)?;
        }
        for ty in &input.types {
            builder.register(ty)?;
        }

        let mut directives = IndexMap::new();
        for directive in builtin_directives().into_iter().chain(input.directives) {
            if directives.contains_key(&directive.name) {
                return Err(SchemaError::DuplicateDirective(directive.name));
            }
            for argument in directive.arguments.values() {
                builder.visit_ref(&argument.ty, &format!("@{}", directive.name))?;
            }
            directives.insert(directive.name.clone(), directive);
        }

        builder.resolve_placeholders()?;

        let types = builder.types;
        check_type_references(&types)?;

        let query_type = root_object(&input.query, OperationKind::Query)?;
        let mutation_type = input
            .mutation
            .as_ref()
            .map(|ty| root_object(ty, OperationKind::Mutation))
            .transpose()?;
        let subscription_type = input
            .subscription
            .as_ref()
            .map(|ty| root_object(ty, OperationKind::Subscription))
            .transpose()?;

        let possible_types = compute_possible_types(&types);

        debug!(
            types = types.len(),
            directives = directives.len(),
            "schema type registry initialized"
        );

        Ok(TypeRegistry {
            types,
            query_type,
            mutation_type,
            subscription_type,
            directives,
            possible_types,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    /// The named type at the bottom of a type reference.
    pub fn resolve(&self, ty: &TypeRef) -> Option<&NamedType> {
        self.types.get(ty.type_name())
    }

    pub fn types(&self) -> impl Iterator<Item = &NamedType> {
        self.types.values()
    }

    pub fn object(&self, name: &str) -> Option<&Arc<ObjectType>> {
        self.lookup(name).and_then(NamedType::as_object)
    }

    pub fn query_type(&self) -> &Arc<ObjectType> {
        &self.query_type
    }

    pub fn mutation_type(&self) -> Option<&Arc<ObjectType>> {
        self.mutation_type.as_ref()
    }

    pub fn subscription_type(&self) -> Option<&Arc<ObjectType>> {
        self.subscription_type.as_ref()
    }

    pub fn root_type(&self, kind: OperationKind) -> Option<&Arc<ObjectType>> {
        match kind {
            OperationKind::Query => Some(&self.query_type),
            OperationKind::Mutation => self.mutation_type.as_ref(),
            OperationKind::Subscription => self.subscription_type.as_ref(),
        }
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives.get(name)
    }

    pub fn directives(&self) -> impl Iterator<Item = &DirectiveDefinition> {
        self.directives.values()
    }

    /// Field lookup on a composite type, including the `__typename`, `__schema` and `__type`
    /// meta fields.
    pub fn field_definition<'a>(
        &'a self,
        parent: &'a NamedType,
        name: &str,
    ) -> Option<&'a FieldDefinition> {
        match name {
            "__typename" if parent.is_composite() => Some(&*TYPENAME_FIELD),
            "__schema" if self.is_query_type(parent) => Some(&*SCHEMA_FIELD),
            "__type" if self.is_query_type(parent) => Some(&*TYPE_FIELD),
            _ => parent.field(name),
        }
    }

    fn is_query_type(&self, ty: &NamedType) -> bool {
        ty.name() == self.query_type.name
    }

    /// Concrete object types an abstract type can be at runtime, in registration order.
    pub fn possible_types(&self, abstract_type: &str) -> impl Iterator<Item = &str> {
        self.possible_types
            .get(abstract_type)
            .into_iter()
            .flat_map(|types| types.iter().map(String::as_str))
    }

    pub fn is_possible_type(&self, abstract_type: &NamedType, object_type: &str) -> bool {
        self.possible_types
            .get(abstract_type.name())
            .is_some_and(|types| types.contains(object_type))
    }

    /// Whether some object type could satisfy both composite types.
    pub fn do_types_overlap(&self, a: &NamedType, b: &NamedType) -> bool {
        if a.name() == b.name() {
            return true;
        }

        match (a.is_abstract(), b.is_abstract()) {
            (true, true) => self
                .possible_types(a.name())
                .any(|object| self.is_possible_type(b, object)),
            (true, false) => self.is_possible_type(a, b.name()),
            (false, true) => self.is_possible_type(b, a.name()),
            (false, false) => false,
        }
    }

    pub fn is_input_type(&self, ty: &TypeRef) -> bool {
        self.resolve(ty).is_some_and(NamedType::is_input)
    }

    pub fn is_output_type(&self, ty: &TypeRef) -> bool {
        self.resolve(ty).is_some_and(NamedType::is_output)
    }

    pub fn is_leaf_type(&self, ty: &TypeRef) -> bool {
        self.resolve(ty).is_some_and(NamedType::is_leaf)
    }

    /// Whether a value of type `maybe_sub` can always be used where `super_type` is expected.
    pub fn is_sub_type(&self, maybe_sub: &TypeRef, super_type: &TypeRef) -> bool {
        match (maybe_sub, super_type) {
            (TypeRef::NonNull(sub), TypeRef::NonNull(sup)) => self.is_sub_type(sub, sup),
            (TypeRef::NonNull(sub), sup) => self.is_sub_type(sub, sup),
            (_, TypeRef::NonNull(_)) => false,
            (TypeRef::List(sub), TypeRef::List(sup)) => self.is_sub_type(sub, sup),
            (TypeRef::List(_), _) | (_, TypeRef::List(_)) => false,
            (sub, sup) => {
                if sub.type_name() == sup.type_name() {
                    return true;
                }
                match (self.resolve(sup), self.resolve(sub)) {
                    (Some(sup), Some(sub)) if sup.is_abstract() => {
                        self.is_possible_type(sup, sub.name())
                    }
                    _ => false,
                }
            }
        }
    }
}

#[derive(Default)]
struct RegistryBuilder {
    types: IndexMap<String, NamedType>,
    registering: Vec<usize>,
    placeholders: Vec<(String, String)>,
}

impl RegistryBuilder {
    fn register(&mut self, ty: &NamedType) -> Result<(), SchemaError> {
        if let Some(existing) = self.types.get(ty.name()) {
            if !existing.same_instance(ty) {
                return Err(SchemaError::DuplicateTypeName(ty.name().to_string()));
            }
            if self.registering.contains(&ty.identity()) {
                return Err(SchemaError::CyclicTypeReference(ty.name().to_string()));
            }
            return Ok(());
        }

        self.types.insert(ty.name().to_string(), ty.clone());
        self.registering.push(ty.identity());
        let result = self.visit_children(ty);
        self.registering.pop();
        result
    }

    fn visit_children(&mut self, ty: &NamedType) -> Result<(), SchemaError> {
        let owner = ty.name();
        match ty {
            NamedType::Object(object) => {
                for interface in &object.interfaces {
                    self.visit_ref(interface, owner)?;
                }
                self.visit_fields(owner, object.fields.values())
            }
            NamedType::Interface(interface) => {
                for parent in &interface.interfaces {
                    self.visit_ref(parent, owner)?;
                }
                self.visit_fields(owner, interface.fields.values())
            }
            NamedType::Union(union) => {
                for member in &union.members {
                    self.visit_ref(member, owner)?;
                }
                Ok(())
            }
            NamedType::InputObject(input) => {
                for field in input.fields.values() {
                    self.visit_ref(&field.ty, &format!("{}.{}", owner, field.name))?;
                }
                Ok(())
            }
            NamedType::Scalar(_) | NamedType::Enum(_) => Ok(()),
        }
    }

    fn visit_fields<'f>(
        &mut self,
        owner: &str,
        fields: impl Iterator<Item = &'f FieldDefinition>,
    ) -> Result<(), SchemaError> {
        for field in fields {
            let coordinate = format!("{}.{}", owner, field.name);
            self.visit_ref(&field.ty, &coordinate)?;
            for argument in field.arguments.values() {
                self.visit_ref(&argument.ty, &format!("{}({}:)", coordinate, argument.name))?;
            }
        }
        Ok(())
    }

    fn visit_ref(&mut self, ty: &TypeRef, referenced_by: &str) -> Result<(), SchemaError> {
        match ty {
            TypeRef::Named(name) => {
                self.placeholders
                    .push((name.clone(), referenced_by.to_string()));
                Ok(())
            }
            TypeRef::Def(named) => self.register(named),
            TypeRef::Lazy(lazy) => self.register(lazy.get()),
            TypeRef::List(inner) | TypeRef::NonNull(inner) => self.visit_ref(inner, referenced_by),
        }
    }

    fn resolve_placeholders(&self) -> Result<(), SchemaError> {
        for (name, referenced_by) in &self.placeholders {
            if !self.types.contains_key(name) {
                return Err(SchemaError::UnknownType {
                    name: name.clone(),
                    referenced_by: referenced_by.clone(),
                });
            }
        }
        Ok(())
    }
}

fn root_object(ty: &NamedType, operation: OperationKind) -> Result<Arc<ObjectType>, SchemaError> {
    ty.as_object()
        .cloned()
        .ok_or_else(|| SchemaError::InvalidRootType {
            operation,
            name: ty.name().to_string(),
        })
}

fn check_type_references(types: &IndexMap<String, NamedType>) -> Result<(), SchemaError> {
    let resolve = |ty: &TypeRef| types.get(ty.type_name());

    for ty in types.values() {
        let (fields, interfaces) = match ty {
            NamedType::Object(object) => (&object.fields, &object.interfaces),
            NamedType::Interface(interface) => (&interface.fields, &interface.interfaces),
            NamedType::Union(union) => {
                for member in &union.members {
                    if !matches!(resolve(member), Some(NamedType::Object(_))) {
                        return Err(SchemaError::InvalidUnionMember {
                            union: union.name.clone(),
                            member: member.type_name().to_string(),
                        });
                    }
                }
                continue;
            }
            NamedType::InputObject(input) => {
                for field in input.fields.values() {
                    if !resolve(&field.ty).is_some_and(NamedType::is_input) {
                        return Err(SchemaError::InvalidFieldType {
                            coordinate: format!("{}.{}", input.name, field.name),
                            reason: format!("\"{}\" is not an input type", field.ty),
                        });
                    }
                }
                continue;
            }
            NamedType::Scalar(_) | NamedType::Enum(_) => continue,
        };

        for interface in interfaces {
            if !matches!(resolve(interface), Some(NamedType::Interface(_))) {
                return Err(SchemaError::InvalidInterface {
                    implementor: ty.name().to_string(),
                    interface: interface.type_name().to_string(),
                });
            }
        }

        for field in fields.values() {
            let coordinate = format!("{}.{}", ty.name(), field.name);
            if !resolve(&field.ty).is_some_and(NamedType::is_output) {
                return Err(SchemaError::InvalidFieldType {
                    coordinate,
                    reason: format!("\"{}\" is not an output type", field.ty),
                });
            }
            for argument in field.arguments.values() {
                if !resolve(&argument.ty).is_some_and(NamedType::is_input) {
                    return Err(SchemaError::InvalidFieldType {
                        coordinate: format!("{}({}:)", coordinate, argument.name),
                        reason: format!("\"{}\" is not an input type", argument.ty),
                    });
                }
            }
        }
    }

    Ok(())
}

fn compute_possible_types(types: &IndexMap<String, NamedType>) -> HashMap<String, IndexSet<String>> {
    let mut possible_types: HashMap<String, IndexSet<String>> = HashMap::new();

    for ty in types.values() {
        match ty {
            NamedType::Object(object) => {
                for interface in &object.interfaces {
                    possible_types
                        .entry(interface.type_name().to_string())
                        .or_default()
                        .insert(object.name.clone());
                }
            }
            NamedType::Union(union) => {
                let members = possible_types.entry(union.name.clone()).or_default();
                for member in &union.members {
                    members.insert(member.type_name().to_string());
                }
            }
            _ => {}
        }
    }

    possible_types
}

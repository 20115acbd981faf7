use lazy_static::lazy_static;
use serde_json::{Map, Value};

use crate::ast::query::Field;
use crate::coercion::value_from_ast::value_from_ast;
use crate::execution::collect::collect_fields;
use crate::execution::context::ExecutionContext;
use crate::schema::directives::{DirectiveDefinition, DirectiveLocation};
use crate::schema::types::{
    EnumType, EnumValueDefinition, FieldDefinition, InputValueDefinition, NamedType, ObjectType,
    TypeKind, TypeRef,
};

lazy_static! {
    pub static ref TYPENAME_FIELD: FieldDefinition = FieldDefinition::new(
        "__typename",
        TypeRef::named_nn("String")
    )
    .description("The name of the current Object type at runtime.");
    pub static ref SCHEMA_FIELD: FieldDefinition =
        FieldDefinition::new("__schema", TypeRef::named_nn("__Schema"))
            .description("Access the current type schema of this server.");
    pub static ref TYPE_FIELD: FieldDefinition =
        FieldDefinition::new("__type", TypeRef::named("__Type"))
            .description("Request the type information of a single type.")
            .argument(InputValueDefinition::new("name", TypeRef::named_nn("String")));
    static ref META_TYPES: Vec<NamedType> = build_meta_types();
}

pub(crate) fn meta_types() -> &'static [NamedType] {
    &META_TYPES
}

pub fn is_meta_type(name: &str) -> bool {
    name.starts_with("__")
}

fn include_deprecated() -> InputValueDefinition {
    InputValueDefinition::new("includeDeprecated", TypeRef::named("Boolean")).default_value(false)
}

fn build_meta_types() -> Vec<NamedType> {
    let schema = ObjectType::new("__Schema")
        .description("A GraphQL Schema defines the capabilities of a GraphQL server. It exposes all available types and directives on the server, as well as the entry points for query, mutation, and subscription operations.")
        .field(FieldDefinition::new("description", "String"))
        .field(FieldDefinition::new("types", TypeRef::named_nn_list_nn("__Type")))
        .field(FieldDefinition::new("queryType", TypeRef::named_nn("__Type")))
        .field(FieldDefinition::new("mutationType", "__Type"))
        .field(FieldDefinition::new("subscriptionType", "__Type"))
        .field(FieldDefinition::new("directives", TypeRef::named_nn_list_nn("__Directive")));

    let ty = ObjectType::new("__Type")
        .field(FieldDefinition::new("kind", TypeRef::named_nn("__TypeKind")))
        .field(FieldDefinition::new("name", "String"))
        .field(FieldDefinition::new("description", "String"))
        .field(FieldDefinition::new("specifiedByURL", "String"))
        .field(
            FieldDefinition::new("fields", TypeRef::named_nn("__Field").list())
                .argument(include_deprecated()),
        )
        .field(FieldDefinition::new("interfaces", TypeRef::named_nn("__Type").list()))
        .field(FieldDefinition::new("possibleTypes", TypeRef::named_nn("__Type").list()))
        .field(
            FieldDefinition::new("enumValues", TypeRef::named_nn("__EnumValue").list())
                .argument(include_deprecated()),
        )
        .field(
            FieldDefinition::new("inputFields", TypeRef::named_nn("__InputValue").list())
                .argument(include_deprecated()),
        )
        .field(FieldDefinition::new("ofType", "__Type"));

    let field = ObjectType::new("__Field")
        .field(FieldDefinition::new("name", TypeRef::named_nn("String")))
        .field(FieldDefinition::new("description", "String"))
        .field(
            FieldDefinition::new("args", TypeRef::named_nn_list_nn("__InputValue"))
                .argument(include_deprecated()),
        )
        .field(FieldDefinition::new("type", TypeRef::named_nn("__Type")))
        .field(FieldDefinition::new("isDeprecated", TypeRef::named_nn("Boolean")))
        .field(FieldDefinition::new("deprecationReason", "String"));

    let input_value = ObjectType::new("__InputValue")
        .field(FieldDefinition::new("name", TypeRef::named_nn("String")))
        .field(FieldDefinition::new("description", "String"))
        .field(FieldDefinition::new("type", TypeRef::named_nn("__Type")))
        .field(FieldDefinition::new("defaultValue", "String"))
        .field(FieldDefinition::new("isDeprecated", TypeRef::named_nn("Boolean")))
        .field(FieldDefinition::new("deprecationReason", "String"));

    let enum_value = ObjectType::new("__EnumValue")
        .field(FieldDefinition::new("name", TypeRef::named_nn("String")))
        .field(FieldDefinition::new("description", "String"))
        .field(FieldDefinition::new("isDeprecated", TypeRef::named_nn("Boolean")))
        .field(FieldDefinition::new("deprecationReason", "String"));

    let directive = ObjectType::new("__Directive")
        .field(FieldDefinition::new("name", TypeRef::named_nn("String")))
        .field(FieldDefinition::new("description", "String"))
        .field(FieldDefinition::new("isRepeatable", TypeRef::named_nn("Boolean")))
        .field(FieldDefinition::new(
            "locations",
            TypeRef::named_nn_list_nn("__DirectiveLocation"),
        ))
        .field(
            FieldDefinition::new("args", TypeRef::named_nn_list_nn("__InputValue"))
                .argument(include_deprecated()),
        );

    let type_kind = [
        TypeKind::Scalar,
        TypeKind::Object,
        TypeKind::Interface,
        TypeKind::Union,
        TypeKind::Enum,
        TypeKind::InputObject,
        TypeKind::List,
        TypeKind::NonNull,
    ]
    .iter()
    .fold(EnumType::new("__TypeKind"), |kinds, kind| {
        kinds.value(EnumValueDefinition::new(kind.as_str()))
    });

    let directive_location = DirectiveLocation::all()
        .iter()
        .fold(EnumType::new("__DirectiveLocation"), |locations, location| {
            locations.value(EnumValueDefinition::new(location.as_str()))
        });

    vec![
        schema.into(),
        ty.into(),
        field.into(),
        input_value.into(),
        enum_value.into(),
        directive.into(),
        type_kind.into(),
        directive_location.into(),
    ]
}

/// Produces the value of a `__schema` or `__type` field by projecting the registry through the
/// requested selection set.
pub(crate) fn resolve_meta_field(
    ctx: &ExecutionContext,
    definition: &FieldDefinition,
    fields: &[&Field],
) -> Value {
    let introspector = Introspector { ctx };

    match definition.name.as_str() {
        "__schema" => introspector.schema(fields),
        "__type" => {
            let name = fields
                .first()
                .and_then(|field| introspector.argument(field, "name"))
                .and_then(|name| name.as_str().map(str::to_string));

            match name.and_then(|name| ctx.registry.lookup(&name)) {
                Some(named) => introspector.named_type(named, fields),
                None => Value::Null,
            }
        }
        _ => Value::Null,
    }
}

struct Introspector<'a> {
    ctx: &'a ExecutionContext,
}

impl<'a> Introspector<'a> {
    fn argument(&self, field: &Field, name: &str) -> Option<Value> {
        field
            .arguments
            .iter()
            .find(|(argument, _)| argument == name)
            .and_then(|(_, value)| value_from_ast(value, Some(&*self.ctx.variables)).ok())
    }

    fn include_deprecated(&self, fields: &[&Field]) -> bool {
        fields
            .first()
            .and_then(|field| self.argument(field, "includeDeprecated"))
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    /// Builds a JSON object for the meta type `type_name`, calling `resolve` for every selected
    /// field other than `__typename`.
    fn object<F>(&self, type_name: &str, fields: &[&Field], mut resolve: F) -> Value
    where
        F: FnMut(&str, &[&Field]) -> Value,
    {
        let collected = collect_fields(
            self.ctx,
            type_name,
            fields.iter().map(|field| &field.selection_set),
        );

        let mut object = Map::with_capacity(collected.len());
        for (response_name, field_nodes) in collected {
            let name = field_nodes[0].name.as_str();
            let value = if name == "__typename" {
                Value::String(type_name.to_string())
            } else {
                resolve(name, &field_nodes)
            };
            object.insert(response_name.to_string(), value);
        }
        Value::Object(object)
    }

    fn schema(&self, fields: &[&Field]) -> Value {
        let registry = &self.ctx.registry;

        self.object("__Schema", fields, |name, sub_fields| match name {
            "types" => Value::Array(
                registry
                    .types()
                    .map(|named| self.named_type(named, sub_fields))
                    .collect(),
            ),
            "queryType" => self.type_by_name(&registry.query_type().name, sub_fields),
            "mutationType" => registry
                .mutation_type()
                .map_or(Value::Null, |ty| self.type_by_name(&ty.name, sub_fields)),
            "subscriptionType" => registry
                .subscription_type()
                .map_or(Value::Null, |ty| self.type_by_name(&ty.name, sub_fields)),
            "directives" => Value::Array(
                registry
                    .directives()
                    .map(|directive| self.directive(directive, sub_fields))
                    .collect(),
            ),
            _ => Value::Null,
        })
    }

    fn type_by_name(&self, name: &str, fields: &[&Field]) -> Value {
        self.ctx
            .registry
            .lookup(name)
            .map_or(Value::Null, |named| self.named_type(named, fields))
    }

    fn type_ref(&self, ty: &TypeRef, fields: &[&Field]) -> Value {
        let (kind, inner) = match ty {
            TypeRef::NonNull(inner) => (TypeKind::NonNull, inner),
            TypeRef::List(inner) => (TypeKind::List, inner),
            named => return self.type_by_name(named.type_name(), fields),
        };

        self.object("__Type", fields, |name, sub_fields| match name {
            "kind" => Value::String(kind.as_str().to_string()),
            "ofType" => self.type_ref(inner, sub_fields),
            _ => Value::Null,
        })
    }

    fn named_type(&self, named: &NamedType, fields: &[&Field]) -> Value {
        let registry = &self.ctx.registry;
        let include_deprecated = |sub_fields: &[&Field]| self.include_deprecated(sub_fields);

        self.object("__Type", fields, |name, sub_fields| match name {
            "kind" => Value::String(named.kind().as_str().to_string()),
            "name" => Value::String(named.name().to_string()),
            "description" => optional_string(named.description()),
            "specifiedByURL" => match named {
                NamedType::Scalar(scalar) => optional_string(scalar.specified_by_url.as_deref()),
                _ => Value::Null,
            },
            "fields" => match named.fields() {
                Some(definitions) => {
                    let include_deprecated = include_deprecated(sub_fields);
                    Value::Array(
                        definitions
                            .values()
                            .filter(|field| include_deprecated || field.deprecation_reason.is_none())
                            .map(|field| self.field(field, sub_fields))
                            .collect(),
                    )
                }
                None => Value::Null,
            },
            "interfaces" => {
                let interfaces = match named {
                    NamedType::Object(object) => &object.interfaces,
                    NamedType::Interface(interface) => &interface.interfaces,
                    _ => return Value::Null,
                };
                Value::Array(
                    interfaces
                        .iter()
                        .map(|interface| self.type_ref(interface, sub_fields))
                        .collect(),
                )
            }
            "possibleTypes" if named.is_abstract() => Value::Array(
                registry
                    .possible_types(named.name())
                    .map(|object| self.type_by_name(object, sub_fields))
                    .collect(),
            ),
            "enumValues" => match named {
                NamedType::Enum(enum_type) => {
                    let include_deprecated = include_deprecated(sub_fields);
                    Value::Array(
                        enum_type
                            .values
                            .values()
                            .filter(|value| include_deprecated || value.deprecation_reason.is_none())
                            .map(|value| self.enum_value(value, sub_fields))
                            .collect(),
                    )
                }
                _ => Value::Null,
            },
            "inputFields" => match named.input_fields() {
                Some(definitions) => {
                    let include_deprecated = include_deprecated(sub_fields);
                    Value::Array(
                        definitions
                            .values()
                            .filter(|input| include_deprecated || input.deprecation_reason.is_none())
                            .map(|input| self.input_value(input, sub_fields))
                            .collect(),
                    )
                }
                None => Value::Null,
            },
            _ => Value::Null,
        })
    }

    fn field(&self, field: &FieldDefinition, fields: &[&Field]) -> Value {
        self.object("__Field", fields, |name, sub_fields| match name {
            "name" => Value::String(field.name.clone()),
            "description" => optional_string(field.description.as_deref()),
            "args" => {
                let include_deprecated = self.include_deprecated(sub_fields);
                Value::Array(
                    field
                        .arguments
                        .values()
                        .filter(|argument| {
                            include_deprecated || argument.deprecation_reason.is_none()
                        })
                        .map(|argument| self.input_value(argument, sub_fields))
                        .collect(),
                )
            }
            "type" => self.type_ref(&field.ty, sub_fields),
            "isDeprecated" => Value::Bool(field.deprecation_reason.is_some()),
            "deprecationReason" => optional_string(field.deprecation_reason.as_deref()),
            _ => Value::Null,
        })
    }

    fn input_value(&self, input: &InputValueDefinition, fields: &[&Field]) -> Value {
        self.object("__InputValue", fields, |name, sub_fields| match name {
            "name" => Value::String(input.name.clone()),
            "description" => optional_string(input.description.as_deref()),
            "type" => self.type_ref(&input.ty, sub_fields),
            "defaultValue" => input.default_value.as_ref().map_or(Value::Null, |default| {
                Value::String(print_input_value(&self.ctx.registry, &input.ty, default))
            }),
            "isDeprecated" => Value::Bool(input.deprecation_reason.is_some()),
            "deprecationReason" => optional_string(input.deprecation_reason.as_deref()),
            _ => Value::Null,
        })
    }

    fn enum_value(&self, value: &EnumValueDefinition, fields: &[&Field]) -> Value {
        self.object("__EnumValue", fields, |name, _| match name {
            "name" => Value::String(value.name.clone()),
            "description" => optional_string(value.description.as_deref()),
            "isDeprecated" => Value::Bool(value.deprecation_reason.is_some()),
            "deprecationReason" => optional_string(value.deprecation_reason.as_deref()),
            _ => Value::Null,
        })
    }

    fn directive(&self, directive: &DirectiveDefinition, fields: &[&Field]) -> Value {
        self.object("__Directive", fields, |name, sub_fields| match name {
            "name" => Value::String(directive.name.clone()),
            "description" => optional_string(directive.description.as_deref()),
            "isRepeatable" => Value::Bool(directive.repeatable),
            "locations" => Value::Array(
                directive
                    .locations
                    .iter()
                    .map(|location| Value::String(location.as_str().to_string()))
                    .collect(),
            ),
            "args" => {
                let include_deprecated = self.include_deprecated(sub_fields);
                Value::Array(
                    directive
                        .arguments
                        .values()
                        .filter(|argument| {
                            include_deprecated || argument.deprecation_reason.is_none()
                        })
                        .map(|argument| self.input_value(argument, sub_fields))
                        .collect(),
                )
            }
            _ => Value::Null,
        })
    }
}

fn optional_string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |value| Value::String(value.to_string()))
}

/// Prints a coerced input value as a GraphQL literal, for `defaultValue`.
fn print_input_value(
    registry: &crate::schema::registry::TypeRegistry,
    ty: &TypeRef,
    value: &Value,
) -> String {
    match (value, registry.resolve(ty)) {
        (Value::Null, _) => "null".to_string(),
        (Value::Array(items), _) if ty.is_list() => {
            let item_type = ty.list_item().unwrap_or(ty);
            let items: Vec<String> = items
                .iter()
                .map(|item| print_input_value(registry, item_type, item))
                .collect();
            format!("[{}]", items.join(", "))
        }
        (_, Some(NamedType::Enum(enum_type))) => enum_type
            .serialize(value)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        (Value::Object(object), Some(NamedType::InputObject(input))) => {
            let fields: Vec<String> = object
                .iter()
                .map(|(name, field_value)| match input.fields.get(name) {
                    Some(definition) => format!(
                        "{}: {}",
                        name,
                        print_input_value(registry, &definition.ty, field_value)
                    ),
                    None => format!("{}: {}", name, field_value),
                })
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
        _ => value.to_string(),
    }
}

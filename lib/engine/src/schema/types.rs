use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::ast::query::{Type as AstType, Value as AstValue};
use crate::coercion::value_from_ast::value_from_ast;
use crate::execution::resolver::{FieldValue, Resolver, Subscriber};

pub type ScalarParseValueFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;
pub type ScalarParseLiteralFn = Arc<dyn Fn(&AstValue) -> Result<Value, String> + Send + Sync>;
pub type ScalarSerializeFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;
pub type ResolveTypeFn = Arc<dyn Fn(&FieldValue) -> Option<String> + Send + Sync>;
pub type IsTypeOfFn = Arc<dyn Fn(&FieldValue) -> bool + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

impl TypeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKind::Scalar => "SCALAR",
            TypeKind::Object => "OBJECT",
            TypeKind::Interface => "INTERFACE",
            TypeKind::Union => "UNION",
            TypeKind::Enum => "ENUM",
            TypeKind::InputObject => "INPUT_OBJECT",
            TypeKind::List => "LIST",
            TypeKind::NonNull => "NON_NULL",
        }
    }
}

/// A named type definition. Cloning is cheap, and two clones of the same definition are the
/// same instance as far as the registry is concerned.
#[derive(Clone)]
pub enum NamedType {
    Scalar(Arc<ScalarType>),
    Object(Arc<ObjectType>),
    Interface(Arc<InterfaceType>),
    Union(Arc<UnionType>),
    Enum(Arc<EnumType>),
    InputObject(Arc<InputObjectType>),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            NamedType::Scalar(t) => &t.name,
            NamedType::Object(t) => &t.name,
            NamedType::Interface(t) => &t.name,
            NamedType::Union(t) => &t.name,
            NamedType::Enum(t) => &t.name,
            NamedType::InputObject(t) => &t.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            NamedType::Scalar(t) => t.description.as_deref(),
            NamedType::Object(t) => t.description.as_deref(),
            NamedType::Interface(t) => t.description.as_deref(),
            NamedType::Union(t) => t.description.as_deref(),
            NamedType::Enum(t) => t.description.as_deref(),
            NamedType::InputObject(t) => t.description.as_deref(),
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            NamedType::Scalar(_) => TypeKind::Scalar,
            NamedType::Object(_) => TypeKind::Object,
            NamedType::Interface(_) => TypeKind::Interface,
            NamedType::Union(_) => TypeKind::Union,
            NamedType::Enum(_) => TypeKind::Enum,
            NamedType::InputObject(_) => TypeKind::InputObject,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, NamedType::Scalar(_) | NamedType::Enum(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(
            self,
            NamedType::Scalar(_) | NamedType::Enum(_) | NamedType::InputObject(_)
        )
    }

    pub fn is_output(&self) -> bool {
        !matches!(self, NamedType::InputObject(_))
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            NamedType::Object(_) | NamedType::Interface(_) | NamedType::Union(_)
        )
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, NamedType::Interface(_) | NamedType::Union(_))
    }

    pub fn fields(&self) -> Option<&IndexMap<String, FieldDefinition>> {
        match self {
            NamedType::Object(t) => Some(&t.fields),
            NamedType::Interface(t) => Some(&t.fields),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields().and_then(|fields| fields.get(name))
    }

    pub fn input_fields(&self) -> Option<&IndexMap<String, InputValueDefinition>> {
        match self {
            NamedType::InputObject(t) => Some(&t.fields),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ObjectType>> {
        match self {
            NamedType::Object(t) => Some(t),
            _ => None,
        }
    }

    /// Address of the underlying definition, used to tell instances apart.
    pub fn identity(&self) -> usize {
        match self {
            NamedType::Scalar(t) => Arc::as_ptr(t) as *const () as usize,
            NamedType::Object(t) => Arc::as_ptr(t) as *const () as usize,
            NamedType::Interface(t) => Arc::as_ptr(t) as *const () as usize,
            NamedType::Union(t) => Arc::as_ptr(t) as *const () as usize,
            NamedType::Enum(t) => Arc::as_ptr(t) as *const () as usize,
            NamedType::InputObject(t) => Arc::as_ptr(t) as *const () as usize,
        }
    }

    pub fn same_instance(&self, other: &NamedType) -> bool {
        self.identity() == other.identity()
    }
}

impl fmt::Debug for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind(), self.name())
    }
}

macro_rules! impl_into_named_type {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for NamedType {
            fn from(value: $ty) -> Self {
                NamedType::$variant(Arc::new(value))
            }
        }

        impl From<Arc<$ty>> for NamedType {
            fn from(value: Arc<$ty>) -> Self {
                NamedType::$variant(value)
            }
        }
    };
}

impl_into_named_type!(Scalar, ScalarType);
impl_into_named_type!(Object, ObjectType);
impl_into_named_type!(Interface, InterfaceType);
impl_into_named_type!(Union, UnionType);
impl_into_named_type!(Enum, EnumType);
impl_into_named_type!(InputObject, InputObjectType);

/// A deferred type reference, resolved the first time the registry (or anyone else) asks for it.
///
/// A lazy reference must not lead back to a type that is still being registered. Recursive
/// types reference each other with [`TypeRef::Named`] instead.
#[derive(Clone)]
pub struct LazyType(Arc<LazyTypeInner>);

struct LazyTypeInner {
    thunk: Box<dyn Fn() -> NamedType + Send + Sync>,
    resolved: OnceCell<NamedType>,
}

impl LazyType {
    pub fn new<F>(thunk: F) -> Self
    where
        F: Fn() -> NamedType + Send + Sync + 'static,
    {
        LazyType(Arc::new(LazyTypeInner {
            thunk: Box::new(thunk),
            resolved: OnceCell::new(),
        }))
    }

    pub fn get(&self) -> &NamedType {
        self.0.resolved.get_or_init(|| (self.0.thunk)())
    }
}

/// A (possibly wrapped) reference to a type, as used by fields, arguments and variables.
#[derive(Clone)]
pub enum TypeRef {
    /// A reference by name, resolved against the registry.
    Named(String),
    /// A direct reference to a definition. Registered along with whatever references it.
    Def(NamedType),
    Lazy(LazyType),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> TypeRef {
        TypeRef::Named(name.into())
    }

    pub fn named_nn(name: impl Into<String>) -> TypeRef {
        TypeRef::named(name).non_null()
    }

    pub fn named_list(name: impl Into<String>) -> TypeRef {
        TypeRef::named(name).list()
    }

    pub fn named_nn_list_nn(name: impl Into<String>) -> TypeRef {
        TypeRef::named_nn(name).list().non_null()
    }

    pub fn lazy<F>(thunk: F) -> TypeRef
    where
        F: Fn() -> NamedType + Send + Sync + 'static,
    {
        TypeRef::Lazy(LazyType::new(thunk))
    }

    pub fn list(self) -> TypeRef {
        TypeRef::List(Box::new(self))
    }

    pub fn non_null(self) -> TypeRef {
        match self {
            TypeRef::NonNull(_) => self,
            other => TypeRef::NonNull(Box::new(other)),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::NonNull(_))
    }

    /// Whether the type, ignoring an outer non-null, is a list.
    pub fn is_list(&self) -> bool {
        matches!(self.nullable(), TypeRef::List(_))
    }

    /// The type without its outer non-null wrapper.
    pub fn nullable(&self) -> &TypeRef {
        match self {
            TypeRef::NonNull(inner) => inner,
            other => other,
        }
    }

    /// The item type when this is a (possibly non-null) list.
    pub fn list_item(&self) -> Option<&TypeRef> {
        match self.nullable() {
            TypeRef::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// Name of the innermost named type.
    pub fn type_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::Def(named) => named.name(),
            TypeRef::Lazy(lazy) => lazy.get().name(),
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.type_name(),
        }
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &TypeRef) -> bool {
        match (self, other) {
            (TypeRef::List(a), TypeRef::List(b)) => a == b,
            (TypeRef::NonNull(a), TypeRef::NonNull(b)) => a == b,
            (TypeRef::List(_) | TypeRef::NonNull(_), _)
            | (_, TypeRef::List(_) | TypeRef::NonNull(_)) => false,
            (a, b) => a.type_name() == b.type_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
            named => f.write_str(named.type_name()),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({})", self)
    }
}

impl From<&AstType> for TypeRef {
    fn from(ty: &AstType) -> Self {
        match ty {
            AstType::NamedType(name) => TypeRef::Named(name.clone()),
            AstType::ListType(inner) => TypeRef::List(Box::new(TypeRef::from(inner.as_ref()))),
            AstType::NonNullType(inner) => {
                TypeRef::NonNull(Box::new(TypeRef::from(inner.as_ref())))
            }
        }
    }
}

impl From<NamedType> for TypeRef {
    fn from(named: NamedType) -> Self {
        TypeRef::Def(named)
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::Named(name.to_string())
    }
}

pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    pub specified_by_url: Option<String>,
    parse_value: ScalarParseValueFn,
    parse_literal: ScalarParseLiteralFn,
    serialize: ScalarSerializeFn,
}

impl ScalarType {
    /// A custom scalar that accepts and emits any non-null JSON value as-is.
    pub fn new(name: impl Into<String>) -> Self {
        ScalarType {
            name: name.into(),
            description: None,
            specified_by_url: None,
            parse_value: Arc::new(|value| Ok(value.clone())),
            parse_literal: Arc::new(|literal| value_from_ast(literal, None)),
            serialize: Arc::new(|value| Ok(value.clone())),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn specified_by_url(mut self, url: impl Into<String>) -> Self {
        self.specified_by_url = Some(url.into());
        self
    }

    pub fn with_parse_value<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.parse_value = Arc::new(f);
        self
    }

    pub fn with_parse_literal<F>(mut self, f: F) -> Self
    where
        F: Fn(&AstValue) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.parse_literal = Arc::new(f);
        self
    }

    pub fn with_serialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.serialize = Arc::new(f);
        self
    }

    pub fn parse_value(&self, value: &Value) -> Result<Value, String> {
        (self.parse_value)(value)
    }

    pub fn parse_literal(&self, literal: &AstValue) -> Result<Value, String> {
        (self.parse_literal)(literal)
    }

    pub fn serialize(&self, value: &Value) -> Result<Value, String> {
        (self.serialize)(value)
    }
}

pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputValueDefinition>,
    pub resolver: Option<Resolver>,
    pub subscriber: Option<Subscriber>,
    pub deprecation_reason: Option<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        FieldDefinition {
            name: name.into(),
            description: None,
            ty: ty.into(),
            arguments: IndexMap::new(),
            resolver: None,
            subscriber: None,
            deprecation_reason: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }

    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn subscriber(mut self, subscriber: Subscriber) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }
}

#[derive(Clone)]
pub struct InputValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    /// Already-coerced default, applied when the value is absent.
    pub default_value: Option<Value>,
    pub deprecation_reason: Option<String>,
}

impl InputValueDefinition {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        InputValueDefinition {
            name: name.into(),
            description: None,
            ty: ty.into(),
            default_value: None,
            deprecation_reason: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    /// Required means non-null without a default.
    pub fn is_required(&self) -> bool {
        self.ty.is_non_null() && self.default_value.is_none()
    }
}

pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDefinition>,
    pub interfaces: Vec<TypeRef>,
    pub is_type_of: Option<IsTypeOfFn>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        ObjectType {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            interfaces: Vec::new(),
            is_type_of: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn implements(mut self, interface: impl Into<TypeRef>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn is_type_of<F>(mut self, f: F) -> Self
    where
        F: Fn(&FieldValue) -> bool + Send + Sync + 'static,
    {
        self.is_type_of = Some(Arc::new(f));
        self
    }
}

pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDefinition>,
    pub interfaces: Vec<TypeRef>,
    pub resolve_type: Option<ResolveTypeFn>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>) -> Self {
        InterfaceType {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            interfaces: Vec::new(),
            resolve_type: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn implements(mut self, interface: impl Into<TypeRef>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn resolve_type<F>(mut self, f: F) -> Self
    where
        F: Fn(&FieldValue) -> Option<String> + Send + Sync + 'static,
    {
        self.resolve_type = Some(Arc::new(f));
        self
    }
}

pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<TypeRef>,
    pub resolve_type: Option<ResolveTypeFn>,
}

impl UnionType {
    pub fn new(name: impl Into<String>) -> Self {
        UnionType {
            name: name.into(),
            description: None,
            members: Vec::new(),
            resolve_type: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn member(mut self, member: impl Into<TypeRef>) -> Self {
        self.members.push(member.into());
        self
    }

    pub fn resolve_type<F>(mut self, f: F) -> Self
    where
        F: Fn(&FieldValue) -> Option<String> + Send + Sync + 'static,
    {
        self.resolve_type = Some(Arc::new(f));
        self
    }
}

pub struct EnumValueDefinition {
    pub name: String,
    pub description: Option<String>,
    /// Internal representation handed to resolvers, and matched when serializing.
    pub value: Value,
    pub deprecation_reason: Option<String>,
}

impl EnumValueDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        EnumValueDefinition {
            value: Value::String(name.clone()),
            name,
            description: None,
            deprecation_reason: None,
        }
    }

    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }
}

pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexMap<String, EnumValueDefinition>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        EnumType {
            name: name.into(),
            description: None,
            values: IndexMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a value whose internal representation is its own name.
    pub fn item(self, name: impl Into<String>) -> Self {
        self.value(EnumValueDefinition::new(name))
    }

    pub fn value(mut self, value: EnumValueDefinition) -> Self {
        self.values.insert(value.name.clone(), value);
        self
    }

    /// Internal value for an enum value name.
    pub fn parse_name(&self, name: &str) -> Option<&Value> {
        self.values.get(name).map(|definition| &definition.value)
    }

    /// Enum value name for an internal value.
    pub fn serialize(&self, value: &Value) -> Option<&str> {
        self.values
            .values()
            .find(|definition| &definition.value == value)
            .map(|definition| definition.name.as_str())
    }
}

pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValueDefinition>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        InputObjectType {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: InputValueDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{EnumType, EnumValueDefinition, TypeRef};
    use crate::ast::parse_document;
    use graphql_parser::query::{Definition, OperationDefinition};

    #[test]
    fn prints_wrapped_types() {
        assert_eq!(TypeRef::named_nn_list_nn("Int").to_string(), "[Int!]!");
        assert_eq!(TypeRef::named_list("User").non_null().to_string(), "[User]!");
    }

    #[test]
    fn non_null_is_not_doubled() {
        assert_eq!(TypeRef::named_nn("Int").non_null().to_string(), "Int!");
    }

    #[test]
    fn compares_by_structure_and_name() {
        assert_eq!(TypeRef::named_nn("Int"), TypeRef::named("Int").non_null());
        assert_ne!(TypeRef::named_list("Int"), TypeRef::named("Int"));
        assert_ne!(TypeRef::named("Int"), TypeRef::named("String"));
    }

    #[test]
    fn converts_variable_types() {
        let document = parse_document("query($ids: [ID!]!) { a }").unwrap();
        let Definition::Operation(OperationDefinition::Query(query)) = &document.definitions[0]
        else {
            panic!("expected a query");
        };

        let ty = TypeRef::from(&query.variable_definitions[0].var_type);
        assert_eq!(ty.to_string(), "[ID!]!");
        assert!(ty.is_list());
        assert_eq!(ty.type_name(), "ID");
    }

    #[test]
    fn enum_values_map_both_ways() {
        let color = EnumType::new("Color")
            .item("RED")
            .value(EnumValueDefinition::new("GREEN").value(2));

        assert_eq!(color.parse_name("GREEN"), Some(&serde_json::json!(2)));
        assert_eq!(color.serialize(&serde_json::json!("RED")), Some("RED"));
        assert_eq!(color.serialize(&serde_json::json!(3)), None);
    }
}

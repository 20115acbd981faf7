use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};

use crate::ast::query::{Definition, Document, FragmentDefinition, OperationDefinition};
use crate::ast::{OperationDefinitionExt, OperationKind};
use crate::coercion::variables::Variables;
use crate::execution::resolver::FieldValue;
use crate::response::graphql_error::{ErrorKind, GraphQLError};
use crate::schema::registry::TypeRegistry;
use crate::schema::types::ObjectType;
use crate::utils::cancellation::CancellationToken;

pub const OPERATION_RESOLUTION_FAILURE: &str = "OPERATION_RESOLUTION_FAILURE";

/// Per-request execution state.
///
/// Everything but the error list and the response extensions is read-only once execution
/// starts. Resolvers running concurrently only ever append to those, behind their mutexes.
pub struct ExecutionContext {
    pub registry: Arc<TypeRegistry>,
    pub document: Arc<Document>,
    pub variables: Arc<Variables>,
    pub root_value: Arc<FieldValue>,
    /// Application context handed to every resolver.
    pub data: Option<Arc<dyn Any + Send + Sync>>,
    pub cancellation_token: CancellationToken,
    /// Upper bound of resolvers in flight at the same time.
    pub max_parallelism: usize,
    pub throw_on_unhandled: bool,
    operation_index: usize,
    fragments: HashMap<String, usize>,
    errors: Mutex<Vec<GraphQLError>>,
    extensions: Mutex<Map<String, Value>>,
}

impl ExecutionContext {
    /// `operation_index` must point at an operation definition, see [`select_operation`].
    pub(crate) fn new(
        registry: Arc<TypeRegistry>,
        document: Arc<Document>,
        operation_index: usize,
        variables: Arc<Variables>,
    ) -> Self {
        let fragments = document
            .definitions
            .iter()
            .enumerate()
            .filter_map(|(index, definition)| match definition {
                Definition::Fragment(fragment) => Some((fragment.name.clone(), index)),
                Definition::Operation(_) => None,
            })
            .collect();

        ExecutionContext {
            registry,
            document,
            variables,
            root_value: Arc::new(FieldValue::Null),
            data: None,
            cancellation_token: CancellationToken::new(),
            max_parallelism: 32,
            throw_on_unhandled: false,
            operation_index,
            fragments,
            errors: Mutex::new(Vec::new()),
            extensions: Mutex::new(Map::new()),
        }
    }

    /// A context for one event of a subscription: same request, fresh root value and errors.
    pub(crate) fn for_event(&self, root_value: FieldValue) -> Self {
        ExecutionContext {
            registry: self.registry.clone(),
            document: self.document.clone(),
            variables: self.variables.clone(),
            root_value: Arc::new(root_value),
            data: self.data.clone(),
            cancellation_token: self.cancellation_token.clone(),
            max_parallelism: self.max_parallelism,
            throw_on_unhandled: self.throw_on_unhandled,
            operation_index: self.operation_index,
            fragments: self.fragments.clone(),
            errors: Mutex::new(Vec::new()),
            extensions: Mutex::new(Map::new()),
        }
    }

    pub fn operation(&self) -> &OperationDefinition {
        match &self.document.definitions[self.operation_index] {
            Definition::Operation(operation) => operation,
            Definition::Fragment(_) => unreachable!("the selected definition is an operation"),
        }
    }

    pub fn operation_kind(&self) -> OperationKind {
        self.operation().kind()
    }

    /// The root object type of the selected operation, if the schema defines one.
    pub fn root_type(&self) -> Option<&Arc<ObjectType>> {
        self.registry.root_type(self.operation_kind())
    }

    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        match self.document.definitions.get(*self.fragments.get(name)?) {
            Some(Definition::Fragment(fragment)) => Some(fragment),
            _ => None,
        }
    }

    pub fn report_error(&self, error: GraphQLError) {
        self.errors().push(error);
    }

    pub fn take_errors(&self) -> Vec<GraphQLError> {
        std::mem::take(&mut *self.errors())
    }

    fn errors(&self) -> MutexGuard<'_, Vec<GraphQLError>> {
        // A panicking resolver never holds the lock, the list stays usable.
        self.errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sets a top-level key of the response `extensions`. A later value for the same key wins.
    pub fn set_extension(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.extensions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), value.into());
    }

    pub fn take_extensions(&self) -> Map<String, Value> {
        std::mem::take(
            &mut *self
                .extensions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

/// Picks the operation to run: the one named `operation_name`, or the only one in the document.
/// Returns it with its index among the document definitions.
pub fn select_operation<'d>(
    document: &'d Document,
    operation_name: Option<&str>,
) -> Result<(usize, &'d OperationDefinition), GraphQLError> {
    let mut operations = document
        .definitions
        .iter()
        .enumerate()
        .filter_map(|(index, definition)| match definition {
            Definition::Operation(operation) => Some((index, operation)),
            Definition::Fragment(_) => None,
        });

    let selected = match operation_name {
        Some(name) => operations
            .find(|(_, operation)| operation.name() == Some(name))
            .ok_or_else(|| format!("Unknown operation named \"{}\".", name)),
        None => match (operations.next(), operations.next()) {
            (Some(selected), None) => Ok(selected),
            (None, _) => Err("Must provide an operation.".to_string()),
            (Some(_), Some(_)) => {
                Err("Must provide operation name if query contains multiple operations.".to_string())
            }
        },
    };

    selected.map_err(|message| {
        GraphQLError::new(message, ErrorKind::Validation(OPERATION_RESOLUTION_FAILURE))
            .with_code(OPERATION_RESOLUTION_FAILURE)
    })
}

#[cfg(test)]
mod tests {
    use super::select_operation;
    use crate::ast::{parse_document, OperationDefinitionExt};

    #[test]
    fn selects_the_only_operation() {
        let document = parse_document("fragment F on Query { a } { a ...F }").unwrap();
        assert_eq!(select_operation(&document, None).map(|(index, _)| index), Ok(1));
    }

    #[test]
    fn selects_by_name() {
        let document = parse_document("query A { a } query B { a }").unwrap();
        let (index, operation) = select_operation(&document, Some("B")).unwrap();
        assert_eq!(index, 1);
        assert_eq!(operation.name(), Some("B"));
    }

    #[test]
    fn operation_resolution_failures() {
        let document = parse_document("query A { a } query B { a }").unwrap();
        let ambiguous = select_operation(&document, None).unwrap_err();
        assert_eq!(
            ambiguous.message,
            "Must provide operation name if query contains multiple operations."
        );
        assert_eq!(ambiguous.code(), Some("OPERATION_RESOLUTION_FAILURE"));

        let unknown = select_operation(&document, Some("C")).unwrap_err();
        assert_eq!(unknown.message, "Unknown operation named \"C\".");

        let fragments_only = parse_document("fragment F on Query { a }").unwrap();
        assert_eq!(
            select_operation(&fragments_only, None).unwrap_err().message,
            "Must provide an operation."
        );
    }
}

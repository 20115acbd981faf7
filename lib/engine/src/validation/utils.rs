use std::collections::{HashMap, HashSet};

use graphql_parser::Pos;

use crate::ast::query::OperationDefinition;
use crate::response::graphql_error::{ErrorKind, GraphQLError};

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub locations: Vec<Pos>,
    pub message: String,
    pub error_code: &'static str,
}

impl From<ValidationError> for GraphQLError {
    fn from(error: ValidationError) -> Self {
        GraphQLError::new(error.message, ErrorKind::Validation(error.error_code))
            .with_code(error.error_code)
            .with_locations(error.locations)
    }
}

#[derive(Debug, Default)]
pub struct ValidationErrorContext {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrorContext {
    pub fn new() -> ValidationErrorContext {
        ValidationErrorContext { errors: vec![] }
    }

    pub fn report_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }
}

struct Scope<'a, T> {
    usages: Vec<T>,
    spreads: Vec<&'a str>,
}

impl<T> Default for Scope<'_, T> {
    fn default() -> Self {
        Scope {
            usages: Vec::new(),
            spreads: Vec::new(),
        }
    }
}

enum CurrentScope<'a> {
    None,
    Operation(usize),
    Fragment(&'a str),
}

/// Records things (variable usages, fragment spreads) per operation and per fragment definition,
/// so they can be resolved transitively through fragment spreads once the document is walked.
pub struct ScopedUsages<'a, T> {
    operations: Vec<(&'a OperationDefinition, Scope<'a, T>)>,
    fragments: HashMap<&'a str, Scope<'a, T>>,
    current: CurrentScope<'a>,
}

impl<'a, T> Default for ScopedUsages<'a, T> {
    fn default() -> Self {
        ScopedUsages {
            operations: Vec::new(),
            fragments: HashMap::new(),
            current: CurrentScope::None,
        }
    }
}

impl<'a, T> ScopedUsages<'a, T> {
    pub fn enter_operation(&mut self, operation: &'a OperationDefinition) {
        self.operations.push((operation, Scope::default()));
        self.current = CurrentScope::Operation(self.operations.len() - 1);
    }

    pub fn enter_fragment(&mut self, name: &'a str) {
        self.fragments.entry(name).or_default();
        self.current = CurrentScope::Fragment(name);
    }

    pub fn leave_definition(&mut self) {
        self.current = CurrentScope::None;
    }

    fn current_scope(&mut self) -> Option<&mut Scope<'a, T>> {
        match self.current {
            CurrentScope::None => None,
            CurrentScope::Operation(index) => self.operations.get_mut(index).map(|(_, scope)| scope),
            CurrentScope::Fragment(name) => self.fragments.get_mut(name),
        }
    }

    pub fn record(&mut self, usage: T) {
        if let Some(scope) = self.current_scope() {
            scope.usages.push(usage);
        }
    }

    pub fn record_spread(&mut self, fragment_name: &'a str) {
        if let Some(scope) = self.current_scope() {
            scope.spreads.push(fragment_name);
        }
    }

    /// Fragment names reachable from an operation, in discovery order.
    pub fn reachable_fragments(&self, operation_index: usize) -> Vec<&'a str> {
        let mut visited: HashSet<&'a str> = HashSet::new();
        let mut ordered = Vec::new();
        let mut stack: Vec<&'a str> = self.operations[operation_index]
            .1
            .spreads
            .iter()
            .rev()
            .copied()
            .collect();

        while let Some(name) = stack.pop() {
            if !visited.insert(name) {
                continue;
            }
            ordered.push(name);
            if let Some(fragment) = self.fragments.get(name) {
                stack.extend(fragment.spreads.iter().rev().copied());
            }
        }

        ordered
    }

    /// Every operation with the usages recorded in it and in the fragments it reaches.
    pub fn operations(&self) -> impl Iterator<Item = (&'a OperationDefinition, Vec<&T>)> + '_ {
        (0..self.operations.len()).map(move |index| {
            let (operation, scope) = &self.operations[index];
            let mut usages: Vec<&T> = scope.usages.iter().collect();
            for fragment in self.reachable_fragments(index) {
                if let Some(scope) = self.fragments.get(fragment) {
                    usages.extend(scope.usages.iter());
                }
            }
            (*operation, usages)
        })
    }

    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }
}

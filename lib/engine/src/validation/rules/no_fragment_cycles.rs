use std::collections::{HashMap, HashSet};

use super::ValidationRule;
use crate::ast::query::{FragmentDefinition, FragmentSpread, Selection, SelectionSet};
use crate::validation::utils::{ValidationError, ValidationErrorContext};
use crate::validation::visitor::{NodeKinds, OperationVisitor, OperationVisitorContext};

/// No fragment cycles
///
/// The graph of fragment spreads must not form any cycles including spreading itself.
/// Otherwise an operation could infinitely spread or infinitely execute on cycles
/// in the underlying data.
///
/// See https://spec.graphql.org/draft/#sec-Fragment-spreads-must-not-form-cycles
pub struct NoFragmentCycles;

impl NoFragmentCycles {
    pub fn new() -> Self {
        NoFragmentCycles
    }
}

impl Default for NoFragmentCycles {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_spreads<'a>(selection_set: &'a SelectionSet, spreads: &mut Vec<&'a FragmentSpread>) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => collect_spreads(&field.selection_set, spreads),
            Selection::InlineFragment(fragment) => {
                collect_spreads(&fragment.selection_set, spreads)
            }
            Selection::FragmentSpread(spread) => spreads.push(spread),
        }
    }
}

#[derive(Default)]
struct NoFragmentCyclesVisitor<'a> {
    /// Fragments already checked, so each cycle is reported once.
    visited: HashSet<&'a str>,
    /// Spreads leading from the fragment being checked to the current one.
    spread_path: Vec<&'a FragmentSpread>,
    /// Index into `spread_path` at which a fragment was entered.
    spread_path_index: HashMap<&'a str, usize>,
    spreads_by_fragment: HashMap<&'a str, Vec<&'a FragmentSpread>>,
}

impl<'a> NoFragmentCyclesVisitor<'a> {
    fn spreads_of(&mut self, fragment: &'a FragmentDefinition) -> Vec<&'a FragmentSpread> {
        self.spreads_by_fragment
            .entry(&fragment.name)
            .or_insert_with(|| {
                let mut spreads = vec![];
                collect_spreads(&fragment.selection_set, &mut spreads);
                spreads
            })
            .clone()
    }

    fn detect_cycle(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a FragmentDefinition,
    ) {
        if !self.visited.insert(&fragment.name) {
            return;
        }

        let spreads = self.spreads_of(fragment);
        if spreads.is_empty() {
            return;
        }

        self.spread_path_index
            .insert(&fragment.name, self.spread_path.len());

        for spread in spreads {
            let name = spread.fragment_name.as_str();

            match self.spread_path_index.get(name).copied() {
                None => {
                    self.spread_path.push(spread);
                    if let Some(target) = ctx.known_fragments.get(name) {
                        self.detect_cycle(ctx, errors, target);
                    }
                    self.spread_path.pop();
                }
                Some(index) => {
                    let cycle = &self.spread_path[index..];
                    let via: Vec<String> = cycle
                        .iter()
                        .map(|spread| format!("\"{}\"", spread.fragment_name))
                        .collect();

                    let message = if via.is_empty() {
                        format!("Cannot spread fragment \"{}\" within itself.", name)
                    } else {
                        format!(
                            "Cannot spread fragment \"{}\" within itself via {}.",
                            name,
                            via.join(", ")
                        )
                    };

                    errors.report_error(ValidationError {
                        locations: cycle
                            .iter()
                            .chain(std::iter::once(&spread))
                            .map(|spread| spread.position)
                            .collect(),
                        message,
                        error_code: "NO_FRAGMENT_CYCLES",
                    });
                }
            }
        }

        self.spread_path_index.remove(fragment.name.as_str());
    }
}

impl<'a> OperationVisitor<'a> for NoFragmentCyclesVisitor<'a> {
    fn enter_fragment_definition(
        &mut self,
        ctx: &OperationVisitorContext<'a>,
        errors: &mut ValidationErrorContext,
        fragment: &'a FragmentDefinition,
    ) {
        self.detect_cycle(ctx, errors, fragment);
    }
}

impl ValidationRule for NoFragmentCycles {
    fn error_code<'a>(&self) -> &'a str {
        "NO_FRAGMENT_CYCLES"
    }

    fn interests(&self) -> NodeKinds {
        NodeKinds::FRAGMENT_DEFINITION
    }

    fn visitor<'a>(&self) -> Box<dyn OperationVisitor<'a> + 'a> {
        Box::new(NoFragmentCyclesVisitor::default())
    }
}

#[cfg(test)]
mod tests {
    use super::NoFragmentCycles;
    use crate::tests::testkit::validate_rule;

    #[test]
    fn spreading_twice_is_not_a_cycle() {
        let errors = validate_rule(
            NoFragmentCycles::new(),
            "fragment A on Dog { ...B ...B } fragment B on Dog { name }",
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn spreading_itself() {
        let errors = validate_rule(
            NoFragmentCycles::new(),
            "fragment A on Human { relatives { ...A } }",
        );
        assert_eq!(errors, vec!["Cannot spread fragment \"A\" within itself."]);
    }

    #[test]
    fn cycle_through_other_fragments_is_reported_once() {
        let errors = validate_rule(
            NoFragmentCycles::new(),
            "fragment A on Dog { ...B } fragment B on Dog { ...C } fragment C on Dog { ...A }",
        );
        assert_eq!(
            errors,
            vec!["Cannot spread fragment \"A\" within itself via \"B\", \"C\"."]
        );
    }
}

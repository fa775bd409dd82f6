//! Builtin functions.
//!
//! Builtins are grouped by category, one module each:
//! - `accessor`: property and index access (`Accessor`, `Element`, `getProperty`, `setPathToValue`)
//! - `math`: arithmetic operators and numeric functions
//! - `comparison`: equality and ordering operators, `exists`
//! - `logic`: `&&`, `||`, `!`, `if`, `coalesce`
//! - `string`: text manipulation
//! - `array`: collection functions
//! - `lambda`: iteration combinators (`foreach`, `where`, `sortBy`, ...)
//! - `datetime`: timestamps, intervals and ticks
//! - `type_check`: `isString`, `isInteger`, ...
//! - `conversion`: `int`, `string`, `json`, `base64`, ...
//! - `object`: object construction and manipulation
//! - `uri`: URI component extraction
//! - `regex`: `isMatch`
//!
//! Every module exposes a static slice of [`ExpressionEvaluator`]s. The
//! [`FunctionTable`] indexes them once, on first use, and is read-only from
//! then on.

use hashbrown::HashMap;
use once_cell::sync::Lazy;

use crate::expression::ExpressionEvaluator;

pub(crate) mod apply;

mod accessor;
mod array;
mod comparison;
mod conversion;
mod datetime;
mod lambda;
mod logic;
mod math;
mod object;
mod regex;
mod string;
mod type_check;
mod uri;

#[cfg(test)]
mod datetime_test;

static FUNCTIONS: Lazy<FunctionTable> = Lazy::new(FunctionTable::builtin);

/// Registry of builtins by name, with aliases layered in front.
#[derive(Debug)]
pub struct FunctionTable {
    functions: HashMap<&'static str, &'static ExpressionEvaluator>,
    aliases: HashMap<&'static str, &'static str>,
}

impl FunctionTable {
    /// The process-wide table of every builtin.
    pub fn global() -> &'static FunctionTable {
        &FUNCTIONS
    }

    fn builtin() -> Self {
        let groups: [&'static [ExpressionEvaluator]; 13] = [
            accessor::EVALUATORS,
            math::EVALUATORS,
            comparison::EVALUATORS,
            logic::EVALUATORS,
            string::EVALUATORS,
            array::EVALUATORS,
            lambda::EVALUATORS,
            datetime::EVALUATORS,
            type_check::EVALUATORS,
            conversion::EVALUATORS,
            object::EVALUATORS,
            uri::EVALUATORS,
            regex::EVALUATORS,
        ];

        let mut table = FunctionTable {
            functions: HashMap::new(),
            aliases: HashMap::new(),
        };
        for evaluator in groups.into_iter().flatten() {
            table.register(evaluator);
        }

        tracing::debug!(
            functions = table.functions.len(),
            aliases = table.aliases.len(),
            "function table initialized"
        );
        table
    }

    fn register(&mut self, evaluator: &'static ExpressionEvaluator) {
        if self.functions.insert(evaluator.name(), evaluator).is_some() {
            tracing::warn!(name = evaluator.name(), "builtin registered twice");
        }
        for alias in evaluator.aliases() {
            self.aliases.insert(alias, evaluator.name());
        }
    }

    /// Find a builtin by canonical name or alias. Names are case-sensitive.
    pub fn lookup(&self, name: &str) -> Option<&ExpressionEvaluator> {
        let canonical = self.aliases.get(name).copied().unwrap_or(name);
        self.functions.get(canonical).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Canonical names of every builtin, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }

    /// Number of builtins, not counting aliases.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#![allow(dead_code)]

use std::sync::Arc;

use adaptive_expressions::{
    Diagnostic, Engine, Error, Expression, Options, SimpleObjectMemory,
    render_error_to_string_no_color,
};
use once_cell::sync::Lazy;
use serde_json::{Value, json};

pub static ENGINE: Lazy<Engine> = Lazy::new(Engine::default);

/// State shared by cases that do not bring their own memory.
pub fn default_memory() -> Value {
    json!({
        "one": 1,
        "two": 2,
        "hello": "hello",
        "world": "world",
        "bag": {"three": 3, "set": {"four": 4}, "list": ["red", "blue"]},
        "items": ["zero", "one", "two"],
        "nums": [1, 2, 3, 4],
        "flag": true,
        "nullObj": null,
    })
}

pub fn compile(source: &str) -> Arc<Expression> {
    ENGINE.compile(source).unwrap_or_else(|err| {
        panic!(
            "failed to parse {:?}:\n{}",
            source,
            render_error_to_string_no_color(&err)
        )
    })
}

/// Evaluate `source`, reporting runtime failures by message only.
pub fn run(source: &str, memory: Value) -> Result<Value, String> {
    let expression = compile(source);
    let mut memory = SimpleObjectMemory::new(memory);
    ENGINE
        .run(&expression, &mut memory, &Options::default())
        .map_err(|err| match err {
            Error::Runtime(message) => message,
            other => other.to_string(),
        })
}

/// The first diagnostic of a source expected not to parse.
pub fn compile_error(source: &str) -> Diagnostic {
    match ENGINE.compile(source) {
        Ok(expression) => panic!("{:?} parsed unexpectedly as {}", source, expression),
        Err(Error::Compilation { diagnostics, .. }) => diagnostics
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("{:?} failed without diagnostics", source)),
        Err(other) => panic!("{:?} failed with a non-compilation error: {}", source, other),
    }
}

/// Declares one `#[test]` per expression.
///
/// ```ignore
/// test_case!(
///     addition,
///     input: "one + two",
///     value: Ok(json!(3)),
/// );
/// test_case!(
///     dangling_operator,
///     input: "1 +",
///     parse_error: "P001",
/// );
/// ```
///
/// `memory:` replaces [`default_memory`]; `display:` checks how the parsed
/// tree prints.
#[macro_export]
macro_rules! test_case {
    (
        $name:ident,
        input: $input:expr,
        $(memory: $memory:expr,)?
        $(display: $display:expr,)?
        value: $value:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            #[allow(unused_mut, unused_assignments)]
            let mut memory = $crate::cases::default_memory();
            $( memory = $memory; )?
            $(
                ::pretty_assertions::assert_eq!(
                    $crate::cases::compile($input).to_string(),
                    $display,
                    "display of {:?}",
                    $input
                );
            )?
            let expected: ::std::result::Result<::serde_json::Value, &str> = $value;
            ::pretty_assertions::assert_eq!(
                $crate::cases::run($input, memory),
                expected.map_err(str::to_string),
                "value of {:?}",
                $input
            );
        }
    };
    (
        $name:ident,
        input: $input:expr,
        parse_error: $code:expr,
        message: $message:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let diagnostic = $crate::cases::compile_error($input);
            ::pretty_assertions::assert_eq!(diagnostic.code.as_deref(), Some($code), "{:?}", $input);
            ::pretty_assertions::assert_eq!(diagnostic.message, $message, "{:?}", $input);
        }
    };
    (
        $name:ident,
        input: $input:expr,
        parse_error: $code:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let diagnostic = $crate::cases::compile_error($input);
            ::pretty_assertions::assert_eq!(
                diagnostic.code.as_deref(),
                Some($code),
                "{:?}: {}",
                $input,
                diagnostic
            );
        }
    };
}

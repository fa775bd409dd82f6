// Tests with valid expressions for each rule in the grammar.

use crate::parser::{ExpressionParser, Rule};
use pest::Parser;
use pest::iterators::Pair;

fn contains_rule(pair: Pair<Rule>, target: Rule) -> bool {
    if pair.as_rule() == target {
        return true;
    }
    for inner in pair.into_inner() {
        if contains_rule(inner, target) {
            return true;
        }
    }
    false
}

macro_rules! rule_examples {
    ( $($rule:ident => [$($expr:expr),* $(,)?]),* $(,)? ) => {
        $(
            #[test]
            fn $rule() {
                let inputs = vec![$($expr),*];
                for input in inputs {
                    let result = ExpressionParser::parse(Rule::main, input)
                        .unwrap_or_else(|e| panic!("Failed to parse '{}': {}", input, e));
                    let root = result.into_iter().next().unwrap();
                    assert!(
                        contains_rule(root.clone(), Rule::$rule),
                        "Expected to find rule {:?} in parse tree for input '{}'",
                        Rule::$rule,
                        input
                    );
                }
            }
        )*
    };
}

rule_examples! {
    number => ["42", "0", "3.14", "-7", "1.0"],
    string => ["\"hello\"", "'world'", "'it\\'s'", "\"say \\\"hi\\\"\"", "''"],
    identifier => ["foo", "_bar123", "@@entity", "@city", "#intent", "$local", "my-var"],
    template => ["`hello`", "`hi ${name}`", "``", "`a ${`b ${c}`}`", "`cost \\$5`"],
    template_text => ["`hello`", "`$`", "`a$b`"],
    template_escape => ["`\\``", "`\\${x}`"],
    template_expr => ["`${x}`", "`${ a + b }`", "`${ {a: 1}.a }`"],
    call_op => ["foo()", "foo(1)", "concat('a', 'b', 'c')", "a.b.c(x)", "foo!(x)"],
    bang => ["foo!()", "isMatch!(x, 'y')"],
    lambda => ["foreach(items, x => x.value)", "where(list, item => item > 2)"],
    array => ["[]", "[1]", "[1, 2, 3]", "[[1], [2]]"],
    object => ["{}", "{a: 1}", "{'a b': 1, \"c\": 2}", "{a: {b: 1},}"],
    grouped => ["(1)", "(a + b) * c"],
    member_op => ["foo.bar", "a.b.c", "turn.activity.text"],
    index_op => ["arr[0]", "matrix[1][2]", "user['name']"],
    add => ["1 + 2", "a * (b + c)"],
    sub => ["1 - 2", "a - -b"],
    mul => ["1 * 2"],
    div => ["1 / 2"],
    modulo => ["5 % 2"],
    pow => ["2 ^ 3", "a ^ b ^ c"],
    concat => ["'a' & 'b'"],
    eq => ["a == b"],
    ne => ["a != b", "a <> b"],
    lt => ["a < b"],
    le => ["a <= b"],
    gt => ["a > b"],
    ge => ["a >= b"],
    and => ["a && b"],
    or => ["a || b"],
    neg => ["-1", "- a"],
    pos => ["+1"],
    not => ["!true", "!(a && b)"],
}

#[test]
fn invalid_inputs() {
    for input in ["1 +", "(1", "[1, 2", "{a 1}", "a..b", "a = b", "'a' 'b'", "foo(,)"] {
        assert!(
            ExpressionParser::parse(Rule::main, input).is_err(),
            "Expected '{}' to be rejected",
            input
        );
    }
}

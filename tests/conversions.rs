mod cases;

use serde_json::json;

const URL: &str = "https://example.com:8443/docs/index.html?lang=en&v=2#top";

test_case!(
    type_predicates,
    input: "[isString(hello), isString(one), isInteger(one), isInteger(1.5), isFloat(1.5), isFloat(one)]",
    value: Ok(json!([true, false, true, false, true, false])),
);

test_case!(
    collection_predicates,
    input: "[isArray(items), isArray(bag), isObject(bag), isObject(nullObj), isBoolean(flag), isBoolean(0)]",
    value: Ok(json!([true, false, true, false, true, false])),
);

test_case!(
    date_time_predicate,
    input: "[isDateTime('2018-03-15T13:00:00.000Z'), isDateTime('yesterday'), isDateTime(one)]",
    value: Ok(json!([true, false, false])),
);

test_case!(
    int_from_string,
    input: "int('  12 ') + 1",
    value: Ok(json!(13)),
);

test_case!(
    int_truncates_floats,
    input: "int(-2.9)",
    value: Ok(json!(-2)),
);

test_case!(
    int_from_bool,
    input: "int(flag)",
    value: Ok(json!(1)),
);

test_case!(
    int_rejects_words,
    input: "int(hello)",
    value: Err("parameter \"hello\" is not a valid number string."),
);

test_case!(
    float_from_string,
    input: "float('2.25') * 2",
    value: Ok(json!(4.5)),
);

test_case!(
    float_rejects_lists,
    input: "float(nums)",
    value: Err("parameter [1,2,3,4] is not a valid number string."),
);

test_case!(
    string_of_values,
    input: "[string(one), string(flag), string(nullObj), string(bag.set)]",
    value: Ok(json!(["1", "true", "", "{\"four\":4}"])),
);

test_case!(
    bool_uses_truthiness,
    input: "[bool(one), bool(0), bool('false'), bool(nullObj)]",
    value: Ok(json!([true, false, true, false])),
);

test_case!(
    json_parses_text,
    input: "json('{\"a\": [1, {\"b\": true}]}').a[1].b",
    value: Ok(json!(true)),
);

test_case!(
    json_passes_values_through,
    input: "json(bag.set)",
    value: Ok(json!({"four": 4})),
);

test_case!(
    json_stringify,
    input: "jsonStringify(bag.list)",
    value: Ok(json!("[\"red\",\"blue\"]")),
);

test_case!(
    base64_round_trip,
    input: "base64('hi there') & '|' & base64ToString('aGkgdGhlcmU=')",
    value: Ok(json!("aGkgdGhlcmU=|hi there")),
);

#[test]
fn base64_rejects_garbage() {
    let err = cases::run("base64ToString('***')", cases::default_memory()).unwrap_err();
    assert!(err.starts_with("*** is not valid base64"), "{err}");
}

test_case!(
    uri_component_round_trip,
    input: "uriComponentToString(uriComponent('a/b c?d=é'))",
    value: Ok(json!("a/b c?d=é")),
);

test_case!(
    uri_component_encodes_reserved,
    input: "uriComponent('a/b c')",
    value: Ok(json!("a%2Fb%20c")),
);

test_case!(
    uri_parts,
    input: "[uriScheme(url), uriHost(url), uriPort(url), uriPath(url), uriQuery(url), uriPathAndQuery(url)]",
    memory: json!({"url": URL}),
    value: Ok(json!(["https", "example.com", 8443, "/docs/index.html", "?lang=en&v=2", "/docs/index.html?lang=en&v=2"])),
);

test_case!(
    uri_default_port,
    input: "uriPort('http://example.com/x')",
    value: Ok(json!(80)),
);

test_case!(
    uri_relative_fails,
    input: "uriHost('/just/a/path')",
    value: Err("/just/a/path is not a valid absolute URI."),
);

test_case!(
    is_match_pattern,
    input: "isMatch('ab12', '^[a-z]+\\\\d+$')",
    value: Ok(json!(true)),
);

test_case!(
    is_match_case_insensitive_flag,
    input: "isMatch(toUpper(hello), '(?i)^hello$')",
    value: Ok(json!(true)),
);

test_case!(
    is_match_null_text,
    input: "isMatch(nullObj, '^$')",
    value: Ok(json!(true)),
);

test_case!(
    is_match_bad_constant_pattern,
    input: "isMatch(hello, '(')",
    parse_error: "P008",
);

#[test]
fn is_match_bad_runtime_pattern() {
    let err = cases::run("isMatch(hello, concat('(', ''))", cases::default_memory()).unwrap_err();
    assert!(err.starts_with("'(' is not a valid regular expression"), "{err}");
}

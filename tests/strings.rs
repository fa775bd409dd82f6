mod cases;

use serde_json::json;

test_case!(
    single_quoted,
    input: "'hello'",
    display: "'hello'",
    value: Ok(json!("hello")),
);

test_case!(
    double_quoted,
    input: "\"it's\"",
    display: "'it\\'s'",
    value: Ok(json!("it's")),
);

test_case!(
    escapes_resolve,
    input: r"'tab\there\nline'",
    value: Ok(json!("tab\there\nline")),
);

test_case!(
    unknown_escape_is_kept,
    input: r"'\d+'",
    value: Ok(json!("\\d+")),
);

test_case!(
    empty_string,
    input: "''",
    value: Ok(json!("")),
);

test_case!(
    concat_function,
    input: "concat(hello, ' ', world, '!')",
    display: "concat(hello, ' ', world, '!')",
    value: Ok(json!("hello world!")),
);

test_case!(
    concat_renders_collections_as_json,
    input: "concat('list: ', bag.list)",
    value: Ok(json!("list: [\"red\",\"blue\"]")),
);

test_case!(
    concat_of_lists_is_a_list,
    input: "concat(items, bag.list)",
    value: Ok(json!(["zero", "one", "two", "red", "blue"])),
);

test_case!(
    template_with_interpolation,
    input: "`${hello}, ${world}!`",
    display: "concat(hello, ', ', world, '!')",
    value: Ok(json!("hello, world!")),
);

test_case!(
    template_without_interpolation,
    input: "`just text`",
    display: "'just text'",
    value: Ok(json!("just text")),
);

test_case!(
    empty_template,
    input: "``",
    value: Ok(json!("")),
);

test_case!(
    template_with_expression,
    input: "`${one + two} items`",
    value: Ok(json!("3 items")),
);

test_case!(
    template_with_function_call,
    input: "`${toUpper(hello)} ${length(world)}`",
    value: Ok(json!("HELLO 5")),
);

test_case!(
    template_with_nested_template,
    input: "`outer ${`inner ${one}`}`",
    value: Ok(json!("outer inner 1")),
);

test_case!(
    template_with_object_literal,
    input: "`${ {a: 1}.a }`",
    value: Ok(json!("1")),
);

test_case!(
    template_escaped_dollar,
    input: r"`\${hello}`",
    value: Ok(json!("${hello}")),
);

test_case!(
    template_escaped_backtick,
    input: r"`a\`b`",
    value: Ok(json!("a`b")),
);

test_case!(
    template_keeps_newlines,
    input: "`a\nb`",
    value: Ok(json!("a\nb")),
);

test_case!(
    template_with_null,
    input: "`[${nullObj}]`",
    value: Ok(json!("[]")),
);

test_case!(
    template_with_quotes_inside,
    input: "`say '${hello}'`",
    value: Ok(json!("say 'hello'")),
);

test_case!(
    length_counts_characters,
    input: "length('naïve')",
    value: Ok(json!(5)),
);

test_case!(
    length_of_number_fails_to_parse,
    input: "length(42)",
    parse_error: "P008",
    message: "42 is not a STRING expression in length(42).",
);

test_case!(
    replace_all_occurrences,
    input: "replace('a-b-c', '-', '+')",
    value: Ok(json!("a+b+c")),
);

test_case!(
    split_on_separator,
    input: "split('a b c', ' ')",
    value: Ok(json!(["a", "b", "c"])),
);

test_case!(
    substring_by_range,
    input: "substring(hello, 1, 3)",
    value: Ok(json!("ell")),
);

test_case!(
    substring_out_of_range,
    input: "substring(hello, 2, 4)",
    value: Err("4=4 which is out of range for hello."),
);

test_case!(
    title_case,
    input: "titleCase('the old man')",
    value: Ok(json!("The Old Man")),
);

test_case!(
    trim_and_upper,
    input: "toUpper(trim('  x  '))",
    value: Ok(json!("X")),
);

test_case!(
    starts_and_ends_with,
    input: "startsWith(hello, 'he') && endsWith(world, 'ld')",
    value: Ok(json!(true)),
);

test_case!(
    index_of_missing,
    input: "indexOf(hello, 'z')",
    value: Ok(json!(-1)),
);

test_case!(
    reverse_string,
    input: "reverse('abc')",
    value: Ok(json!("cba")),
);

test_case!(
    reverse_rejects_numbers,
    input: "reverse(one)",
    value: Err("1 is not a string or list."),
);

test_case!(
    add_ordinal,
    input: "addOrdinal(one) & ' ' & addOrdinal(two) & ' ' & addOrdinal(13)",
    value: Ok(json!("1st 2nd 13th")),
);

test_case!(
    format_number_groups_thousands,
    input: "formatNumber(1234567.891, 2)",
    value: Ok(json!("1,234,567.89")),
);

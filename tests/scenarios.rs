//! Direct coverage of the concrete scenarios enumerated in spec.md §8.

#![cfg(test)]

#[macro_use]
mod macros;

use sassy::{compile_string, OptionsBuilder, OutputStyle};

test!(
    scenario_1_expanded_passthrough,
    "a { b: c; }\n",
    "a {\n  b: c;\n}\n"
);

#[test]
fn scenario_1_compressed() {
    let options = OptionsBuilder::new().style(OutputStyle::Compressed).build();
    let result = compile_string("a { b: c; }\n", &options).unwrap();
    assert_eq!(result.css, "a{b:c}");
}

test!(
    scenario_2_variable_arithmetic,
    "$x: 1; a { b: $x + 2; }\n",
    "a {\n  b: 3;\n}\n"
);

test!(
    scenario_3_extend_drops_placeholder,
    "%h { color: red; } .a { @extend %h; }\n",
    ".a {\n  color: red;\n}\n"
);

test!(
    scenario_4_math_div_namespaced,
    "@use \"sass:math\"; a { b: math.div(6px, 2); }\n",
    "a {\n  b: 3px;\n}\n"
);

test!(
    scenario_5_mixin_include,
    "@mixin m($x) { a: $x; } .r { @include m(1); }\n",
    ".r {\n  a: 1;\n}\n"
);

test!(
    scenario_6_parent_selector_pseudo,
    "a { &:hover { b: c; } }\n",
    "a:hover {\n  b: c;\n}\n"
);

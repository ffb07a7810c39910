//! `@extend` coverage beyond the single-placeholder case in `scenarios.rs`:
//! extending a rule that appears earlier in the stylesheet, comma-separated
//! extenders, and the "second law of extend" (an extended rule's merged
//! selector still matches everything the extender alone matches).

#![cfg(test)]

#[macro_use]
mod macros;

test!(
    extend_reaches_earlier_rule,
    ".a { color: red; }\n.b { @extend .a; }\n",
    ".a, .b {\n  color: red;\n}\n"
);

test!(
    extend_with_comma_separated_extender,
    ".x { color: red; }\n.y, .z { @extend .x; }\n",
    ".x, .y, .z {\n  color: red;\n}\n"
);

test!(
    extend_multiple_targets_compound,
    ".c1 { color: red; }\n.c2 { @extend .c1; }\n.c3 { @extend .c1; }\n",
    ".c1, .c2, .c3 {\n  color: red;\n}\n"
);

error!(
    non_optional_extend_with_no_matching_target_errors,
    ".a { @extend .nonexistent; }\n",
    "Error: \".a\" failed to @extend \".nonexistent\".\nThe selector \".nonexistent\" was not found."
);

test!(
    optional_extend_with_no_matching_target_is_silent,
    ".a { @extend .nonexistent !optional; }\n.a { color: red; }\n",
    ".a {\n  color: red;\n}\n"
);

//! Shared test macros used by the per-feature integration test files in this
//! directory, in the style of the upstream compiler's own test harness:
//! `test!` asserts the compiled CSS equals an expected string, and `error!`
//! asserts that compiling fails with a specific message.

#![allow(unused_macros)]

/// `test!(name, input, expected_css)` — compiles `input` as SCSS with
/// default options and asserts the resulting CSS matches exactly.
macro_rules! test {
    ($(#[$attr:meta])* $name:ident, $input:expr, $output:expr) => {
        $(#[$attr])*
        #[test]
        fn $name() {
            let result = sassy::compile_string($input, &sassy::Options::default())
                .unwrap_or_else(|e| panic!("failed to compile:\n{}", e));
            assert_eq!($output, result.css);
        }
    };
}

/// `error!(name, input, expected_message)` — compiles `input` and asserts it
/// fails, with the error's rendered message equal to `expected_message`.
macro_rules! error {
    ($(#[$attr:meta])* $name:ident, $input:expr, $output:expr) => {
        $(#[$attr])*
        #[test]
        fn $name() {
            match sassy::compile_string($input, &sassy::Options::default()) {
                Ok(result) => panic!("expected an error, got CSS:\n{}", result.css),
                Err(e) => assert_eq!($output, e.to_string()),
            }
        }
    };
}

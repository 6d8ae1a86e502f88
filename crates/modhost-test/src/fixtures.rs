//! Canned module scripts.

/// One function, no module documentation.
pub const GREET_NO_DOC: &str = r#"fn greet() {
    "hello"
}
"#;

/// `greet` prints `hi` and returns 42.
pub const GREET_PRINTS_42: &str = r#"fn greet() {
    print("hi");
    42
}
"#;

/// Documented module with an overload, a private helper and an internal
/// `__` function.
pub const DOCUMENTED: &str = r#"//! String utilities.
//!
//! Used by the integration tests.

fn shout(text) {
    normalize(text).to_upper()
}

fn shout(text, times) {
    let out = "";
    for i in 0..times {
        out += shout(text);
    }
    out
}

fn __version() {
    "1.0"
}

private fn normalize(text) {
    text.trim();
    text
}
"#;

/// `boom` prints a line and then throws.
pub const FAILING: &str = r#"fn boom() {
    print("about to fail");
    throw "boom failed";
}

fn fine() {
    print("fine");
    true
}
"#;

/// Does not parse.
pub const SYNTAX_ERROR: &str = "fn broken( {\n    1\n";

/// Top-level statement throws while the module initializes.
pub const INIT_ERROR: &str = r#"throw "cannot initialize";

fn never() {
    1
}
"#;

/// `echo` returns its positional argument and keyword map together.
pub const KWARGS_ECHO: &str = r#"fn echo(value, opts) {
    #{ value: value, opts: opts }
}

fn greet(name, opts) {
    let greeting = if "greeting" in opts { opts.greeting } else { "Hello" };
    `${greeting}, ${name}!`
}
"#;

/// Several functions with arguments, for introspection tests.
pub const MATH: &str = r#"//! Arithmetic helpers.

fn add(a, b) {
    a + b
}

fn mul(a, b) {
    a * b
}

fn mean(values) {
    let total = 0.0;
    for v in values {
        total += v;
    }
    total / values.len()
}
"#;

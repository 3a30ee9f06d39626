use archconf_parse::parse_str;

#[test]
fn rule_line_is_error() {
    let err = parse_str("arch.h", "FC = ifx\nall: main.o\n")
        .unwrap_err()
        .to_string();
    assert!(err.starts_with("arch.h:2:"), "{err}");
    assert!(err.contains("rules are not supported"), "{err}");
}

#[test]
fn conditional_directive_is_error() {
    let err = parse_str("<mem>", "ifeq ($(CC),icc)\nFC = ifx\nendif\n")
        .unwrap_err()
        .to_string();
    assert!(err.contains("unsupported directive 'ifeq'"), "{err}");
}

#[test]
fn missing_operator_is_error() {
    let err = parse_str("<mem>", "FC mpiifx").unwrap_err().to_string();
    assert!(err.contains("expected assignment operator after 'FC'"), "{err}");
}

#[test]
fn make_function_in_value_is_error() {
    let err = parse_str("<mem>", "NC_LIB = $(shell nc-config --flibs)")
        .unwrap_err()
        .to_string();
    assert!(err.contains("in value of NC_LIB"), "{err}");
}

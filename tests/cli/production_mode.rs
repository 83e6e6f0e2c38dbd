//! Without `--dev`, sources and translation data are never written; a file
//! that still needs justification only ever surfaces as a diagnostic.

use crate::CliTest;

#[test]
fn already_justified_source_compiles_without_any_writes() {
    let test = CliTest::new().unwrap();
    test.write_config(r#","prefix":"app.","localize":{"div":{"content":"text"}}"#)
        .unwrap();
    test.write_file("src/about.html", r#"<div t="app.about.t0">Hello</div>"#)
        .unwrap();

    let output = test.run(&["--no-watch"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let unchanged = test.read_file("src/about.html").unwrap();
    assert_eq!(unchanged, r#"<div t="app.about.t0">Hello</div>"#);
    assert!(!test.file_exists("i18n.json"), "production mode must not write translation data");

    let en_locale = test.read_file("locales/en.json").unwrap();
    assert_eq!(en_locale, r#"{"app":{"about":{"t0":"Hello"}}}"#);
}

#[test]
fn unjustified_source_warns_by_default_and_exits_clean() {
    let test = CliTest::new().unwrap();
    test.write_config(r#","prefix":"app.","localize":{"div":{"content":"text"}}"#)
        .unwrap();
    test.write_file("src/about.html", "<div>Hello</div>").unwrap();

    let output = test.run(&["--no-watch"]);
    assert!(output.status.success());

    let unchanged = test.read_file("src/about.html").unwrap();
    assert_eq!(unchanged, "<div>Hello</div>");
    assert!(!test.file_exists("i18n.json"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("modified-source"));
}

#[test]
fn unjustified_source_fails_the_run_when_configured_as_error() {
    let test = CliTest::new().unwrap();
    test.write_config(
        r#","prefix":"app.","localize":{"div":{"content":"text"}},"diagnostics":{"modified-source":"error"}"#,
    )
    .unwrap();
    test.write_file("src/about.html", "<div>Hello</div>").unwrap();

    let output = test.run(&["--no-watch"]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn missing_translation_is_diagnosed_for_secondary_locale() {
    let test = CliTest::new().unwrap();
    test.write_config(
        r#","prefix":"app.","localize":{"div":{"content":"text"}},"diagnostics":{"missing-translation":"error"}"#,
    )
    .unwrap();
    test.write_file("src/about.html", r#"<div t="app.about.t0">Hello</div>"#)
        .unwrap();

    let output = test.run(&["--no-watch"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing-translation"));
}

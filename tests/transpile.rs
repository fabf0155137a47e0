use libsass_bridge::{
    sass_to_scss, ErrorCode, Options, OutputStyle, ResolvedImport, TranspileError, Transpiler,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

const NESTED_RULE: &str = "div { p { color: #ccc; } }";

fn transpiler(options: Options) -> Transpiler {
    Transpiler::new(options).unwrap()
}

fn compressed() -> Options {
    Options::new().with_output_style(OutputStyle::Compressed)
}

#[test]
fn test_compressed_output() {
    let output = transpiler(compressed()).transpile(NESTED_RULE).unwrap();
    assert_eq!(output.css, "div p{color:#ccc}\n");
    assert!(output.source_map_content.is_none());
}

#[test]
fn test_output_is_deterministic() {
    let transpiler = transpiler(compressed().with_precision(5));
    let source = "a { width: (10px / 3); }";
    let first = transpiler.transpile(source).unwrap();
    let second = transpiler.transpile(source).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_zero_precision_keeps_default() {
    let source = "a { b: (1 / 3); }";
    let default = transpiler(compressed()).transpile(source).unwrap();
    let zero = transpiler(compressed().with_precision(0))
        .transpile(source)
        .unwrap();

    assert_eq!(zero.css, default.css);
    assert_ne!(zero.css, "a{b:0}\n");
}

#[test]
fn test_resolver_supplies_body() {
    let options = Options::new().with_import_resolver(|url, _| {
        Ok(Some(ResolvedImport::path(url).with_body("$white: #fff")))
    });

    let output = transpiler(options)
        .transpile(r#"@import "colors"; div { p { color: $white; } }"#)
        .unwrap();
    assert_eq!(output.css, "div p {\n  color: #fff; }\n");
}

#[test]
fn test_styles_differ() {
    let outputs: Vec<String> = OutputStyle::ALL
        .iter()
        .map(|style| {
            transpiler(Options::new().with_output_style(*style))
                .transpile(NESTED_RULE)
                .unwrap()
                .css
        })
        .collect();

    let distinct: HashSet<_> = outputs.iter().collect();
    assert_eq!(distinct.len(), OutputStyle::ALL.len());
    for css in &outputs {
        assert!(css.contains("div p"));
        assert!(css.contains("color:"));
        assert!(css.contains("#ccc"));
    }
}

#[test]
fn test_indented_syntax_matches_scss() {
    let sass = "\n$color: #333;\n\n.content-navigation\n  border-color: $color\n";
    let scss = "$color: #333;\n.content-navigation { border-color: $color; }";

    let from_sass = transpiler(compressed().with_sass_syntax(true))
        .transpile(sass)
        .unwrap();
    let from_scss = transpiler(compressed()).transpile(scss).unwrap();

    assert_eq!(from_sass.css, ".content-navigation{border-color:#333}\n");
    assert_eq!(from_sass.css, from_scss.css);

    let converted = sass_to_scss(sass).unwrap();
    let from_converted = transpiler(compressed()).transpile(&converted).unwrap();
    assert_eq!(from_converted.css, from_sass.css);
}

#[test]
fn test_declined_import_uses_include_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("_colors.scss"), "$c: red;").unwrap();

    let options = compressed()
        .with_include_path(dir.path())
        .with_import_resolver(|_, _| Ok(None));

    let output = transpiler(options)
        .transpile(r#"@import "colors"; a { color: $c; }"#)
        .unwrap();
    assert_eq!(output.css, "a{color:red}\n");
}

#[test]
fn test_failing_resolver_uses_include_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("_colors.scss"), "$c: red;").unwrap();

    let options = compressed()
        .with_include_path(dir.path())
        .with_import_resolver(|url, _| Err(anyhow::anyhow!("cannot resolve {}", url)));

    let output = transpiler(options)
        .transpile(r#"@import "colors"; a { color: $c; }"#)
        .unwrap();
    assert_eq!(output.css, "a{color:red}\n");
}

#[test]
fn test_panicking_resolver_uses_include_paths() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("_colors.scss"), "$c: red;").unwrap();

    let options = compressed()
        .with_include_path(dir.path())
        .with_import_resolver(|_, _| panic!("resolver bug"));

    let output = transpiler(options)
        .transpile(r#"@import "colors"; a { color: $c; }"#)
        .unwrap();
    assert_eq!(output.css, "a{color:red}\n");
}

#[test]
fn test_missing_import_fails() {
    let transpiler = transpiler(compressed());
    let err = transpiler
        .transpile(r#"@import "does-not-exist"; a { b: c; }"#)
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Compilation);
    let sass = err.sass_error().unwrap();
    assert_ne!(sass.status, 0);
    assert!(sass.message.contains("does-not-exist"), "{}", sass.message);
    assert_eq!(transpiler.stats().failed_transpiles, 1);
}

#[test]
fn test_resolver_takes_precedence_over_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("_colors.scss"), "$c: red;").unwrap();

    let options = compressed()
        .with_include_path(dir.path())
        .with_import_resolver(|url, _| Ok(Some(ResolvedImport::path(url).with_body("$c: blue;"))));

    let output = transpiler(options)
        .transpile(r#"@import "colors"; a { color: $c; }"#)
        .unwrap();
    assert_eq!(output.css, "a{color:blue}\n");
}

#[test]
fn test_resolver_redirects_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("_colors.scss"), "$c: green;").unwrap();

    let options = compressed()
        .with_include_path(dir.path())
        .with_import_resolver(|url, _| {
            Ok((url == "theme").then(|| ResolvedImport::path("colors").with_body("")))
        });

    let output = transpiler(options)
        .transpile(r#"@import "theme"; a { color: $c; }"#)
        .unwrap();
    assert_eq!(output.css, "a{color:green}\n");
}

#[test]
fn test_resolver_sees_import_and_parent() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);

    let options = compressed().with_import_resolver(move |url, prev| {
        record.lock().push((url.to_string(), prev.to_string()));
        Ok(Some(ResolvedImport::path(url).with_body("$c: red;")))
    });

    transpiler(options)
        .transpile(r#"@import "colors"; a { color: $c; }"#)
        .unwrap();

    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "colors");
    assert_eq!(seen[0].1, "stdin");
}

#[test]
fn test_nested_import_sees_importing_file() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let record = Arc::clone(&seen);

    let options = compressed().with_import_resolver(move |url, prev| {
        record.lock().push((url.to_string(), prev.to_string()));
        let body = match url {
            "a" => "@import \"b\";",
            _ => "$c: red;",
        };
        Ok(Some(ResolvedImport::path(url).with_body(body)))
    });

    let output = transpiler(options)
        .transpile(r#"@import "a"; x { color: $c; }"#)
        .unwrap();
    assert_eq!(output.css, "x{color:red}\n");

    let seen = seen.lock();
    assert_eq!(
        *seen,
        vec![
            ("a".to_string(), "stdin".to_string()),
            ("b".to_string(), "a".to_string()),
        ]
    );
}

#[test]
fn test_source_map() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("_colors.scss"), "\n$moo:       #f442d1 !default;\n").unwrap();

    let options = Options::new()
        .with_include_path(dir.path())
        .with_source_map_contents(true)
        .with_source_map_filename("source.map")
        .with_output_path("outout.css")
        .with_input_path("input.scss")
        .with_source_map_root("/my/root");

    let output = transpiler(options)
        .transpile("\n@import \"colors\";\n\ndiv { p { color: $moo; } }")
        .unwrap();

    assert_eq!(
        output.css,
        "div p {\n  color: #f442d1; }\n\n/*# sourceMappingURL=source.map */"
    );
    assert_eq!(output.source_map_filename.as_deref(), Some("source.map"));

    let map: serde_json::Value =
        serde_json::from_str(output.source_map_content.as_deref().unwrap()).unwrap();
    assert_eq!(map["sourceRoot"], "/my/root");
    assert_eq!(map["file"], "outout.css");
    assert_eq!(map["mappings"], "AAGA,AAAM,GAAH,CAAG,CAAC,CAAC;EAAE,KAAK,ECFH,OAAO,GDEM");
    assert!(map["sources"]
        .as_array()
        .unwrap()
        .iter()
        .any(|source| source == "input.scss"));
    assert!(map["sourcesContent"].is_array());
}

#[test]
fn test_omitted_source_map_url() {
    let options = compressed()
        .with_source_map_filename("out.css.map")
        .with_omit_source_map_url(true);

    let output = transpiler(options).transpile(NESTED_RULE).unwrap();
    assert_eq!(output.css, "div p{color:#ccc}\n");
    assert!(output.has_source_map());
}

#[test]
fn test_undefined_variable_error() {
    let err = transpiler(Options::new())
        .transpile("\n\ndiv { color: $blue; }")
        .unwrap_err();

    let sass = err.sass_error().unwrap();
    assert_eq!(sass.status, 1);
    assert_eq!(sass.file, "stdin");
    assert_eq!(sass.line, 3);
    assert!(sass.column > 0);
    assert!(sass.message.contains("$blue"), "{}", sass.message);
    assert!(err.to_string().starts_with("file \"stdin\", line 3, col "));
}

#[test]
fn test_parallel_resolvers_do_not_cross_talk() {
    const SESSIONS: usize = 10;
    const ITERATIONS: usize = 10;

    let marker = Arc::new(());

    std::thread::scope(|s| {
        for i in 0..SESSIONS {
            let held = Arc::clone(&marker);
            s.spawn(move || {
                let options = compressed().with_import_resolver(move |url, _| {
                    let _held = &held;
                    Ok(Some(ResolvedImport::path(url).with_body(format!("$w: {}px;", i))))
                });
                let transpiler = transpiler(options);

                for _ in 0..ITERATIONS {
                    let output = transpiler
                        .transpile(r#"@import "width"; div { width: $w; }"#)
                        .unwrap();
                    assert_eq!(output.css, format!("div{{width:{}px}}\n", i));
                }

                let stats = transpiler.stats();
                assert_eq!(stats.successful_transpiles, ITERATIONS as u64);
                assert_eq!(stats.import_calls, ITERATIONS as u64);
            });
        }
    });

    // Every registration was released with its session.
    assert_eq!(Arc::strong_count(&marker), 1);
}

#[test]
fn test_transpile_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let css_path = dir.path().join("out.css");

    let file = fs::File::create(&css_path).unwrap();
    transpiler(compressed())
        .transpile_to(file, NESTED_RULE.as_bytes())
        .unwrap();

    assert_eq!(fs::read_to_string(&css_path).unwrap(), "div p{color:#ccc}\n");
}

#[test]
fn test_nul_in_source_rejected() {
    let err = transpiler(compressed()).transpile("a { b: c; }\0").unwrap_err();
    assert!(matches!(err, TranspileError::InvalidInput(_)));
    assert_eq!(err.code(), ErrorCode::InvalidInput);
}

#[test]
fn test_options_from_json() {
    let options = Options::from_json(r#"{"outputStyle":"compressed","precision":3}"#).unwrap();
    let output = transpiler(options).transpile("a { b: (1 / 3); }").unwrap();
    assert_eq!(output.css, "a{b:.333}\n");
}

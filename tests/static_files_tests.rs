use roster::static_files::StaticFiles;

#[test]
fn test_js_bundle() {
    let sf = StaticFiles::new("tests/staticdata");
    let (bytes, ct) = sf.load("bundle.js").unwrap();
    assert_eq!(ct, "application/javascript");
    assert_eq!(String::from_utf8(bytes).unwrap(), "console.log('bundled');\n");
}

#[test]
fn test_nested_file() {
    let sf = StaticFiles::new("tests/staticdata");
    let (bytes, ct) = sf.load("/css/site.css").unwrap();
    assert_eq!(ct, "text/css");
    assert_eq!(String::from_utf8(bytes).unwrap(), "body { margin: 0; }\n");
}

#[test]
fn test_traversal_prevented() {
    let sf = StaticFiles::new("tests/staticdata");
    assert!(sf.load("../Cargo.toml").is_err());
    assert!(sf.load("..\\Cargo.toml").is_err());
    assert!(sf.load("css/../../Cargo.toml").is_err());
}

#[test]
fn test_missing_file() {
    let sf = StaticFiles::new("tests/staticdata");
    let err = sf.load("nope.txt").unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_bundled_stylesheet() {
    let sf = StaticFiles::new("public");
    let (bytes, ct) = sf.load("style.css").unwrap();
    assert_eq!(ct, "text/css");
    assert!(String::from_utf8(bytes).unwrap().contains("ul.users"));
}

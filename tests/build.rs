use blogroll::build::{build_site, Error};
use blogroll::config::Config;
use std::fs;
use std::path::Path;

const PROJECT: &str = "site_root: https://example.org/blog\n\
title: Example Blog\n\
author:\n  name: Jo Example\n\
copyright: 2024-2026, Jo Example\n\
static_directory: static\n";

const INDEX: &str = "# Home\n\n\
## Recent\n\n\
```{blogrecent}\n```\n\n\
## Archive\n\n\
```{blogarchive}\n```\n";

const TAGS: &str = "# Tags\n\n```{blogtags}\n```\n";

fn write(dir: &Path, relative: &str, contents: &str) -> std::io::Result<()> {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

fn post(title: &str, date: &str, tags: &str) -> String {
    format!(
        "# {}\n\n```{{blogpost}} {}\n:tags: {}\n```\n\nBody of {}.\n",
        title, date, tags, title
    )
}

fn project() -> std::io::Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "blogroll.yaml", PROJECT)?;
    write(dir.path(), "content/index.md", INDEX)?;
    write(dir.path(), "content/tags.md", TAGS)?;
    write(
        dir.path(),
        "content/2024/12/dec.md",
        &post("December", "2024-12-01", "nixos"),
    )?;
    write(
        dir.path(),
        "content/2025/01/jan-a.md",
        &post("January A", "2025-01-10", "nixos, router"),
    )?;
    write(
        dir.path(),
        "content/2025/01/jan-b.md",
        &post("January B", "2025-01-10", ""),
    )?;
    write(dir.path(), "static/site.css", "body {}")?;
    Ok(dir)
}

fn build(project: &Path) -> Result<std::path::PathBuf, Error> {
    let output = project.join("_build");
    let config = Config::from_directory(project, &output, Some(2))?;
    build_site(&config)?;
    Ok(output)
}

fn position(haystack: &str, needle: &str) -> usize {
    match haystack.find(needle) {
        Some(i) => i,
        None => panic!("`{}` not found in:\n{}", needle, haystack),
    }
}

#[test]
fn test_build_site() -> Result<(), Error> {
    let dir = project()?;
    let output = build(dir.path())?;

    let index = fs::read_to_string(output.join("index.html"))?;
    let jan_a = position(&index, "January A</a>");
    let jan_b = position(&index, "January B</a>");
    let dec = position(&index, "December</a>");
    assert!(jan_a < jan_b && jan_b < dec, "{}", index);
    assert!(index.contains("href=\"2025/01/jan-a.html\""), "{}", index);
    assert!(index.contains("2025-01-10 <a"), "{}", index);
    assert!(
        position(&index, "id=\"year-2025\"") < position(&index, "id=\"year-2024\""),
        "{}",
        index
    );
    assert!(!index.contains("blogrecent"), "{}", index);

    let tags = fs::read_to_string(output.join("tags.html"))?;
    assert!(
        position(&tags, "id=\"tag-nixos\"") < position(&tags, "id=\"tag-router\""),
        "{}",
        tags
    );
    assert!(!tags.contains("January B</a>"), "{}", tags);

    let post = fs::read_to_string(output.join("2025/01/jan-a.html"))?;
    assert!(post.contains("Body of January A."), "{}", post);
    let href = "../../tags.html#tag-router";
    assert!(post.contains(&format!("href=\"{}\"", href)), "{}", post);
    let (page, anchor) = href.split_at(position(href, "#"));
    assert!(output.join("2025/01").join(page).is_file());
    assert!(tags.contains(&format!("id=\"{}\"", &anchor[1..])), "{}", tags);
    assert!(post.contains("../../index.html"), "{}", post);

    assert_eq!("body {}", fs::read_to_string(output.join("site.css"))?);

    let feed = fs::read_to_string(output.join("atom.xml"))?;
    let dec = position(&feed, "https://example.org/blog/2024/12/dec.html");
    let jan_a = position(&feed, "https://example.org/blog/2025/01/jan-a.html");
    let jan_b = position(&feed, "https://example.org/blog/2025/01/jan-b.html");
    assert!(dec < jan_a && jan_a < jan_b, "{}", feed);
    assert!(
        feed.contains("<updated>2025-01-10T00:00:00-08:00</updated>"),
        "{}",
        feed
    );
    Ok(())
}

#[test]
fn test_malformed_date_fails_without_output() -> Result<(), Error> {
    let dir = project()?;
    write(
        dir.path(),
        "content/2025/02/bad.md",
        &post("Bad", "2025-13-40", ""),
    )?;

    match build(dir.path()) {
        Err(err @ Error::Index(_)) => assert!(err.to_string().contains("2025-13-40"), "{}", err),
        Err(err) => panic!("wanted an index error; found {}", err),
        Ok(_) => panic!("wanted an index error; the build succeeded"),
    }
    assert!(!dir.path().join("_build/atom.xml").exists());
    assert!(!dir.path().join("_build/index.html").exists());
    Ok(())
}

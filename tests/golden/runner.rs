use linktitles_core::{Config, LinkEngine, MemoryProvider, PageTitle, Source};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct GoldenCase {
    name: String,
    before: String,
    after: String,
    fixture: Fixture,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixture {
    #[serde(default = "default_source")]
    source: FixturePage,
    #[serde(default)]
    config: Option<Config>,
    pages: Vec<FixturePage>,
    /// Link targets in insertion order.
    expected_links: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixturePage {
    #[serde(default)]
    namespace: i32,
    title: String,
    #[serde(default)]
    text: String,
}

fn default_source() -> FixturePage {
    FixturePage { namespace: 0, title: "Golden source".to_owned(), text: String::new() }
}

#[test]
fn link_golden_cases() {
    let cases_dir = golden_cases_dir();
    let cases = load_cases(&cases_dir);

    assert!(
        !cases.is_empty(),
        "no golden cases found in {}",
        cases_dir.display()
    );

    let mut failures = Vec::new();
    for case in cases {
        if let Err(message) = run_case(&case) {
            failures.push(message);
        }
    }

    if !failures.is_empty() {
        panic!(
            "{} golden case(s) failed:\n\n{}",
            failures.len(),
            failures.join("\n\n")
        );
    }
}

fn golden_cases_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../tests/golden/cases")
}

fn load_cases(cases_dir: &Path) -> Vec<GoldenCase> {
    let mut case_dirs: Vec<PathBuf> = fs::read_dir(cases_dir)
        .unwrap_or_else(|error| panic!("failed to read {}: {error}", cases_dir.display()))
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if path.is_dir() { Some(path) } else { None }
        })
        .collect();
    case_dirs.sort();
    case_dirs.into_iter().map(load_case).collect()
}

fn load_case(case_dir: PathBuf) -> GoldenCase {
    let name = case_dir
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or("<unnamed-case>")
        .to_owned();

    let before_path = case_dir.join("before.wiki");
    let after_path = case_dir.join("after.wiki");
    let fixture_path = case_dir.join("titles.json");

    let before = read_required(&before_path);
    let after = read_required(&after_path);
    let fixture = serde_json::from_str::<Fixture>(&read_required(&fixture_path))
        .unwrap_or_else(|error| {
            panic!("failed to parse fixture in {}: {error}", fixture_path.display())
        });

    GoldenCase { name, before, after, fixture }
}

fn run_case(case: &GoldenCase) -> Result<(), String> {
    let config = case.fixture.config.clone().unwrap_or_default();
    let mut provider = MemoryProvider::new();
    for page in &case.fixture.pages {
        let title = page_title(&case.name, page)?;
        provider.insert(title, page.text.as_str());
    }
    let source_title = page_title(&case.name, &case.fixture.source)?;

    let engine = LinkEngine::new(&config, &provider)
        .map_err(|error| format!("case `{}` engine setup failed: {error}", case.name))?;
    let mut source = Source::from_text(source_title, case.before.as_str());
    let linked = engine
        .link_with_report(&mut source)
        .map_err(|error| format!("case `{}` linking failed: {error}", case.name))?;

    let (actual_after, actual_links) = match linked {
        Some(linked) => {
            let links: Vec<String> =
                linked.insertions.iter().map(|insertion| insertion.target.to_string()).collect();
            (linked.text, links)
        }
        None => (case.before.clone(), Vec::new()),
    };

    if actual_after != case.after {
        return Err(format!(
            "case `{}` final text mismatch.\nexpected: {:?}\nactual:   {:?}",
            case.name, case.after, actual_after
        ));
    }

    if actual_links != case.fixture.expected_links {
        return Err(format_links_mismatch(&case.name, &case.fixture.expected_links, &actual_links));
    }

    Ok(())
}

fn page_title(case_name: &str, page: &FixturePage) -> Result<PageTitle, String> {
    PageTitle::new(page.namespace, &page.title)
        .map_err(|error| format!("case `{case_name}` has invalid title {:?}: {error}", page.title))
}

fn format_links_mismatch(case_name: &str, expected: &[String], actual: &[String]) -> String {
    let max_len = expected.len().max(actual.len());

    let mut diff_lines = Vec::with_capacity(max_len);
    for index in 0..max_len {
        let expected_line = expected.get(index).map(String::as_str).unwrap_or("<none>");
        let actual_line = actual.get(index).map(String::as_str).unwrap_or("<none>");
        let marker = if expected_line == actual_line { " " } else { "!" };
        diff_lines.push(format!(
            "{marker} [{index}] expected: {expected_line}\n      actual:   {actual_line}"
        ));
    }

    format!("case `{case_name}` inserted links mismatch.\n{}", diff_lines.join("\n"))
}

fn read_required(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|error| panic!("failed to read {}: {error}", path.display()))
}

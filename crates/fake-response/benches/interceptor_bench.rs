use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fake_response::matcher::parse_query_string;
use fake_response::predicate::{PredicateOptions, QueryPredicateConfig, StringMatcher};
use fake_response::{Rule, RuleBuilder};
use hyper::header::HeaderValue;
use hyper::{HeaderMap, StatusCode, Uri};

fn create_test_rule(id: usize) -> Rule {
    RuleBuilder::new()
        .named(format!("rule-{id}"))
        .for_header("X-Fake-Response", format!("scenario-{id}"))
        .for_path(format!("/api/v1/endpoint{id}"))
        .return_status(StatusCode::SERVICE_UNAVAILABLE)
        .return_content("unavailable")
        .build()
}

fn create_query_rule(id: usize) -> Rule {
    let predicate = QueryPredicateConfig {
        name: "id".to_string(),
        matcher: StringMatcher::Matches(r"^\d+$".to_string()),
        options: PredicateOptions::default(),
    }
    .compile()
    .unwrap();

    RuleBuilder::new()
        .for_header("X-Fake-Response", format!("scenario-{id}"))
        .for_query_parameter("q", "*")
        .for_query_predicate("id", move |v: &str| predicate(v))
        .build()
}

fn inbound(scenario: usize) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-fake-response",
        HeaderValue::from_str(&format!("scenario-{scenario}")).unwrap(),
    );
    headers
}

fn find<'a>(rules: &'a [Rule], headers: &HeaderMap, uri: &Uri) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule.matches(headers, Some(uri)))
}

fn bench_rule_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_matching");

    for rule_count in [10, 50, 100, 500].iter() {
        let rules: Vec<Rule> = (0..*rule_count).map(create_test_rule).collect();

        let last = rule_count - 1;
        let headers_last = inbound(last);
        let uri_last: Uri = format!("/api/v1/endpoint{last}").parse().unwrap();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("match_last", rule_count),
            rule_count,
            |b, _| {
                b.iter(|| find(black_box(&rules), black_box(&headers_last), black_box(&uri_last)));
            },
        );

        // no header at all: every rule fails on its first check
        let empty = HeaderMap::new();
        group.bench_with_input(
            BenchmarkId::new("match_none", rule_count),
            rule_count,
            |b, _| {
                b.iter(|| find(black_box(&rules), black_box(&empty), black_box(&uri_last)));
            },
        );
    }

    group.finish();
}

fn bench_query_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_matching");

    let rule = create_query_rule(0);
    let headers = inbound(0);
    let uri: Uri = "/search?q=rust+lang&id=42&page=3".parse().unwrap();

    group.throughput(Throughput::Elements(1));
    group.bench_function("single_rule", |b| {
        b.iter(|| rule.matches(black_box(&headers), black_box(Some(&uri))));
    });

    group.bench_function("parse_query_string", |b| {
        b.iter(|| parse_query_string(black_box("q=rust+lang&id=42&page=3&tag=a&tag=b")));
    });

    group.finish();
}

criterion_group!(benches, bench_rule_matching, bench_query_matching);
criterion_main!(benches);

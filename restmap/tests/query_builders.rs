use restmap::{sort_params, start_offset, ListQuery, Mapping, SortBy, SortDirection};
use serde_json::json;

fn value_of<'a>(query: &'a [(String, String)], name: &str) -> Vec<&'a str> {
    query
        .iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .collect()
}

#[test]
fn sort_prefix_selects_direction() {
    let desc = sort_params(Some("-updated"));
    assert_eq!(
        desc,
        vec![
            ("orderBy".to_string(), "updated".to_string()),
            ("sortOrder".to_string(), "DESC".to_string()),
        ]
    );

    let asc: SortBy = "updated".parse().unwrap();
    assert_eq!(asc.direction, SortDirection::Asc);
    assert_eq!(SortDirection::default(), SortDirection::Asc);
}

#[test]
fn start_is_page_times_limit() {
    for (page, limit, expected) in [(1, 20, 0), (2, 20, 20), (5, 7, 28)] {
        assert_eq!(start_offset(None, page, limit), expected);
    }
    assert_eq!(start_offset(Some(3), 5, 7), 3);
}

#[test]
fn query_carries_limit_start_and_sort() {
    let params = ListQuery::default()
        .with_page(2)
        .with_sort_by("name")
        .build(None, 15);

    assert_eq!(value_of(&params.query, "limit"), ["15"]);
    assert_eq!(value_of(&params.query, "start"), ["15"]);
    assert_eq!(value_of(&params.query, "orderBy"), ["name"]);
    assert_eq!(value_of(&params.query, "sortOrder"), ["ASC"]);
}

#[test]
fn mapped_filters_replace_caller_names() {
    let mapping = Mapping::builder("user")
        .filter("login__in", "logins")
        .filter("is_active", "active")
        .build()
        .unwrap();

    let params = ListQuery::default()
        .with_filter("logins", json!(["ada", "linus"]))
        .with_filter("active", true)
        .with_filter("ignored", "x")
        .build(Some(&mapping), 10);

    assert_eq!(value_of(&params.query, "login__in"), ["ada", "linus"]);
    assert_eq!(value_of(&params.query, "is_active"), ["true"]);
    assert!(value_of(&params.query, "ignored").is_empty());
    assert!(value_of(&params.query, "logins").is_empty());
}

#[test]
fn custom_endpoint_is_kept() {
    let query = ListQuery::default().with_endpoint("/archived/");
    assert_eq!(query.endpoint, "/archived/");
    assert_eq!(query.build(None, 10).page, 1);
}

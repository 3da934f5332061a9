//! Adapter Contract Tests
//!
//! Each adapter is pointed at a local mock server serving a trimmed copy of
//! the real API shape. Checks normalization, the partial-parse path and
//! error mapping.

use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use verity_core::{ErrorKind, ProviderId, Query, SourceType};
use verity_net::{create_client, HttpConfig, RetryPolicy};
use verity_sources::adapters::{
    ArxivProvider, BraveProvider, ClinicalTrialsProvider, CourtListenerProvider, EonetProvider,
    FactCheckProvider, GbifProvider, GdeltProvider, OpenAlexProvider, PubMedProvider,
    WikipediaProvider, WorldBankProvider,
};
use verity_sources::{EvidenceProvider, ProviderError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client() -> reqwest::Client {
    create_client(&HttpConfig {
        proxy: None,
        ..HttpConfig::default()
    })
    .unwrap()
}

fn deadline_in(ms: u64) -> Instant {
    Instant::now() + Duration::from_millis(ms)
}

#[tokio::test]
async fn test_brave_partial_parse() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/res/v1/web/search"))
        .and(query_param("q", "moon landing hoax"))
        .and(header("X-Subscription-Token", "brave-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "web": {"results": [
                {"title": "Apollo <strong>11</strong>", "url": "https://www.nasa.gov/apollo-11",
                 "description": "The first crewed landing", "page_age": "2023-07-20T00:00:00"},
                {"title": "Missing url"},
                {"title": "Moon hoax debunked", "url": "https://www.reuters.com/fact-check/moon",
                 "description": "", "profile": {"name": "Reuters"}}
            ]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = BraveProvider::new(client(), Some("brave-key".to_string()))
        .with_base_url(&mock_server.uri());
    let fetch = provider
        .fetch(&Query::new("moon landing hoax"), 5, deadline_in(2000))
        .await
        .unwrap();

    assert_eq!(fetch.items.len(), 2);
    assert_eq!(fetch.warnings.len(), 1);

    let nasa = &fetch.items[0];
    assert_eq!(nasa.title, "Apollo 11");
    assert_eq!(nasa.provider_id, ProviderId::Brave);
    assert_eq!(nasa.source_type, SourceType::Government);
    assert_eq!(nasa.publisher, "nasa.gov");
    assert!(nasa.published_at.is_some());
    assert_eq!(nasa.rank, 0);

    let reuters = &fetch.items[1];
    assert_eq!(reuters.publisher, "Reuters");
    assert!(reuters.snippet.is_none());
}

#[tokio::test]
async fn test_missing_key_fails_fast() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = BraveProvider::new(client(), None).with_base_url(&mock_server.uri());
    assert!(!provider.is_configured());

    let err = provider
        .fetch(&Query::new("anything"), 5, deadline_in(2000))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderNotConfigured);
}

#[tokio::test]
async fn test_fact_check_nested_reviews() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1alpha1/claims:search"))
        .and(query_param("key", "google-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "claims": [
                {"text": "5G spreads viruses", "claimant": "Social media posts", "claimReview": [
                    {"url": "https://www.politifact.com/5g", "title": "No, 5G does not spread viruses",
                     "textualRating": "Pants on Fire", "reviewDate": "2020-04-02T00:00:00Z",
                     "publisher": {"name": "PolitiFact", "site": "politifact.com"}},
                    {"url": "https://fullfact.org/5g", "textualRating": "False",
                     "publisher": {"site": "fullfact.org"}}
                ]},
                {"text": "Broken review list", "claimReview": "oops"},
                {"text": "Review without rating", "claimReview": [{"url": "https://example.org"}]}
            ]
        })))
        .mount(&mock_server)
        .await;

    let provider = FactCheckProvider::new(client(), Some("google-key".to_string()))
        .with_base_url(&mock_server.uri());
    let (reviews, warnings) = provider
        .search_reviews(&Query::new("5G spreads viruses"), 10, deadline_in(2000))
        .await
        .unwrap();

    assert_eq!(reviews.len(), 2);
    assert_eq!(warnings.len(), 2);
    assert_eq!(reviews[0].rating, "Pants on Fire");
    assert_eq!(reviews[0].claimant.as_deref(), Some("Social media posts"));
    assert_eq!(reviews[0].item.publisher, "PolitiFact");
    assert_eq!(reviews[0].item.source_type, SourceType::FactCheck);
    assert_eq!(reviews[1].item.title, "5G spreads viruses");
    assert_eq!(reviews[1].item.publisher, "fullfact.org");
}

#[tokio::test]
async fn test_fact_check_no_match_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let provider = FactCheckProvider::new(client(), Some("k".to_string())).with_base_url(&mock_server.uri());
    let fetch = provider.fetch(&Query::new("obscure"), 5, deadline_in(2000)).await.unwrap();
    assert!(fetch.items.is_empty());
    assert!(fetch.warnings.is_empty());
}

#[tokio::test]
async fn test_openalex_abstract_and_doi() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/works"))
        .and(query_param("per-page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": "https://openalex.org/W1",
                "doi": "https://doi.org/10.1000/xyz",
                "display_name": "Vaccine safety review",
                "publication_date": "2021-06-01",
                "abstract_inverted_index": {"Vaccines": [0], "are": [1], "safe": [2]},
                "primary_location": {"source": {"display_name": "The Lancet"}}
            }, {
                "id": "https://openalex.org/W2",
                "doi": null,
                "title": "Untitled draft"
            }]
        })))
        .mount(&mock_server)
        .await;

    let provider = OpenAlexProvider::new(client()).with_base_url(&mock_server.uri());
    let fetch = provider
        .fetch(&Query::new("vaccine safety"), 3, deadline_in(2000))
        .await
        .unwrap();

    assert_eq!(fetch.items.len(), 2);
    let first = &fetch.items[0];
    assert_eq!(first.url, "https://doi.org/10.1000/xyz");
    assert_eq!(first.publisher, "The Lancet");
    assert_eq!(first.snippet.as_deref(), Some("Vaccines are safe"));
    assert_eq!(first.source_type, SourceType::Academic);
    assert_eq!(fetch.items[1].url, "https://openalex.org/W2");
}

#[tokio::test]
async fn test_pubmed_two_step() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/entrez/eutils/esearch.fcgi"))
        .and(query_param("term", "ivermectin covid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": {"idlist": ["111", "222"]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/entrez/eutils/esummary.fcgi"))
        .and(query_param("id", "111,222"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "uids": ["111", "222"],
                "111": {"title": "Ivermectin trial results", "fulljournalname": "NEJM",
                        "pubdate": "2022 Mar 30", "authors": [{"name": "Reis G"}]},
                "222": {"error": "cannot get document summary"}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = PubMedProvider::new(client(), None).with_base_url(&mock_server.uri());
    let fetch = provider
        .fetch(&Query::new("ivermectin covid"), 5, deadline_in(2000))
        .await
        .unwrap();

    assert_eq!(fetch.items.len(), 1);
    assert_eq!(fetch.warnings.len(), 1);
    let item = &fetch.items[0];
    assert_eq!(item.url, "https://pubmed.ncbi.nlm.nih.gov/111/");
    assert_eq!(item.publisher, "NEJM");
    assert_eq!(item.source_type, SourceType::Medical);
    assert_eq!(item.snippet.as_deref(), Some("Reis G. NEJM"));
}

#[tokio::test]
async fn test_pubmed_no_hits_skips_summary() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/entrez/eutils/esearch.fcgi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "esearchresult": {"idlist": []}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/entrez/eutils/esummary.fcgi"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let provider = PubMedProvider::new(client(), None).with_base_url(&mock_server.uri());
    let fetch = provider.fetch(&Query::new("nothing"), 5, deadline_in(2000)).await.unwrap();
    assert!(fetch.items.is_empty());
}

#[tokio::test]
async fn test_arxiv_atom_feed() {
    let mock_server = MockServer::start().await;

    let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2101.00001v1</id>
    <published>2021-01-01T00:00:00Z</published>
    <title>Room temperature superconductivity</title>
    <summary>We report a claim.</summary>
    <link href="http://arxiv.org/abs/2101.00001v1" rel="alternate" type="text/html"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2101.00002v1</id>
  </entry>
</feed>"#;

    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("search_query", "all:superconductor"))
        .respond_with(ResponseTemplate::new(200).set_body_string(feed))
        .mount(&mock_server)
        .await;

    let provider = ArxivProvider::new(client()).with_base_url(&mock_server.uri());
    let fetch = provider
        .fetch(&Query::new("superconductor"), 5, deadline_in(2000))
        .await
        .unwrap();

    assert_eq!(fetch.items.len(), 1);
    assert_eq!(fetch.warnings.len(), 1);
    assert_eq!(fetch.items[0].url, "http://arxiv.org/abs/2101.00001v1");
    assert_eq!(fetch.items[0].source_type, SourceType::Preprint);
}

#[tokio::test]
async fn test_clinical_trials_modules() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/studies"))
        .and(query_param("query.term", "statins"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "studies": [
                {"protocolSection": {
                    "identificationModule": {"nctId": "NCT0001", "briefTitle": "Statin outcomes"},
                    "statusModule": {"overallStatus": "COMPLETED", "startDateStruct": {"date": "2019-05"}},
                    "descriptionModule": {"briefSummary": "Statins and heart disease."},
                    "sponsorCollaboratorsModule": {"leadSponsor": {"name": "NHLBI"}}
                }},
                {"protocolSection": {}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let provider = ClinicalTrialsProvider::new(client()).with_base_url(&mock_server.uri());
    let fetch = provider.fetch(&Query::new("statins"), 5, deadline_in(2000)).await.unwrap();

    assert_eq!(fetch.items.len(), 1);
    assert_eq!(fetch.warnings.len(), 1);
    let item = &fetch.items[0];
    assert_eq!(item.url, "https://clinicaltrials.gov/study/NCT0001");
    assert_eq!(item.publisher, "NHLBI");
    assert_eq!(item.snippet.as_deref(), Some("[COMPLETED] Statins and heart disease."));
    assert_eq!(item.source_type, SourceType::ClinicalTrial);
}

#[tokio::test]
async fn test_gdelt_empty_and_rejected_bodies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("query", "quiet"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("query", "ab"))
        .respond_with(ResponseTemplate::new(200).set_body_string("The specified phrase is too short.\n"))
        .mount(&mock_server)
        .await;

    let provider = GdeltProvider::new(client()).with_base_url(&mock_server.uri());

    let fetch = provider.fetch(&Query::new("quiet"), 5, deadline_in(2000)).await.unwrap();
    assert!(fetch.items.is_empty());

    let err = provider.fetch(&Query::new("ab"), 5, deadline_in(2000)).await.unwrap_err();
    assert!(matches!(err, ProviderError::Parse(ref msg) if msg.contains("too short")));
}

#[tokio::test]
async fn test_gdelt_articles() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/doc/doc"))
        .and(query_param("mode", "artlist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "articles": [{"url": "https://www.bbc.co.uk/news/1", "title": "Election results",
                          "seendate": "20240105T101500Z", "domain": "bbc.co.uk",
                          "sourcecountry": "United Kingdom"}]
        })))
        .mount(&mock_server)
        .await;

    let provider = GdeltProvider::new(client()).with_base_url(&mock_server.uri());
    let fetch = provider.fetch(&Query::new("election"), 5, deadline_in(2000)).await.unwrap();

    assert_eq!(fetch.items.len(), 1);
    assert_eq!(fetch.items[0].publisher, "bbc.co.uk");
    assert!(fetch.items[0].published_at.is_some());
}

#[tokio::test]
async fn test_gdelt_retries_transient_failure_within_deadline() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let provider = GdeltProvider::new(client())
        .with_base_url(&mock_server.uri())
        .with_retry(RetryPolicy {
            max_retries: 1,
            backoff: Duration::from_millis(20),
        });
    let err = provider.fetch(&Query::new("x"), 5, deadline_in(2000)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderHttpError { status: 503 });
}

#[tokio::test]
async fn test_world_bank_skips_facets() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/wds"))
        .and(query_param("qterm", "inflation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 2,
            "documents": {
                "D1": {"display_title": "Inflation report", "url": "https://documents.worldbank.org/D1",
                       "docdt": "2023-04-01T00:00:00Z", "docty": "Report", "count": "World"},
                "D2": {"display_title": "No link"},
                "facets": {"count": []}
            }
        })))
        .mount(&mock_server)
        .await;

    let provider = WorldBankProvider::new(client()).with_base_url(&mock_server.uri());
    let fetch = provider.fetch(&Query::new("inflation"), 5, deadline_in(2000)).await.unwrap();

    assert_eq!(fetch.items.len(), 1);
    assert_eq!(fetch.warnings, vec!["document D2: no url".to_string()]);
    assert_eq!(fetch.items[0].snippet.as_deref(), Some("Report (World)"));
    assert_eq!(fetch.items[0].source_type, SourceType::Economic);
}

#[tokio::test]
async fn test_world_bank_keeps_response_order() {
    let mock_server = MockServer::start().await;

    // Keys out of lexical order; the API lists by relevance
    let body = r#"{"total": 3, "documents": {
        "D900": {"display_title": "Most relevant", "url": "https://documents.worldbank.org/D900"},
        "D100": {"display_title": "Second", "url": "https://documents.worldbank.org/D100"},
        "D500": {"display_title": "Third", "url": "https://documents.worldbank.org/D500"}
    }}"#;
    Mock::given(method("GET"))
        .and(path("/api/v2/wds"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&mock_server)
        .await;

    let provider = WorldBankProvider::new(client()).with_base_url(&mock_server.uri());
    let fetch = provider.fetch(&Query::new("poverty"), 5, deadline_in(2000)).await.unwrap();

    let titles: Vec<&str> = fetch.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Most relevant", "Second", "Third"]);
}

#[tokio::test]
async fn test_gbif_species() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/species/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"key": 2435099, "scientificName": "Puma concolor", "rank": "SPECIES",
                         "kingdom": "Animalia", "family": "Felidae"}]
        })))
        .mount(&mock_server)
        .await;

    let provider = GbifProvider::new(client()).with_base_url(&mock_server.uri());
    let fetch = provider.fetch(&Query::new("puma"), 5, deadline_in(2000)).await.unwrap();

    assert_eq!(fetch.items[0].url, "https://www.gbif.org/species/2435099");
    assert_eq!(fetch.items[0].snippet.as_deref(), Some("SPECIES, Animalia, Felidae"));
    assert_eq!(fetch.items[0].source_type, SourceType::Biodiversity);
}

#[tokio::test]
async fn test_eonet_filters_by_claim_terms() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/events"))
        .and(query_param("status", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                {"id": "EONET_1", "title": "Park Fire, California",
                 "categories": [{"id": "wildfires", "title": "Wildfires"}],
                 "sources": [{"id": "InciWeb", "url": "https://inciweb.wildfire.gov/incident/1"}],
                 "geometry": [{"date": "2024-07-24T00:00:00Z"}, {"date": "2024-07-30T00:00:00Z"}]},
                {"id": "EONET_2", "title": "Tropical Storm Ana",
                 "categories": [{"id": "severeStorms", "title": "Severe Storms"}],
                 "sources": [{"id": "JTWC", "url": "https://www.metoc.navy.mil/jtwc"}]}
            ]
        })))
        .mount(&mock_server)
        .await;

    let provider = EonetProvider::new(client()).with_base_url(&mock_server.uri());
    let fetch = provider
        .fetch(&Query::new("Wildfires destroyed California towns"), 5, deadline_in(2000))
        .await
        .unwrap();

    assert_eq!(fetch.items.len(), 1);
    let item = &fetch.items[0];
    assert_eq!(item.url, "https://inciweb.wildfire.gov/incident/1");
    assert_eq!(item.source_type, SourceType::Environmental);
    assert_eq!(item.snippet.as_deref(), Some("Wildfires. Reported by InciWeb"));
}

#[tokio::test]
async fn test_wikipedia_strips_search_markup() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": {"search": [{
                "title": "Great Wall of China",
                "snippet": "The <span class=\"searchmatch\">Great</span> Wall is not visible from space",
                "timestamp": "2024-05-01T12:00:00Z"
            }]}
        })))
        .mount(&mock_server)
        .await;

    let provider = WikipediaProvider::new(client()).with_base_url(&mock_server.uri());
    let fetch = provider
        .fetch(&Query::new("great wall visible from space"), 5, deadline_in(2000))
        .await
        .unwrap();

    let item = &fetch.items[0];
    assert_eq!(item.url, "https://en.wikipedia.org/wiki/Great_Wall_of_China");
    assert_eq!(item.snippet.as_deref(), Some("The Great Wall is not visible from space"));
    assert_eq!(item.publisher, "Wikipedia");
}

#[tokio::test]
async fn test_court_listener_token_and_urls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/rest/v4/search/"))
        .and(query_param("type", "o"))
        .and(header("Authorization", "Token cl-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "caseName": "Roe v. Wade",
                "absolute_url": "/opinion/108713/roe-v-wade/",
                "court": "Supreme Court of the United States",
                "dateFiled": "1973-01-22",
                "opinions": [{"snippet": "This Texas <mark>abortion</mark> case"}]
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = CourtListenerProvider::new(client(), Some("cl-key".to_string()))
        .with_base_url(&mock_server.uri());
    let fetch = provider
        .fetch(&Query::new("roe v wade"), 5, deadline_in(2000))
        .await
        .unwrap();

    let item = &fetch.items[0];
    assert_eq!(item.url, "https://www.courtlistener.com/opinion/108713/roe-v-wade/");
    assert_eq!(item.snippet.as_deref(), Some("This Texas abortion case"));
    assert_eq!(item.source_type, SourceType::Government);
}

#[tokio::test]
async fn test_http_error_maps_to_status_kind() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let provider = WikipediaProvider::new(client()).with_base_url(&mock_server.uri());
    let err = provider.fetch(&Query::new("x"), 5, deadline_in(2000)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderHttpError { status: 500 });
}

#[tokio::test]
async fn test_slow_response_maps_to_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": []}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let provider = GbifProvider::new(client()).with_base_url(&mock_server.uri());
    let started = Instant::now();
    let err = provider.fetch(&Query::new("x"), 5, deadline_in(200)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProviderTimeout);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_wrong_shape_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": "none"})))
        .mount(&mock_server)
        .await;

    let provider = OpenAlexProvider::new(client()).with_base_url(&mock_server.uri());
    let err = provider.fetch(&Query::new("x"), 5, deadline_in(2000)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProviderParseError);
}

//! Request dispatch and status classification.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::{
    config::ClientConfig,
    decode::{DecodeOptions, Decoded, Decoder},
    errors::truncate_body,
    mapping::MappingRegistry,
    query::ListQuery,
    template,
    transport::{HttpTransport, Method, RawResponse, Transport, TransportError, TransportRequest},
    types::{DataObject, Entity, Page},
    Error,
};

/// Per-call options: path parameters, query, headers and payload.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Values for `{name}` placeholders in the endpoint template.
    pub path_params: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// JSON payload. Only `post` and `put` read it; `get`, `delete` and a
    /// bare `dispatch` drop it.
    pub data: Option<Value>,
    /// Raw body sent as is.
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn with_path_param(mut self, name: &str, value: impl ToString) -> Self {
        self.path_params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_query_pairs(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }
}

/// Client for one namespace of a REST API.
///
/// Holds the configuration, the mapping registry and the transport behind
/// `Arc`s, so [`Client::namespaced`] is cheap. Every dispatch issues exactly
/// one call to the transport.
pub struct Client<T = HttpTransport> {
    config: Arc<ClientConfig>,
    registry: Arc<MappingRegistry>,
    transport: Arc<T>,
    namespace: String,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            registry: Arc::clone(&self.registry),
            transport: Arc::clone(&self.transport),
            namespace: self.namespace.clone(),
        }
    }
}

impl Client<HttpTransport> {
    /// Creates a client over `reqwest` using the configured timeout.
    pub fn new(config: ClientConfig, registry: MappingRegistry) -> Result<Self, Error> {
        let transport = HttpTransport::new(config.timeout).map_err(Error::Transport)?;
        Ok(Self::with_transport(config, registry, transport))
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, registry: MappingRegistry, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            transport: Arc::new(transport),
            namespace: String::new(),
        }
    }

    /// Sets the path prefix inserted between the base URL and endpoints.
    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    /// A client for another namespace sharing this client's transport,
    /// registry and configuration.
    pub fn namespaced(&self, namespace: &str) -> Self {
        self.clone().with_namespace(namespace)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &MappingRegistry {
        &self.registry
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Expands `base_url + namespace + endpoint` with `path_params`.
    pub fn url(&self, endpoint: &str, path_params: &BTreeMap<String, String>) -> Result<Url, Error> {
        let raw = format!("{}{}{}", self.config.base_url, self.namespace, endpoint);
        Url::parse(&template::expand(&raw, path_params)).map_err(|e| {
            tracing::error!("Invalid URL constructed from {}: {}", raw, e);
            Error::InvalidUrl(e)
        })
    }

    /// Sends one request. Connectivity failures become
    /// [`Error::ServiceUnavailable`]; every HTTP status is returned as is.
    pub async fn dispatch(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<RawResponse, Error> {
        let url = self.url(endpoint, &options.path_params)?;
        if options.data.is_some() {
            tracing::warn!(
                "{} request ignores the data option; only post and put encode it",
                method
            );
        }
        self.trace(format_args!(
            "{} request - {} - {}",
            method,
            url,
            options.body.as_deref().unwrap_or("[]")
        ));

        let request = TransportRequest {
            method,
            url,
            query: options.query,
            headers: options.headers,
            body: options.body,
        };
        let response = self.transport.send(request).await.map_err(|e| match e {
            TransportError::Connect(_) => {
                tracing::error!("Service unavailable: {}", e);
                Error::ServiceUnavailable { cause: e }
            }
            TransportError::Other(_) => {
                tracing::error!("Request failed: {}", e);
                Error::Transport(e)
            }
        })?;

        self.trace(format_args!(
            "response - {} - {}",
            response.status,
            truncate_body(&response.body)
        ));
        Ok(response)
    }

    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> Result<RawResponse, Error> {
        self.dispatch(Method::Get, endpoint, options).await
    }

    pub async fn delete(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<RawResponse, Error> {
        self.dispatch(Method::Delete, endpoint, options).await
    }

    /// Sends `options.data` as a JSON body.
    pub async fn post(&self, endpoint: &str, options: RequestOptions) -> Result<RawResponse, Error> {
        self.dispatch(Method::Post, endpoint, encode_json(options))
            .await
    }

    /// Sends `options.data` as a JSON body.
    pub async fn put(&self, endpoint: &str, options: RequestOptions) -> Result<RawResponse, Error> {
        self.dispatch(Method::Put, endpoint, encode_json(options))
            .await
    }

    /// Classifies a response the caller did not handle itself.
    pub fn handle_unclassified(&self, response: &RawResponse) -> Error {
        let body = truncate_body(&response.body);
        tracing::error!("{} - {}", response.status, body);
        if response.status == 401 {
            Error::UnauthorizedRequest {
                status: response.status,
                body,
            }
        } else {
            Error::UnexpectedResponse {
                status: response.status,
                body,
            }
        }
    }

    /// Decodes a response body against the registry.
    pub fn decode(
        &self,
        response: &RawResponse,
        entity_type: Option<&str>,
        options: &DecodeOptions,
    ) -> Result<Decoded, Error> {
        Decoder::new(&self.registry).decode(&response.body, entity_type, options)
    }

    /// `GET {namespace}/{id}`, decoded as `entity_type`.
    pub async fn fetch_entity(&self, id: impl Display, entity_type: &str) -> Result<Entity, Error> {
        self.registry.get(entity_type)?;
        let response = self
            .get("/{id}", RequestOptions::default().with_path_param("id", id))
            .await?;
        if response.status != 200 {
            return Err(self.handle_unclassified(&response));
        }
        self.expect_entity(&response, entity_type)
    }

    /// Lists one page of a collection. Filters go through the filter table
    /// of `entity_type` when one is given.
    pub async fn list_entities(
        &self,
        entity_type: Option<&str>,
        query: &ListQuery,
    ) -> Result<Page<Decoded>, Error> {
        let mapping = entity_type
            .map(|name| self.registry.get(name))
            .transpose()?;
        let params = query.build(mapping, self.config.page_size);
        self.trace(format_args!("list params - {:?}", params.query));

        let response = self
            .get(
                &query.endpoint,
                RequestOptions::default().with_query_pairs(params.query),
            )
            .await?;
        if response.status != 200 {
            return Err(self.handle_unclassified(&response));
        }

        let options = DecodeOptions::default()
            .with_page(params.page)
            .with_first_offset(params.start);
        self.decode(&response, entity_type, &options)?
            .into_page()
            .ok_or_else(|| Error::malformed("list response is not a paginated envelope"))
    }

    /// `POST {namespace}/` with the object's wire form; 200 and 201 are decoded
    /// as `entity_type`.
    pub async fn create_entity(
        &self,
        entity_type: &str,
        object: &impl DataObject,
    ) -> Result<Entity, Error> {
        self.registry.get(entity_type)?;
        let data = Value::Object(object.serialize());
        let response = self
            .post("/", RequestOptions::default().with_data(data))
            .await?;
        match response.status {
            200 | 201 => self.expect_entity(&response, entity_type),
            _ => Err(self.handle_unclassified(&response)),
        }
    }

    /// `PUT {namespace}/{id}` with the object's wire form.
    pub async fn update_entity(
        &self,
        id: impl Display,
        entity_type: &str,
        object: &impl DataObject,
    ) -> Result<Entity, Error> {
        self.registry.get(entity_type)?;
        let data = Value::Object(object.serialize());
        let options = RequestOptions::default()
            .with_path_param("id", id)
            .with_data(data);
        let response = self.put("/{id}", options).await?;
        if response.status != 200 {
            return Err(self.handle_unclassified(&response));
        }
        self.expect_entity(&response, entity_type)
    }

    /// `DELETE {namespace}/{id}`; 200 and 204 succeed.
    pub async fn delete_entity(&self, id: impl Display) -> Result<(), Error> {
        let response = self
            .delete("/{id}", RequestOptions::default().with_path_param("id", id))
            .await?;
        match response.status {
            200 | 204 => Ok(()),
            _ => Err(self.handle_unclassified(&response)),
        }
    }

    fn expect_entity(&self, response: &RawResponse, entity_type: &str) -> Result<Entity, Error> {
        self.decode(response, Some(entity_type), &DecodeOptions::default())?
            .into_entity()
            .ok_or_else(|| {
                Error::malformed(format!("response does not describe a {}", entity_type))
            })
    }

    fn trace(&self, message: std::fmt::Arguments<'_>) {
        if self.config.debug {
            tracing::info!("{}", message);
        } else {
            tracing::debug!("{}", message);
        }
    }
}

/// Moves `data` into a JSON body and marks the request as JSON.
fn encode_json(mut options: RequestOptions) -> RequestOptions {
    if let Some(data) = options.data.take() {
        options.body = Some(data.to_string());
    }
    options
        .headers
        .retain(|(k, _)| !k.eq_ignore_ascii_case("content-type"));
    options
        .headers
        .push(("Content-Type".to_string(), "application/json".to_string()));
    options
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::mapping::Mapping;
    use crate::types::Record;

    #[derive(Default)]
    struct Recorder {
        responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
        requests: Mutex<Vec<TransportRequest>>,
    }

    impl Transport for Arc<Recorder> {
        async fn send(&self, request: TransportRequest) -> Result<RawResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no canned response left")
        }
    }

    fn registry() -> MappingRegistry {
        MappingRegistry::new()
            .with(
                Mapping::builder("issue")
                    .field("id", "issueId")
                    .field("title", "summary")
                    .reverse("summary", "title")
                    .filter("state", "status")
                    .build()
                    .unwrap(),
            )
            .unwrap()
    }

    fn client(responses: Vec<Result<RawResponse, TransportError>>) -> (Client<Arc<Recorder>>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        });
        let client = Client::with_transport(
            ClientConfig::new("https://api.example.com/v1").with_page_size(10),
            registry(),
            Arc::clone(&recorder),
        )
        .with_namespace("/issues");
        (client, recorder)
    }

    fn ok(status: u16, body: &str) -> Result<RawResponse, TransportError> {
        Ok(RawResponse::new(status, body))
    }

    fn last_request(recorder: &Recorder) -> TransportRequest {
        recorder.requests.lock().unwrap().last().cloned().unwrap()
    }

    #[test]
    fn url_joins_base_namespace_and_endpoint() {
        let (client, _) = client(vec![]);
        let params = BTreeMap::from([("id".to_string(), "7".to_string())]);
        assert_eq!(
            client.url("/{id}", &params).unwrap().as_str(),
            "https://api.example.com/v1/issues/7"
        );
        assert_eq!(
            client.namespaced("/users").url("/", &BTreeMap::new()).unwrap().as_str(),
            "https://api.example.com/v1/users/"
        );
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let client = Client::with_transport(
            ClientConfig::new("not a url"),
            MappingRegistry::new(),
            Arc::new(Recorder::default()),
        );
        assert!(matches!(
            client.url("/", &BTreeMap::new()),
            Err(Error::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn post_encodes_data_as_json() {
        let (client, recorder) = client(vec![ok(201, "{}")]);
        let options = RequestOptions::default()
            .with_header("content-type", "text/plain")
            .with_data(json!({"summary": "New"}));
        client.post("/", options).await.unwrap();

        let request = last_request(&recorder);
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body.as_deref(), Some(r#"{"summary":"New"}"#));
        assert_eq!(
            request.headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );
    }

    #[tokio::test]
    async fn get_sends_no_body() {
        let (client, recorder) = client(vec![ok(200, "{}")]);
        client
            .get("/", RequestOptions::default().with_query("a", 1))
            .await
            .unwrap();
        let request = last_request(&recorder);
        assert_eq!(request.method, Method::Get);
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
        assert_eq!(request.query, vec![("a".to_string(), "1".to_string())]);
    }

    #[tokio::test]
    async fn delete_drops_data_option() {
        let (client, recorder) = client(vec![ok(204, "")]);
        let options = RequestOptions::default()
            .with_path_param("id", 3)
            .with_data(json!({"reason": "dup"}));
        client.delete("/{id}", options).await.unwrap();

        let request = last_request(&recorder);
        assert_eq!(request.method, Method::Delete);
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
    }

    #[tokio::test]
    async fn connect_failures_become_service_unavailable() {
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let (client, _) = client(vec![Err(TransportError::Connect(Box::new(refused)))]);
        let err = client.get("/", RequestOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::ServiceUnavailable { .. }));
        let cause = std::error::Error::source(&err).unwrap();
        assert!(cause.to_string().contains("refused"));
    }

    #[tokio::test]
    async fn other_transport_failures_pass_through() {
        let broken = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad frame");
        let (client, _) = client(vec![Err(TransportError::Other(Box::new(broken)))]);
        let err = client.get("/", RequestOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Other(_))));
    }

    #[tokio::test]
    async fn non_success_statuses_are_returned_raw() {
        let (client, _) = client(vec![ok(503, "down")]);
        let response = client.get("/", RequestOptions::default()).await.unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.body, "down");
    }

    #[test]
    fn unclassified_statuses() {
        let (client, _) = client(vec![]);
        let err = client.handle_unclassified(&RawResponse::new(401, "expired"));
        assert!(matches!(err, Error::UnauthorizedRequest { status: 401, ref body } if body == "expired"));
        let err = client.handle_unclassified(&RawResponse::new(404, "missing"));
        assert!(matches!(err, Error::UnexpectedResponse { status: 404, .. }));
        assert_eq!(err.to_string(), "Unexpected response: 404 - missing");
    }

    #[tokio::test]
    async fn fetch_entity_decodes_200() {
        let (client, recorder) = client(vec![ok(200, r#"{"issueId": 3, "summary": "Leak"}"#)]);
        let entity = client.fetch_entity(3, "issue").await.unwrap();
        assert_eq!(entity.get("title"), Some(&json!("Leak")));
        assert_eq!(
            last_request(&recorder).url.as_str(),
            "https://api.example.com/v1/issues/3"
        );
    }

    #[tokio::test]
    async fn fetch_entity_classifies_failures() {
        let (client, _) = client(vec![ok(401, ""), ok(500, "boom"), ok(200, "not json")]);
        assert!(matches!(
            client.fetch_entity(1, "issue").await,
            Err(Error::UnauthorizedRequest { .. })
        ));
        assert!(matches!(
            client.fetch_entity(1, "issue").await,
            Err(Error::UnexpectedResponse { status: 500, .. })
        ));
        assert!(matches!(
            client.fetch_entity(1, "issue").await,
            Err(Error::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_entity_rejects_unknown_type_without_dispatching() {
        let (client, recorder) = client(vec![]);
        assert!(matches!(
            client.fetch_entity(1, "ghost").await,
            Err(Error::UnknownObjectType(_))
        ));
        assert!(recorder.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_entities_assembles_query_and_page() {
        let body = r#"{"total": 25, "results": [{"issueId": 21}, {"issueId": 22}, {"issueId": 23}, {"issueId": 24}, {"issueId": 25}]}"#;
        let (client, recorder) = client(vec![ok(200, body)]);
        let query = ListQuery::default()
            .with_page(3)
            .with_filter("status", "open")
            .with_sort_by("-id");
        let page = client.list_entities(Some("issue"), &query).await.unwrap();

        assert_eq!((page.total(), page.page(), page.first(), page.last()), (25, 3, 21, 25));
        assert_eq!(page.len(), 5);

        let request = last_request(&recorder);
        assert_eq!(request.url.as_str(), "https://api.example.com/v1/issues/");
        let query: Vec<(&str, &str)> = request
            .query
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            query,
            vec![
                ("state", "open"),
                ("limit", "10"),
                ("start", "20"),
                ("orderBy", "id"),
                ("sortOrder", "DESC"),
            ]
        );
    }

    #[tokio::test]
    async fn list_entities_requires_an_envelope() {
        let (client, _) = client(vec![ok(200, "[]"), ok(403, "no")]);
        assert!(matches!(
            client.list_entities(None, &ListQuery::default()).await,
            Err(Error::MalformedResponse { .. })
        ));
        assert!(matches!(
            client.list_entities(None, &ListQuery::default()).await,
            Err(Error::UnexpectedResponse { status: 403, .. })
        ));
    }

    #[tokio::test]
    async fn create_and_update_send_reverse_mapped_payload() {
        let reply = r#"{"issueId": 9, "summary": "Typo"}"#;
        let (client, recorder) = client(vec![ok(201, reply), ok(200, reply)]);
        let mut record = Record::new(Arc::clone(client.registry().get("issue").unwrap()));
        record.set("title", json!("Typo"));
        record.set("_draft", json!(true));

        let created = client.create_entity("issue", &record).await.unwrap();
        assert_eq!(created.get("id"), Some(&json!(9)));
        let request = last_request(&recorder);
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body.as_deref(), Some(r#"{"summary":"Typo"}"#));

        client.update_entity(9, "issue", &created).await.unwrap();
        let request = last_request(&recorder);
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.url.as_str(), "https://api.example.com/v1/issues/9");
    }

    #[tokio::test]
    async fn delete_entity_accepts_no_content() {
        let (client, recorder) = client(vec![ok(204, ""), ok(404, "gone")]);
        client.delete_entity("abc").await.unwrap();
        assert_eq!(last_request(&recorder).method, Method::Delete);
        assert!(matches!(
            client.delete_entity("abc").await,
            Err(Error::UnexpectedResponse { status: 404, .. })
        ));
    }
}

//! Record model: one JSON record bound to a resource type's URL layout.

use std::collections::VecDeque;
use std::fmt;
use std::marker::PhantomData;

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{
    client::{autopage, Method, Params, RequestContext, RequestOptions, RestClient, UntilOptions},
    dicts,
    response::{Envelope, SuccessResponse},
    strings::{self, Casing},
    Error,
};

/// Static description of a REST resource type.
///
/// `REST_ROOT` is the collection path. It may contain `{field}` or `:field`
/// placeholders, which are filled from the record (or from list path values)
/// when a path is built.
pub trait Resource: Send + Sync + 'static {
    /// Display name used in error messages.
    const NAME: &'static str;
    const REST_ROOT: &'static str;
    const PRIMARY_KEY: &'static str = "id";
    const SECONDARY_KEY: Option<&'static str> = None;
    /// Fields that may be written even if absent from the current payload.
    const FIELDS: &'static [&'static str] = &[];
    const READ_METHOD: Option<Method> = Some(Method::Get);
    const CREATE_METHOD: Option<Method> = Some(Method::Post);
    const UPDATE_METHOD: Option<Method> = Some(Method::Put);
}

/// Options for [`Record::save`].
#[derive(Clone, Copy, Debug)]
pub struct SaveOptions {
    /// Re-read the record after saving.
    pub refresh: bool,
    /// Drop null values before sending.
    pub compact: bool,
    /// Send only the fields this returns true for. Applied after `compact`.
    pub keep: Option<fn(&str, &Value) -> bool>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            refresh: true,
            compact: false,
            keep: None,
        }
    }
}

/// Options for [`Record::all`] and [`Record::iall`].
#[derive(Clone, Debug, Default)]
pub struct ListOptions {
    pub params: Params,
    /// Values for placeholders in the resource root.
    pub path_values: Map<String, Value>,
    /// Retrieve every listed record individually.
    pub autoload: bool,
    /// Stop after this many records.
    pub limit: Option<usize>,
    pub until: UntilOptions,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Sends `limit` as the page size and truncates the result to it.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.params.insert("limit".to_string(), Value::from(limit));
        self.limit = Some(limit);
        self
    }

    pub fn with_path_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.path_values
            .insert(strings::convert(name, Casing::Pascal), value.into());
        self
    }

    pub fn with_autoload(mut self, autoload: bool) -> Self {
        self.autoload = autoload;
        self
    }

    pub fn with_until(mut self, until: UntilOptions) -> Self {
        self.until = until;
        self
    }
}

/// A single API record of resource type `R`.
///
/// Payload keys are stored in `PascalCase`; field lookups accept any casing.
/// Records do not own a client: every network operation borrows one.
pub struct Record<R: Resource> {
    data: Map<String, Value>,
    metadata: Map<String, Value>,
    attrs: Map<String, Value>,
    _kind: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for Record<R> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            metadata: self.metadata.clone(),
            attrs: self.attrs.clone(),
            _kind: PhantomData,
        }
    }
}

impl<R: Resource> fmt::Debug for Record<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(R::NAME)
            .field("data", &self.data)
            .field("metadata", &self.metadata)
            .field("attrs", &self.attrs)
            .finish()
    }
}

impl<R: Resource> Default for Record<R> {
    fn default() -> Self {
        Self {
            data: Map::new(),
            metadata: Map::new(),
            attrs: Map::new(),
            _kind: PhantomData,
        }
    }
}

fn pascal_map(value: &Value) -> Map<String, Value> {
    match dicts::camelize_keys(value, true) {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn lookup_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    match path.split_once(dicts::PATH_SEPARATOR) {
        Some((head, rest)) => map.get(head).and_then(|v| dicts::get(v, rest)),
        None => map.get(path),
    }
}

fn pascal(name: &str) -> String {
    strings::convert(name, Casing::Pascal)
}

fn path_segment(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Fills `{name}` and `:name` placeholders in `template` using `lookup`.
pub fn interpolate<F>(template: &str, lookup: F) -> Result<String, Error>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        let name = match c {
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                if !closed {
                    out.push('{');
                    out.push_str(&name);
                    continue;
                }
                name
            }
            ':' if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                let mut name = String::new();
                while let Some(n) = chars.next_if(|n| n.is_ascii_alphanumeric() || *n == '_') {
                    name.push(n);
                }
                name
            }
            other => {
                out.push(other);
                continue;
            }
        };

        let value = lookup(&name).ok_or_else(|| Error::PathTemplate {
            template: template.to_string(),
            field: name.clone(),
        })?;
        out.push_str(&value);
    }
    Ok(out)
}

impl<R: Resource> Record<R> {
    /// Wraps a payload mapping, normalizing its keys to `PascalCase`.
    pub fn new(data: Value) -> Self {
        Self {
            data: pascal_map(&data),
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = pascal_map(&metadata);
        self
    }

    /// An unbound record carrying only its primary key.
    pub fn with_key(pk: impl Into<Value>) -> Self {
        let mut record = Self::default();
        record.data.insert(pascal(R::PRIMARY_KEY), pk.into());
        record
    }

    /// An unbound record carrying primary and secondary keys.
    pub fn with_keys(pk: impl Into<Value>, sk: impl Into<Value>) -> Self {
        let mut record = Self::with_key(pk);
        if let Some(secondary) = R::SECONDARY_KEY {
            record.data.insert(pascal(secondary), sk.into());
        }
        record
    }

    /// Fetches one record by primary key.
    pub async fn get(client: &RestClient, pk: impl Into<Value>) -> Result<Self, Error> {
        let mut record = Self::with_key(pk);
        record.retrieve(client).await?;
        Ok(record)
    }

    /// Fetches one record by primary and secondary key.
    pub async fn get_by_keys(
        client: &RestClient,
        pk: impl Into<Value>,
        sk: impl Into<Value>,
    ) -> Result<Self, Error> {
        let mut record = Self::with_keys(pk, sk);
        record.retrieve(client).await?;
        Ok(record)
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }

    /// The primary key value, if known.
    pub fn id(&self) -> Option<&Value> {
        self.field(R::PRIMARY_KEY)
    }

    /// Looks up a field by exact path, then by its `PascalCase` key, then
    /// among plain attributes. Null values count as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        let key = pascal(name);
        [
            lookup_path(&self.data, name),
            self.data.get(&key),
            self.attrs.get(&key),
        ]
        .into_iter()
        .flatten()
        .find(|v| !v.is_null())
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    pub fn field_i64(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(Value::as_i64)
    }

    /// Sets a field. Returns true when the value went into the payload,
    /// false when it was kept as a plain attribute that is never persisted.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> bool {
        let key = pascal(name);
        let declared = R::FIELDS.iter().any(|f| pascal(f) == key);
        if declared || self.data.contains_key(&key) {
            self.data.insert(key, value.into());
            true
        } else {
            self.attrs.insert(key, value.into());
            false
        }
    }

    /// The URL path template for a single record.
    pub fn path_template() -> String {
        let mut template = format!("{}/{{{}}}/", R::REST_ROOT.trim_end_matches('/'), R::PRIMARY_KEY);
        if let Some(secondary) = R::SECONDARY_KEY {
            template.push_str(&format!("{{{}}}/", secondary));
        }
        template
    }

    /// The record's URL path with its field values interpolated.
    pub fn formatted_path(&self) -> Result<String, Error> {
        interpolate(&Self::path_template(), |name| {
            self.field(name).and_then(path_segment)
        })
    }

    /// The collection path with placeholders filled from `values`.
    pub fn formatted_root(values: &Map<String, Value>) -> Result<String, Error> {
        interpolate(R::REST_ROOT, |name| {
            values
                .get(name)
                .or_else(|| values.get(&pascal(name)))
                .and_then(path_segment)
        })
    }

    /// Replaces the record's data with the server's copy.
    pub async fn retrieve(&mut self, client: &RestClient) -> Result<(), Error> {
        let method = R::READ_METHOD.ok_or(Error::UnsupportedOperation {
            operation: "Retrieval",
            resource: R::NAME,
        })?;
        let path = self.formatted_path()?;
        tracing::debug!("Retrieving {} from {}", R::NAME, path);

        let response = client.execute(method, &path, &RequestOptions::new()).await?;
        self.bind(&response);
        Ok(())
    }

    fn bind(&mut self, response: &SuccessResponse) {
        self.data = pascal_map(&response.result(0));
        self.metadata = response.metadata().map(pascal_map).unwrap_or_default();
    }

    /// Pushes the current data to the server.
    ///
    /// Uses the update method, or the create method when the type has no
    /// update method.
    pub async fn save(&mut self, client: &RestClient, options: SaveOptions) -> Result<(), Error> {
        let method = R::UPDATE_METHOD
            .or(R::CREATE_METHOD)
            .ok_or(Error::UnsupportedOperation {
                operation: "Persistence",
                resource: R::NAME,
            })?;
        let path = self.formatted_path()?;

        let mut data = if options.compact {
            dicts::compact(&self.data)
        } else {
            self.data.clone()
        };
        if let Some(keep) = options.keep {
            data = dicts::compact_with(&data, keep);
        }
        tracing::debug!("Saving {} to {}", R::NAME, path);
        client
            .execute(method, &path, &RequestOptions::new().with_data(Value::Object(data)))
            .await?;

        if options.refresh {
            self.retrieve(client).await?;
        }
        Ok(())
    }

    fn from_listing(result: &Value, response: &SuccessResponse, path_values: &Map<String, Value>) -> Self {
        let mut record = Self::new(result.clone());
        if let Some(metadata) = response.metadata() {
            record.metadata = pascal_map(metadata);
        }
        for (k, v) in path_values {
            record.attrs.insert(k.clone(), v.clone());
        }
        record
    }

    /// Lists every record under the resource root, following pagination.
    pub async fn all(client: &RestClient, options: ListOptions) -> Result<Vec<Self>, Error> {
        let path = Self::formatted_root(&options.path_values)?;
        let method = R::READ_METHOD.unwrap_or(Method::Get);
        let request = RequestOptions::new().with_params(options.params.clone());

        // Paging stops as soon as enough results are in hand for the limit.
        let limit = options.limit;
        let mut received = 0usize;
        let until_limit = |i: usize, response: &SuccessResponse, context: &mut RequestContext| {
            received += response.results().len();
            if limit.is_some_and(|limit| received >= limit) {
                return true;
            }
            autopage(i, response, context)
        };

        let responses = client
            .request_until(method.as_str(), &path, request, options.until, Some(until_limit))
            .await?;

        let mut records = Vec::new();
        'pages: for response in &responses {
            for result in response.results() {
                if options.limit.is_some_and(|limit| records.len() >= limit) {
                    break 'pages;
                }
                let mut record = Self::from_listing(&result, response, &options.path_values);
                if options.autoload {
                    record.retrieve(client).await?;
                }
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Streams every record under the resource root, fetching pages lazily.
    pub fn iall(client: &RestClient, options: ListOptions) -> BoxStream<'_, Result<Self, Error>> {
        let path = match Self::formatted_root(&options.path_values) {
            Ok(path) => path,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };
        let method = R::READ_METHOD.unwrap_or(Method::Get);
        let context = RequestContext::new(
            method,
            &path,
            RequestOptions::new().with_params(options.params.clone()),
        );

        let state = PageState::<R> {
            client,
            context: Some(context),
            buffer: VecDeque::new(),
            iteration: 0,
            yielded: 0,
            pending_error: None,
            options,
        };

        stream::try_unfold(state, |mut state| async move {
            loop {
                if state.options.limit.is_some_and(|limit| state.yielded >= limit) {
                    return Ok(None);
                }

                if let Some(mut record) = state.buffer.pop_front() {
                    if state.options.autoload {
                        record.retrieve(state.client).await?;
                    }
                    state.yielded += 1;
                    return Ok(Some((record, state)));
                }

                if let Some(err) = state.pending_error.take() {
                    return Err(err);
                }
                let Some(mut context) = state.context.take() else {
                    return Ok(None);
                };

                let response = state.client.execute_context(&context).await?;
                for result in response.results() {
                    state.buffer.push_back(Self::from_listing(
                        &result,
                        &response,
                        &state.options.path_values,
                    ));
                }

                if !autopage(state.iteration, &response, &mut context) {
                    state.iteration += 1;
                    if let Some(max_iterations) = state.options.until.max_iterations {
                        if state.iteration >= max_iterations {
                            // Records already fetched are yielded before the error.
                            state.pending_error = Some(Error::TooManyIterations {
                                method: context.method.to_string(),
                                path: context.path,
                                max_iterations,
                            });
                            continue;
                        }
                    }
                    if !state.options.until.request_delay.is_zero() {
                        tokio::time::sleep(state.options.until.request_delay).await;
                    }
                    state.context = Some(context);
                }
            }
        })
        .boxed()
    }

    /// Collects [`iall`](Self::iall) into a list.
    pub async fn iall_collect(client: &RestClient, options: ListOptions) -> Result<Vec<Self>, Error> {
        Self::iall(client, options).try_collect().await
    }
}

struct PageState<'a, R: Resource> {
    client: &'a RestClient,
    context: Option<RequestContext>,
    buffer: VecDeque<Record<R>>,
    iteration: usize,
    yielded: usize,
    pending_error: Option<Error>,
    options: ListOptions,
}

impl<R: Resource> Serialize for Record<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl<R: Resource> fmt::Display for Record<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string_pretty(&self.data) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Widget;

    impl Resource for Widget {
        const NAME: &'static str = "Widget";
        const REST_ROOT: &'static str = "/common/widgets/";
        const FIELDS: &'static [&'static str] = &["id", "name", "color"];
    }

    struct WidgetPart;

    impl Resource for WidgetPart {
        const NAME: &'static str = "WidgetPart";
        const REST_ROOT: &'static str = "/common/widgets/:widget_id/parts/";
        const SECONDARY_KEY: Option<&'static str> = Some("revision");
        const READ_METHOD: Option<Method> = None;
        const CREATE_METHOD: Option<Method> = None;
        const UPDATE_METHOD: Option<Method> = None;
    }

    #[test]
    fn keys_are_normalized_to_pascal() {
        let record = Record::<Widget>::new(json!({"first_name": "Ada", "nested_map": {"inner_key": 1}}));
        assert_eq!(record.data().get("FirstName"), Some(&json!("Ada")));
        assert_eq!(record.field("first_name"), Some(&json!("Ada")));
        assert_eq!(record.field("FirstName"), Some(&json!("Ada")));
        assert_eq!(record.field("NestedMap/InnerKey"), Some(&json!(1)));
        assert_eq!(record.field("missing"), None);
    }

    #[test]
    fn formatted_path_uses_primary_key() {
        let record = Record::<Widget>::with_key(42);
        assert_eq!(Record::<Widget>::path_template(), "/common/widgets/{id}/");
        assert_eq!(record.formatted_path().unwrap(), "/common/widgets/42/");
    }

    #[test]
    fn formatted_path_fills_root_and_secondary_key() {
        let mut record = Record::<WidgetPart>::with_keys(7, "b");
        assert!(matches!(
            record.formatted_path(),
            Err(Error::PathTemplate { field, .. }) if field == "widget_id"
        ));

        assert!(!record.set_field("widget_id", 3));
        assert_eq!(record.formatted_path().unwrap(), "/common/widgets/3/parts/7/b/");
    }

    #[test]
    fn null_key_cannot_be_formatted() {
        let record = Record::<Widget>::new(json!({"id": null}));
        assert!(matches!(record.formatted_path(), Err(Error::PathTemplate { .. })));
    }

    #[test]
    fn formatted_root_from_path_values() {
        let options = ListOptions::new().with_path_value("widget_id", 9);
        assert_eq!(
            Record::<WidgetPart>::formatted_root(&options.path_values).unwrap(),
            "/common/widgets/9/parts/"
        );
        assert!(Record::<WidgetPart>::formatted_root(&Map::new()).is_err());
        assert_eq!(Record::<Widget>::formatted_root(&Map::new()).unwrap(), "/common/widgets/");
    }

    #[test]
    fn interpolate_keeps_unclosed_braces() {
        let out = interpolate("/a/{b", |_| None).unwrap();
        assert_eq!(out, "/a/{b");
        let out = interpolate("http://x:80/{id}/", |_| Some("1".into())).unwrap();
        assert_eq!(out, "http://x:80/1/");
    }

    #[test]
    fn set_field_on_declared_or_present_keys() {
        let mut record = Record::<Widget>::new(json!({"Id": 1, "Extra": "x"}));
        assert!(record.set_field("color", "red"));
        assert!(record.set_field("extra", "y"));
        assert!(!record.set_field("scratch_note", "local only"));

        assert_eq!(record.data().get("Color"), Some(&json!("red")));
        assert_eq!(record.data().get("Extra"), Some(&json!("y")));
        assert!(record.data().get("ScratchNote").is_none());
        assert_eq!(record.field("scratch_note"), Some(&json!("local only")));
    }

    #[tokio::test]
    async fn unsupported_operations() {
        let client = RestClient::new("http://127.0.0.1:9").unwrap();
        let mut record = Record::<WidgetPart>::with_keys(1, 2);
        record.set_field("widget_id", 3);

        let err = record.retrieve(&client).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { operation: "Retrieval", .. }));

        let err = record.save(&client, SaveOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation { operation: "Persistence", .. }));
    }

    #[test]
    fn display_is_pretty_json() {
        let record = Record::<Widget>::new(json!({"id": 1}));
        assert_eq!(record.to_string(), "{\n  \"Id\": 1\n}");
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"Id": 1}));
    }
}

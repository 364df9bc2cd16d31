//! GraphQL client for the hosted todo API.

use crate::api::TodoApi;
use crate::config::{API_KEY_VAR, AppConfig, AuthMode, ConfigError};
use crate::error::{RemoteOperation, Result, TodoError};
use crate::session::{ID_TOKEN_VAR, Session};
use crate::types::{CreateTodoInput, TodoRecord};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

/// Metric counting remote calls, labelled by `operation` and `outcome`
pub const REMOTE_CALLS: &str = "todo.remote.calls";

/// Register the description of [`REMOTE_CALLS`]
pub fn describe_metrics() {
    metrics::describe_counter!(
        REMOTE_CALLS,
        metrics::Unit::Count,
        "GraphQL calls made, by operation and outcome"
    );
}

const LIST_TODOS: &str = "query ListTodos {
  listTodos {
    items {
      id
      name
      description
    }
  }
}";

const CREATE_TODO: &str = "mutation CreateTodo($input: CreateTodoInput!) {
  createTodo(input: $input) {
    id
    name
    description
  }
}";

/// How each request proves who is calling
#[derive(Clone)]
enum Credentials {
    ApiKey(String),
    IdToken(String),
}

/// Client for the `listTodos` query and `createTodo` mutation
#[derive(Clone)]
pub struct GraphQlTodoApi {
    client: Client,
    endpoint: String,
    credentials: Credentials,
}

impl std::fmt::Debug for GraphQlTodoApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match self.credentials {
            Credentials::ApiKey(_) => "api-key",
            Credentials::IdToken(_) => "id-token",
        };
        f.debug_struct("GraphQlTodoApi")
            .field("endpoint", &self.endpoint)
            .field("auth", &auth)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTodosData {
    list_todos: Option<TodoConnection>,
}

#[derive(Deserialize)]
struct TodoConnection {
    #[serde(default)]
    items: Vec<Option<TodoRecord>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTodoData {
    create_todo: Option<TodoRecord>,
}

impl GraphQlTodoApi {
    /// Create a client for the configured endpoint, authorized for `session`
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Missing`] if the auth mode's credential is absent
    /// - [`ConfigError::Invalid`] if the HTTP client cannot be built
    pub fn new(config: &AppConfig, session: &Session) -> std::result::Result<Self, ConfigError> {
        let credentials = match config.auth_mode {
            AuthMode::ApiKey => Credentials::ApiKey(
                config
                    .api_key
                    .clone()
                    .ok_or(ConfigError::Missing(API_KEY_VAR))?,
            ),
            AuthMode::UserPool => Credentials::IdToken(
                session
                    .id_token
                    .clone()
                    .ok_or(ConfigError::Missing(ID_TOKEN_VAR))?,
            ),
        };

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                key: "http client",
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            credentials,
        })
    }

    /// Run the `listTodos` query
    ///
    /// Null entries in `items` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::RemoteCallFailed`] on transport, HTTP or GraphQL
    /// errors, on a malformed body, or if `listTodos` is null.
    #[tracing::instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn list_todos(&self) -> Result<Vec<TodoRecord>> {
        let data: ListTodosData = self
            .execute(RemoteOperation::List, LIST_TODOS, json!({}))
            .await?;

        let connection = data
            .list_todos
            .ok_or_else(|| TodoError::remote(RemoteOperation::List, "listTodos was null"))?;

        let todos: Vec<TodoRecord> = connection.items.into_iter().flatten().collect();
        tracing::debug!(count = todos.len(), "Fetched todos");
        Ok(todos)
    }

    /// Run the `createTodo` mutation
    ///
    /// # Errors
    ///
    /// Returns [`TodoError::RemoteCallFailed`] on transport, HTTP or GraphQL
    /// errors, on a malformed body, or if `createTodo` is null.
    #[tracing::instrument(skip(self, input), fields(endpoint = %self.endpoint, name = %input.name))]
    pub async fn create_todo(&self, input: CreateTodoInput) -> Result<TodoRecord> {
        let data: CreateTodoData = self
            .execute(RemoteOperation::Create, CREATE_TODO, json!({ "input": input }))
            .await?;

        let record = data
            .create_todo
            .ok_or_else(|| TodoError::remote(RemoteOperation::Create, "createTodo was null"))?;

        tracing::debug!(id = ?record.id, "Created todo");
        Ok(record)
    }

    async fn execute<T>(
        &self,
        operation: RemoteOperation,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let result = self.post(operation, query, variables).await;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(REMOTE_CALLS, "operation" => operation.as_str(), "outcome" => outcome)
            .increment(1);

        result
    }

    async fn post<T>(
        &self,
        operation: RemoteOperation,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }));

        let request = match &self.credentials {
            Credentials::ApiKey(key) => request.header("x-api-key", key),
            Credentials::IdToken(token) => request.header(reqwest::header::AUTHORIZATION, token),
        };

        let response = request
            .send()
            .await
            .map_err(|e| TodoError::remote(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TodoError::remote(
                operation,
                format!("HTTP {}: {body}", status.as_u16()),
            ));
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .map_err(|e| TodoError::remote(operation, format!("malformed response: {e}")))?;

        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(TodoError::remote(operation, messages.join("; ")));
        }

        body.data
            .ok_or_else(|| TodoError::remote(operation, "response carried no data"))
    }
}

impl TodoApi for GraphQlTodoApi {
    async fn list(&self) -> Result<Vec<TodoRecord>> {
        self.list_todos().await
    }

    async fn create(&self, input: CreateTodoInput) -> Result<TodoRecord> {
        self.create_todo(input).await
    }
}
